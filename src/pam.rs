//! PAM motif scanning on both strands of a sequence.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::error::ConfigError;
use crate::sequence::{reverse_complement, Strand};

lazy_static! {
    static ref IUPAC_CLASSES: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        m.insert('A', "A");
        m.insert('C', "C");
        m.insert('G', "G");
        m.insert('T', "T");
        m.insert('R', "[AG]");
        m.insert('Y', "[CT]");
        m.insert('S', "[GC]");
        m.insert('W', "[AT]");
        m.insert('K', "[GT]");
        m.insert('M', "[AC]");
        m.insert('B', "[CGT]");
        m.insert('D', "[AGT]");
        m.insert('H', "[ACT]");
        m.insert('V', "[ACG]");
        m.insert('N', "[ACGT]");
        m
    };
}

/// Expand an IUPAC motif into a character-class expression, e.g. `NGG` -> `[ACGT]GG`.
pub fn expand_iupac(pam: &str) -> Result<String, ConfigError> {
    if pam.is_empty() {
        return Err(ConfigError::EmptyPam);
    }
    pam.chars()
        .enumerate()
        .map(|(position, code)| {
            IUPAC_CLASSES
                .get(&code.to_ascii_uppercase())
                .copied()
                .ok_or_else(|| ConfigError::InvalidIupacCode {
                    pam: pam.to_string(),
                    code,
                    position,
                })
        })
        .collect()
}

/// A compiled PAM motif.
#[derive(Debug, Clone)]
pub struct PamPattern {
    pam: String,
    regex: Regex,
}

impl PartialEq for PamPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pam == other.pam
    }
}

impl fmt::Display for PamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pam)
    }
}

/// PAM offsets found on one strand, relative to that strand's own sequence.
#[derive(Debug, Clone)]
pub struct StrandHits<'a> {
    pub strand: Strand,
    pub sequence: Cow<'a, [u8]>,
    pub offsets: Vec<usize>,
}

impl PamPattern {
    pub fn new(pam: &str) -> Result<Self, ConfigError> {
        let expression = expand_iupac(pam)?;
        let regex = Regex::new(&expression).map_err(|e| ConfigError::Regex(e.to_string()))?;
        Ok(Self {
            pam: pam.to_ascii_uppercase(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pam
    }

    pub fn len(&self) -> usize {
        self.pam.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pam.is_empty()
    }

    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Every start offset where the motif matches, overlapping matches included.
    pub fn find_all(&self, seq: &[u8]) -> Vec<usize> {
        let mut offsets = Vec::new();
        let mut from = 0;
        while from < seq.len() {
            match self.regex.find_at(seq, from) {
                Some(m) => {
                    offsets.push(m.start());
                    from = m.start() + 1;
                }
                None => break,
            }
        }
        offsets
    }

    /// Motif hits whose cut site leaves at least `min_flanking` bases on the left
    /// and whose end leaves at least `min_flanking` bases on the right.
    pub fn scan(&self, seq: &[u8], min_flanking: usize) -> Vec<usize> {
        let pam_len = self.len();
        self.find_all(seq)
            .into_iter()
            .filter(|&start| {
                start >= pam_len + min_flanking && start + pam_len + min_flanking <= seq.len()
            })
            .collect()
    }

    /// Scan the sequence and its reverse complement.
    pub fn scan_strands<'a>(&self, seq: &'a [u8], min_flanking: usize) -> [StrandHits<'a>; 2] {
        let reverse = reverse_complement(seq);
        let forward_offsets = self.scan(seq, min_flanking);
        let reverse_offsets = self.scan(&reverse, min_flanking);
        [
            StrandHits {
                strand: Strand::Forward,
                sequence: Cow::Borrowed(seq),
                offsets: forward_offsets,
            },
            StrandHits {
                strand: Strand::Reverse,
                sequence: Cow::Owned(reverse),
                offsets: reverse_offsets,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_iupac() {
        assert_eq!(expand_iupac("NGG").unwrap(), "[ACGT]GG");
        assert_eq!(expand_iupac("TTTV").unwrap(), "TTT[ACG]");
        assert_eq!(expand_iupac("nrg").unwrap(), "[ACGT][AG]G");
        assert_eq!(
            expand_iupac("RYSWKMBDHV").unwrap(),
            "[AG][CT][GC][AT][GT][AC][CGT][AGT][ACT][ACG]"
        );
    }

    #[test]
    fn test_invalid_iupac_fails_fast() {
        assert_eq!(
            PamPattern::new("NGZ").unwrap_err(),
            ConfigError::InvalidIupacCode {
                pam: "NGZ".to_string(),
                code: 'Z',
                position: 2
            }
        );
        assert_eq!(PamPattern::new("").unwrap_err(), ConfigError::EmptyPam);
    }

    #[test]
    fn test_overlapping_matches_are_kept() {
        let pam = PamPattern::new("NGG").unwrap();
        // AGG, GGG and GGG overlap
        assert_eq!(pam.find_all(b"AGGGGT"), vec![0, 1, 2]);
        assert!(pam.find_all(b"ATATAT").is_empty());
    }

    #[test]
    fn test_scan_single_forward_hit() {
        let pam = PamPattern::new("NGG").unwrap();
        let seq = b"AAAAACGGTTTTT";
        let [forward, reverse] = pam.scan_strands(seq, 2);
        assert_eq!(forward.strand, Strand::Forward);
        assert_eq!(forward.offsets, vec![5]);
        assert_eq!(&seq[6..8], b"GG");
        assert_eq!(reverse.strand, Strand::Reverse);
        assert!(reverse.offsets.is_empty());
        assert_eq!(&*reverse.sequence, b"AAAAACCGTTTTT");
    }

    #[test]
    fn test_scan_drops_hits_near_edges() {
        let pam = PamPattern::new("NGG").unwrap();
        // hit at 0 and hit ending at the last base
        assert!(pam.scan(b"AGGTTTTTTTTTTCGG", 2).is_empty());
        assert_eq!(pam.find_all(b"AGGTTTTTTTTTTCGG"), vec![0, 13]);
    }

    #[test]
    fn test_scan_keeps_exact_right_flank() {
        let pam = PamPattern::new("NGG").unwrap();
        // CGG at 8 is followed by exactly two bases
        assert_eq!(pam.scan(b"AAAAAAAACGGTT", 2), vec![8]);
        assert!(pam.scan(b"AAAAAAAACGGT", 2).is_empty());
    }

    #[test]
    fn test_scan_reverse_strand() {
        let pam = PamPattern::new("NGG").unwrap();
        // CCN on the forward strand is NGG on the reverse
        let seq = b"TTTTTCCATTTTT";
        let [forward, reverse] = pam.scan_strands(seq, 2);
        assert!(forward.offsets.is_empty());
        assert_eq!(&*reverse.sequence, b"AAAAATGGAAAAA");
        assert_eq!(reverse.offsets, vec![5]);
    }
}
