//! Exhaustive search for sequences shared by the two arms of a cut site.
//!
//! Every substring of the left arm, from the longest candidate length down to
//! `MIN_KMER_LEN`, is tested for containment in the right arm. The cost grows
//! with the cube of the window size, so the flanking length is the knob that
//! bounds it.

use serde::{Deserialize, Serialize};

use crate::sequence::gc_count;

pub const MIN_KMER_LEN: usize = 2;

/// A sequence present in both arms, with its GC base count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicrohomologyPattern {
    pub sequence: String,
    pub gc: usize,
}

impl MicrohomologyPattern {
    pub fn new(seq: &[u8]) -> Self {
        Self {
            sequence: String::from_utf8_lossy(seq).into_owned(),
            gc: gc_count(seq),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Bases other than G or C.
    pub fn at(&self) -> usize {
        self.len() - self.gc
    }
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Start offsets of the occurrences of `needle`, scanning left to right and
/// resuming after each match, so overlapping repeats are not counted.
pub fn occurrences(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    if needle.is_empty() {
        return offsets;
    }
    let mut from = 0;
    while from + needle.len() <= haystack.len() {
        if &haystack[from..from + needle.len()] == needle {
            offsets.push(from);
            from += needle.len();
        } else {
            from += 1;
        }
    }
    offsets
}

/// All substrings of `left` that also occur in `right`, longest first.
///
/// A substring repeated within `left` is reported once per position, and the
/// full left arm itself is never a candidate.
pub fn find_microhomologies<'a>(left: &'a [u8], right: &[u8]) -> Vec<&'a [u8]> {
    let mut kmers = Vec::new();
    let max_k = left.len().saturating_sub(1).min(right.len());

    for k in (MIN_KMER_LEN..=max_k).rev() {
        for i in 0..=(left.len() - k) {
            let kmer = &left[i..i + k];
            if contains(right, kmer) {
                kmers.push(kmer);
            }
        }
    }

    kmers
}
