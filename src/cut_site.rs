//! Cut-site records built from PAM hits.

use serde::{Deserialize, Serialize};

use crate::pam::{PamPattern, StrandHits};
use crate::sequence::{is_resolved, Region, Strand};

/// Length of the spacer taken upstream of the PAM.
pub const SPACER_LEN: usize = 20;

/// Guide interval offsets around the absolute break (SpCas9/NGG layout).
pub const GUIDE_UPSTREAM: i64 = 17;
pub const GUIDE_DOWNSTREAM: i64 = 3;

/// A PAM hit turned into a cut site, in the coordinates of its own strand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRecord {
    pub strand: Strand,
    /// Start of the PAM in the strand-local sequence
    pub pam_offset: usize,
    pub pam: String,
    /// Cut position in the strand-local sequence
    pub cut: usize,
    /// Cut position inside `window`
    pub rel_break: usize,
    pub window: String,
    /// Spacer plus PAM
    pub guide: String,
}

impl BreakRecord {
    /// Build a record for the PAM at `pam_offset` in `seq`.
    ///
    /// The cut sits `pam_len` bases upstream of the PAM. The window spans
    /// `max_flanking` bases on each side of the cut, clipped to the sequence.
    pub fn from_hit(
        seq: &[u8],
        strand: Strand,
        pam_offset: usize,
        pam_len: usize,
        max_flanking: usize,
    ) -> Self {
        let cut = pam_offset.saturating_sub(pam_len);
        let left = cut.saturating_sub(max_flanking);
        let right = cut.saturating_add(max_flanking).min(seq.len());
        let pam_end = (pam_offset + pam_len).min(seq.len());
        let guide_start = pam_offset.saturating_sub(SPACER_LEN);

        Self {
            strand,
            pam_offset,
            pam: String::from_utf8_lossy(&seq[pam_offset..pam_end]).into_owned(),
            cut,
            rel_break: cut - left,
            window: String::from_utf8_lossy(&seq[left..right]).into_owned(),
            guide: String::from_utf8_lossy(&seq[guide_start..pam_end]).into_owned(),
        }
    }

    /// Window sequence 5' of the cut.
    pub fn left_arm(&self) -> &[u8] {
        &self.window.as_bytes()[..self.rel_break]
    }

    /// Window sequence 3' of the cut.
    pub fn right_arm(&self) -> &[u8] {
        &self.window.as_bytes()[self.rel_break..]
    }
}

/// Build one record per hit on a strand.
pub fn break_records(hits: &StrandHits<'_>, pam_len: usize, max_flanking: usize) -> Vec<BreakRecord> {
    hits.offsets
        .iter()
        .map(|&offset| BreakRecord::from_hit(&hits.sequence, hits.strand, offset, pam_len, max_flanking))
        .collect()
}

/// Closed genomic interval covered by a guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideLocation {
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl GuideLocation {
    /// True when `[start, end]` lies entirely inside this interval.
    pub fn contains(&self, start: i64, end: i64) -> bool {
        self.start <= start && self.end >= end
    }
}

/// A break record placed in genomic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSite {
    #[serde(flatten)]
    pub record: BreakRecord,
    pub break_abs: i64,
    pub guide_location: GuideLocation,
}

impl CutSite {
    /// Place a record within `region`. The break offset is added to the region
    /// start on both strands, and the guide interval keeps the fixed SpCas9
    /// 17/3 layout around it whatever the PAM length.
    pub fn place(record: BreakRecord, region: &Region, pam_len: usize) -> Self {
        let break_abs = region.start + record.cut as i64;
        let start = break_abs - GUIDE_UPSTREAM;
        let end = break_abs + GUIDE_DOWNSTREAM + pam_len as i64;

        Self {
            record,
            break_abs,
            guide_location: GuideLocation {
                contig: region.contig.clone(),
                start,
                end,
            },
        }
    }

    /// True when the window or the guide holds a base other than ACGT.
    pub fn is_ambiguous(&self) -> bool {
        !is_resolved(self.record.window.as_bytes()) || !is_resolved(self.record.guide.as_bytes())
    }
}

/// Find every cut site on both strands of `region`.
pub fn get_cut_sites(
    region: &Region,
    pam: &PamPattern,
    min_flanking: usize,
    max_flanking: usize,
) -> Vec<CutSite> {
    pam.scan_strands(&region.sequence, min_flanking)
        .iter()
        .flat_map(|hits| break_records(hits, pam.len(), max_flanking))
        .map(|record| CutSite::place(record, region, pam.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_window() {
        let region = Region::new("seq", 0, b"AAAAACGGTTTTT");
        let pam = PamPattern::new("NGG").unwrap();
        let sites = get_cut_sites(&region, &pam, 2, 4);
        assert_eq!(sites.len(), 1);

        let site = &sites[0];
        assert_eq!(site.record.strand, Strand::Forward);
        assert_eq!(site.record.pam_offset, 5);
        assert_eq!(site.record.pam, "CGG");
        assert_eq!(site.record.cut, 2);
        assert_eq!(site.record.window, "AAAAAC");
        assert_eq!(site.record.rel_break, 2);
        assert_eq!(site.record.left_arm(), b"AA");
        assert_eq!(site.record.right_arm(), b"AAAC");
        assert_eq!(site.record.guide, "AAAAACGG");
        assert!(site.record.window.len() >= 4 && site.record.window.len() <= 8);
    }

    #[test]
    fn test_window_clipped_on_both_sides() {
        let seq = b"ACGTACGTACGG";
        let record = BreakRecord::from_hit(seq, Strand::Forward, 9, 3, 10);
        assert_eq!(record.cut, 6);
        assert_eq!(record.rel_break, 6);
        assert_eq!(record.window.len(), seq.len());
        assert_eq!(record.pam, "CGG");
    }

    #[test]
    fn test_full_window_and_guide() {
        let mut seq = b"T".repeat(30);
        seq.extend_from_slice(b"AGG");
        seq.extend(b"T".repeat(30));
        let record = BreakRecord::from_hit(&seq, Strand::Forward, 30, 3, 10);
        assert_eq!(record.cut, 27);
        assert_eq!(record.window.len(), 20);
        assert_eq!(record.rel_break, 10);
        assert_eq!(record.guide.len(), SPACER_LEN + 3);
        assert!(record.guide.ends_with("AGG"));
    }

    #[test]
    fn test_forward_guide_location() {
        let region = Region::new("2L", 1000, b"AAAAACGGTTTTT");
        let pam = PamPattern::new("NGG").unwrap();
        let site = &get_cut_sites(&region, &pam, 2, 4)[0];
        assert_eq!(site.break_abs, 1002);
        assert_eq!(site.guide_location.contig, "2L");
        assert_eq!(site.guide_location.start, 1002 - 17);
        assert_eq!(site.guide_location.end, 1002 + 6);
    }

    #[test]
    fn test_reverse_strand_uses_local_cut() {
        // reverse complement is AAAAATGGAAAAA, PAM at 5, cut at 2
        let region = Region::new("chr", 100, b"TTTTTCCATTTTT");
        let pam = PamPattern::new("NGG").unwrap();
        let sites = get_cut_sites(&region, &pam, 2, 4);
        assert_eq!(sites.len(), 1);
        let site = &sites[0];
        assert_eq!(site.record.strand, Strand::Reverse);
        assert_eq!(site.record.cut, 2);
        assert_eq!(site.break_abs, 102);
        assert_eq!(site.guide_location.start, 85);
        assert_eq!(site.guide_location.end, 108);
    }

    #[test]
    fn test_huge_max_flanking_clips() {
        let seq = b"ACGTACGTACGG";
        let record = BreakRecord::from_hit(seq, Strand::Forward, 9, 3, usize::MAX);
        assert_eq!(record.window.len(), seq.len());
        assert_eq!(record.rel_break, 6);
    }

    #[test]
    fn test_ambiguity_detection() {
        let mut seq = b"ACGTTGCA".repeat(4);
        seq.extend_from_slice(b"TGG");
        seq.extend(b"ACGTNGCA".repeat(4));
        let region = Region::new("seq", 0, &seq);
        let pam = PamPattern::new("NGG").unwrap();
        let sites = get_cut_sites(&region, &pam, 5, 12);
        let forward: Vec<_> = sites
            .iter()
            .filter(|s| s.record.strand == Strand::Forward && s.record.pam_offset == 32)
            .collect();
        assert_eq!(forward.len(), 1);
        assert!(forward[0].is_ambiguous());
    }

    #[test]
    fn test_guide_location_containment() {
        let loc = GuideLocation {
            contig: "2L".to_string(),
            start: 100,
            end: 126,
        };
        assert!(loc.contains(100, 126));
        assert!(loc.contains(110, 111));
        assert!(!loc.contains(99, 110));
        assert!(!loc.contains(120, 127));
    }
}
