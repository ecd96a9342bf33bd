//! Simulation of microhomology-mediated end joining at a cut site.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cut_site::CutSite;
use crate::microhomology::{find_microhomologies, occurrences, MicrohomologyPattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameShift {
    InFrame,
    OutOfFrame,
}

impl FrameShift {
    pub fn from_deletion(deletion_length: usize) -> Self {
        if deletion_length % 3 == 0 {
            FrameShift::InFrame
        } else {
            FrameShift::OutOfFrame
        }
    }

    pub fn is_out_of_frame(self) -> bool {
        self == FrameShift::OutOfFrame
    }
}

impl fmt::Display for FrameShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameShift::InFrame => f.write_str("in-frame"),
            FrameShift::OutOfFrame => f.write_str("out-of-frame"),
        }
    }
}

/// Identity of an outcome: the pattern and both of its positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutcomeKey {
    pub pattern: String,
    pub left_position: usize,
    pub right_position: usize,
}

/// One repair outcome: a microhomology paired at a left and a right occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub pattern: MicrohomologyPattern,
    /// Start of the left occurrence, in window coordinates
    pub left_position: usize,
    /// Start of the right occurrence, in window coordinates
    pub right_position: usize,
    /// Start of the right occurrence within the right arm
    pub right_offset: usize,
    pub deletion_length: usize,
    pub deletion_seq: String,
    pub frame_shift: FrameShift,
    pub score: f64,
}

impl Outcome {
    /// Pair the occurrence of `pattern` at `left_position` in `left` with the one
    /// at `right_offset` in `right`.
    pub fn new(
        pattern: MicrohomologyPattern,
        left: &[u8],
        right: &[u8],
        left_position: usize,
        right_offset: usize,
        length_weight: f64,
    ) -> Self {
        let deletion_length = (left.len() - left_position) + right_offset;
        let mut deletion_seq = String::from_utf8_lossy(&left[left_position..]).into_owned();
        deletion_seq.push_str(&String::from_utf8_lossy(&right[..right_offset]));
        let score = pattern_score(&pattern, deletion_length, length_weight);

        Self {
            left_position,
            right_position: left.len() + right_offset,
            right_offset,
            deletion_length,
            deletion_seq,
            frame_shift: FrameShift::from_deletion(deletion_length),
            score,
            pattern,
        }
    }

    pub fn key(&self) -> OutcomeKey {
        OutcomeKey {
            pattern: self.pattern.sequence.clone(),
            left_position: self.left_position,
            right_position: self.right_position,
        }
    }

    /// The repaired arms: deleted left bases shown as `-`, deleted right bases as `+`.
    pub fn alignment(&self, left: &[u8], right: &[u8]) -> (String, String) {
        let left_deleted = left.len() - self.left_position;
        let mut left_view = String::from_utf8_lossy(&left[..self.left_position]).into_owned();
        left_view.push_str(&"-".repeat(left_deleted));
        let mut right_view = "+".repeat(self.right_offset);
        right_view.push_str(&String::from_utf8_lossy(&right[self.right_offset..]));
        (left_view, right_view)
    }

    /// True when this outcome is a shorter pattern sitting inside `other` at the
    /// same place. Only the first embedding of the shorter pattern is considered.
    pub fn is_nested_in(&self, other: &Outcome) -> bool {
        if self.pattern.sequence == other.pattern.sequence {
            return false;
        }
        match other.pattern.sequence.find(&self.pattern.sequence) {
            Some(offset) => {
                self.left_position == other.left_position + offset
                    && self.right_position == other.right_position + offset
            }
            None => false,
        }
    }
}

/// `100 * exp(-deletion / weight) * (AT + 2 * GC)` over the pattern bases.
pub fn pattern_score(pattern: &MicrohomologyPattern, deletion_length: usize, length_weight: f64) -> f64 {
    let length_factor = (-(deletion_length as f64) / length_weight).exp();
    100.0 * length_factor * (pattern.at() + 2 * pattern.gc) as f64
}

/// Every (left occurrence, right occurrence) pairing of every shared pattern.
pub fn enumerate_outcomes(left: &[u8], right: &[u8], length_weight: f64) -> Vec<Outcome> {
    let mut outcomes = Vec::new();

    for kmer in find_microhomologies(left, right) {
        let pattern = MicrohomologyPattern::new(kmer);
        let left_positions = occurrences(left, kmer);
        let right_positions = occurrences(right, kmer);

        for &left_position in &left_positions {
            for &right_offset in &right_positions {
                outcomes.push(Outcome::new(
                    pattern.clone(),
                    left,
                    right,
                    left_position,
                    right_offset,
                    length_weight,
                ));
            }
        }
    }

    outcomes
}

/// Drop outcomes whose key was already seen, keeping the first.
pub fn dedup_outcomes(outcomes: Vec<Outcome>) -> Vec<Outcome> {
    let mut seen = HashSet::new();
    outcomes.into_iter().filter(|o| seen.insert(o.key())).collect()
}

/// Drop outcomes nested inside another candidate.
///
/// Candidates are visited in ascending score order (stable) and each one is
/// checked against the whole input, not against what has been kept so far.
/// The result is returned in that ascending order.
pub fn filter_nested(candidates: &[Outcome]) -> Vec<Outcome> {
    let mut order: Vec<&Outcome> = candidates.iter().collect();
    order.sort_by(|a, b| a.score.total_cmp(&b.score));

    order
        .into_iter()
        .filter(|outcome| !candidates.iter().any(|other| outcome.is_nested_in(other)))
        .cloned()
        .collect()
}

/// Enumerate, deduplicate and filter the outcomes for one pair of arms.
pub fn simulate_end_joining(left: &[u8], right: &[u8], length_weight: f64) -> Vec<Outcome> {
    let candidates = dedup_outcomes(enumerate_outcomes(left, right, length_weight));
    filter_nested(&candidates)
}

/// A cut site together with its filtered repair outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSite {
    pub site: CutSite,
    pub outcomes: Vec<Outcome>,
}

pub fn simulate_site(site: CutSite, length_weight: f64) -> SimulatedSite {
    let outcomes = simulate_end_joining(site.record.left_arm(), site.record.right_arm(), length_weight);
    debug!(
        "{}{} break {}: {} outcomes",
        site.guide_location.contig,
        site.record.strand,
        site.break_abs,
        outcomes.len()
    );
    SimulatedSite { site, outcomes }
}
