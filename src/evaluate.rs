//! Aggregation of per-site outcomes into guide scores.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cut_site::{CutSite, GuideLocation};
use crate::end_joining::{Outcome, SimulatedSite};

/// A known sequence variant. Coordinates are closed and genomic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Contig name; `None` matches any guide
    pub contig: Option<String>,
    pub id: Option<String>,
    pub start: i64,
    pub end: i64,
    /// Alternate allele frequencies, carried but not used in scoring
    #[serde(default)]
    pub allele_frequencies: Vec<f64>,
}

impl Variant {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            contig: None,
            id: None,
            start,
            end,
            allele_frequencies: Vec::new(),
        }
    }

    /// True when the guide interval fully contains this variant.
    pub fn lies_within(&self, location: &GuideLocation) -> bool {
        let same_contig = self
            .contig
            .as_deref()
            .map_or(true, |contig| contig == location.contig);
        same_contig && location.contains(self.start, self.end)
    }
}

/// Scores derived from a site's best outcomes and the variants under its guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideEvaluation {
    /// Best outcomes, highest score first
    pub top_outcomes: Vec<Outcome>,
    pub sum_score: f64,
    pub oof_score: f64,
    /// Percentage of `sum_score` coming from out-of-frame outcomes; 0 when `sum_score` is 0
    pub complete_score: f64,
    pub variants: Vec<Variant>,
    /// Number of overlapping variants, or 1 when there are none. This is a
    /// placeholder heuristic and not a probability.
    pub wt_prob: usize,
}

impl GuideEvaluation {
    pub fn has_microhomology(&self) -> bool {
        self.sum_score > 0.0
    }
}

/// A fully evaluated guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedGuide {
    pub site: CutSite,
    pub outcomes: Vec<Outcome>,
    pub evaluation: GuideEvaluation,
}

/// Evaluated guides plus the number of sites dropped for unresolved bases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub guides: Vec<EvaluatedGuide>,
    pub excluded_ambiguous: usize,
}

/// The `n_patterns` highest-scoring outcomes; ties keep their input order.
pub fn top_outcomes(outcomes: &[Outcome], n_patterns: usize) -> Vec<Outcome> {
    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted.truncate(n_patterns);
    sorted
}

pub fn complete_score(oof_score: f64, sum_score: f64) -> f64 {
    if sum_score > 0.0 {
        100.0 * oof_score / sum_score
    } else {
        0.0
    }
}

pub fn overlapping_variants(location: &GuideLocation, variants: &[Variant]) -> Vec<Variant> {
    variants
        .iter()
        .filter(|v| v.lies_within(location))
        .cloned()
        .collect()
}

pub fn evaluate_site(site: &SimulatedSite, n_patterns: usize, variants: &[Variant]) -> GuideEvaluation {
    let top = top_outcomes(&site.outcomes, n_patterns);
    let sum_score: f64 = top.iter().map(|o| o.score).sum();
    let oof_score: f64 = top
        .iter()
        .filter(|o| o.frame_shift.is_out_of_frame())
        .map(|o| o.score)
        .sum();

    let variants = overlapping_variants(&site.site.guide_location, variants);
    let wt_prob = if variants.is_empty() { 1 } else { variants.len() };

    GuideEvaluation {
        top_outcomes: top,
        sum_score,
        oof_score,
        complete_score: complete_score(oof_score, sum_score),
        variants,
        wt_prob,
    }
}

/// Score every site, dropping those whose window or guide holds an unresolved base.
pub fn evaluate_guides(
    sites: Vec<SimulatedSite>,
    n_patterns: usize,
    variants: &[Variant],
) -> EvaluationReport {
    info!("Evaluating guides ...");
    let mut report = EvaluationReport::default();

    for site in sites {
        if site.site.is_ambiguous() {
            report.excluded_ambiguous += 1;
            continue;
        }
        let evaluation = evaluate_site(&site, n_patterns, variants);
        report.guides.push(EvaluatedGuide {
            site: site.site,
            outcomes: site.outcomes,
            evaluation,
        });
    }

    if report.excluded_ambiguous > 0 {
        warn!(
            "Excluded {} cut site(s) containing unresolved bases",
            report.excluded_ambiguous
        );
    }

    report
}
