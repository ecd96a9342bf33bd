use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisParams;
use crate::cut_site::{get_cut_sites, CutSite};
use crate::end_joining::{simulate_site, SimulatedSite};
use crate::error::ConfigError;
use crate::evaluate::{evaluate_guides, EvaluatedGuide, Variant};
use crate::sequence::Region;

/// Result of analysing one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub contig: String,
    /// Cut sites found before ambiguous ones were dropped
    pub total_sites: usize,
    pub excluded_ambiguous: usize,
    pub guides: Vec<EvaluatedGuide>,
}

/// Simulate end joining at every site. Sites are independent, so the parallel
/// path runs them on the rayon pool; output order matches input order.
pub fn simulate_sites(sites: Vec<CutSite>, length_weight: f64, parallel: bool) -> Vec<SimulatedSite> {
    info!("Simulating MMEJ ...");
    if parallel {
        sites
            .into_par_iter()
            .map(|site| simulate_site(site, length_weight))
            .collect()
    } else {
        sites
            .into_iter()
            .map(|site| simulate_site(site, length_weight))
            .collect()
    }
}

/// Scan, simulate and evaluate a region on the rayon pool.
///
/// # Errors
///
/// Returns `ConfigError` when `params` do not validate; nothing is scanned then.
pub fn analyze_region(
    region: &Region,
    params: &AnalysisParams,
    variants: &[Variant],
) -> Result<AnalysisReport, ConfigError> {
    run(region, params, variants, true)
}

/// Same as [`analyze_region`] but on the calling thread only.
///
/// # Errors
///
/// Returns `ConfigError` when `params` do not validate.
pub fn analyze_region_sequential(
    region: &Region,
    params: &AnalysisParams,
    variants: &[Variant],
) -> Result<AnalysisReport, ConfigError> {
    run(region, params, variants, false)
}

fn run(
    region: &Region,
    params: &AnalysisParams,
    variants: &[Variant],
    parallel: bool,
) -> Result<AnalysisReport, ConfigError> {
    let pam = params.validate()?;

    info!("Finding PAMs ...");
    let sites = get_cut_sites(
        region,
        &pam,
        params.min_flanking_length,
        params.max_flanking_length,
    );
    let total_sites = sites.len();
    info!("Found {} cut site(s) in {} ({} bp)", total_sites, region.contig, region.len());

    let simulated = simulate_sites(sites, params.length_weight, parallel);
    let report = evaluate_guides(simulated, params.n_patterns, variants);

    Ok(AnalysisReport {
        contig: region.contig.clone(),
        total_sites,
        excluded_ambiguous: report.excluded_ambiguous,
        guides: report.guides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, RngCore, SeedableRng};

    fn generate_random_seq(rng: &mut SmallRng, length: usize) -> Vec<u8> {
        let bases = b"ACGT";
        (0..length)
            .map(|_| bases[rng.next_u32() as usize % 4])
            .collect()
    }

    #[test]
    fn test_invalid_pam_fails_before_scanning() {
        let region = Region::new("seq", 0, b"AAAAACGGTTTTT");
        let params = AnalysisParams {
            pam: "NGJ".to_string(),
            ..AnalysisParams::default()
        };
        assert!(matches!(
            analyze_region(&region, &params, &[]),
            Err(ConfigError::InvalidIupacCode { code: 'J', .. })
        ));
    }

    #[test]
    fn test_no_hits_is_empty_report() {
        let region = Region::new("seq", 0, &b"A".repeat(200));
        let report = analyze_region(&region, &AnalysisParams::default(), &[]).unwrap();
        assert_eq!(report.total_sites, 0);
        assert!(report.guides.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = SmallRng::seed_from_u64(42);
        let region = Region::new("random", 1, &generate_random_seq(&mut rng, 400));
        let params = AnalysisParams::default();
        let parallel = analyze_region(&region, &params, &[]).unwrap();
        let sequential = analyze_region_sequential(&region, &params, &[]).unwrap();
        assert!(parallel.total_sites > 0);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_window_bounds_hold() {
        let mut rng = SmallRng::seed_from_u64(3);
        for (min, max) in [(5, 10), (10, 10), (25, 40)] {
            let region = Region::new("random", 0, &generate_random_seq(&mut rng, 300));
            let params = AnalysisParams {
                min_flanking_length: min,
                max_flanking_length: max,
                ..AnalysisParams::default()
            };
            let report = analyze_region(&region, &params, &[]).unwrap();
            for guide in &report.guides {
                let record = &guide.site.record;
                assert!(record.window.len() >= 2 * min, "window {} < {}", record.window.len(), 2 * min);
                assert!(record.window.len() <= 2 * max);
                assert!(record.rel_break > 0 && record.rel_break < record.window.len());
            }
        }
    }
}
