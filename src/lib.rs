//! # mhguide
//!
//! CRISPR/Cas9 guide discovery that ranks each cut site by the repair outcomes
//! microhomology-mediated end joining (MMEJ) is expected to produce.
//!
//! For every PAM on either strand the cut site is wrapped in a flanking window,
//! sequences shared by the two arms of the window are enumerated, each pairing
//! of shared sequences is scored as a deletion outcome, and the best outcomes are
//! folded into a per-guide score reporting how much of the expected repair is
//! out of frame.
//!
//! ## Example
//!
//! ```rust
//! use mhguide::{analyze_region, AnalysisParams, Region};
//!
//! let region = Region::new("seq", 1, b"AAAAACGGTTTTT");
//! let params = AnalysisParams {
//!     min_flanking_length: 2,
//!     max_flanking_length: 4,
//!     ..AnalysisParams::default()
//! };
//! let report = analyze_region(&region, &params, &[]).unwrap();
//! assert_eq!(report.total_sites, 1);
//! ```
//!
//! ## Modules
//!
//! - [`pam`]: IUPAC PAM expansion and scanning on both strands
//! - [`cut_site`]: cut-site records, windows and guide intervals
//! - [`microhomology`]: shared-sequence search between the arms of a cut
//! - [`end_joining`]: outcome enumeration, scoring and filtering
//! - [`evaluate`]: per-guide aggregation and variant overlap
//! - [`pipeline`]: the full region analysis, parallel over cut sites
//! - [`input`] / [`output`]: file loading and report writers

pub mod config;
pub mod cut_site;
pub mod end_joining;
pub mod error;
pub mod evaluate;
pub mod input;
pub mod microhomology;
pub mod output;
pub mod pam;
pub mod pipeline;
pub mod sequence;

pub use config::AnalysisParams;
pub use cut_site::{get_cut_sites, CutSite, GuideLocation};
pub use end_joining::{simulate_end_joining, FrameShift, Outcome};
pub use error::{ConfigError, InputError};
pub use evaluate::{evaluate_guides, EvaluatedGuide, GuideEvaluation, Variant};
pub use pam::PamPattern;
pub use pipeline::{analyze_region, analyze_region_sequential, AnalysisReport};
pub use sequence::{Region, Strand};
