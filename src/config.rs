use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pam::PamPattern;

pub const DEFAULT_PAM: &str = "NGG";
pub const DEFAULT_MIN_FLANKING: usize = 25;
pub const DEFAULT_MAX_FLANKING: usize = 40;
pub const DEFAULT_LENGTH_WEIGHT: f64 = 20.0;
pub const DEFAULT_N_PATTERNS: usize = 5;

/// Parameters shared by every stage of the cut-site analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// PAM motif in IUPAC notation
    pub pam: String,
    /// Minimum bases required on each side of a cut site
    pub min_flanking_length: usize,
    /// Maximum bases taken on each side of a cut site
    pub max_flanking_length: usize,
    /// Decay constant of the deletion-length penalty
    pub length_weight: f64,
    /// Number of top outcomes folded into the guide score
    pub n_patterns: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            pam: DEFAULT_PAM.to_string(),
            min_flanking_length: DEFAULT_MIN_FLANKING,
            max_flanking_length: DEFAULT_MAX_FLANKING,
            length_weight: DEFAULT_LENGTH_WEIGHT,
            n_patterns: DEFAULT_N_PATTERNS,
        }
    }
}

impl AnalysisParams {
    /// Check every parameter and compile the PAM.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found; the PAM is checked first.
    pub fn validate(&self) -> Result<PamPattern, ConfigError> {
        let pam = PamPattern::new(&self.pam)?;

        if self.min_flanking_length == 0 || self.min_flanking_length > self.max_flanking_length {
            return Err(ConfigError::InvalidFlanking {
                min: self.min_flanking_length,
                max: self.max_flanking_length,
            });
        }
        if !self.length_weight.is_finite() || self.length_weight <= 0.0 {
            return Err(ConfigError::InvalidLengthWeight(self.length_weight));
        }
        if self.n_patterns == 0 {
            return Err(ConfigError::InvalidPatternCount);
        }

        Ok(pam)
    }
}
