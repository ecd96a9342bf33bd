use thiserror::Error;

/// Errors raised while validating analysis parameters, before any scanning starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("PAM pattern is empty")]
    EmptyPam,

    #[error("Invalid IUPAC code '{code}' at position {position} in PAM '{pam}'")]
    InvalidIupacCode {
        pam: String,
        code: char,
        position: usize,
    },

    #[error("Invalid flanking lengths: min {min} must be > 0 and <= max {max}")]
    InvalidFlanking { min: usize, max: usize },

    #[error("Length weight must be a positive finite number, got {0}")]
    InvalidLengthWeight(f64),

    #[error("Number of patterns must be at least 1")]
    InvalidPatternCount,

    #[error("Failed to compile PAM expression: {0}")]
    Regex(String),
}

/// Errors raised while loading sequences, regions or variants from disk.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input contains no sequence")]
    EmptyInput,

    #[error("Invalid region '{0}', expected CONTIG:START-END")]
    InvalidRegion(String),

    #[error("Contig '{0}' not found in reference")]
    UnknownContig(String),

    #[error("Region {contig}:{start}-{end} exceeds contig length {length}")]
    RegionOutOfBounds {
        contig: String,
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Malformed variant at line {line}: {reason}")]
    MalformedVariant { line: usize, reason: String },
}
