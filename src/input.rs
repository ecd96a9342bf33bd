//! Loading of target sequences, reference regions and known variants.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use tracing::{debug, info};

use crate::error::InputError;
use crate::evaluate::Variant;
use crate::sequence::{normalize, Region};

/// Contig name given to sequences that carry no identifier.
pub const RAW_SEQUENCE_CONTIG: &str = "sequence";

/// A target sequence as found in a text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceInput {
    Fasta { id: String, sequence: Vec<u8> },
    Raw(Vec<u8>),
}

impl SequenceInput {
    /// Turn the input into a region; file input is numbered from 1.
    pub fn into_region(self) -> Region {
        match self {
            SequenceInput::Fasta { id, sequence } => Region::new(id, 1, &sequence),
            SequenceInput::Raw(sequence) => Region::new(RAW_SEQUENCE_CONTIG, 1, &sequence),
        }
    }
}

/// Open a file for buffered reading, decompressing `.gz` files.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().map_or(false, |ext| ext == "gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Decide whether `text` is FASTA (first non-blank line starts with `>`) or a
/// raw sequence (first non-blank line).
///
/// # Errors
///
/// Returns `InputError::EmptyInput` when no sequence is present and
/// `InputError::Io` when the FASTA record cannot be parsed.
pub fn classify_sequence_text(text: &str) -> Result<SequenceInput, InputError> {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(InputError::EmptyInput)?;

    if first.starts_with('>') {
        let start = text.find('>').unwrap_or(0);
        let record = fasta::Reader::new(text[start..].as_bytes())
            .records()
            .next()
            .ok_or(InputError::EmptyInput)??;
        let sequence = normalize(record.seq());
        if sequence.is_empty() {
            return Err(InputError::EmptyInput);
        }
        Ok(SequenceInput::Fasta {
            id: record.id().to_string(),
            sequence,
        })
    } else {
        Ok(SequenceInput::Raw(normalize(first.as_bytes())))
    }
}

/// Read a FASTA or raw-text sequence file into a region.
pub fn read_sequence_file(path: &Path) -> Result<Region, InputError> {
    let mut text = String::new();
    open_reader(path)?.read_to_string(&mut text)?;
    let input = classify_sequence_text(&text)?;
    match &input {
        SequenceInput::Fasta { id, .. } => info!("Reading FASTA: {} ({})", path.display(), id),
        SequenceInput::Raw(_) => info!("Reading text sequence: {}", path.display()),
    }
    Ok(input.into_region())
}

/// A genomic interval requested as `CONTIG:START-END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub contig: String,
    pub start: usize,
    pub end: usize,
}

/// Parse `CONTIG:START-END`; thousands separators are accepted.
pub fn parse_region(text: &str) -> Result<RegionSpec, InputError> {
    let invalid = || InputError::InvalidRegion(text.to_string());
    let (contig, range) = text.trim().rsplit_once(':').ok_or_else(invalid)?;
    let (start, end) = range.split_once('-').ok_or_else(invalid)?;
    let parse = |s: &str| -> Result<usize, InputError> {
        s.trim().replace(|c: char| c == ',' || c == '_', "").parse::<usize>().map_err(|_| invalid())
    };
    let (start, end) = (parse(start)?, parse(end)?);

    if contig.is_empty() || start >= end {
        return Err(invalid());
    }
    Ok(RegionSpec {
        contig: contig.to_string(),
        start,
        end,
    })
}

/// Slice `[start, end)` of a contig out of a reference FASTA.
pub fn load_region(reference: &Path, spec: &RegionSpec) -> Result<Region, InputError> {
    let reader = fasta::Reader::new(open_reader(reference)?);
    for record in reader.records() {
        let record = record?;
        if record.id() != spec.contig {
            continue;
        }
        let seq = record.seq();
        if spec.end > seq.len() {
            return Err(InputError::RegionOutOfBounds {
                contig: spec.contig.clone(),
                start: spec.start,
                end: spec.end,
                length: seq.len(),
            });
        }
        debug!("Loaded {}:{}-{} from {}", spec.contig, spec.start, spec.end, reference.display());
        return Ok(Region::new(
            spec.contig.clone(),
            spec.start as i64,
            &seq[spec.start..spec.end],
        ));
    }
    Err(InputError::UnknownContig(spec.contig.clone()))
}

/// Parse tab-separated variants: `contig start end [id] [af,af,...]`.
///
/// A contig of `.` matches every guide. Lines lacking a valid start and end are
/// rejected.
pub fn parse_variants<R: BufRead>(reader: R) -> Result<Vec<Variant>, InputError> {
    let mut variants = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_no = index + 1;
        let malformed = |reason: &str| InputError::MalformedVariant {
            line: line_no,
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(malformed("expected at least contig, start and end"));
        }
        let start = fields[1].parse::<i64>().map_err(|_| malformed("invalid start"))?;
        let end = fields[2].parse::<i64>().map_err(|_| malformed("invalid end"))?;
        if end < start {
            return Err(malformed("end before start"));
        }

        let contig = match fields[0] {
            "" | "." => None,
            name => Some(name.to_string()),
        };
        let id = fields
            .get(3)
            .filter(|s| !s.is_empty() && **s != ".")
            .map(|s| s.to_string());
        let allele_frequencies = match fields.get(4) {
            Some(afs) if !afs.is_empty() && *afs != "." => afs
                .split(',')
                .map(|af| af.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| malformed("invalid allele frequency"))?,
            _ => Vec::new(),
        };

        variants.push(Variant {
            contig,
            id,
            start,
            end,
            allele_frequencies,
        });
    }

    Ok(variants)
}

pub fn read_variants(path: &Path) -> Result<Vec<Variant>, InputError> {
    let variants = parse_variants(open_reader(path)?)?;
    info!("Loaded {} variant(s) from {}", variants.len(), path.display());
    Ok(variants)
}
