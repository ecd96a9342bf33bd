use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mhguide::config::{
    DEFAULT_LENGTH_WEIGHT, DEFAULT_MAX_FLANKING, DEFAULT_MIN_FLANKING, DEFAULT_N_PATTERNS, DEFAULT_PAM,
};
use mhguide::input::{load_region, parse_region, read_sequence_file, read_variants};
use mhguide::output::{write_bed, write_detailed_report, write_guides_tsv, write_json};
use mhguide::{analyze_region, AnalysisParams, AnalysisReport, Region};

#[derive(Parser, Debug)]
#[command(author, version, about = "CRISPR/Cas9 guide finder scored by predicted MMEJ repair")]
struct Args {
    /// File with the target sequence (FASTA or plain text, optionally gzipped)
    #[arg(short = 'i', long = "sequence-file", required_unless_present = "region", conflicts_with = "region")]
    sequence_file: Option<PathBuf>,

    /// Region of the reference to analyse, e.g. 2L:1530-1590
    #[arg(short, long, requires = "reference")]
    region: Option<String>,

    /// Reference FASTA used with --region
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Protospacer adjacent motif (IUPAC)
    #[arg(short = 'P', long, default_value = DEFAULT_PAM)]
    pam: String,

    /// Tab-separated variants: contig, start, end, [id], [allele frequencies]
    #[arg(short, long)]
    variants: Option<PathBuf>,

    /// Maximum length of each flanking arm
    #[arg(short = 'M', long = "max-flanking", default_value_t = DEFAULT_MAX_FLANKING)]
    max_flanking_length: usize,

    /// Minimum length of each flanking arm
    #[arg(short = 'm', long = "min-flanking", default_value_t = DEFAULT_MIN_FLANKING)]
    min_flanking_length: usize,

    /// Length weight used in outcome scoring
    #[arg(short = 'w', long, default_value_t = DEFAULT_LENGTH_WEIGHT)]
    length_weight: f64,

    /// Number of outcomes used in guide evaluation
    #[arg(short = 'p', long, default_value_t = DEFAULT_N_PATTERNS)]
    n_patterns: usize,

    /// Output folder; the guide table goes to stdout when omitted
    #[arg(short, long = "output-folder")]
    output_folder: Option<PathBuf>,

    /// Also write (or print) the full records as JSON
    #[arg(long)]
    json: bool,

    /// Number of threads to use (default: number of logical CPUs)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn params(&self) -> AnalysisParams {
        AnalysisParams {
            pam: self.pam.clone(),
            min_flanking_length: self.min_flanking_length,
            max_flanking_length: self.max_flanking_length,
            length_weight: self.length_weight,
            n_patterns: self.n_patterns,
        }
    }

    fn load_region(&self) -> anyhow::Result<Region> {
        if let Some(path) = &self.sequence_file {
            return read_sequence_file(path)
                .with_context(|| format!("Failed to read sequence from {}", path.display()));
        }
        match (&self.region, &self.reference) {
            (Some(region), Some(reference)) => {
                let spec = parse_region(region)?;
                info!("Using reference {}. Region: {}", reference.display(), region);
                load_region(reference, &spec)
                    .with_context(|| format!("Failed to load {} from {}", region, reference.display()))
            }
            _ => anyhow::bail!("Provide either --sequence-file or --region with --reference"),
        }
    }
}

fn write_to<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    write(&mut out).with_context(|| format!("Failed to write {}", path.display()))?;
    out.flush()?;
    Ok(())
}

fn write_outputs(report: &AnalysisReport, folder: &Path, json: bool) -> anyhow::Result<()> {
    fs::create_dir_all(folder)
        .with_context(|| format!("Failed to create output folder {}", folder.display()))?;

    write_to(&folder.join("guides.tsv"), |out| write_guides_tsv(out, &report.guides))?;
    write_to(&folder.join("detailed.txt"), |out| write_detailed_report(out, &report.guides))?;
    write_to(&folder.join("guides.bed"), |out| write_bed(out, &report.guides))?;
    if json {
        write_to(&folder.join("guides.json"), |out| write_json(out, report))?;
    }
    info!("Results written to {}", folder.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("mhguide=debug,info")
    } else {
        EnvFilter::new("mhguide=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }

    let region = args.load_region()?;
    let variants = match &args.variants {
        Some(path) => read_variants(path)
            .with_context(|| format!("Failed to read variants from {}", path.display()))?,
        None => Vec::new(),
    };

    let report = analyze_region(&region, &args.params(), &variants)?;
    info!(
        "{} guide(s) evaluated, {} of {} cut site(s) excluded for unresolved bases",
        report.guides.len(),
        report.excluded_ambiguous,
        report.total_sites
    );

    match &args.output_folder {
        Some(folder) => write_outputs(&report, folder, args.json)?,
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            if args.json {
                write_json(&mut out, &report)?;
            } else {
                write_guides_tsv(&mut out, &report.guides)?;
            }
            out.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library() {
        let args = Args::try_parse_from(["mhguide", "-i", "target.fa"]).unwrap();
        assert_eq!(args.params(), AnalysisParams::default());
        assert_eq!(args.sequence_file, Some(PathBuf::from("target.fa")));
        assert!(!args.json);
    }

    #[test]
    fn test_region_requires_reference() {
        assert!(Args::try_parse_from(["mhguide", "-r", "2L:1-100"]).is_err());
        let args =
            Args::try_parse_from(["mhguide", "-r", "2L:1-100", "--reference", "ref.fa"]).unwrap();
        assert_eq!(args.region.as_deref(), Some("2L:1-100"));
    }

    #[test]
    fn test_sequence_and_region_conflict() {
        assert!(Args::try_parse_from([
            "mhguide",
            "-i",
            "target.fa",
            "-r",
            "2L:1-100",
            "--reference",
            "ref.fa"
        ])
        .is_err());
        assert!(Args::try_parse_from(["mhguide"]).is_err());
    }

    #[test]
    fn test_scoring_options() {
        let args = Args::try_parse_from([
            "mhguide", "-i", "t.txt", "-P", "NAG", "-m", "10", "-M", "20", "-w", "15.5", "-p", "3",
        ])
        .unwrap();
        let params = args.params();
        assert_eq!(params.pam, "NAG");
        assert_eq!(params.min_flanking_length, 10);
        assert_eq!(params.max_flanking_length, 20);
        assert_eq!(params.length_weight, 15.5);
        assert_eq!(params.n_patterns, 3);
    }
}
