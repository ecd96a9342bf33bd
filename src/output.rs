//! Writers for evaluated guides: summary table, detailed report, BED and JSON.

use std::io::{self, Write};

use crate::evaluate::EvaluatedGuide;

/// Guides ordered by descending complete score, ties in input order.
pub fn ranked(guides: &[EvaluatedGuide]) -> Vec<&EvaluatedGuide> {
    let mut ranked: Vec<&EvaluatedGuide> = guides.iter().collect();
    ranked.sort_by(|a, b| {
        b.evaluation
            .complete_score
            .total_cmp(&a.evaluation.complete_score)
    });
    ranked
}

pub fn write_guides_tsv<W: Write>(out: &mut W, guides: &[EvaluatedGuide]) -> io::Result<()> {
    writeln!(
        out,
        "contig\tstrand\tbreak\tguide_start\tguide_end\tguide\tpam\tsum_score\toof_score\tcomplete_score\tvariants\twt_prob"
    )?;
    for guide in ranked(guides) {
        let site = &guide.site;
        let eval = &guide.evaluation;
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{}\t{}",
            site.guide_location.contig,
            site.record.strand,
            site.break_abs,
            site.guide_location.start,
            site.guide_location.end,
            site.record.guide,
            site.record.pam,
            eval.sum_score,
            eval.oof_score,
            eval.complete_score,
            eval.variants.len(),
            eval.wt_prob,
        )?;
    }
    Ok(())
}

/// Per guide, a header line followed by its top outcomes drawn as the repaired arms.
pub fn write_detailed_report<W: Write>(out: &mut W, guides: &[EvaluatedGuide]) -> io::Result<()> {
    for (rank, guide) in ranked(guides).into_iter().enumerate() {
        let site = &guide.site;
        let eval = &guide.evaluation;
        writeln!(
            out,
            "# guide_{}\t{}:{}\t{}\t{}\tcomplete_score={:.2}\tsum_score={:.2}",
            rank + 1,
            site.guide_location.contig,
            site.break_abs,
            site.record.strand,
            site.record.guide,
            eval.complete_score,
            eval.sum_score,
        )?;

        let left = site.record.left_arm();
        let right = site.record.right_arm();
        for outcome in &eval.top_outcomes {
            let (left_view, right_view) = outcome.alignment(left, right);
            writeln!(
                out,
                "{}|{}\t{}\t{}\t{}\t{:.2}",
                left_view,
                right_view,
                outcome.pattern.sequence,
                outcome.deletion_length,
                outcome.frame_shift,
                outcome.score,
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// BED6 rows over the guide intervals, scored by rounded complete score.
pub fn write_bed<W: Write>(out: &mut W, guides: &[EvaluatedGuide]) -> io::Result<()> {
    for (rank, guide) in ranked(guides).into_iter().enumerate() {
        let location = &guide.site.guide_location;
        writeln!(
            out,
            "{}\t{}\t{}\tguide_{}\t{}\t{}",
            location.contig,
            location.start.max(0),
            location.end,
            rank + 1,
            guide.evaluation.complete_score.round() as i64,
            guide.site.record.strand,
        )?;
    }
    Ok(())
}

pub fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisParams;
    use crate::pipeline::analyze_region_sequential;
    use crate::sequence::Region;

    const TARGET: &[u8] = b"GATTACAGCTAGCTAGGCTAACGTTGCATGCAGGTCAATGCTAGCATCGATCGGACTAGCTAGCATGCAGG\
ATCGATGCTAGCTAGCTGGATCGATCGTAGCTAGCATGCATCGGATTACAGCATGCA";

    fn guides() -> Vec<EvaluatedGuide> {
        let region = Region::new("chrT", 0, TARGET);
        let params = AnalysisParams {
            min_flanking_length: 10,
            max_flanking_length: 20,
            ..AnalysisParams::default()
        };
        analyze_region_sequential(&region, &params, &[]).unwrap().guides
    }

    #[test]
    fn test_ranked_descending() {
        let guides = guides();
        assert!(!guides.is_empty());
        let ranked = ranked(&guides);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].evaluation.complete_score >= w[1].evaluation.complete_score));
    }

    #[test]
    fn test_tsv_has_row_per_guide() {
        let guides = guides();
        let mut buf = Vec::new();
        write_guides_tsv(&mut buf, &guides).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), guides.len() + 1);
        assert!(lines[0].starts_with("contig\tstrand\tbreak"));
        assert!(lines[1..].iter().all(|l| l.starts_with("chrT\t") && l.split('\t').count() == 12));
    }

    #[test]
    fn test_detailed_report() {
        let guides = guides();
        let mut buf = Vec::new();
        write_detailed_report(&mut buf, &guides).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("# guide_").count(), guides.len());
        assert!(text
            .lines()
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .all(|l| l.contains('|') && l.split('\t').count() == 5));

        for guide in &guides {
            let record = &guide.site.record;
            for outcome in &guide.evaluation.top_outcomes {
                let (left, right) = outcome.alignment(record.left_arm(), record.right_arm());
                assert_eq!(left.len() + right.len(), record.window.len());
            }
        }
    }

    #[test]
    fn test_bed_and_json() {
        let guides = guides();
        let mut bed = Vec::new();
        write_bed(&mut bed, &guides).unwrap();
        let bed = String::from_utf8(bed).unwrap();
        assert_eq!(bed.lines().count(), guides.len());
        assert!(bed.lines().all(|l| l.split('\t').count() == 6));

        let mut json = Vec::new();
        write_json(&mut json, &guides).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(guides.len()));
        assert!(parsed[0]["evaluation"]["complete_score"].is_number());
        assert!(parsed[0]["site"]["guide"].is_string());
    }
}
