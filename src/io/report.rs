//! Text and JSON reports of test generation results

use std::io::Write;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::atpg::{AtpgReport, Outcome, TestVector};
use crate::sim::{Fault, FaultCoverage};
use crate::Network;

const SEPARATOR_WIDTH: usize = 60;

fn vector_to_string(aig: &Network, v: &TestVector) -> String {
    let values = v
        .named(aig)
        .into_iter()
        .map(|(n, c)| format!("{n}: {c}"))
        .join(", ");
    format!("{{{values}}}")
}

/// Write the report as text: one block per fault, then a summary
pub fn write_report_text<W: Write>(
    w: &mut W,
    aig: &Network,
    report: &AtpgReport,
) -> std::io::Result<()> {
    writeln!(w, "ATPG Test Results")?;
    writeln!(w, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(w)?;
    for r in &report.results {
        writeln!(w, "FAULT {} | {}", r.entry.id, r.entry.description())?;
        match &r.outcome {
            Outcome::Detected(v) => {
                writeln!(w, "  --> Test vector: {}", vector_to_string(aig, v))?
            }
            Outcome::Untestable(e) => writeln!(w, "  --> Test vector: UNDETECTABLE ({e})")?,
            Outcome::Invalid(e) => writeln!(w, "  --> INVALID: {e}")?,
        }
        writeln!(w)?;
    }
    writeln!(w, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(w, "Summary:")?;
    writeln!(w, "  Total faults     : {}", report.nb_faults())?;
    writeln!(w, "  Detected         : {}", report.nb_detected())?;
    writeln!(w, "  Undetectable     : {}", report.nb_untestable())?;
    writeln!(w, "  Invalid          : {}", report.nb_invalid())?;
    writeln!(w, "  Coverage         : {:.2}%", 100.0 * report.coverage())?;
    if let Some(patterns) = &report.patterns {
        writeln!(w)?;
        writeln!(
            w,
            "Compacted test set ({} vectors, inputs {}):",
            patterns.len(),
            aig.inputs().iter().map(|n| aig.name(*n)).join(" ")
        )?;
        for p in patterns {
            writeln!(w, "  {p}")?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryJson {
    total: usize,
    detected: usize,
    undetectable: usize,
    invalid: usize,
    coverage: f64,
}

#[derive(Serialize)]
struct FaultJson<'a> {
    id: &'a str,
    node: &'a str,
    fault_type: &'a str,
    description: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_vector: Option<IndexMap<String, char>>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    summary: SummaryJson,
    faults: Vec<FaultJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patterns: Option<Vec<IndexMap<String, char>>>,
}

/// Write the report as JSON
pub fn write_report_json<W: Write>(
    w: &mut W,
    aig: &Network,
    report: &AtpgReport,
) -> std::io::Result<()> {
    let faults = report
        .results
        .iter()
        .map(|r| {
            let (status, reason, test_vector) = match &r.outcome {
                Outcome::Detected(v) => ("detected", None, Some(v.named(aig))),
                Outcome::Untestable(e) => ("undetectable", Some(e.to_string()), None),
                Outcome::Invalid(e) => ("invalid", Some(e.to_string()), None),
            };
            FaultJson {
                id: &r.entry.id,
                node: &r.entry.node,
                fault_type: &r.entry.fault_type,
                description: r.entry.description(),
                status,
                reason,
                test_vector,
            }
        })
        .collect();
    let json = ReportJson {
        summary: SummaryJson {
            total: report.nb_faults(),
            detected: report.nb_detected(),
            undetectable: report.nb_untestable(),
            invalid: report.nb_invalid(),
            coverage: report.coverage(),
        },
        faults,
        patterns: report
            .patterns
            .as_ref()
            .map(|p| p.iter().map(|v| v.named(aig)).collect()),
    };
    serde_json::to_writer_pretty(&mut *w, &json)?;
    writeln!(w)?;
    Ok(())
}

/// Write the fault simulation results of a set of vectors as text
///
/// Vectors are shown with one character per input, in declaration order.
pub fn write_coverage_text<W: Write>(
    w: &mut W,
    aig: &Network,
    faults: &[Fault],
    vectors: &[TestVector],
    coverage: &FaultCoverage,
) -> std::io::Result<()> {
    writeln!(w, "Fault Coverage Report")?;
    writeln!(w, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(
        w,
        "Inputs            : {}",
        aig.inputs().iter().map(|n| aig.name(*n)).join(" ")
    )?;
    writeln!(w, "Vectors simulated : {}", coverage.nb_patterns)?;
    writeln!(w, "Faults            : {}", coverage.nb_faults())?;
    writeln!(w, "Detected          : {}", coverage.nb_detected())?;
    writeln!(w, "Fault coverage    : {:.2}%", 100.0 * coverage.coverage())?;
    writeln!(
        w,
        "Undetected faults : [{}]",
        coverage
            .undetected()
            .into_iter()
            .map(|f| faults[f].describe(aig))
            .join(", ")
    )?;
    writeln!(w)?;
    writeln!(w, "Detected faults and detecting vectors:")?;
    for (f, patterns) in faults.iter().zip(coverage.detecting.iter()) {
        if patterns.is_empty() {
            continue;
        }
        writeln!(
            w,
            "  {}: [{}]",
            f.describe(aig),
            patterns.iter().map(|p| &vectors[*p]).join(", ")
        )?;
    }
    writeln!(w, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_coverage_text, write_report_json, write_report_text};
    use crate::atpg::{run_fault_list, AtpgConfig, DAlgorithm, TestVector};
    use crate::io::FaultEntry;
    use crate::network::generators::testcases;
    use crate::sim::{Fault, FaultCoverage};

    fn report_text(json: bool) -> String {
        let aig = testcases::and2().unwrap();
        let engine = DAlgorithm::new(&aig, AtpgConfig::default()).unwrap();
        let entries = vec![
            FaultEntry::new("f:0", "f", "stuck-at-0"),
            FaultEntry::new("g:0", "g", "stuck-at-0"),
        ];
        let mut report = run_fault_list(&engine, &entries, false);
        report.compact(&aig).unwrap();
        let mut buf = Vec::new();
        if json {
            write_report_json(&mut buf, &aig, &report).unwrap();
        } else {
            write_report_text(&mut buf, &aig, &report).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text() {
        let text = report_text(false);
        assert!(text.starts_with("ATPG Test Results\n"));
        assert!(text.contains("FAULT f:0 | Node 'f' stuck-at-0\n  --> Test vector: {a: 1, b: 1}\n"));
        assert!(text.contains("FAULT g:0"));
        assert!(text.contains("  --> INVALID: Fault net g does not exist in the circuit"));
        assert!(text.contains("  Total faults     : 2\n"));
        assert!(text.contains("  Detected         : 1\n"));
        assert!(text.contains("  Invalid          : 1\n"));
        assert!(text.contains("  Coverage         : 100.00%\n"));
        assert!(text.contains("Compacted test set (1 vectors, inputs a b):\n  11\n"));
    }

    #[test]
    fn test_json() {
        let text = report_text(true);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["detected"], 1);
        assert_eq!(value["faults"][0]["status"], "detected");
        assert_eq!(value["faults"][0]["test_vector"]["a"], "1");
        assert_eq!(value["faults"][1]["status"], "invalid");
        assert!(value["faults"][1].get("test_vector").is_none());
        assert_eq!(value["patterns"][0]["b"], "1");
    }

    #[test]
    fn test_coverage_text() {
        let aig = testcases::and2().unwrap();
        let faults = Fault::all(&aig);
        let vectors = vec![
            TestVector::new(vec![true, true]),
            TestVector::new(vec![false, true]),
        ];
        let bits: Vec<Vec<bool>> = vectors.iter().map(|v| v.bits().to_vec()).collect();
        let coverage = FaultCoverage::new(&aig, &faults, &bits).unwrap();
        let mut buf = Vec::new();
        write_coverage_text(&mut buf, &aig, &faults, &vectors, &coverage).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Fault Coverage Report\n"));
        assert!(text.contains("Inputs            : a b\n"));
        assert!(text.contains("Vectors simulated : 2\n"));
        assert!(text.contains("Fault coverage    : 83.33%\n"));
        assert!(text.contains("Undetected faults : [Net b stuck-at-1]\n"));
        assert!(text.contains("  Net f stuck-at-0: [11]\n"));
        assert!(text.contains("  Net a stuck-at-1: [01]\n"));
        assert!(!text.contains("  Net b stuck-at-1:"));
    }
}
