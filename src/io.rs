//! Read and write circuits, fault lists, test vectors and reports

mod bench;
mod faults;
mod netlist;
mod report;
mod vectors;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub use bench::read_bench;
pub use faults::{read_fault_list, write_fault_list, FaultEntry};
pub use netlist::read_netlist;
pub use report::{write_coverage_text, write_report_json, write_report_text};
pub use vectors::{read_vectors, write_vectors};

use crate::atpg::{AtpgReport, TestVector};
use crate::{Network, NetworkError};

/// Error while reading a circuit, a fault list or test vectors
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON, or does not have the expected shape
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A required section of the netlist is missing or inconsistent
    #[error("Malformed netlist: {0}")]
    MalformedNetlist(String),
    /// A cell or gate type that is not supported
    #[error("Unknown gate type {0}")]
    UnknownGateType(String),
    /// A .bench statement that cannot be handled
    #[error("Invalid .bench file: {0}")]
    Bench(String),
    /// A test vector line that cannot be handled
    #[error("Invalid vector file: {0}")]
    Vectors(String),
    /// The circuit described by the file is invalid
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The file extension does not correspond to a known format
    #[error("Unknown file format {0}")]
    UnknownFormat(String),
}

/// Format of an ATPG report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON, with one entry per fault
    Json,
}

/// Read a circuit from a file
///
/// Following extensions are supported: .bench, .json
pub fn read_network_file(path: &Path) -> Result<Network, ReadError> {
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "bench" => read_bench(File::open(path)?),
        "json" => read_netlist(File::open(path)?),
        _ => Err(ReadError::UnknownFormat(path.display().to_string())),
    }
}

/// Read a JSON fault list from a file
pub fn read_fault_file(path: &Path) -> Result<Vec<FaultEntry>, ReadError> {
    read_fault_list(File::open(path)?)
}

/// Write a JSON fault list to a file
pub fn write_fault_file(
    path: &Path,
    module_name: &str,
    entries: &[FaultEntry],
) -> std::io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_fault_list(&mut f, module_name, entries)?;
    f.flush()
}

/// Read test vectors for a network from a file
pub fn read_vector_file(path: &Path, aig: &Network) -> Result<Vec<TestVector>, ReadError> {
    read_vectors(File::open(path)?, aig)
}

/// Write test vectors to a file, one per line
pub fn write_vector_file(
    path: &Path,
    aig: &Network,
    vectors: &[TestVector],
) -> std::io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_vectors(&mut f, aig, vectors)?;
    f.flush()
}

/// Write an ATPG report to a file
pub fn write_report_file(
    path: &Path,
    aig: &Network,
    report: &AtpgReport,
    format: ReportFormat,
) -> std::io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    match format {
        ReportFormat::Text => write_report_text(&mut f, aig, report)?,
        ReportFormat::Json => write_report_json(&mut f, aig, report)?,
    }
    f.flush()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{read_network_file, ReadError};

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            read_network_file(Path::new("design.blif")),
            Err(ReadError::UnknownFormat(_))
        ));
        assert!(matches!(
            read_network_file(Path::new("does_not_exist.bench")),
            Err(ReadError::Io(_))
        ));
    }
}
