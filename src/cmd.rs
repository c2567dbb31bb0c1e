//! Command line interface

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use datpg::atpg::{run_fault_list, AtpgConfig, DAlgorithm};
use datpg::io::{
    read_fault_file, read_network_file, read_vector_file, write_coverage_text, write_fault_file,
    write_report_file, write_vector_file, FaultEntry, ReadError, ReportFormat,
};
use datpg::sim::{Fault, FaultCoverage};
use datpg::{Network, NetworkError};
use tracing::{info, warn};

/// Errors reported by the command line
#[derive(Debug, thiserror::Error)]
pub enum CmdError {
    /// Error while reading an input file
    #[error("{0}")]
    Read(#[from] ReadError),
    /// Error while writing an output file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The circuit cannot be processed
    #[error("{0}")]
    Network(#[from] NetworkError),
    /// The configuration file is invalid
    #[error("Invalid configuration {path}: {source}")]
    Config {
        /// Path of the configuration file
        path: String,
        /// Parsing error
        source: serde_json::Error,
    },
}

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter for the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a circuit
    ///
    /// Will print statistics on the number of inputs, outputs, gates and fanouts in the circuit.
    #[clap()]
    Show(ShowArgs),

    /// Write the list of stuck-at faults of a circuit
    ///
    /// By default, only checkpoint faults are listed: primary inputs, fanout stems and
    /// fanout branches. Detecting all checkpoint faults detects all stuck-at faults.
    #[clap()]
    Faults(FaultsArgs),

    /// Test pattern generation for a combinational circuit
    ///
    /// Generate a test vector for each stuck-at fault using the D-algorithm, and write a
    /// report with the vector or the reason why the fault could not be tested.
    #[clap()]
    Atpg(AtpgArgs),

    /// Fault simulation of a set of test vectors
    ///
    /// Report the fault coverage of the vectors, the undetected faults and the vectors that
    /// detect each fault.
    #[clap()]
    Coverage(CoverageArgs),
}

/// Command arguments for circuit informations
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show (.bench or .json)
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> Result<(), CmdError> {
        use datpg::network::stats::stats;
        let aig = read_network_file(&self.file)?;
        aig.check()?;
        println!("Network stats:\n{}\n\n", stats(&aig));
        Ok(())
    }
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Command arguments for fault list generation
#[derive(Args)]
pub struct FaultsArgs {
    /// Circuit to list the faults of
    file: PathBuf,

    /// Output file for the fault list
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// List the faults of every net, not only checkpoints
    #[arg(long)]
    all: bool,
}

impl FaultsArgs {
    pub fn run(&self) -> Result<(), CmdError> {
        let aig = read_network_file(&self.file)?;
        aig.check()?;
        let faults = if self.all {
            Fault::all(&aig)
        } else {
            Fault::checkpoints(&aig)
        };
        let entries = FaultEntry::from_faults(&aig, &faults);
        write_fault_file(&self.output, &module_name(&self.file), &entries)?;
        info!(
            "Wrote {} faults to {}",
            entries.len(),
            self.output.display()
        );
        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

/// Command arguments for test pattern generation
#[derive(Args)]
pub struct AtpgArgs {
    /// Circuit to write test patterns for
    network: PathBuf,

    /// Output file for the report
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Fault list; all checkpoint faults are targeted if not given
    #[arg(short = 'f', long)]
    faults: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,

    /// JSON configuration file for the engine
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of alternative propagation choices to try after a dead end
    #[arg(long)]
    backtrack_limit: Option<usize>,

    /// Maximum number of search iterations per fault
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Skip the fault simulation of generated vectors
    #[arg(long)]
    no_verify: bool,

    /// Process faults in parallel
    #[arg(short = 'p', long)]
    parallel: bool,

    /// Compute a compacted test set
    #[arg(long)]
    compact: bool,

    /// Output file for the test vectors: the compacted set with --compact, else every distinct
    /// generated vector
    #[arg(long)]
    vectors: Option<PathBuf>,
}

impl AtpgArgs {
    fn config(&self) -> Result<AtpgConfig, CmdError> {
        let mut config = match &self.config {
            Some(path) => {
                let f = File::open(path).map_err(ReadError::from)?;
                serde_json::from_reader(f).map_err(|source| CmdError::Config {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => AtpgConfig::default(),
        };
        if let Some(limit) = self.backtrack_limit {
            config.backtrack_limit = limit;
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = Some(max);
        }
        if self.no_verify {
            config.verify = false;
        }
        Ok(config)
    }

    pub fn run(&self) -> Result<(), CmdError> {
        let aig = read_network_file(&self.network)?;
        let engine = DAlgorithm::new(&aig, self.config()?)?;
        let entries = match &self.faults {
            Some(path) => read_fault_file(path)?,
            None => FaultEntry::from_faults(&aig, &Fault::checkpoints(&aig)),
        };

        let mut report = run_fault_list(&engine, &entries, self.parallel);
        if self.compact {
            report.compact(&aig)?;
        }
        let format = match self.format {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        };
        write_report_file(&self.output, &aig, &report, format)?;
        if let Some(path) = &self.vectors {
            let vectors = report.vectors();
            write_vector_file(path, &aig, &vectors)?;
            info!("Wrote {} test vectors to {}", vectors.len(), path.display());
        }
        println!(
            "Detected {} out of {} faults ({:.2}% coverage), {} invalid",
            report.nb_detected(),
            report.nb_faults() - report.nb_invalid(),
            100.0 * report.coverage(),
            report.nb_invalid()
        );
        Ok(())
    }
}

/// Faults of a fault list file, or all checkpoint faults; invalid entries are skipped
fn fault_list(aig: &Network, path: Option<&Path>) -> Result<Vec<Fault>, CmdError> {
    let Some(path) = path else {
        return Ok(Fault::checkpoints(aig));
    };
    let mut ret = Vec::new();
    for entry in read_fault_file(path)? {
        match entry.to_fault(aig) {
            Ok(f) => ret.push(f),
            Err(e) => warn!("Skipping fault {}: {}", entry.id, e),
        }
    }
    Ok(ret)
}

/// Command arguments for fault simulation
#[derive(Args)]
pub struct CoverageArgs {
    /// Circuit to simulate
    network: PathBuf,

    /// Test vectors, one per line as name=value pairs
    vectors: PathBuf,

    /// Fault list; all checkpoint faults are simulated if not given
    #[arg(short = 'f', long)]
    faults: Option<PathBuf>,

    /// Output file for the report; printed if not given
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl CoverageArgs {
    pub fn run(&self) -> Result<(), CmdError> {
        let aig = read_network_file(&self.network)?;
        aig.check()?;
        let vectors = read_vector_file(&self.vectors, &aig)?;
        let faults = fault_list(&aig, self.faults.as_deref())?;
        let bits: Vec<Vec<bool>> = vectors.iter().map(|v| v.bits().to_vec()).collect();
        let coverage = FaultCoverage::new(&aig, &faults, &bits)?;
        match &self.output {
            Some(path) => {
                let mut f = BufWriter::new(File::create(path)?);
                write_coverage_text(&mut f, &aig, &faults, &vectors, &coverage)?;
                f.flush()?;
                println!(
                    "Detected {} out of {} faults ({:.2}% coverage) with {} vectors",
                    coverage.nb_detected(),
                    coverage.nb_faults(),
                    100.0 * coverage.coverage(),
                    vectors.len()
                );
            }
            None => {
                let mut out = std::io::stdout().lock();
                write_coverage_text(&mut out, &aig, &faults, &vectors, &coverage)?;
            }
        }
        Ok(())
    }
}
