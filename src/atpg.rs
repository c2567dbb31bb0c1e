//! Test pattern generation with the D-algorithm
//!
//! ```
//! use datpg::atpg::{AtpgConfig, DAlgorithm};
//! use datpg::sim::{Fault, FaultKind};
//! use datpg::{GateType, Network};
//!
//! let mut net = Network::new();
//! let a = net.add_input("a").unwrap();
//! let b = net.add_input("b").unwrap();
//! let f = net.add_gate_net("f", GateType::And, &[a, b]).unwrap();
//! net.add_output(f).unwrap();
//!
//! let engine = DAlgorithm::new(&net, AtpgConfig::default()).unwrap();
//! let vector = engine.generate_test(Fault::new(f, FaultKind::StuckAt0)).unwrap();
//! assert_eq!(vector.bits(), &[true, true]);
//! ```

mod patterns;
mod search;
mod state;

use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use kdam::{tqdm, BarExt};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::FaultEntry;
use crate::sim::{Fault, FaultError};
use crate::{Net, Network, NetworkError};

pub use patterns::compact_patterns;
pub use state::SignalState;

/// Reasons why the search did not find a test vector
///
/// The search does not distinguish redundant faults from faults it could not handle:
/// each variant records the dead end that was reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Untestable {
    /// Two requirements disagree on the value of a net
    #[error("conflicting values required on net {net}")]
    ImplicationConflict {
        /// Name of the net
        net: String,
    },
    /// The fault effect cannot move forward
    #[error("empty D-frontier")]
    EmptyDFrontier,
    /// No D-frontier gate has a path of unassigned nets to an output
    #[error("no propagation path to an output")]
    NoPropagationPath,
    /// The iteration ceiling was reached
    #[error("iteration budget exceeded")]
    IterationBudgetExceeded,
    /// Every allowed backtrack was used
    #[error("backtrack limit reached")]
    BacktrackLimitReached,
    /// The completed vector does not expose the fault
    #[error("fault effect not observed with the completed vector")]
    NotObserved,
}

/// Options of the test generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtpgConfig {
    /// Maximum number of iterations per fault; defaults to the number of nets plus gates, plus one
    pub max_iterations: Option<usize>,
    /// Maximum number of backtracks per fault; 0 for a single greedy pass
    pub backtrack_limit: usize,
    /// Check each generated vector with a fault simulation
    pub verify: bool,
}

impl Default for AtpgConfig {
    fn default() -> Self {
        AtpgConfig {
            max_iterations: None,
            backtrack_limit: 0,
            verify: true,
        }
    }
}

/// A test vector: one value per primary input, in declaration order
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TestVector {
    bits: Vec<bool>,
}

impl TestVector {
    /// Create a vector from the input values
    pub fn new(bits: Vec<bool>) -> TestVector {
        TestVector { bits }
    }

    /// Values of the primary inputs
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of inputs
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns whether the network has no input
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Map from input names to '0' or '1'
    pub fn named(&self, aig: &Network) -> IndexMap<String, char> {
        aig.inputs()
            .iter()
            .zip(self.bits.iter())
            .map(|(n, b)| (aig.name(*n).to_string(), if *b { '1' } else { '0' }))
            .collect()
    }
}

impl fmt::Display for TestVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bits {
            write!(f, "{}", if *b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// The D-algorithm test generator for a network
///
/// The engine is never modified by test generation, so that it can be shared between threads.
pub struct DAlgorithm<'a> {
    aig: &'a Network,
    config: AtpgConfig,
    order: Vec<Net>,
}

impl<'a> DAlgorithm<'a> {
    /// Create the engine; fails if the network contains a combinational loop
    pub fn new(aig: &'a Network, config: AtpgConfig) -> Result<DAlgorithm<'a>, NetworkError> {
        let order = aig.topo_order()?;
        Ok(DAlgorithm { aig, config, order })
    }

    /// Network targeted by the engine
    pub fn network(&self) -> &'a Network {
        self.aig
    }

    /// Configuration of the engine
    pub fn config(&self) -> &AtpgConfig {
        &self.config
    }

    /// Topological order of the nets
    pub(crate) fn order(&self) -> &[Net] {
        &self.order
    }

    /// Iteration ceiling for a single fault
    pub fn max_iterations(&self) -> usize {
        self.config
            .max_iterations
            .unwrap_or(self.aig.nb_nets() + self.aig.nb_gates() + 1)
    }

    /// Generate a test vector for a single stuck-at fault
    pub fn generate_test(&self, fault: Fault) -> Result<TestVector, Untestable> {
        let ret = search::Search::new(self, fault).run();
        match &ret {
            Ok(v) => debug!("{}: detected by {}", fault.describe(self.aig), v),
            Err(e) => debug!("{}: untestable, {}", fault.describe(self.aig), e),
        }
        ret
    }

    /// Generate a test vector from a net name and a fault type string
    ///
    /// Returns an error if the fault is invalid, and None if no test vector was found.
    pub fn generate_test_by_name(
        &self,
        net: &str,
        kind: &str,
    ) -> Result<Option<TestVector>, FaultError> {
        let fault = Fault::from_names(self.aig, net, kind)?;
        Ok(self.generate_test(fault).ok())
    }

    /// Generate test vectors for several faults in parallel
    pub fn generate_tests(&self, faults: &[Fault]) -> Vec<Result<TestVector, Untestable>> {
        faults.par_iter().map(|f| self.generate_test(*f)).collect()
    }
}

/// Result of test generation for an entry of a fault list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A test vector was found
    Detected(TestVector),
    /// The search failed
    Untestable(Untestable),
    /// The fault does not make sense for the network
    Invalid(FaultError),
}

/// Fault list entry with its outcome
#[derive(Clone, Debug)]
pub struct FaultResult {
    /// Entry of the fault list
    pub entry: FaultEntry,
    /// Fault, if the entry is valid
    pub fault: Option<Fault>,
    /// Outcome of the test generation
    pub outcome: Outcome,
}

/// Results of test generation for a whole fault list
#[derive(Clone, Debug, Default)]
pub struct AtpgReport {
    /// Results, in fault list order
    pub results: Vec<FaultResult>,
    /// Compacted test set, if compaction was run
    pub patterns: Option<Vec<TestVector>>,
}

impl AtpgReport {
    /// Number of faults
    pub fn nb_faults(&self) -> usize {
        self.results.len()
    }

    /// Number of faults with a test vector
    pub fn nb_detected(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Detected(_)))
    }

    /// Number of faults where the search failed
    pub fn nb_untestable(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Untestable(_)))
    }

    /// Number of invalid faults
    pub fn nb_invalid(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Invalid(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Ratio of detected faults among the valid ones
    pub fn coverage(&self) -> f64 {
        let valid = self.nb_faults() - self.nb_invalid();
        if valid == 0 {
            1.0
        } else {
            self.nb_detected() as f64 / valid as f64
        }
    }

    /// Keep a minimal subset of the generated vectors that detects all detected faults
    pub fn compact(&mut self, aig: &Network) -> Result<(), NetworkError> {
        let mut faults = Vec::new();
        let mut vectors = Vec::new();
        for r in &self.results {
            if let (Some(f), Outcome::Detected(v)) = (r.fault, &r.outcome) {
                faults.push(f);
                vectors.push(v.clone());
            }
        }
        let vectors: Vec<TestVector> = vectors.into_iter().unique().collect();
        let kept = compact_patterns(aig, &faults, &vectors)?;
        info!(
            "Kept {} test vectors out of {} distinct vectors",
            kept.len(),
            vectors.len()
        );
        self.patterns = Some(kept);
        Ok(())
    }

    /// Test set of the report: the compacted vectors if compaction was run, or else every
    /// distinct generated vector in fault list order
    pub fn vectors(&self) -> Vec<TestVector> {
        match &self.patterns {
            Some(p) => p.clone(),
            None => self
                .results
                .iter()
                .filter_map(|r| match &r.outcome {
                    Outcome::Detected(v) => Some(v.clone()),
                    _ => None,
                })
                .unique()
                .collect(),
        }
    }
}

fn run_entry(engine: &DAlgorithm, entry: &FaultEntry) -> FaultResult {
    match entry.to_fault(engine.network()) {
        Ok(fault) => {
            let outcome = match engine.generate_test(fault) {
                Ok(v) => Outcome::Detected(v),
                Err(e) => Outcome::Untestable(e),
            };
            FaultResult {
                entry: entry.clone(),
                fault: Some(fault),
                outcome,
            }
        }
        Err(e) => {
            warn!("Skipping fault {}: {}", entry.id, e);
            FaultResult {
                entry: entry.clone(),
                fault: None,
                outcome: Outcome::Invalid(e),
            }
        }
    }
}

/// Run test generation on every entry of a fault list
///
/// Invalid entries are recorded and skipped. Results are in fault list order, whether the faults
/// are processed sequentially or in parallel.
pub fn run_fault_list(engine: &DAlgorithm, entries: &[FaultEntry], parallel: bool) -> AtpgReport {
    let aig = engine.network();
    let mut progress = tqdm!(total = entries.len());
    progress.set_description("Faults processed");
    progress
        .write(format!(
            "Analyzing network with {} inputs, {} outputs and {} faults",
            aig.nb_inputs(),
            aig.nb_outputs(),
            entries.len(),
        ))
        .ok();

    let mut results = Vec::with_capacity(entries.len());
    let chunk_size = if parallel { 256 } else { 1 };
    for chunk in entries.chunks(chunk_size) {
        if parallel {
            let res: Vec<FaultResult> = chunk.par_iter().map(|e| run_entry(engine, e)).collect();
            results.extend(res);
        } else {
            results.extend(chunk.iter().map(|e| run_entry(engine, e)));
        }
        progress.update(chunk.len()).ok();
    }

    let report = AtpgReport {
        results,
        patterns: None,
    };
    info!(
        "{} faults: {} detected, {} untestable, {} invalid ({:.2}% coverage)",
        report.nb_faults(),
        report.nb_detected(),
        report.nb_untestable(),
        report.nb_invalid(),
        100.0 * report.coverage()
    );
    report
}
