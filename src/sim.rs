//! Simulation of a logic network. Faster, multi-pattern simulation methods are available internally.

mod fault;
mod simple_sim;

use crate::{Network, NetworkError};

pub use fault::{Fault, FaultError, FaultKind};
pub(crate) use simple_sim::SimpleSimulator;

/// Simple conversion to 64b format
pub(crate) fn bool_to_word(b: bool) -> u64 {
    if b {
        !0
    } else {
        0
    }
}

/// Pack up to 64 patterns into one word per input
fn pack_patterns(nb_inputs: usize, patterns: &[Vec<bool>]) -> Vec<u64> {
    debug_assert!(patterns.len() <= 64);
    let mut ret = vec![0u64; nb_inputs];
    for (i, p) in patterns.iter().enumerate() {
        assert_eq!(p.len(), nb_inputs);
        for (w, b) in ret.iter_mut().zip(p) {
            *w |= (*b as u64) << i;
        }
    }
    ret
}

/// Simulate a combinatorial network; return the output values
pub fn simulate(a: &Network, input_values: &[bool]) -> Result<Vec<bool>, NetworkError> {
    simulate_impl(a, input_values, None)
}

/// Simulate a combinatorial network with a fault injected; return the output values
pub fn simulate_with_fault(
    a: &Network,
    input_values: &[bool],
    fault: Fault,
) -> Result<Vec<bool>, NetworkError> {
    simulate_impl(a, input_values, Some(fault))
}

fn simulate_impl(
    a: &Network,
    input_values: &[bool],
    fault: Option<Fault>,
) -> Result<Vec<bool>, NetworkError> {
    let order = a.topo_order()?;
    let mut sim = SimpleSimulator::from_order(a, &order);
    let words: Vec<u64> = input_values.iter().map(|b| bool_to_word(*b)).collect();
    let ret = sim.run(&words, &[], fault);
    Ok(ret.iter().map(|w| *w & 1 != 0).collect())
}

/// Returns whether the pattern exposes the fault at a primary output
pub fn detects_fault(a: &Network, pattern: &[bool], fault: Fault) -> Result<bool, NetworkError> {
    Ok(simulate(a, pattern)? != simulate_with_fault(a, pattern, fault)?)
}

/// Compute which faults are detected by each pattern
///
/// Returns, for each pattern, the indices of the faults it detects.
/// Patterns are simulated 64 at a time.
pub fn detection_table(
    a: &Network,
    faults: &[Fault],
    patterns: &[Vec<bool>],
) -> Result<Vec<Vec<usize>>, NetworkError> {
    let order = a.topo_order()?;
    let mut sim = SimpleSimulator::from_order(a, &order);
    let mut ret = vec![Vec::new(); patterns.len()];
    for (chunk_ind, chunk) in patterns.chunks(64).enumerate() {
        let mask = if chunk.len() == 64 {
            !0u64
        } else {
            (1u64 << chunk.len()) - 1
        };
        let words = pack_patterns(a.nb_inputs(), chunk);
        let expected = sim.run(&words, &[], None);
        for (i, f) in faults.iter().enumerate() {
            let actual = sim.run(&words, &[], Some(*f));
            let mut diff = expected
                .iter()
                .zip(actual.iter())
                .fold(0u64, |acc, (e, a)| acc | (e ^ a))
                & mask;
            while diff != 0 {
                let bit = diff.trailing_zeros() as usize;
                ret[64 * chunk_ind + bit].push(i);
                diff &= diff - 1;
            }
        }
    }
    Ok(ret)
}

/// Compute which faults are detected by at least one of the patterns
pub fn fault_coverage(
    a: &Network,
    faults: &[Fault],
    patterns: &[Vec<bool>],
) -> Result<Vec<bool>, NetworkError> {
    let mut ret = vec![false; faults.len()];
    for detected in detection_table(a, faults, patterns)? {
        for f in detected {
            ret[f] = true;
        }
    }
    Ok(ret)
}

/// Detecting patterns of each fault of a fault list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultCoverage {
    /// For each fault, the indices of the patterns that detect it
    pub detecting: Vec<Vec<usize>>,
    /// Number of patterns simulated
    pub nb_patterns: usize,
}

impl FaultCoverage {
    /// Fault simulate the patterns against every fault
    pub fn new(
        a: &Network,
        faults: &[Fault],
        patterns: &[Vec<bool>],
    ) -> Result<FaultCoverage, NetworkError> {
        let mut detecting = vec![Vec::new(); faults.len()];
        for (p, detected) in detection_table(a, faults, patterns)?.iter().enumerate() {
            for f in detected {
                detecting[*f].push(p);
            }
        }
        Ok(FaultCoverage {
            detecting,
            nb_patterns: patterns.len(),
        })
    }

    /// Number of faults
    pub fn nb_faults(&self) -> usize {
        self.detecting.len()
    }

    /// Number of faults detected by at least one pattern
    pub fn nb_detected(&self) -> usize {
        self.detecting.iter().filter(|p| !p.is_empty()).count()
    }

    /// Indices of the faults that no pattern detects
    pub fn undetected(&self) -> Vec<usize> {
        (0..self.nb_faults())
            .filter(|f| self.detecting[*f].is_empty())
            .collect()
    }

    /// Ratio of detected faults; 1 for an empty fault list
    pub fn coverage(&self) -> f64 {
        if self.nb_faults() == 0 {
            1.0
        } else {
            self.nb_detected() as f64 / self.nb_faults() as f64
        }
    }
}
