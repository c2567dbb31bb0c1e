//! Compute network statistics
//!
//! ```
//! # use datpg::Network;
//! # let net = Network::new();
//! use datpg::network::stats::stats;
//! let stats = stats(&net);
//!
//! // Check that there is no Xor gate
//! assert_eq!(stats.nb_gates_of(datpg::GateType::Xor), 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::{GateType, Network};

/// Number of inputs, outputs, nets and gates in a network
#[derive(Clone, Debug)]
pub struct NetworkStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of nets
    pub nb_nets: usize,
    /// Number of gates of each type, indexed like [`GateType::ALL`]
    pub nb_by_type: [usize; 8],
    /// Largest number of inputs of a gate
    pub max_arity: usize,
    /// Number of fanout stems
    pub nb_stems: usize,
    /// Number of fanout branches
    pub nb_branches: usize,
    /// Number of undriven internal nets
    pub nb_floating: usize,
}

impl NetworkStats {
    /// Total number of gates
    pub fn nb_gates(&self) -> usize {
        self.nb_by_type.iter().sum()
    }

    /// Number of gates of a given type
    pub fn nb_gates_of(&self, ty: GateType) -> usize {
        GateType::ALL
            .iter()
            .position(|t| *t == ty)
            .map(|i| self.nb_by_type[i])
            .unwrap_or(0)
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Nets: {}", self.nb_nets)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        for (ty, nb) in GateType::ALL.iter().zip(self.nb_by_type.iter()) {
            if *nb != 0 {
                writeln!(f, "      {}: {}", ty, nb)?;
            }
        }
        if self.nb_gates() != 0 {
            writeln!(f, "  Max arity: {}", self.max_arity)?;
        }
        if self.nb_stems != 0 {
            writeln!(f, "  Fanout stems: {}", self.nb_stems)?;
            writeln!(f, "      branches: {}", self.nb_branches)?;
        }
        if self.nb_floating != 0 {
            writeln!(f, "  Floating nets: {}", self.nb_floating)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the network
pub fn stats(a: &Network) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_inputs: a.nb_inputs(),
        nb_outputs: a.nb_outputs(),
        nb_nets: a.nb_nets(),
        nb_by_type: [0; 8],
        max_arity: 0,
        nb_stems: 0,
        nb_branches: 0,
        nb_floating: a.floating().len(),
    };
    for g in a.gates() {
        if let Some(i) = GateType::ALL.iter().position(|t| *t == g.ty()) {
            ret.nb_by_type[i] += 1;
        }
        ret.max_arity = ret.max_arity.max(g.inputs().len());
    }
    for n in a.nets() {
        let nb = a.branches(n).len();
        if nb != 0 {
            ret.nb_stems += 1;
            ret.nb_branches += nb;
        }
    }
    ret
}

/// Count the number of gate inputs connected to each net
pub fn count_net_usage(a: &Network) -> Vec<u32> {
    let mut ret = vec![0; a.nb_nets()];
    for g in a.gates() {
        for n in g.inputs() {
            ret[n.index()] += 1;
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::{count_net_usage, stats};
    use crate::network::generators::testcases;
    use crate::GateType;

    #[test]
    fn test_fanout_example() {
        let net = testcases::fanout_example().unwrap();
        let s = stats(&net);
        assert_eq!(s.nb_inputs, 4);
        assert_eq!(s.nb_outputs, 1);
        assert_eq!(s.nb_nets, 10);
        assert_eq!(s.nb_gates(), 4);
        assert_eq!(s.nb_gates_of(GateType::Or), 2);
        assert_eq!(s.nb_gates_of(GateType::Xor), 1);
        assert_eq!(s.nb_gates_of(GateType::And), 1);
        assert_eq!(s.nb_stems, 1);
        assert_eq!(s.nb_branches, 2);
        assert_eq!(s.nb_floating, 0);
        assert_eq!(s.max_arity, 2);
        format!("{}", s);
    }

    #[test]
    fn test_usage() {
        let net = testcases::c17().unwrap();
        let usage = count_net_usage(&net);
        let n11 = net.net("11").unwrap();
        let n22 = net.net("22").unwrap();
        assert_eq!(usage[n11.index()], 2);
        assert_eq!(usage[n22.index()], 0);
    }
}
