use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::logic::Value;
use crate::network::stats;
use crate::{Net, Network};

/// Errors raised when a fault does not make sense for a network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultError {
    /// The fault refers to a net that does not exist
    #[error("Fault net {0} does not exist in the circuit")]
    UnknownFaultNet(String),
    /// The fault type is not a stuck-at fault
    #[error("Invalid fault type {0}")]
    InvalidFaultKind(String),
}

/// Polarity of a stuck-at fault
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum FaultKind {
    /// The net is stuck at 0
    StuckAt0,
    /// The net is stuck at 1
    StuckAt1,
}

impl FaultKind {
    /// Value forced on the net by the fault
    pub fn value(&self) -> bool {
        matches!(self, FaultKind::StuckAt1)
    }

    /// Fault-free value that activates the fault
    pub fn activation_value(&self) -> bool {
        !self.value()
    }

    /// Five-valued symbol placed on the net when the fault is activated
    pub fn sensitizing_value(&self) -> Value {
        match self {
            FaultKind::StuckAt0 => Value::D,
            FaultKind::StuckAt1 => Value::DBar,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stuck-at-{}", i32::from(self.value()))
    }
}

impl FromStr for FaultKind {
    type Err = FaultError;

    fn from_str(s: &str) -> Result<FaultKind, FaultError> {
        match s.trim().to_lowercase().as_str() {
            "stuck-at-0" | "sa0" | "0" => Ok(FaultKind::StuckAt0),
            "stuck-at-1" | "sa1" | "1" => Ok(FaultKind::StuckAt1),
            _ => Err(FaultError::InvalidFaultKind(s.to_string())),
        }
    }
}

/// Representation of a single stuck-at fault, with its location and polarity
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fault {
    /// Net where the fault is located
    pub net: Net,
    /// Fault polarity
    pub kind: FaultKind,
}

impl Fault {
    /// Create a new fault
    pub fn new(net: Net, kind: FaultKind) -> Fault {
        Fault { net, kind }
    }

    /// Create a fault from a net name and a fault type string
    pub fn from_names(aig: &Network, net: &str, kind: &str) -> Result<Fault, FaultError> {
        let n = aig
            .net(net)
            .ok_or_else(|| FaultError::UnknownFaultNet(net.to_string()))?;
        Ok(Fault::new(n, kind.parse()?))
    }

    /// Get all possible faults in a network: both polarities on every net
    pub fn all(aig: &Network) -> Vec<Fault> {
        let mut ret = Vec::new();
        for net in aig.nets() {
            for kind in [FaultKind::StuckAt0, FaultKind::StuckAt1] {
                ret.push(Fault::new(net, kind));
            }
        }
        ret
    }

    /// Get the checkpoint faults of a network
    ///
    /// Checkpoints are the primary inputs, the fanout stems and the fanout branches.
    /// A net used by several gates without explicit branches is a stem as well.
    /// Primary outputs are not checkpoints.
    pub fn checkpoints(aig: &Network) -> Vec<Fault> {
        let usage = stats::count_net_usage(aig);
        let mut ret = Vec::new();
        for net in aig.nets() {
            if aig.is_output(net) {
                continue;
            }
            let is_checkpoint = aig.is_input(net)
                || !aig.branches(net).is_empty()
                || aig.stem(net).is_some()
                || usage[net.index()] > 1;
            if is_checkpoint {
                for kind in [FaultKind::StuckAt0, FaultKind::StuckAt1] {
                    ret.push(Fault::new(net, kind));
                }
            }
        }
        ret
    }

    /// Human-readable description, using the net names
    pub fn describe(&self, aig: &Network) -> String {
        format!("Net {} {}", aig.name(self.net), self.kind)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.net, self.kind)
    }
}
