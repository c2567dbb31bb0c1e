use crate::logic::Value;
use crate::{Net, Network};

/// Current five-valued assignment of every net, with the D-frontier and J-frontier
///
/// Values are either assigned, when they are requirements of the search, or implied, when they
/// are computed from other nets and may be recomputed.
/// The frontiers are not maintained incrementally: they are recomputed by
/// [`SignalState::update_frontiers`].
#[derive(Clone, Debug)]
pub struct SignalState {
    values: Vec<Value>,
    assigned: Vec<bool>,
    d_frontier: Vec<usize>,
    j_frontier: Vec<usize>,
}

impl SignalState {
    /// Create a state where every net is Unknown
    pub fn new(aig: &Network) -> SignalState {
        SignalState {
            values: vec![Value::Unknown; aig.nb_nets()],
            assigned: vec![false; aig.nb_nets()],
            d_frontier: Vec::new(),
            j_frontier: Vec::new(),
        }
    }

    /// Value of a net
    pub fn value(&self, net: Net) -> Value {
        self.values[net.index()]
    }

    /// Set an implied value on a net
    pub fn set(&mut self, net: Net, value: Value) {
        self.values[net.index()] = value;
    }

    /// Assign a value to a net as a requirement of the search
    pub fn assign(&mut self, net: Net, value: Value) {
        self.values[net.index()] = value;
        self.assigned[net.index()] = true;
    }

    /// Returns whether the value of the net is a requirement rather than an implication
    pub fn is_assigned(&self, net: Net) -> bool {
        self.assigned[net.index()]
    }

    /// Gates whose output is Unknown while an input carries a fault effect
    pub fn d_frontier(&self) -> &[usize] {
        &self.d_frontier
    }

    /// Gates whose output is 0 or 1 while an input is still Unknown
    pub fn j_frontier(&self) -> &[usize] {
        &self.j_frontier
    }

    /// Recompute both frontiers from scratch, in gate order
    pub fn update_frontiers(&mut self, aig: &Network) {
        self.d_frontier.clear();
        self.j_frontier.clear();
        for (i, g) in aig.gates().iter().enumerate() {
            let out = self.value(g.output());
            let mut inputs = g.inputs().iter().map(|n| self.value(*n));
            if out == Value::Unknown {
                if inputs.any(|v| v.is_fault_effect()) {
                    self.d_frontier.push(i);
                }
            } else if out.is_binary() && inputs.any(|v| v == Value::Unknown) {
                self.j_frontier.push(i);
            }
        }
    }

    /// First primary output where a fault effect is visible
    pub fn observed_output(&self, aig: &Network) -> Option<Net> {
        aig.outputs()
            .iter()
            .copied()
            .find(|o| self.value(*o).is_fault_effect())
    }
}
