//! Implication, propagation and justification for a single fault

use std::collections::VecDeque;

use fxhash::FxHashSet;
use itertools::Itertools;
use log::trace;

use crate::atpg::state::SignalState;
use crate::atpg::{AtpgConfig, DAlgorithm, TestVector, Untestable};
use crate::logic::{evaluate, Value};
use crate::network::Driver;
use crate::sim::{bool_to_word, Fault, SimpleSimulator};
use crate::{Net, Network};

/// A propagation decision with untried alternatives
struct Choice {
    /// State before the decision
    checkpoint: SignalState,
    /// D-frontier gates left to try
    alternatives: std::vec::IntoIter<usize>,
}

/// Mutable state of a single test generation run
///
/// The engine itself is never modified: everything that changes during the search lives here.
pub(super) struct Search<'a> {
    aig: &'a Network,
    order: &'a [Net],
    config: &'a AtpgConfig,
    fault: Fault,
    state: SignalState,
    max_iterations: usize,
    iterations: usize,
    backtracks: usize,
    buf: Vec<Value>,
}

impl<'a> Search<'a> {
    pub fn new(engine: &'a DAlgorithm<'_>, fault: Fault) -> Search<'a> {
        let aig = engine.network();
        Search {
            aig,
            order: engine.order(),
            config: engine.config(),
            fault,
            state: SignalState::new(aig),
            max_iterations: engine.max_iterations(),
            iterations: 0,
            backtracks: 0,
            buf: Vec::new(),
        }
    }

    /// Run the search until a test vector is found or a dead end is reached
    pub fn run(mut self) -> Result<TestVector, Untestable> {
        self.sensitize()?;
        self.search()
    }

    fn conflict(&self, net: Net) -> Untestable {
        Untestable::ImplicationConflict {
            net: self.aig.name(net).to_string(),
        }
    }

    /// Place the fault effect on the fault site and justify its fault-free value
    fn sensitize(&mut self) -> Result<(), Untestable> {
        let site = self.fault.net;
        let v = self.fault.kind.sensitizing_value();
        trace!("Sensitizing {} with {}", self.aig.name(site), v);
        self.state.assign(site, v);
        for b in self.aig.branches(site) {
            self.state.set(*b, v);
        }
        self.justify_driver(site, self.fault.kind.activation_value())
    }

    /// Main loop: advance until a vector is found, going back to earlier choices on dead ends
    fn search(&mut self) -> Result<TestVector, Untestable> {
        let mut choices = Vec::new();
        loop {
            let err = match self.step(&mut choices) {
                Ok(Some(v)) => return Ok(v),
                Ok(None) => continue,
                Err(e) => e,
            };
            self.backtrack(&mut choices, err)?;
        }
    }

    /// One iteration: implication, frontier update, output check and propagation
    fn step(&mut self, choices: &mut Vec<Choice>) -> Result<Option<TestVector>, Untestable> {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            return Err(Untestable::IterationBudgetExceeded);
        }
        self.imply()?;
        self.state.update_frontiers(self.aig);
        trace!(
            "Iteration {}: D-frontier [{}], J-frontier [{}]",
            self.iterations,
            self.gate_names(self.state.d_frontier()),
            self.gate_names(self.state.j_frontier())
        );
        if let Some(output) = self.state.observed_output(self.aig) {
            return self.finish(output).map(Some);
        }
        if self.state.d_frontier().is_empty() {
            return Err(Untestable::EmptyDFrontier);
        }
        let candidates = self.propagation_candidates();
        let Some((&first, rest)) = candidates.split_first() else {
            return Err(Untestable::NoPropagationPath);
        };
        if self.config.backtrack_limit > 0 && !rest.is_empty() {
            choices.push(Choice {
                checkpoint: self.state.clone(),
                alternatives: rest.to_vec().into_iter(),
            });
        }
        self.propagate_through(first)?;
        Ok(None)
    }

    fn gate_names(&self, gates: &[usize]) -> String {
        gates.iter().map(|g| self.aig.gate(*g).name()).join(", ")
    }

    /// Restore the latest choice that has an alternative left, and propagate through it
    ///
    /// Returns the error if no alternative is left or the error ends the search.
    fn backtrack(
        &mut self,
        choices: &mut Vec<Choice>,
        mut err: Untestable,
    ) -> Result<(), Untestable> {
        loop {
            if matches!(
                err,
                Untestable::IterationBudgetExceeded | Untestable::BacktrackLimitReached
            ) {
                return Err(err);
            }
            let Some(choice) = choices.last_mut() else {
                return Err(err);
            };
            let Some(g) = choice.alternatives.next() else {
                choices.pop();
                continue;
            };
            if self.backtracks >= self.config.backtrack_limit {
                return Err(Untestable::BacktrackLimitReached);
            }
            self.backtracks += 1;
            if choice.alternatives.as_slice().is_empty() {
                if let Some(c) = choices.pop() {
                    self.state = c.checkpoint;
                }
            } else {
                self.state = choice.checkpoint.clone();
            }
            trace!(
                "Backtracking after {}, trying gate {}",
                err,
                self.aig.gate(g).name()
            );
            match self.propagate_through(g) {
                Ok(()) => return Ok(()),
                Err(e) => err = e,
            }
        }
    }

    /// Forward implication, until no implied value changes
    ///
    /// Implied values are recomputed from scratch. Assigned values are only checked: a known
    /// computed value that differs from an assigned one is a conflict.
    fn imply(&mut self) -> Result<(), Untestable> {
        let aig = self.aig;
        let site = self.fault.net;
        for _ in 0..=aig.nb_nets() {
            let mut changed = false;
            for &net in self.order {
                let computed = match aig.driver(net) {
                    Driver::Gate(g) => {
                        let gate = aig.gate(g);
                        self.buf.clear();
                        self.buf
                            .extend(gate.inputs().iter().map(|i| self.state.value(*i)));
                        evaluate(gate.ty(), &self.buf)
                    }
                    Driver::Stem(s) => self.state.value(s),
                    Driver::Input | Driver::Floating => continue,
                };
                let current = self.state.value(net);
                if net == site {
                    // The driver of the fault site only sees the fault-free value
                    if computed.good().is_some() && computed.good() != current.good() {
                        return Err(self.conflict(net));
                    }
                } else if self.state.is_assigned(net) {
                    if computed.is_known() && computed != current {
                        return Err(self.conflict(net));
                    }
                } else if computed != current {
                    self.state.set(net, computed);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        Ok(())
    }

    /// D-frontier gates that still have an Unknown input and a path of Unknown nets to an output
    fn propagation_candidates(&self) -> Vec<usize> {
        self.state
            .d_frontier()
            .iter()
            .copied()
            .filter(|g| {
                let gate = self.aig.gate(*g);
                gate.inputs()
                    .iter()
                    .any(|i| self.state.value(*i) == Value::Unknown)
                    && self.has_x_path(gate.output())
            })
            .collect()
    }

    /// Breadth-first search for a primary output through Unknown nets
    fn has_x_path(&self, from: Net) -> bool {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            if self.state.value(n) != Value::Unknown || !visited.insert(n) {
                continue;
            }
            if self.aig.is_output(n) {
                return true;
            }
            queue.extend(self.aig.fanout_nets(n));
        }
        false
    }

    /// Drive the Unknown inputs of a D-frontier gate so that the fault effect goes through
    fn propagate_through(&mut self, g: usize) -> Result<(), Untestable> {
        let aig = self.aig;
        let gate = aig.gate(g);
        trace!("Propagating through gate {}", gate.name());
        match gate.ty().non_controlling_value() {
            Some(nc) => {
                for &i in gate.inputs() {
                    if self.state.value(i) == Value::Unknown {
                        self.justify(i, nc)?;
                    }
                }
            }
            None => {
                let first = gate
                    .inputs()
                    .iter()
                    .copied()
                    .find(|i| self.state.value(*i) == Value::Unknown);
                if let Some(i) = first {
                    self.justify(i, false)?;
                }
            }
        }
        Ok(())
    }

    /// Require a binary value on a net, and justify it backward through its driver
    fn justify(&mut self, net: Net, value: bool) -> Result<(), Untestable> {
        let current = self.state.value(net);
        if net == self.fault.net {
            return if current.good() == Some(value) {
                Ok(())
            } else {
                Err(self.conflict(net))
            };
        }
        let wanted = Value::from(value);
        if current == wanted {
            self.state.assign(net, wanted);
            Ok(())
        } else if current == Value::Unknown {
            self.state.assign(net, wanted);
            self.justify_driver(net, value)
        } else {
            Err(self.conflict(net))
        }
    }

    /// Choose values on the inputs of the driver of a net to obtain the given value
    fn justify_driver(&mut self, net: Net, value: bool) -> Result<(), Untestable> {
        let aig = self.aig;
        let gate = match aig.driver(net) {
            Driver::Input | Driver::Floating => return Ok(()),
            Driver::Stem(s) => return self.justify(s, value),
            Driver::Gate(g) => aig.gate(g),
        };
        let ty = gate.ty();
        let inputs = gate.inputs();
        if ty.is_buf_like() {
            return self.justify(inputs[0], value ^ ty.is_inverting());
        }
        if let Some(c) = ty.controlling_value() {
            if ty.controlled_output() == Some(value) {
                // A single controlling input is enough
                if inputs.iter().any(|i| self.state.value(*i) == Value::from(c)) {
                    return Ok(());
                }
                let first = inputs
                    .iter()
                    .copied()
                    .find(|i| self.state.value(*i) == Value::Unknown);
                if let Some(i) = first {
                    self.justify(i, c)?;
                }
            } else {
                for &i in inputs {
                    if self.state.value(i) == Value::Unknown {
                        self.justify(i, !c)?;
                    }
                }
            }
            return Ok(());
        }

        // Xor-like gate
        if inputs.iter().any(|i| self.state.value(*i).is_fault_effect()) {
            return Ok(());
        }
        let target = value ^ ty.is_inverting();
        let unknowns: Vec<Net> = inputs
            .iter()
            .copied()
            .filter(|i| self.state.value(*i) == Value::Unknown)
            .collect();
        let Some((&last, rest)) = unknowns.split_last() else {
            return Ok(());
        };
        for &i in rest {
            if self.state.value(i) == Value::Unknown {
                self.justify(i, false)?;
            }
        }
        let mut parity = false;
        for &i in inputs {
            if i == last {
                continue;
            }
            match self.state.value(i) {
                Value::Zero => (),
                Value::One => parity = !parity,
                // Earlier justifications reached this gate again; leave it to implication
                _ => return Ok(()),
            }
        }
        if self.state.value(last) == Value::Unknown {
            self.justify(last, target ^ parity)?;
        }
        Ok(())
    }

    /// Make the side inputs along the observed path non-controlling
    ///
    /// Walks backward from the output through nets carrying a fault effect, then implies again,
    /// until no side input is left Unknown.
    fn justify_path(&mut self, output: Net) -> Result<(), Untestable> {
        let aig = self.aig;
        loop {
            let mut assigned = false;
            let mut visited = FxHashSet::default();
            let mut stack = vec![output];
            while let Some(n) = stack.pop() {
                if n == self.fault.net || !visited.insert(n) {
                    continue;
                }
                match aig.driver(n) {
                    Driver::Stem(s) => {
                        if self.state.value(s).is_fault_effect() {
                            stack.push(s);
                        }
                    }
                    Driver::Gate(g) => {
                        let gate = aig.gate(g);
                        let side = gate.ty().non_controlling_value().unwrap_or(false);
                        for &i in gate.inputs() {
                            let v = self.state.value(i);
                            if v.is_fault_effect() {
                                stack.push(i);
                            } else if v == Value::Unknown {
                                self.justify(i, side)?;
                                assigned = true;
                            }
                        }
                    }
                    Driver::Input | Driver::Floating => (),
                }
            }
            if !assigned {
                return Ok(());
            }
            self.imply()?;
        }
    }

    /// Complete the assignment once the fault effect reaches an output, and extract the vector
    fn finish(&mut self, output: Net) -> Result<TestVector, Untestable> {
        let aig = self.aig;
        trace!("Fault effect observed at {}", aig.name(output));
        self.justify_path(output)?;
        for n in aig.inputs().iter().copied().chain(aig.floating()) {
            if self.state.value(n) == Value::Unknown {
                self.state.assign(n, Value::Zero);
            }
        }
        self.imply()?;
        if self.state.observed_output(aig).is_none() {
            return Err(Untestable::NotObserved);
        }
        let vector = TestVector::new(
            aig.inputs()
                .iter()
                .map(|i| self.state.value(*i).good() == Some(true))
                .collect(),
        );
        if self.config.verify && !self.verify(&vector) {
            return Err(Untestable::NotObserved);
        }
        Ok(vector)
    }

    /// Check the vector with a two-valued simulation of the good and faulty circuits
    fn verify(&self, vector: &TestVector) -> bool {
        let aig = self.aig;
        let mut sim = SimpleSimulator::from_order(aig, self.order);
        let inputs: Vec<u64> = vector.bits().iter().map(|b| bool_to_word(*b)).collect();
        let floating: Vec<u64> = aig
            .floating()
            .iter()
            .map(|n| bool_to_word(self.state.value(*n).good() == Some(true)))
            .collect();
        let expected = sim.run(&inputs, &floating, None);
        let actual = sim.run(&inputs, &floating, Some(self.fault));
        expected != actual
    }
}
