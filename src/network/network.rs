use core::fmt;

use fxhash::FxHashMap;
use thiserror::Error;

use crate::network::gates::{Gate, GateType};
use crate::network::signal::{Direction, Driver, Net};

/// Errors raised while building a network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A net name is declared twice
    #[error("Net {0} is defined twice")]
    DuplicateNet(String),
    /// A net is referenced but never declared
    #[error("Net {0} is not declared")]
    UnknownNet(String),
    /// A net is driven by more than one gate or stem
    #[error("Net {0} has multiple drivers")]
    MultipleDrivers(String),
    /// A primary input is driven from inside the circuit
    #[error("Primary input {0} is driven inside the circuit")]
    DrivenInput(String),
    /// A port is declared both as input and output
    #[error("Port {0} has conflicting directions")]
    ConflictingDirection(String),
    /// A gate has the wrong number of inputs
    #[error("Gate {name} of type {ty} cannot have {nb_inputs} inputs")]
    InvalidArity {
        /// Instance name
        name: String,
        /// Type of the gate
        ty: GateType,
        /// Number of inputs given
        nb_inputs: usize,
    },
    /// A fanout stem lists itself as a branch
    #[error("Fanout stem {0} cannot be its own branch")]
    InvalidFanout(String),
    /// The combinational logic contains a loop
    #[error("Combinational loop through net {0}")]
    CombinationalLoop(String),
}

/// Representation of a flattened combinational netlist
///
/// Nets and gates are stored in arenas and referenced by index. The driver, the
/// consumer gates and the fanout branches of each net are maintained as the
/// network is built, so that all structural queries are constant time.
/// Gates are kept in insertion order, which is the order used by all algorithms.
#[derive(Debug, Clone, Default)]
pub struct Network {
    names: Vec<String>,
    name_to_net: FxHashMap<String, Net>,
    directions: Vec<Option<Direction>>,
    drivers: Vec<Driver>,
    users: Vec<Vec<usize>>,
    branches: Vec<Vec<Net>>,
    inputs: Vec<Net>,
    outputs: Vec<Net>,
    gates: Vec<Gate>,
}

impl Network {
    /// Create a new network
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of nets
    pub fn nb_nets(&self) -> usize {
        self.names.len()
    }

    /// Return the number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Net {
        self.inputs[i]
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Net {
        self.outputs[i]
    }

    /// Primary inputs, in declaration order
    pub fn inputs(&self) -> &[Net] {
        &self.inputs
    }

    /// Primary outputs, in declaration order
    pub fn outputs(&self) -> &[Net] {
        &self.outputs
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.gates[i]
    }

    /// All gates, in insertion order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Iterate over all nets
    pub fn nets(&self) -> impl DoubleEndedIterator<Item = Net> {
        (0..self.nb_nets()).map(Net::from_index)
    }

    /// Name of a net
    pub fn name(&self, net: Net) -> &str {
        &self.names[net.index()]
    }

    /// Find a net by name
    pub fn net(&self, name: &str) -> Option<Net> {
        self.name_to_net.get(name).copied()
    }

    /// Direction of a net, if it is a primary port
    pub fn direction(&self, net: Net) -> Option<Direction> {
        self.directions[net.index()]
    }

    /// Returns whether the net is a primary input
    pub fn is_input(&self, net: Net) -> bool {
        self.direction(net) == Some(Direction::Input)
    }

    /// Returns whether the net is a primary output
    pub fn is_output(&self, net: Net) -> bool {
        self.direction(net) == Some(Direction::Output)
    }

    /// What drives a net
    pub fn driver(&self, net: Net) -> Driver {
        self.drivers[net.index()]
    }

    /// Gates that use the net as an input
    pub fn users(&self, net: Net) -> &[usize] {
        &self.users[net.index()]
    }

    /// Fanout branches of a stem
    pub fn branches(&self, net: Net) -> &[Net] {
        &self.branches[net.index()]
    }

    /// Stem of a fanout branch
    pub fn stem(&self, net: Net) -> Option<Net> {
        match self.driver(net) {
            Driver::Stem(s) => Some(s),
            _ => None,
        }
    }

    /// Internal nets without a driver, in net order
    pub fn floating(&self) -> Vec<Net> {
        self.nets()
            .filter(|n| self.driver(*n) == Driver::Floating)
            .collect()
    }

    /// Add a new internal net
    pub fn add_wire(&mut self, name: &str) -> Result<Net, NetworkError> {
        if self.name_to_net.contains_key(name) {
            return Err(NetworkError::DuplicateNet(name.to_string()));
        }
        let net = Net::from_index(self.names.len());
        self.names.push(name.to_string());
        self.name_to_net.insert(name.to_string(), net);
        self.directions.push(None);
        self.drivers.push(Driver::Floating);
        self.users.push(Vec::new());
        self.branches.push(Vec::new());
        Ok(net)
    }

    /// Add a new primary input
    pub fn add_input(&mut self, name: &str) -> Result<Net, NetworkError> {
        let net = self.add_wire(name)?;
        self.mark_input(net)?;
        Ok(net)
    }

    /// Declare an existing net as a primary input
    pub fn mark_input(&mut self, net: Net) -> Result<(), NetworkError> {
        match self.direction(net) {
            Some(Direction::Input) => return Ok(()),
            Some(Direction::Output) => {
                return Err(NetworkError::ConflictingDirection(self.name(net).to_string()))
            }
            None => (),
        }
        if self.driver(net) != Driver::Floating {
            return Err(NetworkError::DrivenInput(self.name(net).to_string()));
        }
        self.directions[net.index()] = Some(Direction::Input);
        self.drivers[net.index()] = Driver::Input;
        self.inputs.push(net);
        Ok(())
    }

    /// Declare an existing net as a primary output
    pub fn add_output(&mut self, net: Net) -> Result<(), NetworkError> {
        match self.direction(net) {
            Some(Direction::Output) => Ok(()),
            Some(Direction::Input) => Err(NetworkError::ConflictingDirection(
                self.name(net).to_string(),
            )),
            None => {
                self.directions[net.index()] = Some(Direction::Output);
                self.outputs.push(net);
                Ok(())
            }
        }
    }

    /// Record a new driver for a net
    fn set_driver(&mut self, net: Net, driver: Driver) -> Result<(), NetworkError> {
        match self.driver(net) {
            Driver::Floating => {
                self.drivers[net.index()] = driver;
                Ok(())
            }
            Driver::Input => Err(NetworkError::DrivenInput(self.name(net).to_string())),
            _ => Err(NetworkError::MultipleDrivers(self.name(net).to_string())),
        }
    }

    /// Add a new gate driving an existing net; returns its index
    pub fn add_gate(
        &mut self,
        name: &str,
        ty: GateType,
        inputs: &[Net],
        output: Net,
    ) -> Result<usize, NetworkError> {
        if !ty.accepts_arity(inputs.len()) {
            return Err(NetworkError::InvalidArity {
                name: name.to_string(),
                ty,
                nb_inputs: inputs.len(),
            });
        }
        let index = self.gates.len();
        self.set_driver(output, Driver::Gate(index))?;
        for i in inputs {
            let users = &mut self.users[i.index()];
            // The same net may feed several pins of the gate
            if users.last() != Some(&index) {
                users.push(index);
            }
        }
        self.gates.push(Gate::new(name, ty, inputs, output));
        Ok(index)
    }

    /// Add a new gate driving a new internal net; returns the net
    pub fn add_gate_net(
        &mut self,
        name: &str,
        ty: GateType,
        inputs: &[Net],
    ) -> Result<Net, NetworkError> {
        let output = self.add_wire(name)?;
        self.add_gate(name, ty, inputs, output)?;
        Ok(output)
    }

    /// Declare fanout branches for a stem
    ///
    /// Each branch carries the same signal as the stem, but can be faulted independently.
    pub fn add_fanout(&mut self, stem: Net, branches: &[Net]) -> Result<(), NetworkError> {
        for b in branches {
            if *b == stem {
                return Err(NetworkError::InvalidFanout(self.name(stem).to_string()));
            }
            self.set_driver(*b, Driver::Stem(stem))?;
            self.branches[stem.index()].push(*b);
        }
        Ok(())
    }

    /// Nets whose value is needed to compute this net
    pub fn dependencies(&self, net: Net) -> &[Net] {
        match &self.drivers[net.index()] {
            Driver::Gate(g) => self.gates[*g].inputs(),
            Driver::Stem(stem) => std::slice::from_ref(stem),
            Driver::Input | Driver::Floating => &[],
        }
    }

    /// Nets whose value depends directly on this net: consumer gate outputs and fanout branches
    pub fn fanout_nets(&self, net: Net) -> impl Iterator<Item = Net> + '_ {
        self.users(net)
            .iter()
            .map(|g| self.gate(*g).output())
            .chain(self.branches(net).iter().copied())
    }

    /// Topological order of the nets, from inputs to outputs
    ///
    /// Fails if the combinational logic contains a loop.
    pub fn topo_order(&self) -> Result<Vec<Net>, NetworkError> {
        // Count the dependencies of each net
        let mut count_deps: Vec<usize> = self
            .nets()
            .map(|n| self.dependencies(n).len())
            .collect();

        // Start with nets with no dependencies
        let mut to_visit: Vec<Net> = self
            .nets()
            .filter(|n| count_deps[n.index()] == 0)
            .rev()
            .collect();
        let mut order = Vec::with_capacity(self.nb_nets());
        while let Some(n) = to_visit.pop() {
            order.push(n);
            for g in self.users(n) {
                let o = self.gate(*g).output();
                for i in self.gate(*g).inputs() {
                    if *i == n {
                        count_deps[o.index()] -= 1;
                    }
                }
                if count_deps[o.index()] == 0 {
                    to_visit.push(o);
                }
            }
            for b in self.branches(n) {
                count_deps[b.index()] -= 1;
                if count_deps[b.index()] == 0 {
                    to_visit.push(*b);
                }
            }
        }

        if order.len() != self.nb_nets() {
            let looping = self
                .nets()
                .find(|n| count_deps[n.index()] != 0)
                .map(|n| self.name(n).to_string())
                .unwrap_or_default();
            return Err(NetworkError::CombinationalLoop(looping));
        }
        Ok(order)
    }

    /// Check consistency of the datastructure
    pub fn check(&self) -> Result<(), NetworkError> {
        self.topo_order()?;
        Ok(())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for g in &self.gates {
            let inputs: Vec<&str> = g.inputs().iter().map(|n| self.name(*n)).collect();
            writeln!(
                f,
                "\t{} = {}({})",
                self.name(g.output()),
                g.ty(),
                inputs.join(", ")
            )?;
        }
        for n in self.nets() {
            if !self.branches(n).is_empty() {
                let branches: Vec<&str> = self.branches(n).iter().map(|b| self.name(*b)).collect();
                writeln!(f, "\t{} -> {}", self.name(n), branches.join(", "))?;
            }
        }
        for o in &self.outputs {
            writeln!(f, "\toutput {}", self.name(*o))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NetworkError;
    use crate::network::{Driver, GateType};
    use crate::Network;

    #[test]
    fn test_basic() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let b = net.add_input("b").unwrap();
        let f = net.add_gate_net("f", GateType::And, &[a, b]).unwrap();
        net.add_output(f).unwrap();

        // Basic properties
        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.nb_outputs(), 1);
        assert_eq!(net.nb_nets(), 3);
        assert_eq!(net.nb_gates(), 1);

        // Access
        assert_eq!(net.input(0), a);
        assert_eq!(net.input(1), b);
        assert_eq!(net.output(0), f);
        assert_eq!(net.net("b"), Some(b));
        assert_eq!(net.net("c"), None);
        assert_eq!(net.name(f), "f");
        assert!(net.is_input(a));
        assert!(net.is_output(f));
        assert!(!net.is_output(a));

        // Structure
        assert_eq!(net.driver(a), Driver::Input);
        assert_eq!(net.driver(f), Driver::Gate(0));
        assert_eq!(net.users(a), &[0]);
        assert!(net.users(f).is_empty());
        assert!(net.floating().is_empty());
        net.check().unwrap();
    }

    #[test]
    fn test_topo_order() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let w = net.add_wire("w").unwrap();
        let b = net.add_input("b").unwrap();
        let f = net.add_gate_net("f", GateType::Nand, &[w, b]).unwrap();
        net.add_gate("w", GateType::Not, &[a], w).unwrap();
        net.add_output(f).unwrap();

        assert_eq!(net.nets().rev().collect::<Vec<_>>(), vec![f, b, w, a]);
        // Ready nets are visited in net order
        assert_eq!(net.topo_order().unwrap(), vec![a, w, b, f]);
    }

    #[test]
    fn test_fanout() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let a1 = net.add_wire("a1").unwrap();
        let a2 = net.add_wire("a2").unwrap();
        net.add_fanout(a, &[a1, a2]).unwrap();
        let f = net.add_gate_net("f", GateType::Not, &[a1]).unwrap();
        let g = net.add_gate_net("g", GateType::Buf, &[a2]).unwrap();
        net.add_output(f).unwrap();
        net.add_output(g).unwrap();

        assert_eq!(net.branches(a), &[a1, a2]);
        assert_eq!(net.stem(a1), Some(a));
        assert_eq!(net.stem(a), None);
        assert_eq!(net.driver(a2), Driver::Stem(a));
        assert_eq!(net.dependencies(a2), &[a]);
        let fanout: Vec<_> = net.fanout_nets(a).collect();
        assert_eq!(fanout, vec![a1, a2]);

        let order = net.topo_order().unwrap();
        let pos = |n| order.iter().position(|x| *x == n).unwrap();
        assert!(pos(a) < pos(a1));
        assert!(pos(a1) < pos(f));
        assert!(pos(a2) < pos(g));
    }

    #[test]
    fn test_errors() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let b = net.add_input("b").unwrap();
        assert_eq!(
            net.add_wire("a"),
            Err(NetworkError::DuplicateNet("a".to_string()))
        );
        assert!(matches!(
            net.add_gate("g", GateType::And, &[a], b),
            Err(NetworkError::InvalidArity { .. })
        ));
        assert_eq!(
            net.add_gate("g", GateType::Not, &[a], b),
            Err(NetworkError::DrivenInput("b".to_string()))
        );
        let w = net.add_gate_net("w", GateType::Not, &[a]).unwrap();
        assert_eq!(
            net.add_gate("h", GateType::Buf, &[b], w),
            Err(NetworkError::MultipleDrivers("w".to_string()))
        );
        assert_eq!(
            net.add_output(a),
            Err(NetworkError::ConflictingDirection("a".to_string()))
        );
        assert_eq!(
            net.add_fanout(a, &[a]),
            Err(NetworkError::InvalidFanout("a".to_string()))
        );
    }

    #[test]
    fn test_loop() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let x = net.add_wire("x").unwrap();
        let y = net.add_gate_net("y", GateType::And, &[a, x]).unwrap();
        net.add_gate("x", GateType::Not, &[y], x).unwrap();
        assert!(matches!(
            net.topo_order(),
            Err(NetworkError::CombinationalLoop(_))
        ));
    }

    #[test]
    fn test_floating() {
        let mut net = Network::new();
        let a = net.add_input("a").unwrap();
        let w = net.add_wire("w").unwrap();
        let f = net.add_gate_net("f", GateType::Or, &[a, w]).unwrap();
        net.add_output(f).unwrap();
        assert_eq!(net.floating(), vec![w]);
        assert_eq!(net.driver(w), Driver::Floating);
    }
}
