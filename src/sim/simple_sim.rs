use crate::logic::evaluate_word;
use crate::network::Driver;
use crate::sim::Fault;
use crate::{Net, Network};

/// Structure for simulation based directly on the network representation
///
/// Each net holds a 64-bit word, one bit per pattern. Nets are evaluated in topological order.
pub struct SimpleSimulator<'a> {
    aig: &'a Network,
    order: &'a [Net],
    floating: Vec<Net>,
    values: Vec<u64>,
}

impl<'a> SimpleSimulator<'a> {
    /// Create a simulator from a network and a topological order of its nets
    pub fn from_order(aig: &'a Network, order: &'a [Net]) -> SimpleSimulator<'a> {
        debug_assert_eq!(order.len(), aig.nb_nets());
        SimpleSimulator {
            aig,
            order,
            floating: aig.floating(),
            values: vec![0; aig.nb_nets()],
        }
    }

    /// Run the simulation, with an optional stuck-at fault injected; return the output values
    ///
    /// Floating nets take the given values, or 0 if none is given.
    pub fn run(
        &mut self,
        input_values: &[u64],
        floating_values: &[u64],
        fault: Option<Fault>,
    ) -> Vec<u64> {
        assert_eq!(input_values.len(), self.aig.nb_inputs());
        self.reset();
        for (n, v) in self.aig.inputs().iter().zip(input_values) {
            self.values[n.index()] = *v;
        }
        for (i, n) in self.floating.iter().enumerate() {
            self.values[n.index()] = floating_values.get(i).copied().unwrap_or(0);
        }
        self.run_comb(fault);
        self.get_output_values()
    }

    fn reset(&mut self) {
        self.values.fill(0);
    }

    fn run_comb(&mut self, fault: Option<Fault>) {
        for &n in self.order {
            let val = match self.aig.driver(n) {
                Driver::Input | Driver::Floating => self.values[n.index()],
                Driver::Stem(s) => self.values[s.index()],
                Driver::Gate(g) => {
                    let gate = self.aig.gate(g);
                    evaluate_word(
                        gate.ty(),
                        gate.inputs().iter().map(|i| self.values[i.index()]),
                    )
                }
            };
            self.values[n.index()] = match fault {
                Some(f) if f.net == n => {
                    if f.kind.value() {
                        !0
                    } else {
                        0
                    }
                }
                _ => val,
            };
        }
    }

    fn get_output_values(&self) -> Vec<u64> {
        self.aig
            .outputs()
            .iter()
            .map(|o| self.values[o.index()])
            .collect()
    }
}
