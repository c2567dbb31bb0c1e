//! Network generators and templates

/// Adder generators
pub mod adder {
    use crate::{GateType, Network, NetworkError};

    /// A simple ripple-carry adder built from And/Or/Xor gates
    ///
    /// Inputs are `cin` followed by `a{i}`, `b{i}` for each bit; outputs are `s{i}` and `cout`.
    pub fn ripple_carry(len: usize) -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let mut c = ret.add_input("cin")?;
        for i in 0..len {
            let a = ret.add_input(&format!("a{i}"))?;
            let b = ret.add_input(&format!("b{i}"))?;
            let p = ret.add_gate_net(&format!("p{i}"), GateType::Xor, &[a, b])?;
            let s = ret.add_gate_net(&format!("s{i}"), GateType::Xor, &[p, c])?;
            let g = ret.add_gate_net(&format!("g{i}"), GateType::And, &[a, b])?;
            let t = ret.add_gate_net(&format!("t{i}"), GateType::And, &[p, c])?;
            let name = if i + 1 == len {
                "cout".to_string()
            } else {
                format!("c{}", i + 1)
            };
            c = ret.add_gate_net(&name, GateType::Or, &[g, t])?;
            ret.add_output(s)?;
        }
        ret.add_output(c)?;
        Ok(ret)
    }
}

/// Random circuits, used to test the algorithms
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::{GateType, Net, Network, NetworkError};

    /// Declare one fanout branch per use of a net, or none
    fn add_branches(
        ret: &mut Network,
        rng: &mut SmallRng,
        stem: Net,
        nb_uses: usize,
    ) -> Result<Vec<Net>, NetworkError> {
        if nb_uses < 2 || !rng.gen_bool(0.5) {
            return Ok(Vec::new());
        }
        let name = ret.name(stem).to_string();
        let branches = (0..nb_uses)
            .map(|k| ret.add_wire(&format!("{name}_{k}")))
            .collect::<Result<Vec<_>, _>>()?;
        ret.add_fanout(stem, &branches)?;
        Ok(branches)
    }

    /// Generate a random combinational network
    ///
    /// Gates pick their inputs among the primary inputs and previous gate outputs.
    /// About half of the nets used several times get explicit fanout branches.
    /// Gate outputs that are not used by any gate become primary outputs, so that all logic is
    /// observable.
    pub fn random_network(
        nb_inputs: usize,
        nb_gates: usize,
        seed: u64,
    ) -> Result<Network, NetworkError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let nb_inputs = nb_inputs.max(1);

        // Draw the structure first: signal i is an input for i < nb_inputs, then a gate output
        let mut gates: Vec<(GateType, Vec<usize>)> = Vec::with_capacity(nb_gates);
        for i in 0..nb_gates {
            let nb_available = nb_inputs + i;
            let ty = GateType::ALL[rng.gen_range(0..GateType::ALL.len())];
            let arity = if ty.is_buf_like() {
                1
            } else {
                rng.gen_range(2..=3)
            };
            let inputs: Vec<usize> = (0..arity)
                .map(|_| {
                    // Favor recent signals to obtain deeper logic
                    let lo = nb_available.saturating_sub(6);
                    if rng.gen_bool(0.7) {
                        rng.gen_range(lo..nb_available)
                    } else {
                        rng.gen_range(0..nb_available)
                    }
                })
                .collect();
            gates.push((ty, inputs));
        }
        let mut nb_uses = vec![0; nb_inputs + nb_gates];
        for (_, inputs) in &gates {
            for i in inputs {
                nb_uses[*i] += 1;
            }
        }

        let mut ret = Network::new();
        let mut signals = Vec::with_capacity(nb_uses.len());
        let mut branches = Vec::with_capacity(nb_uses.len());
        for (i, uses) in nb_uses.iter().take(nb_inputs).enumerate() {
            let n = ret.add_input(&format!("i{i}"))?;
            signals.push(n);
            branches.push(add_branches(&mut ret, &mut rng, n, *uses)?);
        }
        for (i, (ty, inputs)) in gates.iter().enumerate() {
            let deps: Vec<Net> = inputs
                .iter()
                .map(|s| branches[*s].pop().unwrap_or(signals[*s]))
                .collect();
            let n = ret.add_gate_net(&format!("x{i}"), *ty, &deps)?;
            signals.push(n);
            branches.push(add_branches(&mut ret, &mut rng, n, nb_uses[nb_inputs + i])?);
        }
        for (n, uses) in signals.iter().zip(&nb_uses).skip(nb_inputs) {
            if *uses == 0 {
                ret.add_output(*n)?;
            }
        }
        Ok(ret)
    }
}

/// Small reference circuits
pub mod testcases {
    use crate::{GateType, Network, NetworkError};

    fn two_input(ty: GateType) -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let a = ret.add_input("a")?;
        let b = ret.add_input("b")?;
        let f = ret.add_gate_net("f", ty, &[a, b])?;
        ret.add_output(f)?;
        Ok(ret)
    }

    /// A single 2-input And gate `f = AND(a, b)`
    pub fn and2() -> Result<Network, NetworkError> {
        two_input(GateType::And)
    }

    /// A single 2-input Or gate `f = OR(a, b)`
    pub fn or2() -> Result<Network, NetworkError> {
        two_input(GateType::Or)
    }

    /// A single 2-input Xor gate `f = XOR(a, b)`
    pub fn xor2() -> Result<Network, NetworkError> {
        two_input(GateType::Xor)
    }

    /// The ISCAS-85 c17 benchmark, made of six Nand gates
    pub fn c17() -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let n1 = ret.add_input("1")?;
        let n2 = ret.add_input("2")?;
        let n3 = ret.add_input("3")?;
        let n6 = ret.add_input("6")?;
        let n7 = ret.add_input("7")?;
        let n10 = ret.add_gate_net("10", GateType::Nand, &[n1, n3])?;
        let n11 = ret.add_gate_net("11", GateType::Nand, &[n3, n6])?;
        let n16 = ret.add_gate_net("16", GateType::Nand, &[n2, n11])?;
        let n19 = ret.add_gate_net("19", GateType::Nand, &[n11, n7])?;
        let n22 = ret.add_gate_net("22", GateType::Nand, &[n10, n16])?;
        let n23 = ret.add_gate_net("23", GateType::Nand, &[n16, n19])?;
        ret.add_output(n22)?;
        ret.add_output(n23)?;
        Ok(ret)
    }

    /// Reconvergent circuit with an explicit fanout stem
    ///
    /// ```text
    ///     w1 = XOR(a, b)      w1 -> w11, w12
    ///     w2 = OR(w11, c)
    ///     w3 = AND(d, w12)
    ///     f  = OR(w3, w2)
    /// ```
    pub fn fanout_example() -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let a = ret.add_input("a")?;
        let b = ret.add_input("b")?;
        let c = ret.add_input("c")?;
        let d = ret.add_input("d")?;
        let w1 = ret.add_wire("w1")?;
        let w11 = ret.add_wire("w11")?;
        let w12 = ret.add_wire("w12")?;
        let w2 = ret.add_wire("w2")?;
        let w3 = ret.add_wire("w3")?;
        let f = ret.add_wire("f")?;
        ret.add_output(f)?;
        ret.add_fanout(w1, &[w11, w12])?;
        ret.add_gate("g1", GateType::Xor, &[a, b], w1)?;
        ret.add_gate("g2", GateType::Or, &[w11, c], w2)?;
        ret.add_gate("g3", GateType::And, &[d, w12], w3)?;
        ret.add_gate("g5", GateType::Or, &[w3, w2], f)?;
        Ok(ret)
    }

    /// A redundant circuit `f = AND(a, NOT(a))`, whose output is always 0
    pub fn redundant_and() -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let a = ret.add_input("a")?;
        let a1 = ret.add_wire("a1")?;
        let a2 = ret.add_wire("a2")?;
        ret.add_fanout(a, &[a1, a2])?;
        let na = ret.add_gate_net("na", GateType::Not, &[a1])?;
        let f = ret.add_gate_net("f", GateType::And, &[a2, na])?;
        ret.add_output(f)?;
        Ok(ret)
    }

    /// Two reconvergent Xor paths where the first propagation choice is a dead end
    ///
    /// ```text
    ///     a -> a1, a2        b -> b1, b2, b3
    ///     w1 = XOR(a1, b1)   w2 = XOR(a2, c)
    ///     f1 = AND(w1, b2)   f2 = AND(w2, b3)
    /// ```
    pub fn backtrack_example() -> Result<Network, NetworkError> {
        let mut ret = Network::new();
        let a = ret.add_input("a")?;
        let b = ret.add_input("b")?;
        let c = ret.add_input("c")?;
        let a1 = ret.add_wire("a1")?;
        let a2 = ret.add_wire("a2")?;
        let b1 = ret.add_wire("b1")?;
        let b2 = ret.add_wire("b2")?;
        let b3 = ret.add_wire("b3")?;
        ret.add_fanout(a, &[a1, a2])?;
        ret.add_fanout(b, &[b1, b2, b3])?;
        let w1 = ret.add_gate_net("w1", GateType::Xor, &[a1, b1])?;
        let w2 = ret.add_gate_net("w2", GateType::Xor, &[a2, c])?;
        let f1 = ret.add_gate_net("f1", GateType::And, &[w1, b2])?;
        let f2 = ret.add_gate_net("f2", GateType::And, &[w2, b3])?;
        ret.add_output(f1)?;
        ret.add_output(f2)?;
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::{adder, random, testcases};
    use crate::sim::simulate;

    #[test]
    fn test_adder() {
        let net = adder::ripple_carry(2).unwrap();
        net.check().unwrap();
        assert_eq!(net.nb_inputs(), 5);
        assert_eq!(net.nb_outputs(), 3);
        // cin=1, a=01, b=01: 1 + 1 + 1 = 3 = 0b011
        let pattern = vec![true, true, true, false, false];
        assert_eq!(
            simulate(&net, &pattern).unwrap(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_random() {
        let mut nb_branches = 0;
        for seed in 0..10 {
            let net = random::random_network(4, 20, seed).unwrap();
            net.check().unwrap();
            assert_eq!(net.nb_inputs(), 4);
            assert_eq!(net.nb_gates(), 20);
            assert!(net.nb_outputs() >= 1);
            for n in net.nets() {
                let branches = net.branches(n);
                if !branches.is_empty() {
                    // Stems feed their branches only
                    assert!(net.users(n).is_empty());
                    assert!(!net.is_output(n));
                    nb_branches += branches.len();
                }
            }
        }
        assert!(nb_branches > 0);
        let a = random::random_network(4, 20, 3).unwrap();
        let b = random::random_network(4, 20, 3).unwrap();
        assert_eq!(format!("{a}"), format!("{b}"));
    }

    #[test]
    fn test_testcases() {
        for net in [
            testcases::and2(),
            testcases::or2(),
            testcases::xor2(),
            testcases::c17(),
            testcases::fanout_example(),
            testcases::redundant_and(),
            testcases::backtrack_example(),
        ] {
            net.unwrap().check().unwrap();
        }
    }
}
