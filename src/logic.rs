//! Five-valued logic used by the D-algorithm
//!
//! Each value describes a net in both the fault-free ("good") and the faulty circuit:
//!
//! | Value     | Good | Faulty |
//! |-----------|------|--------|
//! | `Zero`    | 0    | 0      |
//! | `One`     | 1    | 1      |
//! | `D`       | 1    | 0      |
//! | `DBar`    | 0    | 1      |
//! | `Unknown` | ?    | ?      |
//!
//! ```
//! use datpg::logic::{evaluate, Value};
//! use datpg::GateType;
//!
//! assert_eq!(evaluate(GateType::And, &[Value::D, Value::One]), Value::D);
//! assert_eq!(evaluate(GateType::Nand, &[Value::D, Value::One]), Value::DBar);
//! assert_eq!(evaluate(GateType::Or, &[Value::D, Value::One]), Value::One);
//! ```

use std::fmt;
use std::ops::Not;

use crate::GateType;

/// A five-valued logic symbol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// 0 in both circuits
    Zero,
    /// 1 in both circuits
    One,
    /// Not assigned yet
    #[default]
    Unknown,
    /// 1 in the fault-free circuit, 0 in the faulty circuit
    D,
    /// 0 in the fault-free circuit, 1 in the faulty circuit
    DBar,
}

impl Value {
    /// All values
    pub const ALL: [Value; 5] = [Value::Zero, Value::One, Value::Unknown, Value::D, Value::DBar];

    /// Returns whether the value carries a fault effect (D or D')
    pub fn is_fault_effect(&self) -> bool {
        matches!(self, Value::D | Value::DBar)
    }

    /// Returns whether the value is 0 or 1
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Zero | Value::One)
    }

    /// Returns whether the value has been assigned
    pub fn is_known(&self) -> bool {
        *self != Value::Unknown
    }

    /// Value in the fault-free circuit
    pub fn good(&self) -> Option<bool> {
        match self {
            Value::Zero | Value::DBar => Some(false),
            Value::One | Value::D => Some(true),
            Value::Unknown => None,
        }
    }

    /// Value in the faulty circuit
    pub fn faulty(&self) -> Option<bool> {
        match self {
            Value::Zero | Value::D => Some(false),
            Value::One | Value::DBar => Some(true),
            Value::Unknown => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        if b {
            Value::One
        } else {
            Value::Zero
        }
    }
}

impl Not for Value {
    type Output = Value;
    fn not(self) -> Value {
        match self {
            Value::Zero => Value::One,
            Value::One => Value::Zero,
            Value::D => Value::DBar,
            Value::DBar => Value::D,
            Value::Unknown => Value::Unknown,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Value::Zero => "0",
            Value::One => "1",
            Value::Unknown => "X",
            Value::D => "D",
            Value::DBar => "D'",
        };
        write!(f, "{}", s)
    }
}

/// And over five values
///
/// Zero dominates, then D', then D. The result is One only if all inputs are known.
fn eval_and(inputs: &[Value]) -> Value {
    if inputs.contains(&Value::Zero) {
        return Value::Zero;
    }
    if inputs.contains(&Value::DBar) {
        return Value::DBar;
    }
    if inputs.contains(&Value::D) {
        return Value::D;
    }
    if inputs.contains(&Value::Unknown) {
        Value::Unknown
    } else {
        Value::One
    }
}

/// Or over five values, dual of [`eval_and`]
fn eval_or(inputs: &[Value]) -> Value {
    if inputs.contains(&Value::One) {
        return Value::One;
    }
    if inputs.contains(&Value::D) {
        return Value::D;
    }
    if inputs.contains(&Value::DBar) {
        return Value::DBar;
    }
    if inputs.contains(&Value::Unknown) {
        Value::Unknown
    } else {
        Value::Zero
    }
}

/// Xor over five values
///
/// D and D' together are not resolved and give Unknown.
fn eval_xor(inputs: &[Value]) -> Value {
    let mut parity = false;
    let mut has_d = false;
    let mut has_d_bar = false;
    for v in inputs {
        match v {
            Value::Zero => (),
            Value::One => parity = !parity,
            Value::D => has_d = true,
            Value::DBar => has_d_bar = true,
            Value::Unknown => return Value::Unknown,
        }
    }
    match (has_d, has_d_bar) {
        (true, true) => Value::Unknown,
        (true, false) => {
            if parity {
                Value::DBar
            } else {
                Value::D
            }
        }
        (false, true) => {
            if parity {
                Value::D
            } else {
                Value::DBar
            }
        }
        (false, false) => Value::from(parity),
    }
}

/// Compute the output of a gate from its input values
///
/// Never fails: an invalid number of inputs yields Unknown.
pub fn evaluate(ty: GateType, inputs: &[Value]) -> Value {
    if inputs.is_empty() || (ty.is_buf_like() && inputs.len() != 1) {
        return Value::Unknown;
    }
    match ty {
        GateType::And => eval_and(inputs),
        GateType::Or => eval_or(inputs),
        GateType::Xor => eval_xor(inputs),
        GateType::Nand => !eval_and(inputs),
        GateType::Nor => !eval_or(inputs),
        GateType::Xnor => !eval_xor(inputs),
        GateType::Not => !inputs[0],
        GateType::Buf => inputs[0],
    }
}

/// Compute the output of a gate on 64 binary patterns at once
pub(crate) fn evaluate_word(ty: GateType, inputs: impl Iterator<Item = u64>) -> u64 {
    let ret = match ty {
        GateType::And | GateType::Nand => inputs.fold(!0u64, |acc, v| acc & v),
        GateType::Or | GateType::Nor => inputs.fold(0u64, |acc, v| acc | v),
        GateType::Xor | GateType::Xnor => inputs.fold(0u64, |acc, v| acc ^ v),
        GateType::Not | GateType::Buf => inputs.fold(0u64, |acc, v| acc | v),
    };
    if ty.is_inverting() {
        !ret
    } else {
        ret
    }
}

/// Compute the output of a gate on binary values
pub fn evaluate_bool(ty: GateType, inputs: &[bool]) -> bool {
    let words = inputs.iter().map(|b| if *b { !0u64 } else { 0u64 });
    evaluate_word(ty, words) & 1 != 0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{evaluate, evaluate_bool, Value};
    use crate::GateType;
    use Value::*;

    fn any_value() -> impl Strategy<Value = super::Value> {
        prop::sample::select(super::Value::ALL.to_vec())
    }

    fn binary_or_unknown() -> impl Strategy<Value = super::Value> {
        prop::sample::select(vec![Zero, One, Unknown])
    }

    #[test]
    fn test_complement() {
        assert_eq!(!Zero, One);
        assert_eq!(!One, Zero);
        assert_eq!(!D, DBar);
        assert_eq!(!DBar, D);
        assert_eq!(!Unknown, Unknown);
        for v in Value::ALL {
            assert_eq!(!!v, v);
        }
    }

    #[test]
    fn test_projections() {
        assert_eq!(D.good(), Some(true));
        assert_eq!(D.faulty(), Some(false));
        assert_eq!(DBar.good(), Some(false));
        assert_eq!(DBar.faulty(), Some(true));
        assert_eq!(Unknown.good(), None);
        for v in Value::ALL {
            assert_eq!((!v).good(), v.good().map(|b| !b));
            assert_eq!((!v).faulty(), v.faulty().map(|b| !b));
        }
    }

    #[test]
    fn test_and() {
        assert_eq!(evaluate(GateType::And, &[Zero, Unknown]), Zero);
        assert_eq!(evaluate(GateType::And, &[Zero, D]), Zero);
        assert_eq!(evaluate(GateType::And, &[One, One]), One);
        assert_eq!(evaluate(GateType::And, &[One, Unknown]), Unknown);
        assert_eq!(evaluate(GateType::And, &[D, One]), D);
        assert_eq!(evaluate(GateType::And, &[D, Unknown]), D);
        assert_eq!(evaluate(GateType::And, &[DBar, One]), DBar);
        assert_eq!(evaluate(GateType::And, &[D, DBar]), DBar);
        assert_eq!(evaluate(GateType::And, &[Unknown, Unknown]), Unknown);
        assert_eq!(evaluate(GateType::Nand, &[D, One]), DBar);
        assert_eq!(evaluate(GateType::Nand, &[Zero, D]), One);
    }

    #[test]
    fn test_or() {
        assert_eq!(evaluate(GateType::Or, &[One, Unknown]), One);
        assert_eq!(evaluate(GateType::Or, &[One, DBar]), One);
        assert_eq!(evaluate(GateType::Or, &[Zero, Zero]), Zero);
        assert_eq!(evaluate(GateType::Or, &[Zero, Unknown]), Unknown);
        assert_eq!(evaluate(GateType::Or, &[DBar, Zero]), DBar);
        assert_eq!(evaluate(GateType::Or, &[DBar, Unknown]), DBar);
        assert_eq!(evaluate(GateType::Or, &[D, DBar]), D);
        assert_eq!(evaluate(GateType::Nor, &[DBar, Zero]), D);
    }

    #[test]
    fn test_xor() {
        assert_eq!(evaluate(GateType::Xor, &[One, Unknown]), Unknown);
        assert_eq!(evaluate(GateType::Xor, &[One, Zero]), One);
        assert_eq!(evaluate(GateType::Xor, &[One, One]), Zero);
        assert_eq!(evaluate(GateType::Xor, &[D, Zero]), D);
        assert_eq!(evaluate(GateType::Xor, &[D, One]), DBar);
        assert_eq!(evaluate(GateType::Xor, &[DBar, Zero]), DBar);
        assert_eq!(evaluate(GateType::Xor, &[DBar, One]), D);
        assert_eq!(evaluate(GateType::Xor, &[D, DBar]), Unknown);
        assert_eq!(evaluate(GateType::Xnor, &[D, Zero]), DBar);
        assert_eq!(evaluate(GateType::Xnor, &[One, Zero, Zero]), Zero);
    }

    #[test]
    fn test_single_input() {
        for v in Value::ALL {
            assert_eq!(evaluate(GateType::Not, &[v]), !v);
            assert_eq!(evaluate(GateType::Buf, &[v]), v);
        }
    }

    #[test]
    fn test_bad_arity() {
        assert_eq!(evaluate(GateType::Not, &[One, One]), Unknown);
        assert_eq!(evaluate(GateType::Buf, &[]), Unknown);
        assert_eq!(evaluate(GateType::And, &[]), Unknown);
    }

    #[test]
    fn test_bool() {
        for ty in GateType::ALL {
            let nb = if ty.is_buf_like() { 1 } else { 3 };
            for mask in 0..(1usize << nb) {
                let bools: Vec<bool> = (0..nb).map(|i| (mask >> i) & 1 != 0).collect();
                let values: Vec<Value> = bools.iter().map(|b| Value::from(*b)).collect();
                assert_eq!(
                    Value::from(evaluate_bool(ty, &bools)),
                    evaluate(ty, &values),
                    "{ty} on {bools:?}"
                );
            }
        }
    }

    #[test]
    fn test_single_fault_effect_is_exact() {
        // With a single D input, the five-valued result matches the good and faulty evaluations
        for ty in GateType::ALL {
            let nb = if ty.is_buf_like() { 1 } else { 3 };
            for mask in 0..(1usize << nb) {
                let mut values: Vec<Value> =
                    (0..nb).map(|i| Value::from((mask >> i) & 1 != 0)).collect();
                values[0] = D;
                let res = evaluate(ty, &values);
                let good: Vec<bool> = values.iter().map(|v| v.good().unwrap()).collect();
                let faulty: Vec<bool> = values.iter().map(|v| v.faulty().unwrap()).collect();
                assert_eq!(res.good(), Some(evaluate_bool(ty, &good)));
                assert_eq!(res.faulty(), Some(evaluate_bool(ty, &faulty)));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_commutative(mut v in prop::collection::vec(any_value(), 2..6), seed in any::<usize>()) {
            for ty in [GateType::And, GateType::Or, GateType::Xor, GateType::Nand, GateType::Nor, GateType::Xnor] {
                let before = evaluate(ty, &v);
                let len = v.len();
                v.swap(0, seed % len);
                v.reverse();
                prop_assert_eq!(evaluate(ty, &v), before);
            }
        }

        #[test]
        fn prop_associative_and_or(a in any_value(), b in any_value(), c in any_value()) {
            for ty in [GateType::And, GateType::Or] {
                let left = evaluate(ty, &[evaluate(ty, &[a, b]), c]);
                let right = evaluate(ty, &[a, evaluate(ty, &[b, c])]);
                let flat = evaluate(ty, &[a, b, c]);
                prop_assert_eq!(left, flat);
                prop_assert_eq!(right, flat);
            }
        }

        #[test]
        fn prop_associative_xor(
            a in binary_or_unknown(),
            b in binary_or_unknown(),
            c in binary_or_unknown(),
            effect in prop::option::of((prop::sample::select(vec![D, DBar]), 0usize..3)),
        ) {
            let mut v = [a, b, c];
            if let Some((d, pos)) = effect {
                v[pos] = d;
            }
            let ty = GateType::Xor;
            let left = evaluate(ty, &[evaluate(ty, &[v[0], v[1]]), v[2]]);
            let right = evaluate(ty, &[v[0], evaluate(ty, &[v[1], v[2]])]);
            let flat = evaluate(ty, &v);
            prop_assert_eq!(left, flat);
            prop_assert_eq!(right, flat);
        }
    }
}
