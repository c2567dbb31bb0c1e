use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::network::signal::Net;

/// Types of logic gates supported by the test pattern generator
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum GateType {
    /// N-input And gate
    And,
    /// N-input Or gate
    Or,
    /// N-input Nand gate
    Nand,
    /// N-input Nor gate
    Nor,
    /// N-input Xor gate
    Xor,
    /// N-input Xnor gate
    Xnor,
    /// Inverter
    Not,
    /// Buffer
    Buf,
}

impl GateType {
    /// All gate types, in declaration order
    pub const ALL: [GateType; 8] = [
        GateType::And,
        GateType::Or,
        GateType::Nand,
        GateType::Nor,
        GateType::Xor,
        GateType::Xnor,
        GateType::Not,
        GateType::Buf,
    ];

    /// Returns whether the output of the gate is complemented
    pub fn is_inverting(&self) -> bool {
        matches!(
            self,
            GateType::Nand | GateType::Nor | GateType::Xnor | GateType::Not
        )
    }

    /// Returns whether the gate is a Buf or Not
    pub fn is_buf_like(&self) -> bool {
        matches!(self, GateType::Buf | GateType::Not)
    }

    /// Input value that determines the output on its own, if any
    ///
    /// 0 for And/Nand, 1 for Or/Nor.
    pub fn controlling_value(&self) -> Option<bool> {
        match self {
            GateType::And | GateType::Nand => Some(false),
            GateType::Or | GateType::Nor => Some(true),
            _ => None,
        }
    }

    /// Input value that lets the other inputs through, if any
    pub fn non_controlling_value(&self) -> Option<bool> {
        self.controlling_value().map(|v| !v)
    }

    /// Output value obtained when a controlling value is present on an input
    pub fn controlled_output(&self) -> Option<bool> {
        self.controlling_value().map(|v| v ^ self.is_inverting())
    }

    /// Returns whether the number of inputs is valid for this type of gate
    pub fn accepts_arity(&self, nb_inputs: usize) -> bool {
        if self.is_buf_like() {
            nb_inputs == 1
        } else {
            nb_inputs >= 2
        }
    }

    /// Name of the gate type, as used in netlists
    pub fn name(&self) -> &'static str {
        match self {
            GateType::And => "and",
            GateType::Or => "or",
            GateType::Nand => "nand",
            GateType::Nor => "nor",
            GateType::Xor => "xor",
            GateType::Xnor => "xnor",
            GateType::Not => "not",
            GateType::Buf => "buf",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GateType {
    type Err = String;

    fn from_str(s: &str) -> Result<GateType, String> {
        match s.to_lowercase().as_str() {
            "and" => Ok(GateType::And),
            "or" => Ok(GateType::Or),
            "nand" => Ok(GateType::Nand),
            "nor" => Ok(GateType::Nor),
            "xor" => Ok(GateType::Xor),
            "xnor" => Ok(GateType::Xnor),
            "not" | "inv" => Ok(GateType::Not),
            "buf" | "buff" => Ok(GateType::Buf),
            _ => Err(s.to_string()),
        }
    }
}

/// Logic gate instance
///
/// A gate has an ordered list of input nets and drives exactly one output net.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Gate {
    name: String,
    ty: GateType,
    inputs: Box<[Net]>,
    output: Net,
}

impl Gate {
    /// Create a new gate
    pub(crate) fn new(name: &str, ty: GateType, inputs: &[Net], output: Net) -> Gate {
        Gate {
            name: name.to_string(),
            ty,
            inputs: inputs.into(),
            output,
        }
    }

    /// Instance name of the gate
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the gate
    pub fn ty(&self) -> GateType {
        self.ty
    }

    /// Obtain all nets feeding this gate
    pub fn inputs(&self) -> &[Net] {
        &self.inputs
    }

    /// Net driven by this gate
    pub fn output(&self) -> Net {
        self.output
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}({})",
            self.output,
            self.ty.name().to_uppercase(),
            self.inputs.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::GateType;
    use super::GateType::*;

    #[test]
    fn test_parse() {
        for ty in GateType::ALL {
            assert_eq!(ty.name().parse::<GateType>(), Ok(ty));
            assert_eq!(ty.name().to_uppercase().parse::<GateType>(), Ok(ty));
        }
        assert_eq!("BUFF".parse::<GateType>(), Ok(Buf));
        assert!("mux".parse::<GateType>().is_err());
    }

    #[test]
    fn test_controlling_values() {
        assert_eq!(And.controlling_value(), Some(false));
        assert_eq!(Nand.controlling_value(), Some(false));
        assert_eq!(Or.controlling_value(), Some(true));
        assert_eq!(Nor.controlling_value(), Some(true));
        assert_eq!(Xor.controlling_value(), None);
        assert_eq!(Not.controlling_value(), None);

        assert_eq!(And.non_controlling_value(), Some(true));
        assert_eq!(Or.non_controlling_value(), Some(false));

        assert_eq!(And.controlled_output(), Some(false));
        assert_eq!(Nand.controlled_output(), Some(true));
        assert_eq!(Or.controlled_output(), Some(true));
        assert_eq!(Nor.controlled_output(), Some(false));
    }

    #[test]
    fn test_arity() {
        assert!(Not.accepts_arity(1));
        assert!(!Buf.accepts_arity(2));
        assert!(!And.accepts_arity(1));
        assert!(Xnor.accepts_arity(5));
    }
}
