//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read};

use crate::io::ReadError;
use crate::{GateType, Net, Network, NetworkError};

/// A gate statement: output name, gate type and input names
struct Statement {
    line: usize,
    output: String,
    ty: String,
    inputs: Vec<String>,
}

fn lookup(aig: &Network, name: &str) -> Result<Net, NetworkError> {
    aig.net(name)
        .ok_or_else(|| NetworkError::UnknownNet(name.to_string()))
}

fn network_from_statements(
    statements: &[Statement],
    inputs: &[String],
    outputs: &[String],
) -> Result<Network, ReadError> {
    let mut ret = Network::new();
    for name in inputs {
        ret.add_input(name)?;
    }
    for s in statements {
        ret.add_wire(&s.output)?;
    }

    for s in statements {
        let ty = match s.ty.to_uppercase().as_str() {
            "DFF" | "DFFRSE" => {
                return Err(ReadError::Bench(format!(
                    "line {}: flip-flop {} is not supported in a combinational circuit",
                    s.line, s.output
                )))
            }
            "VDD" | "VSS" | "GND" => {
                return Err(ReadError::Bench(format!(
                    "line {}: constant {} is not supported",
                    s.line, s.output
                )))
            }
            t => t
                .parse::<GateType>()
                .map_err(|_| ReadError::UnknownGateType(s.ty.clone()))?,
        };
        let deps = s
            .inputs
            .iter()
            .map(|n| lookup(&ret, n))
            .collect::<Result<Vec<_>, _>>()?;
        let output = lookup(&ret, &s.output)?;
        ret.add_gate(&s.output, ty, &deps, output)?;
    }
    for o in outputs {
        let net = lookup(&ret, o)?;
        ret.add_output(net)?;
    }
    Ok(ret)
}

/// Read a network in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     OUTPUT(x6)
/// ```
/// Each gate is named after the net it drives.
pub fn read_bench<R: Read>(r: R) -> Result<Network, ReadError> {
    let mut statements = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let s = l?;
        let line = i + 1;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts: Vec<_> = t
                .split(['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(ReadError::Bench(format!("line {line}: cannot parse {t}")));
            }
            match parts[0].to_uppercase().as_str() {
                "INPUT" | "PINPUT" => inputs.push(parts[1].to_string()),
                "OUTPUT" | "POUTPUT" => outputs.push(parts[1].to_string()),
                _ => {
                    return Err(ReadError::Bench(format!(
                        "line {line}: unknown keyword {}",
                        parts[0]
                    )))
                }
            }
        } else {
            let parts: Vec<_> = t
                .split(['=', '(', ',', ')'])
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() < 2 {
                return Err(ReadError::Bench(format!("line {line}: cannot parse {t}")));
            }
            statements.push(Statement {
                line,
                output: parts[0].clone(),
                ty: parts[1].clone(),
                inputs: parts[2..].to_vec(),
            });
        }
    }
    network_from_statements(&statements, &inputs, &outputs)
}
