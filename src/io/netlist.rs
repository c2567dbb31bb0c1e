//! IO for flattened JSON netlists

use std::io::Read;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::io::ReadError;
use crate::{GateType, Net, Network, NetworkError};

#[derive(Deserialize)]
struct PortJson {
    direction: String,
}

#[derive(Deserialize)]
struct ConnectionsJson {
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Deserialize)]
struct CellJson {
    #[serde(rename = "type")]
    ty: String,
    connections: ConnectionsJson,
}

#[derive(Deserialize)]
struct ModuleJson {
    ports: Option<IndexMap<String, PortJson>>,
    cells: Option<IndexMap<String, CellJson>>,
    nets: Option<Vec<String>>,
    #[serde(default)]
    fanouts: IndexMap<String, Vec<String>>,
}

fn lookup(aig: &Network, name: &str) -> Result<Net, NetworkError> {
    aig.net(name)
        .ok_or_else(|| NetworkError::UnknownNet(name.to_string()))
}

fn network_from_module(module: ModuleJson) -> Result<Network, ReadError> {
    let missing = |s: &str| ReadError::MalformedNetlist(format!("missing '{s}' section"));
    let ports = module.ports.ok_or_else(|| missing("ports"))?;
    let cells = module.cells.ok_or_else(|| missing("cells"))?;
    let nets = module.nets.ok_or_else(|| missing("nets"))?;

    let mut ret = Network::new();

    // Ports first, so that nets are numbered in port order
    for name in ports.keys().chain(nets.iter()) {
        if ret.net(name).is_none() {
            ret.add_wire(name)?;
        }
    }
    for (name, port) in &ports {
        let net = lookup(&ret, name)?;
        match port.direction.to_lowercase().as_str() {
            "input" => ret.mark_input(net)?,
            "output" => ret.add_output(net)?,
            d => {
                return Err(ReadError::MalformedNetlist(format!(
                    "port {name} has unsupported direction {d}"
                )))
            }
        }
    }

    for (stem, branches) in &module.fanouts {
        let stem = lookup(&ret, stem)?;
        let branches = branches
            .iter()
            .map(|b| lookup(&ret, b))
            .collect::<Result<Vec<_>, _>>()?;
        ret.add_fanout(stem, &branches)?;
    }

    for (name, cell) in &cells {
        let ty: GateType = cell
            .ty
            .parse()
            .map_err(ReadError::UnknownGateType)?;
        let mut outputs = cell.connections.outputs.clone();
        outputs.extend(cell.connections.output.clone());
        let output = match outputs.as_slice() {
            [o] => lookup(&ret, o)?,
            [] => {
                return Err(ReadError::MalformedNetlist(format!(
                    "cell {name} has no output"
                )))
            }
            _ => {
                return Err(ReadError::MalformedNetlist(format!(
                    "cell {name} has more than one output"
                )))
            }
        };
        let inputs = cell
            .connections
            .inputs
            .iter()
            .map(|i| lookup(&ret, i))
            .collect::<Result<Vec<_>, _>>()?;
        ret.add_gate(name, ty, &inputs, output)?;
    }
    Ok(ret)
}

/// Sections that identify a module object
const MODULE_SECTIONS: [&str; 4] = ["ports", "cells", "nets", "fanouts"];

/// Find the module to read: the first of a design, the first of a map keyed by module name, or
/// the object itself
fn top_module(value: Value) -> Result<Value, ReadError> {
    let Value::Object(mut map) = value else {
        return Err(ReadError::MalformedNetlist(
            "netlist is not a JSON object".to_string(),
        ));
    };
    if let Some(modules) = map.remove("modules") {
        return first_module(modules);
    }
    if MODULE_SECTIONS.iter().any(|s| map.contains_key(*s)) {
        return Ok(Value::Object(map));
    }
    first_module(Value::Object(map))
}

fn first_module(modules: Value) -> Result<Value, ReadError> {
    match modules {
        Value::Object(map) => map
            .into_iter()
            .next()
            .map(|(_, m)| m)
            .ok_or_else(|| ReadError::MalformedNetlist("no module in design".to_string())),
        _ => Err(ReadError::MalformedNetlist(
            "modules are not a JSON object".to_string(),
        )),
    }
}

/// Read a network from a flattened JSON netlist
///
/// The netlist is a design whose first module is used, a map from module names to modules, or a
/// single module:
/// ```text
///     { "modules": { "top": {
///         "ports": { "a": { "direction": "Input" }, "f": { "direction": "Output" } },
///         "cells": { "g1": { "type": "not", "connections": { "inputs": ["a"], "outputs": ["f"] } } },
///         "nets": ["a", "f"],
///         "fanouts": {}
///     } } }
/// ```
/// Cells are added in file order, which defines the gate order.
pub fn read_netlist<R: Read>(r: R) -> Result<Network, ReadError> {
    let value: Value = serde_json::from_reader(r)?;
    let module: ModuleJson = serde_json::from_value(top_module(value)?)?;
    network_from_module(module)
}

#[cfg(test)]
mod tests {
    use super::read_netlist;
    use crate::io::ReadError;
    use crate::network::{Driver, NetworkError};
    use crate::GateType;

    const FANOUT_EXAMPLE: &str = r#"{
        "modules": { "fanout": {
            "ports": {
                "a": { "direction": "Input" },
                "b": { "direction": "Input" },
                "c": { "direction": "Input" },
                "d": { "direction": "Input" },
                "f": { "direction": "Output" }
            },
            "cells": {
                "g1": { "type": "xor", "connections": { "inputs": ["a", "b"], "outputs": ["w1"] } },
                "g2": { "type": "OR", "connections": { "inputs": ["w11", "c"], "outputs": ["w2"] } },
                "g3": { "type": "and", "connections": { "inputs": ["d", "w12"], "output": "w3" } },
                "g5": { "type": "or", "connections": { "inputs": ["w3", "w2"], "outputs": ["f"] } }
            },
            "nets": ["a", "b", "c", "d", "f", "w1", "w11", "w12", "w2", "w3"],
            "fanouts": { "w1": ["w11", "w12"] }
        } }
    }"#;

    #[test]
    fn test_read() {
        let aig = read_netlist(FANOUT_EXAMPLE.as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 4);
        assert_eq!(aig.nb_outputs(), 1);
        assert_eq!(aig.nb_nets(), 10);
        assert_eq!(aig.nb_gates(), 4);
        let names: Vec<&str> = aig.gates().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["g1", "g2", "g3", "g5"]);
        assert_eq!(aig.gate(1).ty(), GateType::Or);
        let w1 = aig.net("w1").unwrap();
        assert_eq!(aig.driver(aig.net("w12").unwrap()), Driver::Stem(w1));
        assert_eq!(aig.driver(aig.net("w3").unwrap()), Driver::Gate(2));
        aig.check().unwrap();
    }

    #[test]
    fn test_bare_module() {
        let example = r#"{
            "ports": { "a": { "direction": "input" }, "f": { "direction": "output" } },
            "cells": { "inv": { "type": "not", "connections": { "inputs": ["a"], "outputs": ["f"] } } },
            "nets": ["a", "f"]
        }"#;
        let aig = read_netlist(example.as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 1);
        assert_eq!(aig.gate(0).ty(), GateType::Not);
    }

    #[test]
    fn test_module_keyed() {
        let example = r#"{
            "top": {
                "ports": {
                    "b": { "direction": "Input" },
                    "a": { "direction": "Input" },
                    "f": { "direction": "Output" }
                },
                "cells": {
                    "z": { "type": "nand", "connections": { "inputs": ["a", "b"], "outputs": ["w"] } },
                    "y": { "type": "not", "connections": { "inputs": ["w"], "outputs": ["f"] } }
                },
                "nets": ["a", "b", "f", "w"],
                "fanouts": {}
            },
            "other": { "ports": {}, "cells": {}, "nets": [] }
        }"#;
        let aig = read_netlist(example.as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        // File order is kept for ports and cells
        assert_eq!(aig.name(aig.input(0)), "b");
        let names: Vec<&str> = aig.gates().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["z", "y"]);
        assert_eq!(aig.gate(0).ty(), GateType::Nand);
        aig.check().unwrap();
    }

    #[test]
    fn test_malformed() {
        let missing = r#"{ "ports": {}, "nets": [] }"#;
        assert!(matches!(
            read_netlist(missing.as_bytes()),
            Err(ReadError::MalformedNetlist(_))
        ));
        let no_output = r#"{ "ports": {}, "nets": ["a"],
            "cells": { "g": { "type": "buf", "connections": { "inputs": ["a"], "outputs": [] } } } }"#;
        assert!(matches!(
            read_netlist(no_output.as_bytes()),
            Err(ReadError::MalformedNetlist(_))
        ));
        let two_outputs = r#"{ "ports": {}, "nets": ["a", "b", "c"],
            "cells": { "g": { "type": "buf", "connections": { "inputs": ["a"], "outputs": ["b", "c"] } } } }"#;
        assert!(matches!(
            read_netlist(two_outputs.as_bytes()),
            Err(ReadError::MalformedNetlist(_))
        ));
        let bad_type = r#"{ "ports": {}, "nets": ["a", "b"],
            "cells": { "g": { "type": "mux", "connections": { "inputs": ["a"], "outputs": ["b"] } } } }"#;
        assert!(matches!(
            read_netlist(bad_type.as_bytes()),
            Err(ReadError::UnknownGateType(t)) if t == "mux"
        ));
        let unknown_net = r#"{ "ports": {}, "nets": ["b"],
            "cells": { "g": { "type": "buf", "connections": { "inputs": ["a"], "outputs": ["b"] } } } }"#;
        assert!(matches!(
            read_netlist(unknown_net.as_bytes()),
            Err(ReadError::Network(NetworkError::UnknownNet(n))) if n == "a"
        ));
        assert!(matches!(
            read_netlist("not json".as_bytes()),
            Err(ReadError::Json(_))
        ));
        assert!(matches!(
            read_netlist("[1, 2]".as_bytes()),
            Err(ReadError::MalformedNetlist(_))
        ));
        assert!(matches!(
            read_netlist(r#"{ "modules": {} }"#.as_bytes()),
            Err(ReadError::MalformedNetlist(_))
        ));
    }
}
