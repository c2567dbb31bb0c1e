//! IO for JSON fault lists

use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::ReadError;
use crate::sim::{Fault, FaultError, FaultKind};
use crate::Network;

/// An entry of a fault list, as found in the file
///
/// Entries are validated against the network only when test generation runs, so that an
/// invalid entry does not prevent processing the others.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultEntry {
    /// Key of the fault in the list
    pub id: String,
    /// Name of the faulty net
    pub node: String,
    /// Fault type, such as "stuck-at-0"
    pub fault_type: String,
    /// Free-form description
    pub description: String,
}

#[derive(Serialize, Deserialize)]
struct FaultBody {
    node: String,
    fault_type: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FaultListJson {
    Full {
        stuck_at_faults: IndexMap<String, FaultBody>,
    },
    Bare(IndexMap<String, FaultBody>),
}

#[derive(Serialize)]
struct Metadata<'a> {
    module_name: &'a str,
    total_faults: usize,
    total_nodes: usize,
}

#[derive(Serialize)]
struct FaultSummary {
    stuck_at_0_count: usize,
    stuck_at_1_count: usize,
}

#[derive(Serialize)]
struct FaultListFile<'a> {
    metadata: Metadata<'a>,
    stuck_at_faults: IndexMap<&'a str, FaultBody>,
    fault_summary: FaultSummary,
}

impl FaultEntry {
    /// Create an entry without description
    pub fn new(id: &str, node: &str, fault_type: &str) -> FaultEntry {
        FaultEntry {
            id: id.to_string(),
            node: node.to_string(),
            fault_type: fault_type.to_string(),
            description: String::new(),
        }
    }

    /// Create the entries for a list of faults
    ///
    /// Entries are keyed by net name and stuck value, for example `w1:0`.
    pub fn from_faults(aig: &Network, faults: &[Fault]) -> Vec<FaultEntry> {
        faults
            .iter()
            .map(|f| {
                let name = aig.name(f.net);
                let value = i32::from(f.kind.value());
                FaultEntry {
                    id: format!("{name}:{value}"),
                    node: name.to_string(),
                    fault_type: f.kind.to_string(),
                    description: format!("Node '{name}' stuck at logic {value}"),
                }
            })
            .collect()
    }

    /// Resolve the entry against a network
    pub fn to_fault(&self, aig: &Network) -> Result<Fault, FaultError> {
        Fault::from_names(aig, &self.node, &self.fault_type)
    }

    /// Description if present, or a generated one
    pub fn description(&self) -> String {
        if self.description.is_empty() {
            format!("Node '{}' {}", self.node, self.fault_type)
        } else {
            self.description.clone()
        }
    }
}

/// Read a JSON fault list
///
/// The faults are either under a `stuck_at_faults` key, or directly at the top level:
/// ```text
///     { "stuck_at_faults": {
///         "a:0": { "node": "a", "fault_type": "stuck-at-0", "description": "..." }
///     } }
/// ```
pub fn read_fault_list<R: Read>(r: R) -> Result<Vec<FaultEntry>, ReadError> {
    let faults = match serde_json::from_reader(r)? {
        FaultListJson::Full { stuck_at_faults } => stuck_at_faults,
        FaultListJson::Bare(faults) => faults,
    };
    Ok(faults
        .into_iter()
        .map(|(id, body)| FaultEntry {
            id,
            node: body.node,
            fault_type: body.fault_type,
            description: body.description,
        })
        .collect())
}

/// Write a JSON fault list, with metadata and a summary of the fault types
pub fn write_fault_list<W: Write>(
    w: W,
    module_name: &str,
    entries: &[FaultEntry],
) -> std::io::Result<()> {
    let count = |kind: FaultKind| {
        entries
            .iter()
            .filter(|e| e.fault_type.parse::<FaultKind>() == Ok(kind))
            .count()
    };
    let nb_nodes = entries
        .iter()
        .map(|e| e.node.as_str())
        .collect::<fxhash::FxHashSet<_>>()
        .len();
    let file = FaultListFile {
        metadata: Metadata {
            module_name,
            total_faults: entries.len(),
            total_nodes: nb_nodes,
        },
        stuck_at_faults: entries
            .iter()
            .map(|e| {
                (
                    e.id.as_str(),
                    FaultBody {
                        node: e.node.clone(),
                        fault_type: e.fault_type.clone(),
                        description: e.description.clone(),
                    },
                )
            })
            .collect(),
        fault_summary: FaultSummary {
            stuck_at_0_count: count(FaultKind::StuckAt0),
            stuck_at_1_count: count(FaultKind::StuckAt1),
        },
    };
    serde_json::to_writer_pretty(w, &file)?;
    Ok(())
}
