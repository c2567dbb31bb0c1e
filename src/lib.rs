//! Test pattern generation for combinational circuits
//!
//! This crate generates test vectors for single stuck-at faults using the
//! [D-algorithm](https://en.wikipedia.org/wiki/D-algorithm), with fault simulation to verify and
//! compact the generated vectors.
//!
//! # Usage
//!
//! ```bash
//! # Show statistics about a circuit, from an ISCAS .bench file or a JSON netlist
//! datpg show c17.bench
//! # Write the list of checkpoint faults
//! datpg faults c17.bench -o faults.json
//! # Generate a test vector for each fault, and a compacted test set
//! datpg atpg c17.bench --faults faults.json -o report.txt --compact --vectors tests.txt
//! # Fault simulate a set of test vectors
//! datpg coverage c17.bench tests.txt
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! `Network` is a gate-level netlist. Each net has a single driver: a primary input, a gate,
//! or a fanout stem when the net is a fanout branch. Fanout branches are explicit so that a
//! fault can be placed on a single branch of a stem.
//!
//! Nets carry values of a five-valued logic: 0, 1, X (unknown), D (1 in the good circuit and 0
//! in the faulty one) and D' (the opposite). The search assigns and implies such values, and a
//! test is found when D or D' reaches a primary output.
//!
//! For example, here is the test for an And gate with its output stuck at 0:
//! ```
//! # use datpg::{GateType, Network};
//! # use datpg::atpg::{AtpgConfig, DAlgorithm};
//! let mut net = Network::new();
//! let a = net.add_input("a").unwrap();
//! let b = net.add_input("b").unwrap();
//! let f = net.add_gate_net("f", GateType::And, &[a, b]).unwrap();
//! net.add_output(f).unwrap();
//!
//! let engine = DAlgorithm::new(&net, AtpgConfig::default()).unwrap();
//! let test = engine.generate_test_by_name("f", "stuck-at-0").unwrap();
//! assert_eq!(test.unwrap().to_string(), "11");
//! ```
//!
//! ## Library and documentation
//!
//! The crate is distributed as a library as well as a binary program.
//! The library is not stable, and the datastructures may change between versions.

#![warn(missing_docs)]

pub mod atpg;
pub mod io;
pub mod logic;
pub mod network;
pub mod sim;

pub use network::{stats, Gate, GateType, Net, Network, NetworkError};
