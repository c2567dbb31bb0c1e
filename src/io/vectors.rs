//! IO for test vector files
//!
//! Each line holds one vector as space-separated assignments of the primary inputs:
//! ```text
//!     # Comment
//!     a=1 b=0 c=1
//!     a=0 b=0 c=0
//! ```

use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::atpg::TestVector;
use crate::io::ReadError;
use crate::Network;

fn parse_value(line: usize, name: &str, value: &str) -> Result<bool, ReadError> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        v => Err(ReadError::Vectors(format!(
            "line {line}: invalid value {v} for input {name}"
        ))),
    }
}

/// Read test vectors for a network
///
/// Inputs that are not assigned on a line are set to 0. Names that are not primary inputs of
/// the network are rejected.
pub fn read_vectors<R: Read>(r: R, aig: &Network) -> Result<Vec<TestVector>, ReadError> {
    let mut ret = Vec::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let s = l?;
        let line = i + 1;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let mut bits = vec![false; aig.nb_inputs()];
        for token in t.split_whitespace() {
            let Some((name, value)) = token.split_once(['=', ':']) else {
                return Err(ReadError::Vectors(format!(
                    "line {line}: expected name=value, got {token}"
                )));
            };
            let pos = aig
                .net(name)
                .and_then(|n| aig.inputs().iter().position(|i| *i == n))
                .ok_or_else(|| {
                    ReadError::Vectors(format!("line {line}: {name} is not a primary input"))
                })?;
            bits[pos] = parse_value(line, name, value)?;
        }
        ret.push(TestVector::new(bits));
    }
    Ok(ret)
}

/// Write test vectors, one per line, with the inputs in declaration order
pub fn write_vectors<W: Write>(
    w: &mut W,
    aig: &Network,
    vectors: &[TestVector],
) -> std::io::Result<()> {
    for v in vectors {
        let line = v
            .named(aig)
            .into_iter()
            .map(|(n, c)| format!("{n}={c}"))
            .join(" ");
        writeln!(w, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_vectors, write_vectors};
    use crate::atpg::TestVector;
    use crate::io::ReadError;
    use crate::network::generators::testcases;

    #[test]
    fn test_read() {
        let aig = testcases::fanout_example().unwrap();
        let example = "# Two vectors
a=1 b=0 c=0 d=1

d:1 a:0
";
        let vectors = read_vectors(example.as_bytes(), &aig).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].to_string(), "1001");
        assert_eq!(vectors[1].to_string(), "0001");
    }

    #[test]
    fn test_write_read() {
        let aig = testcases::c17().unwrap();
        let vectors = vec![
            TestVector::new(vec![true, false, true, true, false]),
            TestVector::new(vec![false; 5]),
        ];
        let mut buf = Vec::new();
        write_vectors(&mut buf, &aig, &vectors).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1=1 2=0 3=1 6=1 7=0\n1=0 2=0 3=0 6=0 7=0\n");
        assert_eq!(read_vectors(text.as_bytes(), &aig).unwrap(), vectors);
    }

    #[test]
    fn test_rejected() {
        let aig = testcases::and2().unwrap();
        for bad in ["a=1 f=0", "a=1 b=X", "a=1 b", "x=0"] {
            assert!(
                matches!(
                    read_vectors(bad.as_bytes(), &aig),
                    Err(ReadError::Vectors(_))
                ),
                "{bad}"
            );
        }
    }
}
