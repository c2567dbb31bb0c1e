use std::fmt;

/// Handle to a net (a named signal) of a network
///
/// Nets are stored in an arena owned by the [`Network`](crate::Network); the handle is
/// just the index in that arena, and is only meaningful for the network that created it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Net {
    a: u32,
}

impl Net {
    /// Create a net from its index in the network
    pub fn from_index(i: usize) -> Net {
        Net { a: i as u32 }
    }

    /// Obtain the index of the net in the network
    pub fn index(&self) -> usize {
        self.a as usize
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.a)
    }
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Direction of a primary port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Primary input, driven from outside the circuit
    Input,
    /// Primary output, observed from outside the circuit
    Output,
}

/// What drives the value of a net
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Primary input
    Input,
    /// Output of the gate at this index
    Gate(usize),
    /// Fanout branch of the given stem; it carries the same signal
    Stem(Net),
    /// Internal net without any driver
    Floating,
}

#[cfg(test)]
mod tests {
    use super::Net;

    #[test]
    fn test_index() {
        for i in [0, 1, 2, 17, 1 << 20] {
            assert_eq!(Net::from_index(i).index(), i);
        }
        assert!(Net::from_index(1) < Net::from_index(2));
        assert_eq!(format!("{}", Net::from_index(3)), "n3");
    }
}
