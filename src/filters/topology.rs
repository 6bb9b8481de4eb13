//! Supported filter shapes.

use std::fmt;
use std::str::FromStr;

use crate::error::{DesignError, Result};

/// Circuit shape of a passive filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Series R, shunt C.
    Lowpass,
    /// Series C, shunt R.
    Highpass,
    /// Series R and L, shunt C.
    Bandpass,
}

impl Topology {
    /// Every topology, ordered by index.
    pub const ALL: [Topology; 3] = [Topology::Lowpass, Topology::Highpass, Topology::Bandpass];

    /// Scalar indicator fed to the model and stored in datasets.
    pub fn index(self) -> usize {
        match self {
            Topology::Lowpass => 0,
            Topology::Highpass => 1,
            Topology::Bandpass => 2,
        }
    }

    /// Inverse of [`Topology::index`].
    pub fn from_index(index: i64) -> Result<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| DesignError::InvalidTopology {
                name: format!("index {}", index),
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Topology::Lowpass => "lowpass",
            Topology::Highpass => "highpass",
            Topology::Bandpass => "bandpass",
        }
    }

    /// Whether the circuit contains an inductor.
    pub fn uses_inductor(self) -> bool {
        matches!(self, Topology::Bandpass)
    }
}

impl FromStr for Topology {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| DesignError::InvalidTopology { name: s.to_string() })
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("lowpass".parse::<Topology>().unwrap(), Topology::Lowpass);
        assert_eq!("HighPass".parse::<Topology>().unwrap(), Topology::Highpass);
        assert_eq!(" bandpass ".parse::<Topology>().unwrap(), Topology::Bandpass);
    }

    #[test]
    fn test_unknown_names_rejected() {
        for name in ["notch", "bandstop", ""] {
            assert!(matches!(
                name.parse::<Topology>(),
                Err(DesignError::InvalidTopology { .. })
            ));
        }
    }

    #[test]
    fn test_index_round_trip() {
        for topology in Topology::ALL {
            assert_eq!(Topology::from_index(topology.index() as i64).unwrap(), topology);
        }
        assert!(Topology::from_index(3).is_err());
        assert!(Topology::from_index(-1).is_err());
    }
}
