use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::value::{check_finite, decode_float, decode_uint, split_fields};

/// A surface point pinned to a fixed temperature. Sources and sinks are
/// treated identically.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSink {
    pub x: u64,
    pub y: u64,
    pub temp: f64,
}

impl SourceSink {
    pub fn new(x: u64, y: u64, temp: f64) -> Self {
        Self { x, y, temp }
    }

    /// Whether the point lies on an `x_bound` by `y_bound` surface.
    pub fn within(&self, x_bound: u64, y_bound: u64) -> bool {
        self.x < x_bound && self.y < y_bound
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        check_finite(self.temp).map(|_| ())
    }
}

impl fmt::Display for SourceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} y={} temp={:.6}", self.x, self.y, self.temp)
    }
}

const EXPECTED: &str =
    "expected X,Y,TEMP where X and Y are non-negative integers and TEMP is a number";

impl FromStr for SourceSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, temp] = split_fields::<3>(s).ok_or_else(|| EXPECTED.to_string())?;
        let x = decode_uint(x).map_err(|e| format!("{}: {}", EXPECTED, e))?;
        let y = decode_uint(y).map_err(|e| format!("{}: {}", EXPECTED, e))?;
        let temp = decode_float(temp).map_err(|e| format!("{}: {}", EXPECTED, e))?;
        Ok(Self::new(x, y, temp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_triple() {
        let s: SourceSink = "200,300,100.0".parse().unwrap();
        assert_eq!(s, SourceSink::new(200, 300, 100.0));

        let s: SourceSink = "0, 5, -1e2".parse().unwrap();
        assert_eq!(s, SourceSink::new(0, 5, -100.0));
    }

    #[test]
    fn rejects_wrong_field_count() {
        for bad in ["1,2", "1,2,3,4", "", "1;2;3"] {
            let err = bad.parse::<SourceSink>().unwrap_err();
            assert!(err.starts_with("expected X,Y,TEMP"), "{:?}: {}", bad, err);
        }
    }

    #[test]
    fn rejects_bad_fields() {
        for bad in ["-1,2,3", "1,y,3", "1,2,hot", "1,2,", "1.5,2,3", "1,2,nan"] {
            assert!(bad.parse::<SourceSink>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn bounds_are_exclusive() {
        let s = SourceSink::new(9, 0, 1.0);
        assert!(s.within(10, 1));
        assert!(!s.within(9, 1));
        assert!(!s.within(10, 0));
    }

    #[test]
    fn displays_like_the_report() {
        let s = SourceSink::new(3, 4, 0.5);
        assert_eq!(s.to_string(), "x=3 y=4 temp=0.500000");
    }
}
