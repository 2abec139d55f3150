//! Output raster dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel dimensions of one PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `"{w}x{h}"`, or `"{n}"` as a square.
impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid size '{}': expected WIDTHxHEIGHT or SIDE", s))
        };

        let size = match s.split_once(['x', 'X']) {
            Some((w, h)) => Size::new(parse(w)?, parse(h)?),
            None => Size::square(parse(s)?),
        };

        if !size.is_valid() {
            return Err(format!("invalid size '{}': dimensions must be non-zero", s));
        }
        Ok(size)
    }
}
