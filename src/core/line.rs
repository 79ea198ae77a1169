use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::bus::BusIndex;

/// Stable position of a line within a [`System`](super::system::System)'s line list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex(pub usize);

/// A symmetric pi-model branch between two buses.
///
/// The total line-charging admittance is split in half between `from_y` and `to_y` by
/// [`System::add_line`](super::system::System::add_line); a disabled line (`in_operation ==
/// false`) contributes nothing to the admittance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub from_bus: BusIndex,
    pub to_bus: BusIndex,
    pub r: f64,
    pub x: f64,
    pub from_y: Complex64,
    pub to_y: Complex64,
    pub in_operation: bool,
}

impl Line {
    /// Series admittance `1 / (R + jX)`.
    pub fn series_y(&self) -> Complex64 {
        Complex64::new(1.0, 0.0) / Complex64::new(self.r, self.x)
    }
}
