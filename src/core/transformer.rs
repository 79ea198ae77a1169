use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::bus::BusIndex;

/// Stable position of a transformer within a [`System`](super::system::System)'s transformer
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerIndex(pub usize);

/// A two-winding transformer with an off-nominal tap.
///
/// `r`/`x` are already converted to the system base (`Z_sys = Z_own * S_base / MVA_rating`) by
/// [`System::add_transformer`](super::system::System::add_transformer). `n` is the off-nominal
/// tap ratio in pu: the transformer steps from the `from_bus` side at `n:1` to the `to_bus` side
/// at `1:1`.
///
/// Transformers are always in service in this model; there is no `in_operation` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    pub from_bus: BusIndex,
    pub to_bus: BusIndex,
    pub r: f64,
    pub x: f64,
    pub n: f64,
}

/// The pi-equivalent of a transformer: series admittance and the two shunt branches.
pub struct TrafoPiModel {
    pub y_series: Complex64,
    pub from_y: Complex64,
    pub to_y: Complex64,
}

impl Transformer {
    /// Computes the pi-equivalent branch parameters used by the admittance assembler.
    pub fn pi_model(&self) -> TrafoPiModel {
        let y = Complex64::new(1.0, 0.0) / Complex64::new(self.r, self.x);
        let y_series = y / self.n;
        let from_y = y / (self.n * self.n) - y_series;
        let to_y = y - y_series;
        TrafoPiModel {
            y_series,
            from_y,
            to_y,
        }
    }
}
