pub mod core;
pub mod error;
pub mod harness;
pub mod io;

pub mod prelude {
    pub use crate::core::{run_pf, Bus, BusIndex, BusKind, Line, LineIndex, PfReport, System, Transformer, TransformerIndex};
    pub use crate::error::{PfError, PfResult};
    pub use crate::harness::{
        loadability_curve, screen_contingencies, ContingencyResult, LoadabilityPoint, LoadabilityResult,
    };
    pub use crate::io::{bus_report, parse_system};
}
