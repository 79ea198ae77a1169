pub mod contingency;
pub mod loadability;

pub use contingency::{screen_contingencies, ContingencyResult};
pub use loadability::{loadability_curve, LoadabilityPoint, LoadabilityResult};
