use serde::{Deserialize, Serialize};

/// Stable position of a bus within a [`System`](super::system::System)'s ordered bus list.
///
/// [`Line`](super::line::Line) and [`Transformer`](super::transformer::Transformer) endpoints
/// are stored as `BusIndex` rather than bare `usize` so that bus, line, and transformer indices
/// can't be accidentally interchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusIndex(pub usize);

impl BusIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Slack / PV / PQ bus classification.
///
/// Determines which of `V`, `theta`, `PL`, `QL` are solver inputs and which are solved outputs
/// (see the invariants documented on [`Bus`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusKind {
    Slack,
    PV,
    PQ,
}

/// One node of the network.
///
/// All electrical quantities are per-unit on the owning [`System`](super::system::System)'s
/// `s_base`; angles are in radians.
///
/// Invariants by `kind`:
/// - `Slack`: `v`, `theta` are fixed inputs; `pl`, `ql` are solved outputs (reported as
///   generation).
/// - `PV`: `v` is a fixed input; `pl` is a fixed input (net active withdrawal); `theta` and `ql`
///   are solved outputs.
/// - `PQ`: `pl`, `ql` are fixed inputs; `v` and `theta` are solved outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub kind: BusKind,
    /// Nominal base voltage in kV. Metadata only, used for reporting.
    pub vb: f64,
    /// Voltage magnitude, pu.
    pub v: f64,
    /// Voltage angle, rad.
    pub theta: f64,
    /// Net active load, pu. Positive is consumption.
    pub pl: f64,
    /// Net reactive load, pu.
    pub ql: f64,
    /// Shunt conductance, pu.
    pub g: f64,
    /// Shunt susceptance, pu.
    pub b: f64,
    /// Active power injected into the network. `None` until a solve completes.
    pub p_to_network: Option<f64>,
    /// Reactive power injected into the network. `None` until a solve completes.
    pub q_to_network: Option<f64>,
}

impl Bus {
    pub(crate) fn new(
        name: String,
        kind: BusKind,
        vb: f64,
        v: f64,
        theta: f64,
        pl: f64,
        ql: f64,
        g: f64,
        b: f64,
    ) -> Self {
        Self {
            name,
            kind,
            vb,
            v,
            theta,
            pl,
            ql,
            g,
            b,
            p_to_network: None,
            q_to_network: None,
        }
    }
}
