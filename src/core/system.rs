use serde::{Deserialize, Serialize};

use crate::error::{PfError, PfResult};

use super::bus::{Bus, BusIndex, BusKind};
use super::line::{Line, LineIndex};
use super::transformer::{Transformer, TransformerIndex};

/// Owns every bus, line, and transformer of a network for the lifetime of a study.
///
/// Buses are stored in raw insertion order (`buses[i]` never moves once pushed, so a
/// [`BusIndex`] returned by `add_slack`/`add_pq`/`add_pv` is stable forever). The solve order
/// required by the Jacobian block structure -- slack first, then PQ buses, then PV buses -- is
/// tracked separately as three lists of storage indices and merged on demand by [`System::order`]
/// each time a solve runs, mirroring the permutation the teacher computes in
/// `prepare_matrices`/`create_premute_mat` rather than physically reordering storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    pub buses: Vec<Bus>,
    pub lines: Vec<Line>,
    pub transformers: Vec<Transformer>,
    pub s_base: f64,
    pub status: String,
    slack: Vec<usize>,
    pq: Vec<usize>,
    pv: Vec<usize>,
}

impl System {
    pub fn new(s_base: f64) -> Self {
        Self {
            buses: Vec::new(),
            lines: Vec::new(),
            transformers: Vec::new(),
            s_base,
            status: String::from("unsolved"),
            slack: Vec::new(),
            pq: Vec::new(),
            pv: Vec::new(),
        }
    }

    fn push_bus(&mut self, bus: Bus) -> BusIndex {
        let idx = self.buses.len();
        match bus.kind {
            BusKind::Slack => self.slack.push(idx),
            BusKind::PQ => self.pq.push(idx),
            BusKind::PV => self.pv.push(idx),
        }
        self.buses.push(bus);
        BusIndex(idx)
    }

    /// Adds the slack (reference) bus. `v`/`theta` are fixed inputs; `pl`/`ql` become solved
    /// outputs (reported as generation).
    #[allow(clippy::too_many_arguments)]
    pub fn add_slack(
        &mut self,
        v: f64,
        vb: f64,
        theta: f64,
        pl: f64,
        ql: f64,
        g: f64,
        b: f64,
        name: impl Into<String>,
    ) -> BusIndex {
        self.push_bus(Bus::new(name.into(), BusKind::Slack, vb, v, theta, pl, ql, g, b))
    }

    /// Adds a PQ (load) bus. `pl`/`ql` are fixed inputs; `v`/`theta` are solved outputs.
    /// Starts from the flat-start guess `v = 1.0 pu`, `theta = 0`.
    pub fn add_pq(
        &mut self,
        pl: f64,
        ql: f64,
        vb: f64,
        g: f64,
        b: f64,
        name: impl Into<String>,
    ) -> BusIndex {
        self.push_bus(Bus::new(name.into(), BusKind::PQ, vb, 1.0, 0.0, pl, ql, g, b))
    }

    /// Adds a PV (generator) bus. `v`/`pl` are fixed inputs; `theta`/`ql` are solved outputs.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pv(
        &mut self,
        pl: f64,
        v: f64,
        vb: f64,
        ql: f64,
        g: f64,
        b: f64,
        name: impl Into<String>,
    ) -> BusIndex {
        self.push_bus(Bus::new(name.into(), BusKind::PV, vb, v, 0.0, pl, ql, g, b))
    }

    fn check_bus(&self, idx: BusIndex) -> PfResult<()> {
        if idx.0 < self.buses.len() {
            Ok(())
        } else {
            Err(PfError::UnknownBus(idx.0))
        }
    }

    /// Adds a symmetric pi-model line. `total_g`/`total_b` are split evenly between the two
    /// ends' shunt admittance.
    pub fn add_line(
        &mut self,
        from_bus: BusIndex,
        to_bus: BusIndex,
        x: f64,
        r: f64,
        total_g: f64,
        total_b: f64,
    ) -> PfResult<LineIndex> {
        self.check_bus(from_bus)?;
        self.check_bus(to_bus)?;
        let half_y = num_complex::Complex64::new(total_g, total_b) / 2.0;
        let idx = self.lines.len();
        self.lines.push(Line {
            from_bus,
            to_bus,
            r,
            x,
            from_y: half_y,
            to_y: half_y,
            in_operation: true,
        });
        Ok(LineIndex(idx))
    }

    /// Adds a two-winding transformer. `r`/`x` are given on the transformer's own MVA base and
    /// are converted here to the system base: `Z_sys = Z_own * s_base / mva`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_transformer(
        &mut self,
        from_bus: BusIndex,
        to_bus: BusIndex,
        r: f64,
        x: f64,
        n: f64,
        mva: f64,
        s_base: f64,
    ) -> PfResult<TransformerIndex> {
        self.check_bus(from_bus)?;
        self.check_bus(to_bus)?;
        let idx = self.transformers.len();
        self.transformers.push(Transformer {
            from_bus,
            to_bus,
            r: r * s_base / mva,
            x: x * s_base / mva,
            n,
        });
        Ok(TransformerIndex(idx))
    }

    pub fn bus(&self, idx: BusIndex) -> &Bus {
        &self.buses[idx.0]
    }

    pub fn bus_mut(&mut self, idx: BusIndex) -> &mut Bus {
        &mut self.buses[idx.0]
    }

    pub fn n_pq(&self) -> usize {
        self.pq.len()
    }

    pub fn n_pv(&self) -> usize {
        self.pv.len()
    }

    /// Serializes the full network state (buses, lines, transformers, `S_base`) to JSON, for
    /// saving a solved case alongside its report.
    pub fn to_json(&self) -> PfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a network previously written by [`System::to_json`].
    pub fn from_json(text: &str) -> PfResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Storage indices in solve order: `[slack, pq.., pv..]`.
    ///
    /// Fails if the system has no buses, or does not have exactly one slack bus.
    pub fn order(&self) -> PfResult<Vec<usize>> {
        if self.buses.is_empty() {
            return Err(PfError::EmptySystem);
        }
        match self.slack.len() {
            0 => return Err(PfError::NoSlackBus),
            1 => {}
            n => return Err(PfError::MultipleSlackBuses(n)),
        }
        let mut order = Vec::with_capacity(self.buses.len());
        order.extend_from_slice(&self.slack);
        order.extend_from_slice(&self.pq);
        order.extend_from_slice(&self.pv);
        Ok(order)
    }
}
