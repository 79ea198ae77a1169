use std::fmt;

use tabled::{Table, Tabled};

use crate::core::{BusKind, System};

const LOAD_ELISION_THRESHOLD_PU: f64 = 1e-6;

/// A float rendered with a fixed number of decimal places, following the teacher's
/// `FloatWrapper` display-newtype pattern so formatting precision lives in one place instead of
/// scattered `format!` calls through the table-building code.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct FloatWrapper {
    value: f64,
    precision: usize,
}

impl FloatWrapper {
    pub fn new(value: f64, precision: usize) -> Self {
        Self { value, precision }
    }
}

impl fmt::Display for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.precision, self.value)
    }
}

impl fmt::Debug for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.precision, self.value)
    }
}

/// One row of the bus-results report.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)] // column headers read as nameplate labels (Vm_pu, PL_MW, ...)
pub struct BusReportRow {
    pub Bus: usize,
    pub Name: String,
    pub Kind: String,
    pub Vb_kV: FloatWrapper,
    pub Vm_pu: FloatWrapper,
    pub Va_deg: FloatWrapper,
    pub PL_MW: String,
    pub QL_Mvar: String,
    pub PG_MW: String,
    pub QG_Mvar: String,
}

fn elided(value_pu: f64, s_base: f64) -> String {
    if value_pu.abs() < LOAD_ELISION_THRESHOLD_PU {
        String::new()
    } else {
        format!("{:.3}", value_pu * s_base)
    }
}

/// Builds a bus-results table matching the teacher's `BusResTable` reporting style: one row per
/// bus, loads below the elision threshold rendered blank, generation columns rendered blank for
/// PQ buses (they have no solved injection to report as generation).
pub fn bus_report(system: &System) -> Table {
    let rows: Vec<BusReportRow> = system
        .buses
        .iter()
        .enumerate()
        .map(|(i, bus)| {
            let kind = match bus.kind {
                BusKind::Slack => "Slack",
                BusKind::PV => "PV",
                BusKind::PQ => "PQ",
            };
            let (pg, qg) = if bus.kind == BusKind::PQ {
                (String::new(), String::new())
            } else {
                (
                    bus.p_to_network
                        .map(|p| format!("{:.3}", p * system.s_base))
                        .unwrap_or_default(),
                    bus.q_to_network
                        .map(|q| format!("{:.3}", q * system.s_base))
                        .unwrap_or_default(),
                )
            };

            BusReportRow {
                Bus: i,
                Name: bus.name.clone(),
                Kind: kind.to_string(),
                Vb_kV: FloatWrapper::new(bus.vb, 1),
                Vm_pu: FloatWrapper::new(bus.v, 4),
                Va_deg: FloatWrapper::new(bus.theta.to_degrees(), 2),
                PL_MW: elided(bus.pl, system.s_base),
                QL_Mvar: elided(bus.ql, system.s_base),
                PG_MW: pg,
                QG_Mvar: qg,
            }
        })
        .collect();

    Table::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elides_negligible_load() {
        assert_eq!(elided(0.0, 100.0), "");
        assert_eq!(elided(5e-7, 100.0), "");
        assert_eq!(elided(0.01, 100.0), "1.000");
    }

    #[test]
    fn pq_rows_omit_generation() {
        let mut sys = System::new(100.0);
        let slack = sys.add_slack(1.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, "slack");
        let pq = sys.add_pq(0.1, 0.02, 100.0, 0.0, 0.0, "bus2");
        sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();
        crate::core::run_pf(&mut sys, 1e-12, 20).unwrap();

        let rendered = bus_report(&sys).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        // header + separators + 2 data rows at minimum
        assert!(lines.len() >= 4);
        assert!(rendered.contains("bus2"));
    }
}
