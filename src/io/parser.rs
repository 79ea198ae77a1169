use std::collections::HashMap;

use crate::core::{BusIndex, System};
use crate::error::{PfError, PfResult};

#[derive(Default)]
struct GenEntry {
    p_mw: f64,
    v_kv: f64,
}

#[derive(Default)]
struct LoadEntry {
    p_mw: f64,
    q_mvar: f64,
}

/// Parses the whitespace-separated `Barra`/`Generador`/`Carga`/`Compensador`/`Línea`/
/// `Transformador` case-file format into a [`System`] on base `s_base` (MVA).
///
/// Records are expected in blocks (all `Barra` records, then `Generador`, `Carga`,
/// `Compensador`, and finally the branch records), matching the source data file's layout.
/// Blank lines are skipped; unrecognized record kinds are ignored. A bus name referenced by
/// `Generador`/`Carga`/`Compensador`/`Línea`/`Transformador` that was never declared by a `Barra`
/// record is a [`PfError::UnknownBus`] (reported as the 1-based line number it was found on,
/// since no integer bus index exists yet at parse time).
pub fn parse_system(input: &str, s_base: f64) -> PfResult<System> {
    let mut bus_order: Vec<String> = Vec::new();
    let mut vb: HashMap<String, f64> = HashMap::new();
    let mut gen: HashMap<String, GenEntry> = HashMap::new();
    let mut load: HashMap<String, LoadEntry> = HashMap::new();
    let mut shunt_b: HashMap<String, f64> = HashMap::new();
    let mut slack_name: Option<String> = None;
    let mut branch_lines: Vec<(usize, Vec<&str>)> = Vec::new();

    for (line_no, raw) in input.lines().enumerate() {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        match tokens[0] {
            "Barra" => {
                let name = field(&tokens, 2, line_no)?.to_string();
                let vb_kv = numeric(&tokens, 7, line_no)?;
                vb.insert(name.clone(), vb_kv);
                bus_order.push(name);
            }
            "Generador" => {
                let name = field(&tokens, 3, line_no)?.to_string();
                require_known(&bus_order, &name, line_no)?;
                let p_mw = numeric(&tokens, 7, line_no)?;
                let v_kv = numeric(&tokens, 12, line_no)?;
                if name == "g20" {
                    slack_name = Some(name.clone());
                }
                let entry = gen.entry(name).or_default();
                entry.p_mw += p_mw;
                entry.v_kv = v_kv;
            }
            "Carga" => {
                let name = field(&tokens, 3, line_no)?.to_string();
                require_known(&bus_order, &name, line_no)?;
                let p_mw = numeric(&tokens, 5, line_no)?;
                let q_mvar = numeric(&tokens, 8, line_no)?;
                let entry = load.entry(name).or_default();
                entry.p_mw += p_mw;
                entry.q_mvar += q_mvar;
            }
            "Compensador" => {
                let name = field(&tokens, 3, line_no)?.to_string();
                require_known(&bus_order, &name, line_no)?;
                let q_mvar = numeric(&tokens, 6, line_no)?;
                shunt_b.insert(name, q_mvar);
            }
            "Línea" | "Transformador" => {
                branch_lines.push((line_no, tokens));
            }
            _ => {}
        }
    }

    let mut system = System::new(s_base);
    let mut index_of: HashMap<String, BusIndex> = HashMap::new();

    for name in &bus_order {
        let bus_vb = *vb.get(name).expect("bus_order only holds declared buses");
        let load_entry = load.get(name);
        let b_pu = shunt_b.get(name).map(|q| q / s_base).unwrap_or(0.0);

        let idx = if slack_name.as_deref() == Some(name.as_str()) {
            let g = gen.get(name).expect("slack bus must have a Generador record");
            system.add_slack(g.v_kv / bus_vb, bus_vb, 0.0, 0.0, 0.0, 0.0, b_pu, name.as_str())
        } else if let Some(g) = gen.get(name) {
            let load_p = load_entry.map(|l| l.p_mw).unwrap_or(0.0);
            let pl = (load_p - g.p_mw) / s_base;
            system.add_pv(pl, g.v_kv / bus_vb, bus_vb, 0.0, 0.0, b_pu, name.as_str())
        } else {
            let pl = load_entry.map(|l| l.p_mw).unwrap_or(0.0) / s_base;
            let ql = load_entry.map(|l| l.q_mvar).unwrap_or(0.0) / s_base;
            system.add_pq(pl, ql, bus_vb, 0.0, b_pu, name.as_str())
        };
        index_of.insert(name.clone(), idx);
    }

    if slack_name.is_none() {
        return Err(PfError::NoSlackBus);
    }

    for (line_no, tokens) in branch_lines {
        match tokens[0] {
            "Línea" => {
                let from_name = field(&tokens, 2, line_no)?;
                let to_name = field(&tokens, 4, line_no)?;
                let from_bus = resolve(&index_of, from_name, line_no)?;
                let to_bus = resolve(&index_of, to_name, line_no)?;
                let bus_vb = *vb.get(from_name).unwrap();

                let r_ohm = numeric(&tokens, 8, line_no)?;
                let x_ohm = numeric(&tokens, 12, line_no)?;
                let b_us = numeric(&tokens, 17, line_no)?;

                let r_pu = r_ohm * s_base / (bus_vb * bus_vb);
                let x_pu = x_ohm * s_base / (bus_vb * bus_vb);
                let b_pu = b_us * 1e-6 * bus_vb * bus_vb / s_base;

                system.add_line(from_bus, to_bus, x_pu, r_pu, 0.0, b_pu)?;
            }
            "Transformador" => {
                let from_name = field(&tokens, 2, line_no)?;
                let to_name = field(&tokens, 4, line_no)?;
                let from_bus = resolve(&index_of, from_name, line_no)?;
                let to_bus = resolve(&index_of, to_name, line_no)?;

                let r_pct = numeric(&tokens, 8, line_no)?;
                let x_pct = numeric(&tokens, 12, line_no)?;
                let tap_pct = numeric(&tokens, 16, line_no)?;
                let mva = numeric(&tokens, 21, line_no)?;

                system.add_transformer(
                    from_bus,
                    to_bus,
                    r_pct / 100.0,
                    x_pct / 100.0,
                    tap_pct / 100.0,
                    mva,
                    s_base,
                )?;
            }
            _ => unreachable!("branch_lines only holds Línea/Transformador records"),
        }
    }

    Ok(system)
}

fn field<'a>(tokens: &[&'a str], idx: usize, line_no: usize) -> PfResult<&'a str> {
    tokens
        .get(idx)
        .copied()
        .ok_or_else(|| PfError::ParseError(format!("line {}: missing field {}", line_no + 1, idx)))
}

fn numeric(tokens: &[&str], idx: usize, line_no: usize) -> PfResult<f64> {
    Ok(field(tokens, idx, line_no)?.parse::<f64>()?)
}

fn require_known(bus_order: &[String], name: &str, line_no: usize) -> PfResult<()> {
    if bus_order.iter().any(|n| n == name) {
        Ok(())
    } else {
        Err(PfError::ParseError(format!(
            "line {}: bus '{}' referenced before its Barra record",
            line_no + 1,
            name
        )))
    }
}

fn resolve(index_of: &HashMap<String, BusIndex>, name: &str, line_no: usize) -> PfResult<BusIndex> {
    index_of
        .get(name)
        .copied()
        .ok_or_else(|| PfError::ParseError(format!("line {}: unknown bus '{}'", line_no + 1, name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run_pf;

    const FIXTURE: &str = "\
Barra 1 g20 3 4 5 6 100.0
Barra 1 load1 3 4 5 6 100.0
Generador 1 2 g20 4 5 6 1.0 8 9 10 11 100.0
Carga 1 2 load1 4 50.0 6 7 10.0
Línea 1 load1 3 g20 5 6 7 0.01 9 10 11 0.1 13 14 15 16 0.0
";

    #[test]
    fn parses_a_minimal_case() {
        let system = parse_system(FIXTURE, 100.0).unwrap();
        assert_eq!(system.buses.len(), 2);
        assert_eq!(system.lines.len(), 1);

        let order = system.order().unwrap();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn parsed_case_converges() {
        let mut system = parse_system(FIXTURE, 100.0).unwrap();
        let report = run_pf(&mut system, 1e-10, 20).unwrap();
        assert!(report.converged);
    }

    #[test]
    fn rejects_forward_reference() {
        let bad = "Carga 1 2 ghost 4 5 6 1.0 7 0.1\nBarra 1 ghost 3 4 5 6 100.0\n";
        let err = parse_system(bad, 100.0).unwrap_err();
        assert!(matches!(err, PfError::ParseError(_)));
    }

    #[test]
    fn unknown_record_kinds_are_ignored() {
        let input = "Anotacion esto no es un registro conocido\n".to_string() + FIXTURE;
        let system = parse_system(&input, 100.0).unwrap();
        assert_eq!(system.buses.len(), 2);
    }

    #[test]
    fn multiple_generators_at_a_bus_sum_p_and_keep_last_v() {
        let input = "\
Barra 1 g20 3 4 5 6 100.0
Generador 1 2 g20 4 5 6 1.0 8 9 10 11 100.0
Generador 1 2 g20 4 5 6 1.0 8 9 10 11 101.0
";
        let system = parse_system(input, 100.0).unwrap();
        let order = system.order().unwrap();
        let slack = system.bus(crate::core::BusIndex(order[0]));
        assert_eq!(slack.v, 101.0 / 100.0);
    }

    #[test]
    fn multiple_compensators_at_a_bus_overwrite() {
        let input = "\
Barra 1 load1 3 4 5 6 100.0
Compensador 1 2 load1 4 5 10.0
Compensador 1 2 load1 4 5 25.0
";
        let system = parse_system(input, 100.0).unwrap();
        let bus = &system.buses[0];
        assert_eq!(bus.b, 25.0 / 100.0);
    }
}
