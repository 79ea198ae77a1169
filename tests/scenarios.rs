use nordic_pf::prelude::*;

#[test]
fn s2_glover_five_bus_converges() {
    let mut sys = System::new(100.0);
    let b1 = sys.add_slack(1.0, 15.0, 0.0, 0.0, 0.0, 0.0, 0.0, "B1");
    let b2 = sys.add_pq(8.0, 2.8, 345.0, 0.0, 0.0, "B2");
    let b3 = sys.add_pv(0.8 - 5.2, 1.05, 15.0, 0.0, 0.0, 0.0, "B3");
    let b4 = sys.add_pq(0.0, 0.0, 345.0, 0.0, 0.0, "B4");
    let b5 = sys.add_pq(0.0, 0.0, 345.0, 0.0, 0.0, "B5");

    sys.add_line(b2, b4, 0.1, 0.009, 0.0, 1.72).unwrap();
    sys.add_line(b2, b5, 0.05, 0.0045, 0.0, 0.88).unwrap();
    sys.add_line(b4, b5, 0.025, 0.00225, 0.0, 0.44).unwrap();
    sys.add_line(b1, b5, 0.02, 0.0015, 0.0, 0.0).unwrap();
    sys.add_line(b3, b4, 0.01, 0.00075, 0.0, 0.0).unwrap();

    let report = run_pf(&mut sys, 1e-12, 20).unwrap();
    assert!(report.converged, "expected convergence, got {}", report.status);
    assert!(report.iterations <= 20);

    // Invariant 1: every PQ bus's mismatch against its fixed injection vanishes.
    for &idx in &[b2, b4, b5] {
        let bus = sys.bus(idx);
        let p = bus.p_to_network.unwrap();
        let q = bus.q_to_network.unwrap();
        assert!((p + bus.pl).abs() < 1e-9, "P mismatch at {}", bus.name);
        assert!((q + bus.ql).abs() < 1e-9, "Q mismatch at {}", bus.name);
    }

    // Invariant 2: PV bus keeps its setpoint voltage exactly and its P mismatch vanishes.
    let bus3 = sys.bus(b3);
    assert_eq!(bus3.v, 1.05);
    assert!((bus3.p_to_network.unwrap() + bus3.pl).abs() < 1e-9);

    // Invariant 3: slack voltage/angle are untouched by the solve.
    let bus1 = sys.bus(b1);
    assert_eq!(bus1.v, 1.0);
    assert_eq!(bus1.theta, 0.0);

    // Invariant: system-wide real power balance -- total injected into the network covers
    // losses, so it cannot be negative.
    let total_p: f64 = sys
        .buses
        .iter()
        .map(|b| b.p_to_network.unwrap())
        .sum();
    assert!(total_p > -1e-9, "network lost energy: {total_p}");
}

#[test]
fn s5_transformer_base_change() {
    let mut sys = System::new(100.0);
    let a = sys.add_slack(1.0, 15.0, 0.0, 0.0, 0.0, 0.0, 0.0, "A");
    let b = sys.add_pq(0.1, 0.0, 15.0, 0.0, 0.0, "B");
    let idx = sys.add_transformer(a, b, 0.01, 0.02, 1.0, 200.0, 100.0).unwrap();

    assert!((sys.transformers[idx.0].r - 0.005).abs() < 1e-12);
    assert!((sys.transformers[idx.0].x - 0.01).abs() < 1e-12);
}

#[test]
fn admittance_is_symmetric_for_a_meshed_network() {
    let mut sys = System::new(100.0);
    let b1 = sys.add_slack(1.0, 15.0, 0.0, 0.0, 0.0, 0.0, 0.0, "B1");
    let b2 = sys.add_pq(0.2, 0.05, 15.0, 0.0, 0.0, "B2");
    let b3 = sys.add_pq(0.1, 0.02, 15.0, 0.0, 0.0, "B3");
    sys.add_line(b1, b2, 0.1, 0.01, 0.0, 0.02).unwrap();
    sys.add_line(b2, b3, 0.08, 0.01, 0.0, 0.01).unwrap();
    sys.add_line(b1, b3, 0.12, 0.015, 0.0, 0.015).unwrap();

    let order = sys.order().unwrap();
    let y = nordic_pf::core::admittance::build_y(&sys, &order);
    for i in 0..y.nrows() {
        for j in 0..y.ncols() {
            if i != j {
                assert_eq!(y[(i, j)], y[(j, i)], "Y not symmetric at ({i},{j})");
            }
        }
    }
}

#[test]
fn s6_overload_reports_non_convergence() {
    let mut sys = System::new(100.0);
    let slack = sys.add_slack(1.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, "slack");
    let pq = sys.add_pq(20.0, 20.0, 100.0, 0.0, 0.0, "bus2");
    sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();

    let report = run_pf(&mut sys, 1e-12, 20).unwrap();
    assert!(!report.converged);
    assert!(report.status.starts_with("non-convergent"));
}
