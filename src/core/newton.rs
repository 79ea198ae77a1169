use nalgebra::DVector;
use num_complex::Complex64;
use tracing::{info, warn};

use crate::error::{PfError, PfResult};

use super::admittance::build_y;
use super::bus::BusKind;
use super::jacobian::{build_jacobian, ds_dv, s_bus};
use super::system::System;

/// Outcome of a single [`run_pf`] call.
#[derive(Debug, Clone)]
pub struct PfReport {
    pub converged: bool,
    pub iterations: usize,
    pub status: String,
}

/// Builds the complex voltage phasor vector from the canonical `vm`/`va` state. `vm`/`va` are
/// the only source of truth for bus voltage magnitude/angle during the iteration -- `v` is a
/// throwaway view onto them for the matrix math and is never read back via `.norm()`/`.arg()`,
/// since that round trip is not guaranteed bit-exact (see `apply_correction`).
fn complex_v(vm: &[f64], va: &[f64]) -> DVector<Complex64> {
    DVector::from_iterator(
        vm.len(),
        vm.iter().zip(va).map(|(&m, &a)| Complex64::from_polar(m, a)),
    )
}

fn s_injected(system: &System, order: &[usize]) -> DVector<Complex64> {
    DVector::from_iterator(
        order.len(),
        order.iter().map(|&i| {
            let bus = &system.buses[i];
            Complex64::new(-bus.pl, -bus.ql)
        }),
    )
}

fn mismatch(y: &nalgebra::DMatrix<Complex64>, v: &DVector<Complex64>, s_inj: &DVector<Complex64>, npq: usize) -> DVector<f64> {
    let delta_s = s_bus(y, v) - s_inj;
    let n = v.len();
    let n_nonslack = n - 1;
    let mut f = DVector::zeros(n_nonslack + npq);
    for (out, i) in (1..n).enumerate() {
        f[out] = delta_s[i].re;
    }
    for (out, i) in (1..=npq).enumerate() {
        f[n_nonslack + out] = delta_s[i].im;
    }
    f
}

/// Updates the canonical `vm`/`va` state in place. The slack bus (position 0) never has its
/// angle or magnitude touched, and PV buses (positions `npq+1..`) never have their magnitude
/// touched -- mirroring `update_v`'s assignment only to non-slack angles and PQ magnitudes.
fn apply_correction(vm: &mut [f64], va: &mut [f64], dx: &DVector<f64>, npq: usize) {
    let n = va.len();
    let n_nonslack = n - 1;

    for (k, i) in (1..n).enumerate() {
        va[i] -= dx[k];
    }
    for (k, i) in (1..=npq).enumerate() {
        vm[i] -= dx[n_nonslack + k];
    }
}

/// Runs Newton-Raphson power flow on `system`, mutating bus voltages/angles in place and
/// writing `p_to_network`/`q_to_network` on every bus once the loop terminates.
///
/// Returns `Ok` whether or not the iteration converged -- non-convergence is an expected,
/// routinely-handled outcome of the outer harness (see [`crate::harness`]), not a defect.
/// `Err` is reserved for ill-posed networks (no/multiple slack buses, unknown branch endpoints,
/// empty system) and a singular Jacobian encountered mid-solve.
pub fn run_pf(system: &mut System, tol: f64, max_iters: usize) -> PfResult<PfReport> {
    let order = system.order()?;
    let npq = system.n_pq();

    let y = build_y(system, &order);

    // Flat start: theta = 0 for all non-slack buses, |V| = 1 for PQ buses. Slack V/theta and PV
    // V are left at their given values.
    for (pos, &storage_idx) in order.iter().enumerate() {
        if pos == 0 {
            continue;
        }
        let bus = &mut system.buses[storage_idx];
        bus.theta = 0.0;
        if bus.kind == BusKind::PQ {
            bus.v = 1.0;
        }
    }

    let s_inj = s_injected(system, &order);
    let mut vm: Vec<f64> = order.iter().map(|&i| system.buses[i].v).collect();
    let mut va: Vec<f64> = order.iter().map(|&i| system.buses[i].theta).collect();
    let mut v = complex_v(&vm, &va);
    let mut f = mismatch(&y, &v, &s_inj, npq);

    let mut iter = 0usize;
    while f.amax() > tol && iter < max_iters {
        let (ds_dvm, ds_dva) = ds_dv(&y, &v);
        let j = build_jacobian(&ds_dvm, &ds_dva, npq);

        let dx = j
            .lu()
            .solve(&f)
            .ok_or(PfError::SingularJacobian(iter))?;

        apply_correction(&mut vm, &mut va, &dx, npq);
        v = complex_v(&vm, &va);
        f = mismatch(&y, &v, &s_inj, npq);
        iter += 1;
    }

    // vm/va were never derived from `v` -- slack and PV magnitudes are untouched since flat
    // start, so this write-back is exact rather than a polar round trip.
    for (pos, &storage_idx) in order.iter().enumerate() {
        let bus = &mut system.buses[storage_idx];
        bus.v = vm[pos];
        bus.theta = va[pos];
    }

    let s_net = s_bus(&y, &v);
    for (pos, &storage_idx) in order.iter().enumerate() {
        let bus = &mut system.buses[storage_idx];
        bus.p_to_network = Some(s_net[pos].re);
        bus.q_to_network = Some(s_net[pos].im);
    }

    let converged = iter < max_iters;
    let status = if converged {
        let tol_w = tol * system.s_base * 1e6;
        format!("solved (max |F| < {tol_w:.3} W) in {iter} iterations")
    } else {
        format!("non-convergent after {iter} iterations")
    };

    if converged {
        info!(iterations = iter, status = %status, "power flow converged");
    } else {
        warn!(iterations = iter, "power flow did not converge");
    }

    system.status = status.clone();
    Ok(PfReport {
        converged,
        iterations: iter,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system::System;

    #[test]
    fn two_bus_slack_pq_matches_s1() {
        let mut sys = System::new(100.0);
        let slack = sys.add_slack(1.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, "slack");
        let pq = sys.add_pq(0.5, 0.1, 100.0, 0.0, 0.0, "bus2");
        sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();

        let report = run_pf(&mut sys, 1e-12, 20).unwrap();
        assert!(report.converged);
        assert!(report.iterations <= 5);

        let bus2 = sys.bus(pq);
        assert!((bus2.v - 0.9467).abs() < 1e-3, "V2={}", bus2.v);
        assert!((bus2.theta.to_degrees() - (-2.93)).abs() < 1e-1, "theta2={}", bus2.theta.to_degrees());
    }

    #[test]
    fn pq_mismatch_vanishes_at_convergence() {
        let mut sys = System::new(100.0);
        let slack = sys.add_slack(1.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, "slack");
        let pq = sys.add_pq(0.5, 0.1, 100.0, 0.0, 0.0, "bus2");
        sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();

        let report = run_pf(&mut sys, 1e-12, 20).unwrap();
        assert!(report.converged);

        let bus2 = sys.bus(pq);
        let p = bus2.p_to_network.unwrap();
        let q = bus2.q_to_network.unwrap();
        assert!((p + bus2.pl).abs() < 1e-9);
        assert!((q + bus2.ql).abs() < 1e-9);
    }

    #[test]
    fn slack_voltage_and_angle_are_exact() {
        let mut sys = System::new(100.0);
        let slack = sys.add_slack(1.02, 100.0, 0.05, 0.0, 0.0, 0.0, 0.0, "slack");
        let pq = sys.add_pq(0.3, 0.05, 100.0, 0.0, 0.0, "bus2");
        sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();

        run_pf(&mut sys, 1e-12, 20).unwrap();

        let bus1 = sys.bus(slack);
        assert_eq!(bus1.v, 1.02);
        assert_eq!(bus1.theta, 0.05);
    }

    #[test]
    fn non_convergence_reported_past_static_limit() {
        let mut sys = System::new(100.0);
        let slack = sys.add_slack(1.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, "slack");
        // Massively overload a short, reactive line so no solution exists.
        let pq = sys.add_pq(50.0, 50.0, 100.0, 0.0, 0.0, "bus2");
        sys.add_line(slack, pq, 0.1, 0.01, 0.0, 0.0).unwrap();

        let report = run_pf(&mut sys, 1e-12, 20).unwrap();
        assert!(!report.converged);
        assert!(report.status.starts_with("non-convergent"));
    }
}
