use crate::core::{run_pf, BusIndex, System};
use crate::error::{PfError, PfResult};

/// One point on a loadability (nose) curve: the load multiplier and the voltage magnitude at
/// each monitored bus, in the order the buses were given to [`loadability_curve`].
///
/// Named after the `CpfPoint` convention used elsewhere in this codebase's lineage for
/// continuation-power-flow curve points.
#[derive(Debug, Clone)]
pub struct LoadabilityPoint {
    pub lambda: f64,
    pub voltages: Vec<f64>,
}

/// Summary of a loadability study: whether the curve reached a nose point (non-convergence) or
/// was cut off some other way, the highest λ solved, and the full curve.
#[derive(Debug, Clone)]
pub struct LoadabilityResult {
    pub converged: bool,
    pub max_lambda: f64,
    pub curve: Vec<LoadabilityPoint>,
}

/// Scales the active and reactive load of `buses` by an increasing multiplier λ, re-solving
/// after each step, until the solver fails to converge (the network's static voltage-stability
/// limit).
///
/// `buses` must be non-empty. The system is left with `PL`/`QL` at whatever scaling was last
/// applied before non-convergence -- callers that need the original case afterwards should clone
/// the system first.
pub fn loadability_curve(
    system: &mut System,
    buses: &[BusIndex],
    step: f64,
    tol: f64,
    max_iters: usize,
) -> PfResult<LoadabilityResult> {
    let mut lambda = 1.0;
    let mut curve = Vec::new();

    loop {
        // A singular Jacobian at the voltage-collapse boundary is itself the nose point, not a
        // fatal error -- treat it the same as an ordinary non-convergent solve.
        let converged = match run_pf(system, tol, max_iters) {
            Ok(report) => report.converged,
            Err(PfError::SingularJacobian(_)) => false,
            Err(e) => return Err(e),
        };
        if !converged {
            return Ok(LoadabilityResult {
                converged: false,
                max_lambda: lambda,
                curve,
            });
        }

        let voltages = buses.iter().map(|&b| system.bus(b).v).collect();
        curve.push(LoadabilityPoint { lambda, voltages });

        for &b in buses {
            let bus = system.bus_mut(b);
            bus.pl /= lambda;
            bus.ql /= lambda;
        }
        lambda += step;
        for &b in buses {
            let bus = system.bus_mut(b);
            bus.pl *= lambda;
            bus.ql *= lambda;
        }
    }
}
