use crate::core::{run_pf, LineIndex, System};
use crate::error::{PfError, PfResult};

/// Outcome of screening one line out of service.
#[derive(Debug, Clone)]
pub struct ContingencyResult {
    pub line: LineIndex,
    pub critical: bool,
    pub iterations: usize,
}

/// Runs an N-1 screen: disables each line in turn, re-solves, and records whether the system
/// lost convergence (a "critical" branch), restoring the line to service before moving on to the
/// next.
///
/// The system is left in its original (all-lines-in-service) state once screening completes,
/// re-solved so that bus voltages match the pre-screening solution to within ordinary
/// Newton-Raphson tolerance.
pub fn screen_contingencies(
    system: &mut System,
    tol: f64,
    max_iters: usize,
) -> PfResult<Vec<ContingencyResult>> {
    let mut results = Vec::with_capacity(system.lines.len());

    for idx in 0..system.lines.len() {
        system.lines[idx].in_operation = false;
        // A singular Jacobian (e.g. a line whose removal islands a bus) is the outer harness's
        // business, not a fatal error: it is just a particularly severe form of non-convergence.
        let result = match run_pf(system, tol, max_iters) {
            Ok(report) => ContingencyResult {
                line: LineIndex(idx),
                critical: !report.converged,
                iterations: report.iterations,
            },
            Err(PfError::SingularJacobian(iters)) => ContingencyResult {
                line: LineIndex(idx),
                critical: true,
                iterations: iters,
            },
            Err(e) => return Err(e),
        };
        results.push(result);
        system.lines[idx].in_operation = true;
    }

    run_pf(system, tol, max_iters)?;
    Ok(results)
}
