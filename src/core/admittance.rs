use nalgebra::DMatrix;
use num_complex::Complex64;

use super::system::System;

/// Builds the dense nodal admittance matrix Y in solve order.
///
/// `order[k]` is the storage index of the bus occupying solve position `k` (see
/// [`System::order`]). Contributions are added in the order the spec fixes -- bus shunts, then
/// lines, then transformers -- so that the result is deterministic up to floating-point addition
/// commutativity.
pub fn build_y(system: &System, order: &[usize]) -> DMatrix<Complex64> {
    let n = order.len();
    let mut pos = vec![0usize; system.buses.len()];
    for (p, &storage_idx) in order.iter().enumerate() {
        pos[storage_idx] = p;
    }

    let mut y = DMatrix::<Complex64>::zeros(n, n);

    for &storage_idx in order {
        let p = pos[storage_idx];
        let bus = &system.buses[storage_idx];
        y[(p, p)] += Complex64::new(bus.g, bus.b);
    }

    for line in &system.lines {
        if !line.in_operation {
            continue;
        }
        let i = pos[line.from_bus.get()];
        let j = pos[line.to_bus.get()];
        let y_series = line.series_y();
        y[(i, i)] += y_series + line.from_y;
        y[(j, j)] += y_series + line.to_y;
        y[(i, j)] -= y_series;
        y[(j, i)] -= y_series;
    }

    for trafo in &system.transformers {
        let i = pos[trafo.from_bus.get()];
        let j = pos[trafo.to_bus.get()];
        let pi = trafo.pi_model();
        y[(i, i)] += pi.y_series + pi.from_y;
        y[(j, j)] += pi.y_series + pi.to_y;
        y[(i, j)] -= pi.y_series;
        y[(j, i)] -= pi.y_series;
    }

    y
}
