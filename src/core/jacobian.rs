use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Complex power injected into the network at every bus, `S(V) = diag(V) * conj(Y * V)`.
pub fn s_bus(y: &DMatrix<Complex64>, v: &DVector<Complex64>) -> DVector<Complex64> {
    v.component_mul(&(y * v).conjugate())
}

/// Analytic partials `dS/d|V|` and `dS/dtheta`, the Matpower TN2 complex sensitivity formulas:
///
/// - `dS/d|V| = diag(V) * conj(Y * diag(V/|V|)) + conj(diag(I)) * diag(V/|V|)`
/// - `dS/dtheta = j * diag(V) * conj(diag(I) - Y * diag(V))`
///
/// where `I = Y * V`.
pub fn ds_dv(y: &DMatrix<Complex64>, v: &DVector<Complex64>) -> (DMatrix<Complex64>, DMatrix<Complex64>) {
    let ibus = y * v;
    let vnorm = DVector::from_iterator(v.len(), v.iter().map(|e| *e / Complex64::new(e.norm(), 0.0)));

    let diag_v = DMatrix::from_diagonal(v);
    let diag_vnorm = DMatrix::from_diagonal(&vnorm);
    let diag_ibus = DMatrix::from_diagonal(&ibus);

    let ds_dvm = &diag_v * (y * &diag_vnorm).conjugate() + diag_ibus.conjugate() * &diag_vnorm;
    let ds_dva = (&diag_v * (&diag_ibus - y * &diag_v).conjugate()).scale(Complex64::i());

    (ds_dvm, ds_dva)
}

/// Assembles the reduced real Jacobian from the complex partials.
///
/// Buses are in solve order `[slack, pq.., pv..]`; `npq` is the number of PQ buses. Row/column 0
/// (the slack bus) is dropped from both partials; the reactive-power block keeps only the rows
/// and columns belonging to PQ buses (positions `1..=npq`).
pub fn build_jacobian(ds_dvm: &DMatrix<Complex64>, ds_dva: &DMatrix<Complex64>, npq: usize) -> DMatrix<f64> {
    let n = ds_dva.nrows();
    let n_nonslack = n - 1;
    let num_state = n_nonslack + npq;

    let mut j = DMatrix::<f64>::zeros(num_state, num_state);

    for (row_out, row_in) in (1..n).enumerate() {
        for (col_out, col_in) in (1..n).enumerate() {
            j[(row_out, col_out)] = ds_dva[(row_in, col_in)].re;
        }
        for (col_out, col_in) in (1..=npq).enumerate() {
            j[(row_out, n_nonslack + col_out)] = ds_dvm[(row_in, col_in)].re;
        }
    }
    for (row_out, row_in) in (1..=npq).enumerate() {
        for (col_out, col_in) in (1..n).enumerate() {
            j[(n_nonslack + row_out, col_out)] = ds_dva[(row_in, col_in)].im;
        }
        for (col_out, col_in) in (1..=npq).enumerate() {
            j[(n_nonslack + row_out, n_nonslack + col_out)] = ds_dvm[(row_in, col_in)].im;
        }
    }

    j
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_has_expected_shape() {
        // 1 slack + 2 pq + 1 pv => n_nonslack = 3, npq = 2, num_state = 5
        let n = 4;
        let ds_dvm = DMatrix::<Complex64>::zeros(n, n);
        let ds_dva = DMatrix::<Complex64>::zeros(n, n);
        let j = build_jacobian(&ds_dvm, &ds_dva, 2);
        assert_eq!(j.nrows(), 5);
        assert_eq!(j.ncols(), 5);
    }
}
