use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Design matrix for a polynomial fit, highest power in the first column.
    pub fn vandermonde(xs: ArrayView1<f64>, degree: usize) -> Array2<f64> {
        Array2::from_shape_fn((xs.len(), degree + 1), |(row, col)| {
            xs[row].powi((degree - col) as i32)
        })
    }

    /// Minimum-norm solution of `design · x ≈ rhs` via SVD. Returns `None`
    /// when the design matrix is rank deficient or the solve is not finite.
    pub fn least_squares(design: &Array2<f64>, rhs: &Array1<f64>) -> Option<Array1<f64>> {
        let (rows, cols) = design.dim();
        if rhs.len() != rows || rows < cols {
            return None;
        }
        let lhs = DMatrix::from_fn(rows, cols, |r, c| design[[r, c]]);
        let rhs = DVector::from_iterator(rows, rhs.iter().copied());

        let svd = lhs.svd(true, true);
        let cutoff = svd.singular_values.max() * rows as f64 * f64::EPSILON;
        if svd.rank(cutoff) < cols {
            return None;
        }
        let solution = svd.solve(&rhs, cutoff).ok()?;
        if solution.iter().all(|v| v.is_finite()) {
            Some(Array1::from_iter(solution.iter().copied()))
        } else {
            None
        }
    }
}
