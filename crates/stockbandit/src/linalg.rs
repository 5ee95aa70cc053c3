//! Dense linear-algebra helpers for the small matrices the policies carry.
//!
//! Matrices are row-major `Vec<Vec<f64>>`; dimensions are a handful of
//! context features or a handful of stocks, so nothing here tries to be
//! clever about memory layout.

pub type Matrix = Vec<Vec<f64>>;

/// Pivot magnitude below which a matrix is treated as singular.
const SINGULAR_EPS: f64 = 1e-10;

pub fn identity(n: usize) -> Matrix {
    let mut m = vec![vec![0.0; n]; n];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn mat_vec(m: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, x)).collect()
}

/// `xᵀ M x`.
pub fn quadratic_form(x: &[f64], m: &[Vec<f64>]) -> f64 {
    dot(x, &mat_vec(m, x))
}

/// `M += x xᵀ`.
pub fn add_outer(m: &mut [Vec<f64>], x: &[f64]) {
    for (i, row) in m.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell += x[i] * x[j];
        }
    }
}

/// `v += scale · x`.
pub fn add_scaled(v: &mut [f64], scale: f64, x: &[f64]) {
    for (vi, xi) in v.iter_mut().zip(x) {
        *vi += scale * xi;
    }
}

/// Invert a square matrix.
///
/// 2×2 uses the closed form; everything else goes through Gauss-Jordan
/// elimination with partial pivoting. A singular (or near-singular) input
/// yields `None`; see [`inverse_or_self`] for the fallback the bandits use.
pub fn invert(m: &[Vec<f64>]) -> Option<Matrix> {
    match m.len() {
        0 => Some(Vec::new()),
        2 => invert_2x2(m),
        _ => invert_gauss_jordan(m),
    }
}

/// Inverse of `m`, or `m` itself when it is singular.
pub fn inverse_or_self(m: &[Vec<f64>]) -> Matrix {
    match invert(m) {
        Some(inv) => inv,
        None => {
            tracing::warn!(dim = m.len(), "singular matrix, using it uninverted");
            m.to_vec()
        }
    }
}

fn invert_2x2(m: &[Vec<f64>]) -> Option<Matrix> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < SINGULAR_EPS {
        return None;
    }
    Some(vec![
        vec![m[1][1] / det, -m[0][1] / det],
        vec![-m[1][0] / det, m[0][0] / det],
    ])
}

fn invert_gauss_jordan(m: &[Vec<f64>]) -> Option<Matrix> {
    let n = m.len();

    // Augmented [A | I]
    let mut aug = vec![vec![0.0; 2 * n]; n];
    for (i, row) in aug.iter_mut().enumerate() {
        row[..n].copy_from_slice(&m[i][..n]);
        row[n + i] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| {
                aug[a][col]
                    .abs()
                    .partial_cmp(&aug[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if aug[pivot_row][col].abs() < SINGULAR_EPS {
            return None;
        }
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        for cell in aug[col].iter_mut() {
            *cell /= pivot;
        }

        let pivot_vals = aug[col].clone();
        for (row_idx, row) in aug.iter_mut().enumerate() {
            if row_idx == col {
                continue;
            }
            let factor = row[col];
            if factor == 0.0 {
                continue;
            }
            for (cell, p) in row.iter_mut().zip(&pivot_vals) {
                *cell -= factor * p;
            }
        }
    }

    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}
