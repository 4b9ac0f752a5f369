// Real eigenspaces of a 3x3 matrix.
//
// Eigenvalues come from nalgebra's Schur-based complex eigenvalue solver; for each
// distinct real eigenvalue the eigenspace is the null space of (M - lambda*I), read
// off the right singular vectors whose singular values vanish. Complex conjugate
// pairs are skipped: they only describe invariant planes that no point is fixed in.

use glam::f64::{DMat3, DVec3};
use nalgebra::Matrix3;

/// Imaginary parts below this count as a real eigenvalue
pub const EIGENVALUE_EPSILON: f64 = 1e-8;
/// Singular values below this span the null space
pub const NULL_SPACE_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct Eigenspace {
    pub eigenvalue: f64,
    /// Orthonormal basis; 1, 2 or 3 vectors
    pub basis: Vec<DVec3>,
}

impl Eigenspace {
    pub fn dimension(&self) -> usize {
        self.basis.len()
    }
}

pub fn to_nalgebra(m: &DMat3) -> Matrix3<f64> {
    Matrix3::from_column_slice(&m.to_cols_array())
}

/// All real eigenspaces of `m`, one per numerically distinct real eigenvalue.
pub fn real_eigenspaces(m: &DMat3) -> Vec<Eigenspace> {
    let matrix = to_nalgebra(m);

    let mut values: Vec<f64> = Vec::new();
    for value in matrix.complex_eigenvalues().iter() {
        if value.im.abs() > EIGENVALUE_EPSILON {
            continue;
        }
        if !values.iter().any(|v| (v - value.re).abs() < EIGENVALUE_EPSILON.sqrt()) {
            values.push(value.re);
        }
    }

    values
        .into_iter()
        .filter_map(|eigenvalue| {
            let basis = null_space(&(matrix - Matrix3::identity() * eigenvalue));
            if basis.is_empty() {
                None
            } else {
                Some(Eigenspace { eigenvalue, basis })
            }
        })
        .collect()
}

/// Orthonormal basis of the null space of a 3x3 matrix.
pub fn null_space(matrix: &Matrix3<f64>) -> Vec<DVec3> {
    let svd = matrix.svd(false, true);
    let v_t = match svd.v_t {
        Some(v_t) => v_t,
        None => return Vec::new(),
    };
    let scale = svd.singular_values.max().max(1.0);
    svd.singular_values
        .iter()
        .enumerate()
        .filter(|(_, &sigma)| sigma < NULL_SPACE_EPSILON * scale)
        .map(|(i, _)| {
            let row = v_t.row(i);
            DVec3::new(row[0], row[1], row[2]).normalize()
        })
        .collect()
}

/// True if every vector of `subspace` lies in the span of the orthonormal `basis`.
pub fn spans(basis: &[DVec3], subspace: &[DVec3]) -> bool {
    subspace.iter().all(|v| {
        let projection: DVec3 = basis.iter().map(|b| b.dot(*v) * *b).sum();
        (*v - projection).length() < 1e-6 * v.length().max(1.0)
    })
}

/// Orthogonal projection of `point` onto the span of the orthonormal `basis`.
pub fn project(basis: &[DVec3], point: &DVec3) -> DVec3 {
    basis.iter().map(|b| b.dot(*point) * *b).sum()
}
