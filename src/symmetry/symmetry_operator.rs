//! Symmetry operators are 4x4 affine matrices (`glam::DMat4`): the upper-left 3x3 block
//! is the rotation/reflection part, the last column holds the translation.

use glam::f64::{DMat3, DMat4, DVec3};

pub type SymmetryOperator = DMat4;

/// Tolerance for elementwise operator comparison
pub const OPERATOR_EPSILON: f64 = 1e-10;

// Entries this close to an integer are snapped to it after composition
const SNAP_EPSILON: f64 = 1e-12;

pub fn from_linear(linear: DMat3) -> SymmetryOperator {
    DMat4::from_mat3(linear)
}

pub fn from_linear_and_translation(linear: DMat3, translation: DVec3) -> SymmetryOperator {
    let mut op = DMat4::from_mat3(linear);
    op.w_axis = translation.extend(1.0);
    op
}

pub fn linear_part(op: &SymmetryOperator) -> DMat3 {
    DMat3::from_mat4(*op)
}

pub fn translation_part(op: &SymmetryOperator) -> DVec3 {
    op.w_axis.truncate()
}

pub fn has_translation(op: &SymmetryOperator) -> bool {
    translation_part(op).abs().max_element() > OPERATOR_EPSILON
}

pub fn approx_eq(a: &SymmetryOperator, b: &SymmetryOperator) -> bool {
    a.abs_diff_eq(*b, OPERATOR_EPSILON)
}

pub fn is_identity(op: &SymmetryOperator) -> bool {
    approx_eq(op, &DMat4::IDENTITY)
}

/// `a` applied after `b`, with numerical noise cleaned and the translation reduced modulo
/// one lattice vector so that screw and glide operators close into a finite set.
///
/// Translations are fractional, so they only have a meaning for periodic structures;
/// groups used on clusters must be translation-free.
pub fn compose(a: &SymmetryOperator, b: &SymmetryOperator) -> SymmetryOperator {
    let mut product = *a * *b;
    let mut translation = translation_part(&product);
    translation -= translation.floor();
    translation = DVec3::select(translation.cmpge(DVec3::splat(1.0 - OPERATOR_EPSILON)), DVec3::ZERO, translation);
    product.w_axis = translation.extend(1.0);
    snap(&product)
}

/// Applies the operator to a point whose translation is already expressed in the same frame.
pub fn apply_to_point(op: &SymmetryOperator, point: &DVec3) -> DVec3 {
    op.transform_point3(*point)
}

/// Applies the linear part directly and adds the translation after mapping it through
/// `basis` (used to convert fractional translations to Cartesian ones).
pub fn apply_with_basis(op: &SymmetryOperator, point: &DVec3, basis: Option<&DMat3>) -> DVec3 {
    let rotated = linear_part(op) * *point;
    let translation = translation_part(op);
    match basis {
        Some(basis) => rotated + *basis * translation,
        None => rotated + translation,
    }
}

/// Inverse of [`apply_with_basis`]: the point that `op` maps onto `point`.
pub fn apply_inverse_with_basis(op: &SymmetryOperator, point: &DVec3, basis: Option<&DMat3>) -> DVec3 {
    let translation = translation_part(op);
    let translation = match basis {
        Some(basis) => *basis * translation,
        None => translation,
    };
    linear_part(op).inverse() * (*point - translation)
}

fn snap(op: &SymmetryOperator) -> SymmetryOperator {
    let mut cols = op.to_cols_array();
    for value in cols.iter_mut() {
        let rounded = value.round();
        if (*value - rounded).abs() < SNAP_EPSILON {
            *value = rounded;
        }
    }
    DMat4::from_cols_array(&cols)
}
