use glam::f64::{DMat3, DVec3};
use thiserror::Error;

/// Determinants below this are treated as a degenerate (singular) cell
pub const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitCellError {
  #[error("unit cell matrix is singular (determinant {determinant:e})")]
  Singular { determinant: f64 },

  #[error("invalid unit cell parameters: {0}")]
  InvalidParameters(String),
}

/// The six scalar lattice parameters, in the order (a, b, c, alpha, beta, gamma).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatticeParam {
  A,
  B,
  C,
  Alpha,
  Beta,
  Gamma,
}

impl LatticeParam {
  pub const ALL: [LatticeParam; 6] = [
    LatticeParam::A,
    LatticeParam::B,
    LatticeParam::C,
    LatticeParam::Alpha,
    LatticeParam::Beta,
    LatticeParam::Gamma,
  ];

  pub const LENGTHS: [LatticeParam; 3] = [LatticeParam::A, LatticeParam::B, LatticeParam::C];

  pub fn index(self) -> usize {
    match self {
      LatticeParam::A => 0,
      LatticeParam::B => 1,
      LatticeParam::C => 2,
      LatticeParam::Alpha => 3,
      LatticeParam::Beta => 4,
      LatticeParam::Gamma => 5,
    }
  }

  pub fn is_length(self) -> bool {
    self.index() < 3
  }
}

/// A periodic cell: lattice vectors are the columns of `matrix`.
///
/// The inverse, the six crystallographic parameters and the volume are derived
/// from the matrix and kept consistent with it by every mutating method.
#[derive(Debug, Clone)]
pub struct UnitCell {
  matrix: DMat3,
  inverse: DMat3,
  // a, b, c in length units; alpha, beta, gamma in degrees
  params: [f64; 6],
  volume: f64,
}

impl UnitCell {
  /// Builds a cell from lengths and angles (degrees) using the usual convention:
  /// `a` along x, `b` in the xy plane, `c` completing a right-handed basis.
  pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self, UnitCellError> {
    Self::from_param_array([a, b, c, alpha, beta, gamma])
  }

  pub fn from_param_array(params: [f64; 6]) -> Result<Self, UnitCellError> {
    let [a, b, c, alpha, beta, gamma] = params;
    if !(a > 0.0 && b > 0.0 && c > 0.0) {
      return Err(UnitCellError::InvalidParameters(format!(
        "lengths must be positive, got ({}, {}, {})", a, b, c
      )));
    }
    for angle in [alpha, beta, gamma] {
      if !(angle > 0.0 && angle < 180.0) {
        return Err(UnitCellError::InvalidParameters(format!(
          "angles must lie strictly between 0 and 180 degrees, got {}", angle
        )));
      }
    }

    let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
    let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

    let basis_a = DVec3::new(a, 0.0, 0.0);
    let basis_b = DVec3::new(b * cos_gamma, b * sin_gamma, 0.0);
    let c_x = c * cos_beta;
    let c_y = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
    let c_z_squared = c * c - c_x * c_x - c_y * c_y;
    if c_z_squared <= 0.0 {
      return Err(UnitCellError::Singular { determinant: 0.0 });
    }
    let basis_c = DVec3::new(c_x, c_y, c_z_squared.sqrt());

    Self::from_matrix(DMat3::from_cols(basis_a, basis_b, basis_c))
  }

  pub fn from_matrix(matrix: DMat3) -> Result<Self, UnitCellError> {
    let determinant = matrix.determinant();
    if !determinant.is_finite() || determinant.abs() < SINGULAR_EPSILON {
      return Err(UnitCellError::Singular { determinant });
    }

    let (a, b, c) = (matrix.x_axis, matrix.y_axis, matrix.z_axis);
    let params = [
      a.length(),
      b.length(),
      c.length(),
      angle_degrees(b, c),
      angle_degrees(a, c),
      angle_degrees(a, b),
    ];

    Ok(UnitCell {
      matrix,
      inverse: matrix.inverse(),
      params,
      volume: determinant.abs(),
    })
  }

  pub fn cubic(a: f64) -> Result<Self, UnitCellError> {
    Self::from_parameters(a, a, a, 90.0, 90.0, 90.0)
  }

  pub fn matrix(&self) -> &DMat3 {
    &self.matrix
  }

  pub fn inverse(&self) -> &DMat3 {
    &self.inverse
  }

  pub fn parameters(&self) -> [f64; 6] {
    self.params
  }

  pub fn parameter(&self, param: LatticeParam) -> f64 {
    self.params[param.index()]
  }

  pub fn lengths(&self) -> [f64; 3] {
    [self.params[0], self.params[1], self.params[2]]
  }

  pub fn angles(&self) -> [f64; 3] {
    [self.params[3], self.params[4], self.params[5]]
  }

  pub fn volume(&self) -> f64 {
    self.volume
  }

  /// Returns a lattice vector by index (0 = a, 1 = b, 2 = c).
  pub fn lattice_vector(&self, index: usize) -> DVec3 {
    self.matrix.col(index)
  }

  /// Rescales the cell isotropically so that its volume becomes `volume`.
  pub fn set_volume(&mut self, volume: f64) -> Result<(), UnitCellError> {
    if !(volume > 0.0) {
      return Err(UnitCellError::InvalidParameters(format!("volume must be positive, got {}", volume)));
    }
    let scale = (volume / self.volume).cbrt();
    *self = Self::from_matrix(self.matrix * scale)?;
    Ok(())
  }

  /// Replaces the cell with one built from new lattice parameters.
  pub fn set_parameters(&mut self, params: [f64; 6]) -> Result<(), UnitCellError> {
    *self = Self::from_param_array(params)?;
    Ok(())
  }

  pub fn fractional_to_cartesian(&self, fractional: &DVec3) -> DVec3 {
    self.matrix * *fractional
  }

  pub fn cartesian_to_fractional(&self, cartesian: &DVec3) -> DVec3 {
    self.inverse * *cartesian
  }

  /// Maps a Cartesian position back into the cell, i.e. fractional coordinates in [0, 1).
  pub fn wrap(&self, cartesian: &DVec3) -> DVec3 {
    let fractional = self.cartesian_to_fractional(cartesian);
    let wrapped = fractional - fractional.floor();
    // floor can leave exactly 1.0 for tiny negative inputs
    let wrapped = DVec3::select(wrapped.cmpge(DVec3::ONE), DVec3::ZERO, wrapped);
    self.fractional_to_cartesian(&wrapped)
  }

  /// Shortest periodic image of a Cartesian difference vector.
  ///
  /// Rounds each fractional component to the nearest lattice translation. This is exact
  /// for orthogonal cells and a close approximation for moderately skewed ones.
  pub fn minimum_image(&self, difference: &DVec3) -> DVec3 {
    let fractional = self.cartesian_to_fractional(difference);
    self.fractional_to_cartesian(&(fractional - fractional.round()))
  }

  /// Compares the lattice vectors of two cells within 1e-5.
  pub fn is_approximately_equal(&self, other: &UnitCell) -> bool {
    const EPSILON: f64 = 1e-5;
    (0..3).all(|i| (self.lattice_vector(i) - other.lattice_vector(i)).length() < EPSILON)
  }
}

fn angle_degrees(u: DVec3, v: DVec3) -> f64 {
  let cos = u.dot(v) / (u.length() * v.length());
  cos.clamp(-1.0, 1.0).acos().to_degrees()
}
