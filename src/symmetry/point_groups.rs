use crate::symmetry::symmetry_group::SymmetryGroup;
use crate::symmetry::symmetry_group_builder::SymmetryGroupBuilder;
use crate::symmetry::symmetry_operator::{from_linear, SymmetryOperator};
use glam::f64::{DMat3, DVec3};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents a proper rotation element of a point group
#[derive(Debug, Clone, PartialEq)]
pub struct RotationalSymmetry {
    /// Normalized axis vector in Cartesian coordinates
    pub axis: DVec3,
    /// N-fold rotation (2 = 2-fold, 3 = 3-fold, ...)
    pub n_fold: u32,
}

impl RotationalSymmetry {
    /// Creates a rotational symmetry element. Returns `None` for a zero axis or `n_fold == 0`.
    pub fn new(axis: DVec3, n_fold: u32) -> Option<Self> {
        if axis.length() < 1e-12 || n_fold == 0 {
            return None;
        }
        Some(Self {
            axis: axis.normalize(),
            n_fold,
        })
    }

    /// Returns the smallest rotation angle in radians for this symmetry element
    pub fn smallest_angle_radians(&self) -> f64 {
        2.0 * PI / (self.n_fold as f64)
    }

    /// The rotation by the smallest angle as a symmetry operator
    pub fn operator(&self) -> SymmetryOperator {
        from_linear(DMat3::from_axis_angle(self.axis, self.smallest_angle_radians()))
    }

    /// Rotation by the smallest angle followed by reflection through the plane normal to the axis
    pub fn rotoreflection(&self) -> SymmetryOperator {
        let rotation = DMat3::from_axis_angle(self.axis, self.smallest_angle_radians());
        from_linear(reflection_matrix(self.axis) * rotation)
    }
}

fn reflection_matrix(normal: DVec3) -> DMat3 {
    let n = normal.normalize();
    DMat3::IDENTITY - 2.0 * DMat3::from_cols(n * n.x, n * n.y, n * n.z)
}

/// Mirror through the plane with the given normal
pub fn reflection(normal: DVec3) -> SymmetryOperator {
    from_linear(reflection_matrix(normal))
}

pub fn inversion() -> SymmetryOperator {
    from_linear(-DMat3::IDENTITY)
}

/// Point group families in Schoenflies notation. The principal axis is z and the first
/// two-fold axis perpendicular to it (for D groups) is x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointGroup {
    C(u32),
    Ci,
    Cs,
    Cnv(u32),
    Cnh(u32),
    D(u32),
    Dnh(u32),
    Dnd(u32),
    /// Rotoreflection group S_n, n even
    S(u32),
    T,
    Td,
    Th,
    O,
    Oh,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown point group '{0}'")]
pub struct ParsePointGroupError(pub String);

impl PointGroup {
    /// Number of operators in the closed group
    pub fn order(&self) -> usize {
        match *self {
            PointGroup::C(n) => n as usize,
            PointGroup::Ci | PointGroup::Cs => 2,
            PointGroup::Cnv(n) | PointGroup::Cnh(n) | PointGroup::D(n) => 2 * n as usize,
            PointGroup::Dnh(n) | PointGroup::Dnd(n) => 4 * n as usize,
            PointGroup::S(n) => n as usize,
            PointGroup::T => 12,
            PointGroup::Td | PointGroup::Th | PointGroup::O => 24,
            PointGroup::Oh => 48,
        }
    }

    pub fn generators(&self) -> Vec<SymmetryOperator> {
        let z = DVec3::Z;
        let rotation = |axis: DVec3, n: u32| {
            RotationalSymmetry::new(axis, n.max(1))
                .map(|r| r.operator())
                .unwrap_or(SymmetryOperator::IDENTITY)
        };
        let body_diagonal = DVec3::ONE;

        match *self {
            PointGroup::C(n) => vec![rotation(z, n)],
            PointGroup::Ci => vec![inversion()],
            PointGroup::Cs => vec![reflection(z)],
            PointGroup::Cnv(n) => vec![rotation(z, n), reflection(DVec3::X)],
            PointGroup::Cnh(n) => vec![rotation(z, n), reflection(z)],
            PointGroup::D(n) => vec![rotation(z, n), rotation(DVec3::X, 2)],
            PointGroup::Dnh(n) => vec![rotation(z, n), rotation(DVec3::X, 2), reflection(z)],
            PointGroup::Dnd(n) => {
                // Dihedral mirror contains z and bisects neighbouring two-fold axes
                let half = PI / (2.0 * n.max(1) as f64);
                vec![
                    rotation(z, n),
                    rotation(DVec3::X, 2),
                    reflection(DVec3::new(-half.sin(), half.cos(), 0.0)),
                ]
            }
            PointGroup::S(n) => RotationalSymmetry::new(z, n.max(1))
                .map(|r| vec![r.rotoreflection()])
                .unwrap_or_default(),
            PointGroup::T => vec![rotation(z, 2), rotation(body_diagonal, 3)],
            PointGroup::Td => vec![
                rotation(z, 2),
                rotation(body_diagonal, 3),
                reflection(DVec3::new(1.0, -1.0, 0.0)),
            ],
            PointGroup::Th => vec![rotation(z, 2), rotation(body_diagonal, 3), inversion()],
            PointGroup::O => vec![rotation(z, 4), rotation(body_diagonal, 3)],
            PointGroup::Oh => vec![rotation(z, 4), rotation(body_diagonal, 3), inversion()],
        }
    }

    /// Closes the generators into a full group.
    pub fn build_group(&self) -> SymmetryGroup {
        SymmetryGroupBuilder::with_generators(self.generators()).build()
    }
}

impl fmt::Display for PointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointGroup::C(n) => write!(f, "C{}", n),
            PointGroup::Ci => write!(f, "Ci"),
            PointGroup::Cs => write!(f, "Cs"),
            PointGroup::Cnv(n) => write!(f, "C{}v", n),
            PointGroup::Cnh(n) => write!(f, "C{}h", n),
            PointGroup::D(n) => write!(f, "D{}", n),
            PointGroup::Dnh(n) => write!(f, "D{}h", n),
            PointGroup::Dnd(n) => write!(f, "D{}d", n),
            PointGroup::S(n) => write!(f, "S{}", n),
            PointGroup::T => write!(f, "T"),
            PointGroup::Td => write!(f, "Td"),
            PointGroup::Th => write!(f, "Th"),
            PointGroup::O => write!(f, "O"),
            PointGroup::Oh => write!(f, "Oh"),
        }
    }
}

impl FromStr for PointGroup {
    type Err = ParsePointGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let error = || ParsePointGroupError(name.to_string());

        match name {
            "Ci" => return Ok(PointGroup::Ci),
            "Cs" => return Ok(PointGroup::Cs),
            "T" => return Ok(PointGroup::T),
            "Td" => return Ok(PointGroup::Td),
            "Th" => return Ok(PointGroup::Th),
            "O" => return Ok(PointGroup::O),
            "Oh" => return Ok(PointGroup::Oh),
            _ => {}
        }

        let mut chars = name.chars();
        let family = chars.next().ok_or_else(error)?;
        let rest: String = chars.collect();
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let n: u32 = rest[..digits_end].parse().map_err(|_| error())?;
        if n == 0 {
            return Err(error());
        }
        let suffix = &rest[digits_end..];

        match (family, suffix) {
            ('C', "") => Ok(PointGroup::C(n)),
            ('C', "v") if n >= 2 => Ok(PointGroup::Cnv(n)),
            ('C', "h") => Ok(PointGroup::Cnh(n)),
            ('D', "") if n >= 2 => Ok(PointGroup::D(n)),
            ('D', "h") if n >= 2 => Ok(PointGroup::Dnh(n)),
            ('D', "d") if n >= 2 => Ok(PointGroup::Dnd(n)),
            ('S', "") if n >= 2 && n % 2 == 0 => Ok(PointGroup::S(n)),
            _ => Err(error()),
        }
    }
}
