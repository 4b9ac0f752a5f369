// Regions atoms are generated in.
//
// A shape is defined in its own local frame, centred on the local origin. The
// optional transform handed to every query maps local coordinates to the global
// frame the structure lives in. Symmetry axes and planes always pass through the
// global origin, so constrained sampling works on global lines and planes and maps
// candidates back into the local frame for the inside test.

use crate::crystal::unit_cell::UnitCell;
use glam::f64::{DMat3, DMat4, DVec3};
use rand::{Rng, RngCore};
use std::f64::consts::PI;
use std::fmt;

/// Candidate draws per axis- or plane-constrained sample before giving up
pub const MAX_CONSTRAINED_ATTEMPTS: usize = 1000;

pub trait GeneratorShape: fmt::Debug {
    /// Uniform random point inside the shape, in local coordinates.
    fn random_local_point(&self, rng: &mut dyn RngCore) -> DVec3;

    fn contains_local(&self, point: &DVec3) -> bool;

    /// Radius of a local-origin-centred ball enclosing the shape.
    fn bounding_radius(&self) -> f64;

    fn volume(&self) -> f64;

    fn clone_box(&self) -> Box<dyn GeneratorShape>;

    fn random_point(&self, transform: Option<&DMat4>, rng: &mut dyn RngCore) -> DVec3 {
        to_global(transform, self.random_local_point(rng))
    }

    fn contains(&self, point: &DVec3, transform: Option<&DMat4>) -> bool {
        self.contains_local(&to_local(transform, point))
    }

    /// Random point inside the shape on the global line through the origin along `axis`.
    fn random_point_on_axis(
        &self,
        axis: &DVec3,
        transform: Option<&DMat4>,
        rng: &mut dyn RngCore,
    ) -> Option<DVec3> {
        let direction = axis.try_normalize()?;
        let extent = global_bound(self.bounding_radius(), transform);
        (0..MAX_CONSTRAINED_ATTEMPTS)
            .map(|_| direction * rng.gen_range(-extent..=extent))
            .find(|point| self.contains(point, transform))
    }

    /// Random point inside the shape on the global plane through the origin spanned by
    /// `a` and `b`.
    fn random_point_in_plane(
        &self,
        a: &DVec3,
        b: &DVec3,
        transform: Option<&DMat4>,
        rng: &mut dyn RngCore,
    ) -> Option<DVec3> {
        let u = a.try_normalize()?;
        let v = (*b - b.dot(u) * u).try_normalize()?;
        let extent = global_bound(self.bounding_radius(), transform);
        (0..MAX_CONSTRAINED_ATTEMPTS)
            .map(|_| u * rng.gen_range(-extent..=extent) + v * rng.gen_range(-extent..=extent))
            .find(|point| self.contains(point, transform))
    }
}

fn to_global(transform: Option<&DMat4>, local: DVec3) -> DVec3 {
    match transform {
        Some(t) => t.transform_point3(local),
        None => local,
    }
}

fn to_local(transform: Option<&DMat4>, global: &DVec3) -> DVec3 {
    match transform {
        Some(t) => t.inverse().transform_point3(*global),
        None => *global,
    }
}

// Radius of a global-origin-centred ball that encloses the transformed shape.
fn global_bound(local_radius: f64, transform: Option<&DMat4>) -> f64 {
    match transform {
        Some(t) => {
            let linear = DMat3::from_mat4(*t);
            let frobenius = (linear.x_axis.length_squared()
                + linear.y_axis.length_squared()
                + linear.z_axis.length_squared())
            .sqrt();
            frobenius * local_radius + t.w_axis.truncate().length()
        }
        None => local_radius,
    }
}

fn random_unit_vector(rng: &mut dyn RngCore) -> DVec3 {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let phi = rng.gen_range(0.0..2.0 * PI);
    let r = (1.0 - z * z).max(0.0).sqrt();
    DVec3::new(r * phi.cos(), r * phi.sin(), z)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SphereShape {
    pub radius: f64,
}

impl SphereShape {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn with_volume(volume: f64) -> Self {
        Self {
            radius: (3.0 * volume.max(0.0) / (4.0 * PI)).cbrt(),
        }
    }
}

impl GeneratorShape for SphereShape {
    fn random_local_point(&self, rng: &mut dyn RngCore) -> DVec3 {
        let r = self.radius * rng.gen_range(0.0..=1.0f64).cbrt();
        random_unit_vector(rng) * r
    }

    fn contains_local(&self, point: &DVec3) -> bool {
        point.length_squared() <= self.radius * self.radius
    }

    fn bounding_radius(&self) -> f64 {
        self.radius
    }

    fn volume(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    fn clone_box(&self) -> Box<dyn GeneratorShape> {
        Box::new(self.clone())
    }
}

/// Axis-aligned box centred on the local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    pub half_extents: DVec3,
}

impl BoxShape {
    pub fn new(size: DVec3) -> Self {
        Self {
            half_extents: size.abs() * 0.5,
        }
    }

    pub fn cube(side: f64) -> Self {
        Self::new(DVec3::splat(side))
    }
}

impl GeneratorShape for BoxShape {
    fn random_local_point(&self, rng: &mut dyn RngCore) -> DVec3 {
        let h = self.half_extents;
        DVec3::new(
            rng.gen_range(-h.x..=h.x),
            rng.gen_range(-h.y..=h.y),
            rng.gen_range(-h.z..=h.z),
        )
    }

    fn contains_local(&self, point: &DVec3) -> bool {
        point.abs().cmple(self.half_extents).all()
    }

    fn bounding_radius(&self) -> f64 {
        self.half_extents.length()
    }

    fn volume(&self) -> f64 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }

    fn clone_box(&self) -> Box<dyn GeneratorShape> {
        Box::new(self.clone())
    }
}

/// Cylinder around the local z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderShape {
    pub radius: f64,
    pub half_height: f64,
}

impl CylinderShape {
    pub fn new(radius: f64, height: f64) -> Self {
        Self {
            radius,
            half_height: height.abs() * 0.5,
        }
    }
}

impl GeneratorShape for CylinderShape {
    fn random_local_point(&self, rng: &mut dyn RngCore) -> DVec3 {
        let r = self.radius * rng.gen_range(0.0..=1.0f64).sqrt();
        let phi = rng.gen_range(0.0..2.0 * PI);
        let z = rng.gen_range(-self.half_height..=self.half_height);
        DVec3::new(r * phi.cos(), r * phi.sin(), z)
    }

    fn contains_local(&self, point: &DVec3) -> bool {
        point.x * point.x + point.y * point.y <= self.radius * self.radius
            && point.z.abs() <= self.half_height
    }

    fn bounding_radius(&self) -> f64 {
        (self.radius * self.radius + self.half_height * self.half_height).sqrt()
    }

    fn volume(&self) -> f64 {
        PI * self.radius * self.radius * 2.0 * self.half_height
    }

    fn clone_box(&self) -> Box<dyn GeneratorShape> {
        Box::new(self.clone())
    }
}

/// The parallelepiped of a unit cell, centred on the local origin (fractional
/// coordinates in [-0.5, 0.5]).
#[derive(Debug, Clone)]
pub struct UnitCellShape {
    cell: UnitCell,
}

impl UnitCellShape {
    pub fn new(cell: UnitCell) -> Self {
        Self { cell }
    }

    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }
}

impl GeneratorShape for UnitCellShape {
    fn random_local_point(&self, rng: &mut dyn RngCore) -> DVec3 {
        let fractional = DVec3::new(
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
        );
        self.cell.fractional_to_cartesian(&fractional)
    }

    fn contains_local(&self, point: &DVec3) -> bool {
        let fractional = self.cell.cartesian_to_fractional(point);
        fractional.abs().cmple(DVec3::splat(0.5)).all()
    }

    fn bounding_radius(&self) -> f64 {
        0.5 * (0..3).map(|i| self.cell.lattice_vector(i).length()).sum::<f64>()
    }

    fn volume(&self) -> f64 {
        self.cell.volume()
    }

    fn clone_box(&self) -> Box<dyn GeneratorShape> {
        Box::new(self.clone())
    }
}
