use crate::common::species::SpeciesId;
use glam::f64::DVec3;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub id: u32,
    pub species: SpeciesId,
    pub position: DVec3,
    /// Radius used for overlap checks; `None` when neither the group nor the species database gave one
    pub radius: Option<f64>,
    pub label: Option<String>,
}

impl Atom {
    pub fn radius_or_zero(&self) -> f64 {
        self.radius.unwrap_or(0.0)
    }
}
