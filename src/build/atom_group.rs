use crate::common::species::{symbol_of, SpeciesDatabase, SpeciesId};
use glam::f64::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range of atom counts; `min == max` for an exact count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.min == self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.is_exact() {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// A group of atoms of one species to be generated together.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomGroupSpec {
    pub species: SpeciesId,
    pub count: CountRange,
    /// Every copy is pinned here and excluded from symmetry and separation moves
    pub position: Option<DVec3>,
    pub radius: Option<f64>,
    pub label: Option<String>,
}

impl AtomGroupSpec {
    pub fn new(species: SpeciesId, count: CountRange) -> Self {
        Self {
            species,
            count,
            position: None,
            radius: None,
            label: None,
        }
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Explicit radius, else the species database radius.
    pub fn resolved_radius(&self, species: &dyn SpeciesDatabase) -> Option<f64> {
        self.radius.or_else(|| species.radius_of(self.species))
    }

    /// Name used to look up count overrides: the label, else the element symbol.
    pub fn settings_key(&self) -> String {
        match (&self.label, symbol_of(self.species)) {
            (Some(label), _) => label.clone(),
            (None, Some(symbol)) => symbol.to_string(),
            (None, None) => self.species.to_string(),
        }
    }
}
