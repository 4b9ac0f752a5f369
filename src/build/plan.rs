// Planning decides how many atoms each group gets before anything is placed.
//
// `GenerationTicket::plan` draws the counts once. The ticket is then consumed by
// exactly one commit, or dropped through `release`. It cannot be cloned, so a
// committed or released plan cannot be used again.

use crate::build::atom_group::AtomGroupSpec;
use crate::common::species::SpeciesDatabase;
use rand::Rng;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::ops::{Add, AddAssign};

/// Exact atom counts that override the groups' ranges, keyed by group label (or
/// element symbol for unlabelled groups).
#[derive(Debug, Clone, Default)]
pub struct GenerationSettings {
    pub atom_counts: HashMap<String, usize>,
}

impl GenerationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&mut self, key: impl Into<String>, count: usize) {
        self.atom_counts.insert(key.into(), count);
    }

    pub fn count_for(&self, spec: &AtomGroupSpec) -> Option<usize> {
        self.atom_counts.get(&spec.settings_key()).copied()
    }
}

/// Estimate of what a plan will add to a structure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StructureContents {
    pub num_atoms: usize,
    /// Summed sphere volume of the atoms
    pub volume: f64,
}

impl Add for StructureContents {
    type Output = StructureContents;

    fn add(mut self, rhs: StructureContents) -> StructureContents {
        self += rhs;
        self
    }
}

impl AddAssign for StructureContents {
    fn add_assign(&mut self, rhs: StructureContents) {
        self.num_atoms += rhs.num_atoms;
        self.volume += rhs.volume;
    }
}

/// The atom counts chosen for one generation run.
#[derive(Debug)]
#[must_use = "a ticket must be committed or released"]
pub struct GenerationTicket {
    entries: Vec<(AtomGroupSpec, usize)>,
}

impl GenerationTicket {
    /// Resolves a count for each group: an override from `settings`, the exact count,
    /// or a uniform draw from the range. Groups resolving to zero are left out.
    pub fn plan<R: Rng + ?Sized>(
        specs: &[AtomGroupSpec],
        settings: Option<&GenerationSettings>,
        rng: &mut R,
    ) -> Self {
        let entries = specs
            .iter()
            .filter_map(|spec| {
                let count = settings
                    .and_then(|s| s.count_for(spec))
                    .unwrap_or_else(|| spec.count.sample(rng));
                (count > 0).then(|| (spec.clone(), count))
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(AtomGroupSpec, usize)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(AtomGroupSpec, usize)> {
        self.entries
    }

    pub fn num_atoms(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn contents(&self, species: &dyn SpeciesDatabase) -> StructureContents {
        self.entries
            .iter()
            .fold(StructureContents::default(), |mut total, (spec, count)| {
                let radius = spec.resolved_radius(species).unwrap_or(0.0);
                total.num_atoms += count;
                total.volume += *count as f64 * 4.0 / 3.0 * PI * radius.powi(3);
                total
            })
    }

    /// Discards the plan without generating anything.
    pub fn release(self) {}
}
