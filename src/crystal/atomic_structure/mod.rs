//! Atom storage for generated structures.
//!
//! Atoms live in a slot vector indexed by `id - 1`; removing an atom leaves an empty
//! slot so ids handed out earlier (e.g. to build bookkeeping) stay valid.

use crate::common::species::SpeciesId;
use crate::crystal::unit_cell::UnitCell;
use glam::f64::DVec3;

pub mod atom;

pub use atom::Atom;

#[derive(Debug, Clone, Default)]
pub struct Structure {
    atoms: Vec<Option<Atom>>, // Index = atom_id - 1, next ID = atoms.len() + 1
    num_atoms: usize,         // Count of non-None atoms
    unit_cell: Option<UnitCell>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn periodic(unit_cell: UnitCell) -> Self {
        Self {
            unit_cell: Some(unit_cell),
            ..Self::default()
        }
    }

    pub fn unit_cell(&self) -> Option<&UnitCell> {
        self.unit_cell.as_ref()
    }

    pub fn set_unit_cell(&mut self, unit_cell: Option<UnitCell>) {
        self.unit_cell = unit_cell;
    }

    pub fn is_periodic(&self) -> bool {
        self.unit_cell.is_some()
    }

    pub fn get_num_of_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn is_empty(&self) -> bool {
        self.num_atoms == 0
    }

    /// Adds an atom and returns its id
    pub fn add_atom(&mut self, species: SpeciesId, position: DVec3, radius: Option<f64>) -> u32 {
        let id = (self.atoms.len() + 1) as u32;
        self.atoms.push(Some(Atom {
            id,
            species,
            position,
            radius,
            label: None,
        }));
        self.num_atoms += 1;
        id
    }

    pub fn remove_atom(&mut self, atom_id: u32) -> Option<Atom> {
        let slot = self.slot_mut(atom_id)?;
        let removed = slot.take();
        if removed.is_some() {
            self.num_atoms -= 1;
        }
        removed
    }

    pub fn get_atom(&self, atom_id: u32) -> Option<&Atom> {
        if atom_id == 0 {
            return None;
        }
        self.atoms.get((atom_id - 1) as usize).and_then(|slot| slot.as_ref())
    }

    pub fn get_atom_mut(&mut self, atom_id: u32) -> Option<&mut Atom> {
        self.slot_mut(atom_id).and_then(|slot| slot.as_mut())
    }

    pub fn set_atom_position(&mut self, atom_id: u32, position: DVec3) {
        if let Some(atom) = self.get_atom_mut(atom_id) {
            atom.position = position;
        }
    }

    pub fn set_atom_label(&mut self, atom_id: u32, label: Option<String>) {
        if let Some(atom) = self.get_atom_mut(atom_id) {
            atom.label = label;
        }
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn atom_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter_atoms().map(|atom| atom.id)
    }

    pub fn positions(&self) -> Vec<DVec3> {
        self.iter_atoms().map(|atom| atom.position).collect()
    }

    pub fn count_species(&self, species: SpeciesId) -> usize {
        self.iter_atoms().filter(|atom| atom.species == species).count()
    }

    /// Distance between two positions, using the minimum image when periodic.
    pub fn distance(&self, p: &DVec3, q: &DVec3) -> f64 {
        let difference = *q - *p;
        match &self.unit_cell {
            Some(cell) => cell.minimum_image(&difference).length(),
            None => difference.length(),
        }
    }

    /// Wraps every atom back into the unit cell. No-op for clusters.
    pub fn wrap_atoms(&mut self) {
        if let Some(cell) = self.unit_cell.clone() {
            for atom in self.atoms.iter_mut().flatten() {
                atom.position = cell.wrap(&atom.position);
            }
        }
    }

    fn slot_mut(&mut self, atom_id: u32) -> Option<&mut Option<Atom>> {
        if atom_id == 0 {
            return None;
        }
        self.atoms.get_mut((atom_id - 1) as usize)
    }
}
