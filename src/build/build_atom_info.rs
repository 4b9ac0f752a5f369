use crate::common::species::SpeciesId;
use crate::symmetry::symmetry_group::OperatorMask;
use glam::f64::DVec3;

/// Bookkeeping for one placed representative and the orbit images generated from it.
#[derive(Debug, Clone)]
pub struct BuildAtomInfo {
    // Structure atom ids; the first entry is the representative
    atom_ids: Vec<u32>,
    // Operator index that produced each atom (0, the identity, for the representative)
    op_indices: Vec<usize>,
    pub species: SpeciesId,
    /// Fixed atoms are never moved by the separator
    pub fixed: bool,
    pub multiplicity: usize,
    pub op_mask: OperatorMask,
    /// Basis of the special-position subspace the representative sits on
    pub subspace: Option<Vec<DVec3>>,
    /// Pair-distance scope active when the representative was placed
    pub distance_scope: Option<usize>,
}

impl BuildAtomInfo {
    pub fn new(
        representative: u32,
        species: SpeciesId,
        fixed: bool,
        multiplicity: usize,
        op_mask: OperatorMask,
        subspace: Option<Vec<DVec3>>,
    ) -> Self {
        Self {
            atom_ids: vec![representative],
            op_indices: vec![0],
            species,
            fixed,
            multiplicity,
            op_mask,
            subspace,
            distance_scope: None,
        }
    }

    pub fn representative(&self) -> Option<u32> {
        match self.op_indices.first() {
            Some(0) => self.atom_ids.first().copied(),
            _ => None,
        }
    }

    pub fn atom_ids(&self) -> &[u32] {
        &self.atom_ids
    }

    /// Operator index for each entry of `atom_ids`.
    pub fn op_indices(&self) -> &[usize] {
        &self.op_indices
    }

    pub fn num_atoms(&self) -> usize {
        self.atom_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_ids.is_empty()
    }

    pub fn is_special(&self) -> bool {
        self.subspace.is_some()
    }

    pub fn contains(&self, atom_id: u32) -> bool {
        self.atom_ids.contains(&atom_id)
    }

    pub fn add_image(&mut self, atom_id: u32, op_index: usize) {
        self.atom_ids.push(atom_id);
        self.op_indices.push(op_index);
    }

    /// Forgets `atom_id`. Returns true if it belonged to this info.
    pub fn remove_atom(&mut self, atom_id: u32) -> bool {
        match self.atom_ids.iter().position(|&id| id == atom_id) {
            Some(index) => {
                self.atom_ids.remove(index);
                self.op_indices.remove(index);
                true
            }
            None => false,
        }
    }
}
