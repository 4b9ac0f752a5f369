// Mutable state of one structure build.
//
// The context owns the structure being generated together with everything the
// generators need while placing atoms: the generation shape, the analysed symmetry
// group, the species database, a stack of transforms and a stack of species-pair
// distance overrides. Both stacks are only pushed through scope guards that pop on
// drop, so an early return from a generator cannot leave an override behind. The
// composed transform and the merged distance map are cached until the next push or
// pop.
//
// Every pair-distance push also opens a scope: the merged map at that moment is
// kept for the rest of the build and stamped on the atoms placed under it. Two atoms
// sharing a scope are always held to that scope's distances, so a generator's own
// overrides still apply when the whole structure is separated later.

use crate::build::build_atom_info::BuildAtomInfo;
use crate::build::plan::StructureContents;
use crate::build::shape::GeneratorShape;
use crate::common::species::{SpeciesDatabase, SpeciesId, SpeciesPair};
use crate::crystal::atomic_structure::{Atom, Structure};
use crate::separation::point_separator::{PointSeparator, SeparationProblem, SeparationResult};
use crate::symmetry::eigenspaces::project;
use crate::symmetry::symmetry_group::SymmetryGroup;
use crate::symmetry::symmetry_operator::{apply_inverse_with_basis, apply_with_basis};
use glam::f64::{DMat4, DVec3};
use log::{debug, trace};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

/// Minimum distances for species pairs.
pub type PairDistanceMap = HashMap<SpeciesPair, f64>;

/// Rounds of separating the expanded structure and rebuilding its orbits
pub const MAX_ORBIT_ROUNDS: usize = 100;

pub struct StructureBuildContext<'a> {
    structure: Structure,
    intended_contents: StructureContents,
    shape: Box<dyn GeneratorShape>,
    symmetry: Option<SymmetryGroup>,
    species: &'a dyn SpeciesDatabase,
    separator: PointSeparator,
    transforms: Vec<DMat4>,
    transform_cache: OnceCell<DMat4>,
    pair_distances: Vec<PairDistanceMap>,
    pair_distance_cache: OnceCell<PairDistanceMap>,
    distance_scopes: Vec<PairDistanceMap>,
    active_scopes: Vec<usize>,
    atom_infos: Vec<BuildAtomInfo>,
    orbits_expanded: bool,
}

impl<'a> StructureBuildContext<'a> {
    /// The symmetry group, if any, is analysed here so placement can query its
    /// special positions.
    pub fn new(
        structure: Structure,
        shape: Box<dyn GeneratorShape>,
        symmetry: Option<SymmetryGroup>,
        species: &'a dyn SpeciesDatabase,
    ) -> Self {
        let symmetry = symmetry.map(|mut group| {
            group.generate_eigenvectors();
            group
        });
        Self {
            structure,
            intended_contents: StructureContents::default(),
            shape,
            symmetry,
            species,
            separator: PointSeparator::default(),
            transforms: Vec::new(),
            transform_cache: OnceCell::new(),
            pair_distances: Vec::new(),
            pair_distance_cache: OnceCell::new(),
            distance_scopes: Vec::new(),
            active_scopes: Vec::new(),
            atom_infos: Vec::new(),
            orbits_expanded: false,
        }
    }

    pub fn with_separator(mut self, separator: PointSeparator) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_intended_contents(mut self, contents: StructureContents) -> Self {
        self.intended_contents = contents;
        self
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut Structure {
        &mut self.structure
    }

    pub fn intended_contents(&self) -> &StructureContents {
        &self.intended_contents
    }

    pub fn shape(&self) -> &dyn GeneratorShape {
        self.shape.as_ref()
    }

    pub fn symmetry(&self) -> Option<&SymmetryGroup> {
        self.symmetry.as_ref()
    }

    pub fn species_db(&self) -> &'a dyn SpeciesDatabase {
        self.species
    }

    pub fn separator(&self) -> &PointSeparator {
        &self.separator
    }

    pub fn atom_infos(&self) -> &[BuildAtomInfo] {
        &self.atom_infos
    }

    /// Product of all pushed transforms, outermost first. Identity when none is pushed.
    pub fn current_transform(&self) -> DMat4 {
        *self
            .transform_cache
            .get_or_init(|| self.transforms.iter().fold(DMat4::IDENTITY, |acc, t| acc * *t))
    }

    /// The composed transform, or `None` when the stack is empty.
    pub fn transform(&self) -> Option<DMat4> {
        if self.transforms.is_empty() {
            None
        } else {
            Some(self.current_transform())
        }
    }

    /// Pushes `transform` for the lifetime of the returned guard.
    pub fn push_transform(&mut self, transform: DMat4) -> TransformScope<'_, 'a> {
        self.transforms.push(transform);
        self.transform_cache.take();
        TransformScope { context: self }
    }

    /// Merged species-pair distances; later pushes override earlier ones.
    pub fn pair_distances(&self) -> &PairDistanceMap {
        self.pair_distance_cache.get_or_init(|| {
            let mut merged = PairDistanceMap::new();
            for layer in &self.pair_distances {
                merged.extend(layer.iter().map(|(pair, distance)| (*pair, *distance)));
            }
            merged
        })
    }

    /// Pushes pair-distance overrides for the lifetime of the returned guard. Atoms
    /// recorded while the guard lives keep these distances among themselves.
    pub fn push_pair_distances(&mut self, distances: PairDistanceMap) -> PairDistanceScope<'_, 'a> {
        self.pair_distances.push(distances);
        self.pair_distance_cache.take();
        let merged = self.pair_distances().clone();
        self.active_scopes.push(self.distance_scopes.len());
        self.distance_scopes.push(merged);
        PairDistanceScope { context: self }
    }

    /// Required distance between two species: an override, else the database pair
    /// distance, else the sum of the radii.
    pub fn min_separation(&self, a: SpeciesId, radius_a: f64, b: SpeciesId, radius_b: f64) -> f64 {
        self.min_separation_in(self.pair_distances(), a, radius_a, b, radius_b)
    }

    fn min_separation_in(
        &self,
        overrides: &PairDistanceMap,
        a: SpeciesId,
        radius_a: f64,
        b: SpeciesId,
        radius_b: f64,
    ) -> f64 {
        if let Some(&distance) = overrides.get(&SpeciesPair::new(a, b)) {
            return distance;
        }
        self.species
            .pair_min_distance(a, b)
            .unwrap_or(radius_a + radius_b)
    }

    // Overrides for a pair of atoms: their shared placement scope, else the current stack
    fn overrides_for(&self, scope_a: Option<usize>, scope_b: Option<usize>) -> &PairDistanceMap {
        match (scope_a, scope_b) {
            (Some(a), Some(b)) if a == b => self
                .distance_scopes
                .get(a)
                .unwrap_or_else(|| self.pair_distances()),
            _ => self.pair_distances(),
        }
    }

    pub fn place_atom(
        &mut self,
        species: SpeciesId,
        position: DVec3,
        radius: Option<f64>,
        label: Option<String>,
    ) -> u32 {
        let id = self.structure.add_atom(species, position, radius);
        self.structure.set_atom_label(id, label);
        id
    }

    /// Records `info`, stamping it with the innermost pair-distance scope.
    pub fn add_atom_info(&mut self, mut info: BuildAtomInfo) {
        info.distance_scope = self.active_scopes.last().copied();
        self.atom_infos.push(info);
    }

    /// Removes an atom from the structure and from its build info. An info left with
    /// no atoms is dropped.
    pub fn remove_atom(&mut self, atom_id: u32) -> Option<Atom> {
        let atom = self.structure.remove_atom(atom_id)?;
        if let Some(index) = self.atom_infos.iter().position(|info| info.contains(atom_id)) {
            self.atom_infos[index].remove_atom(atom_id);
            if self.atom_infos[index].is_empty() {
                self.atom_infos.remove(index);
            }
        }
        Some(atom)
    }

    /// Runs the point separator over every atom of the structure.
    ///
    /// Atoms of fixed infos stay put. Representatives on special positions are moved
    /// back onto their subspace afterwards, so orbit expansion keeps their reduced
    /// multiplicity. That projection can bring back an overlap the returned result
    /// does not see; [`separate_orbits`](Self::separate_orbits) checks the final
    /// structure.
    pub fn separate(&mut self) -> SeparationResult {
        let (atoms, fixed, mut problem) = self.separation_problem();

        let result = self.separator.separate(&mut problem);

        let previous: HashMap<u32, DVec3> = atoms.iter().map(|atom| (atom.id, atom.position)).collect();
        for (atom, position) in atoms.iter().zip(problem.points) {
            if !fixed.contains(&atom.id) {
                self.structure.set_atom_position(atom.id, position);
            }
        }
        self.project_special_positions(&previous);
        result
    }

    /// Separates the expanded structure while keeping every orbit symmetric.
    ///
    /// Each round separates all atoms, then rebuilds every orbit from the average of
    /// its members mapped back onto the representative. Rounds stop once the whole
    /// structure is within tolerance. The returned overlap is measured on the final
    /// structure, so a symmetric arrangement that cannot be separated is reported as
    /// unconverged.
    pub fn separate_orbits(&mut self) -> SeparationResult {
        let tolerance = self.separator.config.tolerance;
        let mut iterations = 0;
        let mut max_overlap_fraction = self.max_overlap_fraction();

        for round in 1..=MAX_ORBIT_ROUNDS {
            if max_overlap_fraction <= tolerance {
                break;
            }
            iterations += self.separate().iterations;
            self.symmetrize_orbits();
            max_overlap_fraction = self.max_overlap_fraction();
            trace!("orbit round {}: max overlap {:.3e}", round, max_overlap_fraction);
        }

        let converged = max_overlap_fraction <= tolerance;
        debug!(
            "Separated {} atoms with symmetric orbits (converged: {}, max overlap {:.3e})",
            self.structure.get_num_of_atoms(),
            converged,
            max_overlap_fraction
        );
        SeparationResult {
            converged,
            iterations,
            max_overlap_fraction,
        }
    }

    /// Worst overlap fraction over every pair of atoms currently in the structure.
    pub fn max_overlap_fraction(&self) -> f64 {
        self.separation_problem().2.max_overlap_fraction()
    }

    // Every atom with its required pair distances and the ids of fixed atoms
    fn separation_problem(&self) -> (Vec<Atom>, HashSet<u32>, SeparationProblem) {
        let atoms: Vec<Atom> = self.structure.iter_atoms().cloned().collect();
        let fixed: HashSet<u32> = self
            .atom_infos
            .iter()
            .filter(|info| info.fixed)
            .flat_map(|info| info.atom_ids().iter().copied())
            .collect();
        let scopes: HashMap<u32, Option<usize>> = self
            .atom_infos
            .iter()
            .flat_map(|info| info.atom_ids().iter().map(move |&id| (id, info.distance_scope)))
            .collect();
        let scope_of = |id: u32| scopes.get(&id).copied().flatten();

        let mut problem = SeparationProblem::new(
            atoms.iter().map(|atom| atom.position).collect(),
            self.structure.unit_cell().cloned(),
        );
        for (i, a) in atoms.iter().enumerate() {
            problem.set_fixed(i, fixed.contains(&a.id));
            for (j, b) in atoms.iter().enumerate().skip(i + 1) {
                let overrides = self.overrides_for(scope_of(a.id), scope_of(b.id));
                let distance =
                    self.min_separation_in(overrides, a.species, a.radius_or_zero(), b.species, b.radius_or_zero());
                problem.set_min_separation(i, j, distance);
            }
        }
        (atoms, fixed, problem)
    }

    // Moves each representative to the mean of its orbit members mapped back through
    // their operators, then regenerates the members from it.
    fn symmetrize_orbits(&mut self) {
        let StructureBuildContext {
            structure,
            symmetry,
            atom_infos,
            ..
        } = self;
        let Some(group) = symmetry.as_ref() else {
            return;
        };
        let cell = structure.unit_cell().cloned();
        let basis = cell.as_ref().map(|cell| *cell.matrix());

        for info in atom_infos.iter().filter(|info| !info.fixed) {
            let Some(anchor) = info
                .representative()
                .and_then(|id| structure.get_atom(id))
                .map(|atom| atom.position)
            else {
                continue;
            };

            let mut sum = DVec3::ZERO;
            let mut members = 0;
            for (&id, &op_index) in info.atom_ids().iter().zip(info.op_indices()) {
                let (Some(atom), Some(op)) = (structure.get_atom(id), group.op(op_index)) else {
                    continue;
                };
                let offset = apply_inverse_with_basis(op, &atom.position, basis.as_ref()) - anchor;
                sum += anchor + cell.as_ref().map_or(offset, |cell| cell.minimum_image(&offset));
                members += 1;
            }
            if members == 0 {
                continue;
            }

            let mut position = sum / members as f64;
            if let Some(subspace) = &info.subspace {
                position = project(subspace, &position);
            }
            for (&id, &op_index) in info.atom_ids().iter().zip(info.op_indices()) {
                if let Some(op) = group.op(op_index) {
                    structure.set_atom_position(id, apply_with_basis(op, &position, basis.as_ref()));
                }
            }
        }
    }

    fn project_special_positions(&mut self, previous: &HashMap<u32, DVec3>) {
        for info in &self.atom_infos {
            let (Some(subspace), Some(id)) = (&info.subspace, info.representative()) else {
                continue;
            };
            let (Some(&before), Some(atom)) = (previous.get(&id), self.structure.get_atom(id)) else {
                continue;
            };
            // Undo any wrap into the cell before projecting the displacement
            let moved = self.structure.unit_cell().map_or(atom.position - before, |cell| {
                cell.minimum_image(&(atom.position - before))
            });
            let projected = project(subspace, &(before + moved));
            self.structure.set_atom_position(id, projected);
        }
    }

    /// Adds the symmetry images of every representative, one per operator flagged in
    /// its mask. Operator translations are fractional when the structure is periodic.
    /// Returns the number of atoms added; only the first call has an effect.
    pub fn expand_orbits(&mut self) -> usize {
        if self.orbits_expanded {
            return 0;
        }
        self.orbits_expanded = true;

        let StructureBuildContext {
            structure,
            symmetry,
            atom_infos,
            ..
        } = self;
        let group = match symmetry {
            Some(group) => group,
            None => return 0,
        };
        let basis = structure.unit_cell().map(|cell| *cell.matrix());

        let mut added = 0;
        for info in atom_infos.iter_mut() {
            let Some(representative) = info.representative().and_then(|id| structure.get_atom(id).cloned())
            else {
                continue;
            };
            for (index, op) in group.ops().iter().enumerate().skip(1) {
                if !info.op_mask.get(index).copied().unwrap_or(false) {
                    continue;
                }
                let position = apply_with_basis(op, &representative.position, basis.as_ref());
                let id = structure.add_atom(representative.species, position, representative.radius);
                structure.set_atom_label(id, representative.label.clone());
                info.add_image(id, index);
                added += 1;
            }
        }
        debug!("Orbit expansion added {} atoms", added);
        added
    }

    pub fn into_parts(self) -> (Structure, Option<SymmetryGroup>, Vec<BuildAtomInfo>) {
        (self.structure, self.symmetry, self.atom_infos)
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
        self.transform_cache.take();
    }

    fn pop_pair_distances(&mut self) {
        self.pair_distances.pop();
        self.active_scopes.pop();
        self.pair_distance_cache.take();
    }
}

/// Keeps a transform pushed on a [`StructureBuildContext`] until dropped.
pub struct TransformScope<'c, 'a> {
    context: &'c mut StructureBuildContext<'a>,
}

impl<'a> Deref for TransformScope<'_, 'a> {
    type Target = StructureBuildContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for TransformScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for TransformScope<'_, '_> {
    fn drop(&mut self) {
        self.context.pop_transform();
    }
}

/// Keeps pair-distance overrides pushed on a [`StructureBuildContext`] until dropped.
pub struct PairDistanceScope<'c, 'a> {
    context: &'c mut StructureBuildContext<'a>,
}

impl<'a> Deref for PairDistanceScope<'_, 'a> {
    type Target = StructureBuildContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for PairDistanceScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for PairDistanceScope<'_, '_> {
    fn drop(&mut self) {
        self.context.pop_pair_distances();
    }
}
