use crate::build::atom_group::AtomGroupSpec;
use crate::build::build_atom_info::BuildAtomInfo;
use crate::build::build_context::{PairDistanceMap, StructureBuildContext};
use crate::build::multiplicity::factor_multiplicities;
use crate::build::plan::{GenerationSettings, GenerationTicket, StructureContents};
use crate::build::shape::GeneratorShape;
use crate::build::{GenerationError, Outcome};
use crate::common::species::{SpeciesDatabase, SpeciesId, SpeciesPair};
use crate::symmetry::symmetry_group::{OperatorMask, SpecialPosition};
use glam::f64::{DMat4, DVec3};
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::BTreeSet;
use std::fmt;

/// Something that contributes atoms to a structure build.
///
/// A build first asks every generator for a plan, sizes the cell and shape from the
/// planned contents, then commits each plan into the shared context.
pub trait FragmentGenerator: fmt::Debug {
    fn plan(&self, settings: Option<&GenerationSettings>, rng: &mut dyn RngCore) -> GenerationTicket;

    fn contents(&self, ticket: &GenerationTicket, species: &dyn SpeciesDatabase) -> StructureContents {
        ticket.contents(species)
    }

    /// Places the planned atoms into `context`, consuming the plan.
    fn commit(
        &self,
        ticket: GenerationTicket,
        context: &mut StructureBuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Outcome;

    fn release(&self, ticket: GenerationTicket) {
        ticket.release();
    }

    fn clone_box(&self) -> Box<dyn FragmentGenerator>;
}

/// Generates groups of atoms, optionally inside its own shape and frame.
#[derive(Debug, Default)]
pub struct AtomsGenerator {
    groups: Vec<AtomGroupSpec>,
    shape: Option<Box<dyn GeneratorShape>>,
    transform: Option<DMat4>,
    pair_distances: PairDistanceMap,
}

impl Clone for AtomsGenerator {
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
            shape: self.shape.as_ref().map(|shape| shape.clone_box()),
            transform: self.transform,
            pair_distances: self.pair_distances.clone(),
        }
    }
}

impl AtomsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: AtomGroupSpec) -> &mut Self {
        self.groups.push(group);
        self
    }

    pub fn with_group(mut self, group: AtomGroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[AtomGroupSpec] {
        &self.groups
    }

    /// Generate inside `shape` instead of the build's shape.
    pub fn set_shape(&mut self, shape: Option<Box<dyn GeneratorShape>>) {
        self.shape = shape;
    }

    /// Frame of this generator relative to the build's frame.
    pub fn set_transform(&mut self, transform: Option<DMat4>) {
        self.transform = transform;
    }

    /// Minimum distance between two species while this generator places its atoms.
    pub fn set_pair_distance(&mut self, a: SpeciesId, b: SpeciesId, distance: f64) {
        self.pair_distances.insert(SpeciesPair::new(a, b), distance);
    }

    fn place_group(
        &self,
        spec: &AtomGroupSpec,
        count: usize,
        context: &mut StructureBuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Outcome {
        if let Some(position) = spec.position {
            let position = context.current_transform().transform_point3(position);
            for _ in 0..count {
                self.record_atom(spec, position, true, 1, vec![true], None, context);
            }
            return Ok(());
        }

        let divisors: BTreeSet<usize> = match context.symmetry() {
            Some(group) => {
                let mut divisors = group.get_multiplicities();
                divisors.insert(group.order());
                divisors
            }
            None => BTreeSet::from([1]),
        };

        let multiplicities = factor_multiplicities(count, &divisors, rng);
        if multiplicities.is_empty() {
            return Err(GenerationError::ConstraintInfeasible(format!(
                "cannot split {} atoms of species {} into orbits of sizes {:?}",
                count, spec.species, divisors
            )));
        }
        debug!("Placing {} x species {} as orbits {:?}", count, spec.species, multiplicities);

        for multiplicity in multiplicities {
            self.place_point(spec, multiplicity, context, rng)?;
        }
        Ok(())
    }

    /// Places one representative whose orbit will have `multiplicity` members.
    fn place_point(
        &self,
        spec: &AtomGroupSpec,
        multiplicity: usize,
        context: &mut StructureBuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Outcome {
        let transform = context.transform();
        let shape: &dyn GeneratorShape = match &self.shape {
            Some(shape) => shape.as_ref(),
            None => context.shape(),
        };

        let (position, op_mask, subspace) = match context.symmetry() {
            None => (shape.random_point(transform.as_ref(), rng), vec![true], None),
            Some(group) if multiplicity == group.order() => {
                (shape.random_point(transform.as_ref(), rng), group.full_mask(), None)
            }
            Some(group) => {
                let mut candidates: Vec<&SpecialPosition> =
                    group.get_eigenspaces_and_masks(multiplicity).iter().collect();
                candidates.shuffle(rng);
                let found = candidates.into_iter().find_map(|candidate| {
                    let point = match candidate.subspace.as_slice() {
                        [axis] => shape.random_point_on_axis(axis, transform.as_ref(), rng),
                        [a, b] => shape.random_point_in_plane(a, b, transform.as_ref(), rng),
                        _ => None,
                    };
                    if point.is_none() {
                        trace!("special position {:?} does not meet the shape", candidate.subspace);
                    }
                    point.map(|p| (p, candidate.op_mask.clone(), Some(candidate.subspace.clone())))
                });
                found.ok_or_else(|| {
                    GenerationError::ConstraintInfeasible(format!(
                        "couldn't satisfy special-position constraint for multiplicity {}",
                        multiplicity
                    ))
                })?
            }
        };

        self.record_atom(spec, position, false, multiplicity, op_mask, subspace, context);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn record_atom(
        &self,
        spec: &AtomGroupSpec,
        position: DVec3,
        fixed: bool,
        multiplicity: usize,
        op_mask: OperatorMask,
        subspace: Option<Vec<DVec3>>,
        context: &mut StructureBuildContext<'_>,
    ) {
        let radius = spec.resolved_radius(context.species_db());
        let id = context.place_atom(spec.species, position, radius, spec.label.clone());
        context.add_atom_info(BuildAtomInfo::new(id, spec.species, fixed, multiplicity, op_mask, subspace));
    }
}

impl FragmentGenerator for AtomsGenerator {
    fn plan(&self, settings: Option<&GenerationSettings>, rng: &mut dyn RngCore) -> GenerationTicket {
        let ticket = GenerationTicket::plan(&self.groups, settings, rng);
        debug!("Planned {} atoms from {} groups", ticket.num_atoms(), self.groups.len());
        ticket
    }

    fn commit(
        &self,
        ticket: GenerationTicket,
        context: &mut StructureBuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Outcome {
        let mut context = context.push_transform(self.transform.unwrap_or(DMat4::IDENTITY));
        let mut context = context.push_pair_distances(self.pair_distances.clone());

        for (spec, count) in ticket.into_entries() {
            self.place_group(&spec, count, &mut context, rng)?;
        }

        // Settle against this generator's overrides before later generators place
        // atoms; the atoms keep the overrides among themselves for the final pass.
        if !self.pair_distances.is_empty() {
            let result = context.separate();
            if !result.converged {
                debug!(
                    "Generator overrides left overlaps after {} iterations (max overlap {:.3e})",
                    result.iterations, result.max_overlap_fraction
                );
            }
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn FragmentGenerator> {
        Box::new(self.clone())
    }
}
