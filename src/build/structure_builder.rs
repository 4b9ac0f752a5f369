// Top-level structure generation.
//
// A build runs in fixed stages:
// 1. every generator plans its atom counts;
// 2. the planned contents size the unit cell (periodic builds) or the cluster shape;
// 3. a symmetry group is fixed or chosen so every planned count can be split into
//    achievable orbit sizes;
// 4. generators commit their plans, placing one representative per orbit;
// 5. the separator removes overlaps between representatives;
// 6. orbits are expanded and separated again as whole orbits, so images that land
//    on each other or on another orbit are pushed apart symmetrically;
// 7. periodic structures are wrapped into the cell.
//
// Any failure aborts the attempt. The builder itself is never mutated by a build,
// so callers retry by calling `build` again with the same builder.

use crate::build::atoms_generator::FragmentGenerator;
use crate::build::build_atom_info::BuildAtomInfo;
use crate::build::build_context::{PairDistanceMap, StructureBuildContext};
use crate::build::multiplicity::factor_multiplicities;
use crate::build::plan::{GenerationSettings, GenerationTicket, StructureContents};
use crate::build::shape::{GeneratorShape, SphereShape, UnitCellShape};
use crate::build::{GenerationError, Outcome};
use crate::common::species::{SpeciesDatabase, SpeciesId, SpeciesPair};
use crate::crystal::atomic_structure::Structure;
use crate::crystal::lattice_sampler::{
    LatticeConstraints, LatticeSampler, DEFAULT_CLUSTER_CONTENTS_MULTIPLIER,
};
use crate::separation::point_separator::{PointSeparator, SeparationConfig, SeparationResult};
use crate::symmetry::point_groups::PointGroup;
use crate::symmetry::symmetry_group::SymmetryGroup;
use crate::symmetry::symmetry_operator::has_translation;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Where the symmetry of a build comes from.
#[derive(Debug, Clone, Default)]
pub enum SymmetrySource {
    #[default]
    None,
    Fixed(SymmetryGroup),
    /// Pick one of these at random among those that can produce the planned counts
    Choose(Vec<PointGroup>),
}

/// A finished build.
#[derive(Debug, Clone)]
pub struct GeneratedStructure {
    pub structure: Structure,
    pub symmetry: Option<SymmetryGroup>,
    pub atom_infos: Vec<BuildAtomInfo>,
    pub separation: SeparationResult,
}

impl GeneratedStructure {
    pub fn num_atoms(&self) -> usize {
        self.structure.get_num_of_atoms()
    }

    /// The build info whose orbit contains `atom_id`.
    pub fn info_of(&self, atom_id: u32) -> Option<&BuildAtomInfo> {
        self.atom_infos.iter().find(|info| info.contains(atom_id))
    }
}

#[derive(Debug)]
pub struct StructureBuilder {
    generators: Vec<Box<dyn FragmentGenerator>>,
    lattice: Option<LatticeSampler>,
    shape: Option<Box<dyn GeneratorShape>>,
    symmetry: SymmetrySource,
    separation: SeparationConfig,
    pair_distances: PairDistanceMap,
    cluster_volume_multiplier: f64,
    settings: Option<GenerationSettings>,
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self {
            generators: Vec::new(),
            lattice: None,
            shape: None,
            symmetry: SymmetrySource::None,
            separation: SeparationConfig::default(),
            pair_distances: PairDistanceMap::new(),
            cluster_volume_multiplier: DEFAULT_CLUSTER_CONTENTS_MULTIPLIER,
            settings: None,
        }
    }
}

impl Clone for StructureBuilder {
    fn clone(&self) -> Self {
        Self {
            generators: self.generators.iter().map(|g| g.clone_box()).collect(),
            lattice: self.lattice.clone(),
            shape: self.shape.as_ref().map(|shape| shape.clone_box()),
            symmetry: self.symmetry.clone(),
            separation: self.separation.clone(),
            pair_distances: self.pair_distances.clone(),
            cluster_volume_multiplier: self.cluster_volume_multiplier,
            settings: self.settings.clone(),
        }
    }
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_generator(&mut self, generator: Box<dyn FragmentGenerator>) -> &mut Self {
        self.generators.push(generator);
        self
    }

    pub fn with_generator(mut self, generator: impl FragmentGenerator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn generators(&self) -> &[Box<dyn FragmentGenerator>] {
        &self.generators
    }

    /// Lattice constraints make the build periodic; `None` builds a cluster.
    pub fn set_lattice(&mut self, constraints: Option<LatticeConstraints>) {
        self.lattice = constraints.map(LatticeSampler::new);
    }

    pub fn lattice(&self) -> Option<&LatticeConstraints> {
        self.lattice.as_ref().map(|sampler| sampler.constraints())
    }

    pub fn is_periodic(&self) -> bool {
        self.lattice.is_some()
    }

    /// Shape to generate in. Defaults to the unit cell for periodic builds and to a
    /// sphere sized from the planned contents for clusters.
    pub fn set_shape(&mut self, shape: Option<Box<dyn GeneratorShape>>) {
        self.shape = shape;
    }

    pub fn set_symmetry(&mut self, symmetry: SymmetrySource) {
        self.symmetry = symmetry;
    }

    pub fn symmetry(&self) -> &SymmetrySource {
        &self.symmetry
    }

    pub fn set_separation_config(&mut self, config: SeparationConfig) {
        self.separation = config;
    }

    pub fn separation_config(&self) -> &SeparationConfig {
        &self.separation
    }

    pub fn set_pair_distance(&mut self, a: SpeciesId, b: SpeciesId, distance: f64) {
        self.pair_distances.insert(SpeciesPair::new(a, b), distance);
    }

    /// Cluster sphere volume as a multiple of the planned atoms' volume.
    pub fn set_cluster_volume_multiplier(&mut self, multiplier: f64) {
        self.cluster_volume_multiplier = multiplier;
    }

    /// Exact counts overriding the generators' ranges.
    pub fn set_settings(&mut self, settings: Option<GenerationSettings>) {
        self.settings = settings;
    }

    /// Generates one structure.
    ///
    /// A structure that still has overlaps after separation is returned inside
    /// [`GenerationError::SeparationUnresolved`]. Overlaps are measured on the
    /// expanded structure, symmetry images included.
    pub fn build(&self, species: &dyn SpeciesDatabase, rng: &mut dyn RngCore) -> Outcome<GeneratedStructure> {
        let tickets: Vec<GenerationTicket> = self
            .generators
            .iter()
            .map(|generator| generator.plan(self.settings.as_ref(), rng))
            .collect();
        let contents = self
            .generators
            .iter()
            .zip(&tickets)
            .fold(StructureContents::default(), |total, (generator, ticket)| {
                total + generator.contents(ticket, species)
            });
        debug!(
            "Planned {} atoms with volume {:.3}",
            contents.num_atoms, contents.volume
        );

        let prepared = self
            .create_frame(&contents, rng)
            .and_then(|frame| self.choose_symmetry(&tickets, rng).map(|symmetry| (frame, symmetry)));
        let ((structure, shape), symmetry) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.release_all(tickets);
                return Err(err);
            }
        };

        let mut context = StructureBuildContext::new(structure, shape, symmetry, species)
            .with_separator(PointSeparator::new(self.separation.clone()))
            .with_intended_contents(contents);

        let representatives = {
            let mut context = context.push_pair_distances(self.pair_distances.clone());
            for (generator, ticket) in self.generators.iter().zip(tickets) {
                generator.commit(ticket, &mut context, rng)?;
            }
            context.separate()
        };
        debug!(
            "Representatives separated in {} iterations (converged: {})",
            representatives.iterations, representatives.converged
        );

        let images = context.expand_orbits();
        let mut separation = {
            let mut context = context.push_pair_distances(self.pair_distances.clone());
            context.separate_orbits()
        };
        separation.iterations += representatives.iterations;
        context.structure_mut().wrap_atoms();
        let (structure, symmetry, atom_infos) = context.into_parts();

        info!(
            "Generated {} atoms ({} symmetry images, group order {}), separation converged: {}",
            structure.get_num_of_atoms(),
            images,
            symmetry.as_ref().map_or(1, |group| group.order()),
            separation.converged
        );

        let generated = GeneratedStructure {
            structure,
            symmetry,
            atom_infos,
            separation: separation.clone(),
        };
        if !separation.converged {
            return Err(GenerationError::SeparationUnresolved {
                iterations: separation.iterations,
                max_overlap_fraction: separation.max_overlap_fraction,
                structure: Box::new(generated),
            });
        }
        Ok(generated)
    }

    /// Empty structure (with a sampled cell when periodic) and the shape to generate in.
    fn create_frame(
        &self,
        contents: &StructureContents,
        rng: &mut dyn RngCore,
    ) -> Outcome<(Structure, Box<dyn GeneratorShape>)> {
        match &self.lattice {
            Some(sampler) => {
                let cell = sampler.sample(Some(contents.volume), false, rng)?;
                let shape: Box<dyn GeneratorShape> = match &self.shape {
                    Some(shape) => shape.clone_box(),
                    None => Box::new(UnitCellShape::new(cell.clone())),
                };
                Ok((Structure::periodic(cell), shape))
            }
            None => {
                let shape: Box<dyn GeneratorShape> = match &self.shape {
                    Some(shape) => shape.clone_box(),
                    None => {
                        // Without radii, count each atom as a unit volume
                        let volume = if contents.volume > 0.0 {
                            contents.volume
                        } else {
                            contents.num_atoms.max(1) as f64
                        };
                        Box::new(SphereShape::with_volume(self.cluster_volume_multiplier * volume))
                    }
                };
                Ok((Structure::new(), shape))
            }
        }
    }

    fn choose_symmetry(&self, tickets: &[GenerationTicket], rng: &mut dyn RngCore) -> Outcome<Option<SymmetryGroup>> {
        let candidates = match &self.symmetry {
            SymmetrySource::None => return Ok(None),
            SymmetrySource::Fixed(group) => {
                if self.lattice.is_none() && group.ops().iter().any(has_translation) {
                    return Err(GenerationError::ConstraintInfeasible(
                        "symmetry operators with translations need a lattice".to_string(),
                    ));
                }
                return Ok(Some(group.clone()));
            }
            SymmetrySource::Choose(candidates) => candidates,
        };

        // Pinned atoms are placed without symmetry and need no orbit split
        let counts: Vec<usize> = tickets
            .iter()
            .flat_map(|ticket| ticket.entries().iter())
            .filter(|(spec, _)| spec.position.is_none())
            .map(|(_, count)| *count)
            .collect();

        let mut order: Vec<&PointGroup> = candidates.iter().collect();
        order.shuffle(rng);
        for point_group in order {
            let mut group = point_group.build_group();
            group.generate_eigenvectors();
            let mut divisors = group.get_multiplicities();
            divisors.insert(group.order());

            if counts
                .iter()
                .all(|&count| !factor_multiplicities(count, &divisors, rng).is_empty())
            {
                debug!("Chose point group {} (order {})", point_group, group.order());
                return Ok(Some(group));
            }
            debug!("Point group {} cannot produce counts {:?}", point_group, counts);
        }

        Err(GenerationError::ConstraintInfeasible(format!(
            "no symmetry group could be chosen from {} candidates for counts {:?}",
            candidates.len(),
            counts
        )))
    }

    fn release_all(&self, tickets: Vec<GenerationTicket>) {
        for (generator, ticket) in self.generators.iter().zip(tickets) {
            generator.release(ticket);
        }
    }
}
