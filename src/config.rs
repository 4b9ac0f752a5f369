// TOML description of a generation run.
//
// Example:
//
//   cluster_volume_multiplier = 4.0
//
//   [lattice]
//   a = { min = 1.0, max = 2.0 }
//   alpha = { min = 90.0, max = 90.0 }
//   target_volume = 8.0
//
//   [symmetry]
//   point_groups = ["C2v", "D3h"]
//
//   [[atoms]]
//   species = "Na"
//   count = [2, 6]
//
//   [shape]
//   type = "sphere"
//   radius = 5.0
//
//   [[pair_distances]]
//   species = ["Na", "Cl"]
//   distance = 2.5

use crate::build::atom_group::{AtomGroupSpec, CountRange};
use crate::build::atoms_generator::AtomsGenerator;
use crate::build::shape::{BoxShape, CylinderShape, GeneratorShape, SphereShape};
use crate::build::structure_builder::{StructureBuilder, SymmetrySource};
use crate::common::species::{species_from_symbol, SpeciesId, SpeciesTable};
use crate::crystal::lattice_sampler::LatticeConstraints;
use crate::separation::point_separator::SeparationConfig;
use crate::symmetry::point_groups::PointGroup;
use crate::symmetry::symmetry_group_builder::SymmetryGroupBuilder;
use crate::symmetry::symmetry_operator::from_linear_and_translation;
use glam::f64::{DMat3, DVec3};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("unknown point group '{0}'")]
    UnknownPointGroup(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CountConfig {
    Exact(usize),
    Range([usize; 2]),
}

impl From<&CountConfig> for CountRange {
    fn from(count: &CountConfig) -> Self {
        match *count {
            CountConfig::Exact(n) => CountRange::exact(n),
            CountConfig::Range([min, max]) => CountRange::new(min, max),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomGroupConfig {
    pub species: String,
    pub count: CountConfig,
    pub position: Option<[f64; 3]>,
    pub radius: Option<f64>,
    pub label: Option<String>,
}

/// A symmetry operator written as a 3x3 matrix (rows) and an optional translation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    pub rotation: [[f64; 3]; 3],
    #[serde(default)]
    pub translation: [f64; 3],
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymmetryConfig {
    pub point_groups: Vec<String>,
    pub generators: Vec<OperatorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum ShapeConfig {
    Sphere { radius: f64 },
    #[serde(rename = "box")]
    Cuboid { size: [f64; 3] },
    Cylinder { radius: f64, height: f64 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairDistanceConfig {
    pub species: [String; 2],
    pub distance: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Present for periodic builds
    pub lattice: Option<LatticeConstraints>,
    pub symmetry: Option<SymmetryConfig>,
    pub atoms: Vec<AtomGroupConfig>,
    pub shape: Option<ShapeConfig>,
    pub separation: Option<SeparationConfig>,
    pub pair_distances: Vec<PairDistanceConfig>,
    /// Radius overrides by element symbol
    pub radii: HashMap<String, f64>,
    pub cluster_volume_multiplier: Option<f64>,
}

impl GenerationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Covalent radii with the configured overrides applied.
    pub fn species_table(&self) -> Result<SpeciesTable, ConfigError> {
        let mut table = SpeciesTable::covalent();
        for (symbol, radius) in &self.radii {
            table.set_radius(species(symbol)?, *radius);
        }
        Ok(table)
    }

    pub fn into_builder(self) -> Result<StructureBuilder, ConfigError> {
        if self.atoms.is_empty() {
            return Err(ConfigError::Invalid("no [[atoms]] groups".to_string()));
        }

        let mut generator = AtomsGenerator::new();
        for atoms in &self.atoms {
            let mut spec = AtomGroupSpec::new(species(&atoms.species)?, CountRange::from(&atoms.count));
            spec.position = atoms.position.map(DVec3::from_array);
            spec.radius = atoms.radius;
            spec.label = atoms.label.clone();
            generator.add_group(spec);
        }

        let mut builder = StructureBuilder::new();
        builder.add_generator(Box::new(generator));
        let periodic = self.lattice.is_some();
        builder.set_lattice(self.lattice);
        builder.set_shape(self.shape.as_ref().map(shape_from_config).transpose()?);
        if let Some(symmetry) = &self.symmetry {
            builder.set_symmetry(symmetry_from_config(symmetry, periodic)?);
        }
        if let Some(separation) = self.separation {
            builder.set_separation_config(separation);
        }
        for pair in &self.pair_distances {
            if pair.distance < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "negative distance for pair {:?}",
                    pair.species
                )));
            }
            builder.set_pair_distance(species(&pair.species[0])?, species(&pair.species[1])?, pair.distance);
        }
        if let Some(multiplier) = self.cluster_volume_multiplier {
            builder.set_cluster_volume_multiplier(multiplier);
        }
        Ok(builder)
    }
}

fn species(symbol: &str) -> Result<SpeciesId, ConfigError> {
    species_from_symbol(symbol).ok_or_else(|| ConfigError::UnknownSpecies(symbol.to_string()))
}

fn shape_from_config(shape: &ShapeConfig) -> Result<Box<dyn GeneratorShape>, ConfigError> {
    let positive = |name: &str, value: f64| {
        if value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::Invalid(format!("shape {} must be positive, got {}", name, value)))
        }
    };
    let shape: Box<dyn GeneratorShape> = match shape {
        ShapeConfig::Sphere { radius } => Box::new(SphereShape::new(positive("radius", *radius)?)),
        ShapeConfig::Cuboid { size } => {
            for value in size {
                positive("size", *value)?;
            }
            Box::new(BoxShape::new(DVec3::from_array(*size)))
        }
        ShapeConfig::Cylinder { radius, height } => Box::new(CylinderShape::new(
            positive("radius", *radius)?,
            positive("height", *height)?,
        )),
    };
    Ok(shape)
}

fn symmetry_from_config(symmetry: &SymmetryConfig, periodic: bool) -> Result<SymmetrySource, ConfigError> {
    match (symmetry.point_groups.is_empty(), symmetry.generators.is_empty()) {
        (true, true) => Ok(SymmetrySource::None),
        (false, false) => Err(ConfigError::Invalid(
            "give either point_groups or generators, not both".to_string(),
        )),
        (false, true) => symmetry
            .point_groups
            .iter()
            .map(|name| {
                name.parse::<PointGroup>()
                    .map_err(|_| ConfigError::UnknownPointGroup(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SymmetrySource::Choose),
        (true, false) => {
            // Translations are fractional and only make sense with a lattice
            if !periodic && symmetry.generators.iter().any(|op| op.translation != [0.0; 3]) {
                return Err(ConfigError::Invalid(
                    "generators with translations need a [lattice] section".to_string(),
                ));
            }
            let generators = symmetry.generators.iter().map(|op| {
                let rows = op.rotation;
                // Rows in the file, columns in glam
                let linear = DMat3::from_cols_array_2d(&rows).transpose();
                from_linear_and_translation(linear, DVec3::from_array(op.translation))
            });
            Ok(SymmetrySource::Fixed(SymmetryGroupBuilder::with_generators(generators).build()))
        }
    }
}
