use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use structgen::build::structure_builder::SymmetrySource;
use structgen::common::species::SpeciesDatabase;
use structgen::config::{ConfigError, GenerationConfig};

use crate::init_logging;

const CLUSTER: &str = r#"
cluster_volume_multiplier = 6.0

[symmetry]
point_groups = ["C4"]

[[atoms]]
species = "C"
count = 4

[[atoms]]
species = "O"
count = [1, 1]
label = "apex"
radius = 0.5

[separation]
tolerance = 1e-3

[[pair_distances]]
species = ["C", "O"]
distance = 1.2

[radii]
C = 0.7
"#;

#[test]
fn test_cluster_config_builds() {
    init_logging();
    let config = GenerationConfig::from_toml_str(CLUSTER).unwrap();
    assert_eq!(config.atoms.len(), 2);
    let species = config.species_table().unwrap();
    assert_eq!(species.radius_of(6), Some(0.7));

    let builder = config.into_builder().unwrap();
    assert!(!builder.is_periodic());
    assert!((builder.separation_config().tolerance - 1e-3).abs() < 1e-15);
    assert!(matches!(builder.symmetry(), SymmetrySource::Choose(groups) if groups.len() == 1));

    let mut rng = StdRng::seed_from_u64(10);
    let generated = match builder.build(&species, &mut rng) {
        Ok(generated) => generated,
        Err(structgen::build::GenerationError::SeparationUnresolved { structure, .. }) => *structure,
        Err(err) => panic!("build failed: {}", err),
    };
    assert_eq!(generated.num_atoms(), 5);
    assert_eq!(generated.structure.count_species(8), 1);
    let apex = generated.structure.iter_atoms().find(|atom| atom.species == 8).unwrap();
    assert_eq!(apex.label.as_deref(), Some("apex"));
    assert!(apex.position.x.abs() < 1e-9 && apex.position.y.abs() < 1e-9);
}

#[test]
fn test_periodic_config_from_file() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[lattice]
a = {{ min = 3.0, max = 3.0 }}
b = {{ min = 3.0, max = 3.0 }}
c = {{ min = 3.0, max = 3.0 }}
alpha = {{ min = 90.0, max = 90.0 }}
beta = {{ min = 90.0, max = 90.0 }}
gamma = {{ min = 90.0, max = 90.0 }}

[symmetry]
generators = [
    {{ rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]] }},
]

[[atoms]]
species = "Si"
count = 4
"#
    )
    .unwrap();

    let config = GenerationConfig::from_file(file.path()).unwrap();
    let species = config.species_table().unwrap();
    let builder = config.into_builder().unwrap();
    assert!(builder.is_periodic());
    match builder.symmetry() {
        SymmetrySource::Fixed(group) => assert_eq!(group.order(), 4),
        other => panic!("unexpected symmetry {:?}", other),
    }

    let mut rng = StdRng::seed_from_u64(11);
    let generated = match builder.build(&species, &mut rng) {
        Ok(generated) => generated,
        Err(structgen::build::GenerationError::SeparationUnresolved { structure, .. }) => *structure,
        Err(err) => panic!("build failed: {}", err),
    };
    assert_eq!(generated.num_atoms(), 4);
    let cell = generated.structure.unit_cell().unwrap();
    assert!((cell.volume() - 27.0).abs() < 1e-6);
}

#[test]
fn test_unknown_species_is_rejected() {
    let config = GenerationConfig::from_toml_str("[[atoms]]\nspecies = \"Qq\"\ncount = 1\n").unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::UnknownSpecies(symbol)) if symbol == "Qq"));
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let both = r#"
[symmetry]
point_groups = ["C2"]
generators = [{ rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] }]

[[atoms]]
species = "C"
count = 2
"#;
    let config = GenerationConfig::from_toml_str(both).unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::Invalid(_))));

    let config = GenerationConfig::from_toml_str("").unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::Invalid(_))));

    let bad_group = "[symmetry]\npoint_groups = [\"Q7\"]\n[[atoms]]\nspecies = \"C\"\ncount = 1\n";
    let config = GenerationConfig::from_toml_str(bad_group).unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::UnknownPointGroup(_))));

    let bad_shape = "[shape]\ntype = \"sphere\"\nradius = -1.0\n[[atoms]]\nspecies = \"C\"\ncount = 1\n";
    let config = GenerationConfig::from_toml_str(bad_shape).unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::Invalid(_))));

    assert!(matches!(
        GenerationConfig::from_toml_str("[[atoms]]\nspecies = \"C\"\ncount = 1\ncolour = \"red\"\n"),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn test_translated_generators_need_a_lattice() {
    let screw = r#"
[symmetry]
generators = [
    { rotation = [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]], translation = [0.0, 0.0, 0.5] },
]

[[atoms]]
species = "C"
count = 2
"#;
    let config = GenerationConfig::from_toml_str(screw).unwrap();
    assert!(matches!(config.into_builder(), Err(ConfigError::Invalid(_))));

    let with_lattice = format!("[lattice]\na = {{ min = 4.0, max = 4.0 }}\n{}", screw);
    let builder = GenerationConfig::from_toml_str(&with_lattice).unwrap().into_builder().unwrap();
    match builder.symmetry() {
        SymmetrySource::Fixed(group) => assert_eq!(group.order(), 2),
        other => panic!("unexpected symmetry {:?}", other),
    }
}
