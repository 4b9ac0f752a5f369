use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use structgen::build::atom_group::{AtomGroupSpec, CountRange};
use structgen::build::plan::{GenerationSettings, GenerationTicket, StructureContents};
use structgen::common::species::SpeciesTable;

#[test]
fn test_counts_are_drawn_from_ranges() {
    let specs = vec![AtomGroupSpec::new(11, CountRange::new(6, 2)), AtomGroupSpec::new(17, CountRange::exact(3))];
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..20 {
        let ticket = GenerationTicket::plan(&specs, None, &mut rng);
        let entries = ticket.entries();
        assert_eq!(entries.len(), 2);
        assert!((2..=6).contains(&entries[0].1));
        assert_eq!(entries[1].1, 3);
        ticket.release();
    }
}

#[test]
fn test_settings_override_by_label_and_symbol() {
    let specs = vec![
        AtomGroupSpec::new(11, CountRange::new(1, 10)).with_label("cation"),
        AtomGroupSpec::new(17, CountRange::new(1, 10)),
    ];
    let mut settings = GenerationSettings::new();
    settings.set_count("cation", 4);
    settings.set_count("Cl", 5);

    let mut rng = StdRng::seed_from_u64(2);
    let ticket = GenerationTicket::plan(&specs, Some(&settings), &mut rng);
    let counts: Vec<usize> = ticket.entries().iter().map(|(_, count)| *count).collect();
    assert_eq!(counts, vec![4, 5]);
    assert_eq!(ticket.num_atoms(), 9);
}

#[test]
fn test_zero_counts_are_left_out() {
    let specs = vec![AtomGroupSpec::new(6, CountRange::exact(0)), AtomGroupSpec::new(8, CountRange::exact(2))];
    let mut rng = StdRng::seed_from_u64(2);
    let entries = GenerationTicket::plan(&specs, None, &mut rng).into_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.species, 8);
}

#[test]
fn test_contents_sum_atom_volumes() {
    let mut species = SpeciesTable::new();
    species.set_radius(6, 0.5);
    let specs = vec![
        AtomGroupSpec::new(6, CountRange::exact(2)),
        AtomGroupSpec::new(8, CountRange::exact(3)).with_radius(1.0),
        AtomGroupSpec::new(9, CountRange::exact(1)),
    ];
    let mut rng = StdRng::seed_from_u64(2);
    let ticket = GenerationTicket::plan(&specs, None, &mut rng);
    let contents = ticket.contents(&species);

    assert_eq!(contents.num_atoms, 6);
    let expected = 4.0 / 3.0 * PI * (2.0 * 0.125 + 3.0);
    assert!((contents.volume - expected).abs() < 1e-12);

    let total = contents + StructureContents { num_atoms: 1, volume: 1.0 };
    assert_eq!(total.num_atoms, 7);
    ticket.release();
}
