use glam::f64::DVec3;
use structgen::crystal::atomic_structure::Structure;
use structgen::crystal::unit_cell::UnitCell;

#[test]
fn test_add_and_query_atoms() {
    let mut structure = Structure::new();
    let na = structure.add_atom(11, DVec3::ZERO, Some(1.0));
    let cl = structure.add_atom(17, DVec3::new(2.5, 0.0, 0.0), None);
    structure.set_atom_label(cl, Some("anion".to_string()));

    assert_eq!(structure.get_num_of_atoms(), 2);
    assert_eq!(structure.count_species(11), 1);
    assert_eq!(structure.get_atom(cl).and_then(|a| a.label.clone()).as_deref(), Some("anion"));
    assert_eq!(structure.get_atom(na).map(|a| a.radius_or_zero()), Some(1.0));
    assert_eq!(structure.get_atom(cl).map(|a| a.radius_or_zero()), Some(0.0));
    assert!(!structure.is_periodic());
}

#[test]
fn test_periodic_distance_and_wrap() {
    let mut structure = Structure::periodic(UnitCell::cubic(4.0).unwrap());
    let id = structure.add_atom(6, DVec3::new(-0.5, 4.5, 1.0), None);
    assert!((structure.distance(&DVec3::new(0.1, 0.0, 0.0), &DVec3::new(3.9, 0.0, 0.0)) - 0.2).abs() < 1e-9);

    structure.wrap_atoms();
    let position = structure.get_atom(id).map(|a| a.position).unwrap();
    assert!((position - DVec3::new(3.5, 0.5, 1.0)).length() < 1e-9);
}
