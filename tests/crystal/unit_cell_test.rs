use glam::f64::{DMat3, DVec3};
use structgen::crystal::unit_cell::{LatticeParam, UnitCell, UnitCellError};

const EPSILON: f64 = 1e-9;

#[test]
fn test_cubic_cell_parameters() {
    let cell = UnitCell::cubic(3.0).unwrap();
    assert_eq!(cell.lengths(), [3.0, 3.0, 3.0]);
    for angle in cell.angles() {
        assert!((angle - 90.0).abs() < EPSILON);
    }
    assert!((cell.volume() - 27.0).abs() < EPSILON);
}

#[test]
fn test_parameters_are_recomputed_from_matrix() {
    let cell = UnitCell::from_parameters(2.0, 3.0, 4.0, 80.0, 95.0, 110.0).unwrap();
    let rebuilt = UnitCell::from_matrix(*cell.matrix()).unwrap();
    for param in LatticeParam::ALL {
        assert!(
            (cell.parameter(param) - rebuilt.parameter(param)).abs() < 1e-8,
            "{:?} differs",
            param
        );
    }
    assert!(cell.is_approximately_equal(&rebuilt));
}

#[test]
fn test_singular_matrix_is_rejected() {
    let flat = DMat3::from_cols(DVec3::X, DVec3::Y, DVec3::new(1.0, 1.0, 0.0));
    match UnitCell::from_matrix(flat) {
        Err(UnitCellError::Singular { .. }) => {}
        other => panic!("expected singular error, got {:?}", other),
    }
}

#[test]
fn test_set_volume_scales_isotropically() {
    let mut cell = UnitCell::from_parameters(1.0, 2.0, 3.0, 90.0, 90.0, 90.0).unwrap();
    cell.set_volume(48.0).unwrap();
    assert!((cell.volume() - 48.0).abs() < 1e-9);
    let [a, b, c] = cell.lengths();
    assert!((b / a - 2.0).abs() < 1e-9);
    assert!((c / a - 3.0).abs() < 1e-9);
    assert!((cell.angles()[0] - 90.0).abs() < 1e-9);
    assert!(cell.set_volume(-1.0).is_err());
}

#[test]
fn test_fractional_round_trip_and_wrap() {
    let cell = UnitCell::from_parameters(2.0, 3.0, 4.0, 90.0, 100.0, 90.0).unwrap();
    let fractional = DVec3::new(0.25, 0.5, 0.75);
    let cartesian = cell.fractional_to_cartesian(&fractional);
    assert!((cell.cartesian_to_fractional(&cartesian) - fractional).length() < EPSILON);

    let outside = cartesian + cell.lattice_vector(0) * 2.0 - cell.lattice_vector(2);
    assert!((cell.wrap(&outside) - cartesian).length() < 1e-9);
}

#[test]
fn test_minimum_image_in_cubic_cell() {
    let cell = UnitCell::cubic(3.0).unwrap();
    let image = cell.minimum_image(&DVec3::new(2.8, 0.0, -1.6));
    assert!((image - DVec3::new(-0.2, 0.0, 1.4)).length() < EPSILON);
}
