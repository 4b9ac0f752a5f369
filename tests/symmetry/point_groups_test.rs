use glam::f64::DVec3;
use structgen::symmetry::point_groups::{PointGroup, RotationalSymmetry};

#[test]
fn test_point_group_orders() {
    let cases = [
        ("C1", 1),
        ("C4", 4),
        ("Ci", 2),
        ("Cs", 2),
        ("C2v", 4),
        ("C3h", 6),
        ("D2", 4),
        ("D3h", 12),
        ("D2d", 8),
        ("D3d", 12),
        ("S4", 4),
        ("S6", 6),
        ("T", 12),
        ("Td", 24),
        ("Th", 24),
        ("O", 24),
        ("Oh", 48),
    ];
    for (name, order) in cases {
        let point_group: PointGroup = name.parse().unwrap();
        assert_eq!(point_group.order(), order, "{}", name);
        let group = point_group.build_group();
        assert_eq!(group.order(), order, "closure of {}", name);
        assert!(group.is_closed(), "{} not closed", name);
    }
}

#[test]
fn test_names_round_trip_through_display() {
    for name in ["C6", "C2v", "C4h", "D6", "D6h", "D4d", "S8", "Td", "Oh", "Ci", "Cs"] {
        let point_group: PointGroup = name.parse().unwrap();
        assert_eq!(point_group.to_string(), name);
    }
}

#[test]
fn test_invalid_names_are_rejected() {
    for name in ["", "X2", "C0", "D1", "S3", "C2x", "Dh"] {
        assert!(name.parse::<PointGroup>().is_err(), "{} parsed", name);
    }
}

#[test]
fn test_rotational_symmetry_rejects_degenerate_input() {
    assert!(RotationalSymmetry::new(DVec3::ZERO, 2).is_none());
    assert!(RotationalSymmetry::new(DVec3::Z, 0).is_none());
    let rotation = RotationalSymmetry::new(DVec3::new(0.0, 0.0, 2.0), 4).unwrap();
    assert!((rotation.axis - DVec3::Z).length() < 1e-12);
    assert!((rotation.smallest_angle_radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
}
