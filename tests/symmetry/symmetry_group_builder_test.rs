use glam::f64::{DMat3, DMat4, DVec3};
use std::f64::consts::FRAC_PI_2;
use structgen::symmetry::symmetry_group::SymmetryGroup;
use structgen::symmetry::symmetry_group_builder::SymmetryGroupBuilder;
use structgen::symmetry::symmetry_operator::{
    approx_eq, from_linear, from_linear_and_translation, is_identity, translation_part,
};

fn quarter_turn_z() -> DMat4 {
    from_linear(DMat3::from_rotation_z(FRAC_PI_2))
}

#[test]
fn test_four_fold_rotation_closes_to_order_four() {
    let group = SymmetryGroupBuilder::with_generators([quarter_turn_z()]).build();
    assert_eq!(group.order(), 4);
    assert!(is_identity(&group.ops()[0]));
    assert!(group.is_closed());
}

#[test]
fn test_empty_generators_give_identity_only() {
    let group = SymmetryGroupBuilder::new().build();
    assert_eq!(group.order(), 1);
    assert!(is_identity(&group.ops()[0]));
}

#[test]
fn test_identity_generator_is_not_duplicated() {
    let group = SymmetryGroupBuilder::with_generators([DMat4::IDENTITY, quarter_turn_z()]).build();
    assert_eq!(group.order(), 4);
}

#[test]
fn test_two_generators_close_to_dihedral_group() {
    let mut builder = SymmetryGroupBuilder::new();
    builder
        .add_generator(quarter_turn_z())
        .add_generator(from_linear(DMat3::from_rotation_x(std::f64::consts::PI)));
    let group = builder.build();
    assert_eq!(group.order(), 8);
    assert!(group.is_closed());
    for a in group.ops() {
        for b in group.ops() {
            assert!(group.contains(&(*a * *b)), "product missing from closure");
        }
    }
}

#[test]
fn test_screw_axis_closes_with_wrapped_translation() {
    let screw = from_linear_and_translation(DMat3::from_rotation_z(FRAC_PI_2), DVec3::new(0.0, 0.0, 0.25));
    let group = SymmetryGroupBuilder::with_generators([screw]).build();
    assert_eq!(group.order(), 4);
    for op in group.ops() {
        let t = translation_part(op);
        assert!(t.z >= 0.0 && t.z < 1.0);
    }
}

#[test]
fn test_add_op_skips_duplicates() {
    let mut group = SymmetryGroup::new();
    assert!(group.add_op(quarter_turn_z()));
    assert!(!group.add_op(quarter_turn_z()));
    assert_eq!(group.order(), 2);
    assert!(approx_eq(&group.ops()[1], &quarter_turn_z()));
    assert!(!group.is_closed());
}
