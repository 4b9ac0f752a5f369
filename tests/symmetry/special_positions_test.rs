use glam::f64::{DMat3, DVec3};
use std::f64::consts::FRAC_PI_2;
use structgen::symmetry::eigenspaces::spans;
use structgen::symmetry::point_groups::PointGroup;
use structgen::symmetry::symmetry_group_builder::SymmetryGroupBuilder;
use structgen::symmetry::symmetry_operator::from_linear;

#[test]
fn test_four_fold_axis_is_special_position_of_multiplicity_one() {
    let mut group = SymmetryGroupBuilder::with_generators([from_linear(DMat3::from_rotation_z(FRAC_PI_2))]).build();
    assert!(!group.is_analyzed());
    group.generate_eigenvectors();
    assert!(group.is_analyzed());

    let multiplicities: Vec<usize> = group.get_multiplicities().into_iter().collect();
    assert_eq!(multiplicities, vec![1]);

    let positions = group.get_eigenspaces_and_masks(1);
    assert_eq!(positions.len(), 1);
    let axis = &positions[0];
    assert_eq!(axis.dimension(), 1);
    assert!(spans(&axis.subspace, &[DVec3::Z]));
    assert_eq!(axis.op_mask, vec![true, false, false, false]);
    assert_eq!(axis.stabilizer.len(), 4);
}

#[test]
fn test_general_multiplicity_has_no_special_entry() {
    let mut group = PointGroup::C(4).build_group();
    group.generate_eigenvectors();
    assert!(group.get_eigenspaces_and_masks(4).is_empty());
    assert!(group.get_eigenspaces_and_masks(3).is_empty());
}

#[test]
fn test_c2v_has_axis_and_mirror_planes() {
    let mut group = PointGroup::Cnv(2).build_group();
    group.generate_eigenvectors();
    let multiplicities: Vec<usize> = group.get_multiplicities().into_iter().collect();
    assert_eq!(multiplicities, vec![1, 2]);

    let planes = group.get_eigenspaces_and_masks(2);
    assert_eq!(planes.len(), 2);
    for plane in planes {
        assert_eq!(plane.dimension(), 2);
        assert!(spans(&plane.subspace, &[DVec3::Z]));
    }
}

#[test]
fn test_mask_flags_match_multiplicity() {
    for point_group in [PointGroup::Cnv(4), PointGroup::Dnh(3), PointGroup::Td, PointGroup::Oh] {
        let mut group = point_group.build_group();
        group.generate_eigenvectors();
        for multiplicity in group.get_multiplicities() {
            assert!(multiplicity < group.order());
            assert_eq!(group.order() % multiplicity, 0);
            for position in group.get_eigenspaces_and_masks(multiplicity) {
                let flagged = position.op_mask.iter().filter(|&&f| f).count();
                assert_eq!(flagged, multiplicity, "{} mask {:?}", point_group, position.op_mask);
                assert!(position.op_mask[0]);
                assert_eq!(position.stabilizer.len() * multiplicity, group.order());
            }
        }
    }
}

#[test]
fn test_masked_images_of_special_point_are_distinct() {
    let mut group = PointGroup::Dnh(4).build_group();
    group.generate_eigenvectors();
    for multiplicity in group.get_multiplicities() {
        for position in group.get_eigenspaces_and_masks(multiplicity) {
            let point = position.subspace.iter().enumerate().fold(DVec3::ZERO, |acc, (i, v)| acc + *v * (0.7 + 0.4 * i as f64));
            let images: Vec<DVec3> = group
                .ops()
                .iter()
                .zip(&position.op_mask)
                .filter(|(_, &flag)| flag)
                .map(|(op, _)| op.transform_point3(point))
                .collect();
            for (i, a) in images.iter().enumerate() {
                for b in &images[i + 1..] {
                    assert!((*a - *b).length() > 1e-6, "coincident images for multiplicity {}", multiplicity);
                }
            }
            // Every operator maps the point onto one of the masked images
            for op in group.ops() {
                let image = op.transform_point3(point);
                assert!(images.iter().any(|p| (*p - image).length() < 1e-6));
            }
        }
    }
}

#[test]
fn test_analysis_is_reset_by_new_operator() {
    let mut group = PointGroup::C(2).build_group();
    group.generate_eigenvectors();
    assert!(group.is_analyzed());
    group.add_op(from_linear(DMat3::from_rotation_x(std::f64::consts::PI)));
    assert!(!group.is_analyzed());
    assert!(group.get_multiplicities().is_empty());
}
