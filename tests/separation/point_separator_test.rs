use glam::f64::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use structgen::crystal::unit_cell::UnitCell;
use structgen::separation::point_separator::{PointSeparator, SeparationConfig, SeparationProblem};

fn assert_vec_near(actual: DVec3, expected: DVec3) {
    assert!((actual - expected).length() < 1e-9, "expected {:?}, got {:?}", expected, actual);
}

#[test]
fn test_two_free_points_split_the_correction() {
    let mut problem = SeparationProblem::new(vec![DVec3::ZERO, DVec3::new(0.5, 0.0, 0.0)], None);
    problem.set_min_separation(0, 1, 1.0);

    let result = PointSeparator::default().separate(&mut problem);

    assert!(result.converged);
    assert!(result.max_overlap_fraction <= 1e-4);
    assert_vec_near(problem.points[0], DVec3::new(-0.25, 0.0, 0.0));
    assert_vec_near(problem.points[1], DVec3::new(0.75, 0.0, 0.0));
}

#[test]
fn test_fixed_point_keeps_its_coordinates() {
    let anchor = DVec3::new(0.1, 0.2, 0.3);
    let mut problem = SeparationProblem::new(vec![anchor, anchor + DVec3::new(0.5, 0.0, 0.0)], None);
    problem.set_min_separation(0, 1, 1.0);
    problem.set_fixed(0, true);

    let result = PointSeparator::default().separate(&mut problem);

    assert!(result.converged);
    assert_eq!(problem.points[0], anchor);
    assert_vec_near(problem.points[1], anchor + DVec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_all_fixed_reports_remaining_overlap() {
    let mut problem = SeparationProblem::new(vec![DVec3::ZERO, DVec3::new(0.5, 0.0, 0.0)], None);
    problem.set_min_separation(0, 1, 1.0);
    problem.set_fixed(0, true);
    problem.set_fixed(1, true);

    let result = PointSeparator::default().separate(&mut problem);

    assert!(!result.converged);
    assert_eq!(result.iterations, 0);
    assert!((result.max_overlap_fraction - 0.5).abs() < 1e-12);
    assert_eq!(problem.points[1], DVec3::new(0.5, 0.0, 0.0));
}

#[test]
fn test_random_cloud_converges() {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<DVec3> = (0..10)
        .map(|_| DVec3::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)))
        .collect();
    let mut problem = SeparationProblem::new(points, None);
    for i in 0..10 {
        for j in (i + 1)..10 {
            problem.set_min_separation(i, j, 0.5);
        }
    }

    let result = PointSeparator::default().separate(&mut problem);

    assert!(result.converged, "{:?}", result);
    assert!(problem.max_overlap_fraction() <= 1e-4);
    for i in 0..10 {
        for j in (i + 1)..10 {
            assert!(problem.separation_vector(i, j).length() >= 0.5 * (1.0 - 1e-4));
        }
    }
}

#[test]
fn test_iteration_budget_is_respected() {
    // No point of a 1.5 cell is 2.0 away from every image of the origin
    let cell = UnitCell::cubic(1.5).unwrap();
    let mut problem = SeparationProblem::new(vec![DVec3::ZERO, DVec3::new(0.5, 0.4, 0.3)], Some(cell));
    problem.set_fixed(0, true);
    problem.set_min_separation(0, 1, 2.0);
    let separator = PointSeparator::new(SeparationConfig {
        tolerance: 1e-4,
        max_iterations: 25,
    });

    let result = separator.separate(&mut problem);

    assert!(!result.converged);
    assert_eq!(result.iterations, 25);
    assert!(result.max_overlap_fraction > 1e-4);
}

#[test]
fn test_periodic_separation_uses_minimum_image() {
    let cell = UnitCell::cubic(3.0).unwrap();
    let mut problem = SeparationProblem::new(
        vec![DVec3::new(0.1, 1.0, 1.0), DVec3::new(2.9, 1.0, 1.0)],
        Some(cell.clone()),
    );
    problem.set_min_separation(0, 1, 1.0);

    let result = PointSeparator::default().separate(&mut problem);

    assert!(result.converged);
    assert!(problem.separation_vector(0, 1).length() >= 1.0 - 1e-9);
    for point in &problem.points {
        let fractional = cell.cartesian_to_fractional(point);
        assert!(fractional.cmpge(DVec3::ZERO).all() && fractional.cmplt(DVec3::ONE).all(), "{:?}", point);
    }
    // The pair was pushed apart across the boundary, not through the cell
    assert!((problem.points[0].x - 0.5).abs() < 1e-9);
    assert!((problem.points[1].x - 2.5).abs() < 1e-9);
}
