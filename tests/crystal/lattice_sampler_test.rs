use rand::rngs::StdRng;
use rand::SeedableRng;
use structgen::crystal::lattice_sampler::{angles_are_valid, LatticeConstraints, LatticeSampler, ParamRange};
use structgen::crystal::unit_cell::LatticeParam;

#[test]
fn test_fixed_angles_and_target_volume() {
    let mut constraints = LatticeConstraints::default();
    for param in LatticeParam::LENGTHS {
        constraints.set_param_range(param, Some(ParamRange::new(1.0, 2.0)));
    }
    for param in [LatticeParam::Alpha, LatticeParam::Beta, LatticeParam::Gamma] {
        constraints.set_param_range(param, Some(ParamRange::fixed(90.0)));
    }
    constraints.target_volume = Some(8.0);
    constraints.volume_delta = 0.0125;
    let sampler = LatticeSampler::new(constraints);

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let cell = sampler.sample(None, false, &mut rng).unwrap();
        for angle in cell.angles() {
            assert!((angle - 90.0).abs() < 1e-9, "angle {}", angle);
        }
        assert!(cell.volume() >= 7.9 && cell.volume() <= 8.1, "volume {}", cell.volume());
    }
}

#[test]
fn test_parameters_stay_in_bounds_without_volume_rescale() {
    let mut constraints = LatticeConstraints::default();
    constraints.a = Some(ParamRange::fixed(2.0));
    constraints.b = Some(ParamRange::fixed(3.0));
    constraints.c = Some(ParamRange::fixed(4.0));
    constraints.alpha = Some(ParamRange::fixed(90.0));
    constraints.beta = Some(ParamRange::fixed(90.0));
    constraints.gamma = Some(ParamRange::fixed(120.0));
    assert!(constraints.is_fully_specified());
    let sampler = LatticeSampler::new(constraints);

    let mut rng = StdRng::seed_from_u64(1);
    let cell = sampler.sample(Some(1000.0), false, &mut rng).unwrap();
    let expected = [2.0, 3.0, 4.0, 90.0, 90.0, 120.0];
    for (value, expected) in cell.parameters().iter().zip(expected) {
        assert!((value - expected).abs() < 1e-8);
    }
}

#[test]
fn test_angles_are_always_valid() {
    let mut constraints = LatticeConstraints::default();
    constraints.min_angle = Some(40.0);
    constraints.max_angle = Some(140.0);
    let sampler = LatticeSampler::new(constraints);

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let cell = sampler.sample(Some(10.0), false, &mut rng).unwrap();
        let angles = cell.angles();
        assert!(angles_are_valid(&angles), "{:?}", angles);
        for angle in angles {
            assert!(angle >= 40.0 - 1e-6 && angle <= 140.0 + 1e-6);
        }
    }
}

#[test]
fn test_length_ratio_is_enforced() {
    let mut constraints = LatticeConstraints::default();
    constraints.min_length = Some(1.0);
    constraints.max_length = Some(10.0);
    constraints.max_length_ratio = Some(1.5);
    let sampler = LatticeSampler::new(constraints);

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let cell = sampler.sample(Some(20.0), false, &mut rng).unwrap();
        let lengths = cell.lengths();
        let max = lengths.iter().cloned().fold(f64::MIN, f64::max);
        let min = lengths.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max / min <= 1.5 * 1.01, "ratio {} for {:?}", max / min, lengths);
    }
}

#[test]
fn test_volume_follows_contents() {
    let mut constraints = LatticeConstraints::default();
    constraints.volume_delta = 0.1;
    constraints.contents_multiplier = Some(3.0);
    let sampler = LatticeSampler::new(constraints);

    let mut rng = StdRng::seed_from_u64(5);
    let cell = sampler.sample(Some(10.0), false, &mut rng).unwrap();
    assert!(cell.volume() >= 27.0 - 1e-9 && cell.volume() <= 33.0 + 1e-9, "volume {}", cell.volume());
}
