use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use structgen::build::multiplicity::factor_multiplicities;

fn divisors(values: &[usize]) -> BTreeSet<usize> {
    values.iter().copied().collect()
}

#[test]
fn test_count_not_reachable_from_divisors() {
    let mut rng = StdRng::seed_from_u64(3);
    assert!(factor_multiplicities(4, &divisors(&[3]), &mut rng).is_empty());
    assert!(factor_multiplicities(7, &divisors(&[4, 2]), &mut rng).is_empty());
}

#[test]
fn test_multiple_of_largest_uses_largest_only() {
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(factor_multiplicities(12, &divisors(&[4, 2, 1]), &mut rng), vec![4, 4, 4]);
}

#[test]
fn test_mixed_factoring_sums_to_count() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let factors = factor_multiplicities(10, &divisors(&[4, 3]), &mut rng);
        assert_eq!(factors.iter().sum::<usize>(), 10);
        assert!(factors.iter().all(|f| *f == 4 || *f == 3), "{:?}", factors);
        assert!(factors.windows(2).all(|w| w[0] >= w[1]), "{:?} not sorted", factors);
    }
}

#[test]
fn test_degenerate_inputs_give_no_factoring() {
    let mut rng = StdRng::seed_from_u64(8);
    assert!(factor_multiplicities(0, &divisors(&[1, 2]), &mut rng).is_empty());
    assert!(factor_multiplicities(5, &BTreeSet::new(), &mut rng).is_empty());
    assert!(factor_multiplicities(5, &divisors(&[0]), &mut rng).is_empty());
}

#[test]
fn test_unit_multiplicity_always_works() {
    let mut rng = StdRng::seed_from_u64(13);
    let factors = factor_multiplicities(5, &divisors(&[1, 4]), &mut rng);
    assert_eq!(factors.iter().sum::<usize>(), 5);
}
