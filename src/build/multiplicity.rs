// Splitting an atom count into orbit sizes.
//
// A count n has to be written as a sum of multiplicities the active symmetry group
// can produce (its full order plus the reduced multiplicities of special
// positions). A single multiset that sums to n is enough; it does not have to be
// the only one.

use log::debug;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeSet;

pub const MAX_FACTOR_ATTEMPTS: usize = 50_000;
// Failed attempts between increments of the allowed multiset size
const ALLOWANCE_GROWTH_INTERVAL: usize = 1000;

/// Returns multiplicities drawn from `divisors` that sum to `n`, largest first, or an
/// empty vector when no such multiset was found.
pub fn factor_multiplicities<R: Rng + ?Sized>(
    n: usize,
    divisors: &BTreeSet<usize>,
    rng: &mut R,
) -> Vec<usize> {
    let divisors: BTreeSet<usize> = divisors.iter().copied().filter(|&d| d > 0).collect();
    let largest = match divisors.last() {
        Some(&largest) if n > 0 => largest,
        _ => return Vec::new(),
    };

    if n % largest == 0 {
        return vec![largest; n / largest];
    }

    // Every sum of divisors is a multiple of their gcd
    let common = divisors.iter().fold(0, |acc, &d| gcd(acc, d));
    if n % common != 0 {
        debug!("{} is not a multiple of gcd {} of {:?}", n, common, divisors);
        return Vec::new();
    }

    let mut allowance = n / largest + 1;
    for attempt in 1..=MAX_FACTOR_ATTEMPTS {
        let mut picks = Vec::new();
        let mut remaining = n;
        while remaining > 0 && picks.len() < allowance {
            let choice = divisors.iter().copied().filter(|&d| d <= remaining).choose(rng);
            match choice {
                Some(d) => {
                    picks.push(d);
                    remaining -= d;
                }
                None => break,
            }
        }
        if remaining == 0 {
            picks.sort_unstable_by(|a, b| b.cmp(a));
            return picks;
        }
        if attempt % ALLOWANCE_GROWTH_INTERVAL == 0 {
            allowance += 1;
        }
    }

    debug!(
        "No multiplicities from {:?} sum to {} after {} attempts",
        divisors, n, MAX_FACTOR_ATTEMPTS
    );
    Vec::new()
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
