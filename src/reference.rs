//! Sequential reference sieve
//!
//! One flag per number over `[0, upper]`, even numbers included. Single-threaded and
//! unsegmented; `--verify` and the tests compare the engine against it.

/// All primes up to and including `limit`
pub fn primes_up_to(limit: usize) -> Vec<usize> {
    primes_in_range(0, limit)
}

/// Primes in `[lower, upper]`, ascending
pub fn primes_in_range(lower: usize, upper: usize) -> Vec<usize> {
    if upper < 2 || lower > upper {
        return Vec::new();
    }

    let mut composite = vec![false; upper + 1];
    for p in 2..=upper.isqrt() {
        if composite[p] {
            continue;
        }
        for multiple in (p * p..=upper).step_by(p) {
            composite[multiple] = true;
        }
    }

    (lower.max(2)..=upper).filter(|&n| !composite[n]).collect()
}
