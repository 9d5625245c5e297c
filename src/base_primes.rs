/// Primes up to isqrt(upper_lim), found by trial division against the primes
/// already in the table.
///
/// Built once on the constructing thread and only read afterwards, so workers
/// share it by plain reference.
#[derive(Debug, Clone)]
pub struct BasePrimes {
    primes: Vec<usize>,
    doubled: Vec<usize>,
    sqrt_limit: usize,
}

impl BasePrimes {
    pub fn new(upper_lim: usize) -> Self {
        let sqrt_limit = upper_lim.isqrt();
        let mut primes = Vec::new();

        if sqrt_limit >= 2 {
            primes.push(2);
        }

        // Evens never need testing, 2 is seeded above
        for candidate in (3..=sqrt_limit).step_by(2) {
            if is_prime_by_trial(&primes, candidate) {
                primes.push(candidate);
            }
        }

        // Marking only visits odd multiples, so the stride is 2p
        let doubled = primes.iter().map(|&p| p * 2).collect();

        Self {
            primes,
            doubled,
            sqrt_limit,
        }
    }

    pub fn primes(&self) -> &[usize] {
        &self.primes
    }

    /// Each base prime times two, index-aligned with `primes()`
    pub fn doubled(&self) -> &[usize] {
        &self.doubled
    }

    pub fn sqrt_limit(&self) -> usize {
        self.sqrt_limit
    }

    pub fn contains(&self, n: usize) -> bool {
        self.primes.binary_search(&n).is_ok()
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }
}

/// Assumes `known` holds every prime below `candidate` up to its root
fn is_prime_by_trial(known: &[usize], candidate: usize) -> bool {
    for &p in known {
        if p * p > candidate {
            break;
        }
        if candidate % p == 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_limits_have_no_base_primes() {
        for upper in 0..4 {
            let base = BasePrimes::new(upper);
            assert!(base.is_empty(), "upper_lim {} should have no base primes", upper);
        }
    }

    #[test]
    fn test_base_primes_up_to_root() {
        assert_eq!(BasePrimes::new(4).primes(), &[2]);
        assert_eq!(BasePrimes::new(30).primes(), &[2, 3, 5]);
        assert_eq!(BasePrimes::new(48).primes(), &[2, 3, 5]);
        assert_eq!(BasePrimes::new(49).primes(), &[2, 3, 5, 7]);
        assert_eq!(BasePrimes::new(100).primes(), &[2, 3, 5, 7]);
        assert_eq!(BasePrimes::new(10_000).sqrt_limit(), 100);
        assert_eq!(BasePrimes::new(10_000).len(), 25);
    }

    #[test]
    fn test_doubled_matches_primes() {
        let base = BasePrimes::new(1_000);
        assert_eq!(base.primes().len(), base.doubled().len());
        for (p, d) in base.primes().iter().zip(base.doubled()) {
            assert_eq!(*d, p * 2);
        }
    }

    #[test]
    fn test_contains() {
        let base = BasePrimes::new(121);
        assert!(base.contains(11));
        assert!(!base.contains(9));
        assert!(!base.contains(13));
    }

    #[test]
    fn test_matches_reference_sieve() {
        let base = BasePrimes::new(1_000_000);
        assert_eq!(base.primes(), crate::reference::primes_up_to(1_000).as_slice());
    }
}
