//! Seeding of the random number generators used for initializations
//!
//! Every randomized step of the decomposition methods (random projections, initial unmixing
//! matrices and random NMF factors) draws from a `Xoshiro256Plus` generator created here. A fixed
//! seed makes a fit reproducible, without a seed the generator is seeded from system entropy.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Create the generator for an optional seed
pub fn rng_from_seed(seed: Option<u64>) -> Xoshiro256Plus {
    match seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{distributions::Standard, Rng};

    #[test]
    fn seeded_generators_agree() {
        let draw = |seed| -> Vec<u64> {
            rng_from_seed(Some(seed))
                .sample_iter(Standard)
                .take(4)
                .collect()
        };
        assert_eq!(draw(7), draw(7));
        assert_ne!(draw(7), draw(8));
    }
}
