use rand::rngs::StdRng;
use rand::SeedableRng;

/// Creates a seeded random number generator or a default one.
pub(crate) fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
