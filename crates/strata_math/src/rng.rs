use rand::SeedableRng;

/// Random generator used by render workers.
///
/// Xoshiro256++ is fast, has a small state and supports jump-ahead, so
/// every strip of an image can draw from its own non-overlapping stream.
pub type StrataRng = rand_xoshiro::Xoshiro256PlusPlus;

/// Build `count` independent generators from one seed.
///
/// Stream `i` is the seed stream advanced by `i` jumps (2^128 draws each),
/// so the generator handed to a strip depends only on the seed and the
/// strip index, never on which thread picks the strip up.
pub fn strip_rngs(seed: u64, count: usize) -> Vec<StrataRng> {
    let mut rng = StrataRng::seed_from_u64(seed);
    let mut streams = Vec::with_capacity(count);
    for _ in 0..count {
        streams.push(rng.clone());
        rng.jump();
    }
    streams
}
