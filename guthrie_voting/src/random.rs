use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::time::{SystemTime, UNIX_EPOCH};

/// The single stream of randomness shared by a whole simulation.
///
/// All the draws advance the same generator, so a simulation is fully
/// determined by its seed.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: StdRng,
}

impl RandomSource {
    /// Creates a new source. A seed of 0 is replaced by one derived from the clock.
    pub fn new(seed: u64) -> RandomSource {
        let resolved = if seed == 0 { clock_seed() } else { seed };
        info!("RandomSource: using seed {}", resolved);
        RandomSource {
            seed: resolved,
            rng: StdRng::seed_from_u64(resolved),
        }
    }

    /// The seed actually in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in [0, 1).
    pub fn generate(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Integer in [0, max), computed as floor(uniform * max).
    ///
    /// This is slightly biased for large values of max.
    pub fn generate_below(&mut self, max: usize) -> usize {
        assert!(max > 0, "generate_below: empty range");
        let x = (self.generate() * max as f64).floor() as usize;
        // Rounding of the product can reach max for huge ranges.
        x.min(max - 1)
    }

    /// Standard normal draw (mean 0, standard deviation 1).
    pub fn normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1);
    // Never hand back the "pick one for me" value.
    nanos.max(1)
}
