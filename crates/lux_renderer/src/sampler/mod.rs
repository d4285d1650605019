//! Low-discrepancy sample generation.
//!
//! A [`Sampler`] walks the Halton sequence one dimension at a time. Each
//! render worker owns its own instance and passes it by `&mut` into every
//! call that consumes random numbers, so results depend only on
//! `(pixel, sample, dimension)` and never on thread scheduling. The first
//! [`PRIMES`]`.len()` dimensions are low-discrepancy; deeper ones are hashed.

mod halton;
mod hash;

pub use halton::{
    compute_radical_inverse_permutations, owen_scrambled_radical_inverse, radical_inverse,
    scrambled_radical_inverse, DigitPermutation, PRIMES,
};
pub use hash::{hash_to_unit, hash_values, mix_bits, murmur_hash64a, permutation_element};

use std::sync::Arc;

use lux_core::SamplerStrategy;
use lux_math::sampling::ONE_MINUS_EPSILON;
use lux_math::Vec2;

#[derive(Clone, Debug)]
pub struct Sampler {
    strategy: SamplerStrategy,
    seed: u64,
    samples_per_pixel: u64,
    index: u64,
    dimension: usize,
    permutations: Option<Arc<[DigitPermutation]>>,
}

impl Sampler {
    pub fn new(strategy: SamplerStrategy, samples_per_pixel: u32, seed: u64) -> Self {
        let permutations = match strategy {
            SamplerStrategy::PermuteDigits => Some(compute_radical_inverse_permutations(seed).into()),
            _ => None,
        };
        Self {
            strategy,
            seed,
            samples_per_pixel: samples_per_pixel.max(1) as u64,
            index: 0,
            dimension: 0,
            permutations,
        }
    }

    pub fn strategy(&self) -> SamplerStrategy {
        self.strategy
    }

    pub fn sample_index(&self) -> u64 {
        self.index
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Moves to the next point of the sequence.
    pub fn start_sample(&mut self) {
        self.index += 1;
        self.dimension = 0;
    }

    /// Jumps to sample `sample_index` of pixel `pixel_index`. Pixels own
    /// consecutive runs of the sequence.
    pub fn start_pixel_sample(&mut self, pixel_index: u64, sample_index: u64) {
        self.index = pixel_index * self.samples_per_pixel + sample_index;
        self.dimension = 0;
    }

    pub fn get_1d(&mut self) -> f32 {
        let dim = self.dimension;
        self.dimension += 1;
        self.sample_dimension(dim)
    }

    pub fn get_2d(&mut self) -> Vec2 {
        let x = self.get_1d();
        let y = self.get_1d();
        Vec2::new(x, y)
    }

    /// Dimensions past the prime table are hashed from `(index, dim, seed)`
    /// instead of wrapping around to a base already in use.
    fn sample_dimension(&self, dim: usize) -> f32 {
        if dim >= PRIMES.len() {
            return hash_to_unit(hash_values(&[self.index, dim as u64, self.seed])).min(ONE_MINUS_EPSILON);
        }
        let base_index = dim;
        let value = match (self.strategy, &self.permutations) {
            (SamplerStrategy::None, _) => radical_inverse(base_index, self.index),
            (SamplerStrategy::PermuteDigits, Some(perms)) => {
                scrambled_radical_inverse(base_index, self.index, &perms[base_index])
            }
            (SamplerStrategy::PermuteDigits, None) => radical_inverse(base_index, self.index),
            (SamplerStrategy::Owen, _) => {
                let hash = mix_bits(self.seed ^ (1 + ((dim as u64) << 4))) as u32;
                owen_scrambled_radical_inverse(base_index, self.index, hash)
            }
        };
        (value as f32).min(ONE_MINUS_EPSILON)
    }
}
