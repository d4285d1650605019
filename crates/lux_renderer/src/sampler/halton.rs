//! Radical inverses in prime bases, plain and scrambled.

use super::hash::{hash_values, mix_bits, permutation_element};

pub const PRIMES: [u32; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

const ONE_MINUS_EPSILON_F64: f64 = 1.0 - f64::EPSILON / 2.0;

/// Largest `n` with `base^n <= u64::MAX`, so `n` reversed digits always fit.
fn max_u64_digits(base: u64) -> usize {
    let mut capacity = 1u64;
    let mut n_digits = 0;
    while let Some(next) = capacity.checked_mul(base) {
        capacity = next;
        n_digits += 1;
    }
    n_digits
}

/// Mirrors the base `PRIMES[base_index]` digits of `a` about the radix point.
pub fn radical_inverse(base_index: usize, mut a: u64) -> f64 {
    let base = PRIMES[base_index] as u64;
    let inv_base = 1.0 / base as f64;
    let mut inv_base_m = 1.0;
    let mut reversed = 0u64;
    let limit = u64::MAX / base - base;
    while a != 0 && reversed < limit {
        let next = a / base;
        let digit = a - next * base;
        reversed = reversed * base + digit;
        inv_base_m *= inv_base;
        a = next;
    }
    (reversed as f64 * inv_base_m).min(ONE_MINUS_EPSILON_F64)
}

/// Fixed random permutations of every digit position for one base.
#[derive(Clone, Debug)]
pub struct DigitPermutation {
    base: u32,
    n_digits: usize,
    permutations: Vec<u16>,
}

impl DigitPermutation {
    pub fn new(base: u32, seed: u64) -> Self {
        let inv_base = 1.0 / base as f64;
        let mut inv_base_m = 1.0;
        let max_digits = max_u64_digits(base as u64);
        let mut n_digits = 0;
        while n_digits < max_digits && 1.0 - (base - 1) as f64 * inv_base_m < 1.0 {
            n_digits += 1;
            inv_base_m *= inv_base;
        }

        let mut permutations = Vec::with_capacity(n_digits * base as usize);
        for digit_index in 0..n_digits {
            let digit_seed = hash_values(&[base as u64, digit_index as u64, seed]) as u32;
            for digit_value in 0..base {
                permutations.push(permutation_element(digit_value, base, digit_seed) as u16);
            }
        }

        Self {
            base,
            n_digits,
            permutations,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn digit_count(&self) -> usize {
        self.n_digits
    }

    #[inline]
    pub fn permute(&self, digit_index: usize, digit_value: u32) -> u32 {
        self.permutations[digit_index * self.base as usize + digit_value as usize] as u32
    }
}

/// One permutation table per prime base.
pub fn compute_radical_inverse_permutations(seed: u64) -> Vec<DigitPermutation> {
    PRIMES.iter().map(|&base| DigitPermutation::new(base, seed)).collect()
}

/// Radical inverse with each digit passed through a fixed permutation.
pub fn scrambled_radical_inverse(base_index: usize, mut a: u64, perm: &DigitPermutation) -> f64 {
    let base = PRIMES[base_index] as u64;
    let inv_base = 1.0 / base as f64;
    let mut inv_base_m = 1.0;
    let mut reversed = 0u64;
    let mut digit_index = 0;
    while digit_index < perm.digit_count() {
        let next = a / base;
        let digit = (a - next * base) as u32;
        reversed = reversed * base + perm.permute(digit_index, digit) as u64;
        inv_base_m *= inv_base;
        digit_index += 1;
        a = next;
    }
    (reversed as f64 * inv_base_m).min(ONE_MINUS_EPSILON_F64)
}

/// Radical inverse with nested random digit permutations (Owen scrambling).
pub fn owen_scrambled_radical_inverse(base_index: usize, mut a: u64, hash: u32) -> f64 {
    let base = PRIMES[base_index] as u64;
    let inv_base = 1.0 / base as f64;
    let mut inv_base_m = 1.0;
    let mut reversed = 0u64;
    let max_digits = max_u64_digits(base);
    let mut digit_index = 0;
    while digit_index < max_digits && 1.0 - inv_base_m < 1.0 {
        let next = a / base;
        let digit = (a - next * base) as u32;
        let digit_hash = mix_bits((hash ^ reversed as u32) as u64) as u32;
        let digit = permutation_element(digit, base as u32, digit_hash);
        reversed = reversed * base + digit as u64;
        inv_base_m *= inv_base;
        digit_index += 1;
        a = next;
    }
    (reversed as f64 * inv_base_m).min(ONE_MINUS_EPSILON_F64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_two_bit_reversal() {
        assert_eq!(radical_inverse(0, 0), 0.0);
        assert_eq!(radical_inverse(0, 1), 0.5);
        assert_eq!(radical_inverse(0, 2), 0.25);
        assert_eq!(radical_inverse(0, 3), 0.75);
        assert_eq!(radical_inverse(0, 4), 0.125);
    }

    #[test]
    fn test_base_three() {
        assert!((radical_inverse(1, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((radical_inverse(1, 2) - 2.0 / 3.0).abs() < 1e-12);
        assert!((radical_inverse(1, 3) - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_scrambled_values_stay_in_unit_interval() {
        let perms = compute_radical_inverse_permutations(7);
        assert_eq!(perms.len(), PRIMES.len());
        for dim in [0, 1, 5, 63] {
            for a in 0..200 {
                let x = scrambled_radical_inverse(dim, a, &perms[dim]);
                assert!((0.0..1.0).contains(&x));
                let y = owen_scrambled_radical_inverse(dim, a, 0x1234_5678);
                assert!((0.0..1.0).contains(&y));
            }
        }
    }

    #[test]
    fn test_digit_counts_fit_in_u64() {
        assert_eq!(max_u64_digits(2), 63);
        assert_eq!(max_u64_digits(61), 10);
        let perms = compute_radical_inverse_permutations(3);
        for (perm, &base) in perms.iter().zip(PRIMES.iter()) {
            assert!((base as u64).checked_pow(perm.digit_count() as u32).is_some(), "base {base}");
        }
    }

    #[test]
    fn test_every_base_scrambles_large_indices() {
        let perms = compute_radical_inverse_permutations(11);
        for dim in 0..PRIMES.len() {
            for a in [0, 1, 87, 4095, 1 << 20, u32::MAX as u64, u64::MAX / 3] {
                let x = scrambled_radical_inverse(dim, a, &perms[dim]);
                assert!((0.0..1.0).contains(&x), "base {} index {a}", PRIMES[dim]);
                let y = owen_scrambled_radical_inverse(dim, a, 0x9e37_79b9);
                assert!((0.0..1.0).contains(&y), "base {} index {a}", PRIMES[dim]);
            }
        }
    }

    #[test]
    fn test_owen_scrambling_keeps_strata() {
        // Each block of 2^k points still hits every dyadic interval of size 2^-k once.
        let mut hits = [0u32; 16];
        for a in 0..16 {
            let x = owen_scrambled_radical_inverse(0, a, 0xabcd_ef01);
            hits[(x * 16.0) as usize] += 1;
        }
        assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
    }

    #[test]
    fn test_permuted_digits_keep_strata() {
        let perm = DigitPermutation::new(3, 99);
        let mut hits = [0u32; 9];
        for a in 0..9 {
            let x = scrambled_radical_inverse(1, a, &perm);
            hits[(x * 9.0) as usize] += 1;
        }
        assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
    }
}
