use crate::generator::Generator;
use burrow_core::shortcode::{ALPHABET, GENERATED_LENGTH};
use burrow_core::ShortCode;
use rand::{CryptoRng, Rng};

/// Draws [`GENERATED_LENGTH`] symbols uniformly from the 62-symbol alphabet.
///
/// Every symbol is sampled with `random_range`, which rejects out-of-zone
/// values instead of reducing modulo 62, so no symbol is favoured. Only
/// cryptographically secure RNGs are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    /// Generates a code from the given RNG.
    pub fn generate_with<R: CryptoRng>(&self, rng: &mut R) -> ShortCode {
        let code: String = (0..GENERATED_LENGTH)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();
        ShortCode::new_unchecked(code)
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        self.generate_with(&mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_have_fixed_length_and_alphabet() {
        let generator = RandomGenerator;

        for _ in 0..1_000 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 7);
            assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn seeded_codes_are_never_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = RandomGenerator.generate_with(&mut rng);
            assert_eq!(code.as_str().len(), GENERATED_LENGTH);
        }
    }

    #[test]
    fn consecutive_codes_differ() {
        let generator = RandomGenerator;
        let codes: std::collections::HashSet<_> =
            (0..1_000).map(|_| generator.generate()).collect();
        // 62^7 possibilities; a repeat in 1000 draws would point at a broken RNG
        assert_eq!(codes.len(), 1_000);
    }

    #[test]
    fn symbol_distribution_is_uniform() {
        let generator = RandomGenerator;
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut counts = [0_u64; 62];

        let draws = 20_000;
        for _ in 0..draws {
            for b in generator.generate_with(&mut rng).as_str().bytes() {
                let index = ALPHABET.iter().position(|&a| a == b).unwrap();
                counts[index] += 1;
            }
        }

        let total = (draws * GENERATED_LENGTH) as f64;
        let expected = total / 62.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        assert!(counts.iter().all(|&c| c > 0));
        // 61 degrees of freedom; 150 is far beyond the 99.99th percentile
        assert!(chi_square < 150.0, "chi-square too large: {chi_square}");
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
