//! Base62 numeral encoding and random suffixes over the same alphabet.

use rand::Rng;

/// Digits, then lowercase, then uppercase. Index equals digit value.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = ALPHABET.len() as u64;

/// Encodes `num` most-significant digit first. `0` encodes to `"0"`.
pub fn encode(mut num: u64) -> String {
    if num == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while num > 0 {
        digits.push(ALPHABET[(num % BASE) as usize]);
        num /= BASE;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Reads `s` back as base-62 digits.
///
/// Returns `None` for empty input, characters outside [`ALPHABET`], or
/// values that overflow `u64`.
pub fn decode(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    s.bytes().try_fold(0u64, |acc, b| {
        let digit = ALPHABET.iter().position(|&c| c == b)? as u64;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

/// Draws `len` symbols uniformly from `alphabet`.
///
/// Randomness comes only from `rng`, so a seeded generator yields a fixed
/// sequence.
pub fn random_suffix<R: Rng>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }

    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode(0), "0");
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(1), "1");
        assert_eq!(encode(10), "a");
        assert_eq!(encode(36), "A");
        assert_eq!(encode(61), "Z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(63), "11");
        assert_eq!(encode(3843), "ZZ");
    }

    #[test]
    fn test_encode_max() {
        let encoded = encode(u64::MAX);
        assert_eq!(encoded, "lYGhA16ahyf");
        assert_eq!(decode(&encoded), Some(u64::MAX));
    }

    #[test]
    fn test_round_trip_non_zero() {
        let mut n: u64 = 1;
        while n < u64::MAX / 7 {
            assert_eq!(decode(&encode(n)), Some(n), "round trip failed for {n}");
            n = n * 7 + 3;
        }
    }

    #[test]
    fn test_encode_has_no_leading_zero() {
        for n in 1..5_000u64 {
            assert!(!encode(n).starts_with('0'));
        }
    }

    #[test]
    fn test_decode_rejects_foreign_characters() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("ab-c"), None);
        assert_eq!(decode("é"), None);
    }

    #[test]
    fn test_decode_overflow() {
        assert_eq!(decode("ZZZZZZZZZZZZ"), None);
    }

    #[test]
    fn test_random_suffix_length_and_charset() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [0, 1, 4, 16] {
            let suffix = random_suffix(&mut rng, ALPHABET, len);
            assert_eq!(suffix.len(), len);
            assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_random_suffix_is_deterministic_under_seed() {
        let a = random_suffix(&mut StdRng::seed_from_u64(7), ALPHABET, 8);
        let b = random_suffix(&mut StdRng::seed_from_u64(7), ALPHABET, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_suffix_custom_alphabet() {
        let mut rng = StdRng::seed_from_u64(1);
        let suffix = random_suffix(&mut rng, b"x", 5);
        assert_eq!(suffix, "xxxxx");
        assert_eq!(random_suffix(&mut rng, b"", 5), "");
    }
}
