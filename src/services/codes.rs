//! Game-code generation and format validation.
//!
//! Codes combine a festive prefix with a short random alphanumeric suffix
//! (`SANTA42`, `XMAS7K`, `GIFT9Z2`). They are stored uppercase and matched
//! case-insensitively on input.

use rand::{Rng, seq::IndexedRandom};

/// Prefixes used when the configuration does not override them.
pub const DEFAULT_PREFIXES: &[&str] = &["SANTA", "XMAS", "GIFT", "SNOW", "JOLLY", "MERRY"];

/// Alphabet of the random suffix.
const SUFFIX_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Shortest allowed suffix.
pub const MIN_SUFFIX_LENGTH: usize = 2;
/// Longest allowed suffix.
pub const MAX_SUFFIX_LENGTH: usize = 4;

/// Upper bound on uniqueness retries before the allocation is treated as an
/// operational failure.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 100;

/// Normalise a user-supplied code: trim surrounding whitespace and fold to
/// uppercase so lookups are case-insensitive.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Generate a candidate code using the thread-local RNG.
///
/// `suffix_length` of `None` picks a random length between
/// [`MIN_SUFFIX_LENGTH`] and [`MAX_SUFFIX_LENGTH`]; explicit values are
/// clamped into the same range. Uniqueness is the caller's concern.
pub fn generate(prefixes: &[String], suffix_length: Option<usize>) -> String {
    generate_with(&mut rand::rng(), prefixes, suffix_length)
}

/// RNG-injected variant of [`generate`].
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    prefixes: &[String],
    suffix_length: Option<usize>,
) -> String {
    let prefix = prefixes
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(DEFAULT_PREFIXES[0]);

    let length = match suffix_length {
        Some(len) => len.clamp(MIN_SUFFIX_LENGTH, MAX_SUFFIX_LENGTH),
        None => rng.random_range(MIN_SUFFIX_LENGTH..=MAX_SUFFIX_LENGTH),
    };

    let mut code = String::with_capacity(prefix.len() + length);
    code.push_str(prefix);
    for _ in 0..length {
        let byte = *SUFFIX_CHARS.choose(rng).unwrap_or(&b'0');
        code.push(byte as char);
    }
    code
}

/// Check whether a string plausibly is a game code: a known prefix followed
/// by a suffix of allowed characters and length. The overall length bound
/// follows from each prefix, so configured prefixes of any length pass the
/// check for exactly the codes [`generate`] produces. Intended for the
/// transport layer to reject garbage before a storage lookup.
pub fn matches_format(code: &str, prefixes: &[String]) -> bool {
    let code = normalize(code);

    prefixes.iter().any(|prefix| {
        code.strip_prefix(prefix.as_str()).is_some_and(|suffix| {
            (MIN_SUFFIX_LENGTH..=MAX_SUFFIX_LENGTH).contains(&suffix.len())
                && suffix.bytes().all(|byte| SUFFIX_CHARS.contains(&byte))
        })
    })
}
