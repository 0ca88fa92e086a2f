//! Tracking pixels and the generated pixel name suggestion.

use std::fmt;

use rand::Rng;
use serde::Serialize;

const NAME_PREFIX: &str = "PX-";
const NAME_SUFFIX_LEN: usize = 8;
const NAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Third-party tracking identifier attributing conversion events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pixel {
    /// Numeric platform identifier.
    pub pixel_id: String,
    /// Code embedded in web pages and used as the event source id.
    pub pixel_code: String,
    /// Human-readable name.
    pub pixel_name: String,
}

impl Pixel {
    /// Convenience constructor.
    pub fn new(
        pixel_id: impl Into<String>,
        pixel_code: impl Into<String>,
        pixel_name: impl Into<String>,
    ) -> Self {
        Self {
            pixel_id: pixel_id.into(),
            pixel_code: pixel_code.into(),
            pixel_name: pixel_name.into(),
        }
    }
}

/// Merge `created` into a known pixel list, replacing any entry with the
/// same code.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::{Pixel, merge_pixel};
///
/// let known = vec![Pixel::new("1", "C1", "first")];
/// let merged = merge_pixel(known, Pixel::new("2", "C2", "second"));
/// assert_eq!(merged.len(), 2);
/// ```
pub fn merge_pixel(mut pixels: Vec<Pixel>, created: Pixel) -> Vec<Pixel> {
    match pixels
        .iter_mut()
        .find(|pixel| pixel.pixel_code == created.pixel_code)
    {
        Some(existing) => *existing = created,
        None => pixels.push(created),
    }
    pixels
}

/// Pixel name suggested once per session, `PX-` followed by eight
/// characters from `[A-Z0-9]`.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::PixelName;
///
/// let name = PixelName::generate();
/// assert!(name.as_str().starts_with("PX-"));
/// assert_eq!(name.as_str().len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelName(String);

impl PixelName {
    /// Generate a suggestion using the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a suggestion from the supplied RNG.
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        let suffix: String = (0..NAME_SUFFIX_LEN)
            .filter_map(|_| NAME_ALPHABET.get(rng.gen_range(0..NAME_ALPHABET.len())))
            .map(|byte| char::from(*byte))
            .collect();
        Self(format!("{NAME_PREFIX}{suffix}"))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PixelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
