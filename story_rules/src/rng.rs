//! Seeded pseudo-random streams.
//!
//! A stream is keyed by a string: the key is folded into a 32-bit state with
//! an order-sensitive avalanche hash, then a 32-bit mixer produces floats in
//! `[0, 1)`. The same key always yields the same sequence, which is what
//! makes replays reproducible.

/// Deterministic float stream derived from a string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRng {
    state: u32,
}

impl StoryRng {
    /// Create a stream from any string key, including the empty string.
    pub fn from_key(key: &str) -> Self {
        Self {
            state: hash_key(key),
        }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Draw once and report whether it landed under `chance`.
    pub fn chance(&mut self, chance: f64) -> bool {
        self.next_float() < chance
    }
}

impl Iterator for StoryRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_float())
    }
}

/// Fold a key into 32 bits. Operates on UTF-16 code units so keys hash the
/// same regardless of how non-ASCII text is stored.
fn hash_key(key: &str) -> u32 {
    let units: Vec<u16> = key.encode_utf16().collect();
    let mut h = 1_779_033_703u32 ^ units.len() as u32;
    for unit in units {
        h = (h ^ unit as u32).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}
