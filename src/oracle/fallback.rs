//! Fixed pools of canned answers

use rand::Rng;

/// Short answers the client shows when the endpoint cannot be reached
pub const CLIENT_FALLBACKS: FallbackPool = FallbackPool::new(&[
    "The cosmic forces are unclear... Try again.",
    "The spirits whisper of uncertainty.",
    "The oracle's vision is clouded...",
    "Ask again when the stars align.",
    "The mystical energies are in flux.",
]);

/// Answers the server gives when Gemini is unavailable
pub const ORACLE_FALLBACKS: FallbackPool = FallbackPool::new(&[
    "The cosmic winds carry whispers of great fortune approaching your path...",
    "Ancient spirits see transformation blooming within your soul's garden...",
    "The universe aligns to reveal hidden treasures in unexpected places...",
    "Your destiny dances with the stars, weaving magic into mundane moments...",
    "Celestial energies conspire to open doors you never knew existed...",
    "The oracle sees courage growing like wildfire in your spirit...",
    "Mystical forces gather to support your heart's truest intentions...",
    "The wheel of fate turns in your favor, guided by inner wisdom...",
    "Sacred geometry of success forms around your determined efforts...",
    "The moon's ancient wisdom whispers: 'Trust your intuitive knowing...'",
    "Ethereal guardians smile upon your journey's unfolding chapters...",
    "The crystal sphere reveals clarity emerging from life's beautiful chaos...",
    "Stardust memories of future joy sparkle in tomorrow's embrace...",
    "The mystical realm opens portals to your greatest potential...",
    "Divine synchronicities align to manifest your deepest dreams...",
]);

/// A non-empty list of answers with seeded selection
#[derive(Debug, Clone, Copy)]
pub struct FallbackPool {
    entries: &'static [&'static str],
}

impl FallbackPool {
    pub const fn new(entries: &'static [&'static str]) -> Self {
        assert!(!entries.is_empty(), "fallback pool must not be empty");
        Self { entries }
    }

    /// Index of the next pick; same RNG state gives the same index
    pub fn pick_index<R: Rng>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.entries.len())
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> &'static str {
        self.entries[self.pick_index(rng)]
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().copied()
    }
}
