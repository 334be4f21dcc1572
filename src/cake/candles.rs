//! Candle registry: the ordered set of candles stuck into the cake.
//!
//! Candles are only ever appended and toggled, never removed or reordered, so
//! a candle's identity is simply its index in the vector. Coordinates are
//! cosmetic (relative to the cake surface) and accepted without validation —
//! a candle stuck half off the cake still burns.

/// A single candle: fixed position, toggleable flame.
#[derive(Clone, Copy, Debug)]
pub struct Candle {
    pub x: f64,
    pub y: f64,
    pub lit: bool,
}

/// Insertion-ordered collection of candles.
#[derive(Default)]
pub struct CandleRegistry {
    candles: Vec<Candle>,
}

impl CandleRegistry {
    pub fn new() -> Self {
        Self {
            candles: Vec::new(),
        }
    }

    /// Append a new lit candle at (x, y) and return its index.
    pub fn add(&mut self, x: f64, y: f64) -> usize {
        self.candles.push(Candle { x, y, lit: true });
        self.candles.len() - 1
    }

    /// Relight every candle (used when the displayed age changes).
    pub fn relight_all(&mut self) {
        for c in &mut self.candles {
            c.lit = true;
        }
    }

    /// Put out the candle at `index`. Idempotent; out-of-range is ignored.
    pub fn extinguish(&mut self, index: usize) {
        if let Some(c) = self.candles.get_mut(index) {
            c.lit = false;
        }
    }

    /// Put out every candle at once (the click-off-cake gesture).
    pub fn extinguish_all(&mut self) {
        for c in &mut self.candles {
            c.lit = false;
        }
    }

    /// Number of candles still burning. Always recomputed, never cached.
    pub fn active_count(&self) -> usize {
        self.candles.iter().filter(|c| c.lit).count()
    }

    /// True iff the registry is non-empty and no candle is burning.
    /// An empty cake never counts as blown out.
    pub fn all_extinguished(&self) -> bool {
        !self.candles.is_empty() && self.candles.iter().all(|c| !c.lit)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    /// Indices of candles that are still lit (blow handling flips a coin per entry).
    pub fn lit_indices(&self) -> Vec<usize> {
        self.candles
            .iter()
            .enumerate()
            .filter(|(_, c)| c.lit)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }
}
