//! Injectable uniform random source.
//!
//! The engine draws randomness in exactly two places: the affection/trust
//! variance in [`crate::impact`] and `random_chance` event conditions. Both
//! take a `&mut dyn UniformSource` so tests can substitute [`SequenceSource`].

use rand::Rng;
use rand::rngs::StdRng;

/// A source of uniform draws in `[0, 1)`.
pub trait UniformSource {
    /// Next draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl UniformSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

/// Deterministic source that replays a fixed sequence, cycling when exhausted.
///
/// An empty sequence always yields `0.5`, which makes the impact variance
/// factor exactly 1.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// Replay `values` in order. Values are clamped into `[0, 1)`.
    #[must_use]
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Source that always returns the same value.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }
}
