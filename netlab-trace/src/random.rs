//! Pluggable randomness for loss simulation.
//!
//! Real links drop frames and ACKs.  Experiments model that by drawing one
//! uniform value per affected unit from a [`RandomSource`] and comparing it
//! with a configured loss probability:
//!
//! | Source             | Draws                                      |
//! |--------------------|--------------------------------------------|
//! | [`SeededRandom`]   | `StdRng`, seeded or from OS entropy        |
//! | [`FixedRandom`]    | the same value forever                     |
//! | [`ScriptedRandom`] | a queue of values, then a fallback value   |
//!
//! The engine never touches ambient randomness, so a trace is reproducible
//! whenever the source is.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    /// Next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// `true` when a unit with loss probability `p` is lost.
///
/// Degenerate probabilities are decided without consuming a draw, so a
/// `0.0` or `1.0` configuration behaves identically under any source.
pub fn draw_loss(rng: &mut dyn RandomSource, p: f64) -> bool {
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    rng.next_f64() < p
}

// ---------------------------------------------------------------------------
// SeededRandom
// ---------------------------------------------------------------------------

/// `StdRng`-backed source.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Reproducible source: the same seed always yields the same draws.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Non-reproducible source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

// ---------------------------------------------------------------------------
// Deterministic sources
// ---------------------------------------------------------------------------

/// Returns the same value on every draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Replays a fixed sequence of draws, then repeats `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
    consumed: usize,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
            consumed: 0,
        }
    }

    /// Number of draws handed out so far (scripted or fallback).
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.consumed += 1;
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
