//! Streaming loudness accumulator (EBU R128 / ITU-R BS.1770-4).
//!
//! Consumes one K-weighted block energy per call and keeps:
//! - a momentary FIFO spanning 400 ms,
//! - a short-term FIFO spanning 3 s,
//! - a gated (sum, count) pair for integrated loudness,
//! - a bounded history of short-term energies for loudness range.
//!
//! Gating is causal: a block is admitted to the integrated sum when the
//! short-term loudness at the moment it arrives clears both the absolute gate
//! and the relative gate. This is a streaming approximation of the two-pass
//! BS.1770 algorithm and is not bit-exact with it; see
//! [`analyze_loudness`](super::analyze_loudness) for the two-pass reference.

use super::math::energy_to_lufs;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MOMENTARY_WINDOW_SECS: f64 = 0.4;
pub const SHORT_TERM_WINDOW_SECS: f64 = 3.0;
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;
pub const RELATIVE_GATE_LU: f64 = -10.0;
pub const LRA_RELATIVE_GATE_LU: f64 = -20.0;
pub const LRA_MIN_ENTRIES: usize = 15;
pub const LRA_LOW_PERCENTILE: f64 = 0.10;
pub const LRA_HIGH_PERCENTILE: f64 = 0.95;

/// Loudness readings in LUFS / LU.
///
/// Levels with no data behind them read negative infinity. `range` is `None`
/// while fewer than [`LRA_MIN_ENTRIES`] history entries qualify.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessReadings {
    pub momentary: f64,
    pub short_term: f64,
    pub integrated: f64,
    pub range: Option<f64>,
}

impl Default for LoudnessReadings {
    fn default() -> Self {
        Self {
            momentary: f64::NEG_INFINITY,
            short_term: f64::NEG_INFINITY,
            integrated: f64::NEG_INFINITY,
            range: None,
        }
    }
}

/// Running (sum, count) of block energies.
#[derive(Debug, Clone, Copy, Default)]
struct EnergySum {
    sum: f64,
    count: u64,
}

impl EnergySum {
    #[inline]
    fn add(&mut self, energy: f64) {
        self.sum += energy;
        self.count += 1;
    }

    #[inline]
    fn lufs(&self) -> f64 {
        if self.count == 0 {
            f64::NEG_INFINITY
        } else {
            energy_to_lufs(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoudnessAccumulator {
    momentary: VecDeque<f64>,
    short_term: VecDeque<f64>,
    history: VecDeque<f64>,
    momentary_len: usize,
    short_term_len: usize,
    history_len: usize,
    /// Blocks whose short-term loudness cleared the absolute gate.
    abs_gated: EnergySum,
    /// Blocks that cleared both gates.
    integrated: EnergySum,
}

impl LoudnessAccumulator {
    pub fn new(block_duration_secs: f64, history_len: usize) -> Self {
        let momentary_len = window_blocks(MOMENTARY_WINDOW_SECS, block_duration_secs);
        let short_term_len = window_blocks(SHORT_TERM_WINDOW_SECS, block_duration_secs);
        let history_len = history_len.max(LRA_MIN_ENTRIES);

        Self {
            momentary: VecDeque::with_capacity(momentary_len + 1),
            short_term: VecDeque::with_capacity(short_term_len + 1),
            history: VecDeque::with_capacity(history_len + 1),
            momentary_len,
            short_term_len,
            history_len,
            abs_gated: EnergySum::default(),
            integrated: EnergySum::default(),
        }
    }

    /// Equal-weight stereo energy: the average of both channels' mean square.
    pub fn block_energy(left: &[f32], right: &[f32]) -> f64 {
        0.5 * (super::math::mean_square(left) + super::math::mean_square(right))
    }

    pub fn push(&mut self, energy: f64) {
        self.momentary.push_back(energy);
        while self.momentary.len() > self.momentary_len {
            self.momentary.pop_front();
        }

        self.short_term.push_back(energy);
        while self.short_term.len() > self.short_term_len {
            // The window is full: record the short-term energy it held as a
            // history sample before the oldest block leaves.
            let window_energy = mean(&self.short_term);
            self.short_term.pop_front();
            self.history.push_back(window_energy);
            while self.history.len() > self.history_len {
                self.history.pop_front();
            }
        }

        let short_term_lufs = energy_to_lufs(mean(&self.short_term));
        if short_term_lufs < ABSOLUTE_GATE_LUFS {
            return;
        }
        self.abs_gated.add(energy);

        let relative_gate = self.abs_gated.lufs() + RELATIVE_GATE_LU;
        if short_term_lufs >= relative_gate.max(ABSOLUTE_GATE_LUFS) {
            self.integrated.add(energy);
        }
    }

    pub fn momentary(&self) -> f64 {
        window_lufs(&self.momentary)
    }

    pub fn short_term(&self) -> f64 {
        window_lufs(&self.short_term)
    }

    pub fn integrated(&self) -> f64 {
        self.integrated.lufs()
    }

    /// Loudness range in LU, `None` while history is insufficient.
    pub fn loudness_range(&self) -> Option<f64> {
        if self.history.len() < LRA_MIN_ENTRIES {
            return None;
        }

        let floor = self.integrated() + LRA_RELATIVE_GATE_LU;
        let mut gated: Vec<f64> = self
            .history
            .iter()
            .map(|&e| energy_to_lufs(e))
            .filter(|&lufs| lufs > floor)
            .collect();
        if gated.len() < LRA_MIN_ENTRIES {
            return None;
        }

        gated.sort_by(f64::total_cmp);
        let low = gated[percentile_index(gated.len(), LRA_LOW_PERCENTILE)];
        let high = gated[percentile_index(gated.len(), LRA_HIGH_PERCENTILE)];
        Some((high - low).max(0.0))
    }

    pub fn readings(&self) -> LoudnessReadings {
        LoudnessReadings {
            momentary: self.momentary(),
            short_term: self.short_term(),
            integrated: self.integrated(),
            range: self.loudness_range(),
        }
    }

    pub fn momentary_len(&self) -> usize {
        self.momentary_len
    }

    pub fn short_term_len(&self) -> usize {
        self.short_term_len
    }

    pub fn history_entries(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.momentary.clear();
        self.short_term.clear();
        self.history.clear();
        self.abs_gated = EnergySum::default();
        self.integrated = EnergySum::default();
    }
}

/// Number of blocks spanning `window_secs`, at least one.
fn window_blocks(window_secs: f64, block_duration_secs: f64) -> usize {
    ((window_secs / block_duration_secs).round() as usize).max(1)
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn window_lufs(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        f64::NEG_INFINITY
    } else {
        energy_to_lufs(mean(values))
    }
}

#[inline]
fn percentile_index(len: usize, p: f64) -> usize {
    ((len as f64 * p).floor() as usize).min(len - 1)
}
