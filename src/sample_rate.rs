//! Sampling-rate tracking for the acquisition side.
//!
//! [`SampleTracker`] is an explicit, caller-owned object: it never reads a
//! clock, every method takes the current time in milliseconds. It keeps a
//! fixed-size timeline of trigger bins (which recent time slots received a
//! sample) and the sample times of the trailing second.

use std::collections::VecDeque;

use crate::error::{Result, TraceError};

/// Width of the samples-per-second window.
pub const SPS_WINDOW_MS: i64 = 1000;

/// Bounded timeline of recent sampling activity.
#[derive(Debug, Clone)]
pub struct SampleTracker {
    bin_size_ms: i64,
    bins: VecDeque<bool>,
    /// Start time of `bins[0]`, set by the first sample
    timeline_start_ms: Option<i64>,
    recent: VecDeque<i64>,
    last_sample_ms: Option<i64>,
}

impl Default for SampleTracker {
    fn default() -> Self {
        Self {
            bin_size_ms: 100,
            bins: VecDeque::from(vec![false; 50]),
            timeline_start_ms: None,
            recent: VecDeque::new(),
            last_sample_ms: None,
        }
    }
}

impl SampleTracker {
    /// Create a tracker with `window_ms / bin_size_ms` bins.
    pub fn new(bin_size_ms: i64, window_ms: i64) -> Result<Self> {
        if bin_size_ms <= 0 {
            return Err(TraceError::invalid(
                "bin_size_ms",
                bin_size_ms,
                "must be greater than zero",
            ));
        }
        if window_ms < bin_size_ms {
            return Err(TraceError::invalid(
                "window_ms",
                window_ms,
                "must cover at least one bin",
            ));
        }
        let bin_count = (window_ms / bin_size_ms) as usize;
        Ok(Self {
            bin_size_ms,
            bins: VecDeque::from(vec![false; bin_count]),
            timeline_start_ms: None,
            recent: VecDeque::new(),
            last_sample_ms: None,
        })
    }

    /// Whether a new sample is due at `now_ms` for the given interval.
    ///
    /// An interval of 0 samples every call; the first call always samples.
    pub fn should_sample(&self, now_ms: i64, interval_ms: i64) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(_) if interval_ms <= 0 => true,
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        }
    }

    /// Record a sample taken at `now_ms`.
    pub fn record(&mut self, now_ms: i64) {
        self.last_sample_ms = Some(now_ms);
        self.mark_bin(now_ms);

        self.recent.push_back(now_ms);
        while self
            .recent
            .front()
            .is_some_and(|&t| now_ms.saturating_sub(t) > SPS_WINDOW_MS)
        {
            self.recent.pop_front();
        }
    }

    fn mark_bin(&mut self, now_ms: i64) {
        let bin_count = self.bins.len() as i64;
        let start = *self.timeline_start_ms.get_or_insert(now_ms);
        if now_ms < start {
            return;
        }

        let offset = now_ms.saturating_sub(start) / self.bin_size_ms;
        if offset >= bin_count {
            let shift = offset - bin_count + 1;
            if shift >= bin_count {
                self.bins.iter_mut().for_each(|b| *b = false);
            } else {
                for _ in 0..shift {
                    self.bins.pop_front();
                    self.bins.push_back(false);
                }
            }
            self.timeline_start_ms = Some(start.saturating_add(shift.saturating_mul(self.bin_size_ms)));
        }

        let start = self.timeline_start_ms.unwrap_or(now_ms);
        let bin = (now_ms.saturating_sub(start) / self.bin_size_ms) as usize;
        if let Some(slot) = self.bins.get_mut(bin) {
            *slot = true;
        }
    }

    /// Samples recorded in the trailing second.
    pub fn samples_per_second(&self) -> usize {
        self.recent.len()
    }

    /// Milliseconds since the last sample, `None` before the first.
    pub fn last_sample_age_ms(&self, now_ms: i64) -> Option<i64> {
        self.last_sample_ms.map(|t| now_ms.saturating_sub(t))
    }

    pub fn last_sample_ms(&self) -> Option<i64> {
        self.last_sample_ms
    }

    /// Trigger bins, oldest first.
    pub fn bins(&self) -> Vec<bool> {
        self.bins.iter().copied().collect()
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}
