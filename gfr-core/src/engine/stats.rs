//! Running RPM statistics for watch mode
//!
//! One accumulator per channel, created when watch mode starts and fed
//! every emitted sample. Nothing is ever reset while the run lasts.

use serde::Serialize;

/// Min/max/sum/count of the RPM values seen on one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RpmStats {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
}

impl RpmStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, rpm: f64) {
        if self.count == 0 {
            self.min = rpm;
            self.max = rpm;
        } else {
            self.min = self.min.min(rpm);
            self.max = self.max.max(rpm);
        }
        self.sum += rpm;
        self.count += 1;
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of all samples, 0.0 before the first one
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}

/// Per-channel statistics indexed like the measurement plan
#[derive(Debug, Clone)]
pub struct StatsTracker {
    channels: Vec<RpmStats>,
}

impl StatsTracker {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: vec![RpmStats::new(); channels],
        }
    }

    /// Fold a sample into the channel's accumulator and return the new totals
    pub fn update(&mut self, index: usize, rpm: f64) -> RpmStats {
        let stats = &mut self.channels[index];
        stats.update(rpm);
        *stats
    }

    pub fn get(&self, index: usize) -> Option<&RpmStats> {
        self.channels.get(index)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let s = RpmStats::new();
        assert_eq!(s.count(), 0);
        assert_eq!(s.average(), 0.0);
    }

    #[test]
    fn test_min_max_avg() {
        let mut s = RpmStats::new();
        for v in [800.0, 900.0, 1000.0] {
            s.update(v);
        }
        assert_eq!(s.min(), 800.0);
        assert_eq!(s.max(), 1000.0);
        assert_eq!(s.average(), 900.0);
        assert_eq!(s.count(), 3);
    }

    #[test]
    fn test_first_sample_sets_both_bounds() {
        let mut s = RpmStats::new();
        s.update(1234.0);
        assert_eq!(s.min(), 1234.0);
        assert_eq!(s.max(), 1234.0);
    }

    #[test]
    fn test_zero_after_nonzero_lowers_min() {
        let mut s = RpmStats::new();
        s.update(500.0);
        s.update(0.0);
        assert_eq!(s.min(), 0.0);
        assert_eq!(s.max(), 500.0);
        assert_eq!(s.average(), 250.0);
    }

    #[test]
    fn test_tracker_keeps_channels_apart() {
        let mut t = StatsTracker::new(2);
        t.update(0, 100.0);
        t.update(1, 2000.0);
        let s0 = t.update(0, 300.0);
        assert_eq!(s0.average(), 200.0);
        assert_eq!(t.get(1).unwrap().count(), 1);
        assert!(t.get(2).is_none());
        assert_eq!(t.len(), 2);
    }
}
