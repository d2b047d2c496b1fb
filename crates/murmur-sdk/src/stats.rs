// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tick timing statistics.

use std::fmt;
use std::time::Duration;

/// Running statistics over the ticks of one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks that committed.
    pub completed: u64,
    /// Ticks that failed and were rolled back.
    pub failed: u64,
    /// Duration of the last committed tick.
    pub last: Duration,
    /// Longest committed tick.
    pub max: Duration,
    total: Duration,
}

impl TickStats {
    /// Records a committed tick that took `elapsed`.
    pub fn record_success(&mut self, elapsed: Duration) {
        self.completed += 1;
        self.last = elapsed;
        self.max = self.max.max(elapsed);
        self.total += elapsed;
    }

    /// Records a failed tick.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Mean duration of committed ticks, zero before the first one.
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.completed) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.completed as f64),
        }
    }
}

impl fmt::Display for TickStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks ({} failed), last {:.3} ms, mean {:.3} ms, max {:.3} ms",
            self.completed,
            self.failed,
            self.last.as_secs_f64() * 1e3,
            self.mean().as_secs_f64() * 1e3,
            self.max.as_secs_f64() * 1e3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_max_track_committed_ticks() {
        let mut stats = TickStats::default();
        assert_eq!(stats.mean(), Duration::ZERO);
        stats.record_success(Duration::from_millis(2));
        stats.record_success(Duration::from_millis(4));
        stats.record_failure();
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.mean(), Duration::from_millis(3));
        assert_eq!(stats.max, Duration::from_millis(4));
        assert_eq!(stats.last, Duration::from_millis(4));
    }
}
