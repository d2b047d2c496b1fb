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

//! Wall-clock measurement of ticks and setup phases.

use std::time::{Duration, Instant};

/// Measures wall-clock time from its creation or last [`lap`](Stopwatch::lap).
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts a new stopwatch.
    /// ## Returns
    /// A stopwatch measuring from now.
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since the start.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in whole microseconds.
    /// ## Arguments
    /// * `&self` - A reference to the Stopwatch instance.
    /// ## Returns
    /// The elapsed time in microseconds, truncated to a u64.
    #[inline]
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }

    /// Elapsed time in seconds.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Returns the elapsed time and restarts the stopwatch.
    /// ## Arguments
    /// * `&mut self` - The stopwatch to restart.
    /// ## Returns
    /// The time between the previous start (or lap) and now.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.start);
        self.start = now;
        elapsed
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_MS: u64 = 20;
    const MARGIN_MS: u64 = 500;

    #[test]
    fn elapsed_covers_a_sleep() {
        let watch = Stopwatch::start();
        thread::sleep(Duration::from_millis(SLEEP_MS));
        let elapsed = watch.elapsed();
        assert!(elapsed >= Duration::from_millis(SLEEP_MS));
        assert!(
            elapsed < Duration::from_millis(SLEEP_MS + MARGIN_MS),
            "elapsed ({elapsed:?}) should stay within the margin"
        );
        assert!(watch.elapsed_us() >= SLEEP_MS * 1000);
        assert!(watch.elapsed_secs_f64() >= SLEEP_MS as f64 / 1000.0);
    }

    #[test]
    fn lap_restarts() {
        let mut watch = Stopwatch::start();
        thread::sleep(Duration::from_millis(SLEEP_MS));
        let first = watch.lap();
        assert!(first >= Duration::from_millis(SLEEP_MS));
        assert!(watch.elapsed() < first);
    }
}
