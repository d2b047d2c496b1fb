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

//! Scripted device failures for exercising error paths.

use crate::compute::lock;
use std::sync::Mutex;

/// Where an injected fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// A host-to-device write of a buffer.
    Write,
    /// A device-to-host read of a buffer.
    Read,
    /// A kernel dispatch.
    Dispatch,
}

#[derive(Debug)]
struct Fault {
    point: FaultPoint,
    target: String,
    remaining: u32,
}

/// A shared list of armed faults.
///
/// Each fault targets a buffer label (reads and writes) or a kernel entry
/// point (dispatches) and fires a fixed number of times before disarming.
#[derive(Debug, Default)]
pub struct FaultInjector {
    faults: Mutex<Vec<Fault>>,
}

impl FaultInjector {
    /// An injector with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fault at `point` on `target` that fires `times` times.
    pub fn arm(&self, point: FaultPoint, target: &str, times: u32) {
        if times == 0 {
            return;
        }
        log::debug!("FaultInjector: Arming {point:?} fault on '{target}' ({times}x)");
        lock(&self.faults).push(Fault {
            point,
            target: target.to_owned(),
            remaining: times,
        });
    }

    /// Fails the next write of the buffer labelled `label`.
    pub fn fail_next_write(&self, label: &str) {
        self.arm(FaultPoint::Write, label, 1);
    }

    /// Fails the next read of the buffer labelled `label`.
    pub fn fail_next_read(&self, label: &str) {
        self.arm(FaultPoint::Read, label, 1);
    }

    /// Fails the next dispatch of `entry_point`.
    pub fn fail_next_dispatch(&self, entry_point: &str) {
        self.arm(FaultPoint::Dispatch, entry_point, 1);
    }

    /// Consumes one armed fault matching `point` and `target`, if any.
    pub fn trip(&self, point: FaultPoint, target: &str) -> bool {
        let mut faults = lock(&self.faults);
        let Some(index) = faults
            .iter()
            .position(|f| f.point == point && f.target == target)
        else {
            return false;
        };
        faults[index].remaining -= 1;
        if faults[index].remaining == 0 {
            faults.remove(index);
        }
        true
    }

    /// Number of faults still armed.
    pub fn armed(&self) -> usize {
        lock(&self.faults).len()
    }

    /// Disarms everything.
    pub fn clear(&self) {
        lock(&self.faults).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_fire_exactly_as_armed() {
        let faults = FaultInjector::new();
        faults.arm(FaultPoint::Read, "rule_3_output", 2);
        assert!(!faults.trip(FaultPoint::Write, "rule_3_output"));
        assert!(!faults.trip(FaultPoint::Read, "rule_2_output"));
        assert!(faults.trip(FaultPoint::Read, "rule_3_output"));
        assert!(faults.trip(FaultPoint::Read, "rule_3_output"));
        assert!(!faults.trip(FaultPoint::Read, "rule_3_output"));
        assert_eq!(faults.armed(), 0);
    }

    #[test]
    fn clear_disarms() {
        let faults = FaultInjector::new();
        faults.fail_next_dispatch("single_step");
        faults.clear();
        assert!(!faults.trip(FaultPoint::Dispatch, "single_step"));
    }
}
