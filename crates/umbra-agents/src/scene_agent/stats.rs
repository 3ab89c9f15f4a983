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

//! Per-frame counters reported by the scene agent.

use std::fmt;
use std::time::Duration;

/// What the last rendered frame recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Index of the frame, starting at 1.
    pub frame: u64,
    /// Render passes recorded, all stages included.
    pub passes: usize,
    /// Draw calls recorded, all stages included.
    pub draws: usize,
    /// Shadow map views rendered.
    pub shadow_views: usize,
    /// Reflection probe faces captured.
    pub probe_faces: usize,
    /// Filters that drew something.
    pub filters_applied: usize,
    /// Filters skipped because their region or light was not visible.
    pub filters_skipped: usize,
    /// CPU time spent recording and submitting the frame.
    pub cpu_time: Duration,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame={} passes={} draws={} shadows={} probes={} filters={}/{} cpu={:.2}ms",
            self.frame,
            self.passes,
            self.draws,
            self.shadow_views,
            self.probe_faces,
            self.filters_applied,
            self.filters_applied + self.filters_skipped,
            self.cpu_time.as_secs_f32() * 1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reports_applied_over_total_filters() {
        let stats = FrameStats {
            frame: 3,
            passes: 12,
            draws: 20,
            filters_applied: 1,
            filters_skipped: 2,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.starts_with("frame=3 passes=12 draws=20"));
        assert!(text.contains("filters=1/3"));
    }
}
