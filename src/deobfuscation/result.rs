//! Deobfuscation result types.
//!
//! This module contains the [`DeobfuscationResult`] struct which encapsulates
//! the outcome of running the deobfuscation engine on a program.

use std::time::Duration;

use serde::Serialize;

use crate::deobfuscation::{detection::DetectionReport, DerivedStats, EventLog};

/// Result of running deobfuscation.
///
/// Contains the event log capturing all activity during deobfuscation and the
/// detection report taken before any pass ran. Statistics are derived from the
/// event log on demand.
///
/// # Example
///
/// ```rust,ignore
/// use jsdeob::deobfuscation::DeobfuscationEngine;
///
/// let mut engine = DeobfuscationEngine::default();
/// let (program, result) = engine.process_file("bundle.json")?;
///
/// println!("Detection: {}", result.detection);
/// println!("Events: {}", result.events.len());
/// println!("Stats: {}", result.stats().summary());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct DeobfuscationResult {
    /// Patterns found in the input.
    pub detection: DetectionReport,
    /// All events from the deobfuscation run.
    pub events: EventLog,
    /// Number of pass runs, unflattening rounds counted individually.
    pub iterations: usize,
    /// Total processing time.
    #[serde(serialize_with = "serialize_duration")]
    pub total_time: Duration,
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl DeobfuscationResult {
    /// Creates a new deobfuscation result.
    #[must_use]
    pub fn new(detection: DetectionReport, events: EventLog) -> Self {
        Self {
            detection,
            events,
            iterations: 0,
            total_time: Duration::ZERO,
        }
    }

    /// Sets timing and iteration info.
    #[must_use]
    pub fn with_timing(mut self, time: Duration, iterations: usize) -> Self {
        self.total_time = time;
        self.iterations = iterations;
        self
    }

    /// Computes statistics derived from the event log.
    #[must_use]
    pub fn stats(&self) -> DerivedStats {
        DerivedStats::from_log(&self.events)
            .with_time(self.total_time)
            .with_iterations(self.iterations)
    }

    /// Returns true if any pass rewrote the tree.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.events.transformation_count() > 0
    }

    /// Generates a human-readable summary of the deobfuscation results.
    #[must_use]
    pub fn summary(&self) -> String {
        self.stats().summary()
    }

    /// Generates a detailed multi-line summary including detection info.
    #[must_use]
    pub fn detailed_summary(&self) -> String {
        format!(
            "Deobfuscation complete: {}\nDetection: {}",
            self.stats().summary(),
            self.detection.summary()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deobfuscation::EventKind;

    #[test]
    fn test_result_stats_follow_events() {
        let events = EventLog::new();
        events.record(EventKind::StringDecoded).scope("program");
        events.record(EventKind::StringDecoded).scope("function#1");
        events.warn("unsupported template");

        let result = DeobfuscationResult::new(DetectionReport::default(), events)
            .with_timing(Duration::from_millis(5), 3);
        let stats = result.stats();

        assert!(result.changed());
        assert_eq!(stats.strings_decoded, 2);
        assert_eq!(stats.warnings, 1);
        assert_eq!(stats.iterations, 3);
        assert!(result.detailed_summary().contains("Detection: no string table"));
    }

    #[test]
    fn test_empty_result_is_unchanged() {
        let result = DeobfuscationResult::new(DetectionReport::default(), EventLog::new());
        assert!(!result.changed());
        assert_eq!(result.total_time, Duration::ZERO);
    }
}
