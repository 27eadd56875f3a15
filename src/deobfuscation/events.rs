//! Event logging for the deobfuscation pipeline.
//!
//! Every rewrite, every recognized obfuscation artifact, and every construct a pass
//! declined to touch is recorded as an [`Event`]. Statistics are derived from the
//! log rather than tracked separately.
//!
//! # Architecture
//!
//! - [`Event`] - A single recorded event (rewrite, identification, warning, ...)
//! - [`EventLog`] - Append-only collection with query and summary helpers
//! - [`EventBuilder`] - Fluent API for creating events
//!
//! # Example
//!
//! ```rust
//! use jsdeob::deobfuscation::{EventKind, EventLog};
//!
//! let log = EventLog::new();
//! log.record(EventKind::StringDecoded)
//!     .at("main", 3)
//!     .message("_0x4f2a[0] -> \"world\"");
//! log.warn("unsupported template shape");
//!
//! assert_eq!(log.count_kind(EventKind::StringDecoded), 1);
//! println!("{}", log.summary());
//! ```

use std::{
    collections::{HashMap, HashSet},
    fmt,
    time::Duration,
};

use serde::Serialize;

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A string table access or decoder call was replaced by its literal.
    StringDecoded,
    /// `obj["name"]` was rewritten to `obj.name`.
    MemberNormalized,
    /// A dictionary constant access was replaced by its literal.
    ConstantInlined,
    /// A dictionary function call was replaced by its return expression.
    CallInlined,
    /// A dictionary declaration was removed from a function body.
    DictionaryRemoved,
    /// A dispatcher loop was replaced by its cases in execution order.
    ControlFlowRestructured,
    /// A `while(true)` loop was given its natural exit condition.
    LoopReconstructed,

    /// The string table prologue was recognized and decoded.
    StringTableIdentified,
    /// A dictionary declaration was captured.
    DictionaryIdentified,
    /// A dispatcher `while`/`switch` pair was recognized.
    DispatcherIdentified,

    /// A pass started.
    PassStarted,
    /// A pass completed.
    PassCompleted,

    /// Informational message.
    Info,
    /// Warning (a construct was recognized but left untouched).
    Warning,
    /// Error (something failed).
    Error,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::StringDecoded => "string decoded",
            Self::MemberNormalized => "member normalized",
            Self::ConstantInlined => "constant inlined",
            Self::CallInlined => "call inlined",
            Self::DictionaryRemoved => "dictionary removed",
            Self::ControlFlowRestructured => "control flow restructured",
            Self::LoopReconstructed => "loop reconstructed",
            Self::StringTableIdentified => "string table identified",
            Self::DictionaryIdentified => "dictionary identified",
            Self::DispatcherIdentified => "dispatcher identified",
            Self::PassStarted => "pass started",
            Self::PassCompleted => "pass completed",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns true if this event represents a rewrite of the tree.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::StringDecoded
                | Self::MemberNormalized
                | Self::ConstantInlined
                | Self::CallInlined
                | Self::DictionaryRemoved
                | Self::ControlFlowRestructured
                | Self::LoopReconstructed
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// Scope label: `program` at top level, `function#N` inside the Nth function entered.
    pub scope: Option<String>,
    /// Statement index within the enclosing list, when one applies.
    pub location: Option<usize>,
    /// Human-readable description.
    pub message: String,
    /// Name of the pass that recorded the event.
    pub pass: Option<String>,
}

impl Event {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            scope: None,
            location: None,
            message: message.into(),
            pass: None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(scope) = &self.scope {
            write!(f, " {scope}")?;
            if let Some(location) = self.location {
                write!(f, "#{location}")?;
            }
        }
        write!(f, " {}", self.message)
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is added to the log when the builder is
/// dropped.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    kind: EventKind,
    scope: Option<String>,
    location: Option<usize>,
    message: Option<String>,
    pass: Option<String>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            scope: None,
            location: None,
            message: None,
            pass: None,
        }
    }

    /// Sets the enclosing scope and statement index.
    pub fn at(mut self, scope: impl Into<String>, location: usize) -> Self {
        self.scope = Some(scope.into());
        self.location = Some(location);
        self
    }

    /// Sets only the enclosing scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Associates this event with a specific pass.
    pub fn pass(mut self, pass_name: impl Into<String>) -> Self {
        self.pass = Some(pass_name.into());
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        self.log.events.push(Event {
            kind: self.kind,
            scope: self.scope.take(),
            location: self.location.take(),
            message,
            pass: self.pass.take(),
        });
    }
}

/// Collection of events from a deobfuscation run.
///
/// Events can be appended through shared references (`&self`), so one log can be
/// handed to every pass without threading `&mut` through the traversal.
#[derive(Debug)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: boxcar::Vec::new(),
        }
    }
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl Serialize for EventLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts building a new event of the given kind.
    ///
    /// The event is added when the builder is dropped.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Records an informational message.
    pub fn info(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Info, message));
    }

    /// Records a warning message.
    pub fn warn(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Warning, message));
    }

    /// Records an error message.
    pub fn error(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Error, message));
    }

    /// Appends copies of every event of `other`.
    pub fn merge(&self, other: &EventLog) {
        for event in other {
            self.events.push(event.clone());
        }
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.iter().any(|e| e.kind == kind)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.filter_kind(kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    /// Returns an iterator over events of a specific kind.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.kind == kind)
    }

    /// Returns an iterator over events recorded by one pass.
    pub fn filter_pass<'a>(&'a self, pass: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.iter().filter(move |e| e.pass.as_deref() == Some(pass))
    }

    /// Returns an iterator over transformation events only.
    pub fn transformations(&self) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(|e| e.kind.is_transformation())
    }

    /// Returns an iterator over warning events.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Warning)
    }

    /// Counts events grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for event in self {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of transformation events.
    #[must_use]
    pub fn transformation_count(&self) -> usize {
        self.transformations().count()
    }

    /// Returns the number of distinct scopes that were rewritten.
    #[must_use]
    pub fn scopes_affected(&self) -> usize {
        self.transformations()
            .filter_map(|e| e.scope.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Generates a human-readable summary of the transformation events.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let mut parts: Vec<String> = self
            .count_by_kind()
            .iter()
            .filter(|(k, _)| k.is_transformation())
            .map(|(kind, count)| format!("{} {}", count, kind.description()))
            .collect();

        if parts.is_empty() {
            return format!("{} events", self.len());
        }

        parts.sort();
        parts.join(", ")
    }
}

/// Iterator over the events of an [`EventLog`].
pub struct EventLogIter<'a> {
    inner: boxcar::Iter<'a, Event>,
}

impl<'a> Iterator for EventLogIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, e)| e)
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = EventLogIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        EventLogIter {
            inner: self.events.iter(),
        }
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<T: IntoIterator<Item = Event>>(iter: T) -> Self {
        let log = Self::new();
        for event in iter {
            log.events.push(event);
        }
        log
    }
}

/// Statistics derived from an [`EventLog`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedStats {
    /// Number of distinct scopes with any rewrite.
    pub scopes_transformed: usize,
    /// String table entries inlined.
    pub strings_decoded: usize,
    /// Computed member accesses rewritten to dot access.
    pub members_normalized: usize,
    /// Dictionary constants inlined.
    pub constants_inlined: usize,
    /// Dictionary function calls inlined.
    pub calls_inlined: usize,
    /// Dictionary declarations captured.
    pub dictionaries: usize,
    /// Dispatcher loops unflattened.
    pub dispatchers: usize,
    /// Loops rebuilt with a natural exit condition.
    pub loops_reconstructed: usize,
    /// Number of warnings.
    pub warnings: usize,
    /// Number of errors.
    pub errors: usize,
    /// Number of pass executions.
    pub iterations: usize,
    /// Processing time.
    pub total_time: Duration,
}

impl DerivedStats {
    /// Computes statistics from an event log.
    #[must_use]
    pub fn from_log(log: &EventLog) -> Self {
        let counts = log.count_by_kind();
        let get = |kind: EventKind| counts.get(&kind).copied().unwrap_or(0);

        Self {
            scopes_transformed: log.scopes_affected(),
            strings_decoded: get(EventKind::StringDecoded),
            members_normalized: get(EventKind::MemberNormalized),
            constants_inlined: get(EventKind::ConstantInlined),
            calls_inlined: get(EventKind::CallInlined),
            dictionaries: get(EventKind::DictionaryRemoved),
            dispatchers: get(EventKind::ControlFlowRestructured),
            loops_reconstructed: get(EventKind::LoopReconstructed),
            warnings: get(EventKind::Warning),
            errors: get(EventKind::Error),
            iterations: 0,
            total_time: Duration::ZERO,
        }
    }

    /// Sets the total processing time.
    #[must_use]
    pub fn with_time(mut self, time: Duration) -> Self {
        self.total_time = time;
        self
    }

    /// Sets the number of iterations.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Generates a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.scopes_transformed > 0 {
            parts.push(format!("{} scopes", self.scopes_transformed));
        }
        if self.strings_decoded > 0 {
            parts.push(format!("{} strings decoded", self.strings_decoded));
        }
        if self.members_normalized > 0 {
            parts.push(format!("{} members normalized", self.members_normalized));
        }
        if self.dictionaries > 0 {
            parts.push(format!("{} dictionaries", self.dictionaries));
        }
        if self.constants_inlined > 0 {
            parts.push(format!("{} constants inlined", self.constants_inlined));
        }
        if self.calls_inlined > 0 {
            parts.push(format!("{} calls inlined", self.calls_inlined));
        }
        if self.dispatchers > 0 {
            parts.push(format!("{} dispatchers", self.dispatchers));
        }
        if self.loops_reconstructed > 0 {
            parts.push(format!("{} loops", self.loops_reconstructed));
        }
        if self.errors > 0 {
            parts.push(format!("{} errors", self.errors));
        }
        if self.warnings > 0 {
            parts.push(format!("{} warnings", self.warnings));
        }

        let stats = if parts.is_empty() {
            "no transformations".to_string()
        } else {
            parts.join(", ")
        };

        if self.total_time.as_millis() > 0 {
            format!(
                "{} in {:?} ({} iterations)",
                stats, self.total_time, self.iterations
            )
        } else {
            stats
        }
    }
}

impl fmt::Display for DerivedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Truncates a string for display, adding an ellipsis if needed.
#[must_use]
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
