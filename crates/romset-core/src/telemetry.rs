// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Injected observability for conversion passes.
//!
//! Passes never log through a process-wide facility; they report through a
//! [`PassSink`] carried by the caller's context. Events are best-effort and
//! advisory — sinks must not influence pass behavior.

/// Receiver for machine-level pass events.
///
/// All methods have empty defaults so sinks implement only what they
/// observe. Implementations must be cheap and must not panic; passes call
/// these on their hot path.
pub trait PassSink: Send + Sync {
    /// A named pass started.
    fn on_pass_started(&self, _pass: &str) {}

    /// A machine was skipped because a referenced parent/ancestor/device
    /// machine was not found. Structural absence is not an error; this
    /// event is its only trace.
    fn on_machine_skipped(&self, _pass: &str, _machine: &str, _missing: &str) {}

    /// Items were copied or moved between machines by a pass.
    fn on_items_transferred(&self, _pass: &str, _from: &str, _to: &str, _count: usize) {}

    /// Items were removed from a machine because an ancestor already
    /// carries them.
    fn on_items_pruned(&self, _pass: &str, _machine: &str, _ancestor: &str, _count: usize) {}

    /// One round of a fixed-point pass finished.
    fn on_round_completed(&self, _pass: &str, _round: usize, _changed: bool) {}
}

/// A sink that drops every event. The default when callers do not inject
/// their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPassSink;

impl PassSink for NullPassSink {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        events: AtomicUsize,
    }

    impl PassSink for CountingSink {
        fn on_pass_started(&self, _pass: &str) {
            self.events.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn default_methods_are_no_ops() {
        let sink = NullPassSink;
        sink.on_pass_started("x");
        sink.on_machine_skipped("x", "m", "p");
        sink.on_items_transferred("x", "a", "b", 3);
        sink.on_items_pruned("x", "a", "b", 2);
        sink.on_round_completed("x", 1, false);
    }

    #[test]
    fn sinks_observe_only_what_they_implement() {
        let sink = CountingSink::default();
        sink.on_pass_started("inherit");
        sink.on_round_completed("inherit", 1, false);
        assert_eq!(sink.events.load(Ordering::Relaxed), 1);
    }
}
