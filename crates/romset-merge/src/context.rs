// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Injected conversion context.

use std::sync::Arc;

use romset_core::{NullPassSink, PassSink};

/// Options and collaborators a conversion runs with.
///
/// There is no process-wide state: the sink and the concurrency degree are
/// injected here and passed down into every pass.
#[derive(Clone)]
pub struct MergeContext {
    /// Receiver for pass events. Defaults to [`NullPassSink`].
    pub sink: Arc<dyn PassSink>,
    /// Worker threads for the read-only planning phase of device
    /// expansion. Everything with fan-in runs sequentially regardless.
    pub workers: usize,
    /// Keep machines that end a conversion with zero items instead of
    /// retiring them.
    pub keep_empty_machines: bool,
    /// Round cap for device fixed points. `None` derives
    /// `machine_count + 1`, which any acyclic device graph satisfies.
    pub closure_rounds_cap: Option<usize>,
}

impl Default for MergeContext {
    fn default() -> Self {
        Self {
            sink: Arc::new(NullPassSink),
            workers: 1,
            keep_empty_machines: false,
            closure_rounds_cap: None,
        }
    }
}

impl MergeContext {
    /// Creates a context with default options and a null sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pass sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn PassSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the planning worker count (clamped to at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Keeps zero-item machines at the end of conversions.
    #[must_use]
    pub fn keeping_empty_machines(mut self) -> Self {
        self.keep_empty_machines = true;
        self
    }

    /// Overrides the device fixed-point round cap.
    #[must_use]
    pub fn with_closure_rounds_cap(mut self, cap: usize) -> Self {
        self.closure_rounds_cap = Some(cap);
        self
    }
}

impl std::fmt::Debug for MergeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeContext")
            .field("workers", &self.workers)
            .field("keep_empty_machines", &self.keep_empty_machines)
            .field("closure_rounds_cap", &self.closure_rounds_cap)
            .finish_non_exhaustive()
    }
}
