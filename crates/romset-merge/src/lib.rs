// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! romset-merge: set-topology conversions for preservation catalogs.
//!
//! Physical distributions of a catalog store machines in one of five
//! **topologies**: Split (clones keep only what differs from their parent),
//! NonMerged (every machine self-contained except devices), Merged (clones
//! folded into parents), DeviceNonMerged (device dependencies inlined), and
//! FullyNonMerged (everything inlined). [`apply_topology`] converts a store
//! between them by composing the shared passes in [`passes`].
//!
//! Conversions relocate and duplicate content but never invent or destroy
//! it: `romset_core::ItemStore::content_identity_hash` is invariant across
//! every topology. They are also best-effort and total — a machine whose
//! referenced parent or device is missing is skipped, not an error; the one
//! hard failure is a device closure that refuses to stabilize.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod context;
mod explode;
pub mod passes;
mod region;
mod topology;

/// Injected pass context (sink, workers, policy knobs).
pub use context::MergeContext;
/// One-item-per-machine explosion transform.
pub use explode::explode_one_item_per_machine;
/// Region-preference (one machine per clone family) filter.
pub use region::one_machine_per_region;
/// Topology selection, conversion driver, and its error type.
pub use topology::{apply_topology, Topology, TopologyError};
