// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Topology selection and the conversion driver.

use thiserror::Error;

use romset_core::{BucketKind, DedupeMode, ItemStore, StoreError};

use crate::context::MergeContext;
use crate::passes;

/// A convention for which machine physically stores which items.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Topology {
    /// Clones keep only what differs from their parent.
    Split,
    /// Clones are folded into their parent and lose independent identity.
    Merged,
    /// Every machine is self-contained except for hardware/device
    /// dependencies.
    NonMerged,
    /// Device dependency chains are inlined into the machines that
    /// reference them.
    DeviceNonMerged,
    /// All ancestor and device content is inlined everywhere.
    FullyNonMerged,
}

impl Topology {
    /// Stable lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Merged => "merged",
            Self::NonMerged => "non-merged",
            Self::DeviceNonMerged => "device-non-merged",
            Self::FullyNonMerged => "fully-non-merged",
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors a conversion can raise.
///
/// Per-machine anomalies (missing parents, missing devices) are absorbed
/// and reported through the sink; these variants are the hard failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A device fixed point exceeded its round cap. An acyclic device
    /// graph stabilizes within `machine_count + 1` rounds, so hitting the
    /// cap means the catalog carries a device reference cycle.
    #[error("device closure did not stabilize after {rounds} rounds (cap {cap})")]
    DeviceClosureDiverged {
        /// Rounds executed before giving up.
        rounds: usize,
        /// The cap that was exceeded.
        cap: usize,
    },
    /// The initial re-bucket was invoked with an invalid combination.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Converts `store` into `topology`.
///
/// Begins by bucketing by machine name with no deduplication — topology
/// logic must see every item exactly as found, since deduplication would
/// destroy the clone/parent distinctions the passes rely on. Ends by
/// detagging every remaining machine, completing pending soft deletes, and
/// (unless the context keeps them) retiring machines left with zero items.
///
/// # Errors
///
/// Returns [`TopologyError::DeviceClosureDiverged`] when a device
/// reference cycle keeps a fixed point from stabilizing. The store is left
/// mid-conversion in that case; callers should discard it.
pub fn apply_topology(
    store: &mut ItemStore,
    topology: Topology,
    ctx: &MergeContext,
) -> Result<(), TopologyError> {
    store.bucket_by(BucketKind::MachineName, DedupeMode::None)?;

    match topology {
        Topology::Split => {
            passes::prune_clone_items(store, ctx);
            passes::prune_bios_items(store, true, ctx);
            passes::prune_bios_items(store, false, ctx);
        }
        Topology::NonMerged => {
            passes::inherit_from_parent(store, ctx);
            passes::prune_bios_items(store, true, ctx);
            passes::prune_bios_items(store, false, ctx);
        }
        Topology::Merged => {
            passes::fold_children_into_parent(store, ctx);
            passes::prune_bios_items(store, true, ctx);
            passes::prune_bios_items(store, false, ctx);
        }
        Topology::DeviceNonMerged => {
            expand_to_fixed_point(store, false, false, ctx)?;
            expand_to_fixed_point(store, true, false, ctx)?;
        }
        Topology::FullyNonMerged => {
            expand_to_fixed_point(store, true, true, ctx)?;
            ctx.sink.on_pass_started("expand-device-references");
            passes::expand_device_references(store, false, true, ctx);
            passes::inherit_from_parent(store, ctx);
            passes::inherit_from_bios(store, ctx);
        }
    }

    passes::detag(store);
    store.clear_marked();
    if !ctx.keep_empty_machines {
        store.clear_empty();
    }
    Ok(())
}

/// Drives one device-expansion configuration until nothing changes.
///
/// The round cap is defensive: the in-pass worklist already bounds work per
/// machine, but a cyclic device graph could otherwise oscillate forever
/// across rounds. Divergence is input corruption and aborts the
/// conversion.
fn expand_to_fixed_point(
    store: &mut ItemStore,
    only_device_machines: bool,
    include_slot_options: bool,
    ctx: &MergeContext,
) -> Result<(), TopologyError> {
    const PASS: &str = "expand-device-references";
    ctx.sink.on_pass_started(PASS);
    let cap = ctx
        .closure_rounds_cap
        .unwrap_or_else(|| store.machine_count() + 1);
    let mut rounds = 0;
    loop {
        let changed =
            passes::expand_device_references(store, only_device_machines, include_slot_options, ctx);
        rounds += 1;
        ctx.sink.on_round_completed(PASS, rounds, changed);
        if !changed {
            return Ok(());
        }
        if rounds > cap {
            return Err(TopologyError::DeviceClosureDiverged { rounds, cap });
        }
    }
}
