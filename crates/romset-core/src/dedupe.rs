// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hash-aware duplicate resolution.
//!
//! Two items are duplicates when their kinds match exactly and their
//! digests agree on every kind both sides recorded; with no digest kind in
//! common the decision falls back to case-sensitive name equality. Nodump
//! placeholders never match real dumps, whatever their digests say.
//!
//! Classification merges duplicates within one bucket into a single
//! representative and records *where* the duplicates lived: in the same
//! machine ([`DupeFlags::INTERNAL`]) or elsewhere
//! ([`DupeFlags::EXTERNAL`]). The rebuild and diff collaborators read these
//! flags to decide which physical files can satisfy which logical items.

use crate::digest::DigestOverlap;
use crate::item::{DupeFlags, Item, ItemStatus};
use crate::store::ItemStore;

/// Returns `true` when `a` and `b` are the same content under the duplicate
/// policy.
///
/// Policy, in order:
/// 1. Kinds must match exactly (a ROM never equals a disk).
/// 2. Nodump status on exactly one side is an immediate mismatch.
/// 3. Every digest kind present on **both** sides must match
///    byte-for-byte; one-sided kinds are ignored.
/// 4. With no digest kind in common (including one or both sides carrying
///    no digests at all), fall back to case-sensitive name equality.
#[must_use]
pub fn are_duplicates(a: &Item, b: &Item) -> bool {
    if a.kind != b.kind {
        return false;
    }
    if (a.status == ItemStatus::Nodump) != (b.status == ItemStatus::Nodump) {
        return false;
    }
    match a.digests.overlap(&b.digests) {
        DigestOverlap::Mismatch => false,
        DigestOverlap::AllCommonEqual => true,
        DigestOverlap::NoCommon => a.name == b.name,
    }
}

/// Merges exact duplicates within one bucket into representatives.
///
/// `items` must already be in [`Item::cmp_deterministic`] order; the
/// first-seen item of each duplicate group survives. Every later duplicate
/// is folded into its representative: the representative's [`DupeFlags`]
/// gain `INTERNAL` or `EXTERNAL` depending on whether the duplicate shared
/// its machine, and digest kinds the representative lacked are back-filled
/// from the duplicate so the survivor carries the union of recorded
/// identities. Duplicate flags are derived data, so every surviving item's
/// flags are recomputed from scratch here.
#[must_use]
pub fn classify(items: Vec<Item>) -> Vec<Item> {
    let mut kept: Vec<Item> = Vec::with_capacity(items.len());
    for mut item in items {
        item.dupe = DupeFlags::NONE;
        if let Some(rep) = kept.iter_mut().find(|rep| are_duplicates(rep, &item)) {
            let flag = if rep.machine == item.machine {
                DupeFlags::INTERNAL
            } else {
                DupeFlags::EXTERNAL
            };
            rep.dupe.insert(flag);
            rep.digests.merge_missing_from(&item.digests);
            if rep.size.is_none() {
                rep.size = item.size;
            }
        } else {
            kept.push(item);
        }
    }
    kept
}

/// Returns every stored item that duplicates `item`.
///
/// With `bucketed == true` only the bucket the store's current key kind
/// assigns to `item` is scanned — the fast path after a
/// [`ItemStore::bucket_by`] with the matching key. With `bucketed == false`
/// the whole store is walked.
#[must_use]
pub fn find_duplicates<'store>(
    item: &Item,
    store: &'store ItemStore,
    bucketed: bool,
) -> Vec<&'store Item> {
    if bucketed {
        let key = store.key_of(item);
        store.bucket(&key).map_or_else(Vec::new, |bucket| {
            bucket
                .iter()
                .filter(|candidate| are_duplicates(candidate, item))
                .collect()
        })
    } else {
        store
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter(|candidate| are_duplicates(candidate, item))
            .collect()
    }
}

/// Returns `true` when any stored item duplicates `item`. Short-circuits;
/// same scan semantics as [`find_duplicates`].
#[must_use]
pub fn has_duplicate(item: &Item, store: &ItemStore, bucketed: bool) -> bool {
    if bucketed {
        let key = store.key_of(item);
        store.bucket(&key).is_some_and(|bucket| {
            bucket.iter().any(|candidate| are_duplicates(candidate, item))
        })
    } else {
        store
            .iter()
            .any(|(_, items)| items.iter().any(|candidate| are_duplicates(candidate, item)))
    }
}
