// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared conversion passes.
//!
//! Every pass walks an immutable snapshot of the live machine ids in
//! sorted-name order, so traversal is deterministic and unaffected by the
//! mutations the pass performs. Machines that own no items are treated as
//! absent. A missing parent or device machine silently skips that one
//! machine (reported through the sink) and processing continues — passes
//! are best-effort and total.
//!
//! Item addition during any copy is guarded by "does an item with this
//! `(kind, name)` already exist in the target", ASCII-case-insensitively.
//! The guard is name-based even though duplicate *detection* elsewhere is
//! hash-based: a renamed but byte-identical file is intentionally
//! duplicated across machines by these passes.

use std::collections::BTreeSet;

use romset_core::{DupeFlags, Item, ItemKind, ItemStore, MachineId};

use crate::context::MergeContext;

/// The machine-to-machine tag an inherit/prune pass follows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ParentEdge {
    CloneOf,
    RomOf,
}

fn parent_name_of(store: &ItemStore, id: MachineId, edge: ParentEdge) -> Option<String> {
    let machine = store.machine(id)?;
    match edge {
        ParentEdge::CloneOf => machine.clone_of.clone(),
        ParentEdge::RomOf => machine.rom_of.clone(),
    }
}

// ── Inheritance ─────────────────────────────────────────────────────

/// Copies every parent item into each machine with a `clone_of` parent,
/// then overwrites the child's `rom_of` tag with the parent's so the BIOS
/// dependency propagates one level down.
///
/// This is a single-level lookup, not a walk of the whole ancestor chain:
/// a grandparent's items reach the child only if the caller drives the
/// whole algorithm to a fixed point itself. Multi-level clone chains are
/// deliberately not resolved here.
pub fn inherit_from_parent(store: &mut ItemStore, ctx: &MergeContext) {
    const PASS: &str = "inherit-from-parent";
    ctx.sink.on_pass_started(PASS);
    for id in store.machines_sorted() {
        inherit_one(store, ctx, PASS, id, ParentEdge::CloneOf);
    }
}

/// Copies every BIOS item into each machine with a `rom_of` parent. Same
/// copy semantics as [`inherit_from_parent`] but keyed off `rom_of`, and
/// without propagating any further tag: BIOS machines are leaves.
pub fn inherit_from_bios(store: &mut ItemStore, ctx: &MergeContext) {
    const PASS: &str = "inherit-from-bios";
    ctx.sink.on_pass_started(PASS);
    for id in store.machines_sorted() {
        inherit_one(store, ctx, PASS, id, ParentEdge::RomOf);
    }
}

fn inherit_one(
    store: &mut ItemStore,
    ctx: &MergeContext,
    pass: &str,
    child_id: MachineId,
    edge: ParentEdge,
) {
    let Some(child_name) = store.machine(child_id).map(|m| m.name.clone()) else {
        return;
    };
    let Some(parent_name) = parent_name_of(store, child_id, edge) else {
        return;
    };
    let Some(parent_id) = store.machine_id(&parent_name) else {
        ctx.sink.on_machine_skipped(pass, &child_name, &parent_name);
        return;
    };
    if parent_id == child_id {
        return;
    }

    let to_add = {
        let parent_bucket = match store.bucket(&parent_name) {
            Some(bucket) if !bucket.is_empty() => bucket,
            _ => return,
        };
        let child_bucket = store.bucket(&child_name).unwrap_or(&[]);
        let mut to_add: Vec<Item> = Vec::new();
        for parent_item in parent_bucket {
            let name_taken = child_bucket
                .iter()
                .chain(to_add.iter())
                .any(|existing| existing.matches_kind_and_name(parent_item.kind, &parent_item.name));
            if name_taken {
                continue;
            }
            let mut copy = parent_item.clone();
            copy.machine = child_id;
            copy.dupe = DupeFlags::NONE;
            copy.marked = false;
            if child_bucket.iter().any(|existing| existing.is_value_equal(&copy)) {
                continue;
            }
            to_add.push(copy);
        }
        to_add
    };

    let count = to_add.len();
    for item in to_add {
        store.add(&child_name, item);
    }
    if count > 0 {
        ctx.sink
            .on_items_transferred(pass, &parent_name, &child_name, count);
    }

    if edge == ParentEdge::CloneOf {
        let parent_rom_of = store.machine(parent_id).and_then(|m| m.rom_of.clone());
        if let Some(child) = store.machine_mut(child_id) {
            child.rom_of = parent_rom_of;
        }
    }
}

// ── Folding ─────────────────────────────────────────────────────────

/// Moves every item of each machine with a `clone_of` parent into that
/// parent, then retires the emptied child.
///
/// Disks short-circuit when a disk named by their merge tag already exists
/// in the parent; ROMs do the same, and when a ROM *is* moved it is renamed
/// into the synthetic path `"{child}/{name}"` so the parent's now-shared
/// namespace cannot collide. Items with no merge tag are always moved.
/// Structural and metadata items keep the parent's copy on a name clash.
pub fn fold_children_into_parent(store: &mut ItemStore, ctx: &MergeContext) {
    const PASS: &str = "fold-children-into-parent";
    ctx.sink.on_pass_started(PASS);
    for child_id in store.machines_sorted() {
        let Some(child_name) = store.machine(child_id).map(|m| m.name.clone()) else {
            continue;
        };
        let Some(parent_name) = parent_name_of(store, child_id, ParentEdge::CloneOf) else {
            continue;
        };
        let Some(parent_id) = store.machine_id(&parent_name) else {
            ctx.sink.on_machine_skipped(PASS, &child_name, &parent_name);
            continue;
        };
        if parent_id == child_id {
            continue;
        }
        let Some(items) = store.remove_bucket(&child_name) else {
            continue;
        };

        let mut moved = 0;
        for mut item in items {
            let merge_tag_satisfied = matches!(item.kind, ItemKind::Rom | ItemKind::Disk)
                && item.merge_tag.as_deref().is_some_and(|tag| {
                    store
                        .bucket(&parent_name)
                        .unwrap_or(&[])
                        .iter()
                        .any(|existing| existing.matches_kind_and_name(item.kind, tag))
                });
            if merge_tag_satisfied {
                continue;
            }
            match item.kind {
                ItemKind::Rom => {
                    item.name = format!("{child_name}/{}", item.name);
                }
                ItemKind::Disk => {}
                _ => {
                    let clash = store
                        .bucket(&parent_name)
                        .unwrap_or(&[])
                        .iter()
                        .any(|existing| existing.matches_kind_and_name(item.kind, &item.name));
                    if clash {
                        continue;
                    }
                }
            }
            item.machine = parent_id;
            store.add(&parent_name, item);
            moved += 1;
        }
        if moved > 0 {
            ctx.sink
                .on_items_transferred(PASS, &child_name, &parent_name, moved);
        }
        store.retire_machine(child_id);
    }
}

// ── Pruning ─────────────────────────────────────────────────────────

/// Removes from each machine with a `clone_of` parent every item that is
/// value-equal to one the parent already owns, then copies the parent's
/// `rom_of` tag onto the child so split sets still know their BIOS
/// dependency.
pub fn prune_clone_items(store: &mut ItemStore, ctx: &MergeContext) {
    const PASS: &str = "prune-clone-items";
    ctx.sink.on_pass_started(PASS);
    for id in store.machines_sorted() {
        prune_one(store, ctx, PASS, id, ParentEdge::CloneOf, true);
    }
}

/// Removes from each machine whose `is_bios` equals `bios_machines` every
/// item value-equal to one its `rom_of` ancestor owns. Run once per flag
/// value to cover the whole catalog.
pub fn prune_bios_items(store: &mut ItemStore, bios_machines: bool, ctx: &MergeContext) {
    const PASS: &str = "prune-bios-items";
    ctx.sink.on_pass_started(PASS);
    for id in store.machines_sorted() {
        let Some(machine) = store.machine(id) else {
            continue;
        };
        if machine.is_bios != bios_machines {
            continue;
        }
        prune_one(store, ctx, PASS, id, ParentEdge::RomOf, false);
    }
}

fn prune_one(
    store: &mut ItemStore,
    ctx: &MergeContext,
    pass: &str,
    child_id: MachineId,
    edge: ParentEdge,
    propagate_rom_of: bool,
) {
    let Some(child_name) = store.machine(child_id).map(|m| m.name.clone()) else {
        return;
    };
    let Some(parent_name) = parent_name_of(store, child_id, edge) else {
        return;
    };
    let Some(parent_id) = store.machine_id(&parent_name) else {
        ctx.sink.on_machine_skipped(pass, &child_name, &parent_name);
        return;
    };
    if parent_id == child_id {
        return;
    }
    let parent_items: Vec<Item> = match store.bucket(&parent_name) {
        Some(bucket) if !bucket.is_empty() => bucket.to_vec(),
        _ => return,
    };

    let removed = store.retain(&child_name, |item| {
        !parent_items.iter().any(|pi| pi.is_value_equal(item))
    });
    if removed > 0 {
        ctx.sink
            .on_items_pruned(pass, &child_name, &parent_name, removed);
    }

    if propagate_rom_of {
        let parent_rom_of = store.machine(parent_id).and_then(|m| m.rom_of.clone());
        if let Some(child) = store.machine_mut(child_id) {
            child.rom_of = parent_rom_of;
        }
    }
}

// ── Device expansion ────────────────────────────────────────────────

/// One pass of device-reference expansion. Returns `true` when any item
/// was added anywhere.
///
/// For every machine whose `is_device` equals `only_device_machines`, the
/// names referenced by its `DeviceRef` items (and, when
/// `include_slot_options` is set, by its slot options) seed a worklist;
/// each referenced machine's items are copied in under the `(kind, name)`
/// guard, and the referenced machine's own device references extend the
/// worklist, so one call chases a reference chain to any depth. Copied
/// `DeviceRef` items materialize the transitive references on the
/// expanding machine, so emitted sets list their full device closure.
///
/// Callers drive this to a fixed point (`while changed { … }`); device
/// chains are the one place transitive closure is actually computed.
pub fn expand_device_references(
    store: &mut ItemStore,
    only_device_machines: bool,
    include_slot_options: bool,
    ctx: &MergeContext,
) -> bool {
    const PASS: &str = "expand-device-references";
    let ids = store.machines_sorted();
    let plans = plan_all(store, &ids, only_device_machines, include_slot_options, ctx.workers);

    let mut changed = false;
    for plan in plans {
        for missing in &plan.missing {
            ctx.sink.on_machine_skipped(PASS, &plan.machine, missing);
        }
        for (source, count) in &plan.copied_from {
            ctx.sink
                .on_items_transferred(PASS, source, &plan.machine, *count);
        }
        for item in plan.adds {
            store.add(&plan.machine, item);
            changed = true;
        }
    }
    changed
}

fn enqueue(referenced: &str, queue: &mut Vec<String>, seen: &mut BTreeSet<String>) {
    if seen.insert(referenced.to_owned()) {
        queue.push(referenced.to_owned());
    }
}

/// Planned additions for one machine, computed against an immutable store.
struct DevicePlan {
    machine: String,
    adds: Vec<Item>,
    copied_from: Vec<(String, usize)>,
    missing: Vec<String>,
}

fn plan_one(
    store: &ItemStore,
    id: MachineId,
    only_device_machines: bool,
    include_slot_options: bool,
) -> Option<DevicePlan> {
    let machine = store.machine(id)?;
    if machine.is_device != only_device_machines {
        return None;
    }
    let name = machine.name.clone();
    let bucket = store.bucket(&name)?;
    if bucket.is_empty() {
        return None;
    }

    let mut queue: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for item in bucket {
        match item.kind {
            ItemKind::DeviceRef => enqueue(&item.name, &mut queue, &mut seen),
            ItemKind::Slot if include_slot_options => {
                for option in &item.slot_options {
                    enqueue(&option.device_name, &mut queue, &mut seen);
                }
            }
            _ => {}
        }
    }

    let mut adds: Vec<Item> = Vec::new();
    let mut copied_from: Vec<(String, usize)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    let mut cursor = 0;
    while cursor < queue.len() {
        let device_name = queue[cursor].clone();
        cursor += 1;
        if device_name == name {
            continue;
        }
        if store.machine_id(&device_name).is_none() {
            missing.push(device_name);
            continue;
        }
        let Some(device_bucket) = store.bucket(&device_name) else {
            continue;
        };
        let mut copied = 0;
        for device_item in device_bucket {
            match device_item.kind {
                ItemKind::DeviceRef => enqueue(&device_item.name, &mut queue, &mut seen),
                ItemKind::Slot if include_slot_options => {
                    for option in &device_item.slot_options {
                        enqueue(&option.device_name, &mut queue, &mut seen);
                    }
                }
                _ => {}
            }
            let name_taken = bucket
                .iter()
                .chain(adds.iter())
                .any(|existing| existing.matches_kind_and_name(device_item.kind, &device_item.name));
            if name_taken {
                continue;
            }
            let mut copy = device_item.clone();
            copy.machine = id;
            copy.dupe = DupeFlags::NONE;
            copy.marked = false;
            adds.push(copy);
            copied += 1;
        }
        if copied > 0 {
            copied_from.push((device_name, copied));
        }
    }

    if adds.is_empty() && missing.is_empty() {
        return None;
    }
    Some(DevicePlan {
        machine: name,
        adds,
        copied_from,
        missing,
    })
}

/// Plans every machine, fanning the read-only scan out across `workers`
/// scoped threads when asked to. Results are collected in machine order,
/// so the outcome is identical to the serial plan.
fn plan_all(
    store: &ItemStore,
    ids: &[MachineId],
    only_device_machines: bool,
    include_slot_options: bool,
    workers: usize,
) -> Vec<DevicePlan> {
    if workers <= 1 || ids.len() < 2 {
        return ids
            .iter()
            .filter_map(|&id| plan_one(store, id, only_device_machines, include_slot_options))
            .collect();
    }

    let chunk_len = ids.len().div_ceil(workers.min(ids.len()));
    let mut chunks: Vec<Vec<DevicePlan>> = Vec::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = ids
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .filter_map(|&id| {
                            plan_one(store, id, only_device_machines, include_slot_options)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(plans) => chunks.push(plans),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
    });
    chunks.into_iter().flatten().collect()
}

// ── Detagging ───────────────────────────────────────────────────────

/// Clears the `clone_of` / `rom_of` / `sample_of` tags on every remaining
/// machine, so the produced catalog looks self-consistent regardless of
/// which topology was chosen. Idempotent.
pub fn detag(store: &mut ItemStore) {
    for id in store.machines_sorted() {
        if let Some(machine) = store.machine_mut(id) {
            machine.detag();
        }
    }
}
