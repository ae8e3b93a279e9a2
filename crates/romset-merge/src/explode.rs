// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One-item-per-machine explosion.

use romset_core::{BucketKind, DedupeMode, Item, ItemStore, StoreError};

use crate::context::MergeContext;

/// Re-homes every item into its own machine named
/// `"{machine}/{item-name-stem}"` (directories and the final extension
/// stripped from the item name), cloned from the original machine's
/// metadata.
///
/// Items of one machine whose names share a stem land in the same derived
/// machine. Original machines end the pass empty and are retired unless
/// the context keeps them.
///
/// # Errors
///
/// Returns a [`StoreError`] only if the initial machine-name re-bucket is
/// rejected, which cannot happen for the combination used here.
pub fn explode_one_item_per_machine(
    store: &mut ItemStore,
    ctx: &MergeContext,
) -> Result<(), StoreError> {
    const PASS: &str = "one-item-per-machine";
    store.bucket_by(BucketKind::MachineName, DedupeMode::None)?;
    ctx.sink.on_pass_started(PASS);

    for id in store.machines_sorted() {
        let Some(template) = store.machine(id).cloned() else {
            continue;
        };
        let machine_name = template.name.clone();
        let Some(mut items) = store.remove_bucket(&machine_name) else {
            continue;
        };
        items.sort_by(Item::cmp_deterministic);

        let count = items.len();
        for mut item in items {
            let derived_name = format!("{machine_name}/{}", file_stem(&item.name));
            let mut shell = template.clone();
            shell.name.clone_from(&derived_name);
            shell.description.clone_from(&derived_name);
            let derived_id = store.ensure_machine(shell);
            item.machine = derived_id;
            store.add(&derived_name, item);
        }
        ctx.sink
            .on_items_transferred(PASS, &machine_name, &machine_name, count);
    }

    if !ctx.keep_empty_machines {
        store.clear_empty();
    }
    Ok(())
}

/// Last path segment of `name` with its final extension stripped.
fn file_stem(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}
