// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Region-preference filter: one machine per clone family.

use std::collections::BTreeMap;

use romset_core::{BucketKind, DedupeMode, ItemStore, StoreError};

use crate::context::MergeContext;

/// Keeps one machine per clone family, preferring the earliest region in
/// `regions` that any family member's name advertises.
///
/// A family is a parent plus every machine whose `clone_of` names it; a
/// machine with no parent tag roots its own family. Region advertisement
/// is the conventional parenthesized token in the machine name — a machine
/// named `"Puck Man (Japan)"` matches region `"japan"`,
/// case-insensitively. The survivor is the first family member (in sorted
/// name order) matching the highest-priority region; the fallback is the
/// family root when present, then the first member. Non-survivors are
/// flagged and physically removed; the survivor is detagged.
///
/// # Errors
///
/// Returns a [`StoreError`] only if the initial machine-name re-bucket is
/// rejected, which cannot happen for the combination used here.
pub fn one_machine_per_region(
    store: &mut ItemStore,
    regions: &[String],
    ctx: &MergeContext,
) -> Result<(), StoreError> {
    const PASS: &str = "one-machine-per-region";
    store.bucket_by(BucketKind::MachineName, DedupeMode::None)?;
    ctx.sink.on_pass_started(PASS);

    let mut families: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in store.machines_sorted() {
        let Some(machine) = store.machine(id) else {
            continue;
        };
        if store.bucket(&machine.name).is_none() {
            continue;
        }
        let root = machine
            .clone_of
            .clone()
            .unwrap_or_else(|| machine.name.clone());
        families.entry(root).or_default().push(machine.name.clone());
    }

    for (root, members) in families {
        let survivor = pick_survivor(&root, &members, regions);
        for member in &members {
            if member != &survivor {
                let flagged = store.mark_bucket(member);
                if flagged > 0 {
                    ctx.sink.on_items_pruned(PASS, member, &survivor, flagged);
                }
            }
        }
        if let Some(id) = store.machine_id(&survivor) {
            if let Some(machine) = store.machine_mut(id) {
                machine.detag();
            }
        }
    }

    store.clear_marked();
    if !ctx.keep_empty_machines {
        store.clear_empty();
    }
    Ok(())
}

fn pick_survivor(root: &str, members: &[String], regions: &[String]) -> String {
    for region in regions {
        for member in members {
            if name_matches_region(member, region) {
                return member.clone();
            }
        }
    }
    members
        .iter()
        .find(|member| *member == root)
        .or_else(|| members.first())
        .cloned()
        .unwrap_or_else(|| root.to_owned())
}

/// Scans every parenthesized group in `name` for a comma-separated token
/// equal to `region`, ASCII-case-insensitively.
fn name_matches_region(name: &str, region: &str) -> bool {
    let mut rest = name;
    while let Some(open) = rest.find('(') {
        let tail = &rest[open + 1..];
        let Some(close) = tail.find(')') else {
            break;
        };
        let group = &tail[..close];
        if group
            .split(',')
            .any(|token| token.trim().eq_ignore_ascii_case(region))
        {
            return true;
        }
        rest = &tail[close + 1..];
    }
    false
}
