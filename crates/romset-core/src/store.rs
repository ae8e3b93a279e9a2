// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The bucketed item store.
//!
//! An [`ItemStore`] owns a [`MachineArena`] plus every item of the catalog,
//! grouped into buckets by the currently selected [`BucketKind`]. Buckets
//! are `BTreeMap`-backed so key iteration is always lexicographic, and
//! bucket contents are re-sorted into a total order on every re-bucket;
//! every traversal a conversion performs is therefore deterministic.
//!
//! Re-bucketing is a full rebuild, not incremental. All mutations are
//! immediately visible to subsequent reads; there are no transactions.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::dedupe;
use crate::digest::DigestKind;
use crate::item::{Item, ItemKind, ItemStatus};
use crate::machine::{Machine, MachineArena, MachineId};

/// The key a store is currently indexed by.
///
/// The spamsum digest is deliberately absent: fuzzy hashes do not bucket by
/// equality, so they cannot serve as a grouping key.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BucketKind {
    /// Bucket by owning machine name (the parser/writer ordering).
    #[default]
    MachineName,
    /// Bucket by CRC32 text.
    Crc32,
    /// Bucket by MD5 text.
    Md5,
    /// Bucket by SHA-1 text.
    Sha1,
    /// Bucket by SHA-256 text.
    Sha256,
    /// Bucket by SHA-384 text.
    Sha384,
    /// Bucket by SHA-512 text.
    Sha512,
}

impl BucketKind {
    /// The digest kind this key extracts, or `None` for machine names.
    #[must_use]
    pub fn digest_kind(self) -> Option<DigestKind> {
        match self {
            Self::MachineName => None,
            Self::Crc32 => Some(DigestKind::Crc32),
            Self::Md5 => Some(DigestKind::Md5),
            Self::Sha1 => Some(DigestKind::Sha1),
            Self::Sha256 => Some(DigestKind::Sha256),
            Self::Sha384 => Some(DigestKind::Sha384),
            Self::Sha512 => Some(DigestKind::Sha512),
        }
    }

    /// Stable label for error messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.digest_kind()
            .map_or("machine-name", DigestKind::label)
    }
}

impl std::fmt::Display for BucketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Deduplication to run as part of a re-bucket. The only configuration
/// surface the dedup substrate exposes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DedupeMode {
    /// Keep every item as found.
    #[default]
    None,
    /// Deduplicate across the whole catalog; requires a digest bucket key.
    Full,
    /// Deduplicate within each machine; requires the machine-name key.
    Game,
}

/// Caller-misuse errors raised by [`ItemStore::bucket_by`].
///
/// These fail fast instead of degrading into silently wrong dedup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `Full` deduplication was requested with a non-digest bucket key.
    #[error("full deduplication requires a digest bucket key, got {0}")]
    FullDedupeNeedsDigestKey(BucketKind),
    /// `Game` deduplication was requested with a non-machine-name key.
    #[error("per-machine deduplication requires the machine-name bucket key, got {0}")]
    GameDedupeNeedsNameKey(BucketKind),
}

/// Running content counts, maintained on every add and remove.
///
/// Counts describe stored items only; they say nothing about marks until
/// [`ItemStore::clear_marked`] completes the pending removals. Readers
/// should consult totals between passes, not during one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreTotals {
    /// Total stored items of any kind.
    pub items: u64,
    /// ROM items.
    pub roms: u64,
    /// Disk items.
    pub disks: u64,
    /// Media items.
    pub media: u64,
    /// Sample items.
    pub samples: u64,
    /// Sum of known item sizes in bytes.
    pub bytes: u64,
    /// Items carrying a CRC32.
    pub with_crc32: u64,
    /// Items carrying an MD5.
    pub with_md5: u64,
    /// Items carrying a SHA-1.
    pub with_sha1: u64,
    /// Items carrying a SHA-256.
    pub with_sha256: u64,
    /// Items carrying a SHA-384.
    pub with_sha384: u64,
    /// Items carrying a SHA-512.
    pub with_sha512: u64,
    /// Items with nodump status.
    pub nodumps: u64,
}

impl StoreTotals {
    fn add(&mut self, item: &Item) {
        self.apply(item, 1);
    }

    fn remove(&mut self, item: &Item) {
        self.apply(item, -1);
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    fn apply(&mut self, item: &Item, sign: i64) {
        let bump = |field: &mut u64| *field = (*field as i64 + sign) as u64;
        bump(&mut self.items);
        match item.kind {
            ItemKind::Rom => bump(&mut self.roms),
            ItemKind::Disk => bump(&mut self.disks),
            ItemKind::Media => bump(&mut self.media),
            ItemKind::Sample => bump(&mut self.samples),
            _ => {}
        }
        if let Some(size) = item.size {
            self.bytes = (self.bytes as i64 + sign * size as i64) as u64;
        }
        if item.digests.crc32.is_some() {
            bump(&mut self.with_crc32);
        }
        if item.digests.md5.is_some() {
            bump(&mut self.with_md5);
        }
        if item.digests.sha1.is_some() {
            bump(&mut self.with_sha1);
        }
        if item.digests.sha256.is_some() {
            bump(&mut self.with_sha256);
        }
        if item.digests.sha384.is_some() {
            bump(&mut self.with_sha384);
        }
        if item.digests.sha512.is_some() {
            bump(&mut self.with_sha512);
        }
        if item.status == ItemStatus::Nodump {
            bump(&mut self.nodumps);
        }
    }
}

/// Bucketed multimap over the catalog's items, plus the machine arena.
///
/// Exactly one conversion may run against a store at a time; concurrent
/// read-only access (statistics, duplicate probes) is safe between passes.
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    machines: MachineArena,
    buckets: BTreeMap<String, Vec<Item>>,
    bucketed_by: BucketKind,
    totals: StoreTotals,
}

impl ItemStore {
    /// Creates an empty store bucketed by machine name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Machines ────────────────────────────────────────────────────

    /// Returns the id for `machine`, inserting it when the name is new.
    pub fn ensure_machine(&mut self, machine: Machine) -> MachineId {
        self.machines.ensure(machine)
    }

    /// Returns the machine for `id`, if live.
    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    /// Returns a mutable reference to the machine for `id`, if live.
    pub fn machine_mut(&mut self, id: MachineId) -> Option<&mut Machine> {
        self.machines.get_mut(id)
    }

    /// Looks up a machine id by exact name.
    pub fn machine_id(&self, name: &str) -> Option<MachineId> {
        self.machines.id_by_name(name)
    }

    /// Renames a machine, keeping the name index consistent. The caller is
    /// responsible for re-bucketing when bucketed by machine name.
    pub fn rename_machine(&mut self, id: MachineId, new_name: impl Into<String>) -> bool {
        self.machines.rename(id, new_name)
    }

    /// Tombstones a machine. Callers retire machines only once emptied.
    pub fn retire_machine(&mut self, id: MachineId) {
        self.machines.retire(id);
    }

    /// Number of live machines.
    #[must_use]
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Ids of all live machines, sorted by machine name.
    #[must_use]
    pub fn machines_sorted(&self) -> Vec<MachineId> {
        self.machines.sorted_ids()
    }

    // ── Buckets ─────────────────────────────────────────────────────

    /// The key kind the store is currently indexed by.
    #[must_use]
    pub fn bucketed_by(&self) -> BucketKind {
        self.bucketed_by
    }

    /// Appends `item` to the bucket for `key`. No uniqueness check.
    pub fn add(&mut self, key: &str, item: Item) {
        self.totals.add(&item);
        self.buckets.entry(key.to_owned()).or_default().push(item);
    }

    /// Appends `item` under the key the current bucket kind derives for it.
    pub fn add_item(&mut self, item: Item) {
        let key = self.key_of(&item);
        self.add(&key, item);
    }

    /// Removes and returns an entire bucket.
    pub fn remove_bucket(&mut self, key: &str) -> Option<Vec<Item>> {
        let items = self.buckets.remove(key)?;
        for item in &items {
            self.totals.remove(item);
        }
        Some(items)
    }

    /// Removes the first item in `key`'s bucket that is value-equal to
    /// `item` and owned by the same machine. Returns `true` on removal.
    pub fn remove(&mut self, key: &str, item: &Item) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(pos) = bucket
            .iter()
            .position(|candidate| candidate.machine == item.machine && candidate.is_value_equal(item))
        else {
            return false;
        };
        let removed = bucket.remove(pos);
        self.totals.remove(&removed);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    /// Keeps only the items in `key`'s bucket for which `keep` returns
    /// `true`. Returns the number of items removed.
    pub fn retain(&mut self, key: &str, mut keep: impl FnMut(&Item) -> bool) -> usize {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return 0;
        };
        let totals = &mut self.totals;
        let before = bucket.len();
        bucket.retain(|item| {
            let kept = keep(item);
            if !kept {
                totals.remove(item);
            }
            kept
        });
        let removed = before - bucket.len();
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    /// Returns the items in `key`'s bucket, when present.
    pub fn bucket(&self, key: &str) -> Option<&[Item]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Returns the items in `key`'s bucket for in-place edits.
    ///
    /// The slice shape is fixed: additions and removals must go through
    /// [`ItemStore::add`] / [`ItemStore::remove`] so totals stay accurate.
    pub fn bucket_mut(&mut self, key: &str) -> Option<&mut [Item]> {
        self.buckets.get_mut(key).map(Vec::as_mut_slice)
    }

    /// Iterates current bucket keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.buckets.keys()
    }

    /// Returns all bucket keys, lexicographically sorted.
    ///
    /// Conversions iterate this snapshot so mutation during a pass cannot
    /// perturb traversal order.
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// Iterates `(key, items)` pairs in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &[Item])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Current running totals.
    #[must_use]
    pub fn totals(&self) -> StoreTotals {
        self.totals
    }

    /// Total stored items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.totals.items
    }

    // ── Re-bucketing and deduplication ──────────────────────────────

    /// Rebuilds every bucket using `kind` as the key extractor, then runs
    /// deduplication when `dedupe` is not [`DedupeMode::None`].
    ///
    /// Items missing the selected digest bucket under the empty key; the
    /// duplicate policy's hash/name rules still apply inside that bucket,
    /// so unrelated hashless items only merge on exact name equality.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the dedupe mode is incompatible with
    /// the bucket key, before any state is touched.
    pub fn bucket_by(&mut self, kind: BucketKind, dedupe: DedupeMode) -> Result<(), StoreError> {
        match dedupe {
            DedupeMode::Full if kind.digest_kind().is_none() => {
                return Err(StoreError::FullDedupeNeedsDigestKey(kind));
            }
            DedupeMode::Game if kind != BucketKind::MachineName => {
                return Err(StoreError::GameDedupeNeedsNameKey(kind));
            }
            _ => {}
        }

        self.bucketed_by = kind;
        let old = std::mem::take(&mut self.buckets);
        let mut next: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        for (_, items) in old {
            for item in items {
                let key = self.key_of(&item);
                next.entry(key).or_default().push(item);
            }
        }
        for items in next.values_mut() {
            items.sort_by(Item::cmp_deterministic);
        }
        self.buckets = next;

        if dedupe != DedupeMode::None {
            for items in self.buckets.values_mut() {
                let taken = std::mem::take(items);
                *items = dedupe::classify(taken);
            }
            self.recompute_totals();
        }
        Ok(())
    }

    /// Derives the bucket key the current kind assigns to `item`.
    pub(crate) fn key_of(&self, item: &Item) -> String {
        match self.bucketed_by.digest_kind() {
            None => self
                .machines
                .get(item.machine)
                .map_or_else(String::new, |m| m.name.clone()),
            Some(kind) => item.digests.hex(kind).unwrap_or_default(),
        }
    }

    // ── Soft delete ─────────────────────────────────────────────────

    /// Flags every item in `key`'s bucket for removal. Returns the number
    /// of newly flagged items.
    pub fn mark_bucket(&mut self, key: &str) -> usize {
        self.buckets.get_mut(key).map_or(0, |bucket| {
            let mut newly = 0;
            for item in bucket.iter_mut() {
                if !item.marked {
                    item.marked = true;
                    newly += 1;
                }
            }
            newly
        })
    }

    /// Number of items currently flagged for removal.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.buckets
            .values()
            .flatten()
            .filter(|item| item.marked)
            .count()
    }

    /// Physically removes every item flagged for removal.
    pub fn clear_marked(&mut self) {
        let totals = &mut self.totals;
        self.buckets.retain(|_, bucket| {
            bucket.retain(|item| {
                if item.marked {
                    totals.remove(item);
                    false
                } else {
                    true
                }
            });
            !bucket.is_empty()
        });
    }

    /// Retires every machine that owns no items.
    pub fn clear_empty(&mut self) {
        let mut owning: FxHashSet<MachineId> = FxHashSet::default();
        for items in self.buckets.values() {
            for item in items {
                owning.insert(item.machine);
            }
        }
        for id in self.machines.sorted_ids() {
            if !owning.contains(&id) {
                self.machines.retire(id);
            }
        }
    }

    fn recompute_totals(&mut self) {
        let mut totals = StoreTotals::default();
        for items in self.buckets.values() {
            for item in items {
                totals.add(item);
            }
        }
        self.totals = totals;
    }

    // ── Canonical hashing ───────────────────────────────────────────

    /// Computes a canonical hash of the entire catalog state.
    ///
    /// The traversal is strictly deterministic and independent of the
    /// current bucket key:
    /// 1. Header: `b"ROMSET_STATE_V1\0"`
    /// 2. Machine count (u64 LE)
    /// 3. Machines (sorted by name): name, description, parent tags, flags
    /// 4. Per machine: item count (u64 LE), then items in
    ///    [`Item::cmp_deterministic`] order with kind/status/size/merge-tag/
    ///    digest/slot framing
    ///
    /// All length prefixes are 8-byte little-endian. Changing any framing
    /// rule is a breaking change to catalog identity.
    #[must_use]
    pub fn canonical_state_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ROMSET_STATE_V1\0");

        let mut per_machine: BTreeMap<MachineId, Vec<&Item>> = BTreeMap::new();
        for items in self.buckets.values() {
            for item in items {
                per_machine.entry(item.machine).or_default().push(item);
            }
        }

        let ids = self.machines.sorted_ids();
        hasher.update(&(ids.len() as u64).to_le_bytes());
        for id in ids {
            let Some(machine) = self.machines.get(id) else {
                debug_assert!(false, "sorted_ids returned a dead machine id");
                continue;
            };
            hasher.update(b"M\0");
            frame_str(&mut hasher, &machine.name);
            frame_str(&mut hasher, &machine.description);
            frame_opt_str(&mut hasher, machine.clone_of.as_deref());
            frame_opt_str(&mut hasher, machine.rom_of.as_deref());
            frame_opt_str(&mut hasher, machine.sample_of.as_deref());
            hasher.update(&[u8::from(machine.is_bios) | (u8::from(machine.is_device) << 1)]);

            let mut items = per_machine.remove(&id).unwrap_or_default();
            items.sort_by(|a, b| a.cmp_deterministic(b));
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                hasher.update(b"I\0");
                frame_str(&mut hasher, item.kind.label());
                frame_str(&mut hasher, &item.name);
                frame_str(&mut hasher, item.status.label());
                match item.size {
                    Some(size) => {
                        hasher.update(b"\x01");
                        hasher.update(&size.to_le_bytes());
                    }
                    None => {
                        hasher.update(b"\x00");
                    }
                }
                frame_opt_str(&mut hasher, item.merge_tag.as_deref());
                item.digests.update_hasher(&mut hasher);
                hasher.update(&(item.slot_options.len() as u64).to_le_bytes());
                for option in &item.slot_options {
                    frame_str(&mut hasher, &option.name);
                    frame_str(&mut hasher, &option.device_name);
                    hasher.update(&[u8::from(option.default)]);
                }
            }
        }
        debug_assert!(
            per_machine.is_empty(),
            "items owned by machines absent from the arena"
        );
        *hasher.finalize().as_bytes()
    }

    /// Computes a hash of the set of **distinct content identities** in the
    /// catalog: for each digest-bearing item, its kind plus recorded digest
    /// texts. Item names, owning machines, and duplicates do not
    /// contribute, and items carrying no digests do not participate.
    ///
    /// Topology conversions relocate and duplicate content but never invent
    /// or destroy it, so this hash is invariant across them.
    #[must_use]
    pub fn content_identity_hash(&self) -> [u8; 32] {
        let mut entries: std::collections::BTreeSet<Vec<u8>> = std::collections::BTreeSet::new();
        for items in self.buckets.values() {
            for item in items {
                if item.digests.is_empty() {
                    continue;
                }
                let mut entry = Vec::new();
                entry.extend_from_slice(item.kind.label().as_bytes());
                entry.push(0);
                for kind in DigestKind::ALL {
                    if let Some(text) = item.digests.hex(kind) {
                        entry.extend_from_slice(kind.label().as_bytes());
                        entry.push(b':');
                        entry.extend_from_slice(text.as_bytes());
                        entry.push(0);
                    }
                }
                entries.insert(entry);
            }
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ROMSET_CONTENT_V1\0");
        hasher.update(&(entries.len() as u64).to_le_bytes());
        for entry in entries {
            hasher.update(&(entry.len() as u64).to_le_bytes());
            hasher.update(&entry);
        }
        *hasher.finalize().as_bytes()
    }
}

fn frame_str(hasher: &mut blake3::Hasher, text: &str) {
    hasher.update(&(text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
}

fn frame_opt_str(hasher: &mut blake3::Hasher, text: Option<&str>) {
    match text {
        Some(text) => {
            hasher.update(b"\x01");
            frame_str(hasher, text);
        }
        None => {
            hasher.update(b"\x00");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Crc32;

    fn seeded_store() -> (ItemStore, MachineId, MachineId) {
        let mut store = ItemStore::new();
        let x = store.ensure_machine(Machine::new("xevious"));
        let y = store.ensure_machine(Machine::new("yars"));

        let mut rom = Item::new(ItemKind::Rom, "a.bin", x);
        rom.digests.crc32 = Some(Crc32([0xaa; 4]));
        rom.size = Some(128);
        store.add("xevious", rom);

        let mut rom = Item::new(ItemKind::Rom, "b.bin", y);
        rom.digests.crc32 = Some(Crc32([0xbb; 4]));
        rom.size = Some(64);
        store.add("yars", rom);
        (store, x, y)
    }

    #[test]
    fn totals_track_adds_and_removes() {
        let (mut store, _, y) = seeded_store();
        assert_eq!(store.totals().items, 2);
        assert_eq!(store.totals().roms, 2);
        assert_eq!(store.totals().bytes, 192);
        assert_eq!(store.totals().with_crc32, 2);

        let removed = store.remove_bucket("yars");
        assert_eq!(removed.map(|v| v.len()), Some(1));
        assert_eq!(store.totals().items, 1);
        assert_eq!(store.totals().bytes, 128);
        let _ = y;
    }

    #[test]
    fn bucket_by_digest_rekeys_everything() {
        let (mut store, _, _) = seeded_store();
        store.bucket_by(BucketKind::Crc32, DedupeMode::None).unwrap();
        assert_eq!(
            store.sorted_keys(),
            vec!["aaaaaaaa".to_owned(), "bbbbbbbb".to_owned()]
        );
        store
            .bucket_by(BucketKind::MachineName, DedupeMode::None)
            .unwrap();
        assert_eq!(
            store.sorted_keys(),
            vec!["xevious".to_owned(), "yars".to_owned()]
        );
    }

    #[test]
    fn bucket_by_rejects_invalid_dedupe_combinations() {
        let (mut store, _, _) = seeded_store();
        assert_eq!(
            store.bucket_by(BucketKind::MachineName, DedupeMode::Full),
            Err(StoreError::FullDedupeNeedsDigestKey(BucketKind::MachineName))
        );
        assert_eq!(
            store.bucket_by(BucketKind::Crc32, DedupeMode::Game),
            Err(StoreError::GameDedupeNeedsNameKey(BucketKind::Crc32))
        );
        // Nothing was disturbed by the failed calls.
        assert_eq!(store.sorted_keys(), vec!["xevious".to_owned(), "yars".to_owned()]);
    }

    #[test]
    fn items_without_selected_digest_bucket_under_empty_key() {
        let (mut store, x, _) = seeded_store();
        store.add("xevious", Item::new(ItemKind::Sample, "boom", x));
        store.bucket_by(BucketKind::Crc32, DedupeMode::None).unwrap();
        assert_eq!(store.bucket("").map(<[Item]>::len), Some(1));
    }

    #[test]
    fn mark_and_clear_complete_soft_deletes() {
        let (mut store, _, _) = seeded_store();
        assert_eq!(store.mark_bucket("yars"), 1);
        assert_eq!(store.marked_count(), 1);
        store.clear_marked();
        assert_eq!(store.marked_count(), 0);
        assert!(store.bucket("yars").is_none());
        assert_eq!(store.totals().items, 1);

        store.clear_empty();
        assert_eq!(store.machine_id("yars"), None);
        assert!(store.machine_id("xevious").is_some());
    }

    #[test]
    fn canonical_state_hash_ignores_bucket_key_and_insertion_order() {
        let (mut store, _, _) = seeded_store();
        let baseline = store.canonical_state_hash();

        store.bucket_by(BucketKind::Crc32, DedupeMode::None).unwrap();
        assert_eq!(store.canonical_state_hash(), baseline);

        // Rebuild the same catalog with reversed insertion order.
        let mut other = ItemStore::new();
        let y = other.ensure_machine(Machine::new("yars"));
        let x = other.ensure_machine(Machine::new("xevious"));
        let mut rom = Item::new(ItemKind::Rom, "b.bin", y);
        rom.digests.crc32 = Some(Crc32([0xbb; 4]));
        rom.size = Some(64);
        other.add("yars", rom);
        let mut rom = Item::new(ItemKind::Rom, "a.bin", x);
        rom.digests.crc32 = Some(Crc32([0xaa; 4]));
        rom.size = Some(128);
        other.add("xevious", rom);

        assert_eq!(other.canonical_state_hash(), baseline);
    }

    #[test]
    fn content_identity_ignores_names_and_owners() {
        let (store, _, _) = seeded_store();
        let baseline = store.content_identity_hash();

        let mut moved = store.clone();
        // Relocate an item to the other machine under a new name: content
        // identity must not change.
        let mut items = moved.remove_bucket("yars").unwrap_or_default();
        let x = moved.machine_id("xevious").unwrap();
        for mut item in items.drain(..) {
            item.machine = x;
            item.name = format!("yars/{}", item.name);
            moved.add("xevious", item);
        }
        assert_eq!(moved.content_identity_hash(), baseline);
    }
}
