// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for conversion tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use romset_core::{
    Crc32, Item, ItemKind, ItemStore, Machine, PassSink, SlotOption,
};

// ── Machine shorthands ──────────────────────────────────────────────

pub fn machine(name: &str) -> Machine {
    Machine::new(name)
}

pub fn clone_of(name: &str, parent: &str) -> Machine {
    let mut m = Machine::new(name);
    m.clone_of = Some(parent.to_owned());
    m
}

pub fn bios(name: &str) -> Machine {
    let mut m = Machine::new(name);
    m.is_bios = true;
    m
}

pub fn bios_user(name: &str, bios: &str) -> Machine {
    let mut m = Machine::new(name);
    m.rom_of = Some(bios.to_owned());
    m
}

pub fn device(name: &str) -> Machine {
    let mut m = Machine::new(name);
    m.is_device = true;
    m
}

// ── Catalog builder ─────────────────────────────────────────────────

/// Builds an `ItemStore` in machine-name bucketing, the state parsers
/// hand over.
pub struct CatalogBuilder {
    store: ItemStore,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            store: ItemStore::new(),
        }
    }

    /// Registers a machine with its tags/flags. Define machines before
    /// adding their items; later definitions of the same name are ignored.
    pub fn with(mut self, machine: Machine) -> Self {
        self.store.ensure_machine(machine);
        self
    }

    pub fn rom(self, machine: &str, name: &str, crc: u8) -> Self {
        self.content(machine, ItemKind::Rom, name, crc, None)
    }

    pub fn rom_tagged(self, machine: &str, name: &str, crc: u8, merge_tag: &str) -> Self {
        self.content(machine, ItemKind::Rom, name, crc, Some(merge_tag))
    }

    pub fn disk(self, machine: &str, name: &str, crc: u8) -> Self {
        self.content(machine, ItemKind::Disk, name, crc, None)
    }

    pub fn disk_tagged(self, machine: &str, name: &str, crc: u8, merge_tag: &str) -> Self {
        self.content(machine, ItemKind::Disk, name, crc, Some(merge_tag))
    }

    pub fn sample(mut self, machine: &str, name: &str) -> Self {
        let id = self.store.ensure_machine(Machine::new(machine));
        self.store.add(machine, Item::new(ItemKind::Sample, name, id));
        self
    }

    pub fn device_ref(mut self, machine: &str, target: &str) -> Self {
        let id = self.store.ensure_machine(Machine::new(machine));
        self.store
            .add(machine, Item::new(ItemKind::DeviceRef, target, id));
        self
    }

    pub fn slot(mut self, machine: &str, slot_name: &str, option_device: &str) -> Self {
        let id = self.store.ensure_machine(Machine::new(machine));
        let mut item = Item::new(ItemKind::Slot, slot_name, id);
        item.slot_options.push(SlotOption {
            name: format!("{option_device}0"),
            device_name: option_device.to_owned(),
            default: true,
        });
        self.store.add(machine, item);
        self
    }

    fn content(
        mut self,
        machine: &str,
        kind: ItemKind,
        name: &str,
        crc: u8,
        merge_tag: Option<&str>,
    ) -> Self {
        let id = self.store.ensure_machine(Machine::new(machine));
        let mut item = Item::new(kind, name, id);
        item.digests.crc32 = Some(Crc32([crc; 4]));
        item.size = Some(u64::from(crc));
        item.merge_tag = merge_tag.map(str::to_owned);
        self.store.add(machine, item);
        self
    }

    pub fn build(self) -> ItemStore {
        self.store
    }
}

// ── Inspection helpers ──────────────────────────────────────────────

/// One line per stored item: `machine|kind|name|crc`. Bucket-key
/// independent, so inventories from differently bucketed stores compare.
pub fn inventory(store: &ItemStore) -> BTreeSet<String> {
    let mut lines = BTreeSet::new();
    for (_, items) in store.iter() {
        for item in items {
            let owner = store
                .machine(item.machine)
                .map_or_else(|| "<dead>".to_owned(), |m| m.name.clone());
            let crc = item
                .digests
                .crc32
                .map_or_else(|| "-".to_owned(), |d| d.to_string());
            lines.insert(format!("{owner}|{}|{}|{crc}", item.kind, item.name));
        }
    }
    lines
}

/// The `(kind, name)` pairs a machine owns, deterministically ordered.
pub fn kinds_and_names(store: &ItemStore, machine: &str) -> Vec<(ItemKind, String)> {
    let mut out: Vec<(ItemKind, String)> = store
        .bucket(machine)
        .unwrap_or(&[])
        .iter()
        .map(|item| (item.kind, item.name.clone()))
        .collect();
    out.sort();
    out
}

pub fn has_rom(store: &ItemStore, machine: &str, name: &str, crc: u8) -> bool {
    store.bucket(machine).unwrap_or(&[]).iter().any(|item| {
        item.kind == ItemKind::Rom && item.name == name && item.digests.crc32 == Some(Crc32([crc; 4]))
    })
}

/// Snapshot of every machine's parent tags, for round-trip tests that
/// must survive the detag step.
pub fn tag_snapshot(store: &ItemStore) -> Vec<(String, Option<String>, Option<String>, Option<String>)> {
    store
        .machines_sorted()
        .into_iter()
        .filter_map(|id| store.machine(id))
        .map(|m| {
            (
                m.name.clone(),
                m.clone_of.clone(),
                m.rom_of.clone(),
                m.sample_of.clone(),
            )
        })
        .collect()
}

pub fn restore_tags(
    store: &mut ItemStore,
    snapshot: &[(String, Option<String>, Option<String>, Option<String>)],
) {
    for (name, clone_of, rom_of, sample_of) in snapshot {
        if let Some(id) = store.machine_id(name) {
            if let Some(machine) = store.machine_mut(id) {
                machine.clone_of.clone_from(clone_of);
                machine.rom_of.clone_from(rom_of);
                machine.sample_of.clone_from(sample_of);
            }
        }
    }
}

// ── Recording sink ──────────────────────────────────────────────────

/// Sink that records skip events for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub skipped: Mutex<Vec<(String, String, String)>>,
}

impl PassSink for RecordingSink {
    fn on_machine_skipped(&self, pass: &str, machine: &str, missing: &str) {
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push((pass.to_owned(), machine.to_owned(), missing.to_owned()));
        }
    }
}
