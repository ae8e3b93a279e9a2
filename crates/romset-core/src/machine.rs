// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Machine records and the arena that owns them.
//!
//! The clone/rom/sample/device relationships between machines stay implicit:
//! they are name-valued tag fields resolved through the arena's name index,
//! one hop at a time. No adjacency structure is materialised because no pass
//! needs more than single-hop lookups plus the device fixed point.

use rustc_hash::FxHashMap;

/// Non-owning handle to a machine slot in a [`MachineArena`].
///
/// Items store a `MachineId` instead of any machine reference, so moving an
/// item between machines is a re-key of this field rather than a shared
/// mutable alias. Ids are only meaningful against the arena that issued them.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MachineId(u32);

impl MachineId {
    /// Constructs an id from a raw slot index.
    ///
    /// Valid ids come from [`MachineArena::ensure`]; raw construction exists
    /// for fixtures and interop, and dangling ids simply resolve to `None`.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying raw slot index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named unit of packaging: a game, program, BIOS, or device.
///
/// Invariants
/// - `name` is unique within one arena; storage is case-sensitive.
/// - Each of `clone_of` / `rom_of` / `sample_of` names at most one parent.
///   The graph they induce is assumed acyclic; the engine does not verify
///   this.
/// - Tag fields are cleared by the detag step once a topology conversion
///   completes, so emitted catalogs are self-consistent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Machine {
    /// Unique machine name (the bucket key under machine-name bucketing).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parent machine this one is a software clone of.
    pub clone_of: Option<String>,
    /// Machine (usually a BIOS set) this one draws firmware items from.
    pub rom_of: Option<String>,
    /// Machine this one draws audio sample items from.
    pub sample_of: Option<String>,
    /// Whether this machine is a BIOS set.
    pub is_bios: bool,
    /// Whether this machine is a hardware device set.
    pub is_device: bool,
}

impl Machine {
    /// Creates a machine with the given name and no relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            clone_of: None,
            rom_of: None,
            sample_of: None,
            is_bios: false,
            is_device: false,
        }
    }

    /// Clears all parent tags (`clone_of`, `rom_of`, `sample_of`).
    pub fn detag(&mut self) {
        self.clone_of = None;
        self.rom_of = None;
        self.sample_of = None;
    }
}

/// Slot-indexed machine table with a name index.
///
/// Slots are never reused: retiring a machine tombstones its slot so that
/// stale `MachineId`s can never resolve to an unrelated machine.
#[derive(Clone, Debug, Default)]
pub struct MachineArena {
    slots: Vec<Option<Machine>>,
    by_name: FxHashMap<String, MachineId>,
}

impl MachineArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `machine`, inserting it when the name is new.
    ///
    /// When a machine with the same name already exists, the existing record
    /// is kept untouched and its id returned.
    pub fn ensure(&mut self, machine: Machine) -> MachineId {
        if let Some(&id) = self.by_name.get(&machine.name) {
            return id;
        }
        let id = MachineId(self.slots.len() as u32);
        self.by_name.insert(machine.name.clone(), id);
        self.slots.push(Some(machine));
        id
    }

    /// Returns the machine for `id`, if the slot is live.
    pub fn get(&self, id: MachineId) -> Option<&Machine> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to the machine for `id`, if live.
    ///
    /// Renames must go through [`MachineArena::rename`] so the name index
    /// stays consistent; this accessor is for tag/flag edits.
    pub fn get_mut(&mut self, id: MachineId) -> Option<&mut Machine> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Looks up a machine id by exact (case-sensitive) name.
    pub fn id_by_name(&self, name: &str) -> Option<MachineId> {
        self.by_name.get(name).copied()
    }

    /// Renames the machine for `id`, keeping the name index consistent.
    ///
    /// Returns `false` (and changes nothing) when the id is dead or the new
    /// name is already taken by a different machine.
    pub fn rename(&mut self, id: MachineId, new_name: impl Into<String>) -> bool {
        let new_name = new_name.into();
        match self.by_name.get(&new_name) {
            Some(&existing) if existing != id => return false,
            _ => {}
        }
        let Some(machine) = self.slots.get_mut(id.index()).and_then(Option::as_mut) else {
            return false;
        };
        self.by_name.remove(&machine.name);
        machine.name.clone_from(&new_name);
        self.by_name.insert(new_name, id);
        true
    }

    /// Tombstones the machine for `id` and drops it from the name index.
    ///
    /// Callers retire machines only once they own no items; the arena cannot
    /// check that on its own.
    pub fn retire(&mut self, id: MachineId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if let Some(machine) = slot.take() {
                self.by_name.remove(&machine.name);
            }
        }
    }

    /// Number of live machines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` when no live machines remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates over live machines in slot order.
    ///
    /// Slot order is insertion order, not name order; use
    /// [`MachineArena::sorted_ids`] where deterministic name order matters.
    pub fn iter(&self) -> impl Iterator<Item = (MachineId, &Machine)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|m| (MachineId(i as u32), m)))
    }

    /// Returns the ids of all live machines, sorted by machine name.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<MachineId> {
        let mut ids: Vec<(&str, MachineId)> = self
            .iter()
            .map(|(id, machine)| (machine.name.as_str(), id))
            .collect();
        ids.sort_unstable_by(|a, b| a.0.cmp(b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }
}
