// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Item records: the content units machines own.

use std::cmp::Ordering;

use crate::digest::{DigestKind, DigestSet};
use crate::machine::MachineId;

/// The kind of content or metadata an item represents.
///
/// Only [`ItemKind::carries_digests`] kinds address file content; the rest
/// are structural or descriptive entries carried through conversions
/// untouched by hash-based logic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ItemKind {
    /// A ROM image.
    Rom,
    /// A disk (hard disk / optical) image.
    Disk,
    /// A media image (softlist-style).
    Media,
    /// An audio sample.
    Sample,
    /// A reference to a device machine this machine depends on. The item's
    /// `name` is the referenced machine's name.
    DeviceRef,
    /// An expansion slot and its pluggable options.
    Slot,
    /// A selectable BIOS variant entry.
    BiosSet,
    /// A release/region metadata entry.
    Release,
}

impl ItemKind {
    /// All item kinds in canonical framing order.
    pub const ALL: [Self; 8] = [
        Self::Rom,
        Self::Disk,
        Self::Media,
        Self::Sample,
        Self::DeviceRef,
        Self::Slot,
        Self::BiosSet,
        Self::Release,
    ];

    /// Stable lowercase label, used in hash framing and messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rom => "rom",
            Self::Disk => "disk",
            Self::Media => "media",
            Self::Sample => "sample",
            Self::DeviceRef => "device_ref",
            Self::Slot => "slot",
            Self::BiosSet => "biosset",
            Self::Release => "release",
        }
    }

    /// Whether this kind addresses file content via digests.
    #[must_use]
    pub fn carries_digests(self) -> bool {
        matches!(self, Self::Rom | Self::Disk | Self::Media | Self::Sample)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Dump status recorded for a content item.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum ItemStatus {
    /// No status recorded.
    #[default]
    None,
    /// Known-good dump.
    Good,
    /// Dump known to be bad.
    BadDump,
    /// No dump exists; digests (if any) are placeholders. A nodump item is
    /// never a duplicate of a dumped one, whatever the digests say.
    Nodump,
    /// Dump verified against multiple sources.
    Verified,
}

impl ItemStatus {
    /// Stable lowercase label, used in hash framing.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Good => "good",
            Self::BadDump => "baddump",
            Self::Nodump => "nodump",
            Self::Verified => "verified",
        }
    }
}

/// One pluggable option of a [`ItemKind::Slot`] item.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SlotOption {
    /// Option name within the slot.
    pub name: String,
    /// Name of the device machine this option plugs in.
    pub device_name: String,
    /// Whether this option is the default selection.
    pub default: bool,
}

/// Duplicate classification flags. Derived data: recomputed by every
/// deduplication run, never set by callers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct DupeFlags(u8);

impl DupeFlags {
    /// No duplicates observed.
    pub const NONE: Self = Self(0);
    /// A duplicate was observed within the same machine.
    pub const INTERNAL: Self = Self(1);
    /// A duplicate was observed in a different machine.
    pub const EXTERNAL: Self = Self(1 << 1);

    /// Returns `true` when every flag in `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets every flag in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Returns `true` when no flag is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A content or metadata unit owned by exactly one machine.
///
/// Invariants
/// - `machine` names the owning machine's arena slot; exactly one machine
///   owns an item at any time. Conversions transfer ownership by re-keying
///   this field, never by sharing.
/// - `dupe` and `marked` are store bookkeeping, excluded from value
///   equality.
/// - `slot_options` is non-empty only for [`ItemKind::Slot`] items.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Item {
    /// Item name (a file path within the machine's set for content kinds).
    pub name: String,
    /// What this item is.
    pub kind: ItemKind,
    /// Recorded digests; each kind independently optional.
    pub digests: DigestSet,
    /// File size in bytes, when known.
    pub size: Option<u64>,
    /// Dump status.
    pub status: ItemStatus,
    /// Name of the equivalent item in a designated ancestor machine, used to
    /// short-circuit re-adding it when sets are folded together.
    pub merge_tag: Option<String>,
    /// Slot options, for [`ItemKind::Slot`] items.
    pub slot_options: Vec<SlotOption>,
    /// Owning machine.
    pub machine: MachineId,
    /// Duplicate classification (derived; see [`DupeFlags`]).
    pub dupe: DupeFlags,
    /// Soft-delete flag; [`crate::ItemStore::clear_marked`] completes it.
    pub marked: bool,
}

impl Item {
    /// Creates an item of `kind` named `name`, owned by `machine`, with no
    /// digests and default bookkeeping.
    pub fn new(kind: ItemKind, name: impl Into<String>, machine: MachineId) -> Self {
        Self {
            name: name.into(),
            kind,
            digests: DigestSet::default(),
            size: None,
            status: ItemStatus::default(),
            merge_tag: None,
            slot_options: Vec::new(),
            machine,
            dupe: DupeFlags::NONE,
            marked: false,
        }
    }

    /// Structural value equality, ignoring ownership and store bookkeeping
    /// (`machine`, `dupe`, `marked`) and the merge tag, which describes how
    /// an item relates to an ancestor rather than what the item is.
    ///
    /// This is the comparison conversions use to decide whether a child item
    /// is "the same thing" as an ancestor's item — a merge-tagged clone
    /// entry still matches the parent's untagged copy.
    #[must_use]
    pub fn is_value_equal(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.size == other.size
            && self.status == other.status
            && self.digests == other.digests
            && self.slot_options == other.slot_options
    }

    /// Returns `true` when this item has the same kind and the same name as
    /// the given pair, compared ASCII-case-insensitively.
    ///
    /// This is the *name-based* addition guard copy passes use — distinct
    /// from the hash-based duplicate policy, by design: a renamed but
    /// byte-identical file will be duplicated across machines by copy
    /// passes, exactly as the hashless name fallback would treat it.
    #[must_use]
    pub fn matches_kind_and_name(&self, kind: ItemKind, name: &str) -> bool {
        self.kind == kind && self.name.eq_ignore_ascii_case(name)
    }

    /// Total order used to keep bucket contents deterministic.
    ///
    /// Orders by name, then kind, then digest text in canonical kind order,
    /// then owning machine slot. Bookkeeping fields do not participate.
    #[must_use]
    pub fn cmp_deterministic(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| {
                for kind in DigestKind::ALL {
                    let ord = self.digests.hex(kind).cmp(&other.digests.hex(kind));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
            .then_with(|| self.machine.cmp(&other.machine))
    }
}
