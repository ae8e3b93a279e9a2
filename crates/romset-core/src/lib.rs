// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! romset-core: bucketed item store and duplicate resolution for
//! preservation catalogs.
//!
//! A catalog enumerates **machines** (games/programs) and the
//! content-addressed **items** each machine owns, identified by zero or more
//! digests (CRC32 through SHA-512, plus fuzzy spamsum). This crate provides
//! the in-memory substrate every transform operates on: the
//! [`MachineArena`], the re-keyable [`ItemStore`], the hash-aware duplicate
//! policy in [`dedupe`], and canonical BLAKE3 fingerprints of catalog
//! content.
//!
//! # Determinism Invariant
//!
//! Buckets are `BTreeMap`-backed and bucket contents are kept in a total
//! order, so every iteration a caller can observe is deterministic. The
//! canonical hashes ([`ItemStore::canonical_state_hash`],
//! [`ItemStore::content_identity_hash`]) depend only on catalog content,
//! never on insertion order or on the currently selected bucket key.
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

pub mod dedupe;
mod digest;
mod item;
mod machine;
mod store;
mod telemetry;

/// Digest value types and the per-item digest set.
pub use digest::{
    Crc32, DigestError, DigestKind, DigestOverlap, DigestSet, Md5, Sha1, Sha256, Sha384, Sha512,
    SpamSum,
};
/// Item record types and duplicate bookkeeping flags.
pub use item::{DupeFlags, Item, ItemKind, ItemStatus, SlotOption};
/// Machine records and the arena that owns them.
pub use machine::{Machine, MachineArena, MachineId};
/// The bucketed item store and its configuration surface.
pub use store::{BucketKind, DedupeMode, ItemStore, StoreError, StoreTotals};
/// Pass event sink for injected observability.
pub use telemetry::{NullPassSink, PassSink};
