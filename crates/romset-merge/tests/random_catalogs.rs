// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Randomized conversion properties.
//!
//! Conversions are deterministic and pure, so correctness issues are
//! property-test targets rather than runtime-retry targets: any random
//! acyclic catalog must conserve content identity under every topology,
//! and insertion order must never matter.

use proptest::prelude::*;
use romset_core::{Crc32, Item, ItemKind, ItemStore, Machine};
use romset_merge::{apply_topology, MergeContext, Topology};

const ALL_TOPOLOGIES: [Topology; 5] = [
    Topology::Split,
    Topology::Merged,
    Topology::NonMerged,
    Topology::DeviceNonMerged,
    Topology::FullyNonMerged,
];

#[derive(Clone, Debug)]
struct MachineShape {
    clone_of_earlier: Option<prop::sample::Index>,
    is_device: bool,
}

#[derive(Clone, Debug)]
struct CatalogShape {
    machines: Vec<MachineShape>,
    /// (machine, item name, crc) triples.
    roms: Vec<(prop::sample::Index, u8, u8)>,
    /// (machine, referenced machine) device references.
    device_refs: Vec<(prop::sample::Index, prop::sample::Index)>,
}

fn machine_shape() -> impl Strategy<Value = MachineShape> {
    (proptest::option::of(any::<prop::sample::Index>()), any::<bool>()).prop_map(
        |(clone_of_earlier, is_device)| MachineShape {
            clone_of_earlier,
            is_device,
        },
    )
}

fn catalog_shape() -> impl Strategy<Value = CatalogShape> {
    (
        proptest::collection::vec(machine_shape(), 1..6),
        proptest::collection::vec((any::<prop::sample::Index>(), 0u8..5, any::<u8>()), 0..20),
        proptest::collection::vec(
            (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
            0..6,
        ),
    )
        .prop_map(|(machines, roms, device_refs)| CatalogShape {
            machines,
            roms,
            device_refs,
        })
}

/// Materializes a shape. Clone edges only ever point at earlier machines,
/// so the clone graph is acyclic by construction; device references may
/// form cycles on purpose (the engine must still converge).
fn build(shape: &CatalogShape) -> ItemStore {
    let mut store = ItemStore::new();
    let count = shape.machines.len();
    let name_of = |index: usize| format!("m{index:02}");

    for (index, machine_shape) in shape.machines.iter().enumerate() {
        let mut machine = Machine::new(name_of(index));
        machine.is_device = machine_shape.is_device;
        if index > 0 {
            if let Some(parent) = &machine_shape.clone_of_earlier {
                machine.clone_of = Some(name_of(parent.index(index)));
            }
        }
        store.ensure_machine(machine);
    }
    for (machine_index, name, crc) in &shape.roms {
        let owner = name_of(machine_index.index(count));
        let id = store.ensure_machine(Machine::new(owner.clone()));
        let mut item = Item::new(ItemKind::Rom, format!("r{name}.bin"), id);
        item.digests.crc32 = Some(Crc32([*crc; 4]));
        item.size = Some(u64::from(*crc));
        store.add(&owner, item);
    }
    for (machine_index, target_index) in &shape.device_refs {
        let owner = name_of(machine_index.index(count));
        let target = name_of(target_index.index(count));
        let id = store.ensure_machine(Machine::new(owner.clone()));
        store.add(&owner, Item::new(ItemKind::DeviceRef, target, id));
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn conversions_conserve_content_identity(shape in catalog_shape()) {
        let base = build(&shape);
        let identity = base.content_identity_hash();

        for topology in ALL_TOPOLOGIES {
            let mut store = base.clone();
            prop_assert!(
                apply_topology(&mut store, topology, &MergeContext::new()).is_ok(),
                "{topology} failed on an acyclic clone graph"
            );
            prop_assert_eq!(
                store.content_identity_hash(),
                identity,
                "{} must conserve content identity",
                topology
            );
        }
    }

    #[test]
    fn conversions_are_deterministic(shape in catalog_shape()) {
        for topology in ALL_TOPOLOGIES {
            let mut a = build(&shape);
            let mut b = build(&shape);
            prop_assert!(apply_topology(&mut a, topology, &MergeContext::new()).is_ok());
            prop_assert!(
                apply_topology(&mut b, topology, &MergeContext::new().with_workers(4)).is_ok()
            );
            prop_assert_eq!(a.canonical_state_hash(), b.canonical_state_hash());
        }
    }
}
