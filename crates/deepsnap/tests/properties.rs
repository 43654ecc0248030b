// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Randomized device-creation graphs: sizing is reproducible, every pointer in
// a copy lands inside its own buffer, and a shared table flattens from many
// threads at once.

#![allow(clippy::cast_possible_truncation)]

use deepsnap::vk::*;
use deepsnap::Snapshot;
use std::ffi::{c_char, CStr, CString};
use std::mem::size_of;
use std::ptr;

/// Owned source graph; `info` points into the heap storage next to it.
struct DeviceGraph {
    priorities: Vec<Vec<f32>>,
    queues: Vec<DeviceQueueCreateInfo>,
    layers: Vec<CString>,
    _layer_ptrs: Vec<*const c_char>,
    extensions: Vec<CString>,
    _extension_ptrs: Vec<*const c_char>,
    enables: Vec<u32>,
    validation: Option<Box<ValidationFeaturesEXT>>,
    features: Option<Box<PhysicalDeviceFeatures>>,
    info: DeviceCreateInfo,
}

fn random_name(rng: &mut fastrand::Rng) -> CString {
    let len = rng.usize(1..24);
    let name: String = std::iter::repeat_with(|| rng.alphanumeric()).take(len).collect();
    CString::new(name).unwrap()
}

impl DeviceGraph {
    fn random(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);

        let priorities: Vec<Vec<f32>> = (0..rng.usize(0..5))
            .map(|_| (0..rng.usize(1..5)).map(|_| rng.f32()).collect())
            .collect();
        let queues: Vec<DeviceQueueCreateInfo> = priorities
            .iter()
            .enumerate()
            .map(|(family, list)| DeviceQueueCreateInfo {
                queue_family_index: family as u32,
                queue_count: list.len() as u32,
                p_queue_priorities: list.as_ptr(),
                ..Default::default()
            })
            .collect();

        let layers: Vec<CString> = (0..rng.usize(0..3)).map(|_| random_name(&mut rng)).collect();
        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|name| name.as_ptr()).collect();
        let extensions: Vec<CString> =
            (0..rng.usize(0..6)).map(|_| random_name(&mut rng)).collect();
        let extension_ptrs: Vec<*const c_char> =
            extensions.iter().map(|name| name.as_ptr()).collect();

        let enables: Vec<u32> = (0..rng.usize(0..4)).map(|_| rng.u32(0..5)).collect();
        let validation = rng.bool().then(|| {
            Box::new(ValidationFeaturesEXT {
                enabled_validation_feature_count: enables.len() as u32,
                p_enabled_validation_features: if enables.is_empty() {
                    ptr::null()
                } else {
                    enables.as_ptr()
                },
                ..Default::default()
            })
        });
        let features = rng.bool().then(|| {
            Box::new(PhysicalDeviceFeatures {
                geometry_shader: rng.u32(0..2),
                sampler_anisotropy: rng.u32(0..2),
                shader_int64: rng.u32(0..2),
                ..Default::default()
            })
        });

        let info = DeviceCreateInfo {
            p_next: validation
                .as_deref()
                .map_or(ptr::null(), |v| ptr::from_ref(v).cast()),
            queue_create_info_count: queues.len() as u32,
            p_queue_create_infos: queues.as_ptr(),
            enabled_layer_count: layer_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            enabled_extension_count: extension_ptrs.len() as u32,
            pp_enabled_extension_names: extension_ptrs.as_ptr(),
            p_enabled_features: features.as_deref().map_or(ptr::null(), ptr::from_ref),
            ..Default::default()
        };

        Self {
            priorities,
            queues,
            layers,
            _layer_ptrs: layer_ptrs,
            extensions,
            _extension_ptrs: extension_ptrs,
            enables,
            validation,
            features,
            info,
        }
    }

    /// Buffer size derived from the layout rules: depth-first, each region
    /// padded to its own alignment.
    fn expected_size(&self) -> usize {
        let pad = |at: usize, align: usize| (at + align - 1) & !(align - 1);
        let mut at = size_of::<DeviceCreateInfo>();
        if self.validation.is_some() {
            at = pad(at, 8) + size_of::<ValidationFeaturesEXT>();
            if !self.enables.is_empty() {
                at = pad(at, 4) + 4 * self.enables.len();
            }
        }
        if !self.queues.is_empty() {
            at = pad(at, 8) + self.queues.len() * size_of::<DeviceQueueCreateInfo>();
            for list in &self.priorities {
                at = pad(at, 4) + 4 * list.len();
            }
        }
        for names in [&self.layers, &self.extensions] {
            if !names.is_empty() {
                at = pad(at, 8) + 8 * names.len();
                at += names.iter().map(|n| n.as_bytes_with_nul().len()).sum::<usize>();
            }
        }
        if self.features.is_some() {
            at = pad(at, 4) + size_of::<PhysicalDeviceFeatures>();
        }
        at
    }

    /// Compare a copy against this graph, requiring every non-null pointer
    /// to land inside the copy.
    fn verify(&self, snap: &Snapshot<DeviceCreateInfo>) {
        let copy = snap.root().unwrap();

        match &self.validation {
            Some(_) => {
                assert!(snap.contains(copy.p_next));
                let tail = unsafe { &*copy.p_next.cast::<ValidationFeaturesEXT>() };
                if self.enables.is_empty() {
                    assert!(tail.p_enabled_validation_features.is_null());
                } else {
                    assert!(snap.contains(tail.p_enabled_validation_features));
                    let copied = unsafe {
                        std::slice::from_raw_parts(
                            tail.p_enabled_validation_features,
                            self.enables.len(),
                        )
                    };
                    assert_eq!(copied, &self.enables[..]);
                }
            }
            None => assert!(copy.p_next.is_null()),
        }

        if self.queues.is_empty() {
            assert!(copy.p_queue_create_infos.is_null());
        } else {
            assert!(snap.contains(copy.p_queue_create_infos));
            let queues =
                unsafe { std::slice::from_raw_parts(copy.p_queue_create_infos, self.queues.len()) };
            for (queue, list) in queues.iter().zip(&self.priorities) {
                assert!(snap.contains(queue.p_queue_priorities));
                let copied = unsafe {
                    std::slice::from_raw_parts(queue.p_queue_priorities, list.len())
                };
                assert_eq!(copied, &list[..]);
            }
        }

        for (names, slots) in [
            (&self.layers, copy.pp_enabled_layer_names),
            (&self.extensions, copy.pp_enabled_extension_names),
        ] {
            if names.is_empty() {
                assert!(slots.is_null());
                continue;
            }
            assert!(snap.contains(slots));
            let slots = unsafe { std::slice::from_raw_parts(slots, names.len()) };
            for (slot, name) in slots.iter().zip(names) {
                assert!(snap.contains(*slot));
                assert_eq!(unsafe { CStr::from_ptr(*slot) }, name.as_c_str());
            }
        }

        match &self.features {
            Some(features) => {
                assert!(snap.contains(copy.p_enabled_features));
                assert_eq!(unsafe { *copy.p_enabled_features }, **features);
            }
            None => assert!(copy.p_enabled_features.is_null()),
        }
    }
}

#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct Block([u8; 16]);

fn aligned_storage(len: usize) -> Vec<Block> {
    vec![Block([0; 16]); len.div_ceil(16)]
}

#[test]
fn test_random_graphs_match_layout() {
    let table = type_table();
    for seed in 0..128 {
        let graph = DeviceGraph::random(seed);
        let records = std::slice::from_ref(&graph.info);

        let size = unsafe { table.measure(records) }.unwrap();
        assert_eq!(size, graph.expected_size(), "seed {seed}");
        assert_eq!(unsafe { table.measure(records) }.unwrap(), size, "seed {seed}");

        let snap = unsafe { table.snapshot(records) }.unwrap();
        assert_eq!(snap.len(), size, "seed {seed}");
        graph.verify(&snap);
    }
}

#[test]
fn test_caller_buffer_matches_snapshot() {
    let table = type_table();
    for seed in 200..232 {
        let graph = DeviceGraph::random(seed);
        let records = std::slice::from_ref(&graph.info);
        let size = unsafe { table.measure(records) }.unwrap();

        let mut storage = aligned_storage(size + 64);
        let out = unsafe {
            std::slice::from_raw_parts_mut(storage.as_mut_ptr().cast::<u8>(), storage.len() * 16)
        };
        let written = unsafe { table.flatten_into(records, out) }.unwrap();
        assert_eq!(written, size, "seed {seed}");

        // identical bytes once both copies are rebased
        let snap = unsafe { table.snapshot(records) }.unwrap();
        let copy = unsafe { &*out.as_ptr().cast::<DeviceCreateInfo>() };
        let root = snap.root().unwrap();
        let rebase = |p: usize, base: usize| if p == 0 { 0 } else { p - base };
        assert_eq!(
            rebase(copy.p_queue_create_infos as usize, out.as_ptr() as usize),
            rebase(root.p_queue_create_infos as usize, snap.as_bytes().as_ptr() as usize),
        );
        assert_eq!(
            rebase(copy.p_enabled_features as usize, out.as_ptr() as usize),
            rebase(root.p_enabled_features as usize, snap.as_bytes().as_ptr() as usize),
        );
    }
}

#[test]
fn test_flatten_from_many_threads() {
    let table = type_table();
    let snapshots: Vec<(u64, Snapshot<DeviceCreateInfo>)> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8u64)
            .map(|worker| {
                scope.spawn(move || {
                    (0..16u64)
                        .map(|i| {
                            let seed = 1000 + worker * 16 + i;
                            let graph = DeviceGraph::random(seed);
                            let snap =
                                unsafe { table.snapshot(std::slice::from_ref(&graph.info)) }
                                    .unwrap();
                            (seed, snap)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });

    assert_eq!(snapshots.len(), 128);
    // the source graphs are gone; rebuild them from their seeds to compare
    for (seed, snap) in &snapshots {
        let graph = DeviceGraph::random(*seed);
        assert_eq!(snap.len(), graph.expected_size(), "seed {seed}");
        graph.verify(snap);
    }
}
