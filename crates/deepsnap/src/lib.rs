// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # deepsnap - deep copies of pointer-laden records into one buffer
//!
//! Flattens a graph of `#[repr(C)]` records (pointer members, pointer arrays,
//! NUL-terminated strings, extension chains, tag-directed unions) into a
//! single contiguous buffer, rewriting every internal pointer so the copy is
//! self-contained.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepsnap::vk::{self, ApplicationInfo, InstanceCreateInfo};
//!
//! fn capture(info: &InstanceCreateInfo) -> deepsnap::Result<()> {
//!     let table = vk::type_table();
//!     // SAFETY: `info` and everything it points to is valid.
//!     let snap = unsafe { table.snapshot(std::slice::from_ref(info))? };
//!     let copy = snap.root().expect("one record");
//!     assert!(copy.p_application_info.is_null() || snap.contains(copy.p_application_info));
//!     Ok(())
//! }
//! # let _ = capture;
//! # let _ = ApplicationInfo::default();
//! ```
//!
//! ## Buffer Layout
//!
//! ```text
//! +----------------+----------------+------------------------------------+
//! | root record 0  | root record 1  | pointees, depth-first, each aligned |
//! +----------------+----------------+------------------------------------+
//! ^ offset 0                         ^ size_of::<T>() * count
//! ```
//!
//! Every relocated pointer in the copy holds `out + offset`. Both the
//! measurement pass (null output) and the copy pass compute the same size.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DeepCopy`] | Record with a static descriptor, usually derived |
//! | [`TypeTable`] | Structure-type registry and flattening entry points |
//! | [`Snapshot`] | Owned, 16-byte aligned flattened copy |
//! | [`FlattenConfig`] | Cycle detection and depth limit |
//! | [`UnionResolver`] | Tag-directed traversal of a union member |

extern crate self as deepsnap;

pub mod config;
pub mod descriptor;
mod engine;
pub mod error;
mod primitives;
mod relocate;
pub mod snapshot;
pub mod table;
pub mod union;
pub mod vk;

pub use config::FlattenConfig;
pub use deepsnap_codegen::DeepCopy;
pub use descriptor::{
    CountFn, DeepCopy, DescriptorFn, ElementCount, MemberDescriptor, MemberKind, Pointee,
    RecordDescriptor,
};
pub use error::{Error, Result};
pub use snapshot::{Snapshot, TaggedSnapshot};
pub use table::{TypeTable, TypeTableBuilder};
pub use union::{UnionResolver, UnionVariant};

/// Largest record alignment the engine places; owned buffers use it too.
pub const MAX_ALIGN: usize = 16;
