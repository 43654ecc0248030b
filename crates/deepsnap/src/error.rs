// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for flattening and type-table construction.

use thiserror::Error;

/// Errors reported by deepsnap.
///
/// Violations of the raw-pointer contract (dangling pointers, wrong counts,
/// cyclic graphs with detection disabled) are not reported here: they are
/// undefined behaviour of the `unsafe` entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Output buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    #[error("Output buffer must be aligned to {required} bytes")]
    MisalignedBuffer { required: usize },

    #[error("Type {type_name} requires {align}-byte alignment (max supported is 16)")]
    UnsupportedAlignment { type_name: &'static str, align: usize },

    #[error("Cycle detected: {type_name} at {address:#x} is already being copied")]
    CycleDetected {
        type_name: &'static str,
        address: usize,
    },

    #[error("Nesting depth exceeded limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("Type {type_name} has no structure type tag")]
    MissingStructureType { type_name: &'static str },

    #[error("Structure type {tag} already registered to {existing}, cannot register {new}")]
    DuplicateStructureType {
        tag: u32,
        existing: &'static str,
        new: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
