// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// File-based configuration and its effect on a table's walk limits.

#![cfg(feature = "config-loaders")]

use deepsnap::vk::{self, ApplicationInfo, InstanceCreateInfo};
use deepsnap::{Error, FlattenConfig};
use std::io::Write;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "detect_cycles: false").unwrap();
    writeln!(file, "max_depth: 12").unwrap();

    let config = FlattenConfig::from_file(file.path()).unwrap();
    assert_eq!(config, FlattenConfig::new().detect_cycles(false).max_depth(12));
}

#[test]
fn test_partial_config_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_depth: 3").unwrap();

    let config = FlattenConfig::from_file(file.path()).unwrap();
    assert!(config.detect_cycles);
    assert_eq!(config.max_depth, Some(3));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FlattenConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.starts_with("Failed to read")));
}

#[test]
fn test_file_config_limits_depth() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_depth: 1").unwrap();
    let config = FlattenConfig::from_file(file.path()).unwrap();
    let table = vk::build_type_table().unwrap().with_config(config);

    let app = ApplicationInfo::default();
    let info = InstanceCreateInfo {
        p_application_info: &app,
        ..Default::default()
    };
    let err = unsafe { table.snapshot(std::slice::from_ref(&info)) }.unwrap_err();
    assert_eq!(err, Error::DepthExceeded { limit: 1 });

    // a lone root fits within one level
    let bare = InstanceCreateInfo::default();
    let snap = unsafe { table.snapshot(std::slice::from_ref(&bare)) }.unwrap();
    assert_eq!(snap.len(), std::mem::size_of::<InstanceCreateInfo>());
}
