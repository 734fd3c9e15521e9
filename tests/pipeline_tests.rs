// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Tests for the full pipeline: load a module directory from disk,
//! dispatch its test-build unit, and check the printed output and summary.

use parallelize::dispatch::run_units;
use parallelize::loader::{load_module, LoadError};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

const USER_GO: &str = r#"package user

type User struct {
	Name string
}

func getUserProfile(id int) string {
	if id == 1 {
		return "alice"
	}
	return ""
}
"#;

const USER_TEST_GO: &str = r#"package user

import "testing"

func TestGetUserProfile(t *testing.T) {
	tests := []struct {
		name string
		id int
		want string
	}{
		{"known user", 1, "alice"},
		{"unknown user", 99, ""},
	}
	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {
			got := getUserProfile(tt.id)
			if got != tt.want {
				t.Errorf("got %q, want %q", got, tt.want)
			}
		})
	}
}
"#;

#[test]
fn test_module_load_builds_plain_and_test_units() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("user.go"), USER_GO).unwrap();
    fs::write(dir.path().join("user_test.go"), USER_TEST_GO).unwrap();

    let units = load_module(dir.path()).unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, "user");
    assert!(!units[0].is_test_build());
    assert_eq!(units[1].id, "user [user.test]");
    assert!(units[1].is_test_build());
    // The test build carries every file of the package.
    assert_eq!(units[0].trees.len(), 1);
    assert_eq!(units[1].trees.len(), 2);
}

#[test]
fn test_run_rewrites_and_prints_only_test_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("user.go"), USER_GO).unwrap();
    fs::write(dir.path().join("user_test.go"), USER_TEST_GO).unwrap();

    let units = load_module(dir.path()).unwrap();
    let sink = Mutex::new(Vec::new());
    let summary = run_units(dir.path(), units, &sink).unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

    assert!(!out.contains("type User struct"));
    assert!(out.contains("for _, tt := range tests {\n\t\ttt := tt"));
    assert!(out.contains("t.Run(tt.name, func(t *testing.T) {\n\t\t\tt.Parallel()"));

    assert_eq!(summary.units.len(), 1);
    assert_eq!(summary.units[0].unit, "user [user.test]");
    let file = &summary.units[0].files[0];
    assert_eq!(file.functions, 1);
    assert_eq!(file.table_fixed, 1);
}

#[test]
fn test_test_only_module() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("smoke_test.go"),
        "package smoke\n\nimport \"testing\"\n\nfunc TestSmoke(t *testing.T) {\n\tprobe()\n}\n",
    )
    .unwrap();

    let units = load_module(dir.path()).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id, "smoke [smoke.test]");

    let sink = Mutex::new(Vec::new());
    run_units(dir.path(), units, &sink).unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert!(out.contains("func TestSmoke(t *testing.T) {\n\tt.Parallel()\n\tprobe()"));
}

#[test]
fn test_multiple_test_files_each_print_whole() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a_test.go"),
        "package demo\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {\n\ta()\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("b_test.go"),
        "package demo\n\nimport \"testing\"\n\nfunc TestB(t *testing.T) {\n\tb()\n}\n",
    )
    .unwrap();

    let units = load_module(dir.path()).unwrap();
    let sink = Mutex::new(Vec::new());
    let summary = run_units(dir.path(), units, &sink).unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

    assert_eq!(summary.units[0].files.len(), 2);
    assert_eq!(out.matches("package demo").count(), 2);
    assert_eq!(out.matches("t.Parallel()").count(), 2);
}

#[test]
fn test_malformed_subtest_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("bad_test.go"),
        "package demo\n\nimport \"testing\"\n\nfunc TestBad(t *testing.T) {\n\tt.Run(\"a\", helper)\n}\n\nfunc TestGood(t *testing.T) {\n\tgood()\n}\n",
    )
    .unwrap();

    let units = load_module(dir.path()).unwrap();
    let sink = Mutex::new(Vec::new());
    let summary = run_units(dir.path(), units, &sink).unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

    let file = &summary.units[0].files[0];
    assert_eq!(file.aborted, 1);
    assert_eq!(file.simple_parallelized, 1);
    // The malformed function prints unchanged; the healthy one is rewritten.
    assert!(out.contains("func TestBad(t *testing.T) {\n\tt.Run(\"a\", helper)\n}"));
    assert!(out.contains("func TestGood(t *testing.T) {\n\tt.Parallel()\n\tgood()"));
}

#[test]
fn test_unparsable_file_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken_test.go"), "package demo\n\nfunc {\n").unwrap();

    let err = load_module(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
}

#[test]
fn test_empty_module_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("README.md"), "not go\n").unwrap();

    let err = load_module(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::EmptyModule { .. }));
}
