// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Per-unit rewrite worker.
//!
//! Takes one test-build compilation unit, rewrites every test function in
//! its `_test.go` files, and writes each rewritten file to the shared sink.
//! Non-test files belong to the unit for type resolution only and are never
//! printed.
//!
//! Structural problems inside one function (a malformed subtest call, an
//! unnamed handle) are logged and skipped; the file still prints with every
//! other rewrite applied. Only sink I/O failures are errors.

use crate::classify::is_test_func;
use crate::loader::CompilationUnit;
use crate::printer::print_file;
use crate::report::{FileReport, UnitReport};
use crate::rewrite::{parallelize_test, Outcome};
use crate::syntax::{Decl, FuncDecl};
use crate::table::fix_table_capture;
use crate::types::TypeTable;
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, info, info_span, trace};

/// Rewrite every test function in `unit` and print the rewritten test
/// files to `sink`. Each file is rendered to its own buffer first, so the
/// sink lock is held only for the write itself.
pub fn process_unit<W: Write>(
    mut unit: CompilationUnit,
    sink: &Mutex<W>,
) -> Result<UnitReport> {
    let _span = info_span!("unit", id = %unit.id).entered();
    info!("processing compilation unit");
    let mut report = UnitReport::new(&unit.id);

    for tree in &mut unit.trees {
        if !tree.is_test_file() {
            trace!(path = %tree.path.display(), "not a test file, skipping");
            continue;
        }

        let mut file_report = FileReport::new(&tree.path);
        for decl in &mut tree.file.decls {
            let Decl::Func(fdecl) = decl else { continue };
            file_report.record(rewrite_func(fdecl, &unit.types));
        }
        debug!(
            path = %tree.path.display(),
            functions = file_report.functions,
            rewritten = file_report.rewrote(),
            "rewrote test file"
        );

        let printed = print_file(&tree.file);
        let mut out = sink
            .lock()
            .map_err(|_| anyhow::anyhow!("output sink lock poisoned"))?;
        out.write_all(printed.as_bytes())
            .with_context(|| format!("failed to write {}", tree.path.display()))?;

        report.files.push(file_report);
    }
    Ok(report)
}

/// Classify and rewrite one declaration.
fn rewrite_func(fdecl: &mut FuncDecl, types: &TypeTable) -> Outcome {
    if !is_test_func(fdecl, types) {
        return Outcome::Ignored;
    }
    let outcome = parallelize_test(fdecl);
    if outcome == Outcome::SubtestParallelized && fix_table_capture(fdecl) {
        return Outcome::TableFixed;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_module;
    use std::fs;
    use tempfile::tempdir;

    fn run_on(files: &[(&str, &str)]) -> (UnitReport, String) {
        let dir = tempdir().unwrap();
        for (name, source) in files {
            fs::write(dir.path().join(name), source).unwrap();
        }
        let units = load_module(dir.path()).unwrap();
        let unit = units.into_iter().find(|u| u.is_test_build()).unwrap();
        let sink = Mutex::new(Vec::new());
        let report = process_unit(unit, &sink).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        (report, out)
    }

    #[test]
    fn test_only_test_files_are_printed() {
        let (report, out) = run_on(&[
            ("user.go", "package demo\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n"),
            (
                "user_test.go",
                "package demo\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {\n\t_ = Add(1, 2)\n}\n",
            ),
        ]);
        assert_eq!(report.files.len(), 1);
        assert!(!out.contains("func Add"));
        assert!(out.contains("func TestAdd(t *testing.T) {\n\tt.Parallel()"));
    }

    #[test]
    fn test_helper_functions_are_ignored() {
        let (report, out) = run_on(&[(
            "helper_test.go",
            "package demo\n\nimport \"testing\"\n\nfunc makeUser() int {\n\treturn 1\n}\n\nfunc TestUser(t *testing.T) {\n\t_ = makeUser()\n}\n",
        )]);
        assert_eq!(report.files[0].functions, 2);
        assert_eq!(report.files[0].ignored, 1);
        assert_eq!(report.files[0].simple_parallelized, 1);
        assert!(out.contains("func makeUser() int {\n\treturn 1\n}"));
        assert!(!out.contains("makeUser() int {\n\tt.Parallel()"));
    }

    #[test]
    fn test_table_idiom_reaches_table_fixed() {
        let (report, out) = run_on(&[(
            "table_test.go",
            "package demo\n\nimport \"testing\"\n\nfunc TestTable(t *testing.T) {\n\ttests := []int{1, 2}\n\tfor _, tt := range tests {\n\t\tt.Run(\"case\", func(t *testing.T) {\n\t\t\tsink(tt)\n\t\t})\n\t}\n}\n",
        )]);
        assert_eq!(report.files[0].table_fixed, 1);
        assert!(out.contains("for _, tt := range tests {\n\t\ttt := tt\n\t\tt.Run("));
        assert_eq!(report.rewritten_functions(), 1);
    }
}
