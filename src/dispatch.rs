// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Concurrent unit dispatch.
//!
//! One task per test-build compilation unit, fanned out on the rayon pool;
//! plain units are skipped. The scope call is the barrier: it returns only
//! after every task has finished, so the summary and exit status always
//! reflect the complete run. Per-file output stays atomic because each
//! worker renders a whole file before taking the sink lock, but file order
//! across units is whatever the scheduler produced.

use crate::loader::CompilationUnit;
use crate::report::{RunSummary, UnitReport};
use crate::worker::process_unit;
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::trace;

/// Process every test-build unit concurrently and collect the run summary.
/// Returns the first worker error if any task failed.
pub fn run_units<W: Write + Send>(
    module_dir: &Path,
    units: Vec<CompilationUnit>,
    sink: &Mutex<W>,
) -> Result<RunSummary> {
    let results: Mutex<Vec<Result<UnitReport>>> = Mutex::new(Vec::new());

    rayon::scope(|scope| {
        for unit in units {
            if !unit.is_test_build() {
                trace!(unit = %unit.id, "not a test build, skipping");
                continue;
            }
            let results = &results;
            scope.spawn(move |_| {
                let result = process_unit(unit, sink);
                if let Ok(mut slot) = results.lock() {
                    slot.push(result);
                }
            });
        }
    });

    let results = results
        .into_inner()
        .map_err(|_| anyhow::anyhow!("result collector lock poisoned"))?;
    let mut reports = Vec::new();
    for result in results {
        reports.push(result?);
    }
    reports.sort_by(|a, b| a.unit.cmp(&b.unit));
    Ok(RunSummary::new(module_dir, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_module;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stdout_satisfies_the_sink_bound() {
        fn accepts_sink<W: std::io::Write + Send>(_: &Mutex<W>) {}
        accepts_sink(&Mutex::new(std::io::stdout()));
    }

    #[test]
    fn test_plain_unit_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("lib.go"),
            "package demo\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("lib_test.go"),
            "package demo\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {\n\t_ = Add(1, 2)\n}\n",
        )
        .unwrap();
        let units = load_module(dir.path()).unwrap();
        assert_eq!(units.len(), 2);

        let sink = Mutex::new(Vec::new());
        let summary = run_units(dir.path(), units, &sink).unwrap();
        assert_eq!(summary.units.len(), 1);
        assert_eq!(summary.units[0].unit, "demo [demo.test]");

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out.matches("package demo").count(), 1);
        assert!(out.contains("t.Parallel()"));
    }

    #[test]
    fn test_module_without_tests_yields_empty_summary() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("lib.go"),
            "package demo\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n",
        )
        .unwrap();
        let units = load_module(dir.path()).unwrap();
        let sink = Mutex::new(Vec::new());
        let summary = run_units(dir.path(), units, &sink).unwrap();
        assert!(summary.units.is_empty());
        assert!(sink.into_inner().unwrap().is_empty());
    }
}
