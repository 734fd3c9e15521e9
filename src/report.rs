// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Run summary reporting.
//!
//! Counters are rolled up per file, per unit, and for the whole run, and
//! can be serialized to JSON for the optional `--summary` output.

use crate::rewrite::Outcome;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Rewrite counters for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub functions: usize,
    pub ignored: usize,
    pub simple_parallelized: usize,
    pub subtest_parallelized: usize,
    pub table_fixed: usize,
    pub aborted: usize,
}

impl FileReport {
    pub fn new(path: &Path) -> Self {
        FileReport {
            path: path.to_path_buf(),
            functions: 0,
            ignored: 0,
            simple_parallelized: 0,
            subtest_parallelized: 0,
            table_fixed: 0,
            aborted: 0,
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.functions += 1;
        match outcome {
            Outcome::Ignored => self.ignored += 1,
            Outcome::SimpleParallelized => self.simple_parallelized += 1,
            Outcome::SubtestParallelized => self.subtest_parallelized += 1,
            Outcome::TableFixed => self.table_fixed += 1,
            Outcome::RewriteAborted => self.aborted += 1,
        }
    }

    /// Whether any rewrite touched this file.
    pub fn rewrote(&self) -> bool {
        self.simple_parallelized + self.subtest_parallelized + self.table_fixed > 0
    }
}

/// Rewrite counters for one compilation unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub files: Vec<FileReport>,
}

impl UnitReport {
    pub fn new(unit: &str) -> Self {
        UnitReport { unit: unit.to_string(), files: Vec::new() }
    }

    pub fn rewritten_functions(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.simple_parallelized + f.subtest_parallelized + f.table_fixed)
            .sum()
    }
}

/// The whole run, as written by `--summary`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated: String,
    pub module_dir: PathBuf,
    pub units: Vec<UnitReport>,
}

impl RunSummary {
    pub fn new(module_dir: &Path, units: Vec<UnitReport>) -> Self {
        RunSummary {
            generated: Local::now().to_rfc3339(),
            module_dir: module_dir.to_path_buf(),
            units,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
