// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Source loader: turns a module directory into compilation units.
//!
//! Scans the directory (one package level, not recursive), parses every
//! `.go` file, and resolves signature types. The result mirrors what the Go
//! toolchain reports when test packages are requested: the plain package
//! unit plus, when `_test.go` files exist, a test-build variant whose
//! identifier carries the ` [<pkg>.test]` marker suffix and which contains
//! every file of the package. Only the test-build variant is processed
//! downstream.
//!
//! All failures here are fatal: an unreadable directory, an unparsable
//! file, or a file outside the supported Go subset aborts the run before
//! any output is produced.

use crate::lexer::SyntaxError;
use crate::parser::parse_file_from;
use crate::syntax::File;
use crate::types::{resolve_file, TypeTable};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Filename suffix marking test files.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Identifier suffix marking a test-build compilation unit.
pub const TEST_UNIT_SUFFIX: &str = ".test]";

/// A fatal load failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module directory {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
    #[error("no Go source files in {}", path.display())]
    EmptyModule { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },
}

/// One parsed source file with its path.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub path: PathBuf,
    pub file: File,
}

impl SourceTree {
    pub fn is_test_file(&self) -> bool {
        is_test_file(&self.path)
    }
}

/// One loaded, type-resolved package or its test-build variant. Owns its
/// trees exclusively; consumed once and discarded after printing.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Unit identifier, e.g. `demo` or `demo [demo.test]`.
    pub id: String,
    /// Package name.
    pub name: String,
    pub trees: Vec<SourceTree>,
    pub types: TypeTable,
}

impl CompilationUnit {
    /// Whether this unit is the test-build variant.
    pub fn is_test_build(&self) -> bool {
        self.id.ends_with(TEST_UNIT_SUFFIX)
    }
}

/// Whether `path` names a test file.
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX))
}

/// Load the package in `dir`, returning the plain unit and, when test
/// files are present, the test-build variant.
pub fn load_module(dir: &Path) -> Result<Vec<CompilationUnit>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory { path: dir.to_path_buf() });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|e| e == "go"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(LoadError::EmptyModule { path: dir.to_path_buf() });
    }

    let mut trees = Vec::new();
    let mut next_id = 0;
    for path in paths {
        let source = std::fs::read_to_string(&path)
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;
        let (file, last_id) = parse_file_from(&source, next_id)
            .map_err(|source| LoadError::Parse { path: path.clone(), source })?;
        next_id = last_id;
        trace!(path = %path.display(), package = %file.package, "parsed source file");
        trees.push(SourceTree { path, file });
    }

    let name = trees
        .iter()
        .find(|t| !t.is_test_file())
        .or_else(|| trees.first())
        .map(|t| t.file.package.clone())
        .unwrap_or_default();

    let mut units = Vec::new();

    let plain: Vec<SourceTree> =
        trees.iter().filter(|t| !t.is_test_file()).cloned().collect();
    if !plain.is_empty() {
        units.push(build_unit(name.clone(), name.clone(), plain));
    }

    if trees.iter().any(SourceTree::is_test_file) {
        let id = format!("{name} [{name}.test]");
        units.push(build_unit(id, name.clone(), trees));
    }

    debug!(
        module = %dir.display(),
        units = units.len(),
        "loaded module"
    );
    Ok(units)
}

fn build_unit(id: String, name: String, trees: Vec<SourceTree>) -> CompilationUnit {
    let mut types = TypeTable::new();
    for tree in &trees {
        resolve_file(&tree.file, &mut types);
    }
    CompilationUnit { id, name, trees, types }
}
