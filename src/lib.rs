// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Parallelize - Go test parallelization rewriter
//!
//! This library loads a Go module, classifies its test functions, injects
//! `t.Parallel()` calls (into the first subtest closure when one exists),
//! repairs the table-test capture idiom, and reprints the rewritten test
//! files. Units of work are the test-build compilation units, processed
//! concurrently.

pub mod classify;
pub mod dispatch;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod printer;
pub mod report;
pub mod rewrite;
pub mod syntax;
pub mod table;
pub mod types;
pub mod walk;
pub mod worker;

// Re-export commonly used items
pub use classify::is_test_func;
pub use loader::{load_module, CompilationUnit};
pub use parser::parse_file;
pub use printer::print_file;
pub use rewrite::{parallelize_test, Outcome};
pub use table::fix_table_capture;
