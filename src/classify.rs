// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Test-function classification.
//!
//! A declaration is a test entry point iff its name starts with `Test` and
//! it takes exactly one parameter whose resolved static type is
//! `*testing.T`. Mismatches are logged at trace level and reject
//! immediately; a malformed signature never reaches the parameter-type
//! lookup.

use crate::syntax::FuncDecl;
use crate::types::{TypeTable, TEST_HANDLE_TYPE};
use tracing::trace;

/// The name prefix marking a test entry point.
pub const TEST_NAME_PREFIX: &str = "Test";

/// Decide whether `fdecl` is a test function.
pub fn is_test_func(fdecl: &FuncDecl, types: &TypeTable) -> bool {
    if fdecl.receiver.is_some() {
        trace!(func = %fdecl.name, "not a test function: declaration has a receiver");
        return false;
    }
    if !fdecl.name.starts_with(TEST_NAME_PREFIX) {
        trace!(func = %fdecl.name, "not a test function: name does not start with 'Test'");
        return false;
    }
    if fdecl.params.len() != 1 {
        trace!(
            func = %fdecl.name,
            params = fdecl.params.len(),
            "not a test function: parameter count is not one"
        );
        return false;
    }
    match types.lookup(fdecl.params[0].ty.id) {
        Some(ty) if ty.is_pointer_to(TEST_HANDLE_TYPE) => {
            trace!(func = %fdecl.name, "classified as a test function");
            true
        }
        Some(ty) => {
            trace!(func = %fdecl.name, %ty, "not a test function: parameter is not *testing.T");
            false
        }
        None => {
            trace!(func = %fdecl.name, "not a test function: parameter type unresolved");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::syntax::Decl;
    use crate::types::{resolve_file, TypeTable};

    fn classify_first(source: &str) -> bool {
        let file = parse_file(source).unwrap();
        let mut table = TypeTable::new();
        resolve_file(&file, &mut table);
        let f = file
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) => Some(f),
                Decl::Gen(_) => None,
            })
            .unwrap();
        is_test_func(f, &table)
    }

    #[test]
    fn test_accepts_canonical_signature() {
        assert!(classify_first(
            "package p\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n}\n"
        ));
    }

    #[test]
    fn test_accepts_aliased_testing_import() {
        assert!(classify_first(
            "package p\n\nimport q \"testing\"\n\nfunc TestX(t *q.T) {\n}\n"
        ));
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc BenchX(t *testing.T) {\n}\n"
        ));
    }

    #[test]
    fn test_rejects_zero_params_without_panicking() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc TestHelpers() {\n}\n"
        ));
    }

    #[test]
    fn test_rejects_two_params() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc TestX(t *testing.T, n int) {\n\t_ = n\n}\n"
        ));
    }

    #[test]
    fn test_rejects_non_pointer_param() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc TestX(t testing.T) {\n}\n"
        ));
    }

    #[test]
    fn test_rejects_pointer_to_other_type() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc TestX(b *testing.B) {\n}\n"
        ));
    }

    #[test]
    fn test_rejects_method() {
        assert!(!classify_first(
            "package p\n\nimport \"testing\"\n\nfunc (s suite) TestX(t *testing.T) {\n}\n"
        ));
    }
}
