// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Table-test capture repair.
//!
//! A parallel subtest closure spawned from a case-table loop captures the
//! loop variable by reference; by the time the closures run, every one of
//! them observes the final iteration's value. The fix is the canonical
//! `tt := tt` rebinding at the top of the loop body, giving each iteration
//! its own copy before the Parallel-augmented subtest call runs.
//!
//! Only the literal idiom is matched: a binding of a variable named
//! `tests`, ranged with a value variable named `tt`, dispatching through a
//! subtest call. Anything else keeps just the subtest-level Parallel call,
//! with no error.

use crate::rewrite::is_subtest_call;
use crate::syntax::{AssignOp, Expr, FuncDecl, Stmt, StmtKind};
use crate::walk::{walk_block, Flow};
use tracing::trace;

/// The conventional case-table variable name.
const TABLE_VAR: &str = "tests";
/// The conventional per-iteration case variable name.
const CASE_VAR: &str = "tt";

/// Apply the `tt := tt` rebinding when the function follows the table-test
/// idiom. Returns true when the fix was applied. Call only after the
/// subtest rewrite succeeded.
pub fn fix_table_capture(fdecl: &mut FuncDecl) -> bool {
    let Some(handle) = fdecl.sole_param_name().map(str::to_string) else {
        return false;
    };

    // (a) A top-level binding of `tests`. Existence only; the bound shape
    // is not validated.
    let binds_table = fdecl.body.stmts.iter().any(is_table_binding);
    if !binds_table {
        return false;
    }

    // (b) A top-level `for … range tests` loop with value variable `tt`
    // whose body dispatches through the subtest call.
    for stmt in &mut fdecl.body.stmts {
        let StmtKind::Range { value, expr, body, .. } = &mut stmt.kind else {
            continue;
        };
        if expr.as_ident() != Some(TABLE_VAR) {
            continue;
        }
        if value.as_ref().and_then(|v| v.as_ident()) != Some(CASE_VAR) {
            continue;
        }
        let mut has_dispatch = false;
        walk_block(body, &mut |s| {
            if is_subtest_call(s, &handle) {
                has_dispatch = true;
                Flow::Stop
            } else {
                Flow::Continue
            }
        });
        if !has_dispatch {
            continue;
        }
        body.stmts.insert(0, rebinding());
        trace!(func = %fdecl.name, "case variable rebinding added to table-test loop");
        return true;
    }
    false
}

fn is_table_binding(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Assign { lhs, op, .. } => {
            matches!(op, AssignOp::Define | AssignOp::Assign)
                && lhs.iter().any(|e| e.as_ident() == Some(TABLE_VAR))
        }
        _ => false,
    }
}

/// The `tt := tt` statement.
fn rebinding() -> Stmt {
    Stmt::synthetic(StmtKind::Assign {
        lhs: vec![Expr::ident(CASE_VAR)],
        op: AssignOp::Define,
        rhs: vec![Expr::ident(CASE_VAR)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::printer::print_file;
    use crate::rewrite::{parallelize_test, Outcome};
    use crate::syntax::Decl;

    fn rewrite_and_fix(source: &str) -> (Outcome, bool, String) {
        let mut file = parse_file(source).unwrap();
        let mut outcome = Outcome::Ignored;
        let mut fixed = false;
        for decl in &mut file.decls {
            if let Decl::Func(f) = decl {
                outcome = parallelize_test(f);
                if outcome == Outcome::SubtestParallelized {
                    fixed = fix_table_capture(f);
                }
                break;
            }
        }
        (outcome, fixed, print_file(&file))
    }

    const TABLE_SRC: &str = r#"package p

import "testing"

func TestTable(t *testing.T) {
	tests := []struct {
		name string
		in int
	}{
		{"one", 1},
		{"two", 2},
	}
	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {
			t.Log(tt.in)
		})
	}
}
"#;

    #[test]
    fn test_table_idiom_gets_rebinding() {
        let (outcome, fixed, printed) = rewrite_and_fix(TABLE_SRC);
        assert_eq!(outcome, Outcome::SubtestParallelized);
        assert!(fixed);
        assert!(printed.contains(
            "\tfor _, tt := range tests {\n\t\ttt := tt\n\t\tt.Run(tt.name, func(t *testing.T) {\n\t\t\tt.Parallel()\n\t\t\tt.Log(tt.in)"
        ));
    }

    #[test]
    fn test_other_collection_name_is_left_alone() {
        let source = TABLE_SRC.replace("tests", "cases");
        let (outcome, fixed, printed) = rewrite_and_fix(&source);
        assert_eq!(outcome, Outcome::SubtestParallelized);
        assert!(!fixed);
        assert!(!printed.contains("tt := tt"));
        // The subtest-level Parallel call is still there.
        assert!(printed.contains("t.Parallel()"));
    }

    #[test]
    fn test_other_case_variable_name_is_left_alone() {
        let source = TABLE_SRC.replace("tt", "tc");
        let (_, fixed, printed) = rewrite_and_fix(&source);
        assert!(!fixed);
        assert!(!printed.contains("tc := tc"));
    }

    #[test]
    fn test_loop_without_dispatch_is_left_alone() {
        let source = r#"package p

import "testing"

func TestNoDispatch(t *testing.T) {
	tests := []int{1, 2}
	for _, tt := range tests {
		sink(tt)
	}
	t.Run("only", func(t *testing.T) {
		body()
	})
}
"#;
        let (outcome, fixed, printed) = rewrite_and_fix(source);
        assert_eq!(outcome, Outcome::SubtestParallelized);
        assert!(!fixed);
        assert!(!printed.contains("tt := tt"));
    }

    #[test]
    fn test_binding_without_loop_is_left_alone() {
        let source = r#"package p

import "testing"

func TestBindOnly(t *testing.T) {
	tests := []int{1, 2}
	_ = tests
	t.Run("only", func(t *testing.T) {
		body()
	})
}
"#;
        let (_, fixed, _) = rewrite_and_fix(source);
        assert!(!fixed);
    }
}
