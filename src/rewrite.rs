// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Subtest rewriting.
//!
//! Given a classified test function, find the first statement of shape
//! `<handle>.Run(<name>, <closure>)` where `<handle>` is the function's own
//! test-handle parameter, and inject `<handle>.Parallel()` as the closure's
//! first statement. Functions without a subtest call get the Parallel call
//! prepended to their own body instead. Exactly one layer of subtests is
//! supported: the scan halts at the first match, well-formed or not, and
//! sibling or nested `Run` calls are never examined.

use crate::syntax::{Block, Expr, FuncDecl, Stmt, StmtKind};
use crate::walk::{walk_block, Flow};
use tracing::{trace, warn};

/// Per-function rewrite result, the states of the transform's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Failed the classifier predicate; left untouched.
    Ignored,
    /// No subtest call; Parallel prepended to the function body.
    SimpleParallelized,
    /// Parallel injected into the first subtest's closure.
    SubtestParallelized,
    /// SubtestParallelized plus the table-test capture fix.
    TableFixed,
    /// A malformed subtest call was found; nothing was mutated.
    RewriteAborted,
}

/// Rewrite one classified test function in place.
pub fn parallelize_test(fdecl: &mut FuncDecl) -> Outcome {
    let handle = match fdecl.sole_param_name() {
        Some(name) => name.to_string(),
        None => {
            warn!(func = %fdecl.name, "test handle parameter is unnamed, cannot rewrite");
            return Outcome::RewriteAborted;
        }
    };

    let mut outcome = None;
    walk_block(&mut fdecl.body, &mut |stmt| {
        let StmtKind::Expr(Expr::Call { fun, args, .. }) = &mut stmt.kind else {
            return Flow::Continue;
        };
        let Expr::Selector { x, sel } = fun.as_mut() else {
            return Flow::Continue;
        };
        if sel != "Run" || x.as_ident() != Some(handle.as_str()) {
            return Flow::Continue;
        }

        // First subtest call; the scan ends here either way.
        if args.len() != 2 {
            warn!(
                args = args.len(),
                "found subtest call, but argument count is not 2; skipping rewrite"
            );
            outcome = Some(Outcome::RewriteAborted);
            return Flow::Stop;
        }
        match &mut args[1] {
            Expr::FuncLit { body, .. } => {
                prepend_parallel_call(body, &handle);
                outcome = Some(Outcome::SubtestParallelized);
            }
            _ => {
                warn!("found subtest call, but the second argument is not a func literal; skipping rewrite");
                outcome = Some(Outcome::RewriteAborted);
            }
        }
        Flow::Stop
    });

    match outcome {
        Some(outcome) => outcome,
        None => {
            prepend_parallel_call(&mut fdecl.body, &handle);
            trace!(func = %fdecl.name, "Parallel call added to simple test body");
            Outcome::SimpleParallelized
        }
    }
}

/// Insert `<handle>.Parallel()` as the first statement of `block`.
pub fn prepend_parallel_call(block: &mut Block, handle: &str) {
    block.stmts.insert(0, parallel_call(handle));
}

/// Build the `<handle>.Parallel()` statement.
pub fn parallel_call(handle: &str) -> Stmt {
    Stmt::synthetic(StmtKind::Expr(Expr::Call {
        fun: Box::new(Expr::Selector {
            x: Box::new(Expr::ident(handle)),
            sel: "Parallel".to_string(),
        }),
        args: Vec::new(),
        ellipsis: false,
    }))
}

/// Whether `stmt` has the `<handle>.Run(…)` subtest-dispatch shape.
pub(crate) fn is_subtest_call(stmt: &Stmt, handle: &str) -> bool {
    let StmtKind::Expr(Expr::Call { fun, .. }) = &stmt.kind else {
        return false;
    };
    let Expr::Selector { x, sel } = fun.as_ref() else {
        return false;
    };
    sel == "Run" && x.as_ident() == Some(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::printer::print_file;
    use crate::syntax::Decl;

    fn rewrite_first(source: &str) -> (Outcome, String) {
        let mut file = parse_file(source).unwrap();
        let outcome = file
            .decls
            .iter_mut()
            .find_map(|d| match d {
                Decl::Func(f) => Some(parallelize_test(f)),
                Decl::Gen(_) => None,
            })
            .unwrap();
        (outcome, print_file(&file))
    }

    #[test]
    fn test_simple_body_gains_parallel() {
        let (outcome, printed) = rewrite_first(
            "package p\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n\tx := 1\n\t_ = x\n}\n",
        );
        assert_eq!(outcome, Outcome::SimpleParallelized);
        assert_eq!(
            printed,
            "package p\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n\tt.Parallel()\n\tx := 1\n\t_ = x\n}\n"
        );
    }

    #[test]
    fn test_subtest_closure_gains_parallel() {
        let (outcome, printed) = rewrite_first(
            "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", func(t *testing.T) {\n\t\tt.Log(\"hi\")\n\t})\n}\n",
        );
        assert_eq!(outcome, Outcome::SubtestParallelized);
        assert_eq!(
            printed,
            "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", func(t *testing.T) {\n\t\tt.Parallel()\n\t\tt.Log(\"hi\")\n\t})\n}\n"
        );
    }

    #[test]
    fn test_only_first_subtest_is_rewritten() {
        let (outcome, printed) = rewrite_first(
            "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", func(t *testing.T) {\n\t\tfirst()\n\t})\n\tt.Run(\"b\", func(t *testing.T) {\n\t\tsecond()\n\t})\n}\n",
        );
        assert_eq!(outcome, Outcome::SubtestParallelized);
        // The sibling subtest keeps its body untouched.
        assert!(printed.contains("t.Run(\"a\", func(t *testing.T) {\n\t\tt.Parallel()\n\t\tfirst()"));
        assert!(printed.contains("t.Run(\"b\", func(t *testing.T) {\n\t\tsecond()"));
        assert_eq!(printed.matches("t.Parallel()").count(), 1);
    }

    #[test]
    fn test_malformed_arg_count_aborts_without_mutation() {
        let source = "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", helper, 3)\n}\n";
        let (outcome, printed) = rewrite_first(source);
        assert_eq!(outcome, Outcome::RewriteAborted);
        assert_eq!(printed, source);
    }

    #[test]
    fn test_malformed_second_arg_aborts_without_mutation() {
        let source =
            "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", helper)\n}\n";
        let (outcome, printed) = rewrite_first(source);
        assert_eq!(outcome, Outcome::RewriteAborted);
        assert_eq!(printed, source);
    }

    #[test]
    fn test_run_on_other_receiver_is_not_a_subtest() {
        // `suite.Run` does not target the test handle; the function gets the
        // simple-body treatment.
        let (outcome, printed) = rewrite_first(
            "package p\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tsuite.Run(\"a\", func(t *testing.T) {\n\t\tbody()\n\t})\n}\n",
        );
        assert_eq!(outcome, Outcome::SimpleParallelized);
        assert!(printed.contains("func TestY(t *testing.T) {\n\tt.Parallel()\n\tsuite.Run("));
    }

    #[test]
    fn test_handle_name_other_than_t() {
        let (outcome, printed) = rewrite_first(
            "package p\n\nimport \"testing\"\n\nfunc TestZ(tc *testing.T) {\n\ttc.Run(\"a\", func(tc *testing.T) {\n\t\tbody()\n\t})\n}\n",
        );
        assert_eq!(outcome, Outcome::SubtestParallelized);
        assert!(printed.contains("tc.Run(\"a\", func(tc *testing.T) {\n\t\ttc.Parallel()"));
    }

    #[test]
    fn test_rerun_stacks_second_parallel_call() {
        // The transform is deliberately not idempotent.
        let source =
            "package p\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n\tx := 1\n\t_ = x\n}\n";
        let (_, once) = rewrite_first(source);
        let (_, twice) = rewrite_first(&once);
        assert_eq!(twice.matches("t.Parallel()").count(), 2);
    }
}
