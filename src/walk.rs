// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Mutable pre-order traversal over statements.
//!
//! The visitor returns a tri-state [`Flow`]: keep going, skip the current
//! statement's children, or stop the whole walk. Traversal descends into
//! nested blocks and into the bodies of func literals appearing in
//! expressions, mirroring how a full-tree walk would see them.

use crate::syntax::{Block, ElseArm, Expr, Stmt, StmtKind};

/// Traversal control returned by a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue into this statement's children and on to siblings.
    Continue,
    /// Do not descend into this statement's children; continue with siblings.
    SkipChildren,
    /// Abandon the entire walk.
    Stop,
}

/// Walk every statement of `block` in pre-order.
pub fn walk_block<F>(block: &mut Block, visit: &mut F) -> Flow
where
    F: FnMut(&mut Stmt) -> Flow,
{
    for stmt in &mut block.stmts {
        if walk_stmt(stmt, visit) == Flow::Stop {
            return Flow::Stop;
        }
    }
    Flow::Continue
}

/// Visit `stmt`, then its children according to the visitor's verdict.
pub fn walk_stmt<F>(stmt: &mut Stmt, visit: &mut F) -> Flow
where
    F: FnMut(&mut Stmt) -> Flow,
{
    match visit(stmt) {
        Flow::Stop => return Flow::Stop,
        Flow::SkipChildren => return Flow::Continue,
        Flow::Continue => {}
    }
    match &mut stmt.kind {
        StmtKind::Expr(e) | StmtKind::Go(e) | StmtKind::Defer(e) => walk_expr(e, visit),
        StmtKind::Assign { lhs, rhs, .. } => {
            for e in lhs.iter_mut().chain(rhs.iter_mut()) {
                if walk_expr(e, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        StmtKind::Return(exprs) => {
            for e in exprs {
                if walk_expr(e, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        StmtKind::If(ifs) => {
            if let Some(init) = &mut ifs.init {
                if walk_stmt(init, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            if walk_expr(&mut ifs.cond, visit) == Flow::Stop {
                return Flow::Stop;
            }
            if walk_block(&mut ifs.then, visit) == Flow::Stop {
                return Flow::Stop;
            }
            let mut els = ifs.els.as_mut();
            while let Some(arm) = els {
                match arm {
                    ElseArm::Block(b) => return walk_block(b, visit),
                    ElseArm::If(nested) => {
                        if let Some(init) = &mut nested.init {
                            if walk_stmt(init, visit) == Flow::Stop {
                                return Flow::Stop;
                            }
                        }
                        if walk_expr(&mut nested.cond, visit) == Flow::Stop {
                            return Flow::Stop;
                        }
                        if walk_block(&mut nested.then, visit) == Flow::Stop {
                            return Flow::Stop;
                        }
                        els = nested.els.as_mut();
                    }
                }
            }
            Flow::Continue
        }
        StmtKind::For { init, cond, post, body } => {
            if let Some(init) = init {
                if walk_stmt(init, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            if let Some(cond) = cond {
                if walk_expr(cond, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            if let Some(post) = post {
                if walk_stmt(post, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            walk_block(body, visit)
        }
        StmtKind::Range { expr, body, .. } => {
            if walk_expr(expr, visit) == Flow::Stop {
                return Flow::Stop;
            }
            walk_block(body, visit)
        }
        StmtKind::Switch { init, tag, cases } => {
            if let Some(init) = init {
                if walk_stmt(init, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            if let Some(tag) = tag {
                if walk_expr(tag, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            for case in cases {
                for stmt in &mut case.body {
                    if walk_stmt(stmt, visit) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
            }
            Flow::Continue
        }
        StmtKind::Block(b) => walk_block(b, visit),
        StmtKind::Decl(_)
        | StmtKind::IncDec { .. }
        | StmtKind::Break(_)
        | StmtKind::Continue(_) => Flow::Continue,
    }
}

/// Descend into func-literal bodies nested inside an expression.
fn walk_expr<F>(expr: &mut Expr, visit: &mut F) -> Flow
where
    F: FnMut(&mut Stmt) -> Flow,
{
    match expr {
        Expr::FuncLit { body, .. } => walk_block(body, visit),
        Expr::Call { fun, args, .. } => {
            if walk_expr(fun, visit) == Flow::Stop {
                return Flow::Stop;
            }
            for a in args {
                if walk_expr(a, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        Expr::Selector { x, .. } | Expr::Paren(x) | Expr::Unary { x, .. } => walk_expr(x, visit),
        Expr::Binary { lhs, rhs, .. } => {
            if walk_expr(lhs, visit) == Flow::Stop {
                return Flow::Stop;
            }
            walk_expr(rhs, visit)
        }
        Expr::Index { x, index } => {
            if walk_expr(x, visit) == Flow::Stop {
                return Flow::Stop;
            }
            walk_expr(index, visit)
        }
        Expr::Slice { x, low, high } => {
            if walk_expr(x, visit) == Flow::Stop {
                return Flow::Stop;
            }
            for part in [low, high].into_iter().flatten() {
                if walk_expr(part, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        Expr::Composite { elems, .. } => {
            for elem in elems {
                if let Some(key) = &mut elem.key {
                    if walk_expr(key, visit) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                if walk_expr(&mut elem.value, visit) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        Expr::Ident { .. } | Expr::Lit { .. } | Expr::TypeRef(_) => Flow::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::syntax::{Decl, Expr, StmtKind};

    fn body_of(source: &str) -> Block {
        let file = parse_file(source).unwrap();
        match file.decls.into_iter().next().unwrap() {
            Decl::Func(f) => f.body,
            Decl::Gen(_) => panic!("expected function"),
        }
    }

    #[test]
    fn test_walk_visits_nested_statements() {
        let mut body = body_of(
            "package p\n\nfunc f() {\n\tif true {\n\t\tx := 1\n\t\t_ = x\n\t}\n\tfor i := 0; i < 3; i++ {\n\t\ty := i\n\t\t_ = y\n\t}\n}\n",
        );
        let mut seen = 0;
        walk_block(&mut body, &mut |_| {
            seen += 1;
            Flow::Continue
        });
        // if + 2 inner, for + init + post + 2 inner.
        assert_eq!(seen, 8);
    }

    #[test]
    fn test_walk_descends_into_func_literals() {
        let mut body = body_of(
            "package p\n\nfunc f() {\n\tg(func() {\n\t\tinner()\n\t})\n}\n",
        );
        let mut calls = Vec::new();
        walk_block(&mut body, &mut |stmt| {
            if let StmtKind::Expr(Expr::Call { fun, .. }) = &stmt.kind {
                if let Some(name) = fun.as_ident() {
                    calls.push(name.to_string());
                }
            }
            Flow::Continue
        });
        assert_eq!(calls, vec!["g".to_string(), "inner".to_string()]);
    }

    #[test]
    fn test_skip_children_prunes_subtree() {
        let mut body = body_of(
            "package p\n\nfunc f() {\n\tif true {\n\t\tinner()\n\t}\n\touter()\n}\n",
        );
        let mut calls = Vec::new();
        walk_block(&mut body, &mut |stmt| match &stmt.kind {
            StmtKind::If(_) => Flow::SkipChildren,
            StmtKind::Expr(Expr::Call { fun, .. }) => {
                if let Some(name) = fun.as_ident() {
                    calls.push(name.to_string());
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        });
        assert_eq!(calls, vec!["outer".to_string()]);
    }

    #[test]
    fn test_stop_halts_walk() {
        let mut body = body_of("package p\n\nfunc f() {\n\ta()\n\tb()\n\tc()\n}\n");
        let mut seen = 0;
        let flow = walk_block(&mut body, &mut |_| {
            seen += 1;
            if seen == 2 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        });
        assert_eq!(flow, Flow::Stop);
        assert_eq!(seen, 2);
    }
}
