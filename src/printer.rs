// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Serializes a syntax tree back to Go source text.
//!
//! Output is gofmt-flavored: tab indentation, grouped imports, one blank
//! line between declarations, spaces around binary operators. The printer
//! owns formatting normalization; callers get back a complete file and
//! write it verbatim.

use crate::syntax::*;

/// Print a whole file as source text.
pub fn print_file(file: &File) -> String {
    let mut p = Printer::new();
    p.file(file);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Printer { out: String::new(), indent: 0 }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn tabs(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn comments(&mut self, lines: &[String]) {
        for line in lines {
            self.tabs();
            self.push(line);
            self.newline();
        }
    }

    fn file(&mut self, file: &File) {
        if !file.lead_comments.is_empty() {
            self.comments(&file.lead_comments);
        }
        self.push("package ");
        self.push(&file.package);
        self.newline();

        if !file.imports.is_empty() {
            self.newline();
            if file.imports.len() == 1 {
                let imp = &file.imports[0];
                self.push("import ");
                self.import_spec(imp);
                self.newline();
            } else {
                self.push("import (\n");
                for imp in &file.imports {
                    self.push("\t");
                    self.import_spec(imp);
                    self.newline();
                }
                self.push(")\n");
            }
        }

        for decl in &file.decls {
            self.newline();
            match decl {
                Decl::Func(f) => self.func_decl(f),
                Decl::Gen(g) => {
                    self.comments(&g.lead);
                    self.gen_decl(g);
                    self.newline();
                }
            }
        }
        if !file.trailing_comments.is_empty() {
            self.newline();
            self.comments(&file.trailing_comments);
        }
    }

    fn import_spec(&mut self, imp: &Import) {
        if let Some(alias) = &imp.alias {
            self.push(alias);
            self.push(" ");
        }
        self.push(&format!("\"{}\"", imp.path));
    }

    fn func_decl(&mut self, f: &FuncDecl) {
        self.comments(&f.lead);
        self.push("func ");
        if let Some(recv) = &f.receiver {
            self.push("(");
            self.param(recv);
            self.push(") ");
        }
        self.push(&f.name);
        self.signature(&f.params, &f.results);
        self.push(" ");
        self.block(&f.body);
        self.newline();
    }

    fn signature(&mut self, params: &[Param], results: &[Param]) {
        self.push("(");
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.param(p);
        }
        self.push(")");
        match results {
            [] => {}
            [only] if only.name.is_none() => {
                self.push(" ");
                self.type_expr(&only.ty);
            }
            many => {
                self.push(" (");
                for (i, p) in many.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.param(p);
                }
                self.push(")");
            }
        }
    }

    fn param(&mut self, p: &Param) {
        if let Some(name) = &p.name {
            self.push(name);
            self.push(" ");
        }
        self.type_expr(&p.ty);
    }

    fn gen_decl(&mut self, g: &GenDecl) {
        self.push(g.keyword.as_str());
        if g.grouped {
            self.push(" (\n");
            self.indent += 1;
            for spec in &g.specs {
                self.tabs();
                self.gen_spec(spec);
                self.newline();
            }
            self.indent -= 1;
            self.tabs();
            self.push(")");
        } else {
            self.push(" ");
            if let Some(spec) = g.specs.first() {
                self.gen_spec(spec);
            }
        }
    }

    fn gen_spec(&mut self, spec: &GenSpec) {
        match spec {
            GenSpec::Value { names, ty, values } => {
                self.push(&names.join(", "));
                if let Some(ty) = ty {
                    self.push(" ");
                    self.type_expr(ty);
                }
                if !values.is_empty() {
                    self.push(" = ");
                    for (i, v) in values.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.expr(v);
                    }
                }
            }
            GenSpec::Type { name, ty } => {
                self.push(name);
                self.push(" ");
                self.type_expr(ty);
            }
        }
    }

    // ---- Statements ----

    fn block(&mut self, b: &Block) {
        if b.stmts.is_empty() && b.trailing_comments.is_empty() {
            self.push("{\n");
            self.tabs();
            self.push("}");
            return;
        }
        self.push("{\n");
        self.indent += 1;
        for stmt in &b.stmts {
            self.stmt(stmt);
        }
        self.comments(&b.trailing_comments);
        self.indent -= 1;
        self.tabs();
        self.push("}");
    }

    fn stmt(&mut self, s: &Stmt) {
        self.comments(&s.lead);
        self.tabs();
        self.stmt_kind(&s.kind);
        self.newline();
    }

    /// A statement without indentation or trailing newline, for headers.
    fn inline_stmt(&mut self, s: &Stmt) {
        self.stmt_kind(&s.kind);
    }

    fn stmt_kind(&mut self, kind: &StmtKind) {
        match kind {
            StmtKind::Expr(e) => self.expr(e),
            StmtKind::Assign { lhs, op, rhs } => {
                for (i, e) in lhs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(e);
                }
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                for (i, e) in rhs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(e);
                }
            }
            StmtKind::Decl(g) => self.gen_decl(g),
            StmtKind::Return(exprs) => {
                self.push("return");
                for (i, e) in exprs.iter().enumerate() {
                    self.push(if i == 0 { " " } else { ", " });
                    self.expr(e);
                }
            }
            StmtKind::If(ifs) => self.if_stmt(ifs),
            StmtKind::For { init, cond, post, body } => {
                self.push("for ");
                match (init, cond, post) {
                    (None, None, None) => {
                        // `for {`; trailing space already emitted.
                    }
                    (None, Some(c), None) => {
                        self.expr(c);
                        self.push(" ");
                    }
                    _ => {
                        if let Some(init) = init {
                            self.inline_stmt(init);
                        }
                        self.push("; ");
                        if let Some(c) = cond {
                            self.expr(c);
                        }
                        self.push("; ");
                        if let Some(post) = post {
                            self.inline_stmt(post);
                            self.push(" ");
                        }
                    }
                }
                self.block(body);
            }
            StmtKind::Range { key, value, define, expr, body } => {
                self.push("for ");
                if let Some(key) = key {
                    self.expr(key);
                    if let Some(value) = value {
                        self.push(", ");
                        self.expr(value);
                    }
                    self.push(if *define { " := " } else { " = " });
                }
                self.push("range ");
                self.expr(expr);
                self.push(" ");
                self.block(body);
            }
            StmtKind::Switch { init, tag, cases } => {
                self.push("switch ");
                if let Some(init) = init {
                    self.inline_stmt(init);
                    self.push("; ");
                }
                if let Some(tag) = tag {
                    self.expr(tag);
                    self.push(" ");
                }
                self.push("{\n");
                for case in cases {
                    self.tabs();
                    if case.exprs.is_empty() {
                        self.push("default:");
                    } else {
                        self.push("case ");
                        for (i, e) in case.exprs.iter().enumerate() {
                            if i > 0 {
                                self.push(", ");
                            }
                            self.expr(e);
                        }
                        self.push(":");
                    }
                    self.newline();
                    self.indent += 1;
                    for stmt in &case.body {
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.tabs();
                self.push("}");
            }
            StmtKind::Block(b) => self.block(b),
            StmtKind::Go(e) => {
                self.push("go ");
                self.expr(e);
            }
            StmtKind::Defer(e) => {
                self.push("defer ");
                self.expr(e);
            }
            StmtKind::IncDec { expr, inc } => {
                self.expr(expr);
                self.push(if *inc { "++" } else { "--" });
            }
            StmtKind::Break(label) => {
                self.push("break");
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
            }
            StmtKind::Continue(label) => {
                self.push("continue");
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
            }
        }
    }

    fn if_stmt(&mut self, ifs: &IfStmt) {
        self.push("if ");
        if let Some(init) = &ifs.init {
            self.inline_stmt(init);
            self.push("; ");
        }
        self.expr(&ifs.cond);
        self.push(" ");
        self.block(&ifs.then);
        match &ifs.els {
            Some(ElseArm::If(nested)) => {
                self.push(" else ");
                self.if_stmt(nested);
            }
            Some(ElseArm::Block(b)) => {
                self.push(" else ");
                self.block(b);
            }
            None => {}
        }
    }

    // ---- Expressions ----

    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::Ident { name, .. } => self.push(name),
            Expr::Selector { x, sel } => {
                self.expr(x);
                self.push(".");
                self.push(sel);
            }
            Expr::Call { fun, args, ellipsis } => {
                self.expr(fun);
                self.push("(");
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(a);
                }
                if *ellipsis {
                    self.push("...");
                }
                self.push(")");
            }
            Expr::Lit { text, .. } => self.push(text),
            Expr::FuncLit { params, results, body } => {
                self.push("func");
                self.signature(params, results);
                self.push(" ");
                self.block(body);
            }
            Expr::Composite { ty, elems } => {
                if let Some(ty) = ty {
                    self.type_expr(ty);
                }
                self.composite_body(elems);
            }
            Expr::Unary { op, x } => {
                self.push(op.as_str());
                self.expr(x);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(rhs);
            }
            Expr::Paren(inner) => {
                self.push("(");
                self.expr(inner);
                self.push(")");
            }
            Expr::Index { x, index } => {
                self.expr(x);
                self.push("[");
                self.expr(index);
                self.push("]");
            }
            Expr::Slice { x, low, high } => {
                self.expr(x);
                self.push("[");
                if let Some(low) = low {
                    self.expr(low);
                }
                self.push(":");
                if let Some(high) = high {
                    self.expr(high);
                }
                self.push("]");
            }
            Expr::TypeRef(ty) => self.type_expr(ty),
        }
    }

    fn composite_body(&mut self, elems: &[CompositeElem]) {
        if elems.is_empty() {
            self.push("{}");
            return;
        }
        let multiline = elems.iter().any(|e| matches!(e.value, Expr::Composite { .. }));
        if multiline {
            self.push("{\n");
            self.indent += 1;
            for elem in elems {
                self.tabs();
                self.composite_elem(elem);
                self.push(",\n");
            }
            self.indent -= 1;
            self.tabs();
            self.push("}");
        } else {
            self.push("{");
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.composite_elem(elem);
            }
            self.push("}");
        }
    }

    fn composite_elem(&mut self, elem: &CompositeElem) {
        if let Some(key) = &elem.key {
            self.expr(key);
            self.push(": ");
        }
        self.expr(&elem.value);
    }

    // ---- Types ----

    fn type_expr(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeKind::Name(name) => self.push(name),
            TypeKind::Qualified { pkg, name } => {
                self.push(pkg);
                self.push(".");
                self.push(name);
            }
            TypeKind::Pointer(inner) => {
                self.push("*");
                self.type_expr(inner);
            }
            TypeKind::Slice(inner) => {
                self.push("[]");
                self.type_expr(inner);
            }
            TypeKind::Array { len, elem } => {
                self.push("[");
                match len {
                    Some(len) => self.expr(len),
                    None => self.push("..."),
                }
                self.push("]");
                self.type_expr(elem);
            }
            TypeKind::Map { key, value } => {
                self.push("map[");
                self.type_expr(key);
                self.push("]");
                self.type_expr(value);
            }
            TypeKind::Struct(fields) => {
                if fields.is_empty() {
                    self.push("struct{}");
                    return;
                }
                self.push("struct {\n");
                self.indent += 1;
                for field in fields {
                    self.tabs();
                    if !field.names.is_empty() {
                        self.push(&field.names.join(", "));
                        self.push(" ");
                    }
                    self.type_expr(&field.ty);
                    if let Some(tag) = &field.tag {
                        self.push(" ");
                        self.push(tag);
                    }
                    self.newline();
                }
                self.indent -= 1;
                self.tabs();
                self.push("}");
            }
            TypeKind::Func { params, results } => {
                self.push("func");
                self.signature(params, results);
            }
            TypeKind::InterfaceEmpty => self.push("interface{}"),
            TypeKind::Ellipsis(inner) => {
                self.push("...");
                self.type_expr(inner);
            }
        }
    }
}
