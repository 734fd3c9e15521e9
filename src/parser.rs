// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Recursive-descent parser for the supported Go subset.
//!
//! Covers what test files actually use: package/import clauses, function
//! declarations (including methods), var/const/type declarations, the usual
//! statement forms (assignments, if/else, all for-loop forms including
//! range, switch, go, defer, return), composite literals with inline struct
//! types, and func literals. Constructs outside the subset (select, labeled
//! statements, type switches, channels) are a parse error; the loader treats
//! that as fatal rather than risking a corrupting round trip.

use crate::lexer::{scan, Comment, SyntaxError, TokKind, Token};
use crate::syntax::*;

/// Parse one Go source file.
pub fn parse_file(source: &str) -> Result<File, SyntaxError> {
    parse_file_from(source, 0).map(|(file, _)| file)
}

/// Parse one Go source file, allocating node ids starting after `first_id`.
///
/// Returns the parsed file and the last id allocated, so a loader parsing
/// several files into one compilation unit can keep ids unique across them.
pub fn parse_file_from(source: &str, first_id: u32) -> Result<(File, u32), SyntaxError> {
    let (tokens, comments) = scan(source)?;
    let mut parser = Parser::new(tokens, comments);
    parser.next_id = first_id;
    let file = parser.parse_file()?;
    Ok((file, parser.next_id))
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    comments: Vec<Comment>,
    cidx: usize,
    next_id: u32,
    /// Inside an if/for/switch header, a bare `T{` does not start a
    /// composite literal.
    no_composite: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>, comments: Vec<Comment>) -> Self {
        Parser { tokens, idx: 0, comments, cidx: 0, next_id: 0, no_composite: false }
    }

    fn fresh_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    fn peek(&self) -> &TokKind {
        &self.tokens[self.idx.min(self.tokens.len() - 1)].kind
    }

    fn peek2(&self) -> &TokKind {
        &self.tokens[(self.idx + 1).min(self.tokens.len() - 1)].kind
    }

    fn pos(&self) -> Pos {
        self.tokens[self.idx.min(self.tokens.len() - 1)].pos
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.idx.min(self.tokens.len() - 1)].clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokKind, what: &str) -> Result<Token, SyntaxError> {
        if self.peek() == kind {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match self.peek().clone() {
            TokKind::Ident(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.pos(), message)
    }

    fn skip_semis(&mut self) {
        while self.eat(&TokKind::Semi) {}
    }

    /// Drain comments positioned before `pos`.
    fn comments_before(&mut self, pos: Pos) -> Vec<String> {
        let mut out = Vec::new();
        while self.cidx < self.comments.len() {
            let c = &self.comments[self.cidx];
            let before = c.pos.line < pos.line || (c.pos.line == pos.line && c.pos.col < pos.col);
            if !before {
                break;
            }
            out.push(c.text.clone());
            self.cidx += 1;
        }
        out
    }

    fn remaining_comments(&mut self) -> Vec<String> {
        let out = self.comments[self.cidx..].iter().map(|c| c.text.clone()).collect();
        self.cidx = self.comments.len();
        out
    }

    // ---- File structure ----

    fn parse_file(&mut self) -> Result<File, SyntaxError> {
        let lead_comments = self.comments_before(self.pos());
        self.expect(&TokKind::Package, "package clause")?;
        let package = self.expect_ident("package name")?;
        self.skip_semis();

        let mut imports = Vec::new();
        while self.peek() == &TokKind::Import {
            self.bump();
            if self.eat(&TokKind::LParen) {
                self.skip_semis();
                while self.peek() != &TokKind::RParen {
                    imports.push(self.parse_import_spec()?);
                    self.skip_semis();
                }
                self.bump(); // RParen
            } else {
                imports.push(self.parse_import_spec()?);
            }
            self.skip_semis();
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            if self.peek() == &TokKind::Eof {
                break;
            }
            let lead = self.comments_before(self.pos());
            match self.peek() {
                TokKind::Func => decls.push(Decl::Func(self.parse_func_decl(lead)?)),
                TokKind::Var | TokKind::Const | TokKind::Type => {
                    decls.push(Decl::Gen(self.parse_gen_decl(lead)?));
                }
                other => {
                    return Err(self.error(format!("expected declaration, found {other:?}")));
                }
            }
        }
        let trailing_comments = self.remaining_comments();
        Ok(File { lead_comments, package, imports, decls, trailing_comments })
    }

    fn parse_import_spec(&mut self) -> Result<Import, SyntaxError> {
        let alias = match self.peek().clone() {
            TokKind::Ident(name) => {
                self.bump();
                Some(name)
            }
            TokKind::Dot => {
                self.bump();
                Some(".".to_string())
            }
            _ => None,
        };
        match self.peek().clone() {
            TokKind::Str(text) => {
                self.bump();
                Ok(Import { alias, path: unquote(&text) })
            }
            other => Err(self.error(format!("expected import path, found {other:?}"))),
        }
    }

    fn parse_gen_decl(&mut self, lead: Vec<String>) -> Result<GenDecl, SyntaxError> {
        let keyword = match self.bump().kind {
            TokKind::Var => GenKeyword::Var,
            TokKind::Const => GenKeyword::Const,
            TokKind::Type => GenKeyword::Type,
            other => return Err(self.error(format!("expected var/const/type, found {other:?}"))),
        };
        let mut specs = Vec::new();
        let grouped = self.eat(&TokKind::LParen);
        if grouped {
            self.skip_semis();
            while self.peek() != &TokKind::RParen {
                specs.push(self.parse_gen_spec(keyword)?);
                self.skip_semis();
            }
            self.bump(); // RParen
        } else {
            specs.push(self.parse_gen_spec(keyword)?);
        }
        Ok(GenDecl { lead, keyword, specs, grouped })
    }

    fn parse_gen_spec(&mut self, keyword: GenKeyword) -> Result<GenSpec, SyntaxError> {
        if keyword == GenKeyword::Type {
            let name = self.expect_ident("type name")?;
            self.eat(&TokKind::Assign); // alias form `type A = B`
            let ty = self.parse_type()?;
            return Ok(GenSpec::Type { name, ty });
        }
        let mut names = vec![self.expect_ident("name")?];
        while self.eat(&TokKind::Comma) {
            names.push(self.expect_ident("name")?);
        }
        let ty = if !matches!(
            self.peek(),
            TokKind::Assign | TokKind::Semi | TokKind::RParen | TokKind::Eof
        ) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let mut values = Vec::new();
        if self.eat(&TokKind::Assign) {
            values.push(self.parse_expr()?);
            while self.eat(&TokKind::Comma) {
                values.push(self.parse_expr()?);
            }
        }
        Ok(GenSpec::Value { names, ty, values })
    }

    fn parse_func_decl(&mut self, lead: Vec<String>) -> Result<FuncDecl, SyntaxError> {
        let pos = self.pos();
        self.expect(&TokKind::Func, "func")?;
        let receiver = if self.peek() == &TokKind::LParen {
            let mut params = self.parse_param_list()?;
            if params.len() != 1 {
                return Err(self.error("expected a single receiver"));
            }
            Some(params.remove(0))
        } else {
            None
        };
        let name = self.expect_ident("function name")?;
        let params = self.parse_param_list()?;
        let results = self.parse_results()?;
        let body = self.parse_block()?;
        Ok(FuncDecl { lead, pos, receiver, name, params, results, body })
    }

    fn parse_results(&mut self) -> Result<Vec<Param>, SyntaxError> {
        match self.peek() {
            TokKind::LBrace
            | TokKind::Semi
            | TokKind::RParen
            | TokKind::Comma
            | TokKind::RBrace
            | TokKind::Eof => Ok(Vec::new()),
            TokKind::LParen => self.parse_param_list(),
            _ => {
                let ty = self.parse_type()?;
                Ok(vec![Param { name: None, ty }])
            }
        }
    }

    /// Parse `( … )` parameters, resolving Go's shared-type shorthand
    /// (`a, b int`) after the fact.
    fn parse_param_list(&mut self) -> Result<Vec<Param>, SyntaxError> {
        self.expect(&TokKind::LParen, "'('")?;
        let mut items: Vec<(Option<String>, TypeExpr)> = Vec::new();
        while self.peek() != &TokKind::RParen {
            let item = if let TokKind::Ident(name) = self.peek().clone() {
                if self.starts_type(self.peek2()) {
                    self.bump();
                    (Some(name), self.parse_type()?)
                } else {
                    (None, self.parse_type()?)
                }
            } else {
                (None, self.parse_type()?)
            };
            items.push(item);
            if !self.eat(&TokKind::Comma) {
                break;
            }
        }
        self.expect(&TokKind::RParen, "')'")?;

        let any_named = items.iter().any(|(n, _)| n.is_some());
        if !any_named {
            return Ok(items.into_iter().map(|(_, ty)| Param { name: None, ty }).collect());
        }
        // Mixed list: bare names preceding a named item share its type.
        let mut out = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for (name, ty) in items {
            match name {
                Some(name) => {
                    for p in pending.drain(..) {
                        out.push(Param { name: Some(p), ty: ty.clone() });
                    }
                    out.push(Param { name: Some(name), ty });
                }
                None => match ty.kind {
                    TypeKind::Name(n) => pending.push(n),
                    _ => return Err(self.error("mixed named and unnamed parameters")),
                },
            }
        }
        if !pending.is_empty() {
            return Err(self.error("parameter list ends without a type"));
        }
        Ok(out)
    }

    /// Whether `kind` can begin a type expression (after a parameter name).
    fn starts_type(&self, kind: &TokKind) -> bool {
        matches!(
            kind,
            TokKind::Ident(_)
                | TokKind::Star
                | TokKind::LBrack
                | TokKind::Map
                | TokKind::Struct
                | TokKind::Func
                | TokKind::Interface
                | TokKind::Ellipsis
                | TokKind::LParen
        )
    }

    // ---- Types ----

    fn parse_type(&mut self) -> Result<TypeExpr, SyntaxError> {
        let pos = self.pos();
        let id = self.fresh_id();
        let kind = match self.peek().clone() {
            TokKind::Star => {
                self.bump();
                TypeKind::Pointer(Box::new(self.parse_type()?))
            }
            TokKind::LBrack => {
                self.bump();
                if self.eat(&TokKind::RBrack) {
                    TypeKind::Slice(Box::new(self.parse_type()?))
                } else if self.eat(&TokKind::Ellipsis) {
                    self.expect(&TokKind::RBrack, "']'")?;
                    TypeKind::Array { len: None, elem: Box::new(self.parse_type()?) }
                } else {
                    let len = self.parse_expr()?;
                    self.expect(&TokKind::RBrack, "']'")?;
                    TypeKind::Array { len: Some(Box::new(len)), elem: Box::new(self.parse_type()?) }
                }
            }
            TokKind::Map => {
                self.bump();
                self.expect(&TokKind::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(&TokKind::RBrack, "']'")?;
                let value = self.parse_type()?;
                TypeKind::Map { key: Box::new(key), value: Box::new(value) }
            }
            TokKind::Struct => {
                self.bump();
                TypeKind::Struct(self.parse_struct_fields()?)
            }
            TokKind::Func => {
                self.bump();
                let params = self.parse_param_list()?;
                let results = self.parse_results()?;
                TypeKind::Func { params, results }
            }
            TokKind::Interface => {
                self.bump();
                self.expect(&TokKind::LBrace, "'{'")?;
                if !self.eat(&TokKind::RBrace) {
                    return Err(self.error("only the empty interface is supported"));
                }
                TypeKind::InterfaceEmpty
            }
            TokKind::Ellipsis => {
                self.bump();
                TypeKind::Ellipsis(Box::new(self.parse_type()?))
            }
            TokKind::LParen => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect(&TokKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokKind::Ident(name) => {
                self.bump();
                if self.eat(&TokKind::Dot) {
                    let sel = self.expect_ident("qualified type name")?;
                    TypeKind::Qualified { pkg: name, name: sel }
                } else {
                    TypeKind::Name(name)
                }
            }
            other => return Err(self.error(format!("expected type, found {other:?}"))),
        };
        Ok(TypeExpr { id, pos, kind })
    }

    fn parse_struct_fields(&mut self) -> Result<Vec<StructField>, SyntaxError> {
        self.expect(&TokKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(&TokKind::RBrace) {
                break;
            }
            // Either `names… Type` or an embedded type.
            if let TokKind::Ident(first) = self.peek().clone() {
                match self.peek2() {
                    TokKind::Dot => {
                        // Embedded qualified type.
                        let ty = self.parse_type()?;
                        let tag = self.parse_field_tag();
                        fields.push(StructField { names: Vec::new(), ty, tag });
                    }
                    TokKind::Semi | TokKind::RBrace | TokKind::Str(_) => {
                        // Embedded plain type.
                        self.bump();
                        let id = self.fresh_id();
                        let ty = TypeExpr { id, pos: self.pos(), kind: TypeKind::Name(first) };
                        let tag = self.parse_field_tag();
                        fields.push(StructField { names: Vec::new(), ty, tag });
                    }
                    _ => {
                        let mut names = vec![self.expect_ident("field name")?];
                        while self.eat(&TokKind::Comma) {
                            names.push(self.expect_ident("field name")?);
                        }
                        let ty = self.parse_type()?;
                        let tag = self.parse_field_tag();
                        fields.push(StructField { names, ty, tag });
                    }
                }
            } else {
                // Embedded pointer or other type form.
                let ty = self.parse_type()?;
                let tag = self.parse_field_tag();
                fields.push(StructField { names: Vec::new(), ty, tag });
            }
        }
        Ok(fields)
    }

    fn parse_field_tag(&mut self) -> Option<String> {
        if let TokKind::Str(text) = self.peek().clone() {
            self.bump();
            Some(text)
        } else {
            None
        }
    }

    // ---- Statements ----

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        self.expect(&TokKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            if self.peek() == &TokKind::RBrace {
                break;
            }
            if self.peek() == &TokKind::Eof {
                return Err(self.error("unexpected end of file in block"));
            }
            stmts.push(self.parse_stmt()?);
        }
        let trailing_comments = self.comments_before(self.pos());
        self.bump(); // RBrace
        Ok(Block { stmts, trailing_comments })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let lead = self.comments_before(self.pos());
        let pos = self.pos();
        let kind = match self.peek() {
            TokKind::Var | TokKind::Const | TokKind::Type => {
                StmtKind::Decl(self.parse_gen_decl(Vec::new())?)
            }
            TokKind::Return => {
                self.bump();
                let mut exprs = Vec::new();
                if !matches!(self.peek(), TokKind::Semi | TokKind::RBrace) {
                    exprs.push(self.parse_expr()?);
                    while self.eat(&TokKind::Comma) {
                        exprs.push(self.parse_expr()?);
                    }
                }
                StmtKind::Return(exprs)
            }
            TokKind::If => StmtKind::If(self.parse_if()?),
            TokKind::For => self.parse_for()?,
            TokKind::Switch => self.parse_switch()?,
            TokKind::Go => {
                self.bump();
                StmtKind::Go(self.parse_expr()?)
            }
            TokKind::Defer => {
                self.bump();
                StmtKind::Defer(self.parse_expr()?)
            }
            TokKind::Break => {
                self.bump();
                StmtKind::Break(self.opt_label())
            }
            TokKind::Continue => {
                self.bump();
                StmtKind::Continue(self.opt_label())
            }
            TokKind::LBrace => StmtKind::Block(self.parse_block()?),
            _ => self.parse_simple_stmt()?,
        };
        Ok(Stmt { lead, pos, kind })
    }

    fn opt_label(&mut self) -> Option<String> {
        if let TokKind::Ident(name) = self.peek().clone() {
            self.bump();
            Some(name)
        } else {
            None
        }
    }

    /// Expression statement, assignment, short var decl, or inc/dec.
    fn parse_simple_stmt(&mut self) -> Result<StmtKind, SyntaxError> {
        let mut lhs = vec![self.parse_expr()?];
        while self.eat(&TokKind::Comma) {
            lhs.push(self.parse_expr()?);
        }
        let op = match self.peek() {
            TokKind::Assign => Some(AssignOp::Assign),
            TokKind::Define => Some(AssignOp::Define),
            TokKind::PlusEq => Some(AssignOp::Add),
            TokKind::MinusEq => Some(AssignOp::Sub),
            TokKind::StarEq => Some(AssignOp::Mul),
            TokKind::SlashEq => Some(AssignOp::Div),
            TokKind::PercentEq => Some(AssignOp::Rem),
            TokKind::AmpEq => Some(AssignOp::BitAnd),
            TokKind::PipeEq => Some(AssignOp::BitOr),
            TokKind::CaretEq => Some(AssignOp::Xor),
            TokKind::ShlEq => Some(AssignOp::Shl),
            TokKind::ShrEq => Some(AssignOp::Shr),
            TokKind::AmpCaretEq => Some(AssignOp::AndNot),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let mut rhs = vec![self.parse_expr()?];
            while self.eat(&TokKind::Comma) {
                rhs.push(self.parse_expr()?);
            }
            return Ok(StmtKind::Assign { lhs, op, rhs });
        }
        if self.eat(&TokKind::Inc) {
            return Ok(StmtKind::IncDec { expr: lhs.remove(0), inc: true });
        }
        if self.eat(&TokKind::Dec) {
            return Ok(StmtKind::IncDec { expr: lhs.remove(0), inc: false });
        }
        if lhs.len() != 1 {
            return Err(self.error("expected assignment after expression list"));
        }
        Ok(StmtKind::Expr(lhs.remove(0)))
    }

    fn parse_if(&mut self) -> Result<IfStmt, SyntaxError> {
        self.expect(&TokKind::If, "if")?;
        let saved = std::mem::replace(&mut self.no_composite, true);
        let first = self.parse_simple_stmt()?;
        let (init, cond) = if self.eat(&TokKind::Semi) {
            let second = self.parse_simple_stmt()?;
            let cond = match second {
                StmtKind::Expr(e) => e,
                _ => {
                    self.no_composite = saved;
                    return Err(self.error("expected condition expression"));
                }
            };
            (Some(Box::new(Stmt::synthetic(first))), cond)
        } else {
            match first {
                StmtKind::Expr(e) => (None, e),
                _ => {
                    self.no_composite = saved;
                    return Err(self.error("expected condition expression"));
                }
            }
        };
        self.no_composite = saved;
        let then = self.parse_block()?;
        let els = if self.eat(&TokKind::Else) {
            if self.peek() == &TokKind::If {
                Some(ElseArm::If(Box::new(self.parse_if()?)))
            } else {
                Some(ElseArm::Block(self.parse_block()?))
            }
        } else {
            None
        };
        Ok(IfStmt { init, cond, then, els })
    }

    fn parse_for(&mut self) -> Result<StmtKind, SyntaxError> {
        self.expect(&TokKind::For, "for")?;
        let saved = std::mem::replace(&mut self.no_composite, true);
        let result = self.parse_for_header();
        self.no_composite = saved;
        result
    }

    fn parse_for_header(&mut self) -> Result<StmtKind, SyntaxError> {
        if self.peek() == &TokKind::LBrace {
            let body = self.parse_block()?;
            return Ok(StmtKind::For { init: None, cond: None, post: None, body });
        }
        if self.eat(&TokKind::Range) {
            let expr = self.parse_expr()?;
            let body = self.parse_block()?;
            return Ok(StmtKind::Range { key: None, value: None, define: false, expr, body });
        }
        if self.eat(&TokKind::Semi) {
            // `for ; cond ; post`
            return self.parse_for_tail(None);
        }

        let mut lhs = vec![self.parse_expr()?];
        while self.eat(&TokKind::Comma) {
            lhs.push(self.parse_expr()?);
        }

        for define in [true, false] {
            let tok = if define { TokKind::Define } else { TokKind::Assign };
            if self.peek() == &tok {
                self.bump();
                if self.eat(&TokKind::Range) {
                    if lhs.len() > 2 {
                        return Err(self.error("too many variables in range clause"));
                    }
                    let mut it = lhs.into_iter();
                    let key = it.next();
                    let value = it.next();
                    let expr = self.parse_expr()?;
                    let body = self.parse_block()?;
                    return Ok(StmtKind::Range { key, value, define, expr, body });
                }
                let mut rhs = vec![self.parse_expr()?];
                while self.eat(&TokKind::Comma) {
                    rhs.push(self.parse_expr()?);
                }
                let op = if define { AssignOp::Define } else { AssignOp::Assign };
                let init = Stmt::synthetic(StmtKind::Assign { lhs, op, rhs });
                self.expect(&TokKind::Semi, "';' in for header")?;
                return self.parse_for_tail(Some(Box::new(init)));
            }
        }

        if self.peek() == &TokKind::LBrace {
            // `for cond { … }`
            if lhs.len() != 1 {
                return Err(self.error("expected single loop condition"));
            }
            let body = self.parse_block()?;
            return Ok(StmtKind::For { init: None, cond: Some(lhs.remove(0)), post: None, body });
        }
        if self.eat(&TokKind::Semi) {
            if lhs.len() != 1 {
                return Err(self.error("expected single init statement"));
            }
            let init = Stmt::synthetic(StmtKind::Expr(lhs.remove(0)));
            return self.parse_for_tail(Some(Box::new(init)));
        }
        Err(self.error("malformed for header"))
    }

    fn parse_for_tail(&mut self, init: Option<Box<Stmt>>) -> Result<StmtKind, SyntaxError> {
        let cond = if self.peek() != &TokKind::Semi { Some(self.parse_expr()?) } else { None };
        self.expect(&TokKind::Semi, "';' in for header")?;
        let post = if self.peek() != &TokKind::LBrace {
            Some(Box::new(Stmt::synthetic(self.parse_simple_stmt()?)))
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(StmtKind::For { init, cond, post, body })
    }

    fn parse_switch(&mut self) -> Result<StmtKind, SyntaxError> {
        self.expect(&TokKind::Switch, "switch")?;
        let saved = std::mem::replace(&mut self.no_composite, true);
        let mut init = None;
        let mut tag = None;
        if self.peek() != &TokKind::LBrace {
            let first = self.parse_simple_stmt()?;
            if self.eat(&TokKind::Semi) {
                init = Some(Box::new(Stmt::synthetic(first)));
                if self.peek() != &TokKind::LBrace {
                    match self.parse_simple_stmt()? {
                        StmtKind::Expr(e) => tag = Some(e),
                        _ => {
                            self.no_composite = saved;
                            return Err(self.error("expected switch tag expression"));
                        }
                    }
                }
            } else {
                match first {
                    StmtKind::Expr(e) => tag = Some(e),
                    _ => {
                        self.no_composite = saved;
                        return Err(self.error("expected switch tag expression"));
                    }
                }
            }
        }
        self.no_composite = saved;
        self.expect(&TokKind::LBrace, "'{'")?;
        let mut cases = Vec::new();
        loop {
            self.skip_semis();
            match self.peek() {
                TokKind::Case => {
                    self.bump();
                    let mut exprs = vec![self.parse_expr()?];
                    while self.eat(&TokKind::Comma) {
                        exprs.push(self.parse_expr()?);
                    }
                    self.expect(&TokKind::Colon, "':'")?;
                    cases.push(CaseClause { exprs, body: self.parse_case_body()? });
                }
                TokKind::Default => {
                    self.bump();
                    self.expect(&TokKind::Colon, "':'")?;
                    cases.push(CaseClause { exprs: Vec::new(), body: self.parse_case_body()? });
                }
                TokKind::RBrace => {
                    self.bump();
                    break;
                }
                other => return Err(self.error(format!("expected case clause, found {other:?}"))),
            }
        }
        Ok(StmtKind::Switch { init, tag, cases })
    }

    fn parse_case_body(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut body = Vec::new();
        loop {
            self.skip_semis();
            if matches!(self.peek(), TokKind::Case | TokKind::Default | TokKind::RBrace) {
                break;
            }
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }

    // ---- Expressions ----

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokKind::OrOr => BinOp::OrOr,
                TokKind::AndAnd => BinOp::AndAnd,
                TokKind::EqEq => BinOp::Eq,
                TokKind::NotEq => BinOp::Ne,
                TokKind::Lt => BinOp::Lt,
                TokKind::Le => BinOp::Le,
                TokKind::Gt => BinOp::Gt,
                TokKind::Ge => BinOp::Ge,
                TokKind::Plus => BinOp::Add,
                TokKind::Minus => BinOp::Sub,
                TokKind::Pipe => BinOp::BitOr,
                TokKind::Caret => BinOp::Xor,
                TokKind::Star => BinOp::Mul,
                TokKind::Slash => BinOp::Div,
                TokKind::Percent => BinOp::Rem,
                TokKind::Shl => BinOp::Shl,
                TokKind::Shr => BinOp::Shr,
                TokKind::Amp => BinOp::BitAnd,
                TokKind::AmpCaret => BinOp::AndNot,
                _ => break,
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            TokKind::Not => Some(UnOp::Not),
            TokKind::Minus => Some(UnOp::Neg),
            TokKind::Plus => Some(UnOp::Plus),
            TokKind::Amp => Some(UnOp::Addr),
            TokKind::Star => Some(UnOp::Deref),
            TokKind::Caret => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let x = self.parse_unary()?;
            return Ok(Expr::Unary { op, x: Box::new(x) });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_operand()?;
        loop {
            match self.peek() {
                TokKind::Dot => {
                    self.bump();
                    let sel = self.expect_ident("selector")?;
                    expr = Expr::Selector { x: Box::new(expr), sel };
                }
                TokKind::LParen => {
                    self.bump();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while self.peek() != &TokKind::RParen {
                        self.skip_semis();
                        if self.peek() == &TokKind::RParen {
                            break;
                        }
                        args.push(self.parse_expr()?);
                        if self.eat(&TokKind::Ellipsis) {
                            ellipsis = true;
                        }
                        if !self.eat(&TokKind::Comma) {
                            break;
                        }
                    }
                    self.no_composite = saved;
                    self.skip_semis();
                    self.expect(&TokKind::RParen, "')'")?;
                    expr = Expr::Call { fun: Box::new(expr), args, ellipsis };
                }
                TokKind::LBrack => {
                    self.bump();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let low = if matches!(self.peek(), TokKind::Colon) {
                        None
                    } else {
                        Some(Box::new(self.parse_expr()?))
                    };
                    if self.eat(&TokKind::Colon) {
                        let high = if self.peek() == &TokKind::RBrack {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()?))
                        };
                        self.no_composite = saved;
                        self.expect(&TokKind::RBrack, "']'")?;
                        expr = Expr::Slice { x: Box::new(expr), low, high };
                    } else {
                        self.no_composite = saved;
                        self.expect(&TokKind::RBrack, "']'")?;
                        let index = low.ok_or_else(|| self.error("expected index expression"))?;
                        expr = Expr::Index { x: Box::new(expr), index };
                    }
                }
                TokKind::LBrace if !self.no_composite && is_type_name(&expr) => {
                    let ty = self.expr_to_type(&expr)?;
                    let elems = self.parse_composite_body()?;
                    expr = Expr::Composite { ty: Some(ty), elems };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_operand(&mut self) -> Result<Expr, SyntaxError> {
        let pos = self.pos();
        match self.peek().clone() {
            TokKind::Ident(name) => {
                self.bump();
                Ok(Expr::Ident { name, pos })
            }
            TokKind::Int(text) => {
                self.bump();
                Ok(Expr::Lit { kind: LitKind::Int, text })
            }
            TokKind::Float(text) => {
                self.bump();
                Ok(Expr::Lit { kind: LitKind::Float, text })
            }
            TokKind::Imag(text) => {
                self.bump();
                Ok(Expr::Lit { kind: LitKind::Imag, text })
            }
            TokKind::Char(text) => {
                self.bump();
                Ok(Expr::Lit { kind: LitKind::Char, text })
            }
            TokKind::Str(text) => {
                self.bump();
                Ok(Expr::Lit { kind: LitKind::Str, text })
            }
            TokKind::Func => {
                self.bump();
                let params = self.parse_param_list()?;
                let results = self.parse_results()?;
                let saved = std::mem::replace(&mut self.no_composite, false);
                let body = self.parse_block();
                self.no_composite = saved;
                Ok(Expr::FuncLit { params, results, body: body? })
            }
            TokKind::LParen => {
                self.bump();
                let saved = std::mem::replace(&mut self.no_composite, false);
                let inner = self.parse_expr();
                self.no_composite = saved;
                self.expect(&TokKind::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(inner?)))
            }
            TokKind::LBrack | TokKind::Map | TokKind::Struct | TokKind::Interface => {
                // A type operand: composite literal (`[]T{…}`) or
                // conversion (`[]byte(s)`).
                let ty = self.parse_type()?;
                if self.peek() == &TokKind::LBrace {
                    let elems = self.parse_composite_body()?;
                    Ok(Expr::Composite { ty: Some(ty), elems })
                } else {
                    Ok(Expr::TypeRef(ty))
                }
            }
            other => Err(self.error(format!("expected expression, found {other:?}"))),
        }
    }

    fn parse_composite_body(&mut self) -> Result<Vec<CompositeElem>, SyntaxError> {
        self.expect(&TokKind::LBrace, "'{'")?;
        let saved = std::mem::replace(&mut self.no_composite, false);
        let mut elems = Vec::new();
        loop {
            self.skip_semis();
            if self.peek() == &TokKind::RBrace {
                break;
            }
            let first = self.parse_composite_value()?;
            let elem = if self.eat(&TokKind::Colon) {
                let value = self.parse_composite_value()?;
                CompositeElem { key: Some(first), value }
            } else {
                CompositeElem { key: None, value: first }
            };
            elems.push(elem);
            if !self.eat(&TokKind::Comma) {
                self.skip_semis();
                if self.peek() != &TokKind::RBrace {
                    self.no_composite = saved;
                    return Err(self.error("expected ',' or '}' in composite literal"));
                }
            }
        }
        self.no_composite = saved;
        self.expect(&TokKind::RBrace, "'}'")?;
        Ok(elems)
    }

    /// A composite element value: an expression or a nested untyped `{…}`.
    fn parse_composite_value(&mut self) -> Result<Expr, SyntaxError> {
        if self.peek() == &TokKind::LBrace {
            let elems = self.parse_composite_body()?;
            Ok(Expr::Composite { ty: None, elems })
        } else {
            self.parse_expr()
        }
    }

    /// Turn an already-parsed `T` or `pkg.T` expression into a type for a
    /// composite literal head.
    fn expr_to_type(&mut self, expr: &Expr) -> Result<TypeExpr, SyntaxError> {
        let id = self.fresh_id();
        let pos = self.pos();
        match expr {
            Expr::Ident { name, .. } => {
                Ok(TypeExpr { id, pos, kind: TypeKind::Name(name.clone()) })
            }
            Expr::Selector { x, sel } => match x.as_ref() {
                Expr::Ident { name, .. } => Ok(TypeExpr {
                    id,
                    pos,
                    kind: TypeKind::Qualified { pkg: name.clone(), name: sel.clone() },
                }),
                _ => Err(self.error("unsupported composite literal type")),
            },
            _ => Err(self.error("unsupported composite literal type")),
        }
    }
}

/// Whether an expression can be the type head of a composite literal.
fn is_type_name(expr: &Expr) -> bool {
    match expr {
        Expr::Ident { .. } => true,
        Expr::Selector { x, .. } => matches!(x.as_ref(), Expr::Ident { .. }),
        _ => false,
    }
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> File {
        parse_file(source).unwrap()
    }

    fn first_func(file: &File) -> &FuncDecl {
        file.decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) => Some(f),
                Decl::Gen(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse("package demo\n\nimport (\n\t\"strings\"\n\t\"testing\"\n)\n");
        assert_eq!(file.package, "demo");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[1].path, "testing");
        assert_eq!(file.imports[1].local_name(), "testing");
    }

    #[test]
    fn test_parse_aliased_import() {
        let file = parse("package demo\n\nimport tt \"testing\"\n");
        assert_eq!(file.imports[0].alias.as_deref(), Some("tt"));
        assert_eq!(file.imports[0].local_name(), "tt");
    }

    #[test]
    fn test_parse_test_function_signature() {
        let file = parse("package demo\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n}\n");
        let f = first_func(&file);
        assert_eq!(f.name, "TestX");
        assert_eq!(f.params.len(), 1);
        assert_eq!(f.sole_param_name(), Some("t"));
        match &f.params[0].ty.kind {
            TypeKind::Pointer(inner) => match &inner.kind {
                TypeKind::Qualified { pkg, name } => {
                    assert_eq!(pkg, "testing");
                    assert_eq!(name, "T");
                }
                other => panic!("unexpected inner type {other:?}"),
            },
            other => panic!("unexpected type {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_call_with_func_literal() {
        let src = "package demo\n\nimport \"testing\"\n\nfunc TestY(t *testing.T) {\n\tt.Run(\"a\", func(t *testing.T) {\n\t\tt.Log(\"hi\")\n\t})\n}\n";
        let file = parse(src);
        let f = first_func(&file);
        let stmt = &f.body.stmts[0];
        match &stmt.kind {
            StmtKind::Expr(Expr::Call { fun, args, .. }) => {
                match fun.as_ref() {
                    Expr::Selector { x, sel } => {
                        assert_eq!(x.as_ident(), Some("t"));
                        assert_eq!(sel, "Run");
                    }
                    other => panic!("unexpected fun {other:?}"),
                }
                assert_eq!(args.len(), 2);
                assert!(matches!(args[1], Expr::FuncLit { .. }));
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn test_parse_table_test_idiom() {
        let src = r#"package demo

import "testing"

func TestTable(t *testing.T) {
	tests := []struct {
		name string
		in   int
		want int
	}{
		{"one", 1, 1},
		{"two", 2, 4},
	}
	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {
			if tt.in*tt.in != tt.want {
				t.Errorf("got %d", tt.in*tt.in)
			}
		})
	}
}
"#;
        let file = parse(src);
        let f = first_func(&file);
        assert_eq!(f.body.stmts.len(), 2);
        match &f.body.stmts[0].kind {
            StmtKind::Assign { lhs, op, rhs } => {
                assert_eq!(lhs[0].as_ident(), Some("tests"));
                assert_eq!(*op, AssignOp::Define);
                match &rhs[0] {
                    Expr::Composite { ty: Some(ty), elems } => {
                        assert!(matches!(ty.kind, TypeKind::Slice(_)));
                        assert_eq!(elems.len(), 2);
                    }
                    other => panic!("unexpected rhs {other:?}"),
                }
            }
            other => panic!("unexpected stmt {other:?}"),
        }
        match &f.body.stmts[1].kind {
            StmtKind::Range { key, value, define, expr, body } => {
                assert_eq!(key.as_ref().and_then(|e| e.as_ident()), Some("_"));
                assert_eq!(value.as_ref().and_then(|e| e.as_ident()), Some("tt"));
                assert!(define);
                assert_eq!(expr.as_ident(), Some("tests"));
                assert_eq!(body.stmts.len(), 1);
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_with_init() {
        let src = "package demo\n\nfunc f() {\n\tif err := g(); err != nil {\n\t\treturn\n\t}\n}\n";
        let file = parse(src);
        let f = first_func(&file);
        match &f.body.stmts[0].kind {
            StmtKind::If(ifs) => {
                assert!(ifs.init.is_some());
                assert!(matches!(ifs.cond, Expr::Binary { op: BinOp::Ne, .. }));
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn test_composite_not_parsed_in_if_header() {
        // `x == y` followed by the block brace must not be taken as `y{…}`.
        let src = "package demo\n\nfunc f(x, y int) {\n\tif x == y {\n\t\tx++\n\t}\n}\n";
        let file = parse(src);
        let f = first_func(&file);
        assert!(matches!(f.body.stmts[0].kind, StmtKind::If(_)));
    }

    #[test]
    fn test_parse_shared_param_shorthand() {
        let file = parse("package demo\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n");
        let f = first_func(&file);
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].name.as_deref(), Some("a"));
        assert_eq!(f.params[1].name.as_deref(), Some("b"));
        assert!(matches!(&f.params[1].ty.kind, TypeKind::Name(n) if n == "int"));
    }

    #[test]
    fn test_lead_comments_attached() {
        let src = "// Package demo does demo things.\npackage demo\n\n// TestX is great.\nfunc TestX() {\n\t// inner note\n\tx := 1\n\t_ = x\n}\n";
        let file = parse(src);
        assert_eq!(file.lead_comments, vec!["// Package demo does demo things.".to_string()]);
        let f = first_func(&file);
        assert_eq!(f.lead, vec!["// TestX is great.".to_string()]);
        assert_eq!(f.body.stmts[0].lead, vec!["// inner note".to_string()]);
    }

    #[test]
    fn test_unsupported_construct_is_error() {
        let src = "package demo\n\nfunc f(ch chan int) {\n}\n";
        assert!(parse_file(src).is_err());
    }

    #[test]
    fn test_method_receiver() {
        let src = "package demo\n\ntype s struct{}\n\nfunc (v *s) Name() string {\n\treturn \"s\"\n}\n";
        let file = parse(src);
        let f = first_func(&file);
        assert!(f.receiver.is_some());
        assert_eq!(f.name, "Name");
    }
}
