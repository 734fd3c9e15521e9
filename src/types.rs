// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Resolved static types for classifier decisions.
//!
//! The loader runs [`resolve_file`] over each parsed file, producing a
//! [`TypeTable`] that maps parameter type expressions to resolved types.
//! Resolution is import-aware: `*testing.T` resolves through whatever local
//! name the `testing` package was imported under.

use crate::syntax::{Decl, File, NodeId, TypeExpr, TypeKind};
use std::collections::HashMap;

/// The well-known test-handle type.
pub const TEST_HANDLE_TYPE: &str = "testing.T";

/// A resolved static type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Named(String),
    Pointer(Box<Type>),
}

impl Type {
    /// True for a pointer to the named type.
    pub fn is_pointer_to(&self, name: &str) -> bool {
        matches!(self, Type::Pointer(inner) if matches!(inner.as_ref(), Type::Named(n) if n == name))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::Pointer(inner) => write!(f, "*{inner}"),
        }
    }
}

/// Map from type-expression node id to resolved type.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    map: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: NodeId) -> Option<&Type> {
        self.map.get(&id)
    }

    fn insert(&mut self, id: NodeId, ty: Type) {
        self.map.insert(id, ty);
    }
}

/// Resolve the signature types of every top-level function in `file` into
/// `table`.
pub fn resolve_file(file: &File, table: &mut TypeTable) {
    // Local import name -> fully qualified package path.
    let mut imports: HashMap<&str, &str> = HashMap::new();
    for imp in &file.imports {
        let local = imp.local_name();
        // Dot and blank imports contribute no usable qualifier.
        if local != "." && local != "_" {
            imports.insert(local, &imp.path);
        }
    }

    for decl in &file.decls {
        if let Decl::Func(f) = decl {
            let all = f.receiver.iter().chain(f.params.iter()).chain(f.results.iter());
            for param in all {
                resolve_type_expr(&param.ty, &imports, table);
            }
        }
    }
}

fn resolve_type_expr(
    ty: &TypeExpr,
    imports: &HashMap<&str, &str>,
    table: &mut TypeTable,
) -> Option<Type> {
    let resolved = match &ty.kind {
        TypeKind::Name(name) => Type::Named(name.clone()),
        TypeKind::Qualified { pkg, name } => {
            let path = imports.get(pkg.as_str())?;
            let base = path.rsplit('/').next().unwrap_or(path);
            Type::Named(format!("{base}.{name}"))
        }
        TypeKind::Pointer(inner) => {
            let inner = resolve_type_expr(inner, imports, table)?;
            Type::Pointer(Box::new(inner))
        }
        // Composite type shapes are irrelevant to classification.
        _ => return None,
    };
    table.insert(ty.id, resolved.clone());
    Some(resolved)
}
