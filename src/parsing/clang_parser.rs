//! libclang-backed C/C++ parser (spec §4.3.2), ported from `parse_with_clang.c`'s cursor
//! visitor.

use std::path::{Path, PathBuf};

use clang::{Clang, EntityKind, EntityVisitResult, Index};
use tracing::warn;

use crate::error::{ClinkError, Result};
use crate::symbol::{Category, Symbol};
use super::Parser;

/// Extra `-I` directories passed to Clang for every file this parser handles.
pub struct ClangParser {
    pub include_dirs: Vec<PathBuf>,
}

impl ClangParser {
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        ClangParser { include_dirs }
    }
}

/// Cursor kinds that can serve as the semantic parent of their descendants.
fn is_parent(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::StructDecl
            | EntityKind::UnionDecl
            | EntityKind::ClassDecl
            | EntityKind::EnumDecl
            | EntityKind::FunctionDecl
            | EntityKind::TypedefDecl
            | EntityKind::Method
            | EntityKind::Namespace
            | EntityKind::Constructor
            | EntityKind::Destructor
            | EntityKind::ConversionFunction
            | EntityKind::FunctionTemplate
            | EntityKind::ClassTemplate
            | EntityKind::ClassTemplatePartialSpecialization
            | EntityKind::MacroDefinition
    )
}

fn category_of(kind: EntityKind) -> Option<Category> {
    use EntityKind::*;
    Some(match kind {
        StructDecl | UnionDecl | ClassDecl | EnumDecl | FieldDecl | EnumConstantDecl
        | FunctionDecl | VarDecl | ParmDecl | TypedefDecl | Method | Namespace
        | Constructor | Destructor | ConversionFunction | TemplateTypeParameter
        | NonTypeTemplateParameter | TemplateTemplateParameter | FunctionTemplate
        | ClassTemplate | ClassTemplatePartialSpecialization | NamespaceAlias
        | TypeAliasDecl | MacroDefinition => Category::Definition,

        CallExpr | MacroExpansion => Category::FunctionCall,

        UsingDirective | UsingDeclaration | TypeRef | TemplateRef | NamespaceRef
        | MemberRef | LabelRef | OverloadedDeclRef | VariableRef | DeclRefExpr
        | MemberRefExpr | UnexposedExpr => Category::Reference,

        InclusionDirective => Category::Include,

        _ => return None,
    })
}

impl Parser for ClangParser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>> {
        let clang = Clang::new().map_err(|e| {
            ClinkError::IoError(std::io::Error::other(format!(
                "libclang unavailable: {e}"
            )))
        })?;
        let index = Index::new(&clang, false, false);

        let mut args: Vec<String> = Vec::new();
        for dir in &self.include_dirs {
            args.push(format!("-I{}", dir.display()));
        }

        let tu = index
            .parser(path)
            .arguments(&args)
            .detailed_preprocessing_record(true)
            .keep_going(true)
            .skip_function_bodies(true)
            .parse()
            .map_err(|e| {
                ClinkError::IoError(std::io::Error::other(format!(
                    "clang failed to parse {}: {e}",
                    path.display()
                )))
            })?;

        let mut symbols = Vec::new();
        let root = tu.get_entity();
        visit(root, "", path, &mut symbols);
        Ok(symbols)
    }
}

fn visit(entity: clang::Entity, parent: &str, path: &Path, out: &mut Vec<Symbol>) {
    entity.visit_children(|cursor, _parent_cursor| {
        let Some(location) = cursor.get_location() else {
            return EntityVisitResult::Recurse;
        };
        if !location.is_in_main_file() {
            return EntityVisitResult::Continue;
        }

        let kind = cursor.get_kind();
        let Some(category) = category_of(kind) else {
            return EntityVisitResult::Recurse;
        };

        let Some(name) = cursor.get_name() else {
            return EntityVisitResult::Recurse;
        };
        if name.is_empty() {
            return EntityVisitResult::Recurse;
        }

        let (file, line, column, _offset) = location.get_spelling_location();
        if file.is_none() {
            return EntityVisitResult::Recurse;
        }

        out.push(Symbol::new(
            category,
            name,
            path.to_path_buf(),
            line,
            column,
            parent,
        ));

        let next_parent = if is_parent(kind) {
            cursor.get_name().unwrap_or_default()
        } else {
            parent.to_string()
        };
        visit(cursor, &next_parent, path, out);

        EntityVisitResult::Continue
    });
}

/// True if libclang could be located and initialised on this system. Used by the parser
/// factory to decide whether this parser is selectable at all, per spec §4.3.2's
/// no-silent-fallback rule.
pub fn is_available() -> bool {
    match Clang::new() {
        Ok(_) => true,
        Err(e) => {
            warn!("libclang unavailable: {e}");
            false
        }
    }
}
