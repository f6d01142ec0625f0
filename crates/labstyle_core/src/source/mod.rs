//! Source parsing front end.
//!
//! # Responsibility
//! - Turn Rust source text into a `syn` syntax tree with span locations.
//! - Offer the small structural helpers rules share (docs, cfg, type text).
//!
//! # Invariants
//! - Parsing never panics; failures are kept on the `SourceFile`.
//! - Reported columns are 1-based.

use crate::model::finding::Location;
use proc_macro2::Span;
use std::string::FromUtf8Error;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{AttrStyle, Attribute, Expr, ExprLit, Lit, Meta, Token};

pub mod changelog;
pub mod markdown;

/// Role of a Rust file inside its crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Under `src/`.
    Library,
    /// Under `tests/`.
    IntegrationTest,
    /// Anything else (`benches/`, `build.rs`, loose files).
    Other,
}

/// Parser rejection with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// One Rust file as seen by the rules.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Root-relative path with `/` separators.
    pub path: String,
    pub kind: FileKind,
    pub text: String,
    pub syntax: Result<syn::File, ParseFailure>,
}

impl SourceFile {
    pub fn parse(path: impl Into<String>, kind: FileKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let syntax = syn::parse_file(&text).map_err(|err| {
            let start = err.span().start();
            ParseFailure {
                line: start.line.max(1),
                column: start.column + 1,
                message: err.to_string(),
            }
        });
        Self {
            path: path.into(),
            kind,
            text,
            syntax,
        }
    }

    /// File whose bytes are not UTF-8; kept as a failure at the first bad byte.
    pub fn undecodable(path: impl Into<String>, kind: FileKind, err: &FromUtf8Error) -> Self {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|byte| **byte == b'\n').count() + 1;
        let column = valid.iter().rev().take_while(|byte| **byte != b'\n').count() + 1;
        Self {
            path: path.into(),
            kind,
            text: String::new(),
            syntax: Err(ParseFailure {
                line,
                column,
                message: format!("source is not valid UTF-8: {}", err.utf8_error()),
            }),
        }
    }

    /// Location of a span inside this file.
    pub fn location(&self, span: Span) -> Location {
        let start = span.start();
        Location::at(self.path.clone(), start.line, start.column + 1)
    }

    /// Returns whether the whole file is compiled only for tests.
    ///
    /// True for `tests.rs` files, files under a `tests/` directory and files
    /// carrying an inner `#![cfg(test)]`.
    pub fn is_test_context(&self) -> bool {
        if self.kind == FileKind::IntegrationTest {
            return true;
        }
        if self.path.rsplit('/').next() == Some("tests.rs") {
            return true;
        }
        let mut below_src = self.path.split('/').skip_while(|segment| *segment != "src");
        if below_src.any(|segment| segment == "tests") {
            return true;
        }
        match &self.syntax {
            Ok(file) => file
                .attrs
                .iter()
                .any(|attr| matches!(attr.style, AttrStyle::Inner(_)) && is_cfg_test(attr)),
            Err(_) => false,
        }
    }
}

/// Whitespace-free rendering of a type, e.g. `&mutVec<u8>`.
pub fn type_text(ty: &syn::Type) -> String {
    ty.to_token_stream()
        .to_string()
        .split_whitespace()
        .collect::<String>()
}

/// Inner (`//!`) doc lines of a file, one entry per line.
pub fn module_doc_lines(file: &syn::File) -> Vec<String> {
    file.attrs
        .iter()
        .filter(|attr| matches!(attr.style, AttrStyle::Inner(_)))
        .filter_map(doc_text)
        .flat_map(|text| {
            text.split('\n')
                .map(|line| line.strip_prefix(' ').unwrap_or(line).to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Returns whether the file pulls module docs from elsewhere, e.g.
/// `#![doc = include_str!("../README.md")]`.
pub fn has_included_module_doc(file: &syn::File) -> bool {
    file.attrs.iter().any(|attr| {
        matches!(attr.style, AttrStyle::Inner(_))
            && attr.path().is_ident("doc")
            && matches!(&attr.meta, Meta::NameValue(name_value) if !matches!(name_value.value, Expr::Lit(_)))
    })
}

/// Returns whether any attribute is a cfg enabling `test`, alone or inside
/// `all(...)`/`any(...)`.
pub fn has_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(is_cfg_test)
}

/// Returns whether the item is a test function (`#[test]`, `#[tokio::test]`, ...).
pub fn is_test_fn(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "test")
    })
}

fn is_cfg_test(attr: &Attribute) -> bool {
    if !attr.path().is_ident("cfg") {
        return false;
    }
    attr.parse_args::<Meta>()
        .is_ok_and(|predicate| enables_test(&predicate))
}

/// `not(...)` and key-value predicates such as `feature = "..."` never count.
fn enables_test(predicate: &Meta) -> bool {
    match predicate {
        Meta::Path(path) => path.is_ident("test"),
        Meta::List(list) if list.path.is_ident("all") || list.path.is_ident("any") => list
            .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            .is_ok_and(|nested| nested.iter().any(enables_test)),
        _ => false,
    }
}

fn doc_text(attr: &Attribute) -> Option<String> {
    if !attr.path().is_ident("doc") {
        return None;
    }
    match &attr.meta {
        Meta::NameValue(name_value) => match &name_value.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(value),
                ..
            }) => Some(value.value()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{has_cfg_test, is_test_fn, module_doc_lines, type_text, FileKind, SourceFile};

    #[test]
    fn parse_failure_keeps_position() {
        let file = SourceFile::parse("src/lib.rs", FileKind::Library, "fn broken( {");
        let failure = file.syntax.expect_err("invalid source");
        assert_eq!(failure.line, 1);
        assert!(failure.column >= 1);
    }

    #[test]
    fn undecodable_file_points_at_first_bad_byte() {
        let err = String::from_utf8(b"fn ok() {}\nfn \xff() {}\n".to_vec()).expect_err("invalid utf-8");
        let file = SourceFile::undecodable("src/bad.rs", FileKind::Library, &err);
        let failure = file.syntax.expect_err("undecodable source");
        assert_eq!((failure.line, failure.column), (2, 4));
        assert!(failure.message.starts_with("source is not valid UTF-8"));
        assert!(file.text.is_empty());
    }

    #[test]
    fn module_doc_lines_strip_leading_space() {
        let file = SourceFile::parse(
            "src/lib.rs",
            FileKind::Library,
            "//! Title.\n//!\n//! # Responsibility\n\npub fn f() {}\n",
        );
        let syntax = file.syntax.expect("valid source");
        assert_eq!(
            module_doc_lines(&syntax),
            vec!["Title.", "", "# Responsibility"]
        );
    }

    #[test]
    fn detects_test_attributes() {
        let file: syn::File = syn::parse_str(
            "#[cfg(test)] mod a {} #[cfg(not(test))] mod b {} #[tokio::test] async fn c() {}
             #[cfg(all(test, not(windows)))] mod d {} #[cfg(any(test, feature = \"x\"))] mod e {}
             #[cfg(feature = \"test-utils\")] mod f {} #[cfg(all(unix, not(test)))] mod g {}",
        )
        .expect("valid source");
        let attrs = file
            .items
            .iter()
            .map(|item| match item {
                syn::Item::Mod(item) => item.attrs.clone(),
                syn::Item::Fn(item) => item.attrs.clone(),
                _ => Vec::new(),
            })
            .collect::<Vec<_>>();
        assert!(has_cfg_test(&attrs[0]));
        assert!(!has_cfg_test(&attrs[1]));
        assert!(is_test_fn(&attrs[2]));
        assert!(has_cfg_test(&attrs[3]));
        assert!(has_cfg_test(&attrs[4]));
        assert!(!has_cfg_test(&attrs[5]));
        assert!(!has_cfg_test(&attrs[6]));
    }

    #[test]
    fn type_text_removes_whitespace() {
        let ty: syn::Type = syn::parse_str("impl FnOnce(u32) -> bool").expect("valid type");
        assert_eq!(type_text(&ty), "implFnOnce(u32)->bool");
    }

    #[test]
    fn test_context_files() {
        let unit = SourceFile::parse("crates/a/src/tests.rs", FileKind::Library, "");
        assert!(unit.is_test_context());
        let gated = SourceFile::parse("crates/a/src/fixtures.rs", FileKind::Library, "#![cfg(test)]");
        assert!(gated.is_test_context());
        let plain = SourceFile::parse("crates/a/src/lib.rs", FileKind::Library, "");
        assert!(!plain.is_test_context());
    }
}
