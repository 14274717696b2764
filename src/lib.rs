//! `//go:fix inline` for Go programs.
//!
//! A declaration annotated with the directive asks its callers to be
//! rewritten in terms of its definition:
//!
//! - a call of an inlinable function becomes the function's body, with
//!   arguments substituted for parameters;
//! - a use of an inlinable constant `C = F` becomes `F`;
//! - a use of an inlinable alias `A = T` becomes `T`.
//!
//! [`Analyzer::run`] works package by package over a loaded
//! [`gofix_types::Program`]: [`discovery`] validates directives and exports
//! [`facts`] for dependent packages, then [`inline`] visits every reference
//! and reports a [`Diagnostic`] carrying the text edits of the rewrite.
//! Any doubt about preserving behaviour means no edit.

pub mod analyzer;
pub mod callee;
pub mod config;
pub mod directive;
pub mod discovery;
pub mod edit;
pub mod error;
mod expr;
pub mod facts;
pub mod imports;
pub mod inline;
pub mod refactor;

pub use analyzer::{Analyzer, PackageReport};
pub use config::Options;
pub use edit::{Diagnostic, SuggestedFix, TextEdit, apply_edits, apply_fixes};
pub use error::{AnalysisError, DeleteError, DirectiveError, EditError, FactError, InlineError};
pub use facts::{Fact, FactKind, FactStore, MemoryFactStore, ObjectKey};
