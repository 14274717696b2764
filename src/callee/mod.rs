//! # Callee descriptors
//!
//! Everything the inliner needs to know about an inlinable function,
//! computed once in the function's own package and shipped to importers
//! as a fact. A descriptor never refers to the producing program: the
//! declaration travels as text, with the places that need rewriting at a
//! call site recorded as *holes*:
//!
//! - a **parameter hole** is a reference to a parameter, replaced by the
//!   argument (or left alone when the parameter is bound);
//! - a **free hole** is a reference to a package-level or predeclared
//!   name, re-spelled for the caller's file (`helper` becomes `pkg.helper`).
//!
//! Types are carried the same way, as [`TypeText`] templates whose package
//! qualifiers are filled in per call site.

mod analyze;
mod template;

use serde::{Deserialize, Serialize};

pub(crate) use analyze::analyze;
pub use template::{TypeSeg, TypeText};

/// Byte range into [`Callee::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn contains(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callee {
    /// `F`, or `T.M` for methods.
    pub name: String,
    pub pkg_path: String,
    pub pkg_name: String,
    /// The declaration from `func` through the closing brace.
    pub content: String,
    /// The body, braces included.
    pub body: TextRange,
    /// Inside the receiver's parentheses.
    pub recv_text: Option<TextRange>,
    /// Inside the parameter list's parentheses.
    pub params_text: TextRange,
    /// The result list as written, parentheses included if any.
    pub results_text: Option<TextRange>,
    /// Leading whitespace of the body's statements.
    pub indent: String,
    /// Receiver first, then the declared parameters.
    pub params: Vec<Param>,
    pub results: Vec<ResultVar>,
    pub generic: bool,
    /// Sorted by position, never overlapping.
    pub holes: Vec<Hole>,
    pub free: Vec<FreeRef>,
    /// Names declared inside the body.
    pub locals: Vec<String>,
    /// Unexported names of the callee's package that the body needs.
    pub unexported: Vec<String>,
    pub shape: Shape,
    pub effects: BodyEffects,
}

impl Callee {
    pub fn is_method(&self) -> bool {
        matches!(self.params.first(), Some(Param { kind: ParamKind::Receiver { .. }, .. }))
    }

    pub fn variadic(&self) -> bool {
        matches!(self.params.last(), Some(Param { kind: ParamKind::Variadic { .. }, .. }))
    }

    pub fn named_results(&self) -> bool {
        self.results.iter().any(|r| !r.name.is_empty() && r.name != "_")
    }

    /// How diagnostics name the function: `pkg/path.F` or `(pkg/path.T).M`.
    pub fn display(&self) -> String {
        match (self.name.split_once('.'), self.params.first().map(|p| &p.kind)) {
            (Some((t, m)), Some(ParamKind::Receiver { pointer: true })) => format!("(*{}.{t}).{m}", self.pkg_path),
            (Some((t, m)), _) => format!("({}.{t}).{m}", self.pkg_path),
            (None, _) => format!("{}.{}", self.pkg_path, self.name),
        }
    }

    pub fn text(&self, r: TextRange) -> &str {
        self.content.get(r.range()).unwrap_or("")
    }

    /// Copies `r`, filling every hole inside it through `fill`. Holes that
    /// `fill` declines keep their original text.
    pub fn render<E>(&self, r: TextRange, mut fill: impl FnMut(&Hole) -> Result<Option<String>, E>) -> Result<String, E> {
        let mut out = String::with_capacity(r.range().len());
        let mut at = r.start;
        for hole in self.holes.iter().filter(|h| r.contains(h.range)) {
            out.push_str(self.text(TextRange {
                start: at,
                end: hole.range.start,
            }));
            match fill(hole)? {
                Some(text) => out.push_str(&text),
                None => out.push_str(self.text(hole.range)),
            }
            at = hole.range.end;
        }
        out.push_str(self.text(TextRange { start: at, end: r.end }));
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Empty for unnamed parameters.
    pub name: String,
    pub ty: TypeText,
    pub kind: ParamKind,
    pub uses: ParamUses,
}

impl Param {
    pub fn is_named(&self) -> bool {
        !self.name.is_empty() && self.name != "_"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    Receiver { pointer: bool },
    Plain,
    /// `...T`; `ty` is the slice type.
    Variadic { elem: TypeText },
}

/// How the body uses one parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamUses {
    pub refs: u32,
    pub assigned: bool,
    pub addr_taken: bool,
    /// Referenced from inside a function literal.
    pub captured: bool,
    /// Some reference may run zero or many times.
    pub conditional: bool,
    /// An effect may happen before the first reference.
    pub effect_before: bool,
    /// Rank of the first reference among all parameters' first references.
    pub first_ref: Option<u32>,
    /// Every reference is implicitly converted to the parameter's own type.
    pub implicit_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultVar {
    pub name: String,
    pub ty: TypeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hole {
    pub range: TextRange,
    pub kind: HoleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleKind {
    Param {
        index: u16,
        /// Precedence the slot needs.
        need: u8,
        /// Operand of a selector: `p.f`.
        selector_base: bool,
        /// Inside an `if`, `for` or `switch` header.
        in_header: bool,
    },
    Free { index: u16 },
}

/// A name the body uses but does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRef {
    pub name: String,
    /// `None` for predeclared names.
    pub pkg_path: Option<String>,
    pub pkg_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Empty,
    /// `{ return e1, ..., en }`.
    Return { exprs: Vec<ResultExpr>, spread: bool },
    /// Anything else; a trailing bare `return` is already dropped.
    Stmts { range: TextRange, returns: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultExpr {
    pub range: TextRange,
    pub prec: u8,
    pub pure: bool,
    /// A function call, which may stand alone as a statement.
    pub call: bool,
    /// The expression's type differs from the result's; substitution
    /// must convert it.
    pub convert: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyEffects {
    pub defer: bool,
    pub recover: bool,
    pub labels: bool,
    pub go_stmt: bool,
    pub panics: bool,
    pub reads_globals: bool,
    pub writes_globals: bool,
    /// The body refers to its named results, or returns without operands.
    pub named_results: bool,
}
