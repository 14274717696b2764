//! # Go type model
//!
//! Loads a set of packages, parses every file with one shared [`Interner`]
//! and type-checks each package against the ones added before it. The
//! resulting [`Program`] answers the questions a source rewriter asks:
//!
//! - which object does this identifier denote, or define?
//! - what is the static type (and constant value) of this expression?
//! - how does this selector resolve (field, method, embedded path)?
//! - which object does a name resolve to at a given position?
//! - may package `a` import package `b`?
//! - how is this type spelled from a given file?
//!
//! The checker is deliberately forgiving: it assumes the program compiles
//! and records what it can; anything it does not understand gets the
//! invalid type instead of aborting.
//!
//! [`Interner`]: gofix_syntax::ast::Interner

mod check;
pub mod constant;
pub mod info;
mod lookup;
pub mod objects;
mod printer;
pub mod program;
pub mod scope;
mod subst;
pub mod types;
mod universe;

pub use constant::ConstValue;
pub use info::{Info, Mode, Selection, SelectionKind, TypeAndValue};
pub use lookup::LookupResult;
pub use objects::{Builtin, ObjKind, ObjPos, Object, VarKind};
pub use printer::{Qualifier, TypeParamText};
pub use program::{File, ImportInfo, LoadError, Package, Program, ProgramBuilder, TypeError};
pub use scope::{Scope, ScopeKind};
pub use types::{BasicKind, Named, Signature, Type, TypeTable};

macro_rules! index_types {
    ($($(#[$m:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$m])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) u32);

            impl $name {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

index_types! {
    /// A file of the program.
    FileId,
    /// A package of the program.
    PkgId,
    /// An object: constant, variable, type name, function, ...
    ObjId,
    /// A type in the program's [`TypeTable`].
    TyId,
    /// A lexical scope.
    ScopeId,
}
