//! Side tables filled by the checker.

use gofix_syntax::ast::{ExprId, SwitchClauseId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::constant::ConstValue;
use crate::{FileId, ObjId, TyId};

/// What an expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Invalid,
    /// Call of a function without results.
    NoValue,
    Builtin,
    TypeExpr,
    Constant,
    /// Addressable operand.
    Variable,
    MapIndex,
    Value,
    /// Value that may also be used in a two-value assignment.
    CommaOk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: Mode,
    pub ty: TyId,
    pub value: Option<ConstValue>,
}

impl TypeAndValue {
    pub fn is_type(&self) -> bool {
        self.mode == Mode::TypeExpr
    }

    pub fn is_value(&self) -> bool {
        matches!(
            self.mode,
            Mode::Constant | Mode::Variable | Mode::MapIndex | Mode::Value | Mode::CommaOk
        )
    }

    pub fn addressable(&self) -> bool {
        self.mode == Mode::Variable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// `x.f` where `f` is a field.
    FieldVal,
    /// `x.m` where `m` is a method.
    MethodVal,
    /// `T.m`, a method expression.
    MethodExpr,
}

/// Resolution of a selector expression `x.f`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Type of `x`.
    pub recv: TyId,
    pub obj: ObjId,
    /// Path through embedded fields; the last entry indexes `obj` itself.
    pub index: SmallVec<[u32; 4]>,
    /// A pointer was dereferenced on the way to `obj`.
    pub indirect: bool,
}

impl Selection {
    /// Number of embedded fields traversed before reaching `obj`.
    pub fn depth(&self) -> usize {
        self.index.len().saturating_sub(1)
    }
}

/// Identifier positions are the byte offset of the identifier's first
/// character.
#[derive(Debug, Clone, Default)]
pub struct Info {
    pub defs: FxHashMap<(FileId, u32), ObjId>,
    pub uses: FxHashMap<(FileId, u32), ObjId>,
    pub types: FxHashMap<(FileId, ExprId), TypeAndValue>,
    pub selections: FxHashMap<(FileId, ExprId), Selection>,
    /// Per-clause objects implicitly declared by `switch x := y.(type)`.
    pub implicits: FxHashMap<(FileId, SwitchClauseId), ObjId>,
    /// Calls to generic functions, with the inferred type arguments.
    pub instances: FxHashMap<(FileId, u32), SmallVec<[TyId; 2]>>,
}

impl Info {
    pub fn def(&self, file: FileId, pos: u32) -> Option<ObjId> {
        self.defs.get(&(file, pos)).copied()
    }

    pub fn use_of(&self, file: FileId, pos: u32) -> Option<ObjId> {
        self.uses.get(&(file, pos)).copied()
    }

    /// Object defined or used by the identifier at `pos`.
    pub fn object_at(&self, file: FileId, pos: u32) -> Option<ObjId> {
        self.use_of(file, pos).or_else(|| self.def(file, pos))
    }

    pub fn type_and_value(&self, file: FileId, e: ExprId) -> Option<&TypeAndValue> {
        self.types.get(&(file, e))
    }

    pub fn type_of(&self, file: FileId, e: ExprId) -> Option<TyId> {
        self.types.get(&(file, e)).map(|tv| tv.ty)
    }

    pub fn selection(&self, file: FileId, e: ExprId) -> Option<&Selection> {
        self.selections.get(&(file, e))
    }
}
