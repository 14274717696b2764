use gofix_syntax::ast::{Span, Symbol};

use crate::constant::ConstValue;
use crate::{FileId, ObjId, PkgId, ScopeId, TyId};

/// Where an object's name is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjPos {
    pub file: FileId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Package,
    Local,
    Param,
    Result,
    Receiver,
    Field { embedded: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [(&'static str, Builtin); 18] = [
        ("append", Builtin::Append),
        ("cap", Builtin::Cap),
        ("clear", Builtin::Clear),
        ("close", Builtin::Close),
        ("complex", Builtin::Complex),
        ("copy", Builtin::Copy),
        ("delete", Builtin::Delete),
        ("imag", Builtin::Imag),
        ("len", Builtin::Len),
        ("make", Builtin::Make),
        ("max", Builtin::Max),
        ("min", Builtin::Min),
        ("new", Builtin::New),
        ("panic", Builtin::Panic),
        ("print", Builtin::Print),
        ("println", Builtin::Println),
        ("real", Builtin::Real),
        ("recover", Builtin::Recover),
    ];

    /// Calls to these neither read nor write memory beyond their operands
    /// and cannot panic on well-typed input.
    pub fn is_pure(self) -> bool {
        matches!(
            self,
            Builtin::Len | Builtin::Cap | Builtin::Complex | Builtin::Imag | Builtin::Real | Builtin::Min | Builtin::Max
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjKind {
    Const { value: Option<ConstValue> },
    Var(VarKind),
    TypeName { alias: bool },
    /// Functions and methods; methods name the type name of their receiver.
    Func { recv_base: Option<ObjId> },
    PkgName { imported: PkgId },
    Builtin(Builtin),
    Nil,
    Label,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: Symbol,
    pub kind: ObjKind,
    /// `None` for universe objects.
    pub pkg: Option<PkgId>,
    pub ty: TyId,
    pub pos: Option<ObjPos>,
    /// Scope the object is declared in; `None` for fields, methods and
    /// signature-only parameters.
    pub parent: Option<ScopeId>,
    /// Offset from which a local object is visible in `parent`.
    pub scope_pos: u32,
}

impl Object {
    pub fn is_const(&self) -> bool {
        matches!(self.kind, ObjKind::Const { .. })
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self.kind, ObjKind::TypeName { .. })
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.kind, ObjKind::TypeName { alias: true })
    }

    pub fn is_func(&self) -> bool {
        matches!(self.kind, ObjKind::Func { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, ObjKind::Func { recv_base: Some(_) })
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, ObjKind::Var(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, ObjKind::Var(VarKind::Field { .. }))
    }

    pub fn const_value(&self) -> Option<&ConstValue> {
        match &self.kind {
            ObjKind::Const { value } => value.as_ref(),
            _ => None,
        }
    }
}
