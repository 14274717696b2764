use gofix_syntax::ast::ChanDir;

use crate::{ObjId, TyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    /// `byte`, identical to `uint8`.
    Byte,
    /// `rune`, identical to `int32`.
    Rune,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: [BasicKind; 26] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::Byte,
        BasicKind::Rune,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedComplex,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        use BasicKind::*;
        match self {
            Bool => "bool",
            Int => "int",
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint => "uint",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Uintptr => "uintptr",
            Float32 => "float32",
            Float64 => "float64",
            Complex64 => "complex64",
            Complex128 => "complex128",
            String => "string",
            Byte => "byte",
            Rune => "rune",
            UntypedBool => "untyped bool",
            UntypedInt => "untyped int",
            UntypedRune => "untyped rune",
            UntypedFloat => "untyped float",
            UntypedComplex => "untyped complex",
            UntypedString => "untyped string",
            UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        use BasicKind::*;
        matches!(
            self,
            UntypedBool | UntypedInt | UntypedRune | UntypedFloat | UntypedComplex | UntypedString | UntypedNil
        )
    }

    pub fn is_integer(self) -> bool {
        use BasicKind::*;
        matches!(
            self,
            Int | Int8
                | Int16
                | Int32
                | Int64
                | Uint
                | Uint8
                | Uint16
                | Uint32
                | Uint64
                | Uintptr
                | Byte
                | Rune
                | UntypedInt
                | UntypedRune
        )
    }

    pub fn is_numeric(self) -> bool {
        use BasicKind::*;
        self.is_integer()
            || matches!(
                self,
                Float32 | Float64 | Complex64 | Complex128 | UntypedFloat | UntypedComplex
            )
    }

    /// `byte` and `rune` collapse onto the types they alias.
    pub fn canonical(self) -> BasicKind {
        match self {
            BasicKind::Byte => BasicKind::Uint8,
            BasicKind::Rune => BasicKind::Int32,
            k => k,
        }
    }

    /// Default type of an untyped kind; typed kinds map to themselves.
    pub fn default_kind(self) -> BasicKind {
        use BasicKind::*;
        match self {
            UntypedBool => Bool,
            UntypedInt => Int,
            UntypedRune => Rune,
            UntypedFloat => Float64,
            UntypedComplex => Complex128,
            UntypedString => String,
            k => k,
        }
    }

    /// Rank among untyped numeric kinds, for mixing `1 + 2.0`.
    pub(crate) fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            BasicKind::UntypedComplex => 4,
            _ => 0,
        }
    }
}

/// A defined (named) type, possibly generic or an instantiation.
#[derive(Debug, Clone)]
pub struct Named {
    pub obj: ObjId,
    pub underlying: TyId,
    pub methods: Vec<ObjId>,
    pub tparams: Vec<TyId>,
    pub targs: Vec<TyId>,
    /// Generic type this is an instantiation of.
    pub origin: Option<TyId>,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub obj: ObjId,
    pub index: usize,
    pub constraint: TyId,
}

#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub recv: Option<ObjId>,
    pub tparams: Vec<TyId>,
    pub params: Vec<ObjId>,
    pub results: Vec<ObjId>,
    /// The last parameter is `...T`; its recorded type is `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StructType {
    pub fields: Vec<ObjId>,
    pub tags: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceType {
    pub methods: Vec<ObjId>,
    pub embeds: Vec<TyId>,
}

#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub tilde: bool,
    pub ty: TyId,
}

#[derive(Debug, Clone)]
pub enum Type {
    Invalid,
    Basic(BasicKind),
    Named(Named),
    TypeParam(TypeParam),
    Pointer(TyId),
    Slice(TyId),
    Array { len: Option<u64>, elem: TyId },
    Map { key: TyId, value: TyId },
    Chan { dir: ChanDir, elem: TyId },
    Signature(Signature),
    Struct(StructType),
    Interface(InterfaceType),
    Tuple(Vec<TyId>),
    Union(Vec<Term>),
}

/// Every type of a program. Basic types live at fixed ids.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl Default for TypeTable {
    fn default() -> Self {
        let mut types = vec![Type::Invalid];
        types.extend(BasicKind::ALL.iter().map(|&k| Type::Basic(k)));
        Self { types }
    }
}

impl TypeTable {
    pub const INVALID: TyId = TyId(0);

    pub fn basic(&self, kind: BasicKind) -> TyId {
        let idx = BasicKind::ALL.iter().position(|&k| k == kind).unwrap_or(0);
        TyId(idx as u32 + 1)
    }

    pub fn alloc(&mut self, ty: Type) -> TyId {
        let id = TyId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TyId) -> &Type {
        &self.types[id.index()]
    }

    pub fn get_mut(&mut self, id: TyId) -> &mut Type {
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Strips named types down to their underlying type.
    pub fn underlying(&self, mut id: TyId) -> TyId {
        for _ in 0..64 {
            match &self.types[id.index()] {
                Type::Named(n) if n.underlying != id => id = n.underlying,
                _ => return id,
            }
        }
        Self::INVALID
    }

    pub fn basic_kind(&self, id: TyId) -> Option<BasicKind> {
        match self.get(self.underlying(id)) {
            Type::Basic(k) => Some(*k),
            _ => None,
        }
    }

    pub fn is_untyped(&self, id: TyId) -> bool {
        matches!(self.get(id), Type::Basic(k) if k.is_untyped())
    }

    pub fn is_interface(&self, id: TyId) -> bool {
        matches!(self.get(self.underlying(id)), Type::Interface(_))
    }

    pub fn is_named(&self, id: TyId) -> bool {
        matches!(self.get(id), Type::Named(_))
    }

    pub fn is_pointer(&self, id: TyId) -> bool {
        matches!(self.get(self.underlying(id)), Type::Pointer(_))
    }

    pub fn is_type_param(&self, id: TyId) -> bool {
        matches!(self.get(id), Type::TypeParam(_))
    }

    pub fn pointer_elem(&self, id: TyId) -> Option<TyId> {
        match self.get(self.underlying(id)) {
            Type::Pointer(e) => Some(*e),
            _ => None,
        }
    }

    pub fn signature(&self, id: TyId) -> Option<&Signature> {
        match self.get(self.underlying(id)) {
            Type::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn named(&self, id: TyId) -> Option<&Named> {
        match self.get(id) {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    /// Default type for untyped constants; everything else is unchanged.
    pub fn default_type(&self, id: TyId) -> TyId {
        match self.get(id) {
            Type::Basic(k) if k.is_untyped() && *k != BasicKind::UntypedNil => self.basic(k.default_kind()),
            _ => id,
        }
    }

    /// True if some type parameter occurs in `id`.
    pub fn mentions_type_params(&self, id: TyId) -> bool {
        self.mentions(id, 0)
    }

    fn mentions(&self, id: TyId, depth: u32) -> bool {
        if depth > 32 {
            return false;
        }
        let d = depth + 1;
        match self.get(id) {
            Type::TypeParam(_) => true,
            Type::Named(n) => n.targs.iter().any(|&t| self.mentions(t, d)),
            Type::Pointer(e) | Type::Slice(e) => self.mentions(*e, d),
            Type::Array { elem, .. } | Type::Chan { elem, .. } => self.mentions(*elem, d),
            Type::Map { key, value } => self.mentions(*key, d) || self.mentions(*value, d),
            Type::Tuple(ts) => ts.iter().any(|&t| self.mentions(t, d)),
            _ => false,
        }
    }
}
