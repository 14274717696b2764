//! # Go syntax tree
//!
//! Arena-allocated AST for Go source files, shaped for source-to-source
//! rewriting: every node keeps the byte spans the rewriter needs to cut and
//! splice text.
//!
//! ## Architecture
//!
//! - **Nodes**: allocated in typed arenas (`SpannedArena<T>`), addressed by `Id<T>`
//! - **Lists**: centralized buffers in `ExtraData`, addressed by `ListRef<T>`
//! - **Spans**: kept in side tables next to the node data
//! - **Symbols**: interned once per program (`Interner`), shared by all files
//!
//! The tree models syntax only. Whether `a.b` is a qualified identifier, a
//! field selection or a method expression is decided by the type checker.
//! Types in expression position (`[]int{}`, `make(map[K]V)`) are
//! `Expr::TypeExpr`.

use ast_derive::WalkAst;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use rustc_hash::FxHashMap;

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Half-open byte range `[start, end)` into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Zero-width span at `pos`.
    #[inline]
    pub fn point(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn contains(&self, pos: u32) -> bool {
        self.start <= pos && pos < self.end
    }

    /// True if `other` lies entirely inside `self`.
    #[inline]
    pub fn covers(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[inline]
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Type-safe identifier for arena-allocated nodes.
#[derive(Debug)]
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

/// Typed reference into a centralized list buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.start + self.len
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

/// Interned string symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol(u32);

/// Type alias for identifier symbols.
pub type Ident = Symbol;

impl Symbol {
    #[inline]
    pub const fn from_raw(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identifier occurrence (interned symbol + source position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct IdentName {
    pub sym: Ident,
    #[walk(skip)]
    pub pos: Span,
}

/// String interner shared by every file of a program.
///
/// Symbols are program-wide, so the same name in two files compares equal
/// without going back to the text.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    strings: Vec<Box<str>>,
    index: FxHashMap<Box<str>, Symbol>,
}

impl Interner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.index.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        self.index.insert(s.into(), sym);
        sym
    }

    /// Looks a name up without interning it.
    #[inline]
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.index.get(s).copied()
    }

    /// Resolves a symbol back to its text. Unknown symbols resolve to `""`.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings.get(sym.0 as usize).map_or("", |s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Arena for nodes with associated spans, stored in parallel vectors.
#[derive(Debug, Clone)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over `(id, node)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, n)| (Id::from_raw(i as u32), n))
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

// =============================================================================
// Type Aliases for Node IDs
// =============================================================================

pub type DeclId = Id<Decl>;
pub type StmtId = Id<Stmt>;
pub type SimpleStmtId = Id<SimpleStmt>;
pub type ExprId = Id<Expr>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;
pub type FuncDeclId = Id<FuncDecl>;
pub type SwitchClauseId = Id<SwitchClause>;
pub type CommClauseId = Id<CommClause>;
pub type TypeParamsId = Id<TypeParams>;
pub type TypeParamDeclId = Id<TypeParamDecl>;
pub type CommentId = Id<Comment>;
pub type CommentGroupId = Id<CommentGroup>;

// =============================================================================
// Centralized List Storage
// =============================================================================

/// Buffers that every `ListRef<T>` points into.
#[derive(Debug, Default, Clone)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub exprs: Vec<ExprId>,
    pub stmts: Vec<StmtId>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub keyed_elems: Vec<KeyedElement>,
    pub top_decls: Vec<TopLevelDecl>,
    pub switch_clause_ids: Vec<SwitchClauseId>,
    pub comm_clause_ids: Vec<CommClauseId>,
    pub type_case_elems: Vec<TypeCaseElem>,
    pub type_terms: Vec<TypeTerm>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_param_decl_ids: Vec<TypeParamDeclId>,
    pub comment_ids: Vec<CommentId>,
    pub comment_group_ids: Vec<CommentGroupId>,
}

// =============================================================================
// Main AST Arena
// =============================================================================

/// Central arena holding all nodes and list buffers of one file.
#[derive(Debug, Default, Clone)]
pub struct AstArena {
    pub decls: SpannedArena<Decl>,
    pub stmts: SpannedArena<Stmt>,
    pub simple_stmts: SpannedArena<SimpleStmt>,
    pub exprs: SpannedArena<Expr>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub funcs: SpannedArena<FuncDecl>,
    pub fields: SpannedArena<Field>,
    pub switch_clauses: SpannedArena<SwitchClause>,
    pub comm_clauses: SpannedArena<CommClause>,
    pub type_params: SpannedArena<TypeParams>,
    pub type_param_decls: SpannedArena<TypeParamDecl>,
    pub comments: SpannedArena<Comment>,
    pub comment_groups: SpannedArena<CommentGroup>,
    pub extras: ExtraData,
}

macro_rules! list_accessors {
    ($($t:ty => $buf:ident, $build:ident, $get:ident);* $(;)?) => {
        impl AstArena {
            $(
                pub fn $build(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                    Self::push_list(&mut self.extras.$buf, items)
                }

                pub fn $get(&self, r: ListRef<$t>) -> &[$t] {
                    &self.extras.$buf[r.start() as usize..r.end() as usize]
                }
            )*
        }
    };
}

list_accessors! {
    IdentName => ident_names, list_ident_names, ident_names;
    ExprId => exprs, list_exprs, exprs_list;
    StmtId => stmts, list_stmts, stmts_list;
    TypeId => types, list_types, types_list;
    FieldId => fields, list_fields, fields_list;
    Spec => specs, list_specs, specs_list;
    KeyedElement => keyed_elems, list_keyed_elems, keyed_elems_list;
    TopLevelDecl => top_decls, list_top_decls, top_decls;
    SwitchClauseId => switch_clause_ids, list_switch_clause_ids, switch_clause_ids;
    CommClauseId => comm_clause_ids, list_comm_clause_ids, comm_clause_ids;
    TypeCaseElem => type_case_elems, list_type_cases, type_case_elems;
    TypeTerm => type_terms, list_type_terms, type_terms;
    InterfaceElem => interface_elems, list_interface_elems, interface_elems;
    TypeParamDeclId => type_param_decl_ids, list_type_param_decl_ids, type_param_decl_ids;
    CommentId => comment_ids, list_comment_ids, comment_ids;
    CommentGroupId => comment_group_ids, list_comment_group_ids, comment_group_ids;
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        ListRef::new(start as u32, len as u32)
    }

    /// Span of a block, from `{` to `}` inclusive.
    pub fn block_span(&self, b: &Block) -> Span {
        b.l_brace.to(b.r_brace)
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparen(&self, mut id: ExprId) -> ExprId {
        while let Expr::Paren { expr, .. } = self.exprs[id] {
            id = expr;
        }
        id
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// Comment; text is recovered from source via span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
}

/// Adjacent comments with no blank line in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: ListRef<CommentId>,
}

// =============================================================================
// Source File (Root Node)
// =============================================================================

/// `SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct SourceFile {
    #[walk(skip)]
    pub package_pos: Span,
    pub name: IdentName,
    pub decls: ListRef<TopLevelDecl>,
    /// Every comment group in the file, in source order.
    #[walk(skip)]
    pub comments: ListRef<CommentGroupId>,
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Decl {
    Gen(GenDecl),
}

/// `import`, `const`, `type` or `var` declaration, grouped or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
    #[walk(skip)]
    pub kw_pos: Span,
    pub kind: GenDeclKind,
    #[walk(skip)]
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    #[walk(skip)]
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

impl Spec {
    pub fn span(&self) -> Span {
        match self {
            Spec::Import(s) => s.span,
            Spec::Value(s) => s.span,
            Spec::Type(s) => s.span,
        }
    }

    pub fn doc(&self) -> Option<CommentGroupId> {
        match self {
            Spec::Import(s) => s.doc,
            Spec::Value(s) => s.doc,
            Spec::Type(s) => s.doc,
        }
    }
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ImportSpec {
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
    #[walk(skip)]
    pub name: Option<ImportName>,
    pub path: StringLit,
    #[walk(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    Dot(Span),
    Blank(Span),
    Name(IdentName),
}

/// Const or var spec: `IdentifierList [ Type ] [ "=" ExpressionList ]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    #[walk(skip)]
    pub assign_pos: Option<Span>,
    pub values: ListRef<ExprId>,
    #[walk(skip)]
    pub span: Span,
}

/// `TypeSpec = AliasDecl | TypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSpec {
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    /// Position of `=` for aliases.
    #[walk(skip)]
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
    #[walk(skip)]
    pub span: Span,
}

impl TypeSpec {
    #[inline]
    pub fn is_alias(&self) -> bool {
        self.assign_pos.is_some()
    }
}

/// Function or method declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
    #[walk(skip)]
    pub func_pos: Span,
    pub recv: Option<Receiver>,
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    pub sig: SignatureId,
    pub body: Option<Block>,
}

/// Method receiver. Receiver type parameters appear as the type arguments
/// of `typ` (`func (l *List[T]) ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Receiver {
    #[walk(skip)]
    pub l_paren: Span,
    pub name: Option<IdentName>,
    pub typ: TypeId,
    #[walk(skip)]
    pub r_paren: Span,
}

// =============================================================================
// Generics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeParams {
    #[walk(skip)]
    pub l_brack: Span,
    pub params: ListRef<TypeParamDeclId>,
    #[walk(skip)]
    pub r_brack: Span,
}

/// `a, b C` inside a type parameter list; the constraint may be a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeParamDecl {
    pub names: ListRef<IdentName>,
    pub constraint: TypeId,
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Results {
    /// Parenthesized results, named or not: `(int, error)`, `(n int)`.
    Params(FieldList),
    /// Single unparenthesized result type.
    Type(TypeId),
}

/// Parameter list, result list or struct body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    #[walk(skip)]
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    #[walk(skip)]
    pub r_paren: Span,
}

/// `[ IdentifierList ] [ "..." ] Type [ Tag ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    pub names: ListRef<IdentName>,
    #[walk(skip)]
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    pub tag: Option<StringLit>,
    #[walk(skip)]
    pub is_embed: bool,
    #[walk(skip)]
    pub doc: Option<CommentGroupId>,
}

// =============================================================================
// Statements
// =============================================================================

/// `SimpleStmt = EmptyStmt | ExpressionStmt | SendStmt | IncDecStmt | Assignment | ShortVarDecl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SimpleStmt {
    Empty(#[walk(skip)] Span),
    Expr(ExprId),
    Send {
        chan: ExprId,
        #[walk(skip)]
        arrow_pos: Span,
        value: ExprId,
    },
    IncDec {
        expr: ExprId,
        #[walk(skip)]
        op: IncDecOp,
        #[walk(skip)]
        op_pos: Span,
    },
    Assign {
        lhs: ListRef<ExprId>,
        #[walk(skip)]
        op: AssignOp,
        #[walk(skip)]
        op_pos: Span,
        rhs: ListRef<ExprId>,
    },
    ShortVarDecl {
        names: ListRef<IdentName>,
        #[walk(skip)]
        op_pos: Span,
        values: ListRef<ExprId>,
    },
}

/// `{ StatementList }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub l_brace: Span,
    pub stmts: ListRef<StmtId>,
    pub r_brace: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Stmt {
    Simple(SimpleStmtId),
    Decl(DeclId),
    Labeled {
        label: IdentName,
        #[walk(skip)]
        colon_pos: Span,
        stmt: StmtId,
    },
    Go {
        #[walk(skip)]
        go_pos: Span,
        call: ExprId,
    },
    Defer {
        #[walk(skip)]
        defer_pos: Span,
        call: ExprId,
    },
    Return {
        #[walk(skip)]
        return_pos: Span,
        results: ListRef<ExprId>,
    },
    Branch {
        #[walk(skip)]
        kind: BranchKind,
        #[walk(skip)]
        kw_pos: Span,
        label: Option<IdentName>,
    },
    Block(Block),
    If {
        #[walk(skip)]
        if_pos: Span,
        init: Option<SimpleStmtId>,
        cond: ExprId,
        then_block: Block,
        /// Either a `Block` or another `If`.
        else_stmt: Option<StmtId>,
    },
    For {
        #[walk(skip)]
        for_pos: Span,
        kind: ForKind,
        body: Block,
    },
    Switch {
        #[walk(skip)]
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        tag: Option<ExprId>,
        #[walk(skip)]
        l_brace: Span,
        clauses: ListRef<SwitchClauseId>,
        #[walk(skip)]
        r_brace: Span,
    },
    TypeSwitch {
        #[walk(skip)]
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        guard: TypeSwitchGuard,
        #[walk(skip)]
        l_brace: Span,
        clauses: ListRef<SwitchClauseId>,
        #[walk(skip)]
        r_brace: Span,
    },
    Select {
        #[walk(skip)]
        select_pos: Span,
        #[walk(skip)]
        l_brace: Span,
        clauses: ListRef<CommClauseId>,
        #[walk(skip)]
        r_brace: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ForKind {
    Infinite,
    Cond(ExprId),
    /// `init ; cond ; post`; the semicolon spans are kept for deletion.
    Clause {
        init: Option<SimpleStmtId>,
        #[walk(skip)]
        semi1: Span,
        cond: Option<ExprId>,
        #[walk(skip)]
        semi2: Span,
        post: Option<SimpleStmtId>,
    },
    Range {
        lhs: Option<RangeLhs>,
        #[walk(skip)]
        range_pos: Span,
        expr: ExprId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum RangeLhs {
    /// `k, v :=`
    Define {
        names: ListRef<IdentName>,
        #[walk(skip)]
        op_pos: Span,
    },
    /// `k, v =`
    Assign {
        exprs: ListRef<ExprId>,
        #[walk(skip)]
        op_pos: Span,
    },
}

/// `[ x := ] y.(type)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSwitchGuard {
    pub bind: Option<IdentName>,
    pub expr: ExprId,
    #[walk(skip)]
    pub span: Span,
}

/// `case x, y:` or `default:` in an expression or type switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SwitchClause {
    Expr {
        #[walk(skip)]
        case_pos: Span,
        #[walk(skip)]
        is_default: bool,
        exprs: ListRef<ExprId>,
        #[walk(skip)]
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
    Type {
        #[walk(skip)]
        case_pos: Span,
        #[walk(skip)]
        is_default: bool,
        types: ListRef<TypeCaseElem>,
        #[walk(skip)]
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
}

impl SwitchClause {
    pub fn stmts(&self) -> ListRef<StmtId> {
        match self {
            SwitchClause::Expr { stmts, .. } | SwitchClause::Type { stmts, .. } => *stmts,
        }
    }

    pub fn colon_pos(&self) -> Span {
        match self {
            SwitchClause::Expr { colon_pos, .. } | SwitchClause::Type { colon_pos, .. } => {
                *colon_pos
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TypeCaseElem {
    Type(TypeId),
    Nil(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct CommClause {
    #[walk(skip)]
    pub case_pos: Span,
    /// `None` for `default:`.
    pub comm: Option<CommStmt>,
    #[walk(skip)]
    pub colon_pos: Span,
    pub stmts: ListRef<StmtId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum CommStmt {
    Send {
        chan: ExprId,
        #[walk(skip)]
        arrow_pos: Span,
        value: ExprId,
    },
    Recv {
        lhs: Option<RangeLhs>,
        expr: ExprId,
    },
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Expr {
    Ident(Ident),
    BasicLit(BasicLit),
    FuncLit {
        #[walk(skip)]
        func_pos: Span,
        sig: SignatureId,
        body: Block,
    },
    CompositeLit {
        typ: TypeId,
        lit: LiteralValue,
    },
    /// `a[i]` or `f[T1, T2]`; the checker decides which.
    Index {
        base: ExprId,
        #[walk(skip)]
        l_brack: Span,
        indices: ListRef<ExprId>,
        #[walk(skip)]
        r_brack: Span,
    },
    Paren {
        #[walk(skip)]
        l_paren: Span,
        expr: ExprId,
        #[walk(skip)]
        r_paren: Span,
    },
    Selector {
        expr: ExprId,
        #[walk(skip)]
        dot_pos: Span,
        sel: IdentName,
    },
    Slice {
        expr: ExprId,
        #[walk(skip)]
        l_brack: Span,
        lo: Option<ExprId>,
        hi: Option<ExprId>,
        max: Option<ExprId>,
        #[walk(skip)]
        r_brack: Span,
    },
    /// `x.(T)`; `typ` is `None` for `x.(type)` in a type switch guard.
    TypeAssert {
        expr: ExprId,
        #[walk(skip)]
        dot_pos: Span,
        typ: Option<TypeId>,
        #[walk(skip)]
        r_paren: Span,
    },
    Call {
        func: ExprId,
        #[walk(skip)]
        l_paren: Span,
        args: ListRef<ExprId>,
        #[walk(skip)]
        ellipsis: Option<Span>,
        #[walk(skip)]
        r_paren: Span,
    },
    Unary {
        #[walk(skip)]
        op: UnaryOp,
        #[walk(skip)]
        op_pos: Span,
        expr: ExprId,
    },
    Binary {
        left: ExprId,
        #[walk(skip)]
        op: BinaryOp,
        #[walk(skip)]
        op_pos: Span,
        right: ExprId,
    },
    /// A type used where an expression is expected.
    TypeExpr(TypeId),
}

/// Literal token; text is recovered from source via span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    pub raw: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

/// `{ [ ElementList [ "," ] ] }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct LiteralValue {
    #[walk(skip)]
    pub l_brace: Span,
    pub elems: ListRef<KeyedElement>,
    #[walk(skip)]
    pub r_brace: Span,
}

impl LiteralValue {
    pub fn span(&self) -> Span {
        self.l_brace.to(self.r_brace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct KeyedElement {
    pub key: Option<Key>,
    pub value: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Key {
    /// Bare identifier key: a struct field name or a map key variable.
    Name(IdentName),
    Expr(ExprId),
    Literal(LiteralValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Element {
    Expr(ExprId),
    /// Nested literal with elided type.
    Literal(LiteralValue),
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Type {
    /// `T`, `pkg.T`, `T[A, B]`, `pkg.T[A]`
    Named {
        pkg: Option<IdentName>,
        name: IdentName,
        args: ListRef<TypeId>,
    },
    Pointer {
        #[walk(skip)]
        star_pos: Span,
        elem: TypeId,
    },
    Array {
        len: ArrayLen,
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    Map {
        key: TypeId,
        value: TypeId,
    },
    Chan {
        #[walk(skip)]
        dir: ChanDir,
        elem: TypeId,
    },
    Func {
        #[walk(skip)]
        func_pos: Span,
        sig: SignatureId,
    },
    Struct {
        #[walk(skip)]
        struct_pos: Span,
        fields: ListRef<FieldId>,
    },
    Interface {
        #[walk(skip)]
        interface_pos: Span,
        elems: ListRef<InterfaceElem>,
    },
    /// Union constraint `~int | string`.
    Union {
        terms: ListRef<TypeTerm>,
    },
    Paren {
        typ: TypeId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ArrayLen {
    Expr(ExprId),
    Ellipsis(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum InterfaceElem {
    Method { name: IdentName, sig: SignatureId },
    Embed(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeTerm {
    #[walk(skip)]
    pub tilde: bool,
    pub typ: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Xor,
    Deref,
    Addr,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LOr,
    LAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    /// Go operator precedence, 1 (`||`) through 5 (`*`).
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            LOr => 1,
            LAnd => 2,
            Eq | Ne | Lt | Le | Gt | Ge => 3,
            Add | Sub | Or | Xor => 4,
            Mul | Div | Rem | Shl | Shr | And | AndNot => 5,
        }
    }

    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

/// `=` or an `op=` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Op(BinaryOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}
