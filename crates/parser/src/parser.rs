//! Recursive-descent parser for Go source files.
//!
//! The parser works over the full token vector produced by [`Lexer`] so it
//! can look ahead freely to settle Go's syntactic ambiguities (parameter
//! grouping, `[` after a name, composite literals in control clauses).
//! It stops at the first syntax error; the rewriter only ever operates on
//! well-formed programs.

use crate::ast::*;
use crate::error::{Diag, ParseFailure};
use crate::lexer::{Lexer, Tok};
use crate::parser_support::{ParamDecl, assign_op, binary_op, resolve_param_list, starts_type};

/// A parsed file: its arena and root node.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub file: SourceFile,
}

pub fn parse_file(src: &str, interner: &mut Interner) -> Result<ParsedFile, ParseFailure> {
    let mut lexer = Lexer::new(src);
    let toks: Vec<_> = lexer.by_ref().collect();
    let comments = lexer.take_comments();
    let mut diags = lexer.take_diags();

    let mut p = Parser::new(src, toks, interner);
    p.build_comment_groups(&comments);
    match p.source_file() {
        Ok(file) if diags.is_empty() => Ok(ParsedFile {
            arena: p.arena,
            file,
        }),
        Ok(_) => Err(ParseFailure { diags }),
        Err(d) => {
            diags.push(d);
            Err(ParseFailure { diags })
        }
    }
}

type PResult<T> = Result<T, Diag>;

static EOF_TOK: Tok<'static> = Tok::Error;

/// Result of parsing a simple statement before allocation: `for` headers
/// may produce a range clause instead.
enum Simple {
    Stmt(SimpleStmt, Span),
    Range {
        lhs: Option<RangeLhs>,
        range_pos: Span,
        expr: ExprId,
    },
}

struct Parser<'src, 'i> {
    src: &'src str,
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    prev_end: usize,
    /// < 0 inside control clauses, where `T {` opens a block, not a literal.
    expr_lev: i32,
    arena: AstArena,
    interner: &'i mut Interner,
    groups: Vec<(CommentGroupId, Span)>,
}

impl<'src, 'i> Parser<'src, 'i> {
    fn new(src: &'src str, toks: Vec<(usize, Tok<'src>, usize)>, interner: &'i mut Interner) -> Self {
        Self {
            src,
            toks,
            pos: 0,
            prev_end: 0,
            expr_lev: 0,
            arena: AstArena::new(),
            interner,
            groups: Vec::new(),
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    fn tok(&self) -> &Tok<'src> {
        self.peek(0)
    }

    #[inline]
    fn peek(&self, n: usize) -> &Tok<'src> {
        self.toks.get(self.pos + n).map_or(&EOF_TOK, |t| &t.1)
    }

    #[inline]
    fn eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    #[inline]
    fn start(&self) -> usize {
        self.toks.get(self.pos).map_or(self.src.len(), |t| t.0)
    }

    fn at(&self, t: &Tok<'_>) -> bool {
        !self.eof() && std::mem::discriminant(self.tok()) == std::mem::discriminant(t)
    }

    fn at_ident(&self) -> bool {
        matches!(self.tok(), Tok::Ident(_)) && !self.eof()
    }

    fn bump(&mut self) -> Span {
        match self.toks.get(self.pos) {
            Some(&(s, _, e)) => {
                self.pos += 1;
                if e > s {
                    self.prev_end = e;
                }
                Span::new(s, e)
            }
            None => Span::point(self.src.len() as u32),
        }
    }

    fn error_here(&self, msg: &str) -> Diag {
        let span = match self.toks.get(self.pos) {
            Some(&(s, ref t, e)) => return Diag::parse(Span::new(s, e), format!("{msg}, found {t}")),
            None => Span::point(self.src.len() as u32),
        };
        Diag::parse(span, format!("{msg}, found EOF"))
    }

    fn expect(&mut self, t: Tok<'static>, what: &str) -> PResult<Span> {
        if self.at(&t) {
            Ok(self.bump())
        } else {
            Err(self.error_here(&format!("expected {what}")))
        }
    }

    /// Statement terminator: `;`, or nothing before a closing token.
    fn expect_semi(&mut self, closers: &[Tok<'static>]) -> PResult<()> {
        if self.at(&Tok::Semi) {
            self.bump();
            return Ok(());
        }
        if self.eof() || closers.iter().any(|c| self.at(c)) {
            return Ok(());
        }
        Err(self.error_here("expected ';'"))
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn ident(&mut self) -> PResult<IdentName> {
        if let Tok::Ident(name) = *self.tok() {
            if !self.eof() {
                let pos = self.bump();
                return Ok(IdentName {
                    sym: self.interner.intern(name),
                    pos,
                });
            }
        }
        Err(self.error_here("expected identifier"))
    }

    fn ident_list(&mut self) -> PResult<Vec<IdentName>> {
        let mut names = vec![self.ident()?];
        while self.at(&Tok::Comma) {
            self.bump();
            names.push(self.ident()?);
        }
        Ok(names)
    }

    /// Index of the `]` matching the `[` at token offset `open` (relative to pos).
    fn matching_brack(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = self.pos + open;
        while let Some((_, t, _)) = self.toks.get(i) {
            match t {
                Tok::LBrack | Tok::LParen | Tok::LBrace => depth += 1,
                Tok::RBrack | Tok::RParen | Tok::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i - self.pos);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// `Name [ ... ]` where the bracket closes right before one of `followers`
    /// is a generic type instantiation rather than a name and an array type.
    fn bracket_is_type_args(&self, open: usize, followers: &[Tok<'static>]) -> bool {
        if matches!(self.peek(open + 1), Tok::RBrack) {
            return false;
        }
        match self.matching_brack(open) {
            Some(close) => {
                let next = self.peek(close + 1);
                self.pos + close + 1 >= self.toks.len()
                    || followers
                        .iter()
                        .any(|f| std::mem::discriminant(f) == std::mem::discriminant(next))
            }
            None => false,
        }
    }

    // =========================================================================
    // Comments
    // =========================================================================

    fn build_comment_groups(&mut self, comments: &[(Span, CommentKind)]) {
        let mut current: Vec<(Span, CommentKind)> = Vec::new();
        for &(span, kind) in comments {
            if let Some(&(last, _)) = current.last() {
                let gap = &self.src[last.end as usize..span.start as usize];
                let adjacent = gap.chars().all(char::is_whitespace)
                    && gap.bytes().filter(|&b| b == b'\n').count() <= 1;
                if !adjacent {
                    self.flush_group(&mut current);
                }
            }
            current.push((span, kind));
        }
        self.flush_group(&mut current);
    }

    fn flush_group(&mut self, current: &mut Vec<(Span, CommentKind)>) {
        if current.is_empty() {
            return;
        }
        let span = current[0].0.to(current[current.len() - 1].0);
        let ids: Vec<CommentId> = current
            .drain(..)
            .map(|(s, kind)| self.arena.comments.alloc(Comment { kind }, s))
            .collect();
        let comments = self.arena.list_comment_ids(ids);
        let id = self.arena.comment_groups.alloc(CommentGroup { comments }, span);
        self.groups.push((id, span));
    }

    /// The comment group ending on the line right above `tok_start`, if it
    /// sits on lines of its own.
    fn doc_before(&self, tok_start: usize) -> Option<CommentGroupId> {
        let idx = self.groups.partition_point(|(_, s)| (s.end as usize) <= tok_start);
        let &(id, span) = self.groups.get(idx.checked_sub(1)?)?;
        let gap = &self.src[span.end as usize..tok_start];
        if !gap.chars().all(char::is_whitespace) || gap.bytes().filter(|&b| b == b'\n').count() != 1 {
            return None;
        }
        let line_start = self.src[..span.start as usize].rfind('\n').map_or(0, |i| i + 1);
        let own_line = self.src[line_start..span.start as usize]
            .chars()
            .all(char::is_whitespace);
        own_line.then_some(id)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn source_file(&mut self) -> PResult<SourceFile> {
        let doc = self.doc_before(self.start());
        let package_pos = self.expect(Tok::KwPackage, "'package'")?;
        let name = self.ident()?;
        self.expect_semi(&[])?;

        let mut decls = Vec::new();
        while !self.eof() {
            match self.tok() {
                Tok::Semi => {
                    self.bump();
                    continue;
                }
                Tok::KwImport => decls.push(TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Import)?)),
                Tok::KwConst => decls.push(TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Const)?)),
                Tok::KwType => decls.push(TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Type)?)),
                Tok::KwVar => decls.push(TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Var)?)),
                Tok::KwFunc => decls.push(TopLevelDecl::Func(self.func_decl()?)),
                _ => return Err(self.error_here("expected declaration")),
            }
            self.expect_semi(&[])?;
        }

        let decls = self.arena.list_top_decls(decls);
        let group_ids: Vec<_> = self.groups.iter().map(|(id, _)| *id).collect();
        let comments = self.arena.list_comment_group_ids(group_ids);
        Ok(SourceFile {
            package_pos,
            name,
            decls,
            comments,
            doc,
        })
    }

    fn gen_decl(&mut self, kind: GenDeclKind) -> PResult<DeclId> {
        let start = self.start();
        let doc = self.doc_before(start);
        let kw_pos = self.bump();

        let (l_paren, specs, r_paren) = if self.at(&Tok::LParen) {
            let l = self.bump();
            let mut specs = Vec::new();
            while !self.at(&Tok::RParen) && !self.eof() {
                if self.at(&Tok::Semi) {
                    self.bump();
                    continue;
                }
                let spec_doc = self.doc_before(self.start());
                specs.push(self.spec(kind, spec_doc)?);
                self.expect_semi(&[Tok::RParen])?;
            }
            let r = self.expect(Tok::RParen, "')'")?;
            (Some(l), specs, Some(r))
        } else {
            (None, vec![self.spec(kind, None)?], None)
        };

        let specs = self.arena.list_specs(specs);
        let decl = Decl::Gen(GenDecl {
            doc,
            kw_pos,
            kind,
            l_paren,
            specs,
            r_paren,
        });
        Ok(self.arena.decls.alloc(decl, self.span_from(start)))
    }

    fn spec(&mut self, kind: GenDeclKind, doc: Option<CommentGroupId>) -> PResult<Spec> {
        let start = self.start();
        match kind {
            GenDeclKind::Import => {
                let name = match *self.tok() {
                    Tok::Dot => Some(ImportName::Dot(self.bump())),
                    Tok::Ident("_") => Some(ImportName::Blank(self.bump())),
                    Tok::Ident(_) => Some(ImportName::Name(self.ident()?)),
                    _ => None,
                };
                let path = match self.tok() {
                    Tok::StringLit(_) | Tok::RawStringLit(_) => StringLit { raw: self.bump() },
                    _ => return Err(self.error_here("expected import path")),
                };
                Ok(Spec::Import(ImportSpec {
                    doc,
                    name,
                    path,
                    span: self.span_from(start),
                }))
            }
            GenDeclKind::Const | GenDeclKind::Var => {
                let names = self.ident_list()?;
                let names = self.arena.list_ident_names(names);
                let typ = if !self.at(&Tok::Assign) && !self.at(&Tok::Semi) && !self.at(&Tok::RParen) && !self.eof() {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let (assign_pos, values) = if self.at(&Tok::Assign) {
                    let a = self.bump();
                    let values = self.expr_list()?;
                    (Some(a), self.arena.list_exprs(values))
                } else {
                    (None, ListRef::EMPTY)
                };
                Ok(Spec::Value(ValueSpec {
                    doc,
                    names,
                    typ,
                    assign_pos,
                    values,
                    span: self.span_from(start),
                }))
            }
            GenDeclKind::Type => {
                let name = self.ident()?;
                let type_params = if self.at(&Tok::LBrack) && self.type_params_follow() {
                    Some(self.type_params()?)
                } else {
                    None
                };
                let assign_pos = if self.at(&Tok::Assign) { Some(self.bump()) } else { None };
                let typ = self.parse_type()?;
                Ok(Spec::Type(TypeSpec {
                    doc,
                    name,
                    type_params,
                    assign_pos,
                    typ,
                    span: self.span_from(start),
                }))
            }
        }
    }

    /// `type A[` starts a type parameter list unless it reads as an array length.
    fn type_params_follow(&self) -> bool {
        matches!(self.peek(1), Tok::Ident(_))
            && matches!(
                self.peek(2),
                Tok::Ident(_)
                    | Tok::Comma
                    | Tok::KwInterface
                    | Tok::Tilde
                    | Tok::LBrack
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::KwFunc
                    | Tok::KwStruct
                    | Tok::LParen
            )
    }

    fn type_params(&mut self) -> PResult<TypeParamsId> {
        let start = self.start();
        let l_brack = self.bump();
        let mut decls = Vec::new();
        while !self.at(&Tok::RBrack) {
            let dstart = self.start();
            let names = self.ident_list()?;
            let constraint = self.constraint()?;
            let names = self.arena.list_ident_names(names);
            decls.push(
                self.arena
                    .type_param_decls
                    .alloc(TypeParamDecl { names, constraint }, self.span_from(dstart)),
            );
            if !self.at(&Tok::Comma) {
                break;
            }
            self.bump();
        }
        let r_brack = self.expect(Tok::RBrack, "']'")?;
        let params = self.arena.list_type_param_decl_ids(decls);
        Ok(self.arena.type_params.alloc(
            TypeParams {
                l_brack,
                params,
                r_brack,
            },
            self.span_from(start),
        ))
    }

    /// Constraint or interface element: `~int | string`, `any`, `fmt.Stringer`.
    fn constraint(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let mut terms = Vec::new();
        loop {
            let tilde = if self.at(&Tok::Tilde) {
                self.bump();
                true
            } else {
                false
            };
            let typ = self.parse_type()?;
            terms.push(TypeTerm { tilde, typ });
            if !self.at(&Tok::Pipe) {
                break;
            }
            self.bump();
        }
        if terms.len() == 1 && !terms[0].tilde {
            return Ok(terms[0].typ);
        }
        let terms = self.arena.list_type_terms(terms);
        Ok(self.arena.types.alloc(Type::Union { terms }, self.span_from(start)))
    }

    fn func_decl(&mut self) -> PResult<FuncDeclId> {
        let start = self.start();
        let doc = self.doc_before(start);
        let func_pos = self.bump();

        let recv = if self.at(&Tok::LParen) {
            let list = self.params()?;
            let fields = self.arena.fields_list(list.fields);
            let [field] = fields else {
                return Err(Diag::parse(list.l_paren.to(list.r_paren), "method has multiple receivers"));
            };
            let field = self.arena.fields[*field];
            let name = self.arena.ident_names(field.names).first().copied();
            Some(Receiver {
                l_paren: list.l_paren,
                name,
                typ: field.typ,
                r_paren: list.r_paren,
            })
        } else {
            None
        };

        let name = self.ident()?;
        let type_params = if self.at(&Tok::LBrack) {
            Some(self.type_params()?)
        } else {
            None
        };
        let sig = self.signature()?;
        let body = if self.at(&Tok::LBrace) {
            let old = std::mem::replace(&mut self.expr_lev, 0);
            let b = self.block();
            self.expr_lev = old;
            Some(b?)
        } else {
            None
        };

        Ok(self.arena.funcs.alloc(
            FuncDecl {
                doc,
                func_pos,
                recv,
                name,
                type_params,
                sig,
                body,
            },
            self.span_from(start),
        ))
    }

    fn signature(&mut self) -> PResult<SignatureId> {
        let start = self.start();
        let params = self.params()?;
        let results = if self.at(&Tok::LParen) {
            Some(Results::Params(self.params()?))
        } else if starts_type(self.tok()) && !self.eof() {
            Some(Results::Type(self.parse_type()?))
        } else {
            None
        };
        Ok(self
            .arena
            .signatures
            .alloc(Signature { params, results }, self.span_from(start)))
    }

    fn params(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(Tok::LParen, "'('")?;
        let mut entries = Vec::new();
        while !self.at(&Tok::RParen) && !self.eof() {
            entries.push(self.param_entry()?);
            if !self.at(&Tok::Comma) {
                break;
            }
            self.bump();
        }
        let r_paren = self.expect(Tok::RParen, "')'")?;
        let fields = resolve_param_list(&mut self.arena, entries);
        let fields = self.arena.list_fields(fields);
        Ok(FieldList {
            l_paren,
            fields,
            r_paren,
        })
    }

    fn param_entry(&mut self) -> PResult<ParamDecl> {
        let start = self.start();
        let mut names = Vec::new();
        let mut ellipsis_pos = None;
        let typ;

        if self.at_ident() {
            match self.peek(1) {
                Tok::Dot => typ = Some(self.parse_type()?),
                Tok::Comma | Tok::RParen => {
                    names.push(self.ident()?);
                    typ = None;
                }
                Tok::LBrack if self.bracket_is_type_args(1, &[Tok::Comma, Tok::RParen]) => {
                    typ = Some(self.parse_type()?);
                }
                _ => {
                    names.push(self.ident()?);
                    if self.at(&Tok::Ellipsis) {
                        ellipsis_pos = Some(self.bump());
                    }
                    typ = Some(self.parse_type()?);
                }
            }
        } else {
            if self.at(&Tok::Ellipsis) {
                ellipsis_pos = Some(self.bump());
            }
            typ = Some(self.parse_type()?);
        }

        Ok(ParamDecl {
            names,
            ellipsis_pos,
            typ,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_type(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let typ = match self.tok() {
            Tok::Ident(_) if !self.eof() => {
                let first = self.ident()?;
                let (pkg, name) = if self.at(&Tok::Dot) {
                    self.bump();
                    (Some(first), self.ident()?)
                } else {
                    (None, first)
                };
                let args = if self.at(&Tok::LBrack) {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(&Tok::RBrack) {
                        args.push(self.parse_type()?);
                        if !self.at(&Tok::Comma) {
                            break;
                        }
                        self.bump();
                    }
                    self.expect(Tok::RBrack, "']'")?;
                    self.arena.list_types(args)
                } else {
                    ListRef::EMPTY
                };
                Type::Named { pkg, name, args }
            }
            Tok::Star => {
                let star_pos = self.bump();
                let elem = self.parse_type()?;
                Type::Pointer { star_pos, elem }
            }
            Tok::LBrack => {
                self.bump();
                if self.at(&Tok::RBrack) {
                    self.bump();
                    let elem = self.parse_type()?;
                    Type::Slice { elem }
                } else {
                    let len = if self.at(&Tok::Ellipsis) {
                        ArrayLen::Ellipsis(self.bump())
                    } else {
                        self.expr_lev += 1;
                        let e = self.parse_expr();
                        self.expr_lev -= 1;
                        ArrayLen::Expr(e?)
                    };
                    self.expect(Tok::RBrack, "']'")?;
                    let elem = self.parse_type()?;
                    Type::Array { len, elem }
                }
            }
            Tok::KwMap => {
                self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "']'")?;
                let value = self.parse_type()?;
                Type::Map { key, value }
            }
            Tok::KwChan => {
                self.bump();
                let dir = if self.at(&Tok::Arrow) {
                    self.bump();
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Type::Chan { dir, elem }
            }
            Tok::Arrow => {
                self.bump();
                self.expect(Tok::KwChan, "'chan'")?;
                let elem = self.parse_type()?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    elem,
                }
            }
            Tok::KwFunc => {
                let func_pos = self.bump();
                let sig = self.signature()?;
                Type::Func { func_pos, sig }
            }
            Tok::KwStruct => self.struct_type()?,
            Tok::KwInterface => self.interface_type()?,
            Tok::LParen => {
                self.bump();
                let typ = self.parse_type()?;
                self.expect(Tok::RParen, "')'")?;
                Type::Paren { typ }
            }
            _ => return Err(self.error_here("expected type")),
        };
        Ok(self.arena.types.alloc(typ, self.span_from(start)))
    }

    fn struct_type(&mut self) -> PResult<Type> {
        let struct_pos = self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(&Tok::RBrace) && !self.eof() {
            if self.at(&Tok::Semi) {
                self.bump();
                continue;
            }
            fields.push(self.struct_field()?);
            self.expect_semi(&[Tok::RBrace])?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        let fields = self.arena.list_fields(fields);
        Ok(Type::Struct { struct_pos, fields })
    }

    fn struct_field(&mut self) -> PResult<FieldId> {
        let start = self.start();
        let doc = self.doc_before(start);
        const EMBED_FOLLOW: [Tok<'static>; 4] = [Tok::Semi, Tok::RBrace, Tok::StringLit(""), Tok::RawStringLit("")];

        let embedded = match self.tok() {
            Tok::Star => true,
            Tok::Ident(_) => match self.peek(1) {
                Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_) => true,
                Tok::LBrack => self.bracket_is_type_args(1, &EMBED_FOLLOW),
                _ => self.pos + 1 >= self.toks.len(),
            },
            _ => return Err(self.error_here("expected field")),
        };

        let (names, typ) = if embedded {
            (ListRef::EMPTY, self.parse_type()?)
        } else {
            let names = self.ident_list()?;
            let typ = self.parse_type()?;
            (self.arena.list_ident_names(names), typ)
        };
        let tag = match self.tok() {
            Tok::StringLit(_) | Tok::RawStringLit(_) if !self.eof() => Some(StringLit { raw: self.bump() }),
            _ => None,
        };
        Ok(self.arena.fields.alloc(
            Field {
                names,
                ellipsis_pos: None,
                typ,
                tag,
                is_embed: embedded,
                doc,
            },
            self.span_from(start),
        ))
    }

    fn interface_type(&mut self) -> PResult<Type> {
        let interface_pos = self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !self.at(&Tok::RBrace) && !self.eof() {
            if self.at(&Tok::Semi) {
                self.bump();
                continue;
            }
            if self.at_ident() && matches!(self.peek(1), Tok::LParen) {
                let name = self.ident()?;
                let sig = self.signature()?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Embed(self.constraint()?));
            }
            self.expect_semi(&[Tok::RBrace])?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        let elems = self.arena.list_interface_elems(elems);
        Ok(Type::Interface { interface_pos, elems })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn block(&mut self) -> PResult<Block> {
        let l_brace = self.expect(Tok::LBrace, "'{'")?;
        let stmts = self.stmt_list()?;
        let r_brace = self.expect(Tok::RBrace, "'}'")?;
        Ok(Block {
            l_brace,
            stmts,
            r_brace,
        })
    }

    fn stmt_list(&mut self) -> PResult<ListRef<StmtId>> {
        let mut stmts = Vec::new();
        while !self.eof() && !self.at(&Tok::RBrace) && !self.at(&Tok::KwCase) && !self.at(&Tok::KwDefault) {
            if self.at(&Tok::Semi) {
                self.bump();
                continue;
            }
            stmts.push(self.stmt()?);
            self.expect_semi(&[Tok::RBrace, Tok::KwCase, Tok::KwDefault])?;
        }
        Ok(self.arena.list_stmts(stmts))
    }

    fn stmt(&mut self) -> PResult<StmtId> {
        let start = self.start();
        let stmt = match self.tok() {
            Tok::KwVar => Stmt::Decl(self.gen_decl(GenDeclKind::Var)?),
            Tok::KwConst => Stmt::Decl(self.gen_decl(GenDeclKind::Const)?),
            Tok::KwType => Stmt::Decl(self.gen_decl(GenDeclKind::Type)?),
            Tok::LBrace => Stmt::Block(self.block()?),
            Tok::KwIf => return self.if_stmt(),
            Tok::KwFor => self.for_stmt()?,
            Tok::KwSwitch => self.switch_stmt()?,
            Tok::KwSelect => self.select_stmt()?,
            Tok::KwReturn => {
                let return_pos = self.bump();
                let results = if self.at(&Tok::Semi) || self.at(&Tok::RBrace) || self.eof() {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                Stmt::Return {
                    return_pos,
                    results: self.arena.list_exprs(results),
                }
            }
            Tok::KwGo => {
                let go_pos = self.bump();
                Stmt::Go {
                    go_pos,
                    call: self.parse_expr()?,
                }
            }
            Tok::KwDefer => {
                let defer_pos = self.bump();
                Stmt::Defer {
                    defer_pos,
                    call: self.parse_expr()?,
                }
            }
            Tok::KwBreak | Tok::KwContinue | Tok::KwGoto | Tok::KwFallthrough => {
                let kind = match self.tok() {
                    Tok::KwBreak => BranchKind::Break,
                    Tok::KwContinue => BranchKind::Continue,
                    Tok::KwGoto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let kw_pos = self.bump();
                let label = if kind != BranchKind::Fallthrough && self.at_ident() {
                    Some(self.ident()?)
                } else {
                    None
                };
                Stmt::Branch { kind, kw_pos, label }
            }
            Tok::Ident(_) if matches!(self.peek(1), Tok::Colon) && !self.eof() => {
                let label = self.ident()?;
                let colon_pos = self.bump();
                let stmt = if self.at(&Tok::RBrace) || self.eof() {
                    let at = Span::point(colon_pos.end);
                    let empty = self.arena.simple_stmts.alloc(SimpleStmt::Empty(at), at);
                    self.arena.stmts.alloc(Stmt::Simple(empty), at)
                } else {
                    self.stmt()?
                };
                Stmt::Labeled { label, colon_pos, stmt }
            }
            _ => match self.simple_stmt(false)? {
                Simple::Stmt(s, span) => Stmt::Simple(self.arena.simple_stmts.alloc(s, span)),
                Simple::Range { range_pos, .. } => return Err(Diag::parse(range_pos, "unexpected range")),
            },
        };
        Ok(self.arena.stmts.alloc(stmt, self.span_from(start)))
    }

    fn simple_stmt(&mut self, range_ok: bool) -> PResult<Simple> {
        let start = self.start();
        if range_ok && self.at(&Tok::KwRange) {
            let range_pos = self.bump();
            let expr = self.parse_expr()?;
            return Ok(Simple::Range {
                lhs: None,
                range_pos,
                expr,
            });
        }

        let lhs = self.expr_list()?;
        let stmt = match self.tok() {
            Tok::Define if !self.eof() => {
                let op_pos = self.bump();
                let names = self.names_of(&lhs)?;
                if range_ok && self.at(&Tok::KwRange) {
                    let range_pos = self.bump();
                    let expr = self.parse_expr()?;
                    return Ok(Simple::Range {
                        lhs: Some(RangeLhs::Define { names, op_pos }),
                        range_pos,
                        expr,
                    });
                }
                let values = self.expr_list()?;
                SimpleStmt::ShortVarDecl {
                    names,
                    op_pos,
                    values: self.arena.list_exprs(values),
                }
            }
            t if assign_op(t).is_some() && !self.eof() => {
                let op = assign_op(t).unwrap_or(AssignOp::Assign);
                let op_pos = self.bump();
                let lhs = self.arena.list_exprs(lhs);
                if range_ok && op == AssignOp::Assign && self.at(&Tok::KwRange) {
                    let range_pos = self.bump();
                    let expr = self.parse_expr()?;
                    return Ok(Simple::Range {
                        lhs: Some(RangeLhs::Assign { exprs: lhs, op_pos }),
                        range_pos,
                        expr,
                    });
                }
                let rhs = self.expr_list()?;
                SimpleStmt::Assign {
                    lhs,
                    op,
                    op_pos,
                    rhs: self.arena.list_exprs(rhs),
                }
            }
            Tok::Arrow if !self.eof() => {
                let arrow_pos = self.bump();
                let value = self.parse_expr()?;
                SimpleStmt::Send {
                    chan: self.single(&lhs)?,
                    arrow_pos,
                    value,
                }
            }
            Tok::Inc | Tok::Dec if !self.eof() => {
                let op = if self.at(&Tok::Inc) { IncDecOp::Inc } else { IncDecOp::Dec };
                let op_pos = self.bump();
                SimpleStmt::IncDec {
                    expr: self.single(&lhs)?,
                    op,
                    op_pos,
                }
            }
            _ => SimpleStmt::Expr(self.single(&lhs)?),
        };
        Ok(Simple::Stmt(stmt, self.span_from(start)))
    }

    fn single(&self, list: &[ExprId]) -> PResult<ExprId> {
        match list {
            [one] => Ok(*one),
            _ => Err(self.error_here("expected 1 expression")),
        }
    }

    fn names_of(&mut self, exprs: &[ExprId]) -> PResult<ListRef<IdentName>> {
        let mut names = Vec::with_capacity(exprs.len());
        for &e in exprs {
            match self.arena.exprs[e] {
                Expr::Ident(sym) => names.push(IdentName {
                    sym,
                    pos: self.arena.exprs.span(e),
                }),
                _ => return Err(Diag::parse(self.arena.exprs.span(e), "non-name on left side of :=")),
            }
        }
        Ok(self.arena.list_ident_names(names))
    }

    fn alloc_simple(&mut self, s: Simple) -> PResult<SimpleStmtId> {
        match s {
            Simple::Stmt(s, span) => Ok(self.arena.simple_stmts.alloc(s, span)),
            Simple::Range { range_pos, .. } => Err(Diag::parse(range_pos, "unexpected range")),
        }
    }

    fn header_expr(&mut self, s: Simple) -> PResult<ExprId> {
        match s {
            Simple::Stmt(SimpleStmt::Expr(e), _) => Ok(e),
            Simple::Stmt(_, span) | Simple::Range { range_pos: span, .. } => {
                Err(Diag::parse(span, "expected boolean expression"))
            }
        }
    }

    fn if_stmt(&mut self) -> PResult<StmtId> {
        let start = self.start();
        let if_pos = self.bump();
        let old = std::mem::replace(&mut self.expr_lev, -1);
        let header = (|| -> PResult<(Option<SimpleStmtId>, ExprId)> {
            if self.at(&Tok::Semi) {
                self.bump();
                return Ok((None, self.parse_expr()?));
            }
            let s = self.simple_stmt(false)?;
            if self.at(&Tok::Semi) {
                self.bump();
                let init = self.alloc_simple(s)?;
                Ok((Some(init), self.parse_expr()?))
            } else {
                Ok((None, self.header_expr(s)?))
            }
        })();
        self.expr_lev = old;
        let (init, cond) = header?;

        let then_block = self.block()?;
        let else_stmt = if self.at(&Tok::KwElse) {
            self.bump();
            match self.tok() {
                Tok::KwIf => Some(self.if_stmt()?),
                Tok::LBrace => {
                    let bstart = self.start();
                    let b = self.block()?;
                    Some(self.arena.stmts.alloc(Stmt::Block(b), self.span_from(bstart)))
                }
                _ => return Err(self.error_here("expected if statement or block")),
            }
        } else {
            None
        };

        Ok(self.arena.stmts.alloc(
            Stmt::If {
                if_pos,
                init,
                cond,
                then_block,
                else_stmt,
            },
            self.span_from(start),
        ))
    }

    fn for_stmt(&mut self) -> PResult<Stmt> {
        let for_pos = self.bump();
        let old = std::mem::replace(&mut self.expr_lev, -1);
        let kind = self.for_header();
        self.expr_lev = old;
        let kind = kind?;
        let body = self.block()?;
        Ok(Stmt::For { for_pos, kind, body })
    }

    fn for_header(&mut self) -> PResult<ForKind> {
        if self.at(&Tok::LBrace) {
            return Ok(ForKind::Infinite);
        }
        let init = if self.at(&Tok::Semi) {
            None
        } else {
            match self.simple_stmt(true)? {
                Simple::Range { lhs, range_pos, expr } => return Ok(ForKind::Range { lhs, range_pos, expr }),
                s => Some(s),
            }
        };
        if !self.at(&Tok::Semi) {
            return match init {
                Some(s) => Ok(ForKind::Cond(self.header_expr(s)?)),
                None => Err(self.error_here("expected for loop condition")),
            };
        }
        let semi1 = self.bump();
        let init = init.map(|s| self.alloc_simple(s)).transpose()?;
        let cond = if self.at(&Tok::Semi) { None } else { Some(self.parse_expr()?) };
        let semi2 = self.expect(Tok::Semi, "';'")?;
        let post = if self.at(&Tok::LBrace) {
            None
        } else {
            let s = self.simple_stmt(false)?;
            Some(self.alloc_simple(s)?)
        };
        Ok(ForKind::Clause {
            init,
            semi1,
            cond,
            semi2,
            post,
        })
    }

    fn switch_stmt(&mut self) -> PResult<Stmt> {
        let switch_pos = self.bump();
        let old = std::mem::replace(&mut self.expr_lev, -1);
        let header = (|| -> PResult<(Option<SimpleStmtId>, Option<Simple>)> {
            if self.at(&Tok::LBrace) {
                return Ok((None, None));
            }
            let s1 = if self.at(&Tok::Semi) { None } else { Some(self.simple_stmt(false)?) };
            if self.at(&Tok::Semi) {
                self.bump();
                let init = s1.map(|s| self.alloc_simple(s)).transpose()?;
                let s2 = if self.at(&Tok::LBrace) { None } else { Some(self.simple_stmt(false)?) };
                Ok((init, s2))
            } else {
                Ok((None, s1))
            }
        })();
        self.expr_lev = old;
        let (init, tag) = header?;

        let guard = match tag {
            Some(s) => self.tag_or_guard(s)?,
            None => Err(None),
        };

        let l_brace = self.expect(Tok::LBrace, "'{'")?;
        let type_switch = guard.is_ok();
        let mut clauses = Vec::new();
        while self.at(&Tok::KwCase) || self.at(&Tok::KwDefault) {
            clauses.push(self.switch_clause(type_switch)?);
        }
        let r_brace = self.expect(Tok::RBrace, "'}'")?;
        let clauses = self.arena.list_switch_clause_ids(clauses);

        Ok(match guard {
            Ok(guard) => Stmt::TypeSwitch {
                switch_pos,
                init,
                guard,
                l_brace,
                clauses,
                r_brace,
            },
            Err(tag) => Stmt::Switch {
                switch_pos,
                init,
                tag,
                l_brace,
                clauses,
                r_brace,
            },
        })
    }

    /// `Ok(guard)` for a type switch, `Err(tag)` for an expression switch.
    fn tag_or_guard(&mut self, s: Simple) -> PResult<Result<TypeSwitchGuard, Option<ExprId>>> {
        let is_type_guard = |arena: &AstArena, e: ExprId| matches!(arena.exprs[e], Expr::TypeAssert { typ: None, .. });
        match s {
            Simple::Stmt(SimpleStmt::Expr(e), span) if is_type_guard(&self.arena, e) => {
                Ok(Ok(TypeSwitchGuard { bind: None, expr: e, span }))
            }
            Simple::Stmt(SimpleStmt::ShortVarDecl { names, values, .. }, span)
                if names.len() == 1 && values.len() == 1 && is_type_guard(&self.arena, self.arena.exprs_list(values)[0]) =>
            {
                let bind = self.arena.ident_names(names)[0];
                let expr = self.arena.exprs_list(values)[0];
                Ok(Ok(TypeSwitchGuard {
                    bind: Some(bind),
                    expr,
                    span,
                }))
            }
            Simple::Stmt(SimpleStmt::Expr(e), _) => Ok(Err(Some(e))),
            Simple::Stmt(_, span) | Simple::Range { range_pos: span, .. } => {
                Err(Diag::parse(span, "switch expression must be an expression"))
            }
        }
    }

    fn switch_clause(&mut self, type_switch: bool) -> PResult<SwitchClauseId> {
        let start = self.start();
        let is_default = self.at(&Tok::KwDefault);
        let case_pos = self.bump();
        let clause = if type_switch {
            let mut types = Vec::new();
            if !is_default {
                loop {
                    if matches!(self.tok(), Tok::Ident("nil")) {
                        types.push(TypeCaseElem::Nil(self.bump()));
                    } else {
                        types.push(TypeCaseElem::Type(self.parse_type()?));
                    }
                    if !self.at(&Tok::Comma) {
                        break;
                    }
                    self.bump();
                }
            }
            let colon_pos = self.expect(Tok::Colon, "':'")?;
            let stmts = self.stmt_list()?;
            SwitchClause::Type {
                case_pos,
                is_default,
                types: self.arena.list_type_cases(types),
                colon_pos,
                stmts,
            }
        } else {
            let exprs = if is_default { Vec::new() } else { self.expr_list()? };
            let colon_pos = self.expect(Tok::Colon, "':'")?;
            let stmts = self.stmt_list()?;
            SwitchClause::Expr {
                case_pos,
                is_default,
                exprs: self.arena.list_exprs(exprs),
                colon_pos,
                stmts,
            }
        };
        Ok(self.arena.switch_clauses.alloc(clause, self.span_from(start)))
    }

    fn select_stmt(&mut self) -> PResult<Stmt> {
        let select_pos = self.bump();
        let l_brace = self.expect(Tok::LBrace, "'{'")?;
        let mut clauses = Vec::new();
        while self.at(&Tok::KwCase) || self.at(&Tok::KwDefault) {
            let start = self.start();
            let is_default = self.at(&Tok::KwDefault);
            let case_pos = self.bump();
            let comm = if is_default {
                None
            } else {
                Some(match self.simple_stmt(false)? {
                    Simple::Stmt(SimpleStmt::Send { chan, arrow_pos, value }, _) => {
                        CommStmt::Send { chan, arrow_pos, value }
                    }
                    Simple::Stmt(SimpleStmt::Expr(expr), _) => CommStmt::Recv { lhs: None, expr },
                    Simple::Stmt(SimpleStmt::ShortVarDecl { names, op_pos, values }, _) if values.len() == 1 => {
                        CommStmt::Recv {
                            lhs: Some(RangeLhs::Define { names, op_pos }),
                            expr: self.arena.exprs_list(values)[0],
                        }
                    }
                    Simple::Stmt(
                        SimpleStmt::Assign {
                            lhs,
                            op: AssignOp::Assign,
                            op_pos,
                            rhs,
                        },
                        _,
                    ) if rhs.len() == 1 => CommStmt::Recv {
                        lhs: Some(RangeLhs::Assign { exprs: lhs, op_pos }),
                        expr: self.arena.exprs_list(rhs)[0],
                    },
                    Simple::Stmt(_, span) | Simple::Range { range_pos: span, .. } => {
                        return Err(Diag::parse(span, "select case must be receive or send"));
                    }
                })
            };
            let colon_pos = self.expect(Tok::Colon, "':'")?;
            let stmts = self.stmt_list()?;
            clauses.push(self.arena.comm_clauses.alloc(
                CommClause {
                    case_pos,
                    comm,
                    colon_pos,
                    stmts,
                },
                self.span_from(start),
            ));
        }
        let r_brace = self.expect(Tok::RBrace, "'}'")?;
        Ok(Stmt::Select {
            select_pos,
            l_brace,
            clauses: self.arena.list_comm_clause_ids(clauses),
            r_brace,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.parse_expr()?];
        while self.at(&Tok::Comma) {
            self.bump();
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_expr(&mut self) -> PResult<ExprId> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, prec1: u8) -> PResult<ExprId> {
        let mut x = self.unary_expr()?;
        loop {
            let Some(op) = binary_op(self.tok()).filter(|_| !self.eof()) else {
                break;
            };
            let prec = op.precedence();
            if prec < prec1 {
                break;
            }
            let op_pos = self.bump();
            let y = self.binary_expr(prec + 1)?;
            let span = self.arena.exprs.span(x).to(self.arena.exprs.span(y));
            x = self.arena.exprs.alloc(
                Expr::Binary {
                    left: x,
                    op,
                    op_pos,
                    right: y,
                },
                span,
            );
        }
        Ok(x)
    }

    fn unary_expr(&mut self) -> PResult<ExprId> {
        let start = self.start();
        let op = match self.tok() {
            Tok::Plus => UnaryOp::Plus,
            Tok::Minus => UnaryOp::Minus,
            Tok::Bang => UnaryOp::Not,
            Tok::Caret => UnaryOp::Xor,
            Tok::Star => UnaryOp::Deref,
            Tok::Amp => UnaryOp::Addr,
            Tok::Arrow if !matches!(self.peek(1), Tok::KwChan) => UnaryOp::Recv,
            _ => return self.primary_expr(),
        };
        if self.eof() {
            return Err(self.error_here("expected expression"));
        }
        let op_pos = self.bump();
        let expr = self.unary_expr()?;
        Ok(self
            .arena
            .exprs
            .alloc(Expr::Unary { op, op_pos, expr }, self.span_from(start)))
    }

    fn operand(&mut self) -> PResult<ExprId> {
        let start = self.start();
        if self.eof() {
            return Err(self.error_here("expected expression"));
        }
        let expr = match *self.tok() {
            Tok::IntLit(_) | Tok::FloatLit(_) | Tok::ImagLit(_) | Tok::RuneLit(_) | Tok::StringLit(_) | Tok::RawStringLit(_) => {
                let kind = match self.tok() {
                    Tok::IntLit(_) => BasicLitKind::Int,
                    Tok::FloatLit(_) => BasicLitKind::Float,
                    Tok::ImagLit(_) => BasicLitKind::Imag,
                    Tok::RuneLit(_) => BasicLitKind::Rune,
                    _ => BasicLitKind::String,
                };
                Expr::BasicLit(BasicLit { kind, raw: self.bump() })
            }
            Tok::Ident(name) => {
                self.bump();
                Expr::Ident(self.interner.intern(name))
            }
            Tok::LParen => {
                let l_paren = self.bump();
                self.expr_lev += 1;
                let inner = self.parse_expr();
                self.expr_lev -= 1;
                let expr = inner?;
                let r_paren = self.expect(Tok::RParen, "')'")?;
                Expr::Paren { l_paren, expr, r_paren }
            }
            Tok::KwFunc => {
                let func_pos = self.bump();
                let sig = self.signature()?;
                if self.at(&Tok::LBrace) {
                    let old = std::mem::replace(&mut self.expr_lev, 0);
                    let body = self.block();
                    self.expr_lev = old;
                    Expr::FuncLit {
                        func_pos,
                        sig,
                        body: body?,
                    }
                } else {
                    let t = self.arena.types.alloc(Type::Func { func_pos, sig }, self.span_from(start));
                    Expr::TypeExpr(t)
                }
            }
            Tok::LBrack | Tok::KwMap | Tok::KwChan | Tok::KwStruct | Tok::KwInterface | Tok::Arrow => {
                Expr::TypeExpr(self.parse_type()?)
            }
            _ => return Err(self.error_here("expected expression")),
        };
        Ok(self.arena.exprs.alloc(expr, self.span_from(start)))
    }

    fn primary_expr(&mut self) -> PResult<ExprId> {
        let start = self.start();
        let mut x = self.operand()?;
        loop {
            if self.eof() {
                break;
            }
            let expr = match self.tok() {
                Tok::Dot => {
                    let dot_pos = self.bump();
                    if self.at_ident() {
                        let sel = self.ident()?;
                        Expr::Selector { expr: x, dot_pos, sel }
                    } else if self.at(&Tok::LParen) {
                        self.bump();
                        let typ = if self.at(&Tok::KwType) {
                            self.bump();
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        let r_paren = self.expect(Tok::RParen, "')'")?;
                        Expr::TypeAssert {
                            expr: x,
                            dot_pos,
                            typ,
                            r_paren,
                        }
                    } else {
                        return Err(self.error_here("expected selector or type assertion"));
                    }
                }
                Tok::LBrack => {
                    self.expr_lev += 1;
                    let e = self.index_or_slice(x);
                    self.expr_lev -= 1;
                    e?
                }
                Tok::LParen => {
                    let l_paren = self.bump();
                    self.expr_lev += 1;
                    let args = self.call_args();
                    self.expr_lev -= 1;
                    let (args, ellipsis) = args?;
                    let r_paren = self.expect(Tok::RParen, "')'")?;
                    Expr::Call {
                        func: x,
                        l_paren,
                        args: self.arena.list_exprs(args),
                        ellipsis,
                        r_paren,
                    }
                }
                Tok::LBrace if self.is_literal_type(x) && (self.expr_lev >= 0 || !self.is_type_name(x)) => {
                    let typ = self.expr_to_type(x)?;
                    let lit = self.literal_value()?;
                    Expr::CompositeLit { typ, lit }
                }
                _ => break,
            };
            x = self.arena.exprs.alloc(expr, self.span_from(start));
        }
        Ok(x)
    }

    fn call_args(&mut self) -> PResult<(Vec<ExprId>, Option<Span>)> {
        let mut args = Vec::new();
        let mut ellipsis = None;
        while !self.at(&Tok::RParen) && !self.eof() {
            args.push(self.parse_expr()?);
            if self.at(&Tok::Ellipsis) {
                ellipsis = Some(self.bump());
            }
            if !self.at(&Tok::Comma) {
                break;
            }
            self.bump();
        }
        Ok((args, ellipsis))
    }

    fn index_or_slice(&mut self, base: ExprId) -> PResult<Expr> {
        let l_brack = self.bump();
        let mut first = None;
        if !self.at(&Tok::Colon) {
            first = Some(self.parse_expr()?);
        }
        if self.at(&Tok::Colon) {
            self.bump();
            let hi = if self.at(&Tok::Colon) || self.at(&Tok::RBrack) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            let max = if self.at(&Tok::Colon) {
                self.bump();
                Some(self.parse_expr()?)
            } else {
                None
            };
            let r_brack = self.expect(Tok::RBrack, "']'")?;
            return Ok(Expr::Slice {
                expr: base,
                l_brack,
                lo: first,
                hi,
                max,
                r_brack,
            });
        }
        let mut indices: Vec<ExprId> = first.into_iter().collect();
        while self.at(&Tok::Comma) {
            self.bump();
            if self.at(&Tok::RBrack) {
                break;
            }
            indices.push(self.parse_expr()?);
        }
        let r_brack = self.expect(Tok::RBrack, "']'")?;
        Ok(Expr::Index {
            base,
            l_brack,
            indices: self.arena.list_exprs(indices),
            r_brack,
        })
    }

    fn is_type_name(&self, x: ExprId) -> bool {
        match self.arena.exprs[x] {
            Expr::Ident(_) => true,
            Expr::Selector { expr, .. } => matches!(self.arena.exprs[expr], Expr::Ident(_)),
            Expr::Index { base, .. } => self.is_type_name(base),
            _ => false,
        }
    }

    fn is_literal_type(&self, x: ExprId) -> bool {
        match self.arena.exprs[x] {
            Expr::Ident(_) | Expr::Selector { .. } | Expr::Index { .. } => self.is_type_name(x),
            Expr::TypeExpr(t) => matches!(
                self.arena.types[t],
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. } | Type::Struct { .. } | Type::Named { .. }
            ),
            _ => false,
        }
    }

    /// Reinterprets an expression parsed before we knew it was a type.
    fn expr_to_type(&mut self, x: ExprId) -> PResult<TypeId> {
        let span = self.arena.exprs.span(x);
        let typ = match self.arena.exprs[x] {
            Expr::TypeExpr(t) => return Ok(t),
            Expr::Ident(sym) => Type::Named {
                pkg: None,
                name: IdentName { sym, pos: span },
                args: ListRef::EMPTY,
            },
            Expr::Selector { expr, sel, .. } => match self.arena.exprs[expr] {
                Expr::Ident(pkg) => Type::Named {
                    pkg: Some(IdentName {
                        sym: pkg,
                        pos: self.arena.exprs.span(expr),
                    }),
                    name: sel,
                    args: ListRef::EMPTY,
                },
                _ => return Err(Diag::parse(span, "expected type")),
            },
            Expr::Index { base, indices, .. } => {
                let base_t = self.expr_to_type(base)?;
                let Type::Named { pkg, name, .. } = self.arena.types[base_t] else {
                    return Err(Diag::parse(span, "expected type"));
                };
                let idx: Vec<ExprId> = self.arena.exprs_list(indices).to_vec();
                let mut args = Vec::with_capacity(idx.len());
                for e in idx {
                    args.push(self.expr_to_type(e)?);
                }
                Type::Named {
                    pkg,
                    name,
                    args: self.arena.list_types(args),
                }
            }
            Expr::Paren { expr, .. } => Type::Paren {
                typ: self.expr_to_type(expr)?,
            },
            Expr::Unary {
                op: UnaryOp::Deref,
                op_pos,
                expr,
            } => Type::Pointer {
                star_pos: op_pos,
                elem: self.expr_to_type(expr)?,
            },
            _ => return Err(Diag::parse(span, "expected type")),
        };
        Ok(self.arena.types.alloc(typ, span))
    }

    fn literal_value(&mut self) -> PResult<LiteralValue> {
        let l_brace = self.expect(Tok::LBrace, "'{'")?;
        self.expr_lev += 1;
        let elems = self.literal_elems();
        self.expr_lev -= 1;
        let elems = elems?;
        let r_brace = self.expect(Tok::RBrace, "'}'")?;
        Ok(LiteralValue {
            l_brace,
            elems: self.arena.list_keyed_elems(elems),
            r_brace,
        })
    }

    fn literal_elems(&mut self) -> PResult<Vec<KeyedElement>> {
        let mut elems = Vec::new();
        while !self.at(&Tok::RBrace) && !self.eof() {
            let first = if self.at_ident() && matches!(self.peek(1), Tok::Colon) {
                Key::Name(self.ident()?)
            } else if self.at(&Tok::LBrace) {
                Key::Literal(self.literal_value()?)
            } else {
                Key::Expr(self.parse_expr()?)
            };
            let elem = if self.at(&Tok::Colon) {
                self.bump();
                let value = if self.at(&Tok::LBrace) {
                    Element::Literal(self.literal_value()?)
                } else {
                    Element::Expr(self.parse_expr()?)
                };
                KeyedElement { key: Some(first), value }
            } else {
                let value = match first {
                    Key::Literal(lit) => Element::Literal(lit),
                    Key::Expr(e) => Element::Expr(e),
                    Key::Name(_) => return Err(self.error_here("expected ':'")),
                };
                KeyedElement { key: None, value }
            };
            elems.push(elem);
            if !self.at(&Tok::Comma) {
                break;
            }
            self.bump();
        }
        Ok(elems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ParsedFile, Interner) {
        let mut interner = Interner::new();
        let parsed = parse_file(src, &mut interner).unwrap_or_else(|e| panic!("{e}"));
        (parsed, interner)
    }

    #[test]
    fn doc_comment_attaches_to_next_decl_only() {
        let src = "package p\n\n// Doc for F.\n//go:fix inline\nfunc F() {}\n\n// stray\n\nfunc G() {}\n";
        let (parsed, _) = parse(src);
        let funcs: Vec<_> = parsed.arena.funcs.iter().map(|(_, f)| f.doc.is_some()).collect();
        assert_eq!(funcs, vec![true, false]);
        assert_eq!(parsed.arena.comment_groups.len(), 2);
    }

    #[test]
    fn trailing_comment_is_not_a_doc() {
        let src = "package p\n\nvar x = 1 // trailing\nvar y = 2\n";
        let (parsed, _) = parse(src);
        let docs: Vec<_> = parsed
            .arena
            .decls
            .iter()
            .map(|(_, d)| match d {
                Decl::Gen(g) => g.doc.is_some(),
            })
            .collect();
        assert_eq!(docs, vec![false, false]);
    }

    #[test]
    fn composite_literal_not_parsed_in_if_header() {
        let src = "package p\nfunc f(x T) { if x == y {} ; _ = T{} }\n";
        let (parsed, _) = parse(src);
        let lits = parsed
            .arena
            .exprs
            .iter()
            .filter(|(_, e)| matches!(e, Expr::CompositeLit { .. }))
            .count();
        assert_eq!(lits, 1);
    }

    #[test]
    fn grouped_params_share_a_type() {
        let (parsed, _) = parse("package p\nfunc f(a, b int, c ...string) {}\n");
        let f = parsed.arena.funcs.iter().next().map(|(_, f)| *f).unwrap();
        let sig = parsed.arena.signatures[f.sig];
        let fields = parsed.arena.fields_list(sig.params.fields);
        assert_eq!(fields.len(), 2);
        assert_eq!(parsed.arena.ident_names(parsed.arena.fields[fields[0]].names).len(), 2);
        assert!(parsed.arena.fields[fields[1]].ellipsis_pos.is_some());
    }

    #[test]
    fn type_params_vs_array_length() {
        let (parsed, _) = parse("package p\nconst N = 2\ntype A [N]int\ntype L[T any] []T\n");
        let specs: Vec<_> = parsed
            .arena
            .extras
            .specs
            .iter()
            .filter_map(|s| match s {
                Spec::Type(t) => Some(t.type_params.is_some()),
                _ => None,
            })
            .collect();
        assert_eq!(specs, vec![false, true]);
    }
}
