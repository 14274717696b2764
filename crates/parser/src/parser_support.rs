use crate::ast::{self, Span};
use crate::lexer::Tok;

/// One comma-separated entry of a parameter list before grouping.
///
/// Go's `(a, b int, c string)` cannot be told apart from `(int, string)`
/// until a typed entry is seen, so entries are collected first and grouped
/// by [`resolve_param_list`].
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Vec<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

pub fn resolve_param_list(arena: &mut ast::AstArena, params: Vec<ParamDecl>) -> Vec<ast::FieldId> {
    let mut out = Vec::new();
    let mut pending_names: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        match param.typ {
            Some(typ) => {
                let mut names = std::mem::take(&mut pending_names);
                names.extend(param.names);

                let names = arena.list_ident_names(names);
                let start = pending_start.take().unwrap_or(param.span.start);
                let field = ast::Field {
                    names,
                    ellipsis_pos: param.ellipsis_pos,
                    typ,
                    tag: None,
                    is_embed: false,
                    doc: None,
                };
                out.push(arena.fields.alloc(
                    field,
                    Span {
                        start,
                        end: param.span.end,
                    },
                ));
            }
            None => {
                if pending_names.is_empty() {
                    pending_start = Some(param.span.start);
                }
                pending_names.extend(param.names);
            }
        }
    }

    // Trailing bare identifiers were types all along: `func(int, string)`.
    for name in pending_names {
        let typ = named_type_from_ident(arena, name);
        let field = ast::Field {
            names: ast::ListRef::EMPTY,
            ellipsis_pos: None,
            typ,
            tag: None,
            is_embed: false,
            doc: None,
        };
        out.push(arena.fields.alloc(field, name.pos));
    }

    out
}

fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena.types.alloc(
        ast::Type::Named {
            pkg: None,
            name,
            args: ast::ListRef::EMPTY,
        },
        name.pos,
    )
}

/// Maps a binary operator token to its operator.
pub fn binary_op(tok: &Tok<'_>) -> Option<ast::BinaryOp> {
    use ast::BinaryOp as B;
    Some(match tok {
        Tok::LOr => B::LOr,
        Tok::LAnd => B::LAnd,
        Tok::EqEq => B::Eq,
        Tok::NotEq => B::Ne,
        Tok::Lt => B::Lt,
        Tok::Le => B::Le,
        Tok::Gt => B::Gt,
        Tok::Ge => B::Ge,
        Tok::Plus => B::Add,
        Tok::Minus => B::Sub,
        Tok::Pipe => B::Or,
        Tok::Caret => B::Xor,
        Tok::Star => B::Mul,
        Tok::Slash => B::Div,
        Tok::Percent => B::Rem,
        Tok::Shl => B::Shl,
        Tok::Shr => B::Shr,
        Tok::Amp => B::And,
        Tok::AndNot => B::AndNot,
        _ => return None,
    })
}

/// Maps `=` and the `op=` tokens to an assignment operator.
pub fn assign_op(tok: &Tok<'_>) -> Option<ast::AssignOp> {
    use ast::AssignOp as A;
    use ast::BinaryOp as B;
    Some(match tok {
        Tok::Assign => A::Assign,
        Tok::AddAssign => A::Op(B::Add),
        Tok::SubAssign => A::Op(B::Sub),
        Tok::MulAssign => A::Op(B::Mul),
        Tok::DivAssign => A::Op(B::Div),
        Tok::ModAssign => A::Op(B::Rem),
        Tok::AndAssign => A::Op(B::And),
        Tok::OrAssign => A::Op(B::Or),
        Tok::XorAssign => A::Op(B::Xor),
        Tok::ShlAssign => A::Op(B::Shl),
        Tok::ShrAssign => A::Op(B::Shr),
        Tok::AndNotAssign => A::Op(B::AndNot),
        _ => return None,
    })
}

/// Tokens that can begin a type.
pub fn starts_type(tok: &Tok<'_>) -> bool {
    matches!(
        tok,
        Tok::Ident(_)
            | Tok::Star
            | Tok::LBrack
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwFunc
            | Tok::KwStruct
            | Tok::KwInterface
            | Tok::Arrow
            | Tok::LParen
    )
}
