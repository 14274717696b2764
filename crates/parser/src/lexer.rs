use crate::ast::{CommentKind, Span};
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

#[inline(always)]
fn first_newline_offset(s: &str) -> Option<usize> {
    memchr::memchr2(b'\n', b'\r', s.as_bytes())
}

// =============================================================================
// Block comments
// =============================================================================

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star) = memchr::memchr(b'*', &rem[search_start..]) {
        let abs = search_start + star;
        if rem.get(abs + 1) == Some(&b'/') {
            lex.bump(abs + 2);
            return Ok(());
        }
        search_start = abs + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// Numbers
// =============================================================================

/// Extends a number token to its maximal munch. Validation of digits is left
/// to the compiler; the rewriter only needs token boundaries and the kind.
fn lex_number(lex: &mut LogosLexer<'_, RawTok>) {
    let src = lex.source().as_bytes();
    let start = lex.span().start;
    let n = src.len();
    let hex = src[start] == b'0' && matches!(src.get(start + 1), Some(b'x' | b'X'));

    let mut i = start;
    while i < n {
        let b = src[i];
        let exp = if hex {
            matches!(b, b'p' | b'P')
        } else {
            matches!(b, b'e' | b'E')
        };
        if exp {
            i += 1;
            if matches!(src.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
        } else if b == b'.' {
            // `x[1:]` never reaches here; `1..` is not Go but `...` after a
            // number must not be swallowed.
            if src.get(i + 1) == Some(&b'.') {
                break;
            }
            i += 1;
        } else if b.is_ascii_alphanumeric() || b == b'_' {
            i += 1;
        } else {
            break;
        }
    }

    let already = lex.span().end;
    if i > already {
        lex.bump(i - already);
    }
}

fn classify_number(text: &str) -> NumberKind {
    let bytes = text.as_bytes();
    if bytes.last() == Some(&b'i') {
        return NumberKind::Imag;
    }
    let hex = bytes.len() > 1 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X');
    let float = if hex {
        bytes.iter().any(|&b| matches!(b, b'.' | b'p' | b'P'))
    } else {
        bytes.iter().any(|&b| matches!(b, b'.' | b'e' | b'E'))
    };
    if float {
        NumberKind::Float
    } else {
        NumberKind::Int
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NumberKind {
    Int,
    Float,
    Imag,
}

// =============================================================================
// Raw tokens
// =============================================================================

#[repr(u8)]
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", allow_greedy = true)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9]|\.[0-9]", lex_number)] Number,

    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    #[regex(r".", priority = 0)] Error,
}

impl RawTok {
    /// Tokens after which a newline (or EOF) terminates the statement.
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Number
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::KwBreak
                | Self::KwContinue
                | Self::KwFallthrough
                | Self::KwReturn
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }

    #[rustfmt::skip]
    fn to_token<'src>(self, slice: &'src str) -> Tok<'src> {
        macro_rules! simple_tok {
            ($($raw:ident),* $(,)?) => {
                match self {
                    Self::Ident => Tok::Ident(slice),
                    Self::Rune => Tok::RuneLit(slice),
                    Self::String => Tok::StringLit(slice),
                    Self::RawString => Tok::RawStringLit(slice),
                    Self::Number => match classify_number(slice) {
                        NumberKind::Int => Tok::IntLit(slice),
                        NumberKind::Float => Tok::FloatLit(slice),
                        NumberKind::Imag => Tok::ImagLit(slice),
                    },
                    $(Self::$raw => Tok::$raw,)*
                    Self::Bom | Self::Newline | Self::LineComment | Self::BlockComment | Self::Error => Tok::Error,
                }
            };
        }

        simple_tok! {
            KwBreak, KwCase, KwChan, KwConst, KwContinue, KwDefault, KwDefer, KwElse,
            KwFallthrough, KwFor, KwFunc, KwGo, KwGoto, KwIf, KwImport, KwInterface,
            KwMap, KwPackage, KwRange, KwReturn, KwSelect, KwStruct, KwSwitch, KwType, KwVar,

            Ellipsis, ShlAssign, ShrAssign, AndNotAssign, AddAssign, SubAssign, MulAssign,
            DivAssign, ModAssign, AndAssign, OrAssign, XorAssign, Shl, Shr, AndNot, LAnd, LOr,
            EqEq, NotEq, Le, Ge, Inc, Dec, Define, Arrow, Assign, Plus, Minus, Star, Slash,
            Percent, Amp, Pipe, Caret, Tilde, Bang, Lt, Gt,

            LParen, RParen, LBrack, RBrack, LBrace, RBrace, Comma, Semi, Colon, Dot,
        }
    }
}

// =============================================================================
// Public tokens (zero-copy)
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
}

impl std::fmt::Display for Tok<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => f.write_str(s),
            other => write!(f, "{other:?}"),
        }
    }
}

// =============================================================================
// Lexer wrapper: semicolon insertion, comment capture, diagnostics
// =============================================================================

/// Go token stream with automatic semicolons.
///
/// Comments never reach the token stream; they are kept in source order and
/// handed out by [`Lexer::take_comments`].
pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    comments: Vec<(Span, CommentKind)>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::new(),
            comments: Vec::new(),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    pub fn take_comments(&mut self) -> Vec<(Span, CommentKind)> {
        std::mem::take(&mut self.comments)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let span = Span::new(span.start, span.end);
        self.diags.push(LexError { kind, span }.diag());
    }

    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    /// Returns true if `raw` was trivia and has been consumed.
    fn handle_trivia(&mut self, raw: RawTok, span: &Range<usize>, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.last_can_insert_semi = false;
                    self.emit_semi_at(span.start);
                }
                true
            }
            RawTok::LineComment => {
                self.comments
                    .push((Span::new(span.start, span.end), CommentKind::Line));
                true
            }
            RawTok::BlockComment => {
                self.comments
                    .push((Span::new(span.start, span.end), CommentKind::Block));
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn handle_eof(&mut self) {
        self.eof_done = true;
        if self.last_can_insert_semi {
            self.last_can_insert_semi = false;
            self.emit_semi_at(self.src_len);
        }
    }

    fn handle_lex_error(&mut self, kind: LexErrorKind) -> (usize, Tok<'src>, usize) {
        let span = self.logos.span();
        if kind == LexErrorKind::UnterminatedComment {
            self.comments
                .push((Span::new(span.start, span.end), CommentKind::Block));
        }
        self.push_lex_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        (span.start, Tok::Error, span.end)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }

            let raw = match self.logos.next() {
                None => {
                    // A trailing `;` may still be pending.
                    self.handle_eof();
                    continue;
                }
                Some(Err(kind)) => return Some(self.handle_lex_error(kind)),
                Some(Ok(raw)) => raw,
            };

            let span = self.logos.span();
            let slice = self.logos.slice();

            if raw == RawTok::Bom {
                if span.start == 0 {
                    continue;
                }
                self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
                self.last_can_insert_semi = false;
                return Some((span.start, Tok::Error, span.end));
            }

            if self.handle_trivia(raw, &span, slice) {
                continue;
            }

            if raw == RawTok::Error {
                self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
                self.last_can_insert_semi = false;
                return Some((span.start, Tok::Error, span.end));
            }

            self.last_can_insert_semi = raw.can_insert_semicolon();
            return Some((span.start, raw.to_token(slice), span.end));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok<'_>> {
        Lexer::new(src).map(|(_, t, _)| t).collect()
    }

    #[test]
    fn numbers_are_classified() {
        assert_eq!(
            toks("1 0x1F 1.5 .5 1e9 0x1p-2 2i 1_000"),
            vec![
                Tok::IntLit("1"),
                Tok::IntLit("0x1F"),
                Tok::FloatLit("1.5"),
                Tok::FloatLit(".5"),
                Tok::FloatLit("1e9"),
                Tok::FloatLit("0x1p-2"),
                Tok::ImagLit("2i"),
                Tok::IntLit("1_000"),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn comments_are_captured_not_emitted() {
        let src = "x // tail\n/* block */ y";
        let mut lx = Lexer::new(src);
        let got: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
        assert_eq!(got, vec![Tok::Ident("x"), Tok::Semi, Tok::Ident("y"), Tok::Semi]);
        let comments = lx.take_comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(&src[comments[0].0.range()], "// tail");
        assert_eq!(comments[1].1, CommentKind::Block);
    }

    #[test]
    fn unterminated_block_comment_is_a_diag() {
        let mut lx = Lexer::new("x /* never closed");
        let _ = lx.by_ref().count();
        let diags = lx.take_diags();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unterminated comment");
    }
}
