//! Tool directives in comments.
//!
//! A directive is a line comment of the form `//tool:name args` with no
//! space after the slashes. Block comments and ordinary prose are never
//! directives.

use gofix_syntax::ast::{AstArena, CommentGroupId, CommentKind, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'s> {
    pub tool: &'s str,
    pub name: &'s str,
    /// Everything after the name, trimmed; may be empty.
    pub args: &'s str,
    /// The whole comment.
    pub span: Span,
}

impl Directive<'_> {
    /// `//go:fix inline`
    pub fn is_fix_inline(&self) -> bool {
        self.tool == "go" && self.name == "fix" && self.args == "inline"
    }
}

/// Parses the text of one comment, slashes included.
pub fn parse_comment(text: &str, span: Span) -> Option<Directive<'_>> {
    let body = text.strip_prefix("//")?;
    let (tool, rest) = body.split_once(':')?;
    if tool.is_empty() || !tool.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) {
        return None;
    }
    let name_len = rest.find(|c: char| c.is_whitespace()).unwrap_or(rest.len());
    let (name, args) = rest.split_at(name_len);
    if name.is_empty() {
        return None;
    }
    Some(Directive {
        tool,
        name,
        args: args.trim(),
        span,
    })
}

/// Directives of a comment group, in source order.
pub fn directives<'s>(arena: &AstArena, src: &'s str, group: Option<CommentGroupId>) -> Vec<Directive<'s>> {
    let Some(group) = group else {
        return Vec::new();
    };
    arena
        .comment_ids(arena.comment_groups[group].comments)
        .iter()
        .filter(|&&c| arena.comments[c].kind == CommentKind::Line)
        .filter_map(|&c| {
            let span = arena.comments.span(c);
            src.get(span.range()).and_then(|text| parse_comment(text, span))
        })
        .collect()
}

/// The `//go:fix inline` directive of a doc comment, if any.
pub fn fix_inline(arena: &AstArena, src: &str, group: Option<CommentGroupId>) -> Option<Span> {
    directives(arena, src, group)
        .into_iter()
        .find(Directive::is_fix_inline)
        .map(|d| d.span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<Directive<'_>> {
        parse_comment(text, Span::new(0, text.len()))
    }

    #[test]
    fn recognises_fix_inline() {
        let d = parse("//go:fix inline").unwrap();
        assert_eq!((d.tool, d.name, d.args), ("go", "fix", "inline"));
        assert!(d.is_fix_inline());
    }

    #[test]
    fn leading_space_is_prose() {
        assert_eq!(parse("// go:fix inline"), None);
        assert_eq!(parse("/* go:fix inline */"), None);
    }

    #[test]
    fn arguments_may_be_empty_or_long() {
        let d = parse("//go:noinline").unwrap();
        assert_eq!((d.name, d.args), ("noinline", ""));
        let d = parse("//lint:ignore U1000 kept for callers").unwrap();
        assert_eq!((d.tool, d.name, d.args), ("lint", "ignore", "U1000 kept for callers"));
    }

    #[test]
    fn case_matters() {
        assert!(!parse("//go:fix Inline").unwrap().is_fix_inline());
        assert_eq!(parse("//Go:fix inline"), None);
    }

    #[test]
    fn malformed_text_is_not_a_directive() {
        for text in ["//", "//:", "//go:", "//go", "//go :fix", "//https://example.com"] {
            assert!(
                parse(text).is_none() || parse(text).is_some_and(|d| !d.is_fix_inline()),
                "{text:?}"
            );
        }
        assert_eq!(parse("//:fix inline"), None);
    }
}
