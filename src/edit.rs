//! Text edits and the diagnostics that carry them.

use gofix_syntax::ast::Span;
use gofix_types::FileId;

use crate::error::EditError;

/// Replace `span` with `new_text`; an empty span inserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: u32, new_text: impl Into<String>) -> Self {
        Self::replace(Span::point(at), new_text)
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedFix {
    pub title: String,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: FileId,
    pub span: Span,
    pub message: String,
    pub fixes: Vec<SuggestedFix>,
}

impl Diagnostic {
    pub fn new(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Self {
            file,
            span,
            message: message.into(),
            fixes: Vec::new(),
        }
    }

    pub fn with_fix(mut self, title: impl Into<String>, edits: Vec<TextEdit>) -> Self {
        self.fixes.push(SuggestedFix {
            title: title.into(),
            edits,
        });
        self
    }
}

/// Sorts `edits` by position and drops exact duplicates. Insertions at the
/// same offset keep their relative order.
pub fn normalize(edits: &[TextEdit]) -> Result<Vec<TextEdit>, EditError> {
    let mut sorted: Vec<TextEdit> = edits.to_vec();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));
    sorted.dedup();
    for pair in sorted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.span.start < a.span.end {
            return Err(EditError::Overlap {
                first: a.span.range(),
                second: b.span.range(),
            });
        }
    }
    Ok(sorted)
}

/// Applies non-overlapping edits to `src`.
pub fn apply_edits(src: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let sorted = normalize(edits)?;
    let mut out = String::with_capacity(src.len());
    let mut last = 0usize;
    for e in &sorted {
        let r = e.span.range();
        if r.end > src.len() || !src.is_char_boundary(r.start) || !src.is_char_boundary(r.end) {
            return Err(EditError::OutOfBounds(r));
        }
        out.push_str(&src[last..r.start]);
        out.push_str(&e.new_text);
        last = r.end;
    }
    out.push_str(&src[last..]);
    Ok(out)
}

/// Applies the first fix of every diagnostic of `file`.
pub fn apply_fixes(src: &str, file: FileId, diagnostics: &[Diagnostic]) -> Result<String, EditError> {
    let edits: Vec<TextEdit> = diagnostics
        .iter()
        .filter(|d| d.file == file)
        .filter_map(|d| d.fixes.first())
        .flat_map(|f| f.edits.iter().cloned())
        .collect();
    apply_edits(src, &edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(a: usize, b: usize) -> Span {
        Span::new(a, b)
    }

    #[test]
    fn applies_in_any_order() {
        let src = "var _ = f(0)\n";
        let edits = [
            TextEdit::replace(span(8, 12), "0"),
            TextEdit::insert(0, "// x\n"),
        ];
        assert_eq!(apply_edits(src, &edits).unwrap(), "// x\nvar _ = 0\n");
    }

    #[test]
    fn identical_edits_are_merged() {
        let e = TextEdit::insert(3, "X");
        assert_eq!(apply_edits("abcdef", &[e.clone(), e]).unwrap(), "abcXdef");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = [TextEdit::replace(span(0, 4), "a"), TextEdit::replace(span(2, 6), "b")];
        assert!(matches!(apply_edits("abcdefgh", &edits), Err(EditError::Overlap { .. })));
        let edits = [TextEdit::replace(span(2, 4), "a"), TextEdit::replace(span(2, 4), "b")];
        assert!(matches!(apply_edits("abcdefgh", &edits), Err(EditError::Overlap { .. })));
    }

    #[test]
    fn adjacent_edits_are_fine() {
        let edits = [TextEdit::replace(span(0, 2), "x"), TextEdit::replace(span(2, 4), "y")];
        assert_eq!(apply_edits("abcd", &edits).unwrap(), "xy");
    }

    #[test]
    fn out_of_bounds() {
        let edits = [TextEdit::delete(span(2, 10))];
        assert!(matches!(apply_edits("abc", &edits), Err(EditError::OutOfBounds(_))));
    }
}
