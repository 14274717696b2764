use gofix_syntax::lexer::{Lexer, Tok};

fn injected_semis(input: &str) -> Vec<usize> {
    let mut lx = Lexer::new(input);
    let toks: Vec<_> = lx.by_ref().collect();
    toks.into_iter()
        .filter_map(|(s, t, e)| (matches!(t, Tok::Semi) && s == e).then_some(s))
        .collect()
}

#[test]
fn after_line_enders() {
    for src in ["x\n", "1\n", "\"s\"\n", "return\n", "break\n", "i++\n", "f()\n", "a[0]\n", "{}\n"] {
        assert_eq!(injected_semis(src), vec![src.len() - 1], "{src:?}");
    }
}

#[test]
fn not_after_operators_or_openers() {
    for src in ["x +\n", "f(\n", "a[\n", "{\n", "x,\n", "func\n"] {
        assert!(injected_semis(src).is_empty(), "{src:?}");
    }
}

#[test]
fn at_end_of_input() {
    assert_eq!(injected_semis("x"), vec![1]);
    assert!(injected_semis("x;").is_empty());
}

#[test]
fn comments_keep_or_carry_the_newline() {
    // A line comment leaves the newline to insert the semicolon.
    assert_eq!(injected_semis("x // c\n"), vec![6]);
    // A block comment spanning lines inserts at its first newline.
    assert_eq!(injected_semis("x /*\n*/ y"), vec![4, 9]);
    // A single-line block comment does not.
    assert_eq!(injected_semis("x /* c */ y"), vec![11]);
}

#[test]
fn explicit_semicolons_are_not_injected() {
    let toks: Vec<_> = Lexer::new("a; b").collect();
    assert_eq!(toks[1], (1, Tok::Semi, 2));
    assert_eq!(injected_semis("a; b"), vec![4]);
}
