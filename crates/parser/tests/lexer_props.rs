use gofix_syntax::lexer::{Lexer, Tok};
use proptest::prelude::*;

/// Go-ish text: identifiers, literals, operators, comments and newlines.
fn go_like() -> impl Strategy<Value = String> {
    let piece = prop::sample::select(vec![
        "x", "y1", "return", "break", "func", "1", "0x1F", "1.5", "2i", "'a'", "\"s\"", "`raw`", "(", ")", "{", "}",
        "[", "]", "+", "++", "--", ":=", ";", ",", ".", " ", "\t", "\n", "// c\n", "/* b */", "/*\n*/", "\r\n",
    ]);
    prop::collection::vec(piece, 0..40).prop_map(|v| v.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn never_panics_and_progresses(s in ".*") {
        let lx = Lexer::new(&s);
        let mut max_end = 0usize;
        let mut last_real_end = 0usize;
        let max_steps = s.len().saturating_mul(4) + 64;

        for (steps, (start, tok, end)) in lx.enumerate() {
            prop_assert!(start <= end, "start>end: ({start},{end}) tok={tok:?} input={s:?}");
            prop_assert!(end <= s.len(), "end out of bounds: ({start},{end}) len={} tok={tok:?} input={s:?}", s.len());

            let injected_semi = matches!(tok, Tok::Semi) && start == end;
            if !injected_semi {
                prop_assert!(
                    start >= last_real_end,
                    "real token moved backwards: start={start} < last_real_end={last_real_end} tok={tok:?} input={s:?}"
                );
                last_real_end = end;
                prop_assert!(end >= max_end, "real token end regressed: end={end} < max_end={max_end} input={s:?}");
            } else {
                prop_assert!(start >= max_end, "injected semi before progress: pos={start} < max_end={max_end} input={s:?}");
            }
            max_end = max_end.max(end);

            prop_assert!(steps <= max_steps, "too many steps: steps={steps} len={} input={s:?}", s.len());
        }
    }

    #[test]
    fn comments_stay_out_of_tokens(s in go_like()) {
        let mut lx = Lexer::new(&s);
        let toks: Vec<_> = lx.by_ref().filter(|(a, _, b)| a != b).collect();
        let comments = lx.take_comments();

        let mut last = 0u32;
        for (span, _) in &comments {
            prop_assert!(span.start >= last, "comments out of order in {s:?}");
            prop_assert!(s[span.range()].starts_with('/'), "comment {:?} in {s:?}", &s[span.range()]);
            last = span.end;
            for (a, _, b) in &toks {
                prop_assert!(*b as u32 <= span.start || *a as u32 >= span.end, "token inside comment in {s:?}");
            }
        }
    }
}
