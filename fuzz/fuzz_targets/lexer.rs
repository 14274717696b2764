#![no_main]

use gofix_syntax::lexer::{Lexer, Tok};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let mut lx = Lexer::new(&s);

    let mut max_end = 0usize;
    let mut last_real_end = 0usize;
    let mut steps = 0usize;
    let max_steps = s.len().saturating_mul(4) + 64;

    for (start, tok, end) in lx.by_ref() {
        assert!(start <= end);
        assert!(end <= s.len());

        // Injected semicolons are empty; real tokens never go backwards.
        let injected = matches!(tok, Tok::Semi) && start == end;
        if injected {
            assert!(start >= max_end);
        } else {
            assert!(start >= last_real_end);
            last_real_end = end;
            assert!(end >= max_end);
        }
        max_end = max_end.max(end);

        steps += 1;
        assert!(steps <= max_steps);
    }

    // Comments come out in source order and inside the input.
    let mut last = 0u32;
    for (span, _) in lx.take_comments() {
        assert!(span.start >= last && span.end as usize <= s.len());
        last = span.end;
    }
});
