//! Compile-time constant values.
//!
//! Only what rewrites need: integers (for `iota`, array lengths and
//! folding), booleans, strings and a lossy float. Anything else folds to
//! [`ConstValue::Unknown`].

use gofix_syntax::ast::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Unknown,
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i128> {
        match *self {
            ConstValue::Int(v) => Some(v),
            ConstValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e30 => Some(f as i128),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(v) => *v == 0,
            ConstValue::Float(f) => *f == 0.0,
            ConstValue::Str(s) => s.is_empty(),
            ConstValue::Bool(b) => !b,
            ConstValue::Unknown => false,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match *self {
            ConstValue::Int(v) => Some(v as f64),
            ConstValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn unary(op: UnaryOp, x: &ConstValue) -> ConstValue {
        match (op, x) {
            (UnaryOp::Plus, v) => v.clone(),
            (UnaryOp::Minus, ConstValue::Int(v)) => v.checked_neg().map_or(ConstValue::Unknown, ConstValue::Int),
            (UnaryOp::Minus, ConstValue::Float(f)) => ConstValue::Float(-f),
            (UnaryOp::Xor, ConstValue::Int(v)) => ConstValue::Int(!v),
            (UnaryOp::Not, ConstValue::Bool(b)) => ConstValue::Bool(!b),
            _ => ConstValue::Unknown,
        }
    }

    pub fn binary(op: BinaryOp, x: &ConstValue, y: &ConstValue) -> ConstValue {
        use BinaryOp::*;
        use ConstValue::*;
        match (x, y) {
            (Int(a), Int(b)) => {
                let (a, b) = (*a, *b);
                let v = match op {
                    Add => a.checked_add(b),
                    Sub => a.checked_sub(b),
                    Mul => a.checked_mul(b),
                    Div => a.checked_div(b),
                    Rem => a.checked_rem(b),
                    And => Some(a & b),
                    Or => Some(a | b),
                    Xor => Some(a ^ b),
                    AndNot => Some(a & !b),
                    Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)),
                    Shr => u32::try_from(b).ok().map(|s| if s >= 128 { 0 } else { a >> s }),
                    Eq => return Bool(a == b),
                    Ne => return Bool(a != b),
                    Lt => return Bool(a < b),
                    Le => return Bool(a <= b),
                    Gt => return Bool(a > b),
                    Ge => return Bool(a >= b),
                    LAnd | LOr => None,
                };
                v.map_or(Unknown, Int)
            }
            (Str(a), Str(b)) => match op {
                Add => Str(format!("{a}{b}")),
                Eq => Bool(a == b),
                Ne => Bool(a != b),
                Lt => Bool(a < b),
                Le => Bool(a <= b),
                Gt => Bool(a > b),
                Ge => Bool(a >= b),
                _ => Unknown,
            },
            (Bool(a), Bool(b)) => match op {
                LAnd => Bool(*a && *b),
                LOr => Bool(*a || *b),
                Eq => Bool(a == b),
                Ne => Bool(a != b),
                _ => Unknown,
            },
            _ => match (x.as_float(), y.as_float()) {
                (Some(a), Some(b)) => match op {
                    Add => Float(a + b),
                    Sub => Float(a - b),
                    Mul => Float(a * b),
                    Div if b != 0.0 => Float(a / b),
                    Eq => Bool(a == b),
                    Ne => Bool(a != b),
                    Lt => Bool(a < b),
                    Le => Bool(a <= b),
                    Gt => Bool(a > b),
                    Ge => Bool(a >= b),
                    _ => Unknown,
                },
                _ => Unknown,
            },
        }
    }

    /// Value of an integer literal such as `0x1F`, `0o17`, `017` or `1_000`.
    pub fn parse_int(raw: &str) -> ConstValue {
        let digits: String = raw.chars().filter(|&c| c != '_').collect();
        let (radix, body) = match digits.get(..2) {
            Some("0x" | "0X") => (16, &digits[2..]),
            Some("0o" | "0O") => (8, &digits[2..]),
            Some("0b" | "0B") => (2, &digits[2..]),
            _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
            _ => (10, digits.as_str()),
        };
        i128::from_str_radix(body, radix).map_or(ConstValue::Unknown, ConstValue::Int)
    }

    pub fn parse_float(raw: &str) -> ConstValue {
        let digits: String = raw.chars().filter(|&c| c != '_').collect();
        digits.parse::<f64>().map_or(ConstValue::Unknown, ConstValue::Float)
    }

    /// Value of a rune literal; escapes beyond the common ones are unknown.
    pub fn parse_rune(raw: &str) -> ConstValue {
        let inner = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).unwrap_or("");
        match unescape(inner, '\'').and_then(|s| {
            let mut chars = s.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)
        }) {
            Some(c) => ConstValue::Int(c as i128),
            None => ConstValue::Unknown,
        }
    }

    pub fn parse_string(raw: &str) -> ConstValue {
        if let Some(body) = raw.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
            return ConstValue::Str(body.replace('\r', ""));
        }
        raw.strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .and_then(|s| unescape(s, '"'))
            .map_or(ConstValue::Unknown, ConstValue::Str)
    }
}

fn unescape(s: &str, quote: char) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let e = chars.next()?;
        out.push(match e {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' => '\\',
            c if c == quote => c,
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                char::from(u8::from_str_radix(&hex, 16).ok()?)
            }
            'u' | 'U' => {
                let n = if e == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(n).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        });
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_literals() {
        assert_eq!(ConstValue::parse_int("0x1F"), ConstValue::Int(31));
        assert_eq!(ConstValue::parse_int("017"), ConstValue::Int(15));
        assert_eq!(ConstValue::parse_int("0b101"), ConstValue::Int(5));
        assert_eq!(ConstValue::parse_int("1_000"), ConstValue::Int(1000));
        assert_eq!(ConstValue::parse_int("0"), ConstValue::Int(0));
    }

    #[test]
    fn folds_arithmetic_and_comparison() {
        let two = ConstValue::Int(2);
        let three = ConstValue::Int(3);
        assert_eq!(ConstValue::binary(BinaryOp::Mul, &two, &three), ConstValue::Int(6));
        assert_eq!(ConstValue::binary(BinaryOp::Shl, &ConstValue::Int(1), &three), ConstValue::Int(8));
        assert_eq!(ConstValue::binary(BinaryOp::Lt, &two, &three), ConstValue::Bool(true));
        assert_eq!(ConstValue::binary(BinaryOp::Div, &two, &ConstValue::Int(0)), ConstValue::Unknown);
    }

    #[test]
    fn parses_quoted_literals() {
        assert_eq!(ConstValue::parse_string(r#""a\tb""#), ConstValue::Str("a\tb".into()));
        assert_eq!(ConstValue::parse_string("`raw\\n`"), ConstValue::Str("raw\\n".into()));
        assert_eq!(ConstValue::parse_rune("'x'"), ConstValue::Int('x' as i128));
        assert_eq!(ConstValue::parse_rune(r"'\n'"), ConstValue::Int(10));
    }
}
