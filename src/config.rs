/// Knobs of the inliner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Prefix a call's replacement with `var p = arg` when an argument
    /// cannot be substituted.
    pub allow_binding_decl: bool,
    /// Fall back to `func(params) { body }(args)`.
    pub allow_literalization: bool,
    /// Inline aliases with type parameters, instantiating the right-hand
    /// side at each use.
    pub inline_generic_aliases: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_binding_decl: true,
            allow_literalization: true,
            inline_generic_aliases: false,
        }
    }
}

impl Options {
    /// Defaults overridden by `GOFIX_NO_BINDING_DECL`,
    /// `GOFIX_NO_LITERALIZATION` and `GOFIX_GENERIC_ALIASES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let set = |k: &str| get(k).is_some_and(|v| !matches!(v.as_str(), "" | "0" | "false"));
        let mut o = Self::default();
        if set("GOFIX_NO_BINDING_DECL") {
            o.allow_binding_decl = false;
        }
        if set("GOFIX_NO_LITERALIZATION") {
            o.allow_literalization = false;
        }
        if set("GOFIX_GENERIC_ALIASES") {
            o.inline_generic_aliases = true;
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        let o = Options::from_lookup(|k| match k {
            "GOFIX_NO_LITERALIZATION" => Some("1".into()),
            "GOFIX_GENERIC_ALIASES" => Some("true".into()),
            "GOFIX_NO_BINDING_DECL" => Some("0".into()),
            _ => None,
        });
        assert!(o.allow_binding_decl);
        assert!(!o.allow_literalization);
        assert!(o.inline_generic_aliases);
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let o = Options::from_lookup(|_| None);
        assert_eq!(o, Options::default());
        assert!(o.allow_binding_decl && o.allow_literalization);
        assert!(!o.inline_generic_aliases);
    }
}
