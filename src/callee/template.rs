use std::cell::RefCell;

use gofix_types::{PkgId, Program, TyId};
use serde::{Deserialize, Serialize};

/// Stand-in for a package qualifier while printing.
const MARK: char = '\u{1}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSeg {
    Text(String),
    /// A package qualifier, dot included when spelled.
    Pkg { path: String, name: String },
}

/// A type as source text, with package qualifiers left open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeText {
    pub segs: Vec<TypeSeg>,
    /// Identical types have identical keys.
    pub key: String,
    pub interface: bool,
}

impl TypeText {
    pub(crate) fn of(prog: &Program, ty: TyId) -> Self {
        let seen: RefCell<Vec<PkgId>> = RefCell::new(Vec::new());
        let qual = |p: PkgId| {
            let mut seen = seen.borrow_mut();
            let i = match seen.iter().position(|&q| q == p) {
                Some(i) => i,
                None => {
                    seen.push(p);
                    seen.len() - 1
                }
            };
            Some(format!("{MARK}{i}{MARK}"))
        };
        let text = prog.type_string(ty, &qual);
        let seen = seen.into_inner();

        let mut segs = Vec::new();
        let mut rest = text.as_str();
        while let Some(at) = rest.find(MARK) {
            if at > 0 {
                segs.push(TypeSeg::Text(rest[..at].to_string()));
            }
            let after = &rest[at + MARK.len_utf8()..];
            let Some(end) = after.find(MARK) else {
                rest = after;
                break;
            };
            if let Some(&p) = after[..end].parse::<usize>().ok().and_then(|i| seen.get(i)) {
                let pkg = prog.package(p);
                segs.push(TypeSeg::Pkg {
                    path: pkg.path.clone(),
                    name: pkg.name.clone(),
                });
            }
            let tail = &after[end + MARK.len_utf8()..];
            rest = tail.strip_prefix('.').unwrap_or(tail);
        }
        if !rest.is_empty() {
            segs.push(TypeSeg::Text(rest.to_string()));
        }
        Self {
            segs,
            key: prog.canonical_type_string(ty),
            interface: prog.types.is_interface(ty),
        }
    }

    /// Spells the type, asking `prefix` for each package's qualifier; an
    /// empty qualifier writes the name bare.
    pub fn render<E>(&self, mut prefix: impl FnMut(&str, &str) -> Result<String, E>) -> Result<String, E> {
        let mut out = String::new();
        for seg in &self.segs {
            match seg {
                TypeSeg::Text(t) => out.push_str(t),
                TypeSeg::Pkg { path, name } => {
                    let p = prefix(path, name)?;
                    if !p.is_empty() {
                        out.push_str(&p);
                        out.push('.');
                    }
                }
            }
        }
        Ok(out)
    }

    /// Packages the type mentions.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.segs.iter().filter_map(|s| match s {
            TypeSeg::Pkg { path, name } => Some((path.as_str(), name.as_str())),
            TypeSeg::Text(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gofix_types::ProgramBuilder;

    #[test]
    fn qualifiers_are_left_open() {
        let prog = ProgramBuilder::new()
            .package("example.com/b", &[("b.go", "package b\ntype T struct{}\n")])
            .package(
                "example.com/a",
                &[("a.go", "package a\nimport \"example.com/b\"\nvar V map[string]*b.T\n")],
            )
            .build()
            .unwrap();
        let a = prog.package_by_path("example.com/a").unwrap();
        let v = prog.package_member(a, "V").unwrap();
        let t = TypeText::of(&prog, prog.object(v).ty);
        assert_eq!(
            t.segs,
            vec![
                TypeSeg::Text("map[string]*".into()),
                TypeSeg::Pkg {
                    path: "example.com/b".into(),
                    name: "b".into()
                },
                TypeSeg::Text("T".into()),
            ]
        );
        let spelled: Result<String, ()> = t.render(|_, name| Ok(format!("{name}2")));
        assert_eq!(spelled.unwrap(), "map[string]*b2.T");
        let local: Result<String, ()> = t.render(|_, _| Ok(String::new()));
        assert_eq!(local.unwrap(), "map[string]*T");
        assert!(!t.interface);
    }
}
