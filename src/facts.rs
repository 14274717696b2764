//! Facts: what one package tells its dependents about its inlinable
//! declarations.
//!
//! Every fact crosses the package boundary in encoded form, so nothing in
//! it may point into the producing package's in-memory program.

use std::fmt;

use gofix_types::{ObjId, ObjKind, Program};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::callee::Callee;
use crate::error::FactError;

/// Names a package-level object, or a method as `T.M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub pkg_path: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(pkg_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pkg_path: pkg_path.into(),
            name: name.into(),
        }
    }

    /// Key of `obj`, if facts can be attached to it.
    pub fn of(prog: &Program, obj: ObjId) -> Option<Self> {
        let o = prog.object(obj);
        let pkg_path = prog.obj_pkg_path(obj)?.to_string();
        if prog.is_package_level(obj) {
            return Some(Self::new(pkg_path, prog.obj_name(obj)));
        }
        match o.kind {
            ObjKind::Func { recv_base: Some(base) } => {
                Some(Self::new(pkg_path, format!("{}.{}", prog.obj_name(base), prog.obj_name(obj))))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pkg_path, self.name)
    }
}

/// `const C = F`: uses of `C` become uses of `F`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstFact {
    pub rhs_name: String,
    /// Empty for predeclared constants.
    pub rhs_pkg_path: String,
    pub rhs_pkg_name: String,
    /// The right-hand side, when it lives in the program being analyzed.
    #[serde(skip)]
    pub rhs_obj: Option<ObjId>,
}

impl PartialEq for ConstFact {
    fn eq(&self, other: &Self) -> bool {
        self.rhs_name == other.rhs_name
            && self.rhs_pkg_path == other.rhs_pkg_path
            && self.rhs_pkg_name == other.rhs_pkg_name
    }
}

/// Marks an alias whose uses may be replaced by its right-hand side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasFact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fact {
    Func(Box<Callee>),
    Const(ConstFact),
    Alias(AliasFact),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactKind {
    Func,
    Const,
    Alias,
}

impl Fact {
    pub fn kind(&self) -> FactKind {
        match self {
            Fact::Func(_) => FactKind::Func,
            Fact::Const(_) => FactKind::Const,
            Fact::Alias(_) => FactKind::Alias,
        }
    }

    pub fn encode(&self, key: &ObjectKey) -> Result<Vec<u8>, FactError> {
        bincode::serialize(self).map_err(|source| FactError::Encode {
            key: key.to_string(),
            source,
        })
    }

    pub fn decode(bytes: &[u8], key: &ObjectKey) -> Result<Self, FactError> {
        bincode::deserialize(bytes).map_err(|source| FactError::Decode {
            key: key.to_string(),
            source,
        })
    }
}

/// Object facts shared between the passes over different packages.
pub trait FactStore {
    fn export_object_fact(&mut self, key: ObjectKey, fact: &Fact) -> Result<(), FactError>;

    /// The fact of `kind` exported for `key`, if any.
    fn import_object_fact(&self, key: &ObjectKey, kind: FactKind) -> Option<Fact>;
}

/// Keeps facts encoded, as they would be between separate processes.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    facts: FxHashMap<(ObjectKey, FactKind), Vec<u8>>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Exported keys, sorted.
    pub fn keys(&self) -> Vec<(ObjectKey, FactKind)> {
        let mut keys: Vec<_> = self.facts.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl FactStore for MemoryFactStore {
    fn export_object_fact(&mut self, key: ObjectKey, fact: &Fact) -> Result<(), FactError> {
        let bytes = fact.encode(&key)?;
        let slot = (key, fact.kind());
        match self.facts.get(&slot) {
            Some(existing) if *existing != bytes => Err(FactError::Duplicate(slot.0.to_string())),
            Some(_) => Ok(()),
            None => {
                self.facts.insert(slot, bytes);
                Ok(())
            }
        }
    }

    fn import_object_fact(&self, key: &ObjectKey, kind: FactKind) -> Option<Fact> {
        let bytes = self.facts.get(&(key.clone(), kind))?;
        match Fact::decode(bytes, key) {
            Ok(fact) => Some(fact),
            Err(err) => {
                warn!(%err, "dropping undecodable fact");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::discovery::discover;
    use gofix_types::ProgramBuilder;

    fn const_fact() -> Fact {
        Fact::Const(ConstFact {
            rhs_name: "F".into(),
            rhs_pkg_path: "example.com/b".into(),
            rhs_pkg_name: "b".into(),
            rhs_obj: None,
        })
    }

    #[test]
    fn facts_survive_the_store() {
        let mut store = MemoryFactStore::new();
        let key = ObjectKey::new("example.com/b", "E");
        store.export_object_fact(key.clone(), &const_fact()).unwrap();
        store.export_object_fact(ObjectKey::new("example.com/b", "A"), &Fact::Alias(AliasFact)).unwrap();

        assert_eq!(store.import_object_fact(&key, FactKind::Const), Some(const_fact()));
        assert_eq!(store.import_object_fact(&key, FactKind::Alias), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reexporting_the_same_fact_is_harmless() {
        let mut store = MemoryFactStore::new();
        let key = ObjectKey::new("p", "C");
        store.export_object_fact(key.clone(), &const_fact()).unwrap();
        store.export_object_fact(key.clone(), &const_fact()).unwrap();
        let other = Fact::Const(ConstFact {
            rhs_name: "G".into(),
            ..ConstFact::default()
        });
        assert!(matches!(store.export_object_fact(key, &other), Err(FactError::Duplicate(_))));
    }

    fn program(pkgs: &[(&str, &str)]) -> Program {
        let mut builder = ProgramBuilder::new();
        for &(path, src) in pkgs {
            let name = format!("{}.go", path.rsplit('/').next().unwrap());
            builder = builder.package(path, &[(name.as_str(), src)]);
        }
        builder.build().unwrap()
    }

    #[test]
    fn in_process_object_is_not_encoded() {
        let prog = program(&[("example.com/b", "package b\n\nconst F = 1\n")]);
        let pkg = prog.package_by_path("example.com/b").unwrap();
        let f = prog.package_member(pkg, "F").unwrap();

        let key = ObjectKey::new("p", "C");
        let Fact::Const(c) = const_fact() else { unreachable!() };
        let with_obj = ConstFact {
            rhs_obj: Some(f),
            ..c.clone()
        };
        let bytes = Fact::Const(with_obj).encode(&key).unwrap();
        let Fact::Const(back) = Fact::decode(&bytes, &key).unwrap() else {
            panic!("kind changed")
        };
        assert_eq!(back.rhs_obj, None);
        assert_eq!(back, c);
    }

    #[test]
    fn analyzed_callee_survives_encoding() {
        let strings = "package strings\n\nfunc Join(elems []string, sep string) string { return \"\" }\n";
        let b = "package b\n\nimport \"strings\"\n\nvar sep = \",\"\n\ntype T struct{ n int }\n\n//go:fix inline\nfunc (t *T) Join(prefix string, parts ...string) (out string, n int) {\n\tout = prefix + strings.Join(parts, sep)\n\tn = t.n\n\treturn\n}\n";
        let prog = program(&[("strings", strings), ("example.com/b", b)]);
        assert!(prog.errors.is_empty(), "{:?}", prog.errors);
        let pkg = prog.package_by_path("example.com/b").unwrap();
        let mut store = MemoryFactStore::new();
        let d = discover(&prog, pkg, &Options::default(), &mut store);
        let callee = d.facts.funcs.values().next().unwrap();
        assert!(callee.is_method());
        assert!(callee.variadic());
        assert!(callee.named_results());
        assert!(callee.free.iter().any(|f| f.pkg_path.as_deref() == Some("strings")));
        assert_eq!(callee.unexported, ["n", "sep"]);

        let key = ObjectKey::new("example.com/b", "T.Join");
        let fact = Fact::Func(Box::new((**callee).clone()));
        let bytes = fact.encode(&key).unwrap();
        assert_eq!(Fact::decode(&bytes, &key).unwrap(), fact);
        assert_eq!(store.import_object_fact(&key, FactKind::Func), Some(fact));
    }

    #[test]
    fn garbage_does_not_decode() {
        let key = ObjectKey::new("p", "C");
        assert!(Fact::decode(&[0xff, 0xff, 0xff, 0xff, 0xff], &key).is_err());
    }
}
