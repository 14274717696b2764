//! Field and method lookup through embedded fields.

use gofix_syntax::ast::Symbol;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::objects::{ObjKind, VarKind};
use crate::program::Program;
use crate::types::Type;
use crate::{ObjId, TyId};

/// A field or method found by [`Program::lookup_field_or_method`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub obj: ObjId,
    /// Embedded field indices, then the index of `obj` itself.
    pub index: SmallVec<[u32; 4]>,
    /// A pointer was dereferenced on the way through embedded fields.
    pub indirect: bool,
}

impl Program {
    /// Finds `name` in the field and method sets of `ty`, searching
    /// embedded fields breadth first. Returns `None` when the name is
    /// missing or ambiguous at its shallowest depth.
    pub fn lookup_field_or_method(&self, ty: TyId, name: Symbol) -> Option<LookupResult> {
        let (start, ptr) = match self.types.get(ty) {
            Type::Pointer(e) => (*e, true),
            _ => (ty, false),
        };
        let mut level = vec![(start, SmallVec::<[u32; 4]>::new(), ptr)];
        let mut seen = FxHashSet::default();

        while !level.is_empty() {
            let mut found: Option<LookupResult> = None;
            let mut count = 0;
            let mut next = Vec::new();

            for (t, path, indirect) in level {
                if let Type::Named(n) = self.types.get(t) {
                    if !seen.insert(n.origin.unwrap_or(t)) {
                        continue;
                    }
                    let methods = self.named_methods(t);
                    if let Some(i) = methods.iter().position(|&m| self.objects[m.index()].name == name) {
                        count += 1;
                        let mut index = path.clone();
                        index.push(i as u32);
                        found = Some(LookupResult {
                            obj: methods[i],
                            index,
                            indirect,
                        });
                        continue;
                    }
                }
                match self.types.get(self.types.underlying(t)) {
                    Type::Struct(s) => {
                        for (i, &f) in s.fields.iter().enumerate() {
                            let field = &self.objects[f.index()];
                            if field.name == name {
                                count += 1;
                                let mut index = path.clone();
                                index.push(i as u32);
                                found = Some(LookupResult { obj: f, index, indirect });
                            }
                            if matches!(field.kind, ObjKind::Var(VarKind::Field { embedded: true })) {
                                let (ft, p) = match self.types.get(field.ty) {
                                    Type::Pointer(e) => (*e, true),
                                    _ => (field.ty, false),
                                };
                                let mut sub = path.clone();
                                sub.push(i as u32);
                                next.push((ft, sub, indirect || p));
                            }
                        }
                    }
                    Type::Interface(_) => {
                        let methods = self.interface_methods(t);
                        if let Some(i) = methods.iter().position(|&m| self.objects[m.index()].name == name) {
                            count += 1;
                            let mut index = path.clone();
                            index.push(i as u32);
                            found = Some(LookupResult {
                                obj: methods[i],
                                index,
                                indirect,
                            });
                        }
                    }
                    _ => {}
                }
            }

            match count {
                0 => level = next,
                1 => return found,
                _ => return None,
            }
        }
        None
    }

    /// Declared methods of a named type; instances share their origin's.
    pub fn named_methods(&self, ty: TyId) -> &[ObjId] {
        match self.types.get(ty) {
            Type::Named(n) => match n.origin {
                Some(o) if o != ty => self.named_methods(o),
                _ => &n.methods,
            },
            _ => &[],
        }
    }

    /// Full method set of an interface, embedded interfaces included.
    pub fn interface_methods(&self, ty: TyId) -> Vec<ObjId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_interface_methods(ty, &mut out, &mut seen, 0);
        out
    }

    fn collect_interface_methods(&self, ty: TyId, out: &mut Vec<ObjId>, seen: &mut FxHashSet<TyId>, depth: u32) {
        if depth > 16 || !seen.insert(ty) {
            return;
        }
        if let Type::Interface(it) = self.types.get(self.types.underlying(ty)) {
            for &m in &it.methods {
                if !out.iter().any(|&o| self.objects[o.index()].name == self.objects[m.index()].name) {
                    out.push(m);
                }
            }
            for &e in &it.embeds {
                self.collect_interface_methods(e, out, seen, depth + 1);
            }
        }
    }
}
