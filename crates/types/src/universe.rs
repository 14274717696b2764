//! Predeclared objects: basic types, builtins, `true`, `false`, `nil`,
//! `iota`, `any`, `error` and `comparable`.

use gofix_syntax::ast::Span;

use crate::constant::ConstValue;
use crate::objects::{Builtin, ObjKind, Object, VarKind};
use crate::program::Program;
use crate::scope::ScopeKind;
use crate::types::{BasicKind, InterfaceType, Named, Signature, Type, TypeTable};
use crate::{ObjId, ScopeId, TyId};

/// Ids of universe types the checker refers to directly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UniverseTypes {
    pub any: TyId,
    pub iota: ObjId,
}

impl Default for UniverseTypes {
    fn default() -> Self {
        Self {
            any: TypeTable::INVALID,
            iota: ObjId(0),
        }
    }
}

pub(crate) fn populate(prog: &mut Program) -> ScopeId {
    let scope = prog.new_scope(ScopeKind::Universe, None, None, Span::default());

    for kind in BasicKind::ALL {
        if kind.is_untyped() {
            continue;
        }
        let ty = prog.types.basic(kind);
        declare(prog, scope, kind.name(), ObjKind::TypeName { alias: false }, ty);
    }

    let untyped_bool = prog.types.basic(BasicKind::UntypedBool);
    for (name, v) in [("true", true), ("false", false)] {
        declare(
            prog,
            scope,
            name,
            ObjKind::Const {
                value: Some(ConstValue::Bool(v)),
            },
            untyped_bool,
        );
    }
    let untyped_int = prog.types.basic(BasicKind::UntypedInt);
    let iota = declare(
        prog,
        scope,
        "iota",
        ObjKind::Const {
            value: Some(ConstValue::Int(0)),
        },
        untyped_int,
    );
    let nil = prog.types.basic(BasicKind::UntypedNil);
    declare(prog, scope, "nil", ObjKind::Nil, nil);

    for (name, b) in Builtin::ALL {
        declare(prog, scope, name, ObjKind::Builtin(b), TypeTable::INVALID);
    }

    let any = prog.types.alloc(Type::Interface(InterfaceType::default()));
    declare(prog, scope, "any", ObjKind::TypeName { alias: true }, any);
    let comparable_iface = prog.types.alloc(Type::Interface(InterfaceType::default()));
    let comparable_obj = declare(prog, scope, "comparable", ObjKind::TypeName { alias: false }, TypeTable::INVALID);
    let comparable_ty = prog.types.alloc(Type::Named(Named {
        obj: comparable_obj,
        underlying: comparable_iface,
        methods: Vec::new(),
        tparams: Vec::new(),
        targs: Vec::new(),
        origin: None,
    }));
    prog.objects[comparable_obj.index()].ty = comparable_ty;

    declare_error(prog, scope);

    prog.universe_types = UniverseTypes { any, iota };
    scope
}

fn declare_error(prog: &mut Program, scope: ScopeId) {
    let string = prog.types.basic(BasicKind::String);
    let name = prog.interner.intern("");
    let result = prog.add_object(Object {
        name,
        kind: ObjKind::Var(VarKind::Result),
        pkg: None,
        ty: string,
        pos: None,
        parent: None,
        scope_pos: 0,
    });
    let sig = prog.types.alloc(Type::Signature(Signature {
        results: vec![result],
        ..Signature::default()
    }));
    let method_name = prog.interner.intern("Error");
    let method = prog.add_object(Object {
        name: method_name,
        kind: ObjKind::Func { recv_base: None },
        pkg: None,
        ty: sig,
        pos: None,
        parent: None,
        scope_pos: 0,
    });
    let iface = prog.types.alloc(Type::Interface(InterfaceType {
        methods: vec![method],
        embeds: Vec::new(),
    }));
    let obj = declare(prog, scope, "error", ObjKind::TypeName { alias: false }, TypeTable::INVALID);
    let named = prog.types.alloc(Type::Named(Named {
        obj,
        underlying: iface,
        methods: Vec::new(),
        tparams: Vec::new(),
        targs: Vec::new(),
        origin: None,
    }));
    prog.objects[obj.index()].ty = named;
}

fn declare(prog: &mut Program, scope: ScopeId, name: &str, kind: ObjKind, ty: TyId) -> ObjId {
    let sym = prog.interner.intern(name);
    let obj = prog.add_object(Object {
        name: sym,
        kind,
        pkg: None,
        ty,
        pos: None,
        parent: Some(scope),
        scope_pos: 0,
    });
    prog.scopes[scope.index()].names.insert(sym, obj);
    obj
}
