//! In-memory program
//!
//! A loaded class set with method bodies that implements both upstream
//! ports ([`MethodBodyProvider`] and [`ClassHierarchy`]). Built with
//! [`ProgramBuilder`] or loaded from JSON.
//!
//! Dispatch walks the superclass chain first, then interfaces (default
//! methods). Abstract declarations resolve statically but never dispatch.

use crate::errors::{PtaError, PtaResult};
use crate::features::points_to::domain::{
    AllocSite, CallSiteId, FieldSig, Invoke, InvokeKind, Local, MethodBody, MethodSig, Stmt,
    TypeName,
};
use crate::features::points_to::ports::{ClassHierarchy, MethodBodyProvider};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: TypeName,
    #[serde(default)]
    pub super_class: Option<TypeName>,
    #[serde(default)]
    pub interfaces: Vec<TypeName>,
    #[serde(default)]
    pub library: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Concrete,
    Native,
    Abstract,
}

#[derive(Debug, Clone)]
enum MethodDecl {
    Concrete(Arc<MethodBody>),
    Native,
    Abstract,
}

/// JSON form of a method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSpec {
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(flatten)]
    pub body: MethodBody,
}

/// JSON form of a program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSpec {
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    classes: FxHashMap<TypeName, ClassDecl>,
    methods: FxHashMap<MethodSig, MethodDecl>,
}

impl Program {
    pub fn from_spec(spec: ProgramSpec) -> PtaResult<Self> {
        let mut program = Program::default();
        for class in spec.classes {
            if program.classes.contains_key(&class.name) {
                return Err(PtaError::program(format!("duplicate class {}", class.name)));
            }
            program.classes.insert(class.name.clone(), class);
        }
        for method in spec.methods {
            let sig = method.body.sig.clone();
            let decl = match method.kind {
                MethodKind::Concrete => MethodDecl::Concrete(Arc::new(method.body)),
                MethodKind::Native => MethodDecl::Native,
                MethodKind::Abstract => MethodDecl::Abstract,
            };
            if program.methods.insert(sig.clone(), decl).is_some() {
                return Err(PtaError::program(format!("duplicate method {}", sig)));
            }
        }
        Ok(program)
    }

    pub fn from_json(json: &str) -> PtaResult<Self> {
        let spec: ProgramSpec = serde_json::from_str(json)?;
        Self::from_spec(spec)
    }

    pub fn to_spec(&self) -> ProgramSpec {
        let mut classes: Vec<ClassDecl> = self.classes.values().cloned().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut methods: Vec<MethodSpec> = self
            .methods
            .iter()
            .map(|(sig, decl)| match decl {
                MethodDecl::Concrete(body) => MethodSpec {
                    kind: MethodKind::Concrete,
                    body: (**body).clone(),
                },
                MethodDecl::Native => MethodSpec {
                    kind: MethodKind::Native,
                    body: MethodBody::new(sig.clone()),
                },
                MethodDecl::Abstract => MethodSpec {
                    kind: MethodKind::Abstract,
                    body: MethodBody::new(sig.clone()),
                },
            })
            .collect();
        methods.sort_by(|a, b| a.body.sig.cmp(&b.body.sig));

        ProgramSpec { classes, methods }
    }

    pub fn to_json(&self) -> PtaResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_spec())?)
    }

    pub fn class(&self, name: &TypeName) -> Option<&ClassDecl> {
        self.classes.get(name)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Concrete bodies, in no particular order
    pub fn bodies(&self) -> impl Iterator<Item = &Arc<MethodBody>> {
        self.methods.values().filter_map(|m| match m {
            MethodDecl::Concrete(body) => Some(body),
            _ => None,
        })
    }

    /// `ty` followed by its superclasses
    fn superclasses<'a>(&'a self, ty: &'a TypeName) -> impl Iterator<Item = &'a TypeName> + 'a {
        let mut seen: FxHashSet<&TypeName> = FxHashSet::default();
        std::iter::successors(Some(ty), move |cur| {
            self.classes
                .get(*cur)
                .and_then(|c| c.super_class.as_ref())
        })
        .take_while(move |t| seen.insert(*t))
    }

    /// All supertypes of `ty` breadth-first, `ty` included
    fn supertypes(&self, ty: &TypeName) -> Vec<TypeName> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<TypeName> = FxHashSet::default();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(cur) = queue.pop_front() {
            if !seen.insert(cur.clone()) {
                continue;
            }
            if let Some(class) = self.classes.get(&cur) {
                queue.extend(class.super_class.iter().cloned());
                queue.extend(class.interfaces.iter().cloned());
            }
            out.push(cur);
        }
        out
    }
}

impl MethodBodyProvider for Program {
    fn method_body(&self, method: &MethodSig) -> Option<Arc<MethodBody>> {
        match self.methods.get(method)? {
            MethodDecl::Concrete(body) => Some(body.clone()),
            MethodDecl::Native | MethodDecl::Abstract => None,
        }
    }
}

impl ClassHierarchy for Program {
    fn resolve_method(&self, method: &MethodSig) -> Option<MethodSig> {
        self.supertypes(&method.class)
            .into_iter()
            .map(|ty| method.with_class(ty))
            .find(|sig| self.methods.contains_key(sig))
    }

    fn dispatch(&self, runtime_type: &TypeName, method: &MethodSig) -> Option<MethodSig> {
        let concrete = |sig: &MethodSig| {
            matches!(
                self.methods.get(sig),
                Some(MethodDecl::Concrete(_) | MethodDecl::Native)
            )
        };
        self.superclasses(runtime_type)
            .map(|ty| method.with_class(ty.clone()))
            .find(|sig| concrete(sig))
            .or_else(|| {
                self.supertypes(runtime_type)
                    .into_iter()
                    .map(|ty| method.with_class(ty))
                    .find(|sig| concrete(sig))
            })
    }

    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        sub == sup || *sup == TypeName::object() || self.supertypes(sub).contains(sup)
    }

    fn is_library(&self, ty: &TypeName) -> bool {
        self.classes.get(ty).is_some_and(|c| c.library)
    }
}

/// Incremental construction of a [`Program`]
///
/// Hands out program-unique allocation and call site ids.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<ClassDecl>,
    methods: Vec<MethodSpec>,
    next_alloc: u32,
    next_call: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&mut self, name: &str, super_class: Option<&str>) -> &mut Self {
        self.declare(name, super_class, &[], false)
    }

    pub fn library_class(&mut self, name: &str, super_class: Option<&str>) -> &mut Self {
        self.declare(name, super_class, &[], true)
    }

    pub fn class_implementing(
        &mut self,
        name: &str,
        super_class: Option<&str>,
        interfaces: &[&str],
    ) -> &mut Self {
        self.declare(name, super_class, interfaces, false)
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        self.declare(name, None, &[], false)
    }

    fn declare(
        &mut self,
        name: &str,
        super_class: Option<&str>,
        interfaces: &[&str],
        library: bool,
    ) -> &mut Self {
        self.classes.push(ClassDecl {
            name: TypeName::new(name),
            super_class: super_class.map(TypeName::new),
            interfaces: interfaces.iter().map(TypeName::new).collect(),
            library,
        });
        self
    }

    pub fn alloc_site(&mut self, ty: &str) -> AllocSite {
        self.next_alloc += 1;
        AllocSite::new(self.next_alloc, ty)
    }

    pub fn call_site(&mut self) -> CallSiteId {
        self.next_call += 1;
        CallSiteId(self.next_call)
    }

    /// Static method without parameters yet
    pub fn method_static(&self, class: &str, subsig: &str) -> MethodBuilder {
        let mut body = MethodBody::new(MethodSig::new(class, subsig));
        body.is_static = true;
        MethodBuilder { body }
    }

    /// Instance method with `this` bound to `Local(0)`
    pub fn method_instance(&self, class: &str, subsig: &str) -> MethodBuilder {
        let mut body = MethodBody::new(MethodSig::new(class, subsig));
        body.this_local = Some(Local(0));
        MethodBuilder { body }
    }

    pub fn add_method(&mut self, body: MethodBody) -> &mut Self {
        self.methods.push(MethodSpec {
            kind: MethodKind::Concrete,
            body,
        });
        self
    }

    pub fn abstract_method(&mut self, class: &str, subsig: &str) -> &mut Self {
        self.methods.push(MethodSpec {
            kind: MethodKind::Abstract,
            body: MethodBody::new(MethodSig::new(class, subsig)),
        });
        self
    }

    pub fn native_method(&mut self, class: &str, subsig: &str) -> &mut Self {
        self.methods.push(MethodSpec {
            kind: MethodKind::Native,
            body: MethodBody::new(MethodSig::new(class, subsig)),
        });
        self
    }

    pub fn spec(&self) -> ProgramSpec {
        ProgramSpec {
            classes: self.classes.clone(),
            methods: self.methods.clone(),
        }
    }

    pub fn try_build(&self) -> PtaResult<Program> {
        Program::from_spec(self.spec())
    }

    /// Build, keeping the last declaration on duplicates
    pub fn build(&self) -> Program {
        let mut program = Program::default();
        for class in &self.classes {
            program.classes.insert(class.name.clone(), class.clone());
        }
        for method in &self.methods {
            let decl = match method.kind {
                MethodKind::Concrete => MethodDecl::Concrete(Arc::new(method.body.clone())),
                MethodKind::Native => MethodDecl::Native,
                MethodKind::Abstract => MethodDecl::Abstract,
            };
            program.methods.insert(method.body.sig.clone(), decl);
        }
        program
    }
}

/// Statement-by-statement construction of a [`MethodBody`]
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    body: MethodBody,
}

impl MethodBuilder {
    pub fn param(mut self, local: Local) -> Self {
        self.body.params.push(Some(local));
        self
    }

    /// Non-reference parameter
    pub fn primitive_param(mut self) -> Self {
        self.body.params.push(None);
        self
    }

    fn push(mut self, stmt: Stmt) -> Self {
        self.body.stmts.push(stmt);
        self
    }

    pub fn new_object(self, dst: Local, site: AllocSite) -> Self {
        self.push(Stmt::New { dst, site })
    }

    pub fn assign(self, dst: Local, src: Local) -> Self {
        self.push(Stmt::Assign { dst, src })
    }

    pub fn cast(self, dst: Local, src: Local, ty: &str) -> Self {
        self.push(Stmt::Cast {
            dst,
            src,
            ty: TypeName::new(ty),
        })
    }

    pub fn load(self, dst: Local, base: Local, field: FieldSig) -> Self {
        self.push(Stmt::Load { dst, base, field })
    }

    pub fn store(self, base: Local, field: FieldSig, src: Local) -> Self {
        self.push(Stmt::Store { base, field, src })
    }

    pub fn array_load(self, dst: Local, base: Local) -> Self {
        self.load(dst, base, FieldSig::array_element())
    }

    pub fn array_store(self, base: Local, src: Local) -> Self {
        self.store(base, FieldSig::array_element(), src)
    }

    pub fn static_load(self, dst: Local, field: FieldSig) -> Self {
        self.push(Stmt::StaticLoad { dst, field })
    }

    pub fn static_store(self, field: FieldSig, src: Local) -> Self {
        self.push(Stmt::StaticStore { field, src })
    }

    pub fn invoke_virtual(
        self,
        site: CallSiteId,
        dst: Option<Local>,
        base: Local,
        callee: MethodSig,
        args: &[Local],
    ) -> Self {
        self.invoke(site, InvokeKind::Virtual, dst, Some(base), callee, args)
    }

    pub fn invoke_special(
        self,
        site: CallSiteId,
        dst: Option<Local>,
        base: Local,
        callee: MethodSig,
        args: &[Local],
    ) -> Self {
        self.invoke(site, InvokeKind::Special, dst, Some(base), callee, args)
    }

    pub fn invoke_static(
        self,
        site: CallSiteId,
        dst: Option<Local>,
        callee: MethodSig,
        args: &[Local],
    ) -> Self {
        self.invoke(site, InvokeKind::Static, dst, None, callee, args)
    }

    fn invoke(
        self,
        site: CallSiteId,
        kind: InvokeKind,
        dst: Option<Local>,
        base: Option<Local>,
        callee: MethodSig,
        args: &[Local],
    ) -> Self {
        self.push(Stmt::Invoke(Invoke {
            site,
            kind,
            callee,
            base,
            args: args.iter().copied().map(Some).collect(),
            dst,
        }))
    }

    pub fn ret(self, src: Local) -> Self {
        self.push(Stmt::Return { src })
    }

    pub fn finish(self) -> MethodBody {
        self.body
    }
}
