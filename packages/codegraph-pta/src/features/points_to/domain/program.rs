//! Program Model
//!
//! Three-address statements as handed over by the bytecode frontend.
//! The engine never parses class files itself: it only reads method bodies
//! through [`MethodBodyProvider`](crate::features::points_to::ports::MethodBodyProvider).
//!
//! Statement forms (one pointer operation each):
//! - `x = new T`            → [`Stmt::New`]
//! - `x = y`                → [`Stmt::Assign`]
//! - `x = (T) y`            → [`Stmt::Cast`]
//! - `x = y.f` / `x = y[i]` → [`Stmt::Load`]
//! - `x.f = y` / `x[i] = y` → [`Stmt::Store`]
//! - `x = T.f`, `T.f = x`   → [`Stmt::StaticLoad`], [`Stmt::StaticStore`]
//! - `x = y.m(a, b)`        → [`Stmt::Invoke`]
//! - `return x`             → [`Stmt::Return`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Fully qualified class or interface name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root of the class hierarchy
    pub fn object() -> Self {
        Self::new("java.lang.Object")
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method signature: declaring class + sub-signature (`name(params)`)
///
/// Virtual dispatch matches on the sub-signature only, so `A.foo()` and
/// `B.foo()` are overrides of each other when `B <: A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSig {
    pub class: TypeName,
    pub subsig: Arc<str>,
}

impl MethodSig {
    pub fn new(class: impl Into<TypeName>, subsig: impl AsRef<str>) -> Self {
        Self {
            class: class.into(),
            subsig: Arc::from(subsig.as_ref()),
        }
    }

    /// Same sub-signature, declared in another class
    pub fn with_class(&self, class: TypeName) -> Self {
        Self {
            class,
            subsig: Arc::clone(&self.subsig),
        }
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.subsig)
    }
}

impl FromStr for MethodSig {
    type Err = String;

    /// Parse `com.acme.Main.main(java.lang.String[])` or `Main.run`.
    ///
    /// The class/sub-signature split is the last `.` before the parameter list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let head = match s.find('(') {
            Some(paren) => &s[..paren],
            None => s,
        };
        match head.rfind('.') {
            Some(dot) if dot > 0 && dot + 1 < head.len() => {
                Ok(MethodSig::new(&s[..dot], &s[dot + 1..]))
            }
            _ => Err(s.to_string()),
        }
    }
}

/// Field signature (declaring class + name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldSig {
    pub class: TypeName,
    pub name: Arc<str>,
}

impl FieldSig {
    pub fn new(class: impl Into<TypeName>, name: impl AsRef<str>) -> Self {
        Self {
            class: class.into(),
            name: Arc::from(name.as_ref()),
        }
    }

    /// Pseudo-field standing for every element of an array object
    pub fn array_element() -> Self {
        Self::new("[]", "[]")
    }

    pub fn is_array_element(&self) -> bool {
        self.class.as_str() == "[]"
    }
}

impl fmt::Display for FieldSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// Local variable slot inside one method body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Local(pub u32);

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Program-unique allocation site id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocSiteId(pub u32);

/// Program-unique call site id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSiteId(pub u32);

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cs{}", self.0)
    }
}

/// A `new T` expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocSite {
    pub id: AllocSiteId,
    /// Declared (and runtime) type of the allocated object
    pub ty: TypeName,
}

impl AllocSite {
    pub fn new(id: u32, ty: impl Into<TypeName>) -> Self {
        Self {
            id: AllocSiteId(id),
            ty: ty.into(),
        }
    }
}

impl fmt::Display for AllocSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alloc:{}:{}", self.id.0, self.ty)
    }
}

/// Dispatch flavour of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    /// Dispatched on the runtime type of the receiver
    Virtual,
    /// Fixed target with a receiver (constructors, `super.m()`, private methods)
    Special,
    /// No receiver
    Static,
}

/// Call statement `dst = base.callee(args)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invoke {
    pub site: CallSiteId,
    pub kind: InvokeKind,
    /// Statically referenced method
    pub callee: MethodSig,
    #[serde(default)]
    pub base: Option<Local>,
    /// `None` marks a null constant or a non-reference argument
    #[serde(default)]
    pub args: Vec<Option<Local>>,
    #[serde(default)]
    pub dst: Option<Local>,
}

impl Invoke {
    /// Whether targets depend on the receiver's points-to set
    #[inline]
    pub fn has_receiver(&self) -> bool {
        self.kind != InvokeKind::Static && self.base.is_some()
    }
}

/// Pointer-relevant statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    New { dst: Local, site: AllocSite },
    Assign { dst: Local, src: Local },
    Cast { dst: Local, src: Local, ty: TypeName },
    Load { dst: Local, base: Local, field: FieldSig },
    Store { base: Local, field: FieldSig, src: Local },
    StaticLoad { dst: Local, field: FieldSig },
    StaticStore { field: FieldSig, src: Local },
    Invoke(Invoke),
    Return { src: Local },
}

/// Body of an analyzable method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    pub sig: MethodSig,
    #[serde(default)]
    pub is_static: bool,
    /// Local bound to `this` (instance methods only)
    #[serde(default)]
    pub this_local: Option<Local>,
    /// Parameter locals; `None` for non-reference parameters
    #[serde(default)]
    pub params: Vec<Option<Local>>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

impl MethodBody {
    pub fn new(sig: MethodSig) -> Self {
        Self {
            sig,
            is_static: false,
            this_local: None,
            params: Vec::new(),
            stmts: Vec::new(),
        }
    }

    /// All allocation sites in statement order
    pub fn alloc_sites(&self) -> impl Iterator<Item = &AllocSite> {
        self.stmts.iter().filter_map(|s| match s {
            Stmt::New { site, .. } => Some(site),
            _ => None,
        })
    }

    /// All invocations in statement order
    pub fn invokes(&self) -> impl Iterator<Item = &Invoke> {
        self.stmts.iter().filter_map(|s| match s {
            Stmt::Invoke(invoke) => Some(invoke),
            _ => None,
        })
    }
}
