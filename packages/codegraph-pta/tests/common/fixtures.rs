//! Fixture programs
//!
//! Small hand-written programs with known points-to results. Each fixture
//! returns the program plus the handles (sites, methods, fields) the tests
//! need to phrase their expectations.

use codegraph_pta::features::points_to::domain::{
    AllocSite, CallSiteId, FieldSig, Local, MethodSig,
};
use codegraph_pta::features::points_to::infrastructure::{Program, ProgramBuilder};
use std::sync::Arc;

pub fn sig(class: &str, subsig: &str) -> MethodSig {
    MethodSig::new(class, subsig)
}

pub fn speak() -> MethodSig {
    sig("Animal", "speak()")
}

/// `Animal` with two overriding subclasses `Cat` and `Dog`
fn animals(pb: &mut ProgramBuilder) {
    pb.class("Animal", None)
        .class("Cat", Some("Animal"))
        .class("Dog", Some("Animal"))
        .class("Main", None);
    for class in ["Animal", "Cat", "Dog"] {
        let body = pb
            .method_instance(class, "speak()")
            .ret(Local(0))
            .finish();
        pb.add_method(body);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Field flow
// ═══════════════════════════════════════════════════════════════════════════

pub struct FieldFlow {
    pub program: Arc<Program>,
    pub main: MethodSig,
    pub value: AllocSite,
    pub holder: AllocSite,
    pub field: FieldSig,
}

/// ```text
/// main() {
///   l0 = new Value
///   l1 = l0
///   l2 = new Holder
///   l2.f = l1
///   l3 = l2.f
/// }
/// ```
pub fn fixture_field_flow() -> FieldFlow {
    let mut pb = ProgramBuilder::new();
    pb.class("Value", None).class("Holder", None).class("Main", None);
    let value = pb.alloc_site("Value");
    let holder = pb.alloc_site("Holder");
    let field = FieldSig::new("Holder", "f");

    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), value.clone())
        .assign(Local(1), Local(0))
        .new_object(Local(2), holder.clone())
        .store(Local(2), field.clone(), Local(1))
        .load(Local(3), Local(2), field.clone())
        .finish();
    pb.add_method(main);

    FieldFlow {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        value,
        holder,
        field,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Virtual dispatch
// ═══════════════════════════════════════════════════════════════════════════

pub struct Dispatch {
    pub program: Arc<Program>,
    pub main: MethodSig,
    pub site: CallSiteId,
}

/// Receiver `l2` may be a `Cat` or a `Dog`
pub fn fixture_dispatch() -> Dispatch {
    let mut pb = ProgramBuilder::new();
    animals(&mut pb);
    let cat = pb.alloc_site("Cat");
    let dog = pb.alloc_site("Dog");
    let site = pb.call_site();

    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), cat)
        .new_object(Local(1), dog)
        .assign(Local(2), Local(0))
        .assign(Local(2), Local(1))
        .invoke_virtual(site, Some(Local(3)), Local(2), speak(), &[])
        .finish();
    pb.add_method(main);

    Dispatch {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        site,
    }
}

pub struct LateDispatch {
    pub program: Arc<Program>,
    pub main: MethodSig,
    pub later: MethodSig,
    pub site: CallSiteId,
}

/// `main` calls `speak` on whatever sits in `Zoo.pet`; only `main` stores a
/// `Cat` there. A second entry point `later` stores a `Dog`.
pub fn fixture_late_dispatch() -> LateDispatch {
    let mut pb = ProgramBuilder::new();
    animals(&mut pb);
    pb.class("Zoo", None);
    let pet = FieldSig::new("Zoo", "pet");
    let cat = pb.alloc_site("Cat");
    let dog = pb.alloc_site("Dog");
    let site = pb.call_site();

    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), cat)
        .static_store(pet.clone(), Local(0))
        .static_load(Local(1), pet.clone())
        .invoke_virtual(site, None, Local(1), speak(), &[])
        .finish();
    let later = pb
        .method_static("Main", "later()")
        .new_object(Local(0), dog)
        .static_store(pet, Local(0))
        .finish();
    pb.add_method(main).add_method(later);

    LateDispatch {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        later: sig("Main", "later()"),
        site,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Precision-critical methods
// ═══════════════════════════════════════════════════════════════════════════

pub struct Polymorphic {
    pub program: Arc<Program>,
    pub main: MethodSig,
    pub poly: MethodSig,
    pub mono: MethodSig,
    pub cat: AllocSite,
    pub dog: AllocSite,
    /// `main`'s locals receiving `Poly.run(cat)` and `Poly.run(dog)`
    pub from_cat: Local,
    pub from_dog: Local,
}

/// ```text
/// Poly.run(Animal a) { a.speak(); return a }   // two receiver types
/// Mono.run(Animal a) { a.speak(); return a }   // Cat only
/// main() {
///   l0 = new Cat; l1 = new Dog
///   l2 = Poly.run(l0); l3 = Poly.run(l1); l4 = Mono.run(l0)
/// }
/// ```
pub fn fixture_polymorphic() -> Polymorphic {
    let mut pb = ProgramBuilder::new();
    animals(&mut pb);
    pb.class("Poly", None).class("Mono", None);
    let cat = pb.alloc_site("Cat");
    let dog = pb.alloc_site("Dog");

    for class in ["Poly", "Mono"] {
        let site = pb.call_site();
        let body = pb
            .method_static(class, "run(Animal)")
            .param(Local(0))
            .invoke_virtual(site, None, Local(0), speak(), &[])
            .ret(Local(0))
            .finish();
        pb.add_method(body);
    }

    let poly = sig("Poly", "run(Animal)");
    let mono = sig("Mono", "run(Animal)");
    let (cs1, cs2, cs3) = (pb.call_site(), pb.call_site(), pb.call_site());
    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), cat.clone())
        .new_object(Local(1), dog.clone())
        .invoke_static(cs1, Some(Local(2)), poly.clone(), &[Local(0)])
        .invoke_static(cs2, Some(Local(3)), poly.clone(), &[Local(1)])
        .invoke_static(cs3, Some(Local(4)), mono.clone(), &[Local(0)])
        .finish();
    pb.add_method(main);

    Polymorphic {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        poly,
        mono,
        cat,
        dog,
        from_cat: Local(2),
        from_dog: Local(3),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Heap merging
// ═══════════════════════════════════════════════════════════════════════════

pub struct Mergeable {
    pub program: Arc<Program>,
    pub main: MethodSig,
    /// Locals holding the two `Token` allocations
    pub tokens: (Local, Local),
    /// Locals holding the two `Point` allocations
    pub points: (Local, Local),
    /// Local holding the only `Single` allocation
    pub single: Local,
}

pub fn fixture_mergeable() -> Mergeable {
    let mut pb = ProgramBuilder::new();
    pb.class("Token", None)
        .class("Point", None)
        .class("Single", None)
        .class("Main", None);
    let t1 = pb.alloc_site("Token");
    let t2 = pb.alloc_site("Token");
    let p1 = pb.alloc_site("Point");
    let p2 = pb.alloc_site("Point");
    let s = pb.alloc_site("Single");

    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), t1)
        .new_object(Local(1), t2)
        .new_object(Local(2), p1)
        .new_object(Local(3), p2)
        .new_object(Local(4), s)
        .finish();
    pb.add_method(main);

    Mergeable {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        tokens: (Local(0), Local(1)),
        points: (Local(2), Local(3)),
        single: Local(4),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Casts, arrays and boundary methods
// ═══════════════════════════════════════════════════════════════════════════

pub struct Boundary {
    pub program: Arc<Program>,
    pub main: MethodSig,
    pub a: AllocSite,
    pub b: AllocSite,
    pub native: MethodSig,
    pub abstract_method: MethodSig,
    /// Site of the call to the undeclared `Nowhere.gone()`
    pub undeclared_call: CallSiteId,
    pub cast: Local,
    pub element: Local,
    pub native_result: Local,
    pub abstract_result: Local,
}

/// ```text
/// main() {
///   l0 = new A; l1 = new B
///   l2 = l0; l2 = l1
///   l3 = (A) l2
///   l4 = new Arr; l4[] = l1; l5 = l4[]
///   l6 = l2.nat()          // A.nat() is native; B has no nat()
///   l7 = Nowhere.gone()    // undeclared
///   l8 = l5.nat()          // only B reaches l5
///   l9 = Shape.area()      // abstract
/// }
/// ```
pub fn fixture_boundary() -> Boundary {
    let mut pb = ProgramBuilder::new();
    pb.class("A", None)
        .class("B", None)
        .class("Arr", None)
        .class("Shape", None)
        .class("Main", None);
    pb.native_method("A", "nat()")
        .abstract_method("Shape", "area()");
    let a = pb.alloc_site("A");
    let b = pb.alloc_site("B");
    let arr = pb.alloc_site("Arr");
    let (s1, s2, s3, s4) = (pb.call_site(), pb.call_site(), pb.call_site(), pb.call_site());

    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), a.clone())
        .new_object(Local(1), b.clone())
        .assign(Local(2), Local(0))
        .assign(Local(2), Local(1))
        .cast(Local(3), Local(2), "A")
        .new_object(Local(4), arr)
        .array_store(Local(4), Local(1))
        .array_load(Local(5), Local(4))
        .invoke_virtual(s1, Some(Local(6)), Local(2), sig("A", "nat()"), &[])
        .invoke_static(s2, Some(Local(7)), sig("Nowhere", "gone()"), &[])
        .invoke_virtual(s3, Some(Local(8)), Local(5), sig("A", "nat()"), &[])
        .invoke_static(s4, Some(Local(9)), sig("Shape", "area()"), &[])
        .finish();
    pb.add_method(main);

    Boundary {
        program: Arc::new(pb.build()),
        main: sig("Main", "main()"),
        a,
        b,
        native: sig("A", "nat()"),
        abstract_method: sig("Shape", "area()"),
        undeclared_call: s2,
        cast: Local(3),
        element: Local(5),
        native_result: Local(6),
        abstract_result: Local(9),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Deep static call chain
// ═══════════════════════════════════════════════════════════════════════════

pub struct StaticChain {
    pub program: Arc<Program>,
    pub head: MethodSig,
    pub tail: MethodSig,
    pub value: AllocSite,
}

/// `f0(p) → f1(p) → … → f{depth}(p)`, each returning its callee's result.
/// `main` allocates the value passed down the chain.
pub fn fixture_static_chain(depth: usize) -> StaticChain {
    let mut pb = ProgramBuilder::new();
    pb.class("Value", None).class("Main", None);
    let value = pb.alloc_site("Value");

    for i in 0..depth {
        let site = pb.call_site();
        let body = pb
            .method_static("Main", &format!("f{}(Value)", i))
            .param(Local(0))
            .invoke_static(
                site,
                Some(Local(1)),
                sig("Main", &format!("f{}(Value)", i + 1)),
                &[Local(0)],
            )
            .ret(Local(1))
            .finish();
        pb.add_method(body);
    }
    let tail = pb
        .method_static("Main", &format!("f{}(Value)", depth))
        .param(Local(0))
        .ret(Local(0))
        .finish();
    pb.add_method(tail);

    let site = pb.call_site();
    let main = pb
        .method_static("Main", "main()")
        .new_object(Local(0), value.clone())
        .invoke_static(site, Some(Local(1)), sig("Main", "f0(Value)"), &[Local(0)])
        .finish();
    pb.add_method(main);

    StaticChain {
        program: Arc::new(pb.build()),
        head: sig("Main", "main()"),
        tail: sig("Main", &format!("f{}(Value)", depth)),
        value,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON input
// ═══════════════════════════════════════════════════════════════════════════

/// `main` allocates an `A` and passes it through the static `Id.id`
pub fn fixture_json_program() -> &'static str {
    r#"{
  "classes": [
    { "name": "A" },
    { "name": "Id" },
    { "name": "Main" }
  ],
  "methods": [
    {
      "kind": "concrete",
      "sig": { "class": "Id", "subsig": "id(A)" },
      "is_static": true,
      "params": [0],
      "stmts": [ { "op": "return", "src": 0 } ]
    },
    {
      "kind": "concrete",
      "sig": { "class": "Main", "subsig": "main()" },
      "is_static": true,
      "stmts": [
        { "op": "new", "dst": 0, "site": { "id": 1, "ty": "A" } },
        {
          "op": "invoke",
          "site": 1,
          "kind": "static",
          "callee": { "class": "Id", "subsig": "id(A)" },
          "args": [0],
          "dst": 1
        }
      ]
    }
  ]
}"#
}
