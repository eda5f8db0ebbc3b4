//! Solver builders and generated programs

use codegraph_pta::config::{PtaConfig, WorklistOrder};
use codegraph_pta::features::points_to::domain::{FieldSig, Local, MethodSig};
use codegraph_pta::features::points_to::infrastructure::{Program, ProgramBuilder};
use codegraph_pta::features::points_to::ports::ContextSelector;
use codegraph_pta::features::points_to::PropagationSolver;
use std::sync::Arc;

/// Solver over `program` with default (insensitive) policies
pub fn solver_for(program: &Arc<Program>) -> PropagationSolver {
    PropagationSolver::new(program.clone(), program.clone())
}

/// Add `entries` and solve to quiescence
pub fn solve(mut solver: PropagationSolver, entries: &[&MethodSig]) -> PropagationSolver {
    for entry in entries {
        solver.add_entry_point(entry).unwrap();
    }
    solver.solve().unwrap();
    solver
}

pub fn solve_insensitive(program: &Arc<Program>, entries: &[&MethodSig]) -> PropagationSolver {
    solve(solver_for(program), entries)
}

pub fn solve_with(
    program: &Arc<Program>,
    selector: Arc<dyn ContextSelector>,
    order: WorklistOrder,
    entries: &[&MethodSig],
) -> PropagationSolver {
    solve(
        solver_for(program).with_selector(selector).with_order(order),
        entries,
    )
}

/// Balanced preset with `Main.main()` as the only entry point
pub fn main_config() -> PtaConfig {
    PtaConfig::default().entry_points(["Main.main()"])
}

// ═══════════════════════════════════════════════════════════════════════════
// Generated programs
// ═══════════════════════════════════════════════════════════════════════════

/// Number of locals in generated `main` bodies
pub const GEN_LOCALS: u32 = 6;

/// Statement over `main`'s locals (indices taken modulo [`GEN_LOCALS`])
#[derive(Debug, Clone)]
pub enum GenStmt {
    New { dst: u32, class: usize },
    Assign { dst: u32, src: u32 },
    Store { base: u32, src: u32 },
    Load { dst: u32, base: u32 },
    Call { dst: u32, base: u32, arg: u32 },
}

/// Shape of a generated `Ci.m(Base)` body
#[derive(Debug, Clone, Copy)]
pub enum GenBody {
    /// `return p`
    Identity,
    /// `this.f = p; t = this.f; return t`
    StoreLoad,
    /// `t = new C(j); return t`
    Fresh(usize),
    /// `t = p.f; r = t.m(this); return r`
    Recurse,
}

/// Generated subclass names, `C0 .. Cn`
pub fn gen_class(i: usize) -> String {
    format!("C{i}")
}

pub fn gen_method() -> MethodSig {
    MethodSig::new("Base", "m(Base)")
}

pub fn gen_field() -> FieldSig {
    FieldSig::new("Base", "f")
}

/// `Base` with one subclass per entry in `bodies`, plus `Main.main()` from `stmts`
pub fn build_generated(bodies: &[GenBody], stmts: &[GenStmt]) -> Arc<Program> {
    let classes = bodies.len().max(1);
    let mut pb = ProgramBuilder::new();
    pb.class("Base", None).class("Main", None);
    for i in 0..classes {
        pb.class(&gen_class(i), Some("Base"));
    }

    let abstract_body = pb
        .method_instance("Base", "m(Base)")
        .param(Local(1))
        .ret(Local(1))
        .finish();
    pb.add_method(abstract_body);

    for (i, shape) in bodies.iter().enumerate() {
        let class = gen_class(i);
        let this = Local(0);
        let p = Local(1);
        let t = Local(2);
        let builder = pb.method_instance(&class, "m(Base)").param(p);
        let body = match *shape {
            GenBody::Identity => builder.ret(p).finish(),
            GenBody::StoreLoad => builder
                .store(this, gen_field(), p)
                .load(t, this, gen_field())
                .ret(t)
                .finish(),
            GenBody::Fresh(j) => {
                let site = pb.alloc_site(&gen_class(j % classes));
                builder.new_object(t, site).ret(t).finish()
            }
            GenBody::Recurse => {
                let site = pb.call_site();
                builder
                    .load(t, p, gen_field())
                    .invoke_virtual(site, Some(Local(3)), t, gen_method(), &[this])
                    .ret(Local(3))
                    .finish()
            }
        };
        pb.add_method(body);
    }

    let local = |i: u32| Local(i % GEN_LOCALS);
    let mut main = pb.method_static("Main", "main()");
    for stmt in stmts {
        main = match *stmt {
            GenStmt::New { dst, class } => {
                let site = pb.alloc_site(&gen_class(class % classes));
                main.new_object(local(dst), site)
            }
            GenStmt::Assign { dst, src } => main.assign(local(dst), local(src)),
            GenStmt::Store { base, src } => main.store(local(base), gen_field(), local(src)),
            GenStmt::Load { dst, base } => main.load(local(dst), local(base), gen_field()),
            GenStmt::Call { dst, base, arg } => {
                let site = pb.call_site();
                main.invoke_virtual(site, Some(local(dst)), local(base), gen_method(), &[local(arg)])
            }
        };
    }
    let main = main.finish();
    pb.add_method(main);

    Arc::new(pb.build())
}
