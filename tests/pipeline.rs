use std::collections::BTreeMap;

use voxscript::diagnostic::Diagnostic;
use voxscript::error::PhysicsError;
use voxscript::graph::build::PrefabBuilder;
use voxscript::graph::catalog::ids;
use voxscript::graph::listing::Listing;
use voxscript::graph::{BlockId, GridPos, DEFAULT_BUILTIN_THRESHOLD};
use voxscript::math::Vec3;
use voxscript::runtime::{Effect, RayHit};
use voxscript::signal::{RuntimeValue, VariableReference};
use voxscript::{
    compile, compile_many, run_frame, CompileError, CompileOptions, Limits, Prefab, PrefabList,
    RuntimeContext, RuntimeError, SimContext,
};

/// Play sensor wired into an inspect of a literal 4.
fn play_inspect() -> Prefab {
    let mut b = PrefabBuilder::new("level");
    let play = b.place(ids::PLAY_SENSOR, (0, 0, 3));
    let four = b.number(4.0, (-2, 0, 0));
    let inspect = b.place(ids::INSPECT_NUMBER, (0, 0, 0));
    b.wire(play, "On Play", inspect, "Before").unwrap();
    b.wire(four, "Number", inspect, "Number").unwrap();
    b.build()
}

fn compile_entry(prefabs: Vec<Prefab>) -> voxscript::Program {
    compile(&PrefabList::new(prefabs), 0, &CompileOptions::default()).unwrap()
}

// ── compile ──

#[test]
fn test_program_dump() {
    let program = compile_entry(vec![play_inspect()]);
    insta::assert_snapshot!(program.dump().trim_end(), @r###"
    prefab level
      roots n0<3,1,7>
      n0 #238 (0, 0, 3) Play
        out <15,1,3> -> n2<3,1,7>
      n1 #36 (-2, 0, 0) literal 4
      n2 #16 (0, 0, 0) Inspect number
        in <0,1,3> number <- n1<15,1,3>
    "###);
}

#[test]
fn test_json_program_compiles_to_same_fingerprint() {
    let list = PrefabList::new(vec![play_inspect()]);
    let json = serde_json::to_string(&list).unwrap();
    let loaded: PrefabList = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, list);

    let options = CompileOptions::default();
    let a = compile(&list, 0, &options).unwrap();
    let b = compile(&loaded, 0, &options).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_compile_many_matches_sequential() {
    let mut other = PrefabBuilder::new("other");
    other.place(ids::WIN, (0, 0, 0));
    let list = PrefabList::new(vec![play_inspect(), other.build()]);
    let options = CompileOptions::default();

    let parallel = compile_many(&list, &[0, 1], &options);
    for (entry, result) in parallel.into_iter().enumerate() {
        let sequential = compile(&list, entry, &options).unwrap();
        assert_eq!(result.unwrap().fingerprint(), sequential.fingerprint());
    }
}

#[test]
fn test_self_nesting_fails_at_compile_time() {
    let mut b = PrefabBuilder::new("loop");
    b.place(BlockId(DEFAULT_BUILTIN_THRESHOLD), (0, 0, 0));
    let err = compile(
        &PrefabList::new(vec![b.build()]),
        0,
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::NestingTooDeep { .. }));
}

#[test]
fn test_compile_error_diagnostic_names_block_line() {
    let mut b = PrefabBuilder::new("level");
    b.place(ids::WIN, (1, 0, 1));
    b.place(ids::LOSE, (1, 0, 1));
    let list = PrefabList::new(vec![b.build()]);
    let err = compile(&list, 0, &CompileOptions::default()).unwrap_err();

    let listing = Listing::of(&list, &list.prefabs[0]);
    let diagnostic = Diagnostic::from_compile(&err, &listing);
    let mut out = Vec::new();
    diagnostic
        .write_to(&listing.name, &listing.text, &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("two blocks at (1, 0, 1) in `level`"));
    assert!(text.contains("move one of the blocks"));
}

// ── run ──

#[test]
fn test_inspects_on_first_frame_only() {
    let program = compile_entry(vec![play_inspect()]);
    let mut ctx = SimContext::new(1);
    let limits = Limits::default();
    for _ in 0..3 {
        run_frame(&program, &mut ctx, &limits).unwrap();
        ctx.next_frame();
    }
    assert_eq!(ctx.inspections.len(), 1);
    assert_eq!(ctx.inspections[0].frame, 0);
    assert_eq!(ctx.inspections[0].value, RuntimeValue::Number(4.0));
    assert_eq!(ctx.inspections[0].block.pos, GridPos::new(0, 0, 0));
}

#[test]
fn test_statement_free_program_is_idempotent() {
    let mut b = PrefabBuilder::new("scenery");
    b.number(1.0, (0, 0, 0));
    b.place(ids::COMMENT, (2, 0, 0));
    let program = compile_entry(vec![b.build()]);

    let mut ctx = SimContext::new(9);
    let before = ctx.clone();
    for _ in 0..5 {
        let report = run_frame(&program, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(report.steps, 0);
    }
    assert_eq!(ctx, before);
}

#[test]
fn test_zero_over_zero_names_vector_block() {
    let mut b = PrefabBuilder::new("level");
    let zero = b.number(0.0, (-6, 0, 8));
    let div = b.place(ids::DIVIDE, (-4, 0, 8));
    let make = b.place(ids::MAKE_VECTOR, (-2, 0, 8));
    let inspect = b.place(ids::INSPECT_VECTOR, (0, 0, 8));
    b.wire(zero, "Number", div, "Num1").unwrap();
    b.wire(zero, "Number", div, "Num2").unwrap();
    b.wire(div, "Quotient", make, "X").unwrap();
    b.wire(make, "Vector", inspect, "Vector").unwrap();
    let program = compile_entry(vec![b.build()]);

    let err = run_frame(&program, &mut SimContext::default(), &Limits::default()).unwrap_err();
    let RuntimeError::NonFinite { block } = err else {
        panic!("expected NonFinite, got {err:?}");
    };
    assert_eq!(block.id, ids::MAKE_VECTOR);
    assert_eq!(block.prefab, "level");
}

#[test]
fn test_nested_win_then_parent_lose() {
    let mut inner = PrefabBuilder::new("inner");
    let win = inner.place(ids::WIN, (0, 0, 0));
    inner.port("Before", win, "Before").unwrap();
    inner.port("After", win, "After").unwrap();
    let inner = inner.build();

    let mut b = PrefabBuilder::new("level");
    let custom = b.place_custom(BlockId(DEFAULT_BUILTIN_THRESHOLD + 1), (0, 0, 4), &inner);
    let lose = b.place(ids::LOSE, (0, 0, 0));
    b.wire(custom, "After", lose, "Before").unwrap();
    let program = compile_entry(vec![b.build(), inner]);

    let mut ctx = SimContext::default();
    run_frame(&program, &mut ctx, &Limits::default()).unwrap();
    assert_eq!(
        ctx.effects,
        vec![Effect::Win { delay: 0 }, Effect::Lose { delay: 0 }]
    );
}

/// A host whose physics backend always gives up.
#[derive(Default)]
struct BrokenPhysics {
    variables: BTreeMap<VariableReference, RuntimeValue>,
}

impl RuntimeContext for BrokenPhysics {
    fn frame(&self) -> u64 {
        0
    }

    fn get_variable(&self, reference: VariableReference) -> Option<RuntimeValue> {
        self.variables.get(&reference).copied()
    }

    fn set_variable(&mut self, reference: VariableReference, value: RuntimeValue) {
        self.variables.insert(reference, value);
    }

    fn raycast(&self, _from: Vec3, _to: Vec3) -> Result<Option<RayHit>, PhysicsError> {
        Err(PhysicsError::GeometryTooComplex)
    }
}

#[test]
fn test_physics_failure_aborts_frame() {
    let mut b = PrefabBuilder::new("level");
    let ray = b.place(ids::RAYCAST, (-2, 0, 0));
    let inspect = b.place(ids::INSPECT_BOOL, (0, 0, 0));
    b.wire(ray, "Hit", inspect, "Truth").unwrap();
    let program = compile_entry(vec![b.build()]);

    let err = run_frame(&program, &mut BrokenPhysics::default(), &Limits::default()).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Physics {
            block: voxscript::error::BlockRef::new("level", ids::RAYCAST, ray),
            source: PhysicsError::GeometryTooComplex,
        }
    );
}
