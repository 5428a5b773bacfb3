use std::sync::Arc;

use super::*;
use crate::graph::build::PrefabBuilder;
use crate::graph::catalog::ids;
use crate::graph::{Block, BlockId, Connection, Endpoint, GridPos, Prefab, Setting, TerminalKey};
use crate::syntax::{Entry, Input, NodeKind, SyntaxTerminal, Target};

fn single(prefab: Prefab) -> PrefabList {
    PrefabList::new(vec![prefab])
}

fn compile_one(prefab: Prefab) -> Result<Program> {
    compile(&single(prefab), 0, &CompileOptions::default())
}

fn named(name: &str) -> Vec<Setting> {
    vec![Setting::Text(name.to_string())]
}

fn root_positions(program: &Program) -> Vec<GridPos> {
    program
        .ast
        .roots
        .iter()
        .map(|r| program.ast.nodes[r.node.index()].pos)
        .collect()
}

// ─── Roots And Wiring ──────────────────────────────────────────────

#[test]
fn test_root_order_back_top_to_front_bottom() {
    let mut b = PrefabBuilder::new("level");
    b.place(ids::WIN, (0, 0, 0));
    b.place(ids::WIN, (0, 1, 0));
    b.place(ids::WIN, (0, 0, 2));
    let program = compile_one(b.build()).unwrap();
    assert_eq!(
        root_positions(&program),
        vec![
            GridPos::new(0, 0, 2),
            GridPos::new(0, 1, 0),
            GridPos::new(0, 0, 0),
        ]
    );
}

#[test]
fn test_stacked_blocks_wire_implicitly() {
    let mut b = PrefabBuilder::new("level");
    let back = b.place(ids::WIN, (0, 0, 1));
    let front = b.place(ids::LOSE, (0, 0, 0));
    let program = compile_one(b.build()).unwrap();
    assert_eq!(root_positions(&program), vec![back]);

    let ast = &program.ast;
    let first = &ast.nodes[ast.node_at(back).unwrap().index()];
    let front_id = ast.node_at(front).unwrap();
    assert_eq!(
        first.void_outputs[0].targets,
        vec![Target::Node(SyntaxTerminal::new(
            front_id,
            TerminalKey::new(3, 1, 7)
        ))]
    );
}

#[test]
fn test_fan_out_targets_are_spatially_ordered() {
    let mut b = PrefabBuilder::new("level");
    let play = b.place(ids::PLAY_SENSOR, (0, 0, 6));
    let low = b.place(ids::WIN, (4, 0, 0));
    let high = b.place(ids::LOSE, (4, 2, 0));
    b.wire(play, "On Play", low, "Before").unwrap();
    b.wire(play, "On Play", high, "Before").unwrap();
    let program = compile_one(b.build()).unwrap();
    let ast = &program.ast;
    let sensor = &ast.nodes[ast.node_at(play).unwrap().index()];
    let order: Vec<GridPos> = sensor.void_outputs[0]
        .targets
        .iter()
        .map(|t| match t {
            Target::Node(t) => ast.nodes[t.node.index()].pos,
            Target::Exit(_) => GridPos::default(),
        })
        .collect();
    assert_eq!(order, vec![high, low]);
}

#[test]
fn test_value_inputs_resolve_or_stay_disconnected() {
    let mut b = PrefabBuilder::new("level");
    let n = b.number(3.0, (0, 0, 4));
    let add = b.place(ids::ADD_NUMBERS, (2, 0, 2));
    b.wire(n, "Number", add, "Num2").unwrap();
    let program = compile_one(b.build()).unwrap();
    let ast = &program.ast;
    let node = &ast.nodes[ast.node_at(add).unwrap().index()];
    assert_eq!(node.input(0), Input::Disconnected);
    assert_eq!(
        node.input(1),
        Input::Wire(SyntaxTerminal::new(
            ast.node_at(n).unwrap(),
            TerminalKey::new(15, 1, 3)
        ))
    );
}

#[test]
fn test_unknown_builtin_is_scenery() {
    let mut prefab = Prefab::new("level");
    prefab.blocks.push(Block::new(BlockId(1), GridPos::new(0, 0, 0)));
    prefab.blocks.push(Block::new(ids::COMMENT, GridPos::new(1, 0, 0)));
    let program = compile_one(prefab).unwrap();
    assert!(program.ast.nodes.is_empty());
    assert!(program.ast.roots.is_empty());
}

// ─── Structural Errors ─────────────────────────────────────────────

#[test]
fn test_duplicate_block() {
    let mut b = PrefabBuilder::new("level");
    b.place(ids::WIN, (0, 0, 0));
    b.place(ids::LOSE, (0, 0, 0));
    assert_eq!(
        compile_one(b.build()).unwrap_err(),
        CompileError::DuplicateBlock {
            prefab: "level".into(),
            pos: GridPos::new(0, 0, 0),
        }
    );
}

#[test]
fn test_dangling_terminal() {
    let mut b = PrefabBuilder::new("level");
    let win = b.place(ids::WIN, (0, 0, 0));
    let mut prefab = b.build();
    let nowhere = Endpoint::new(GridPos::new(5, 5, 5), TerminalKey::new(3, 1, 7));
    prefab
        .connections
        .push(Connection::new(Endpoint::new(win, TerminalKey::new(3, 1, 0)), nowhere));
    assert!(matches!(
        compile_one(prefab),
        Err(CompileError::DanglingTerminal { endpoint, .. }) if endpoint == nowhere
    ));
}

#[test]
fn test_wire_between_two_outputs() {
    let mut b = PrefabBuilder::new("level");
    let a = b.number(1.0, (0, 0, 0));
    let c = b.number(2.0, (2, 0, 0));
    b.wire(a, "Number", c, "Number").unwrap();
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::WireMismatch { reason, .. }) if reason == "both ends are outputs"
    ));
}

#[test]
fn test_wire_kind_mismatch() {
    let mut b = PrefabBuilder::new("level");
    let n = b.number(1.0, (0, 0, 2));
    let inspect = b.place(ids::INSPECT_VECTOR, (2, 0, 0));
    b.wire(n, "Number", inspect, "Vector").unwrap();
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::WireMismatch { .. })
    ));
}

#[test]
fn test_value_into_pointer_input_is_rejected() {
    let mut b = PrefabBuilder::new("level");
    let n = b.number(1.0, (0, 0, 2));
    let inc = b.place(ids::INCREMENT, (2, 0, 0));
    b.wire(n, "Number", inc, "Variable").unwrap();
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::WireMismatch { .. })
    ));
}

#[test]
fn test_two_producers_into_one_input() {
    let mut b = PrefabBuilder::new("level");
    let a = b.number(1.0, (0, 0, 4));
    let c = b.number(2.0, (0, 0, 6));
    let inspect = b.place(ids::INSPECT_NUMBER, (2, 0, 0));
    b.wire(a, "Number", inspect, "Number").unwrap();
    b.wire(c, "Number", inspect, "Number").unwrap();
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::AmbiguousInput { count: 2, terminal, .. }) if terminal == "Number"
    ));
}

#[test]
fn test_value_cycle() {
    let mut b = PrefabBuilder::new("level");
    let x = b.place(ids::ADD_NUMBERS, (0, 0, 4));
    let y = b.place(ids::ADD_NUMBERS, (4, 0, 4));
    b.wire(x, "Sum", y, "Num1").unwrap();
    b.wire(y, "Sum", x, "Num1").unwrap();
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::ValueCycle { .. })
    ));
}

// ─── Goto And Label ────────────────────────────────────────────────

#[test]
fn test_goto_binds_to_label() {
    let mut b = PrefabBuilder::new("level");
    let label = b.place_with(ids::LABEL, (0, 0, 6), named("top"));
    let goto = b.place_with(ids::GOTO, (0, 0, 0), named("top"));
    let program = compile_one(b.build()).unwrap();
    let ast = &program.ast;
    let node = &ast.nodes[ast.node_at(goto).unwrap().index()];
    assert_eq!(
        node.kind,
        NodeKind::Goto {
            label: "top".into(),
            target: ast.node_at(label),
        }
    );
}

#[test]
fn test_unresolved_goto() {
    let mut b = PrefabBuilder::new("level");
    b.place_with(ids::GOTO, (0, 0, 0), named("missing"));
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::UnresolvedGoto { label, .. }) if label == "missing"
    ));
}

#[test]
fn test_ambiguous_label() {
    let mut b = PrefabBuilder::new("level");
    b.place_with(ids::LABEL, (0, 0, 6), named("x"));
    b.place_with(ids::LABEL, (4, 0, 6), named("x"));
    b.place_with(ids::GOTO, (0, 0, 0), named("x"));
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::AmbiguousLabel { positions, .. }) if positions.len() == 2
    ));
}

#[test]
fn test_goto_recursion_reports_first_label() {
    let mut b = PrefabBuilder::new("level");
    let label_a = b.place_with(ids::LABEL, (0, 0, 6), named("a"));
    let goto_b = b.place_with(ids::GOTO, (2, 0, 6), named("b"));
    let label_b = b.place_with(ids::LABEL, (0, 0, 3), named("b"));
    let goto_a = b.place_with(ids::GOTO, (2, 0, 3), named("a"));
    b.wire(label_a, "After", goto_b, "Before").unwrap();
    b.wire(label_b, "After", goto_a, "Before").unwrap();
    assert_eq!(
        compile_one(b.build()).unwrap_err(),
        CompileError::GotoRecursion {
            prefab: "level".into(),
            first: "b".into(),
            chain: vec!["b".into(), "a".into()],
        }
    );
}

#[test]
fn test_goto_recursion_after_lead_in() {
    let mut b = PrefabBuilder::new("level");
    b.place_with(ids::GOTO, (0, 0, 12), named("a"));
    let label_a = b.place_with(ids::LABEL, (0, 0, 9), named("a"));
    let goto_b = b.place_with(ids::GOTO, (2, 0, 9), named("b"));
    let label_b = b.place_with(ids::LABEL, (0, 0, 6), named("b"));
    let again = b.place_with(ids::GOTO, (2, 0, 6), named("b"));
    b.wire(label_a, "After", goto_b, "Before").unwrap();
    b.wire(label_b, "After", again, "Before").unwrap();
    assert_eq!(
        compile_one(b.build()).unwrap_err(),
        CompileError::GotoRecursion {
            prefab: "level".into(),
            first: "b".into(),
            chain: vec!["a".into(), "b".into()],
        }
    );
}

#[test]
fn test_goto_fan_out_chain_compiles() {
    // Each label jumps twice to the next one, so the label graph has
    // 2^depth paths but no loop.
    let depth: i16 = 30;
    let mut b = PrefabBuilder::new("level");
    b.place_with(ids::GOTO, (0, 0, 4 * depth + 4), named("l0"));
    for i in 0..depth {
        let z = 4 * (depth - i);
        let label = b.place_with(ids::LABEL, (0, 0, z), named(&format!("l{}", i)));
        let next = named(&format!("l{}", i + 1));
        let left = b.place_with(ids::GOTO, (4, 0, z), next.clone());
        let right = b.place_with(ids::GOTO, (8, 0, z), next);
        b.wire(label, "After", left, "Before").unwrap();
        b.wire(label, "After", right, "Before").unwrap();
    }
    b.place_with(ids::LABEL, (0, 0, 0), named(&format!("l{}", depth)));
    let program = compile_one(b.build()).unwrap();
    assert!(program.warnings.is_empty());
}

#[test]
fn test_labels_are_roots() {
    let mut b = PrefabBuilder::new("level");
    let label = b.place_with(ids::LABEL, (0, 0, 4), named("start"));
    let win = b.place(ids::WIN, (4, 0, 0));
    b.wire(label, "After", win, "Before").unwrap();
    let program = compile_one(b.build()).unwrap();
    let ast = &program.ast;
    assert_eq!(ast.roots.len(), 1);
    assert_eq!(ast.roots[0].node, ast.node_at(label).unwrap());
    assert_eq!(ast.roots[0].entry, Entry::Frame);
}

#[test]
fn test_unreferenced_duplicate_label_warns() {
    let mut b = PrefabBuilder::new("level");
    b.place_with(ids::LABEL, (0, 0, 6), named("x"));
    b.place_with(ids::LABEL, (4, 0, 6), named("x"));
    b.place_with(ids::LABEL, (0, 0, 0), named("y"));
    let program = compile_one(b.build()).unwrap();
    assert_eq!(
        program.warnings,
        vec![CompileWarning::DuplicateLabel {
            prefab: "level".into(),
            label: "x".into(),
            positions: vec![GridPos::new(0, 0, 6), GridPos::new(4, 0, 6)],
        }]
    );
}

#[test]
fn test_goto_through_statement_is_not_recursion() {
    let mut b = PrefabBuilder::new("level");
    let label = b.place_with(ids::LABEL, (0, 0, 6), named("a"));
    let win = b.place(ids::WIN, (0, 0, 3));
    let goto = b.place_with(ids::GOTO, (0, 0, 0), named("a"));
    b.wire(label, "After", win, "Before").unwrap();
    b.wire(win, "After", goto, "Before").unwrap();
    assert!(compile_one(b.build()).is_ok());
}

// ─── Nested Programs ───────────────────────────────────────────────

fn statement_prefab(name: &str) -> Prefab {
    let mut b = PrefabBuilder::new(name);
    let win = b.place(ids::WIN, (0, 0, 0));
    b.port("Before", win, "Before").unwrap();
    b.port("After", win, "After").unwrap();
    b.build()
}

#[test]
fn test_nested_program_is_compiled_once() {
    let inner = statement_prefab("inner");
    let mut b = PrefabBuilder::new("level");
    let id = BlockId(crate::graph::DEFAULT_BUILTIN_THRESHOLD + 1);
    let first = b.place_custom(id, (0, 0, 4), &inner);
    let second = b.place_custom(id, (0, 0, 0), &inner);
    let list = PrefabList::new(vec![b.build(), inner]);
    let program = compile(&list, 0, &CompileOptions::default()).unwrap();
    let ast = &program.ast;
    let nested = |pos| match &ast.nodes[ast.node_at(pos).unwrap().index()].kind {
        NodeKind::Custom { ast, .. } => Arc::clone(ast),
        other => panic!("not custom: {:?}", other),
    };
    assert!(Arc::ptr_eq(&nested(first), &nested(second)));
    assert_eq!(ast.height, 1);
    assert_eq!(nested(first).void_inputs.len(), 1);
    // Both custom blocks are unwired statements.
    assert_eq!(root_positions(&program), vec![first, second]);
}

#[test]
fn test_custom_block_with_inner_roots_gets_frame_root() {
    let mut inner = PrefabBuilder::new("inner");
    inner.place(ids::WIN, (0, 0, 0));
    let inner = inner.build();
    let mut b = PrefabBuilder::new("level");
    let id = BlockId(crate::graph::DEFAULT_BUILTIN_THRESHOLD + 1);
    b.place_custom(id, (0, 0, 0), &inner);
    let list = PrefabList::new(vec![b.build(), inner]);
    let program = compile(&list, 0, &CompileOptions::default()).unwrap();
    assert_eq!(program.ast.roots.len(), 1);
    assert_eq!(program.ast.roots[0].entry, Entry::Frame);
}

#[test]
fn test_self_nesting_fails() {
    let mut b = PrefabBuilder::new("loop");
    b.place(
        BlockId(crate::graph::DEFAULT_BUILTIN_THRESHOLD),
        (0, 0, 0),
    );
    let list = single(b.build());
    assert_eq!(
        compile(&list, 0, &CompileOptions::default()).unwrap_err(),
        CompileError::NestingTooDeep {
            chain: vec!["loop".into(), "loop".into()],
            limit: 32,
        }
    );
}

#[test]
fn test_nesting_limit() {
    let threshold = crate::graph::DEFAULT_BUILTIN_THRESHOLD;
    // p0 > p1 > p2 > p3
    let mut prefabs = Vec::new();
    for i in 0..4u16 {
        let mut b = PrefabBuilder::new(format!("p{i}"));
        if i < 3 {
            b.place(BlockId(threshold + i + 1), (0, 0, 0));
        } else {
            b.place(ids::WIN, (0, 0, 0));
        }
        prefabs.push(b.build());
    }
    let list = PrefabList::new(prefabs);
    let shallow = CompileOptions {
        max_nesting_depth: 2,
    };
    assert!(matches!(
        compile(&list, 0, &shallow),
        Err(CompileError::NestingTooDeep { limit: 2, .. })
    ));
    let deep = CompileOptions {
        max_nesting_depth: 3,
    };
    assert_eq!(compile(&list, 0, &deep).unwrap().ast.height, 3);
    // Cached subtrees are checked against the depth they are used at.
    assert!(compile_many(&list, &[1, 2], &shallow).iter().all(Result::is_ok));
}

#[test]
fn test_unknown_custom_prefab() {
    let mut b = PrefabBuilder::new("level");
    b.place(BlockId(crate::graph::DEFAULT_BUILTIN_THRESHOLD + 9), (0, 0, 0));
    assert!(matches!(
        compile_one(b.build()),
        Err(CompileError::UnknownPrefab { index: 9, block: Some(_) })
    ));
    assert!(matches!(
        compile(&PrefabList::default(), 0, &CompileOptions::default()),
        Err(CompileError::UnknownPrefab { index: 0, block: None })
    ));
}

// ─── Determinism ───────────────────────────────────────────────────

#[test]
fn test_compilation_is_deterministic() {
    let build = |reverse: bool| {
        let mut b = PrefabBuilder::new("level");
        let play = b.place(ids::PLAY_SENSOR, (0, 0, 6));
        let set = b.place_with(ids::SET_VARIABLE_NUMBER, (0, 0, 3), named("x"));
        let n = b.number(5.0, (-2, 0, 3));
        b.wire(play, "On Play", set, "Before").unwrap();
        b.wire(n, "Number", set, "Value").unwrap();
        b.place(ids::WIN, (4, 0, 0));
        let mut prefab = b.build();
        if reverse {
            prefab.blocks.reverse();
            prefab.connections.reverse();
        }
        prefab
    };
    let a = compile_one(build(false)).unwrap();
    let b = compile_one(build(true)).unwrap();
    assert_eq!(a.ast, b.ast);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.variable("x", SignalKind::Number), Some(VariableId(0)));
}
