//! Per-frame interpreter.
//!
//! Statements run eagerly from an explicit LIFO work list: executing a
//! statement yields [`Flow`]s, which are pushed in reverse so the first
//! one (a branch, a loop body) finishes before the next (the after
//! wire). Values are pulled lazily, recursing along input wires.
//!
//! Every entry into a nested program runs in a scope identified by the
//! path of custom nodes leading to it. Node memory (loop counters, sensor
//! outputs, created objects, sound channels) lives per (scope, node) and
//! is dropped when the frame ends.

pub mod context;
pub mod sim;

mod eval;
mod exec;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::compile::Program;
use crate::config::Limits;
use crate::error::{BlockRef, RuntimeError};
use crate::graph::TerminalKey;
use crate::signal::RuntimeValue;
use crate::syntax::{Ast, Entry, NodeId, SyntaxNode, Target};

pub use context::{Contact, RayHit, RuntimeContext};
pub use sim::{Effect, InputState, Inspection, SimContext, SimObject};

/// Outcome of a completed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Statements executed.
    pub steps: u64,
}

/// Run one frame of `program` against `ctx`.
///
/// Effects issued before an error stand; nothing is rolled back.
pub fn run_frame<C: RuntimeContext>(
    program: &Program,
    ctx: &mut C,
    limits: &Limits,
) -> Result<FrameReport, RuntimeError> {
    let mut engine = Engine::new(Arc::clone(&program.ast), ctx, limits);
    engine.run()?;
    Ok(FrameReport {
        steps: engine.steps,
    })
}

// ─── Flow ──────────────────────────────────────────────────────────

/// Where execution goes after a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Follow this void output.
    Out(TerminalKey),
    /// Execute this node again (next loop iteration).
    Resume,
    /// Continue at a label.
    Jump(NodeId),
    /// Enter the nested program of this custom node.
    Descend(Entry),
}

#[derive(Clone, Copy, Debug)]
enum Task {
    Run(ScopeId, NodeId, Entry),
    Resume(ScopeId, NodeId),
}

// ─── Scopes ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ScopeId(usize);

impl ScopeId {
    const ROOT: ScopeId = ScopeId(0);
}

struct Scope {
    ast: Arc<Ast>,
    /// The custom node this scope was entered through, in its scope.
    parent: Option<(ScopeId, NodeId)>,
    depth: usize,
}

/// Loop progress for one loop node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopState {
    next: i32,
    stop: i32,
    step: i32,
}

pub(crate) struct Engine<'c, C> {
    ctx: &'c mut C,
    limits: &'c Limits,
    scopes: Vec<Scope>,
    children: BTreeMap<(ScopeId, NodeId), ScopeId>,
    /// Memorized output values, by output index.
    memory: BTreeMap<(ScopeId, NodeId), Vec<RuntimeValue>>,
    loops: BTreeMap<(ScopeId, NodeId), LoopState>,
    steps: u64,
}

impl<'c, C: RuntimeContext> Engine<'c, C> {
    fn new(ast: Arc<Ast>, ctx: &'c mut C, limits: &'c Limits) -> Self {
        Self {
            ctx,
            limits,
            scopes: vec![Scope {
                ast,
                parent: None,
                depth: 0,
            }],
            children: BTreeMap::new(),
            memory: BTreeMap::new(),
            loops: BTreeMap::new(),
            steps: 0,
        }
    }

    fn ast(&self, scope: ScopeId) -> Arc<Ast> {
        Arc::clone(&self.scopes[scope.0].ast)
    }

    pub(crate) fn block_ref(&self, scope: ScopeId, node: &SyntaxNode) -> BlockRef {
        BlockRef::new(&self.scopes[scope.0].ast.prefab, node.block, node.pos)
    }

    pub(crate) fn block_at(&self, scope: ScopeId, node: NodeId) -> BlockRef {
        self.block_ref(scope, &self.scopes[scope.0].ast.nodes[node.index()])
    }

    fn parent(&self, scope: ScopeId) -> Option<(ScopeId, NodeId)> {
        self.scopes[scope.0].parent
    }

    /// The scope of the nested program behind custom node `node`.
    pub(crate) fn child(&mut self, scope: ScopeId, node: NodeId) -> Result<ScopeId, RuntimeError> {
        if let Some(&child) = self.children.get(&(scope, node)) {
            return Ok(child);
        }
        let ast = self.ast(scope);
        let custom = &ast.nodes[node.index()];
        let crate::syntax::NodeKind::Custom { ast: nested, .. } = &custom.kind else {
            return Err(RuntimeError::InvalidTerminal {
                block: self.block_ref(scope, custom),
                key: TerminalKey::default(),
            });
        };
        let depth = self.scopes[scope.0].depth + 1;
        if depth > self.limits.max_call_depth {
            return Err(RuntimeError::DepthExceeded {
                block: self.block_ref(scope, custom),
                depth,
                limit: self.limits.max_call_depth,
            });
        }
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            ast: Arc::clone(nested),
            parent: Some((scope, node)),
            depth,
        });
        self.children.insert((scope, node), id);
        Ok(id)
    }

    pub(crate) fn remembered(&self, scope: ScopeId, node: NodeId, index: usize) -> Option<RuntimeValue> {
        self.memory
            .get(&(scope, node))
            .and_then(|values| values.get(index))
            .copied()
    }

    pub(crate) fn remember(&mut self, scope: ScopeId, node: NodeId, values: Vec<RuntimeValue>) {
        self.memory.insert((scope, node), values);
    }

    // ─── Work List ─────────────────────────────────────────────────

    fn run(&mut self) -> Result<(), RuntimeError> {
        let ast = self.ast(ScopeId::ROOT);
        let mut work: Vec<Task> = ast
            .roots
            .iter()
            .rev()
            .map(|root| Task::Run(ScopeId::ROOT, root.node, root.entry))
            .collect();

        while let Some(task) = work.pop() {
            let (scope, node, flows) = match task {
                Task::Run(scope, node, entry) => {
                    self.step(scope, node)?;
                    (scope, node, self.execute(scope, node, entry)?)
                }
                Task::Resume(scope, node) => {
                    self.step(scope, node)?;
                    (scope, node, self.resume(scope, node)?)
                }
            };
            let mut next = Vec::new();
            for flow in flows {
                self.expand(scope, node, flow, &mut next)?;
            }
            work.extend(next.into_iter().rev());
        }
        Ok(())
    }

    fn step(&mut self, scope: ScopeId, node: NodeId) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            warn!(
                steps = self.steps,
                budget = self.limits.max_steps,
                "frame aborted on step budget"
            );
            return Err(RuntimeError::Timeout {
                steps: self.steps,
                budget: self.limits.max_steps,
            });
        }
        if tracing::enabled!(tracing::Level::TRACE) {
            let ast = self.ast(scope);
            let n = &ast.nodes[node.index()];
            trace!(prefab = %ast.prefab, pos = %n.pos, node = %n.kind.name(), "execute");
        }
        Ok(())
    }

    /// Turn one flow into tasks, in the order they should run.
    fn expand(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        flow: Flow,
        out: &mut Vec<Task>,
    ) -> Result<(), RuntimeError> {
        match flow {
            Flow::Out(key) => self.follow(scope, node, key, out),
            Flow::Resume => {
                out.push(Task::Resume(scope, node));
                Ok(())
            }
            Flow::Jump(label) => {
                out.push(Task::Run(scope, label, Entry::Frame));
                Ok(())
            }
            Flow::Descend(entry) => {
                let child = self.child(scope, node)?;
                let nested = self.ast(child);
                match entry {
                    Entry::Enter(outer) => {
                        if let Some(inner) = nested.void_input(outer) {
                            out.push(Task::Run(child, inner.node, Entry::Enter(inner.key)));
                        }
                    }
                    Entry::Frame => out.extend(
                        nested
                            .roots
                            .iter()
                            .map(|root| Task::Run(child, root.node, root.entry)),
                    ),
                }
                Ok(())
            }
        }
    }

    /// Targets of void output `key`; exits continue from the enclosing
    /// custom block in the parent scope.
    fn follow(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        key: TerminalKey,
        out: &mut Vec<Task>,
    ) -> Result<(), RuntimeError> {
        let ast = self.ast(scope);
        let n = &ast.nodes[node.index()];
        let Some(output) = n.void_outputs.iter().find(|o| o.key == key) else {
            return Err(RuntimeError::InvalidTerminal {
                block: self.block_ref(scope, n),
                key,
            });
        };
        for target in &output.targets {
            match *target {
                Target::Node(t) => out.push(Task::Run(scope, t.node, Entry::Enter(t.key))),
                Target::Exit(outer) => {
                    if let Some((parent, custom)) = self.parent(scope) {
                        self.follow(parent, custom, outer, out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, CompileOptions};
    use crate::graph::build::PrefabBuilder;
    use crate::graph::catalog::ids;
    use crate::graph::{BlockId, Prefab, PrefabList, Setting, DEFAULT_BUILTIN_THRESHOLD};
    use crate::math::Vec3;

    fn program(prefabs: Vec<Prefab>) -> Program {
        compile(&PrefabList::new(prefabs), 0, &CompileOptions::default()).unwrap()
    }

    fn inspected(ctx: &SimContext) -> Vec<RuntimeValue> {
        ctx.inspections.iter().map(|i| i.value).collect()
    }

    fn num(n: f32) -> RuntimeValue {
        RuntimeValue::Number(n)
    }

    #[test]
    fn test_empty_frame_takes_no_steps() {
        let p = program(vec![Prefab::new("level")]);
        let mut ctx = SimContext::new(3);
        let before = ctx.clone();
        let report = run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_if_runs_branch_before_after() {
        let mut b = PrefabBuilder::new("level");
        let branch = b.place(ids::IF, (0, 0, 8));
        let cond = b.place(ids::TRUE, (-2, 0, 8));
        let yes = b.place(ids::INSPECT_NUMBER, (4, 0, 4));
        let one = b.number(1.0, (2, 0, 4));
        let after = b.place(ids::INSPECT_NUMBER, (0, 0, 0));
        let two = b.number(2.0, (-2, 0, 0));
        b.wire(cond, "True", branch, "Condition").unwrap();
        b.wire(branch, "True", yes, "Before").unwrap();
        b.wire(one, "Number", yes, "Number").unwrap();
        b.wire(branch, "After", after, "Before").unwrap();
        b.wire(two, "Number", after, "Number").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        let report = run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(1.0), num(2.0)]);
        assert_eq!(report.steps, 3);
    }

    fn counting_loop(start: f32, stop: f32) -> Prefab {
        let mut b = PrefabBuilder::new("level");
        let l = b.place(ids::LOOP, (0, 0, 8));
        let s = b.number(start, (-2, 0, 9));
        let e = b.number(stop, (-2, 0, 8));
        let body = b.place(ids::INSPECT_NUMBER, (4, 0, 4));
        b.wire(s, "Number", l, "Start").unwrap();
        b.wire(e, "Number", l, "Stop").unwrap();
        b.wire(l, "Do", body, "Before").unwrap();
        b.wire(l, "Counter", body, "Number").unwrap();
        b.build()
    }

    #[test]
    fn test_loop_counts_up_exclusive() {
        let p = program(vec![counting_loop(0.4, 3.0)]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(0.0), num(1.0), num(2.0)]);
    }

    #[test]
    fn test_loop_counts_down() {
        let p = program(vec![counting_loop(2.0, -1.0)]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(2.0), num(1.0), num(0.0)]);
    }

    #[test]
    fn test_step_budget_keeps_earlier_effects() {
        let p = program(vec![counting_loop(0.0, 1_000_000.0)]);
        let mut ctx = SimContext::default();
        let limits = Limits {
            max_steps: 10,
            ..Limits::default()
        };
        let err = run_frame(&p, &mut ctx, &limits).unwrap_err();
        assert_eq!(err, RuntimeError::Timeout { steps: 11, budget: 10 });
        assert!(!ctx.inspections.is_empty());
    }

    #[test]
    fn test_play_sensor_fires_on_first_frame_only() {
        let mut b = PrefabBuilder::new("level");
        let play = b.place(ids::PLAY_SENSOR, (0, 0, 4));
        let win = b.place(ids::WIN, (4, 0, 0));
        b.wire(play, "On Play", win, "Before").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        ctx.next_frame();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(ctx.effects, vec![Effect::Win { delay: 0 }]);
    }

    #[test]
    fn test_variables_and_increment() {
        let mut b = PrefabBuilder::new("level");
        let name = vec![Setting::Text("hits".into())];
        let set = b.place_with(ids::SET_VARIABLE_NUMBER, (0, 0, 8), name.clone());
        let five = b.number(5.0, (-2, 0, 8));
        let inc = b.place(ids::INCREMENT, (0, 0, 4));
        let get = b.place_with(ids::VARIABLE_NUMBER, (-2, 0, 4), name);
        b.wire(five, "Number", set, "Value").unwrap();
        b.wire(set, "After", inc, "Before").unwrap();
        b.wire(get, "Number", inc, "Variable").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        let hits = p.variable("hits", crate::signal::SignalKind::Number).unwrap();
        assert_eq!(
            ctx.get_variable(crate::signal::VariableReference::new(hits)),
            Some(num(6.0))
        );
    }

    #[test]
    fn test_nan_into_make_vector_is_non_finite() {
        let mut b = PrefabBuilder::new("level");
        let zero = b.number(0.0, (-6, 0, 8));
        let div = b.place(ids::DIVIDE, (-4, 0, 8));
        let make = b.place(ids::MAKE_VECTOR, (-2, 0, 8));
        let inspect = b.place(ids::INSPECT_VECTOR, (0, 0, 8));
        b.wire(zero, "Number", div, "Num1").unwrap();
        b.wire(zero, "Number", div, "Num2").unwrap();
        b.wire(div, "Quotient", make, "X").unwrap();
        b.wire(make, "Vector", inspect, "Vector").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        let err = run_frame(&p, &mut ctx, &Limits::default()).unwrap_err();
        let RuntimeError::NonFinite { block } = err else {
            panic!("expected NonFinite, got {err:?}");
        };
        assert_eq!(block.id, ids::MAKE_VECTOR);
        assert_eq!(block.pos, make);
        assert!(ctx.inspections.is_empty());
    }

    #[test]
    fn test_custom_block_exit_continues_in_parent() {
        let mut inner = PrefabBuilder::new("inner");
        let win = inner.place(ids::WIN, (0, 0, 0));
        inner.port("Before", win, "Before").unwrap();
        inner.port("After", win, "After").unwrap();
        let inner = inner.build();

        let mut b = PrefabBuilder::new("level");
        let custom = b.place_custom(BlockId(DEFAULT_BUILTIN_THRESHOLD + 1), (0, 0, 4), &inner);
        let lose = b.place(ids::LOSE, (0, 0, 0));
        b.wire(custom, "After", lose, "Before").unwrap();
        let p = program(vec![b.build(), inner]);
        let mut ctx = SimContext::default();
        let report = run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(
            ctx.effects,
            vec![Effect::Win { delay: 0 }, Effect::Lose { delay: 0 }]
        );
        assert_eq!(report.steps, 3);
    }

    #[test]
    fn test_custom_value_ports() {
        // inner: Sum = A + 1
        let mut inner = PrefabBuilder::new("plus_one");
        let add = inner.place(ids::ADD_NUMBERS, (0, 0, 0));
        let one = inner.number(1.0, (-2, 0, 0));
        inner.wire(one, "Number", add, "Num2").unwrap();
        inner.port("A", add, "Num1").unwrap();
        inner.port("Sum", add, "Sum").unwrap();
        let inner = inner.build();

        let mut b = PrefabBuilder::new("level");
        let seven = b.number(7.0, (-2, 0, 4));
        let custom = b.place_custom(BlockId(DEFAULT_BUILTIN_THRESHOLD + 1), (0, 0, 4), &inner);
        let inspect = b.place(ids::INSPECT_NUMBER, (4, 0, 4));
        b.wire(seven, "Number", custom, "A").unwrap();
        b.wire(custom, "Sum", inspect, "Number").unwrap();
        let p = program(vec![b.build(), inner]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(8.0)]);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut leaf = PrefabBuilder::new("leaf");
        leaf.place(ids::WIN, (0, 0, 0));
        let mut mid = PrefabBuilder::new("mid");
        mid.place(BlockId(DEFAULT_BUILTIN_THRESHOLD + 2), (0, 0, 0));
        let mut top = PrefabBuilder::new("top");
        top.place(BlockId(DEFAULT_BUILTIN_THRESHOLD + 1), (0, 0, 0));
        let p = program(vec![top.build(), mid.build(), leaf.build()]);

        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(ctx.effects, vec![Effect::Win { delay: 0 }]);

        let shallow = Limits {
            max_call_depth: 1,
            ..Limits::default()
        };
        let err = run_frame(&p, &mut SimContext::default(), &shallow).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::DepthExceeded { depth: 2, limit: 1, .. }
        ));
    }

    #[test]
    fn test_goto_jumps_to_label() {
        let mut b = PrefabBuilder::new("level");
        let text = |s: &str| vec![Setting::Text(s.into())];
        b.place_with(ids::GOTO, (0, 0, 8), text("end"));
        b.place(ids::LOSE, (4, 0, 8));
        let label = b.place_with(ids::LABEL, (0, 0, 4), text("end"));
        let win = b.place(ids::WIN, (4, 0, 4));
        b.wire(label, "After", win, "Before").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        // Roots: goto, the unwired lose, then the label itself.
        assert_eq!(
            ctx.effects,
            vec![
                Effect::Win { delay: 0 },
                Effect::Lose { delay: 0 },
                Effect::Win { delay: 0 },
            ]
        );
    }

    #[test]
    fn test_label_without_goto_runs_as_root() {
        let mut b = PrefabBuilder::new("level");
        let label = b.place_with(ids::LABEL, (0, 0, 4), vec![Setting::Text("start".into())]);
        let win = b.place(ids::WIN, (4, 0, 0));
        b.wire(label, "After", win, "Before").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        let report = run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(ctx.effects, vec![Effect::Win { delay: 0 }]);
        assert_eq!(report.steps, 2);
    }

    #[test]
    fn test_unwired_number_input_reads_zero() {
        let mut b = PrefabBuilder::new("level");
        let three = b.number(3.0, (4, 0, 12));
        let add = b.place(ids::ADD_NUMBERS, (4, 0, 8));
        let inspect = b.place(ids::INSPECT_NUMBER, (0, 0, 0));
        b.wire(three, "Number", add, "Num1").unwrap();
        b.wire(add, "Sum", inspect, "Number").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(3.0)]);
    }

    #[test]
    fn test_unwired_rotation_reads_identity() {
        use crate::math::Rot;
        let mut b = PrefabBuilder::new("level");
        b.place(ids::INSPECT_ROTATION, (0, 0, 0));
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![RuntimeValue::Rotation(Rot::IDENTITY)]);
    }

    #[test]
    fn test_collision_outputs_are_memorized() {
        use crate::signal::ObjectHandle;
        let mut b = PrefabBuilder::new("level");
        let obj = b.place_with(ids::OBJECT, (-2, 0, 8), vec![Setting::Object(4)]);
        let sensor = b.place(ids::COLLISION, (0, 0, 8));
        let inspect = b.place(ids::INSPECT_NUMBER, (4, 0, 4));
        b.wire(obj, "Object", sensor, "1st Object").unwrap();
        b.wire(sensor, "Collided", inspect, "Before").unwrap();
        b.wire(sensor, "Impulse", inspect, "Number").unwrap();
        let p = program(vec![b.build()]);
        let mut ctx = SimContext::default();
        ctx.input.contacts.insert(
            ObjectHandle(4),
            Contact {
                other: ObjectHandle(5),
                impulse: 2.5,
                normal: Vec3::Y,
            },
        );
        run_frame(&p, &mut ctx, &Limits::default()).unwrap();
        assert_eq!(inspected(&ctx), vec![num(2.5)]);
    }
}
