//! Statement execution.

use crate::error::RuntimeError;
use crate::math::Camera;
use crate::signal::{RuntimeValue, VariableReference};
use crate::syntax::node::{Event, GameOp, ObjectOp, SoundOp, StepOp};
use crate::syntax::{Entry, NodeId, NodeKind, SyntaxNode};

use super::context::RuntimeContext;
use super::{Engine, Flow, LoopState, ScopeId};

/// The after wire of a built-in statement: its last void output.
fn after(node: &SyntaxNode) -> Option<Flow> {
    node.void_outputs.last().map(|out| Flow::Out(out.key))
}

impl<C: RuntimeContext> Engine<'_, C> {
    /// Execute `node`, entered through `entry`, and return where flow
    /// continues, first flow first.
    pub(super) fn execute(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        entry: Entry,
    ) -> Result<Vec<Flow>, RuntimeError> {
        let ast = self.ast(scope);
        let n = &ast.nodes[node.index()];
        let mut flows = Vec::new();

        match &n.kind {
            NodeKind::If => {
                let branch = if self.truth(scope, node, 0)? { 0 } else { 1 };
                flows.extend(n.void_out(branch).map(Flow::Out));
            }
            NodeKind::Loop => {
                let start = self.number(scope, node, 0)?.round() as i32;
                let stop = self.number(scope, node, 1)?.round() as i32;
                let step = if stop >= start { 1 } else { -1 };
                self.loops.insert(
                    (scope, node),
                    LoopState {
                        next: start,
                        stop,
                        step,
                    },
                );
                return self.resume(scope, node);
            }
            NodeKind::Event(event) => {
                if self.sense(scope, node, *event)? {
                    flows.extend(n.void_out(0).map(Flow::Out));
                }
            }
            NodeKind::SetVariable(v) => {
                let value = self.value(scope, node, 0)?;
                self.ctx.set_variable(VariableReference::new(*v), value);
            }
            NodeKind::SetPointer(_) => {
                if let Some(target) = self.reference(scope, node, 0)? {
                    let value = self.value(scope, node, 1)?;
                    self.ctx.set_variable(target, value);
                }
            }
            NodeKind::Step(op) => {
                if let Some(target) = self.reference(scope, node, 0)? {
                    let current = self
                        .ctx
                        .get_variable(target)
                        .map(|v| v.as_number())
                        .unwrap_or(0.0);
                    let delta = match op {
                        StepOp::Increment => 1.0,
                        StepOp::Decrement => -1.0,
                    };
                    self.ctx
                        .set_variable(target, RuntimeValue::Number(current + delta));
                }
            }
            NodeKind::Inspect(_) => {
                let value = self.value(scope, node, 0)?;
                let block = self.block_ref(scope, n);
                self.ctx.inspect(&block, value);
            }
            NodeKind::Object(op) => self.object_op(scope, node, *op)?,
            NodeKind::Sound(op) => self.sound_op(scope, node, *op)?,
            NodeKind::Game(op) => self.game_op(scope, node, *op)?,
            NodeKind::Label(_) => {}
            NodeKind::Goto { target, .. } => return Ok(target.map(Flow::Jump).into_iter().collect()),
            NodeKind::Custom { .. } => return Ok(vec![Flow::Descend(entry)]),
            _ => {
                return Err(RuntimeError::InvalidTerminal {
                    block: self.block_ref(scope, n),
                    key: match entry {
                        Entry::Enter(key) => key,
                        Entry::Frame => Default::default(),
                    },
                })
            }
        }

        flows.extend(after(n));
        Ok(flows)
    }

    /// Next iteration of a running loop, or its after wire once done.
    pub(super) fn resume(&mut self, scope: ScopeId, node: NodeId) -> Result<Vec<Flow>, RuntimeError> {
        let ast = self.ast(scope);
        let n = &ast.nodes[node.index()];
        let Some(mut state) = self.loops.get(&(scope, node)).copied() else {
            return Ok(after(n).into_iter().collect());
        };
        if state.next == state.stop {
            self.loops.remove(&(scope, node));
            return Ok(after(n).into_iter().collect());
        }
        let counter = state.next;
        state.next += state.step;
        self.loops.insert((scope, node), state);
        self.remember(scope, node, vec![RuntimeValue::Number(counter as f32)]);

        let mut flows: Vec<Flow> = n.void_out(0).map(Flow::Out).into_iter().collect();
        flows.push(Flow::Resume);
        Ok(flows)
    }

    /// Whether the sensor's event happened this frame. Records the
    /// sensor's value outputs either way.
    fn sense(&mut self, scope: ScopeId, node: NodeId, event: Event) -> Result<bool, RuntimeError> {
        use RuntimeValue::{Number, Object, Vector};
        let (fired, outputs) = match event {
            Event::Play => (self.ctx.frame() == 0, Vec::new()),
            Event::BoxArt => (self.ctx.is_box_art(), Vec::new()),
            Event::Touch { state, finger } => match self.ctx.touch(state, finger) {
                Some((x, y)) => (true, vec![Number(x), Number(y)]),
                None => (false, Vec::new()),
            },
            Event::Swipe => match self.ctx.swipe() {
                Some(direction) => (true, vec![Vector(direction)]),
                None => (false, Vec::new()),
            },
            Event::Button(kind) => (self.ctx.button(kind), Vec::new()),
            Event::Joystick(kind) => (false, vec![Vector(self.ctx.joystick(kind))]),
            Event::Collision => {
                let object = self.object(scope, node, 0)?;
                let contact = self
                    .ctx
                    .collision(object)
                    .map_err(|source| RuntimeError::Physics {
                        block: self.block_at(scope, node),
                        source,
                    })?;
                match contact {
                    Some(c) => (
                        true,
                        vec![Object(c.other), Number(c.impulse), Vector(c.normal)],
                    ),
                    None => (false, Vec::new()),
                }
            }
        };
        if !outputs.is_empty() {
            self.remember(scope, node, outputs);
        }
        Ok(fired)
    }

    fn object_op(&mut self, scope: ScopeId, node: NodeId, op: ObjectOp) -> Result<(), RuntimeError> {
        let object = self.object(scope, node, 0)?;
        match op {
            ObjectOp::SetPosition => {
                let position = self.vector(scope, node, 1)?;
                let rotation = self.rotation(scope, node, 2)?;
                self.ctx.set_position(object, position, rotation);
            }
            ObjectOp::SetVisible => {
                let visible = self.truth(scope, node, 1)?;
                self.ctx.set_visible(object, visible);
            }
            ObjectOp::Create => {
                let copy = self.ctx.create_object(object);
                self.remember(scope, node, vec![RuntimeValue::Object(copy)]);
            }
            ObjectOp::Destroy => self.ctx.destroy_object(object),
            ObjectOp::SetVelocity => {
                let velocity = self.vector(scope, node, 1)?;
                let spin = self.vector(scope, node, 2)?;
                self.ctx.set_velocity(object, velocity, spin);
            }
            ObjectOp::AddForce => {
                let force = self.vector(scope, node, 1)?;
                let torque = self.vector(scope, node, 2)?;
                self.ctx.add_force(object, force, torque);
            }
        }
        Ok(())
    }

    fn sound_op(&mut self, scope: ScopeId, node: NodeId, op: SoundOp) -> Result<(), RuntimeError> {
        match op {
            SoundOp::Play { looping, sound } => {
                let volume = self.number(scope, node, 0)?;
                let pitch = self.number(scope, node, 1)?;
                let channel = self.ctx.play_sound(sound, volume, pitch, looping);
                self.remember(scope, node, vec![RuntimeValue::Number(channel)]);
            }
            SoundOp::Stop => {
                let channel = self.number(scope, node, 0)?;
                self.ctx.stop_sound(channel);
            }
            SoundOp::VolumePitch => {
                let channel = self.number(scope, node, 0)?;
                let volume = self.number(scope, node, 1)?;
                let pitch = self.number(scope, node, 2)?;
                self.ctx.volume_pitch(channel, volume, pitch);
            }
        }
        Ok(())
    }

    fn game_op(&mut self, scope: ScopeId, node: NodeId, op: GameOp) -> Result<(), RuntimeError> {
        match op {
            GameOp::Win { delay } => self.ctx.win(delay),
            GameOp::Lose { delay } => self.ctx.lose(delay),
            GameOp::SetScore { ranking } => {
                let score = self.number(scope, node, 0)?;
                let coins = self.number(scope, node, 1)?;
                self.ctx.set_score(score, coins, ranking);
            }
            GameOp::SetCamera { perspective } => {
                let camera = Camera {
                    position: self.vector(scope, node, 0)?,
                    rotation: self.rotation(scope, node, 1)?,
                    range: self.number(scope, node, 2)?,
                    perspective,
                };
                self.ctx.set_camera(camera);
            }
            GameOp::SetLight => {
                let position = self.vector(scope, node, 0)?;
                let rotation = self.rotation(scope, node, 1)?;
                self.ctx.set_light(position, rotation);
            }
            GameOp::RandomSeed => {
                let seed = self.number(scope, node, 0)?;
                self.ctx.set_seed(seed);
            }
        }
        Ok(())
    }
}
