//! Lazy value evaluation: outputs are computed when an input pulls them.

use crate::error::RuntimeError;
use crate::math::{deg_to_rad, Rot, Vec3};
use crate::signal::{ObjectHandle, RuntimeValue, SignalKind, TerminalOutput, VariableReference};
use crate::syntax::node::{BinaryOp, Query, UnaryOp};
use crate::syntax::{Input, NodeId, NodeKind, SyntaxNode};

use super::context::RuntimeContext;
use super::{Engine, ScopeId};

/// Numbers and vectors closer than this compare equal.
const EQUALITY_TOLERANCE: f32 = 0.001;

/// Whether `node` rejects a non-finite value on an input of `kind`.
/// Vector and rotation math checks every input; statements check the
/// vectors and rotations they hand to the host.
fn validates(node: &SyntaxNode, kind: SignalKind) -> bool {
    match &node.kind {
        NodeKind::Unary(op) => matches!(
            op,
            UnaryOp::Inverse | UnaryOp::Magnitude | UnaryOp::Normalize
        ),
        NodeKind::Binary(op) => matches!(
            op,
            BinaryOp::AddVectors
                | BinaryOp::SubtractVectors
                | BinaryOp::ScaleVector
                | BinaryOp::RotateVector
                | BinaryOp::CombineRotations
                | BinaryOp::EqualVectors
                | BinaryOp::Distance
                | BinaryOp::Dot
                | BinaryOp::Cross
        ),
        NodeKind::Lerp
        | NodeKind::Make(_)
        | NodeKind::Break(_)
        | NodeKind::AxisAngle
        | NodeKind::LookRotation
        | NodeKind::WorldToScreen
        | NodeKind::ScreenToWorld
        | NodeKind::Query(Query::Raycast) => true,
        _ => node.is_statement() && matches!(kind, SignalKind::Vector | SignalKind::Rotation),
    }
}

fn unary(op: UnaryOp, x: RuntimeValue) -> RuntimeValue {
    let n = x.as_number();
    match op {
        UnaryOp::Negate => RuntimeValue::Number(-n),
        UnaryOp::Not => RuntimeValue::Bool(!x.as_bool()),
        UnaryOp::Inverse => RuntimeValue::Rotation(x.as_rotation().inverse()),
        UnaryOp::Absolute => RuntimeValue::Number(n.abs()),
        UnaryOp::Floor => RuntimeValue::Number(n.floor()),
        UnaryOp::Ceiling => RuntimeValue::Number(n.ceil()),
        UnaryOp::Round => RuntimeValue::Number(n.round()),
        UnaryOp::SquareRoot => RuntimeValue::Number(n.sqrt()),
        UnaryOp::Sine => RuntimeValue::Number(deg_to_rad(n).sin()),
        UnaryOp::Cosine => RuntimeValue::Number(deg_to_rad(n).cos()),
        UnaryOp::Magnitude => RuntimeValue::Number(x.as_vector().length()),
        UnaryOp::Normalize => RuntimeValue::Vector(x.as_vector().normalize()),
    }
}

fn binary(op: BinaryOp, a: RuntimeValue, b: RuntimeValue) -> RuntimeValue {
    use RuntimeValue::{Bool, Number, Rotation, Vector};
    let (x, y) = (a.as_number(), b.as_number());
    match op {
        BinaryOp::AddNumbers => Number(x + y),
        BinaryOp::AddVectors => Vector(a.as_vector() + b.as_vector()),
        BinaryOp::SubtractNumbers => Number(x - y),
        BinaryOp::SubtractVectors => Vector(a.as_vector() - b.as_vector()),
        BinaryOp::Multiply => Number(x * y),
        BinaryOp::ScaleVector => Vector(a.as_vector() * y),
        BinaryOp::RotateVector => Vector(b.as_rotation().rotate(a.as_vector())),
        BinaryOp::CombineRotations => Rotation(a.as_rotation() * b.as_rotation()),
        BinaryOp::Divide => Number(x / y),
        // Floored: the result takes the sign of the divisor.
        BinaryOp::Modulo => Number(x - y * (x / y).floor()),
        BinaryOp::Power => Number(x.powf(y)),
        BinaryOp::Min => Number(x.min(y)),
        BinaryOp::Max => Number(x.max(y)),
        BinaryOp::LessThan => Bool(x < y),
        BinaryOp::GreaterThan => Bool(x > y),
        BinaryOp::EqualNumbers => Bool((x - y).abs() < EQUALITY_TOLERANCE),
        BinaryOp::EqualVectors => {
            Bool(a.as_vector().distance(b.as_vector()) < EQUALITY_TOLERANCE)
        }
        BinaryOp::EqualObjects => Bool(a.as_object() == b.as_object()),
        BinaryOp::EqualBools => Bool(a.as_bool() == b.as_bool()),
        BinaryOp::And => Bool(a.as_bool() && b.as_bool()),
        BinaryOp::Or => Bool(a.as_bool() || b.as_bool()),
        BinaryOp::Distance => Number(a.as_vector().distance(b.as_vector())),
        BinaryOp::Dot => Number(a.as_vector().dot(b.as_vector())),
        BinaryOp::Cross => Vector(a.as_vector().cross(b.as_vector())),
    }
}

fn pick<T: Copy>(index: usize, values: &[T]) -> T {
    values[index.min(values.len() - 1)]
}

impl<C: RuntimeContext> Engine<'_, C> {
    /// What `input` reads in `scope`. Ports read the enclosing custom
    /// block's input in the parent scope.
    fn source(&mut self, scope: ScopeId, input: Input) -> Result<TerminalOutput, RuntimeError> {
        match input {
            Input::Disconnected => Ok(TerminalOutput::Disconnected),
            Input::Wire(t) => self.output(scope, t.node, t.key),
            Input::Port(outer) => {
                let Some((parent, custom)) = self.parent(scope) else {
                    return Ok(TerminalOutput::Disconnected);
                };
                let ast = self.ast(parent);
                let source = ast.nodes[custom.index()]
                    .input_by_key(outer)
                    .map(|slot| slot.source)
                    .unwrap_or(Input::Disconnected);
                self.source(parent, source)
            }
        }
    }

    /// Input `i` of `node` without reading through references.
    pub(crate) fn pull(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        i: usize,
    ) -> Result<TerminalOutput, RuntimeError> {
        let ast = self.ast(scope);
        self.source(scope, ast.nodes[node.index()].input(i))
    }

    /// The variable element input `i` points at, if it is wired to one.
    pub(crate) fn reference(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        i: usize,
    ) -> Result<Option<VariableReference>, RuntimeError> {
        Ok(match self.pull(scope, node, i)? {
            TerminalOutput::Reference(r) => Some(r),
            _ => None,
        })
    }

    /// Input `i` of `node` as a value of its wire kind. References read
    /// through the context; disconnected inputs read the zero value.
    pub(crate) fn value(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        i: usize,
    ) -> Result<RuntimeValue, RuntimeError> {
        let ast = self.ast(scope);
        let n = &ast.nodes[node.index()];
        let kind = n
            .inputs
            .get(i)
            .map(|slot| slot.wire.kind)
            .unwrap_or(SignalKind::Number);
        let zero = RuntimeValue::default_for(kind).unwrap_or(RuntimeValue::Number(0.0));
        let value = match self.source(scope, n.input(i))? {
            TerminalOutput::Disconnected => zero,
            TerminalOutput::Value(v) => v,
            TerminalOutput::Reference(r) => self.ctx.get_variable(r).unwrap_or(zero),
        };
        if !value.is_finite() && validates(n, kind) {
            return Err(RuntimeError::NonFinite {
                block: self.block_ref(scope, n),
            });
        }
        Ok(value)
    }

    pub(crate) fn number(&mut self, scope: ScopeId, node: NodeId, i: usize) -> Result<f32, RuntimeError> {
        Ok(self.value(scope, node, i)?.as_number())
    }

    pub(crate) fn vector(&mut self, scope: ScopeId, node: NodeId, i: usize) -> Result<Vec3, RuntimeError> {
        Ok(self.value(scope, node, i)?.as_vector())
    }

    pub(crate) fn rotation(&mut self, scope: ScopeId, node: NodeId, i: usize) -> Result<Rot, RuntimeError> {
        Ok(self.value(scope, node, i)?.as_rotation())
    }

    pub(crate) fn truth(&mut self, scope: ScopeId, node: NodeId, i: usize) -> Result<bool, RuntimeError> {
        Ok(self.value(scope, node, i)?.as_bool())
    }

    pub(crate) fn object(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        i: usize,
    ) -> Result<ObjectHandle, RuntimeError> {
        Ok(self.value(scope, node, i)?.as_object())
    }

    /// Output `key` of `node`, computed on demand.
    pub(crate) fn output(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        key: crate::graph::TerminalKey,
    ) -> Result<TerminalOutput, RuntimeError> {
        use TerminalOutput::Value;

        let ast = self.ast(scope);
        let n = &ast.nodes[node.index()];
        let Some(index) = n.output_index(key) else {
            return Err(RuntimeError::InvalidTerminal {
                block: self.block_ref(scope, n),
                key,
            });
        };

        let out = match &n.kind {
            NodeKind::Literal(value) => Value(*value),
            NodeKind::Unary(op) => Value(unary(*op, self.value(scope, node, 0)?)),
            NodeKind::Binary(op) => {
                let a = self.value(scope, node, 0)?;
                let b = self.value(scope, node, 1)?;
                Value(binary(*op, a, b))
            }
            NodeKind::Random => {
                let min = self.number(scope, node, 0)?;
                let max = self.number(scope, node, 1)?;
                Value(RuntimeValue::Number(self.ctx.random(min, max)))
            }
            NodeKind::Lerp => {
                let from = self.rotation(scope, node, 0)?;
                let to = self.rotation(scope, node, 1)?;
                let amount = self.number(scope, node, 2)?;
                Value(RuntimeValue::Rotation(from.slerp(to, amount)))
            }
            NodeKind::Make(kind) => {
                let v = Vec3::new(
                    self.number(scope, node, 0)?,
                    self.number(scope, node, 1)?,
                    self.number(scope, node, 2)?,
                );
                Value(match kind {
                    SignalKind::Rotation => RuntimeValue::Rotation(Rot::from_euler_deg(v)),
                    _ => RuntimeValue::Vector(v),
                })
            }
            NodeKind::Break(kind) => {
                let v = match kind {
                    SignalKind::Rotation => self.rotation(scope, node, 0)?.to_euler_deg(),
                    _ => self.vector(scope, node, 0)?,
                };
                Value(RuntimeValue::Number(pick(index, &[v.x, v.y, v.z])))
            }
            NodeKind::AxisAngle => {
                let axis = self.vector(scope, node, 0)?;
                let angle = self.number(scope, node, 1)?;
                Value(RuntimeValue::Rotation(Rot::axis_angle(axis, angle)))
            }
            NodeKind::LookRotation => {
                let direction = self.vector(scope, node, 0)?;
                let up = self.vector(scope, node, 1)?;
                Value(RuntimeValue::Rotation(Rot::look_rotation(direction, up)))
            }
            NodeKind::WorldToScreen => {
                let point = self.vector(scope, node, 0)?;
                let (x, y) = self
                    .ctx
                    .camera()
                    .world_to_screen(self.ctx.screen_size(), point);
                Value(RuntimeValue::Number(pick(index, &[x, y])))
            }
            NodeKind::ScreenToWorld => {
                let x = self.number(scope, node, 0)?;
                let y = self.number(scope, node, 1)?;
                let (near, far) = self
                    .ctx
                    .camera()
                    .screen_to_world(self.ctx.screen_size(), (x, y));
                Value(RuntimeValue::Vector(pick(index, &[near, far])))
            }
            NodeKind::GetVariable(v) => TerminalOutput::Reference(VariableReference::new(*v)),
            NodeKind::ListElement(_) => match self.pull(scope, node, 0)? {
                TerminalOutput::Reference(r) => {
                    let offset = self.number(scope, node, 1)?;
                    TerminalOutput::Reference(r.offset(offset))
                }
                _ => TerminalOutput::Disconnected,
            },
            NodeKind::Query(query) => Value(self.query(scope, node, *query, index)?),
            NodeKind::Loop | NodeKind::Event(_) | NodeKind::Object(_) | NodeKind::Sound(_) => {
                let zero = RuntimeValue::default_for(n.outputs[index].wire.kind)
                    .unwrap_or(RuntimeValue::Number(0.0));
                Value(self.remembered(scope, node, index).unwrap_or(zero))
            }
            NodeKind::Custom { ast: nested, .. } => match nested.value_output(key) {
                Some(inner) => {
                    let child = self.child(scope, node)?;
                    return self.output(child, inner.node, inner.key);
                }
                None => TerminalOutput::Disconnected,
            },
            _ => {
                return Err(RuntimeError::InvalidTerminal {
                    block: self.block_ref(scope, n),
                    key,
                })
            }
        };
        Ok(out)
    }

    fn query(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        query: Query,
        index: usize,
    ) -> Result<RuntimeValue, RuntimeError> {
        use RuntimeValue::{Bool, Number, Object, Rotation, Vector};
        Ok(match query {
            Query::ScreenSize => {
                let (w, h) = self.ctx.screen_size();
                Number(pick(index, &[w, h]))
            }
            Query::Accelerometer => Vector(self.ctx.accelerometer()),
            Query::CurrentFrame => Number(self.ctx.frame() as f32),
            Query::Position => {
                let object = self.object(scope, node, 0)?;
                let (position, rotation) = self.ctx.object_position(object);
                pick(index, &[Vector(position), Rotation(rotation)])
            }
            Query::Velocity => {
                let object = self.object(scope, node, 0)?;
                let (velocity, spin) = self.ctx.object_velocity(object);
                pick(index, &[Vector(velocity), Vector(spin)])
            }
            Query::Size => {
                let object = self.object(scope, node, 0)?;
                let (min, max) = self.ctx.object_size(object);
                pick(index, &[Vector(min), Vector(max)])
            }
            Query::Raycast => {
                let from = self.vector(scope, node, 0)?;
                let to = self.vector(scope, node, 1)?;
                let hit = self
                    .ctx
                    .raycast(from, to)
                    .map_err(|source| RuntimeError::Physics {
                        block: self.block_at(scope, node),
                        source,
                    })?;
                pick(
                    index,
                    &[
                        Bool(hit.is_some()),
                        Vector(hit.map(|h| h.position).unwrap_or(to)),
                        Object(hit.map(|h| h.object).unwrap_or(ObjectHandle::NONE)),
                    ],
                )
            }
        })
    }
}
