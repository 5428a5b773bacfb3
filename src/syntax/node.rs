//! Node kinds and their constructors.
//!
//! Every kind accepts only the block ids that belong to it; constructing a
//! kind from any other id fails with [`CompileError::InvalidTypeId`].

use std::sync::Arc;

use crate::error::{BlockRef, CompileError, Result};
use crate::graph::catalog::ids;
use crate::graph::{Block, BlockId};
use crate::math::{Rot, Vec3};
use crate::signal::{ObjectHandle, RuntimeValue, SignalKind, VariableId};
use crate::syntax::{Ast, NodeId, VariableTable};

/// The block a constructor is building from, and where it lives.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    pub prefab: &'a str,
    pub block: &'a Block,
}

impl<'a> Site<'a> {
    pub fn new(prefab: &'a str, block: &'a Block) -> Self {
        Self { prefab, block }
    }

    pub fn block_ref(&self) -> BlockRef {
        BlockRef::new(self.prefab, self.block.id, self.block.pos)
    }

    fn invalid(&self, family: &'static str) -> CompileError {
        CompileError::InvalidTypeId {
            block: self.block_ref(),
            family,
        }
    }

    fn id(&self) -> BlockId {
        self.block.id
    }
}

// ─── Operators ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Inverse,
    Absolute,
    Floor,
    Ceiling,
    Round,
    SquareRoot,
    Sine,
    Cosine,
    Magnitude,
    Normalize,
}

impl UnaryOp {
    pub fn from_id(id: BlockId) -> Option<Self> {
        Some(match id {
            ids::NEGATE => UnaryOp::Negate,
            ids::NOT => UnaryOp::Not,
            ids::INVERSE => UnaryOp::Inverse,
            ids::ABSOLUTE => UnaryOp::Absolute,
            ids::FLOOR => UnaryOp::Floor,
            ids::CEILING => UnaryOp::Ceiling,
            ids::ROUND => UnaryOp::Round,
            ids::SQUARE_ROOT => UnaryOp::SquareRoot,
            ids::SINE => UnaryOp::Sine,
            ids::COSINE => UnaryOp::Cosine,
            ids::MAGNITUDE => UnaryOp::Magnitude,
            ids::NORMALIZE => UnaryOp::Normalize,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    AddNumbers,
    AddVectors,
    SubtractNumbers,
    SubtractVectors,
    Multiply,
    ScaleVector,
    RotateVector,
    CombineRotations,
    Divide,
    Modulo,
    Power,
    Min,
    Max,
    LessThan,
    GreaterThan,
    EqualNumbers,
    EqualVectors,
    EqualObjects,
    EqualBools,
    And,
    Or,
    Distance,
    Dot,
    Cross,
}

impl BinaryOp {
    pub fn from_id(id: BlockId) -> Option<Self> {
        Some(match id {
            ids::ADD_NUMBERS => BinaryOp::AddNumbers,
            ids::ADD_VECTORS => BinaryOp::AddVectors,
            ids::SUBTRACT_NUMBERS => BinaryOp::SubtractNumbers,
            ids::SUBTRACT_VECTORS => BinaryOp::SubtractVectors,
            ids::MULTIPLY => BinaryOp::Multiply,
            ids::SCALE_VECTOR => BinaryOp::ScaleVector,
            ids::ROTATE_VECTOR => BinaryOp::RotateVector,
            ids::COMBINE_ROTATIONS => BinaryOp::CombineRotations,
            ids::DIVIDE => BinaryOp::Divide,
            ids::MODULO => BinaryOp::Modulo,
            ids::POWER => BinaryOp::Power,
            ids::MIN => BinaryOp::Min,
            ids::MAX => BinaryOp::Max,
            ids::LESS_THAN => BinaryOp::LessThan,
            ids::GREATER_THAN => BinaryOp::GreaterThan,
            ids::EQUAL_NUMBERS => BinaryOp::EqualNumbers,
            ids::EQUAL_VECTORS => BinaryOp::EqualVectors,
            ids::EQUAL_OBJECTS => BinaryOp::EqualObjects,
            ids::EQUAL_BOOLS => BinaryOp::EqualBools,
            ids::AND => BinaryOp::And,
            ids::OR => BinaryOp::Or,
            ids::DISTANCE => BinaryOp::Distance,
            ids::DOT => BinaryOp::Dot,
            ids::CROSS => BinaryOp::Cross,
            _ => return None,
        })
    }
}

/// Read-only host queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query {
    ScreenSize,
    Accelerometer,
    CurrentFrame,
    Position,
    Velocity,
    Size,
    Raycast,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchState {
    Touching,
    Begins,
    Ends,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    Direction,
    Button,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoystickKind {
    Horizontal,
    Screen,
}

/// Sensors that fire their event output when the host reports the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Play,
    BoxArt,
    Touch { state: TouchState, finger: u8 },
    Swipe,
    Button(ButtonKind),
    Joystick(JoystickKind),
    Collision,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectOp {
    SetPosition,
    SetVisible,
    Create,
    Destroy,
    SetVelocity,
    AddForce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundOp {
    Play { looping: bool, sound: u8 },
    Stop,
    VolumePitch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOp {
    Win { delay: u8 },
    Lose { delay: u8 },
    SetScore { ranking: u8 },
    SetCamera { perspective: bool },
    SetLight,
    RandomSeed,
}

// ─── Node Kinds ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Expressions
    Literal(RuntimeValue),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Random,
    Lerp,
    /// Make vector or rotation from three numbers.
    Make(SignalKind),
    /// Break a vector or rotation into three numbers.
    Break(SignalKind),
    AxisAngle,
    LookRotation,
    WorldToScreen,
    ScreenToWorld,
    GetVariable(VariableId),
    ListElement(SignalKind),
    Query(Query),

    // Statements
    If,
    Loop,
    Event(Event),
    SetVariable(VariableId),
    SetPointer(SignalKind),
    Step(StepOp),
    Inspect(SignalKind),
    Object(ObjectOp),
    Sound(SoundOp),
    Game(GameOp),
    Label(String),
    /// Resolved to its label after all nodes exist.
    Goto { label: String, target: Option<NodeId> },

    /// A nested program.
    Custom { prefab: usize, ast: Arc<Ast> },
}

fn kind_of(id: BlockId, table: [(BlockId, SignalKind); 5]) -> Option<SignalKind> {
    table.iter().find(|(i, _)| *i == id).map(|(_, k)| *k)
}

const VALUE_KINDS: [SignalKind; 5] = [
    SignalKind::Number,
    SignalKind::Vector,
    SignalKind::Rotation,
    SignalKind::Bool,
    SignalKind::Object,
];

fn by_kind(blocks: [BlockId; 5]) -> [(BlockId, SignalKind); 5] {
    std::array::from_fn(|i| (blocks[i], VALUE_KINDS[i]))
}

impl NodeKind {
    pub fn literal(site: Site<'_>) -> Result<Self> {
        let b = site.block;
        let value = match site.id() {
            ids::NUMBER => RuntimeValue::Number(b.number(0).unwrap_or(0.0)),
            ids::VECTOR => RuntimeValue::Vector(b.vector(0).unwrap_or(Vec3::ZERO)),
            ids::ROTATION => RuntimeValue::Rotation(
                b.vector(0)
                    .map(Rot::from_euler_deg)
                    .unwrap_or(Rot::IDENTITY),
            ),
            ids::TRUE => RuntimeValue::Bool(true),
            ids::FALSE => RuntimeValue::Bool(false),
            ids::OBJECT => RuntimeValue::Object(ObjectHandle(b.object(0).unwrap_or(0))),
            _ => return Err(site.invalid("literal")),
        };
        Ok(NodeKind::Literal(value))
    }

    pub fn unary(site: Site<'_>) -> Result<Self> {
        UnaryOp::from_id(site.id())
            .map(NodeKind::Unary)
            .ok_or_else(|| site.invalid("unary"))
    }

    pub fn binary(site: Site<'_>) -> Result<Self> {
        BinaryOp::from_id(site.id())
            .map(NodeKind::Binary)
            .ok_or_else(|| site.invalid("binary"))
    }

    pub fn random(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::RANDOM => Ok(NodeKind::Random),
            _ => Err(site.invalid("random")),
        }
    }

    pub fn lerp(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::LERP => Ok(NodeKind::Lerp),
            _ => Err(site.invalid("lerp")),
        }
    }

    pub fn make(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::MAKE_VECTOR => Ok(NodeKind::Make(SignalKind::Vector)),
            ids::MAKE_ROTATION => Ok(NodeKind::Make(SignalKind::Rotation)),
            _ => Err(site.invalid("make")),
        }
    }

    /// One kind for both break blocks.
    pub fn split(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::BREAK_VECTOR => Ok(NodeKind::Break(SignalKind::Vector)),
            ids::BREAK_ROTATION => Ok(NodeKind::Break(SignalKind::Rotation)),
            _ => Err(site.invalid("break")),
        }
    }

    pub fn axis_angle(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::AXIS_ANGLE => Ok(NodeKind::AxisAngle),
            _ => Err(site.invalid("axis angle")),
        }
    }

    pub fn look_rotation(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::LOOK_ROTATION => Ok(NodeKind::LookRotation),
            _ => Err(site.invalid("look rotation")),
        }
    }

    pub fn world_to_screen(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::WORLD_TO_SCREEN => Ok(NodeKind::WorldToScreen),
            _ => Err(site.invalid("world to screen")),
        }
    }

    pub fn screen_to_world(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::SCREEN_TO_WORLD => Ok(NodeKind::ScreenToWorld),
            _ => Err(site.invalid("screen to world")),
        }
    }

    pub fn get_variable(site: Site<'_>, vars: &mut VariableTable) -> Result<Self> {
        let table = by_kind([
            ids::VARIABLE_NUMBER,
            ids::VARIABLE_VECTOR,
            ids::VARIABLE_ROTATION,
            ids::VARIABLE_BOOL,
            ids::VARIABLE_OBJECT,
        ]);
        let kind = kind_of(site.id(), table).ok_or_else(|| site.invalid("variable"))?;
        let name = site.block.text(0).unwrap_or_default();
        Ok(NodeKind::GetVariable(vars.intern(name, kind)))
    }

    pub fn list_element(site: Site<'_>) -> Result<Self> {
        let table = by_kind([
            ids::LIST_NUMBER,
            ids::LIST_VECTOR,
            ids::LIST_ROTATION,
            ids::LIST_BOOL,
            ids::LIST_OBJECT,
        ]);
        kind_of(site.id(), table)
            .map(NodeKind::ListElement)
            .ok_or_else(|| site.invalid("list"))
    }

    pub fn query(site: Site<'_>) -> Result<Self> {
        let query = match site.id() {
            ids::SCREEN_SIZE => Query::ScreenSize,
            ids::ACCELEROMETER => Query::Accelerometer,
            ids::CURRENT_FRAME => Query::CurrentFrame,
            ids::GET_POSITION => Query::Position,
            ids::GET_VELOCITY => Query::Velocity,
            ids::GET_SIZE => Query::Size,
            ids::RAYCAST => Query::Raycast,
            _ => return Err(site.invalid("query")),
        };
        Ok(NodeKind::Query(query))
    }

    pub fn branch(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::IF => Ok(NodeKind::If),
            _ => Err(site.invalid("if")),
        }
    }

    pub fn repeat(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::LOOP => Ok(NodeKind::Loop),
            _ => Err(site.invalid("loop")),
        }
    }

    pub fn event(site: Site<'_>) -> Result<Self> {
        let b = site.block;
        let event = match site.id() {
            ids::PLAY_SENSOR => Event::Play,
            ids::BOX_ART_SENSOR => Event::BoxArt,
            ids::TOUCH_SENSOR => Event::Touch {
                state: match b.choice(0).unwrap_or(0) {
                    1 => TouchState::Begins,
                    2 => TouchState::Ends,
                    _ => TouchState::Touching,
                },
                finger: b.choice(1).unwrap_or(0),
            },
            ids::SWIPE_SENSOR => Event::Swipe,
            ids::BUTTON => Event::Button(match b.choice(0).unwrap_or(0) {
                1 => ButtonKind::Button,
                _ => ButtonKind::Direction,
            }),
            ids::JOYSTICK => Event::Joystick(match b.choice(0).unwrap_or(0) {
                1 => JoystickKind::Screen,
                _ => JoystickKind::Horizontal,
            }),
            ids::COLLISION => Event::Collision,
            _ => return Err(site.invalid("sensor")),
        };
        Ok(NodeKind::Event(event))
    }

    pub fn set_variable(site: Site<'_>, vars: &mut VariableTable) -> Result<Self> {
        let table = by_kind([
            ids::SET_VARIABLE_NUMBER,
            ids::SET_VARIABLE_VECTOR,
            ids::SET_VARIABLE_ROTATION,
            ids::SET_VARIABLE_BOOL,
            ids::SET_VARIABLE_OBJECT,
        ]);
        let kind = kind_of(site.id(), table).ok_or_else(|| site.invalid("set variable"))?;
        let name = site.block.text(0).unwrap_or_default();
        Ok(NodeKind::SetVariable(vars.intern(name, kind)))
    }

    pub fn set_pointer(site: Site<'_>) -> Result<Self> {
        let table = by_kind([
            ids::SET_POINTER_NUMBER,
            ids::SET_POINTER_VECTOR,
            ids::SET_POINTER_ROTATION,
            ids::SET_POINTER_BOOL,
            ids::SET_POINTER_OBJECT,
        ]);
        kind_of(site.id(), table)
            .map(NodeKind::SetPointer)
            .ok_or_else(|| site.invalid("set pointer"))
    }

    pub fn step(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::INCREMENT => Ok(NodeKind::Step(StepOp::Increment)),
            ids::DECREMENT => Ok(NodeKind::Step(StepOp::Decrement)),
            _ => Err(site.invalid("increment")),
        }
    }

    pub fn inspect(site: Site<'_>) -> Result<Self> {
        let table = by_kind([
            ids::INSPECT_NUMBER,
            ids::INSPECT_VECTOR,
            ids::INSPECT_ROTATION,
            ids::INSPECT_BOOL,
            ids::INSPECT_OBJECT,
        ]);
        kind_of(site.id(), table)
            .map(NodeKind::Inspect)
            .ok_or_else(|| site.invalid("inspect"))
    }

    pub fn object(site: Site<'_>) -> Result<Self> {
        let op = match site.id() {
            ids::SET_POSITION => ObjectOp::SetPosition,
            ids::SET_VISIBLE => ObjectOp::SetVisible,
            ids::CREATE_OBJECT => ObjectOp::Create,
            ids::DESTROY_OBJECT => ObjectOp::Destroy,
            ids::SET_VELOCITY => ObjectOp::SetVelocity,
            ids::ADD_FORCE => ObjectOp::AddForce,
            _ => return Err(site.invalid("object")),
        };
        Ok(NodeKind::Object(op))
    }

    pub fn sound(site: Site<'_>) -> Result<Self> {
        let b = site.block;
        let op = match site.id() {
            ids::PLAY_SOUND => SoundOp::Play {
                looping: b.flag(0).unwrap_or(false),
                sound: b.choice(1).unwrap_or(0),
            },
            ids::STOP_SOUND => SoundOp::Stop,
            ids::VOLUME_PITCH => SoundOp::VolumePitch,
            _ => return Err(site.invalid("sound")),
        };
        Ok(NodeKind::Sound(op))
    }

    pub fn game(site: Site<'_>) -> Result<Self> {
        let b = site.block;
        let delay = || b.number(0).unwrap_or(0.0).clamp(0.0, 255.0) as u8;
        let op = match site.id() {
            ids::WIN => GameOp::Win { delay: delay() },
            ids::LOSE => GameOp::Lose { delay: delay() },
            ids::SET_SCORE => GameOp::SetScore {
                ranking: b.choice(0).unwrap_or(0),
            },
            ids::SET_CAMERA => GameOp::SetCamera {
                perspective: b.flag(0).unwrap_or(false),
            },
            ids::SET_LIGHT => GameOp::SetLight,
            ids::RANDOM_SEED => GameOp::RandomSeed,
            _ => return Err(site.invalid("game")),
        };
        Ok(NodeKind::Game(op))
    }

    pub fn label(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::LABEL => Ok(NodeKind::Label(
                site.block.text(0).unwrap_or_default().to_string(),
            )),
            _ => Err(site.invalid("label")),
        }
    }

    pub fn goto(site: Site<'_>) -> Result<Self> {
        match site.id() {
            ids::GOTO => Ok(NodeKind::Goto {
                label: site.block.text(0).unwrap_or_default().to_string(),
                target: None,
            }),
            _ => Err(site.invalid("goto")),
        }
    }

    /// A custom block: ids at or above the built-in threshold only.
    pub fn custom(site: Site<'_>, threshold: u16, prefab: usize, ast: Arc<Ast>) -> Result<Self> {
        if site.id().0 < threshold {
            return Err(site.invalid("custom"));
        }
        Ok(NodeKind::Custom { prefab, ast })
    }

    /// Short name used in listings.
    pub fn name(&self) -> String {
        match self {
            NodeKind::Literal(v) => format!("literal {}", v),
            NodeKind::Unary(op) => format!("{:?}", op),
            NodeKind::Binary(op) => format!("{:?}", op),
            NodeKind::Random => "Random".into(),
            NodeKind::Lerp => "Lerp".into(),
            NodeKind::Make(kind) => format!("Make {}", kind),
            NodeKind::Break(kind) => format!("Break {}", kind),
            NodeKind::AxisAngle => "AxisAngle".into(),
            NodeKind::LookRotation => "LookRotation".into(),
            NodeKind::WorldToScreen => "WorldToScreen".into(),
            NodeKind::ScreenToWorld => "ScreenToWorld".into(),
            NodeKind::GetVariable(v) => format!("Variable v{}", v.0),
            NodeKind::ListElement(kind) => format!("List {}", kind),
            NodeKind::Query(q) => format!("{:?}", q),
            NodeKind::If => "If".into(),
            NodeKind::Loop => "Loop".into(),
            NodeKind::Event(e) => format!("{:?}", e),
            NodeKind::SetVariable(v) => format!("SetVariable v{}", v.0),
            NodeKind::SetPointer(kind) => format!("SetPointer {}", kind),
            NodeKind::Step(op) => format!("{:?}", op),
            NodeKind::Inspect(kind) => format!("Inspect {}", kind),
            NodeKind::Object(op) => format!("{:?}", op),
            NodeKind::Sound(op) => format!("{:?}", op),
            NodeKind::Game(op) => format!("{:?}", op),
            NodeKind::Label(name) => format!("Label {:?}", name),
            NodeKind::Goto { label, target } => match target {
                Some(t) => format!("Goto {:?} -> {}", label, t),
                None => format!("Goto {:?}", label),
            },
            NodeKind::Custom { ast, .. } => format!("Custom [{}]", ast.prefab),
        }
    }
}
