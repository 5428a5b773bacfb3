//! Signal kinds, runtime values and variable references.

use serde::{Deserialize, Serialize};

use crate::math::{Rot, Vec3};

/// The value type carried by a terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Execution flow; carries no value.
    Void,
    Number,
    Vector,
    Rotation,
    Bool,
    Object,
}

impl SignalKind {
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Void => "void",
            SignalKind::Number => "number",
            SignalKind::Vector => "vector",
            SignalKind::Rotation => "rotation",
            SignalKind::Bool => "bool",
            SignalKind::Object => "object",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Full type of a wire: its kind plus whether it carries a variable
/// reference instead of a plain value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireType {
    pub kind: SignalKind,
    #[serde(default)]
    pub pointer: bool,
}

impl WireType {
    pub const VOID: WireType = WireType::value(SignalKind::Void);
    pub const NUMBER: WireType = WireType::value(SignalKind::Number);
    pub const VECTOR: WireType = WireType::value(SignalKind::Vector);
    pub const ROTATION: WireType = WireType::value(SignalKind::Rotation);
    pub const BOOL: WireType = WireType::value(SignalKind::Bool);
    pub const OBJECT: WireType = WireType::value(SignalKind::Object);

    pub const fn value(kind: SignalKind) -> Self {
        Self {
            kind,
            pointer: false,
        }
    }

    pub const fn pointer(kind: SignalKind) -> Self {
        Self {
            kind,
            pointer: true,
        }
    }

    pub fn is_void(self) -> bool {
        self.kind == SignalKind::Void
    }

    /// Whether an output of this type may be wired into `input`.
    /// Pointers feed value inputs of their kind (read through); plain
    /// values never feed pointer inputs.
    pub fn feeds(self, input: WireType) -> bool {
        self.kind == input.kind && (self.pointer || !input.pointer)
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pointer {
            write!(f, "{}*", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Host handle of a game object. Zero is "no object".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl ObjectHandle {
    pub const NONE: ObjectHandle = ObjectHandle(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// A value produced at run time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RuntimeValue {
    Number(f32),
    Vector(Vec3),
    Rotation(Rot),
    Bool(bool),
    Object(ObjectHandle),
}

impl RuntimeValue {
    /// The value a disconnected terminal of this kind reads as.
    pub fn default_for(kind: SignalKind) -> Option<RuntimeValue> {
        match kind {
            SignalKind::Void => None,
            SignalKind::Number => Some(RuntimeValue::Number(0.0)),
            SignalKind::Vector => Some(RuntimeValue::Vector(Vec3::ZERO)),
            SignalKind::Rotation => Some(RuntimeValue::Rotation(Rot::IDENTITY)),
            SignalKind::Bool => Some(RuntimeValue::Bool(false)),
            SignalKind::Object => Some(RuntimeValue::Object(ObjectHandle::NONE)),
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            RuntimeValue::Number(_) => SignalKind::Number,
            RuntimeValue::Vector(_) => SignalKind::Vector,
            RuntimeValue::Rotation(_) => SignalKind::Rotation,
            RuntimeValue::Bool(_) => SignalKind::Bool,
            RuntimeValue::Object(_) => SignalKind::Object,
        }
    }

    pub fn as_number(&self) -> f32 {
        match self {
            RuntimeValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_vector(&self) -> Vec3 {
        match self {
            RuntimeValue::Vector(v) => *v,
            _ => Vec3::ZERO,
        }
    }

    pub fn as_rotation(&self) -> Rot {
        match self {
            RuntimeValue::Rotation(r) => *r,
            _ => Rot::IDENTITY,
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, RuntimeValue::Bool(true))
    }

    pub fn as_object(&self) -> ObjectHandle {
        match self {
            RuntimeValue::Object(o) => *o,
            _ => ObjectHandle::NONE,
        }
    }

    /// False if any numeric component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            RuntimeValue::Number(n) => n.is_finite(),
            RuntimeValue::Vector(v) => v.is_finite(),
            RuntimeValue::Rotation(r) => r.is_finite(),
            RuntimeValue::Bool(_) | RuntimeValue::Object(_) => true,
        }
    }
}

impl std::fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeValue::Number(n) => write!(f, "{}", n),
            RuntimeValue::Vector(v) => write!(f, "{}", v),
            RuntimeValue::Rotation(r) => write!(f, "{}", r),
            RuntimeValue::Bool(b) => write!(f, "{}", b),
            RuntimeValue::Object(o) => write!(f, "object#{}", o.0),
        }
    }
}

/// Interned variable identity, stable across one compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(pub u32);

/// A declared variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub kind: SignalKind,
}

/// One element of a (list) variable. Indices are not bounds-checked;
/// the host's storage decides what an out-of-range index means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableReference {
    pub variable: VariableId,
    pub index: i32,
}

impl VariableReference {
    pub fn new(variable: VariableId) -> Self {
        Self { variable, index: 0 }
    }

    /// The element `offset` places further along the list.
    pub fn offset(self, offset: f32) -> Self {
        let step = if offset.is_finite() {
            offset.floor() as i32
        } else {
            0
        };
        Self {
            variable: self.variable,
            index: self.index.wrapping_add(step),
        }
    }
}

/// What a pulled terminal yields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TerminalOutput {
    Disconnected,
    Value(RuntimeValue),
    Reference(VariableReference),
}
