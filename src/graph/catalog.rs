//! Built-in block catalog: type ids, names, node families and terminal
//! layouts.
//!
//! Terminal keys follow one packing rule for every built-in block of
//! footprint `w x d` cells:
//!
//! - `Before` (void input) sits on the back face at `(3, 1, 8d - 1)`;
//! - `After` (void output) sits on the front face at `(3, 1, 0)`;
//! - `Left` terminals (inputs) take rows from the back, `(0, 1, 8(d-1-r) + 3)`;
//! - `Right` terminals (outputs, including branch void outputs) take rows
//!   the same way at `x = 8w - 1`.
//!
//! `d` is the larger of the left and right row counts (at least one).

use std::borrow::Cow;

use crate::graph::{BlockId, PortDir, PrefabList, TerminalKey, VOXELS_PER_CELL};
use crate::signal::{SignalKind, WireType};

/// Where a terminal sits on its block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub struct TermDef {
    pub name: &'static str,
    pub wire: WireType,
    pub side: Side,
}

/// Node family a block compiles to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Scenery and comments: no node.
    Inert,
    Literal,
    Unary,
    Binary,
    Random,
    Lerp,
    Make,
    Break,
    AxisAngle,
    LookRotation,
    WorldToScreen,
    ScreenToWorld,
    GetVariable,
    ListElement,
    Query,
    If,
    Loop,
    Event,
    SetVariable,
    SetPointer,
    StepVariable,
    Inspect,
    Object,
    Sound,
    Game,
    Label,
    Goto,
}

#[derive(Clone, Copy, Debug)]
pub struct BlockDef {
    pub id: BlockId,
    pub name: &'static str,
    pub family: Family,
    pub width: u8,
    pub terminals: &'static [TermDef],
}

/// A laid-out terminal, shared by built-in and custom blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Terminal {
    pub name: Cow<'static, str>,
    pub key: TerminalKey,
    pub wire: WireType,
    pub dir: PortDir,
}

impl BlockDef {
    /// Depth of the footprint in cells.
    pub fn depth(&self) -> i16 {
        let left = self.terminals.iter().filter(|t| t.side == Side::Left).count();
        let right = self.terminals.iter().filter(|t| t.side == Side::Right).count();
        left.max(right).max(1) as i16
    }

    /// Terminals with their keys, in declaration order.
    pub fn layout(&self) -> Vec<Terminal> {
        let cell = VOXELS_PER_CELL as i16;
        let d = self.depth();
        let w = self.width as i16;
        let mut left_row = 0;
        let mut right_row = 0;
        self.terminals
            .iter()
            .map(|t| {
                let (key, dir) = match t.side {
                    Side::Before => (TerminalKey::new(3, 1, cell * d - 1), PortDir::In),
                    Side::After => (TerminalKey::new(3, 1, 0), PortDir::Out),
                    Side::Left => {
                        let row = left_row;
                        left_row += 1;
                        (TerminalKey::new(0, 1, cell * (d - 1 - row) + 3), PortDir::In)
                    }
                    Side::Right => {
                        let row = right_row;
                        right_row += 1;
                        (
                            TerminalKey::new(cell * w - 1, 1, cell * (d - 1 - row) + 3),
                            PortDir::Out,
                        )
                    }
                };
                Terminal {
                    name: Cow::Borrowed(t.name),
                    key,
                    wire: t.wire,
                    dir,
                }
            })
            .collect()
    }

    /// Key of the terminal called `name`.
    pub fn key(&self, name: &str) -> Option<TerminalKey> {
        self.layout()
            .into_iter()
            .find(|t| t.name == name)
            .map(|t| t.key)
    }
}

/// Catalog entry for a built-in id.
pub fn lookup(id: BlockId) -> Option<&'static BlockDef> {
    BLOCKS.iter().find(|b| b.id == id)
}

/// All built-in blocks.
pub fn all() -> &'static [BlockDef] {
    BLOCKS
}

/// Terminals of any block id: the catalog layout for built-ins (none for
/// unknown built-in scenery), the declared ports for custom blocks.
/// `None` when a custom id names no prefab.
pub fn terminals(list: &PrefabList, id: BlockId) -> Option<Vec<Terminal>> {
    if list.is_builtin(id) {
        return Some(lookup(id).map(BlockDef::layout).unwrap_or_default());
    }
    let prefab = &list.prefabs[list.prefab_index(id)?];
    Some(
        prefab
            .ports
            .iter()
            .map(|p| Terminal {
                name: Cow::Owned(p.name.clone()),
                key: p.key,
                wire: p.wire,
                dir: p.dir,
            })
            .collect(),
    )
}

/// Built-in block ids.
pub mod ids {
    use crate::graph::BlockId;

    pub const COMMENT: BlockId = BlockId(15);

    pub const INSPECT_NUMBER: BlockId = BlockId(16);
    pub const INSPECT_VECTOR: BlockId = BlockId(20);
    pub const INSPECT_ROTATION: BlockId = BlockId(24);
    pub const INSPECT_BOOL: BlockId = BlockId(28);
    pub const INSPECT_OBJECT: BlockId = BlockId(32);

    pub const NUMBER: BlockId = BlockId(36);
    pub const VECTOR: BlockId = BlockId(38);
    pub const ROTATION: BlockId = BlockId(42);
    pub const TRUE: BlockId = BlockId(449);
    pub const FALSE: BlockId = BlockId(451);
    pub const OBJECT: BlockId = BlockId(453);

    pub const VARIABLE_NUMBER: BlockId = BlockId(46);
    pub const VARIABLE_VECTOR: BlockId = BlockId(48);
    pub const VARIABLE_ROTATION: BlockId = BlockId(50);
    pub const VARIABLE_BOOL: BlockId = BlockId(52);
    pub const VARIABLE_OBJECT: BlockId = BlockId(56);

    pub const SET_POINTER_NUMBER: BlockId = BlockId(58);
    pub const SET_POINTER_VECTOR: BlockId = BlockId(62);
    pub const SET_POINTER_ROTATION: BlockId = BlockId(66);
    pub const SET_POINTER_BOOL: BlockId = BlockId(70);
    pub const SET_POINTER_OBJECT: BlockId = BlockId(74);

    pub const LIST_NUMBER: BlockId = BlockId(82);
    pub const LIST_VECTOR: BlockId = BlockId(461);
    pub const LIST_ROTATION: BlockId = BlockId(465);
    pub const LIST_BOOL: BlockId = BlockId(469);
    pub const LIST_OBJECT: BlockId = BlockId(473);

    pub const SET_VARIABLE_NUMBER: BlockId = BlockId(428);
    pub const SET_VARIABLE_VECTOR: BlockId = BlockId(430);
    pub const SET_VARIABLE_ROTATION: BlockId = BlockId(432);
    pub const SET_VARIABLE_BOOL: BlockId = BlockId(434);
    pub const SET_VARIABLE_OBJECT: BlockId = BlockId(436);

    pub const INCREMENT: BlockId = BlockId(556);
    pub const DECREMENT: BlockId = BlockId(558);

    pub const NEGATE: BlockId = BlockId(90);
    pub const NOT: BlockId = BlockId(144);
    pub const INVERSE: BlockId = BlockId(440);
    pub const ABSOLUTE: BlockId = BlockId(455);
    pub const FLOOR: BlockId = BlockId(457);
    pub const CEILING: BlockId = BlockId(459);
    pub const ROUND: BlockId = BlockId(463);
    pub const SQUARE_ROOT: BlockId = BlockId(467);
    pub const SINE: BlockId = BlockId(471);
    pub const COSINE: BlockId = BlockId(475);
    pub const MAGNITUDE: BlockId = BlockId(477);
    pub const NORMALIZE: BlockId = BlockId(579);

    pub const ADD_NUMBERS: BlockId = BlockId(92);
    pub const ADD_VECTORS: BlockId = BlockId(96);
    pub const SUBTRACT_NUMBERS: BlockId = BlockId(100);
    pub const SUBTRACT_VECTORS: BlockId = BlockId(104);
    pub const MULTIPLY: BlockId = BlockId(108);
    pub const SCALE_VECTOR: BlockId = BlockId(112);
    pub const ROTATE_VECTOR: BlockId = BlockId(116);
    pub const COMBINE_ROTATIONS: BlockId = BlockId(120);
    pub const DIVIDE: BlockId = BlockId(124);
    pub const LESS_THAN: BlockId = BlockId(128);
    pub const EQUAL_NUMBERS: BlockId = BlockId(132);
    pub const EQUAL_VECTORS: BlockId = BlockId(136);
    pub const EQUAL_OBJECTS: BlockId = BlockId(140);
    pub const AND: BlockId = BlockId(146);
    pub const OR: BlockId = BlockId(148);
    pub const MODULO: BlockId = BlockId(172);
    pub const MIN: BlockId = BlockId(176);
    pub const MAX: BlockId = BlockId(180);
    pub const DISTANCE: BlockId = BlockId(184);
    pub const DOT: BlockId = BlockId(188);
    pub const CROSS: BlockId = BlockId(192);
    pub const POWER: BlockId = BlockId(196);
    pub const EQUAL_BOOLS: BlockId = BlockId(421);
    pub const GREATER_THAN: BlockId = BlockId(481);

    pub const RANDOM: BlockId = BlockId(485);
    pub const RANDOM_SEED: BlockId = BlockId(487);
    pub const LERP: BlockId = BlockId(200);
    pub const AXIS_ANGLE: BlockId = BlockId(204);
    pub const LOOK_ROTATION: BlockId = BlockId(208);
    pub const WORLD_TO_SCREEN: BlockId = BlockId(212);
    pub const SCREEN_TO_WORLD: BlockId = BlockId(216);

    pub const MAKE_VECTOR: BlockId = BlockId(150);
    pub const BREAK_VECTOR: BlockId = BlockId(156);
    pub const MAKE_ROTATION: BlockId = BlockId(162);
    pub const BREAK_ROTATION: BlockId = BlockId(168);

    pub const SCREEN_SIZE: BlockId = BlockId(220);
    pub const ACCELEROMETER: BlockId = BlockId(224);
    pub const RAYCAST: BlockId = BlockId(228);
    pub const CURRENT_FRAME: BlockId = BlockId(242);
    pub const GET_POSITION: BlockId = BlockId(278);
    pub const GET_VELOCITY: BlockId = BlockId(288);
    pub const GET_SIZE: BlockId = BlockId(489);

    pub const IF: BlockId = BlockId(234);
    pub const PLAY_SENSOR: BlockId = BlockId(238);
    pub const SWIPE_SENSOR: BlockId = BlockId(248);
    pub const COLLISION: BlockId = BlockId(401);
    pub const BOX_ART_SENSOR: BlockId = BlockId(409);
    pub const TOUCH_SENSOR: BlockId = BlockId(412);
    pub const LOOP: BlockId = BlockId(560);
    pub const BUTTON: BlockId = BlockId(588);
    pub const JOYSTICK: BlockId = BlockId(592);

    pub const WIN: BlockId = BlockId(252);
    pub const LOSE: BlockId = BlockId(256);
    pub const SET_SCORE: BlockId = BlockId(260);
    pub const PLAY_SOUND: BlockId = BlockId(264);
    pub const SET_CAMERA: BlockId = BlockId(268);
    pub const SET_LIGHT: BlockId = BlockId(274);
    pub const SET_POSITION: BlockId = BlockId(282);
    pub const SET_VELOCITY: BlockId = BlockId(292);
    pub const ADD_FORCE: BlockId = BlockId(298);
    pub const SET_VISIBLE: BlockId = BlockId(306);
    pub const CREATE_OBJECT: BlockId = BlockId(316);
    pub const DESTROY_OBJECT: BlockId = BlockId(320);
    pub const VOLUME_PITCH: BlockId = BlockId(391);
    pub const STOP_SOUND: BlockId = BlockId(397);

    pub const LABEL: BlockId = BlockId(584);
    pub const GOTO: BlockId = BlockId(586);
}

// ─── Layout Table ──────────────────────────────────────────────────

const fn left(name: &'static str, wire: WireType) -> TermDef {
    TermDef {
        name,
        wire,
        side: Side::Left,
    }
}

const fn right(name: &'static str, wire: WireType) -> TermDef {
    TermDef {
        name,
        wire,
        side: Side::Right,
    }
}

const BEFORE: TermDef = TermDef {
    name: "Before",
    wire: WireType::VOID,
    side: Side::Before,
};

const AFTER: TermDef = TermDef {
    name: "After",
    wire: WireType::VOID,
    side: Side::After,
};

const NUM: WireType = WireType::NUMBER;
const VEC: WireType = WireType::VECTOR;
const ROT: WireType = WireType::ROTATION;
const BOOL: WireType = WireType::BOOL;
const OBJ: WireType = WireType::OBJECT;
const VOID: WireType = WireType::VOID;
const NUM_PTR: WireType = WireType::pointer(SignalKind::Number);
const VEC_PTR: WireType = WireType::pointer(SignalKind::Vector);
const ROT_PTR: WireType = WireType::pointer(SignalKind::Rotation);
const BOOL_PTR: WireType = WireType::pointer(SignalKind::Bool);
const OBJ_PTR: WireType = WireType::pointer(SignalKind::Object);

const fn def(
    id: BlockId,
    name: &'static str,
    family: Family,
    terminals: &'static [TermDef],
) -> BlockDef {
    BlockDef {
        id,
        name,
        family,
        width: 2,
        terminals,
    }
}

use ids::*;

static BLOCKS: &[BlockDef] = &[
    def(COMMENT, "Comment", Family::Inert, &[]),
    // Inspect
    def(INSPECT_NUMBER, "Inspect Number", Family::Inspect, &[BEFORE, left("Number", NUM), AFTER]),
    def(INSPECT_VECTOR, "Inspect Vector", Family::Inspect, &[BEFORE, left("Vector", VEC), AFTER]),
    def(INSPECT_ROTATION, "Inspect Rotation", Family::Inspect, &[BEFORE, left("Rotation", ROT), AFTER]),
    def(INSPECT_BOOL, "Inspect Truth", Family::Inspect, &[BEFORE, left("Truth", BOOL), AFTER]),
    def(INSPECT_OBJECT, "Inspect Object", Family::Inspect, &[BEFORE, left("Object", OBJ), AFTER]),
    // Literals
    def(NUMBER, "Number", Family::Literal, &[right("Number", NUM)]),
    def(VECTOR, "Vector", Family::Literal, &[right("Vector", VEC)]),
    def(ROTATION, "Rotation", Family::Literal, &[right("Rotation", ROT)]),
    def(TRUE, "True", Family::Literal, &[right("True", BOOL)]),
    def(FALSE, "False", Family::Literal, &[right("False", BOOL)]),
    def(OBJECT, "Object", Family::Literal, &[right("Object", OBJ)]),
    // Variables
    def(VARIABLE_NUMBER, "Number Variable", Family::GetVariable, &[right("Number", NUM_PTR)]),
    def(VARIABLE_VECTOR, "Vector Variable", Family::GetVariable, &[right("Vector", VEC_PTR)]),
    def(VARIABLE_ROTATION, "Rotation Variable", Family::GetVariable, &[right("Rotation", ROT_PTR)]),
    def(VARIABLE_BOOL, "Truth Variable", Family::GetVariable, &[right("Truth", BOOL_PTR)]),
    def(VARIABLE_OBJECT, "Object Variable", Family::GetVariable, &[right("Object", OBJ_PTR)]),
    def(SET_VARIABLE_NUMBER, "Set Number Variable", Family::SetVariable, &[BEFORE, left("Value", NUM), AFTER]),
    def(SET_VARIABLE_VECTOR, "Set Vector Variable", Family::SetVariable, &[BEFORE, left("Value", VEC), AFTER]),
    def(SET_VARIABLE_ROTATION, "Set Rotation Variable", Family::SetVariable, &[BEFORE, left("Value", ROT), AFTER]),
    def(SET_VARIABLE_BOOL, "Set Truth Variable", Family::SetVariable, &[BEFORE, left("Value", BOOL), AFTER]),
    def(SET_VARIABLE_OBJECT, "Set Object Variable", Family::SetVariable, &[BEFORE, left("Value", OBJ), AFTER]),
    def(SET_POINTER_NUMBER, "Set Number", Family::SetPointer, &[BEFORE, left("Variable", NUM_PTR), left("Value", NUM), AFTER]),
    def(SET_POINTER_VECTOR, "Set Vector", Family::SetPointer, &[BEFORE, left("Variable", VEC_PTR), left("Value", VEC), AFTER]),
    def(SET_POINTER_ROTATION, "Set Rotation", Family::SetPointer, &[BEFORE, left("Variable", ROT_PTR), left("Value", ROT), AFTER]),
    def(SET_POINTER_BOOL, "Set Truth", Family::SetPointer, &[BEFORE, left("Variable", BOOL_PTR), left("Value", BOOL), AFTER]),
    def(SET_POINTER_OBJECT, "Set Object", Family::SetPointer, &[BEFORE, left("Variable", OBJ_PTR), left("Value", OBJ), AFTER]),
    def(LIST_NUMBER, "List Number", Family::ListElement, &[left("Variable", NUM_PTR), left("Index", NUM), right("Element", NUM_PTR)]),
    def(LIST_VECTOR, "List Vector", Family::ListElement, &[left("Variable", VEC_PTR), left("Index", NUM), right("Element", VEC_PTR)]),
    def(LIST_ROTATION, "List Rotation", Family::ListElement, &[left("Variable", ROT_PTR), left("Index", NUM), right("Element", ROT_PTR)]),
    def(LIST_BOOL, "List Truth", Family::ListElement, &[left("Variable", BOOL_PTR), left("Index", NUM), right("Element", BOOL_PTR)]),
    def(LIST_OBJECT, "List Object", Family::ListElement, &[left("Variable", OBJ_PTR), left("Index", NUM), right("Element", OBJ_PTR)]),
    def(INCREMENT, "Increase Number", Family::StepVariable, &[BEFORE, left("Variable", NUM_PTR), AFTER]),
    def(DECREMENT, "Decrease Number", Family::StepVariable, &[BEFORE, left("Variable", NUM_PTR), AFTER]),
    // Unary math
    def(NEGATE, "Negate", Family::Unary, &[left("Num", NUM), right("Negative", NUM)]),
    def(NOT, "Not", Family::Unary, &[left("Tru", BOOL), right("Not Tru", BOOL)]),
    def(INVERSE, "Inverse", Family::Unary, &[left("Rot", ROT), right("Inverse", ROT)]),
    def(ABSOLUTE, "Absolute", Family::Unary, &[left("Num", NUM), right("Absolute", NUM)]),
    def(FLOOR, "Floor", Family::Unary, &[left("Num", NUM), right("Floor", NUM)]),
    def(CEILING, "Ceiling", Family::Unary, &[left("Num", NUM), right("Ceiling", NUM)]),
    def(ROUND, "Round", Family::Unary, &[left("Num", NUM), right("Rounded", NUM)]),
    def(SQUARE_ROOT, "Square Root", Family::Unary, &[left("Num", NUM), right("Root", NUM)]),
    def(SINE, "Sine", Family::Unary, &[left("Degrees", NUM), right("Sine", NUM)]),
    def(COSINE, "Cosine", Family::Unary, &[left("Degrees", NUM), right("Cosine", NUM)]),
    def(MAGNITUDE, "Magnitude", Family::Unary, &[left("Vec", VEC), right("Magnitude", NUM)]),
    def(NORMALIZE, "Normalize", Family::Unary, &[left("Vec", VEC), right("Normalized", VEC)]),
    // Binary math
    def(ADD_NUMBERS, "Add Numbers", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Sum", NUM)]),
    def(ADD_VECTORS, "Add Vectors", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Sum", VEC)]),
    def(SUBTRACT_NUMBERS, "Subtract Numbers", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Difference", NUM)]),
    def(SUBTRACT_VECTORS, "Subtract Vectors", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Difference", VEC)]),
    def(MULTIPLY, "Multiply", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Product", NUM)]),
    def(SCALE_VECTOR, "Scale Vector", Family::Binary, &[left("Vec", VEC), left("Num", NUM), right("Product", VEC)]),
    def(ROTATE_VECTOR, "Rotate Vector", Family::Binary, &[left("Vec", VEC), left("Rot", ROT), right("Rotated", VEC)]),
    def(COMBINE_ROTATIONS, "Combine Rotations", Family::Binary, &[left("Rot1", ROT), left("Rot2", ROT), right("Combined", ROT)]),
    def(DIVIDE, "Divide", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Quotient", NUM)]),
    def(LESS_THAN, "Less Than", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Tru", BOOL)]),
    def(GREATER_THAN, "Greater Than", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Tru", BOOL)]),
    def(EQUAL_NUMBERS, "Equal Numbers", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Tru", BOOL)]),
    def(EQUAL_VECTORS, "Equal Vectors", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Tru", BOOL)]),
    def(EQUAL_OBJECTS, "Equal Objects", Family::Binary, &[left("Obj1", OBJ), left("Obj2", OBJ), right("Tru", BOOL)]),
    def(EQUAL_BOOLS, "Equal Truths", Family::Binary, &[left("Tru1", BOOL), left("Tru2", BOOL), right("Tru", BOOL)]),
    def(AND, "And", Family::Binary, &[left("Tru1", BOOL), left("Tru2", BOOL), right("Tru", BOOL)]),
    def(OR, "Or", Family::Binary, &[left("Tru1", BOOL), left("Tru2", BOOL), right("Tru", BOOL)]),
    def(MODULO, "Modulo", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Remainder", NUM)]),
    def(MIN, "Min", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Min", NUM)]),
    def(MAX, "Max", Family::Binary, &[left("Num1", NUM), left("Num2", NUM), right("Max", NUM)]),
    def(POWER, "Power", Family::Binary, &[left("Base", NUM), left("Exponent", NUM), right("Power", NUM)]),
    def(DISTANCE, "Distance", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Distance", NUM)]),
    def(DOT, "Dot Product", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Dot", NUM)]),
    def(CROSS, "Cross Product", Family::Binary, &[left("Vec1", VEC), left("Vec2", VEC), right("Cross", VEC)]),
    // Other math
    def(RANDOM, "Random", Family::Random, &[left("Min", NUM), left("Max", NUM), right("Random", NUM)]),
    def(LERP, "Lerp", Family::Lerp, &[left("From", ROT), left("To", ROT), left("Amount", NUM), right("Rotation", ROT)]),
    def(AXIS_ANGLE, "Axis Angle", Family::AxisAngle, &[left("Axis", VEC), left("Angle", NUM), right("Rotation", ROT)]),
    def(LOOK_ROTATION, "Look Rotation", Family::LookRotation, &[left("Direction", VEC), left("Up", VEC), right("Rotation", ROT)]),
    def(WORLD_TO_SCREEN, "World To Screen", Family::WorldToScreen, &[left("World Pos", VEC), right("Screen X", NUM), right("Screen Y", NUM)]),
    def(SCREEN_TO_WORLD, "Screen To World", Family::ScreenToWorld, &[left("Screen X", NUM), left("Screen Y", NUM), right("World Near", VEC), right("World Far", VEC)]),
    def(MAKE_VECTOR, "Make Vector", Family::Make, &[left("X", NUM), left("Y", NUM), left("Z", NUM), right("Vector", VEC)]),
    def(MAKE_ROTATION, "Make Rotation", Family::Make, &[left("X", NUM), left("Y", NUM), left("Z", NUM), right("Rotation", ROT)]),
    def(BREAK_VECTOR, "Break Vector", Family::Break, &[left("Vector", VEC), right("X", NUM), right("Y", NUM), right("Z", NUM)]),
    def(BREAK_ROTATION, "Break Rotation", Family::Break, &[left("Rotation", ROT), right("X", NUM), right("Y", NUM), right("Z", NUM)]),
    // Queries
    def(SCREEN_SIZE, "Screen Size", Family::Query, &[right("Width", NUM), right("Height", NUM)]),
    def(ACCELEROMETER, "Accelerometer", Family::Query, &[right("Direction", VEC)]),
    def(CURRENT_FRAME, "Current Frame", Family::Query, &[right("Counter", NUM)]),
    def(GET_POSITION, "Get Position", Family::Query, &[left("Object", OBJ), right("Position", VEC), right("Rotation", ROT)]),
    def(GET_VELOCITY, "Get Velocity", Family::Query, &[left("Object", OBJ), right("Velocity", VEC), right("Spin", VEC)]),
    def(GET_SIZE, "Get Size", Family::Query, &[left("Object", OBJ), right("Min", VEC), right("Max", VEC)]),
    def(RAYCAST, "Raycast", Family::Query, &[left("From", VEC), left("To", VEC), right("Hit", BOOL), right("Hit Pos", VEC), right("Hit Obj", OBJ)]),
    // Control
    def(IF, "If", Family::If, &[BEFORE, left("Condition", BOOL), right("True", VOID), right("False", VOID), AFTER]),
    def(LOOP, "Loop", Family::Loop, &[BEFORE, left("Start", NUM), left("Stop", NUM), right("Do", VOID), right("Counter", NUM), AFTER]),
    def(PLAY_SENSOR, "Play Sensor", Family::Event, &[BEFORE, right("On Play", VOID), AFTER]),
    def(BOX_ART_SENSOR, "Box Art Sensor", Family::Event, &[BEFORE, right("On Screenshot", VOID), AFTER]),
    def(TOUCH_SENSOR, "Touch Sensor", Family::Event, &[BEFORE, right("Touched", VOID), right("Screen X", NUM), right("Screen Y", NUM), AFTER]),
    def(SWIPE_SENSOR, "Swipe Sensor", Family::Event, &[BEFORE, right("Swiped", VOID), right("Direction", VEC), AFTER]),
    def(BUTTON, "Button", Family::Event, &[BEFORE, right("Button", VOID), AFTER]),
    def(JOYSTICK, "Joystick", Family::Event, &[BEFORE, right("Joy Dir", VEC), AFTER]),
    def(COLLISION, "Collision", Family::Event, &[BEFORE, left("1st Object", OBJ), right("Collided", VOID), right("2nd Object", OBJ), right("Impulse", NUM), right("Normal", VEC), AFTER]),
    // Game
    def(WIN, "Win", Family::Game, &[BEFORE, AFTER]),
    def(LOSE, "Lose", Family::Game, &[BEFORE, AFTER]),
    def(SET_SCORE, "Set Score", Family::Game, &[BEFORE, left("Score", NUM), left("Coins", NUM), AFTER]),
    def(SET_CAMERA, "Set Camera", Family::Game, &[BEFORE, left("Position", VEC), left("Rotation", ROT), left("Range", NUM), AFTER]),
    def(SET_LIGHT, "Set Light", Family::Game, &[BEFORE, left("Position", VEC), left("Rotation", ROT), AFTER]),
    def(RANDOM_SEED, "Random Seed", Family::Game, &[BEFORE, left("Seed", NUM), AFTER]),
    // Objects and physics
    def(SET_POSITION, "Set Position", Family::Object, &[BEFORE, left("Object", OBJ), left("Position", VEC), left("Rotation", ROT), AFTER]),
    def(SET_VISIBLE, "Set Visible", Family::Object, &[BEFORE, left("Object", OBJ), left("Visible", BOOL), AFTER]),
    def(CREATE_OBJECT, "Create Object", Family::Object, &[BEFORE, left("Original", OBJ), right("Copy", OBJ), AFTER]),
    def(DESTROY_OBJECT, "Destroy Object", Family::Object, &[BEFORE, left("Object", OBJ), AFTER]),
    def(SET_VELOCITY, "Set Velocity", Family::Object, &[BEFORE, left("Object", OBJ), left("Velocity", VEC), left("Spin", VEC), AFTER]),
    def(ADD_FORCE, "Add Force", Family::Object, &[BEFORE, left("Object", OBJ), left("Force", VEC), left("Torque", VEC), AFTER]),
    // Sound
    def(PLAY_SOUND, "Play Sound", Family::Sound, &[BEFORE, left("Volume", NUM), left("Pitch", NUM), right("Channel", NUM), AFTER]),
    def(STOP_SOUND, "Stop Sound", Family::Sound, &[BEFORE, left("Channel", NUM), AFTER]),
    def(VOLUME_PITCH, "Volume Pitch", Family::Sound, &[BEFORE, left("Channel", NUM), left("Volume", NUM), left("Pitch", NUM), AFTER]),
    // Jumps
    def(LABEL, "Label", Family::Label, &[AFTER]),
    def(GOTO, "Goto", Family::Goto, &[BEFORE]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for def in all() {
            assert!(seen.insert(def.id), "duplicate id {}", def.id);
        }
    }

    #[test]
    fn test_builtins_below_threshold() {
        for def in all() {
            assert!(def.id.0 < crate::graph::DEFAULT_BUILTIN_THRESHOLD, "{}", def.name);
        }
    }

    #[test]
    fn test_keys_unique_per_block() {
        for def in all() {
            let layout = def.layout();
            let keys: BTreeSet<_> = layout.iter().map(|t| t.key).collect();
            assert_eq!(keys.len(), layout.len(), "{}", def.name);
        }
    }

    #[test]
    fn test_if_layout() {
        let def = lookup(ids::IF).unwrap();
        assert_eq!(def.depth(), 2);
        assert_eq!(def.key("Before"), Some(TerminalKey::new(3, 1, 15)));
        assert_eq!(def.key("After"), Some(TerminalKey::new(3, 1, 0)));
        assert_eq!(def.key("Condition"), Some(TerminalKey::new(0, 1, 11)));
        assert_eq!(def.key("True"), Some(TerminalKey::new(15, 1, 11)));
        assert_eq!(def.key("False"), Some(TerminalKey::new(15, 1, 3)));
    }

    #[test]
    fn test_statement_blocks_have_before() {
        let statements = [
            Family::If,
            Family::Loop,
            Family::Event,
            Family::SetVariable,
            Family::SetPointer,
            Family::StepVariable,
            Family::Inspect,
            Family::Object,
            Family::Sound,
            Family::Game,
            Family::Goto,
        ];
        for def in all().iter().filter(|d| statements.contains(&d.family)) {
            assert_eq!(def.terminals[0].side, Side::Before, "{}", def.name);
        }
    }
}
