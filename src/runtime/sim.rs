//! Headless reference host.
//!
//! `SimContext` keeps variables and a handful of objects in memory,
//! draws random numbers from a seeded xorshift64* generator and records
//! every inspect event and effect so callers can assert on them.

use std::collections::BTreeMap;

use crate::error::{BlockRef, PhysicsError};
use crate::math::{Camera, Rot, Vec3};
use crate::signal::{ObjectHandle, RuntimeValue, VariableReference};
use crate::syntax::node::{ButtonKind, JoystickKind, TouchState};

use super::context::{Contact, RayHit, RuntimeContext};

// ─── Pseudo-Random Number Generator ────────────────────────────────

/// xorshift64* stream behind the Random block.
///
/// Seeds pass through a splitmix64 finalizer first, so the small integer
/// seeds a Random Seed block usually gets (0, 1, 2, ...) start unrelated
/// streams instead of neighbouring xorshift states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub(crate) fn seeded(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // Zero is a fixed point of xorshift.
        Self { state: z.max(1) }
    }

    /// The stream a Random Seed block selects with `seed`.
    pub(crate) fn from_block_seed(seed: f32) -> Self {
        Self::seeded(u64::from(seed.to_bits()))
    }

    fn advance(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform between the two bounds, in either order. The upper bound is
    /// excluded.
    pub(crate) fn between(&mut self, a: f32, b: f32) -> f32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        // 24 bits: every value is exact in an f32 mantissa.
        let unit = (self.advance() >> 40) as f32 / (1u64 << 24) as f32;
        let r = lo + (hi - lo) * unit;
        if r < hi { r } else { lo }
    }
}

// ─── Recorded Events ───────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Inspection {
    pub frame: u64,
    pub block: BlockRef,
    pub value: RuntimeValue,
}

/// A host effect requested by a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Win { delay: u8 },
    Lose { delay: u8 },
    Score { score: f32, coins: f32, ranking: u8 },
    Camera(Camera),
    Light { position: Vec3, rotation: Rot },
    Seed(f32),
    SetPosition { object: ObjectHandle, position: Vec3, rotation: Rot },
    SetVisible { object: ObjectHandle, visible: bool },
    SetVelocity { object: ObjectHandle, velocity: Vec3, spin: Vec3 },
    AddForce { object: ObjectHandle, force: Vec3, torque: Vec3 },
    Create { original: ObjectHandle, copy: ObjectHandle },
    Destroy(ObjectHandle),
    PlaySound { sound: u8, channel: f32, volume: f32, pitch: f32, looping: bool },
    StopSound(f32),
    VolumePitch { channel: f32, volume: f32, pitch: f32 },
}

// ─── Input And World State ─────────────────────────────────────────

/// Input the host reports for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InputState {
    pub screen: (f32, f32),
    pub accelerometer: Vec3,
    pub box_art: bool,
    pub touches: Vec<(TouchState, u8, (f32, f32))>,
    pub swipe: Option<Vec3>,
    pub buttons: Vec<ButtonKind>,
    pub joystick: Vec3,
    /// Collisions by the object that collided.
    pub contacts: BTreeMap<ObjectHandle, Contact>,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            screen: (1920.0, 1080.0),
            accelerometer: Vec3::ZERO,
            box_art: false,
            touches: Vec::new(),
            swipe: None,
            buttons: Vec::new(),
            joystick: Vec3::ZERO,
            contacts: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimObject {
    pub position: Vec3,
    pub rotation: Rot,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub visible: bool,
}

// ─── Context ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct SimContext {
    frame: u64,
    variables: BTreeMap<VariableReference, RuntimeValue>,
    rng: Rng,
    camera: Camera,
    next_channel: u32,
    pub input: InputState,
    pub objects: BTreeMap<ObjectHandle, SimObject>,
    pub inspections: Vec<Inspection>,
    pub effects: Vec<Effect>,
}

impl SimContext {
    pub fn new(seed: u64) -> Self {
        Self {
            frame: 0,
            variables: BTreeMap::new(),
            rng: Rng::seeded(seed),
            camera: Camera::default(),
            next_channel: 0,
            input: InputState::default(),
            objects: BTreeMap::new(),
            inspections: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Advance to the next frame. Per-frame input (touches, swipe,
    /// buttons, contacts) is cleared.
    pub fn next_frame(&mut self) {
        self.frame += 1;
        self.input.touches.clear();
        self.input.swipe = None;
        self.input.buttons.clear();
        self.input.contacts.clear();
    }

    pub fn variables(&self) -> &BTreeMap<VariableReference, RuntimeValue> {
        &self.variables
    }

    /// Add an object to the world under `handle`.
    pub fn spawn(&mut self, handle: ObjectHandle, object: SimObject) {
        self.objects.insert(handle, object);
    }

    fn object(&self, handle: ObjectHandle) -> SimObject {
        self.objects.get(&handle).copied().unwrap_or_default()
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RuntimeContext for SimContext {
    fn frame(&self) -> u64 {
        self.frame
    }

    fn get_variable(&self, reference: VariableReference) -> Option<RuntimeValue> {
        self.variables.get(&reference).copied()
    }

    fn set_variable(&mut self, reference: VariableReference, value: RuntimeValue) {
        self.variables.insert(reference, value);
    }

    fn random(&mut self, min: f32, max: f32) -> f32 {
        self.rng.between(min, max)
    }

    fn set_seed(&mut self, seed: f32) {
        self.rng = Rng::from_block_seed(seed);
        self.effects.push(Effect::Seed(seed));
    }

    fn inspect(&mut self, block: &BlockRef, value: RuntimeValue) {
        self.inspections.push(Inspection {
            frame: self.frame,
            block: block.clone(),
            value,
        });
    }

    fn screen_size(&self) -> (f32, f32) {
        self.input.screen
    }

    fn accelerometer(&self) -> Vec3 {
        self.input.accelerometer
    }

    fn is_box_art(&self) -> bool {
        self.input.box_art
    }

    fn touch(&self, state: TouchState, finger: u8) -> Option<(f32, f32)> {
        self.input
            .touches
            .iter()
            .find(|(s, f, _)| *s == state && *f == finger)
            .map(|(_, _, at)| *at)
    }

    fn swipe(&self) -> Option<Vec3> {
        self.input.swipe
    }

    fn button(&self, kind: ButtonKind) -> bool {
        self.input.buttons.contains(&kind)
    }

    fn joystick(&self, _kind: JoystickKind) -> Vec3 {
        self.input.joystick
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn object_position(&self, object: ObjectHandle) -> (Vec3, Rot) {
        let o = self.object(object);
        (o.position, o.rotation)
    }

    fn object_velocity(&self, object: ObjectHandle) -> (Vec3, Vec3) {
        let o = self.object(object);
        (o.velocity, o.spin)
    }

    fn object_size(&self, object: ObjectHandle) -> (Vec3, Vec3) {
        let o = self.object(object);
        let half = Vec3::new(0.5, 0.5, 0.5);
        (o.position - half, o.position + half)
    }

    fn raycast(&self, _from: Vec3, _to: Vec3) -> Result<Option<RayHit>, PhysicsError> {
        Ok(None)
    }

    fn collision(&self, object: ObjectHandle) -> Result<Option<Contact>, PhysicsError> {
        Ok(self.input.contacts.get(&object).copied())
    }

    fn win(&mut self, delay: u8) {
        self.effects.push(Effect::Win { delay });
    }

    fn lose(&mut self, delay: u8) {
        self.effects.push(Effect::Lose { delay });
    }

    fn set_score(&mut self, score: f32, coins: f32, ranking: u8) {
        self.effects.push(Effect::Score {
            score,
            coins,
            ranking,
        });
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.effects.push(Effect::Camera(camera));
    }

    fn set_light(&mut self, position: Vec3, rotation: Rot) {
        self.effects.push(Effect::Light { position, rotation });
    }

    fn set_position(&mut self, object: ObjectHandle, position: Vec3, rotation: Rot) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.position = position;
            o.rotation = rotation;
        }
        self.effects.push(Effect::SetPosition {
            object,
            position,
            rotation,
        });
    }

    fn set_visible(&mut self, object: ObjectHandle, visible: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.visible = visible;
        }
        self.effects.push(Effect::SetVisible { object, visible });
    }

    fn set_velocity(&mut self, object: ObjectHandle, velocity: Vec3, spin: Vec3) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.velocity = velocity;
            o.spin = spin;
        }
        self.effects.push(Effect::SetVelocity {
            object,
            velocity,
            spin,
        });
    }

    fn add_force(&mut self, object: ObjectHandle, force: Vec3, torque: Vec3) {
        self.effects.push(Effect::AddForce {
            object,
            force,
            torque,
        });
    }

    fn create_object(&mut self, original: ObjectHandle) -> ObjectHandle {
        let Some(source) = self.objects.get(&original).copied() else {
            return ObjectHandle::NONE;
        };
        let last = self.objects.keys().map(|h| h.0).max().unwrap_or(0);
        let Some(next) = last.checked_add(1) else {
            return ObjectHandle::NONE;
        };
        let copy = ObjectHandle(next);
        self.objects.insert(copy, source);
        self.effects.push(Effect::Create { original, copy });
        copy
    }

    fn destroy_object(&mut self, object: ObjectHandle) {
        self.objects.remove(&object);
        self.effects.push(Effect::Destroy(object));
    }

    fn play_sound(&mut self, sound: u8, volume: f32, pitch: f32, looping: bool) -> f32 {
        let channel = self.next_channel as f32;
        // Channel ids are recycled after u32::MAX sounds.
        self.next_channel = self.next_channel.wrapping_add(1);
        self.effects.push(Effect::PlaySound {
            sound,
            channel,
            volume,
            pitch,
            looping,
        });
        channel
    }

    fn stop_sound(&mut self, channel: f32) {
        self.effects.push(Effect::StopSound(channel));
    }

    fn volume_pitch(&mut self, channel: f32, volume: f32, pitch: f32) {
        self.effects.push(Effect::VolumePitch {
            channel,
            volume,
            pitch,
        });
    }
}
