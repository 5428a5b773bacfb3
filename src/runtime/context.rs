//! The host boundary the interpreter runs against.
//!
//! The interpreter owns no world state. Variables, randomness, input,
//! physics and every effect go through [`RuntimeContext`]. Only the frame
//! counter and variable storage are required; everything else has a
//! neutral default so a host implements what it supports.

use crate::error::{BlockRef, PhysicsError};
use crate::math::{Camera, Rot, Vec3};
use crate::signal::{ObjectHandle, RuntimeValue, VariableReference};
use crate::syntax::node::{ButtonKind, JoystickKind, TouchState};

/// A raycast that hit something.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub position: Vec3,
    pub object: ObjectHandle,
}

/// A collision reported for an object this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub other: ObjectHandle,
    pub impulse: f32,
    pub normal: Vec3,
}

pub trait RuntimeContext {
    /// Frames run so far; zero during the first frame.
    fn frame(&self) -> u64;

    /// The stored value, or `None` if the element was never written.
    fn get_variable(&self, reference: VariableReference) -> Option<RuntimeValue>;

    fn set_variable(&mut self, reference: VariableReference, value: RuntimeValue);

    // ─── Randomness ────────────────────────────────────────────────

    /// A number in `[min, max)`.
    fn random(&mut self, min: f32, _max: f32) -> f32 {
        min
    }

    fn set_seed(&mut self, _seed: f32) {}

    // ─── Debugging ─────────────────────────────────────────────────

    fn inspect(&mut self, _block: &BlockRef, _value: RuntimeValue) {}

    // ─── Input ─────────────────────────────────────────────────────

    fn screen_size(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    fn accelerometer(&self) -> Vec3 {
        Vec3::ZERO
    }

    /// True while the host renders the game's box art.
    fn is_box_art(&self) -> bool {
        false
    }

    /// Screen position of `finger` when it is in `state` this frame.
    fn touch(&self, _state: TouchState, _finger: u8) -> Option<(f32, f32)> {
        None
    }

    fn swipe(&self) -> Option<Vec3> {
        None
    }

    fn button(&self, _kind: ButtonKind) -> bool {
        false
    }

    fn joystick(&self, _kind: JoystickKind) -> Vec3 {
        Vec3::ZERO
    }

    fn camera(&self) -> Camera {
        Camera::default()
    }

    // ─── Objects And Physics ───────────────────────────────────────

    fn object_position(&self, _object: ObjectHandle) -> (Vec3, Rot) {
        (Vec3::ZERO, Rot::IDENTITY)
    }

    /// Linear and angular velocity.
    fn object_velocity(&self, _object: ObjectHandle) -> (Vec3, Vec3) {
        (Vec3::ZERO, Vec3::ZERO)
    }

    /// Bounding box corners.
    fn object_size(&self, _object: ObjectHandle) -> (Vec3, Vec3) {
        (Vec3::ZERO, Vec3::ZERO)
    }

    fn raycast(&self, _from: Vec3, _to: Vec3) -> Result<Option<RayHit>, PhysicsError> {
        Ok(None)
    }

    fn collision(&self, _object: ObjectHandle) -> Result<Option<Contact>, PhysicsError> {
        Ok(None)
    }

    // ─── Effects ───────────────────────────────────────────────────

    fn win(&mut self, _delay: u8) {}

    fn lose(&mut self, _delay: u8) {}

    fn set_score(&mut self, _score: f32, _coins: f32, _ranking: u8) {}

    fn set_camera(&mut self, _camera: Camera) {}

    fn set_light(&mut self, _position: Vec3, _rotation: Rot) {}

    fn set_position(&mut self, _object: ObjectHandle, _position: Vec3, _rotation: Rot) {}

    fn set_visible(&mut self, _object: ObjectHandle, _visible: bool) {}

    fn set_velocity(&mut self, _object: ObjectHandle, _velocity: Vec3, _spin: Vec3) {}

    fn add_force(&mut self, _object: ObjectHandle, _force: Vec3, _torque: Vec3) {}

    /// Copy `original`; the copy's handle, or `NONE` if nothing was made.
    fn create_object(&mut self, _original: ObjectHandle) -> ObjectHandle {
        ObjectHandle::NONE
    }

    fn destroy_object(&mut self, _object: ObjectHandle) {}

    /// Start a sound; the channel it plays on, or -1.
    fn play_sound(&mut self, _sound: u8, _volume: f32, _pitch: f32, _looping: bool) -> f32 {
        -1.0
    }

    fn stop_sound(&mut self, _channel: f32) {}

    fn volume_pitch(&mut self, _channel: f32, _volume: f32, _pitch: f32) {}
}
