//! Oracle Ball - an animated Magic 8-Ball
//!
//! Core modules:
//! - `oracle`: Interaction state store (shake, fetch, respond, reset)
//! - `motion`: Deterministic per-frame animation driver
//! - `shell`: Presentation shell (input mapping, status line)
//! - `api`: Wire types shared by client and server
//! - `client`: Prediction source trait and HTTP implementation
//! - `server`: Prediction endpoint proxying Gemini (native only)
//! - `settings`: User preferences
//! - `audio`: WebAudio cues (wasm only)

pub mod api;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod client;
pub mod motion;
pub mod oracle;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
pub mod settings;
pub mod shell;

pub use oracle::{InteractionState, Mode, OracleStore};
pub use settings::Settings;

/// Animation and interaction constants
pub mod consts {
    use glam::Vec3;

    /// Fixed animation timestep (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per rendered frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest real frame delta accepted before clamping (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Half-extents of the box the ball may wander in while shaking
    pub const BALL_BOUNDS: Vec3 = Vec3::new(0.6, 0.4, 0.3);
    /// Per-step velocity retention while shaking (~6% loss)
    pub const SHAKE_DAMPING: f32 = 0.94;
    /// Fraction of speed kept after bouncing off a bound
    pub const RESTITUTION: f32 = 0.7;
    /// Initial impulse magnitude when a shake starts
    pub const SHAKE_IMPULSE: f32 = 4.0;
    /// Initial angular impulse magnitude (rad/s)
    pub const SHAKE_SPIN_IMPULSE: f32 = 9.0;
    /// Per-step random velocity kick at full intensity
    pub const SHAKE_JITTER: f32 = 0.5;
    /// Per-step decay of shake intensity
    pub const SHAKE_INTENSITY_DECAY: f32 = 0.985;
    /// Shake intensity floor while the shake is still active
    pub const MIN_SHAKE_INTENSITY: f32 = 0.25;
    /// Angular velocity retention per step
    pub const SPIN_DAMPING: f32 = 0.96;

    /// Natural frequency of the return-to-origin spring (rad/s)
    pub const RETURN_OMEGA: f32 = 8.0;
    /// Idle rotation about Y (rad/s)
    pub const IDLE_SPIN: f32 = 0.35;
    /// Idle bob amplitude (world units)
    pub const BOB_AMPLITUDE: f32 = 0.05;
    /// Idle bob frequency (rad/s)
    pub const BOB_FREQUENCY: f32 = 1.6;

    /// Delay between the fetch resolving and the answer starting to emerge
    pub const REVEAL_DELAY: f32 = 0.7;
    /// Duration of the emerge easing
    pub const EMERGE_DURATION: f32 = 0.8;
    /// Carrier depth when hidden inside the ball
    pub const CARRIER_HIDDEN_DEPTH: f32 = -0.3;
    /// Carrier depth when pressed against the viewing window
    pub const CARRIER_FACE_DEPTH: f32 = 0.45;

    /// Rate at which the loading level follows its target (1/s)
    pub const LOADING_RESPONSE: f32 = 3.0;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-out on [0, 1]
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Current wall-clock time in milliseconds since the Unix epoch
#[inline]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_lerp() {
        assert!((lerp(2.0, 4.0, 0.5) - 3.0).abs() < 1e-6);
    }
}
