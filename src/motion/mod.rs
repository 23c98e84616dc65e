//! Deterministic animation driver
//!
//! Everything the ball does on screen is computed here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Reads the interaction state, never writes it
//! - No rendering or platform dependencies

pub mod animator;
pub mod bounds;
pub mod effects;
pub mod state;
pub mod tick;

pub use animator::Animator;
pub use bounds::{BounceResult, bounce_in_box, reflect_velocity};
pub use effects::{GLOW_IDLE, GLOW_LOADING, bob_offset, compose_frame};
pub use state::{BallPose, Effects, Frame, MotionState, TickInput, Uniforms};
pub use tick::tick;
