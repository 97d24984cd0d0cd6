//! Tweenline
//!
//! A timeline-based animation engine for DOM-like targets. Animations are
//! composed with a small async DSL (sequences, parallel tracks, iterations,
//! nested sub-players); the engine discovers the structure of an animation by
//! running the user's instructions on demand, records every structural event
//! in a marker index, and seeks forward and backward by walking those markers.

pub mod config;
pub mod dom;
pub mod easing;
pub mod engine;
pub mod error;
pub mod interpolation;
pub mod loaders;
pub mod params;
pub mod settings;
pub mod time;

// Re-export common types for convenience
pub use config::{EngineConfig, FRAME_MS, MAX_ASYNC};
pub use dom::{AnimationType, Element, ElementBackend, MemoryDocument, MemoryElement, Scope};
pub use easing::Easing;
pub use engine::{
    instruction, Anim, Instruction, PlayArguments, Player, ReleaseFuture, StepOutcome,
};
pub use error::AnimError;
pub use params::{AnimateParams, IterParams, PlayParams, PropValue, PropertySpec, Target};
pub use settings::SettingsPatch;
pub use time::{adjust_duration, Ms};

/// Engine result type
pub type Result<T> = std::result::Result<T, AnimError>;
