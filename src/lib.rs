// gravsim - Damped planar N-body gravity core
// Stepped once per control tick by a real-time host

pub mod config;
pub mod diagnostics;
pub mod gravity_math;
pub mod physics_engine;
pub mod state_manager;

pub use config::{ConfigError, EngineConfig};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, NullSink, RecordingSink, TracingSink, ValidationError,
};
pub use gravity_math::{GravityMath, Vector};
pub use physics_engine::{
    Body, Gravity, Preset, MAX_BODIES, MIN_BODIES, NUDGE_STEPS, PRESET_COUNT,
};
pub use state_manager::{start_simulation_loop, FrameBody, FrameState, SimulationHost};
