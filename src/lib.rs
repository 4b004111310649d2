//! Snack Dash - a falling-food nutrition arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, action resolution, session state)
//! - `difficulty`: Injected difficulty profiles (pacing, penalties, win predicates)
//! - `foods`: Data-driven food definition tables with weighted spawn sampling
//! - `summary`: Post-game summary built from the session's metric history

pub mod difficulty;
pub mod foods;
pub mod sim;
pub mod summary;

pub use difficulty::DifficultyProfile;
pub use summary::SessionSummary;

/// Game configuration constants
pub mod consts {
    /// Fast (movement) loop rate in Hz
    pub const FAST_HZ: u32 = 30;
    /// Fixed fast-loop timestep
    pub const SIM_DT: f32 = 1.0 / FAST_HZ as f32;
    /// Fast ticks per countdown (1 Hz) tick
    pub const FAST_TICKS_PER_SECOND: u64 = FAST_HZ as u64;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Board dimensions (logical units, y grows downward)
    pub const BOARD_WIDTH: f32 = 400.0;
    /// Y coordinate where entities spawn
    pub const SPAWN_Y: f32 = -40.0;
    /// Y coordinate an unresolved entity must cross to count as a miss
    pub const MISS_BOUNDARY_Y: f32 = 640.0;
    /// Horizontal margin kept clear on both sides in Classic mode
    pub const CLASSIC_SIDE_MARGIN: f32 = 20.0;
    /// Life mode reserves wider side margins for the fixed panels
    pub const LIFE_SIDE_MARGIN: f32 = 64.0;

    /// Metric scale bounds
    pub const METRIC_MIN: f32 = 0.0;
    pub const METRIC_MAX: f32 = 100.0;
    /// A metric at this value is "balanced"
    pub const METRIC_BALANCED: f32 = 50.0;

    /// Immediate-defeat thresholds
    pub const CLASSIC_DEFEAT_LOW: f32 = 5.0;
    pub const CLASSIC_DEFEAT_HIGH: f32 = 95.0;
    pub const LIFE_DEFEAT_FLOOR: f32 = 5.0;

    /// Combo recency window in seconds
    pub const COMBO_WINDOW_SECS: f32 = 2.0;

    /// Plot twist scheduling
    pub const TWIST_DELAY_MIN_SECS: u32 = 15;
    pub const TWIST_DELAY_MAX_SECS: u32 = 35;
    pub const TWIST_MIN_TIME_LEFT: u32 = 10;
    pub const MAX_TWISTS_PER_SESSION: u32 = 2;

    /// Power-up charges per session
    pub const POWER_UP_CHARGES: u8 = 3;

    /// Bounded per-second metrics history length
    pub const MAX_HISTORY: usize = 300;

    /// Transient announcement lifetime in countdown ticks
    pub const ANNOUNCEMENT_TTL_SECS: u32 = 2;
}

/// Clamp a metric scalar to the [0, 100] scale
#[inline]
pub fn clamp_metric(value: f32) -> f32 {
    value.clamp(consts::METRIC_MIN, consts::METRIC_MAX)
}
