//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (movement at 30 Hz, countdown at 1 Hz)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod combo;
pub mod movement;
pub mod resolve;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod twist;

pub use combo::{COMBO_TIERS, ComboState, ComboTier, tier_for, tier_multiplier};
pub use resolve::{PowerUp, invoke_power_up, resolve};
pub use spawn::{ALLY_SPAWN_PROBABILITY, spawn_bounds};
pub use state::{
    Action, Announcement, BodyMetrics, Counters, Faction, FoodEntity, MetricDelta, MetricZone,
    MetricsSample, Mode, MorningCondition, Notification, SavedFood, SessionResult, SessionState,
    SocialMeter, TimePhase,
};
pub use tick::{SessionClock, SimEvent, apply};
pub use twist::{
    PlotTwist, PlotTwistId, RandomnessError, RandomnessProvider, TWIST_POOL, run_scheduler,
};
