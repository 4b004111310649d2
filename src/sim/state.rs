//! Session state and core simulation types
//!
//! All state that must survive pause/resume and drive deterministic replay
//! lives here. The session is a single root aggregate; every mutation funnels
//! through `sim::tick::apply`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::clamp_metric;
use crate::consts::*;
use crate::difficulty::DifficultyProfile;
use crate::foods::FoodId;
use crate::sim::combo::ComboState;
use crate::sim::twist::PlotTwist;

/// Which rule set, win predicate and action set apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Consume/Reject only; the single stability scalar is the whole game
    #[default]
    Classic,
    /// All four actions, four-metric body model, plot twists
    Life,
}

impl Mode {
    /// Actions the mode's rules accept, regardless of profile
    pub fn allows(&self, action: Action) -> bool {
        match self {
            Mode::Classic => matches!(action, Action::Consume | Action::Reject),
            Mode::Life => true,
        }
    }
}

/// Player actions on a food entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Consume,
    Reject,
    Save,
    Share,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Consume, Action::Reject, Action::Save, Action::Share];
}

/// Food classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    /// Beneficial - consume it
    Ally,
    /// Harmful - reject it
    Enemy,
    /// Sign depends on the time-of-day phase at spawn
    Contextual,
}

/// Discrete time-of-day phase, derived from session progress.
/// Four contiguous bands covering the session duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePhase {
    Morning,
    Midday,
    Evening,
    Night,
}

impl TimePhase {
    /// Phase for a session progress fraction in [0, 1]
    pub fn from_progress(progress: f32) -> Self {
        if progress < 0.25 {
            TimePhase::Morning
        } else if progress < 0.5 {
            TimePhase::Midday
        } else if progress < 0.75 {
            TimePhase::Evening
        } else {
            TimePhase::Night
        }
    }

    /// Effect modifier for the phase. The sign resolves contextual foods at
    /// spawn; the magnitude scales positive effect vectors on consume.
    pub fn modifier(&self) -> f32 {
        match self {
            TimePhase::Morning => 1.15,
            TimePhase::Midday => 1.0,
            TimePhase::Evening => 0.85,
            TimePhase::Night => -0.9,
        }
    }
}

/// How the session's morning went; scales Life-mode drain rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MorningCondition {
    #[default]
    Rested,
    Groggy,
    Frazzled,
}

impl MorningCondition {
    /// Per-metric drain multipliers
    pub fn drain_multipliers(&self) -> MetricDelta {
        match self {
            MorningCondition::Rested => MetricDelta::uniform(1.0),
            MorningCondition::Groggy => MetricDelta {
                energy: 1.5,
                hydration: 1.0,
                nutrition: 1.0,
                stability: 1.2,
            },
            MorningCondition::Frazzled => MetricDelta {
                energy: 1.2,
                hydration: 1.3,
                nutrition: 1.0,
                stability: 1.5,
            },
        }
    }
}

/// A signed delta (or multiplier vector) over the four body metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricDelta {
    pub energy: f32,
    pub hydration: f32,
    pub nutrition: f32,
    pub stability: f32,
}

impl MetricDelta {
    pub const ZERO: MetricDelta = MetricDelta {
        energy: 0.0,
        hydration: 0.0,
        nutrition: 0.0,
        stability: 0.0,
    };

    pub const fn new(energy: f32, hydration: f32, nutrition: f32, stability: f32) -> Self {
        Self {
            energy,
            hydration,
            nutrition,
            stability,
        }
    }

    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(
            self.energy * factor,
            self.hydration * factor,
            self.nutrition * factor,
            self.stability * factor,
        )
    }

    /// Component-wise product (drain rate x condition multipliers)
    pub fn mul(&self, other: &MetricDelta) -> Self {
        Self::new(
            self.energy * other.energy,
            self.hydration * other.hydration,
            self.nutrition * other.nutrition,
            self.stability * other.stability,
        )
    }
}

/// Zone classification for a single metric scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricZone {
    Balanced,
    Warning,
    Critical,
}

/// The four-dimensional body-state vector, each scalar clamped to [0, 100].
/// Classic mode reads and writes only `stability`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub energy: f32,
    pub hydration: f32,
    pub nutrition: f32,
    pub stability: f32,
}

impl Default for BodyMetrics {
    fn default() -> Self {
        Self {
            energy: METRIC_BALANCED,
            hydration: METRIC_BALANCED,
            nutrition: METRIC_BALANCED,
            stability: METRIC_BALANCED,
        }
    }
}

impl BodyMetrics {
    /// Apply a signed delta, clamping every scalar to the metric scale
    pub fn apply(&mut self, delta: &MetricDelta) {
        self.energy = clamp_metric(self.energy + delta.energy);
        self.hydration = clamp_metric(self.hydration + delta.hydration);
        self.nutrition = clamp_metric(self.nutrition + delta.nutrition);
        self.stability = clamp_metric(self.stability + delta.stability);
    }

    /// Subtract per-second drain, clamped
    pub fn drain(&mut self, rate: &MetricDelta) {
        self.apply(&rate.scaled(-1.0));
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.energy, self.hydration, self.nutrition, self.stability]
    }

    pub fn zone(value: f32) -> MetricZone {
        if value <= 15.0 || value >= 85.0 {
            MetricZone::Critical
        } else if !(30.0..=70.0).contains(&value) {
            MetricZone::Warning
        } else {
            MetricZone::Balanced
        }
    }

    /// True if any metric has reached the given floor
    pub fn any_at_or_below(&self, floor: f32) -> bool {
        self.as_array().iter().any(|&v| v <= floor)
    }

    /// True if every metric is strictly above the given floor
    pub fn all_above(&self, floor: f32) -> bool {
        self.as_array().iter().all(|&v| v > floor)
    }
}

/// A falling food entity, owned by the session until missed or resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntity {
    pub id: u32,
    pub food: FoodId,
    pub faction: Faction,
    /// Per-metric effect on consume, each component in [-20, +20]
    pub effects: MetricDelta,
    /// Position on the board (y grows toward the boundary)
    pub pos: Vec2,
    /// Descent per fast tick
    pub speed: f32,
    /// Miss threshold on the travel axis
    pub boundary: f32,
    pub base_points: u32,
    /// Designated best action and its bonus multiplier, if any
    pub optimal: Option<(Action, f32)>,
    /// Resolved at spawn for Contextual foods from the phase modifier sign
    pub contextually_good: Option<bool>,
    /// Held by an in-progress gesture; held entities do not advance
    #[serde(default)]
    pub held: bool,
}

impl FoodEntity {
    /// Effective goodness after contextual resolution
    pub fn is_good(&self) -> bool {
        match self.faction {
            Faction::Ally => true,
            Faction::Enemy => false,
            Faction::Contextual => self.contextually_good.unwrap_or(false),
        }
    }
}

/// An entity stashed in the Life-mode "save for later" buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFood {
    pub food: FoodId,
    pub effects: MetricDelta,
}

/// Social sharing meter (Life mode)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SocialMeter {
    pub shares: u32,
    /// Consecutive shares without another action in between
    pub streak: u32,
    /// 0..=100; at 70+ shares earn a bonus multiplier
    pub meter: u32,
}

impl SocialMeter {
    pub fn record_share(&mut self) {
        self.shares += 1;
        self.streak += 1;
        self.meter = (self.meter + 8 + 2 * self.streak.min(5)).min(100);
    }

    pub fn break_streak(&mut self) {
        self.streak = 0;
    }
}

/// Running per-session action counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Counters {
    pub correct: u32,
    pub incorrect: u32,
    pub optimal_choices: u32,
}

/// Active plot twist bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotTwistState {
    pub active: Option<PlotTwist>,
    /// Seconds left on the active twist
    pub remaining: u32,
    /// Total twists fired this session (capped at 2)
    pub triggered: u32,
    /// Fast tick at which the scheduler next checks, None once exhausted
    pub next_check_tick: Option<u64>,
}

/// Power-up charge counters (max 3 each)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerUpCharges {
    pub exercise: u8,
    pub ration: u8,
}

impl Default for PowerUpCharges {
    fn default() -> Self {
        Self {
            exercise: POWER_UP_CHARGES,
            ration: POWER_UP_CHARGES,
        }
    }
}

/// Terminal result of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionResult {
    #[default]
    InProgress,
    Victory,
    Defeat,
}

/// Transient outcome banner shown after a resolution or miss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub remaining_secs: u32,
}

/// One per-second metrics sample for the post-game summary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsSample {
    pub elapsed_secs: u32,
    pub metrics: BodyMetrics,
}

/// Outbound event for external collaborators, drained by the embedder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Notification {
    /// A food was consumed; the nutrient payload feeds the external
    /// health-profile collaborator. The core does no glucose physiology.
    FoodConsumed { food: FoodId, nutrients: MetricDelta },
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub mode: Mode,
    pub score: u64,
    /// Counts down to 0 once per countdown tick
    pub time_remaining: u32,
    /// Fast (movement) tick counter; the session's monotonic clock
    pub fast_ticks: u64,
    pub metrics: BodyMetrics,
    /// Live entities, kept sorted by id for deterministic iteration
    pub entities: Vec<FoodEntity>,
    pub combo: ComboState,
    pub twist: PlotTwistState,
    pub saved_slots: [Option<SavedFood>; 3],
    pub social: SocialMeter,
    pub counters: Counters,
    pub result: SessionResult,
    pub paused: bool,
    pub charges: PowerUpCharges,
    pub morning: MorningCondition,
    /// Fast tick at which the spawner next fires
    pub next_spawn_tick: u64,
    /// Bounded per-second metrics history
    pub history: Vec<MetricsSample>,
    pub announcement: Option<Announcement>,
    /// Outbound notifications; drained by the embedding layer
    #[serde(skip)]
    pub outbox: Vec<Notification>,
    /// Serialized with the state so a restored snapshot replays identically
    rng: Pcg32,
    next_id: u32,
}

impl SessionState {
    /// Create a new session with the given seed, mode and profile
    pub fn new(seed: u64, mode: Mode, profile: &DifficultyProfile) -> Self {
        use rand::Rng;

        let mut rng = Pcg32::seed_from_u64(seed);
        let morning = match rng.random_range(0..3u8) {
            0 => MorningCondition::Rested,
            1 => MorningCondition::Groggy,
            _ => MorningCondition::Frazzled,
        };
        // First twist check lands 15-35s in (Life mode only)
        let twist_check = if mode == Mode::Life {
            let delay =
                rng.random_range(TWIST_DELAY_MIN_SECS..=TWIST_DELAY_MAX_SECS) as u64;
            Some(delay * FAST_TICKS_PER_SECOND)
        } else {
            None
        };
        let first_spawn =
            (profile.spawn_interval_initial * FAST_TICKS_PER_SECOND as f32) as u64;

        Self {
            seed,
            mode,
            score: 0,
            time_remaining: profile.duration_secs,
            fast_ticks: 0,
            metrics: BodyMetrics::default(),
            entities: Vec::new(),
            combo: ComboState::default(),
            twist: PlotTwistState {
                next_check_tick: twist_check,
                ..Default::default()
            },
            saved_slots: [None, None, None],
            social: SocialMeter::default(),
            counters: Counters::default(),
            result: SessionResult::InProgress,
            paused: false,
            charges: PowerUpCharges::default(),
            morning,
            next_spawn_tick: first_spawn,
            history: Vec::new(),
            announcement: None,
            outbox: Vec::new(),
            rng,
            next_id: 1,
        }
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Borrow the session RNG
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Seconds elapsed since session start
    pub fn elapsed_secs(&self, profile: &DifficultyProfile) -> u32 {
        profile.duration_secs.saturating_sub(self.time_remaining)
    }

    /// Current time-of-day phase from session progress
    pub fn current_phase(&self, profile: &DifficultyProfile) -> TimePhase {
        let progress =
            self.elapsed_secs(profile) as f32 / profile.duration_secs.max(1) as f32;
        TimePhase::from_progress(progress)
    }

    pub fn is_terminal(&self) -> bool {
        self.result != SessionResult::InProgress
    }

    /// Ensure entities are sorted by id for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    /// Append a metrics sample, dropping the oldest past the history cap
    pub fn record_history(&mut self, elapsed_secs: u32) {
        self.history.push(MetricsSample {
            elapsed_secs,
            metrics: self.metrics,
        });
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    pub fn announce(&mut self, text: impl Into<String>) {
        self.announcement = Some(Announcement {
            text: text.into(),
            remaining_secs: ANNOUNCEMENT_TTL_SECS,
        });
    }

    /// Drain pending outbound notifications
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}
