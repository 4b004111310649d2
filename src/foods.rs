//! Food definition tables
//!
//! Data-driven balance for the spawner: one table per spawn pool, each entry
//! carrying its faction, effect vector, points, descent speed and spawn
//! weight. Weighted selection goes through a precomputed cumulative-weight
//! table so a single uniform draw picks a definition in O(log n).

use std::sync::LazyLock;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::state::{Action, Faction, MetricDelta};

/// Closed set of food kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodId {
    // Ally pool
    Apple,
    Broccoli,
    Water,
    Salmon,
    Oatmeal,
    Yogurt,
    Almonds,
    // Contextual: good in daylight phases, bad at night
    Coffee,
    EnergyDrink,
    // Enemy pool
    Soda,
    CandyBar,
    Donut,
    Fries,
    HotDog,
}

impl FoodId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodId::Apple => "Apple",
            FoodId::Broccoli => "Broccoli",
            FoodId::Water => "Water",
            FoodId::Salmon => "Salmon",
            FoodId::Oatmeal => "Oatmeal",
            FoodId::Yogurt => "Yogurt",
            FoodId::Almonds => "Almonds",
            FoodId::Coffee => "Coffee",
            FoodId::EnergyDrink => "Energy Drink",
            FoodId::Soda => "Soda",
            FoodId::CandyBar => "Candy Bar",
            FoodId::Donut => "Donut",
            FoodId::Fries => "Fries",
            FoodId::HotDog => "Hot Dog",
        }
    }
}

/// Static definition of a spawnable food
#[derive(Debug, Clone, Copy)]
pub struct FoodDef {
    pub id: FoodId,
    pub faction: Faction,
    /// Effect on consume; every component in [-20, +20]
    pub effects: MetricDelta,
    pub base_points: u32,
    /// Descent in board units per fast tick
    pub speed: f32,
    /// Spawn weight within the pool
    pub weight: u32,
    /// Designated best action and its bonus multiplier
    pub optimal: Option<(Action, f32)>,
}

/// Pool rolled with the ~0.65 faction probability; contextual daylight
/// items ride along in this pool and resolve their sign at spawn.
pub static ALLY_POOL: [FoodDef; 9] = [
    FoodDef {
        id: FoodId::Apple,
        faction: Faction::Ally,
        effects: MetricDelta::new(4.0, 2.0, 8.0, 3.0),
        base_points: 10,
        speed: 3.6,
        weight: 20,
        optimal: None,
    },
    FoodDef {
        id: FoodId::Broccoli,
        faction: Faction::Ally,
        effects: MetricDelta::new(3.0, 1.0, 12.0, 4.0),
        base_points: 15,
        speed: 3.2,
        weight: 14,
        optimal: Some((Action::Consume, 1.25)),
    },
    FoodDef {
        id: FoodId::Water,
        faction: Faction::Ally,
        effects: MetricDelta::new(1.0, 15.0, 0.0, 2.0),
        base_points: 8,
        speed: 4.0,
        weight: 18,
        optimal: Some((Action::Consume, 1.25)),
    },
    FoodDef {
        id: FoodId::Salmon,
        faction: Faction::Ally,
        effects: MetricDelta::new(8.0, 0.0, 14.0, 5.0),
        base_points: 25,
        speed: 4.4,
        weight: 8,
        optimal: Some((Action::Save, 1.5)),
    },
    FoodDef {
        id: FoodId::Oatmeal,
        faction: Faction::Ally,
        effects: MetricDelta::new(10.0, 0.0, 9.0, 6.0),
        base_points: 15,
        speed: 3.0,
        weight: 12,
        optimal: None,
    },
    FoodDef {
        id: FoodId::Yogurt,
        faction: Faction::Ally,
        effects: MetricDelta::new(5.0, 3.0, 7.0, 3.0),
        base_points: 12,
        speed: 3.8,
        weight: 12,
        optimal: None,
    },
    FoodDef {
        id: FoodId::Almonds,
        faction: Faction::Ally,
        effects: MetricDelta::new(7.0, 0.0, 6.0, 4.0),
        base_points: 14,
        speed: 4.2,
        weight: 10,
        optimal: Some((Action::Share, 1.25)),
    },
    FoodDef {
        id: FoodId::Coffee,
        faction: Faction::Contextual,
        effects: MetricDelta::new(14.0, -5.0, 0.0, -4.0),
        base_points: 18,
        speed: 4.6,
        weight: 8,
        optimal: None,
    },
    FoodDef {
        id: FoodId::EnergyDrink,
        faction: Faction::Contextual,
        effects: MetricDelta::new(18.0, -8.0, -3.0, -9.0),
        base_points: 22,
        speed: 5.2,
        weight: 5,
        optimal: None,
    },
];

/// Pool rolled with the ~0.35 faction probability
pub static ENEMY_POOL: [FoodDef; 5] = [
    FoodDef {
        id: FoodId::Soda,
        faction: Faction::Enemy,
        effects: MetricDelta::new(5.0, -8.0, -6.0, -10.0),
        base_points: 12,
        speed: 4.0,
        weight: 20,
        optimal: Some((Action::Reject, 1.25)),
    },
    FoodDef {
        id: FoodId::CandyBar,
        faction: Faction::Enemy,
        effects: MetricDelta::new(8.0, 0.0, -8.0, -14.0),
        base_points: 14,
        speed: 4.4,
        weight: 18,
        optimal: None,
    },
    FoodDef {
        id: FoodId::Donut,
        faction: Faction::Enemy,
        effects: MetricDelta::new(6.0, -2.0, -10.0, -12.0),
        base_points: 14,
        speed: 3.6,
        weight: 16,
        optimal: None,
    },
    FoodDef {
        id: FoodId::Fries,
        faction: Faction::Enemy,
        effects: MetricDelta::new(4.0, -6.0, -7.0, -8.0),
        base_points: 12,
        speed: 3.4,
        weight: 16,
        optimal: None,
    },
    FoodDef {
        id: FoodId::HotDog,
        faction: Faction::Enemy,
        effects: MetricDelta::new(6.0, -4.0, -9.0, -11.0),
        base_points: 16,
        speed: 4.8,
        weight: 10,
        optimal: Some((Action::Reject, 1.5)),
    },
];

/// Precomputed cumulative-weight table over a food pool
pub struct CumulativeTable {
    pool: &'static [FoodDef],
    /// cumulative[i] = sum of weights of pool[..=i]
    cumulative: Vec<u32>,
    total: u32,
}

impl CumulativeTable {
    pub fn new(pool: &'static [FoodDef]) -> Self {
        let mut cumulative = Vec::with_capacity(pool.len());
        let mut total = 0u32;
        for def in pool {
            total += def.weight;
            cumulative.push(total);
        }
        Self {
            pool,
            cumulative,
            total,
        }
    }

    /// Pick a definition with probability proportional to its weight,
    /// reducing a single uniform draw across the cumulative sums.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> &'static FoodDef {
        let draw = rng.random_range(0..self.total);
        let idx = self.cumulative.partition_point(|&c| c <= draw);
        &self.pool[idx]
    }
}

pub static ALLY_TABLE: LazyLock<CumulativeTable> =
    LazyLock::new(|| CumulativeTable::new(&ALLY_POOL));
pub static ENEMY_TABLE: LazyLock<CumulativeTable> =
    LazyLock::new(|| CumulativeTable::new(&ENEMY_POOL));

/// Look up the static definition for a food id
pub fn def_for(id: FoodId) -> Option<&'static FoodDef> {
    ALLY_POOL
        .iter()
        .chain(ENEMY_POOL.iter())
        .find(|d| d.id == id)
}
