//! Immutable input data: [Task], [Agent] and [CompetitionConfig].
//!
//! Values arrive at the single validation boundary, [CompetitionConfig::validate] and the
//! constructors below, already coerced into the documented ranges. Downstream code (the
//! [scoring kernel](crate::scoring), the [evaluator](crate::fitness)) assumes finite, in-range
//! values and never re-validates.
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Difficulty tier of a [Task], driving the success-probability factor in
/// [scoring::success_probability](crate::scoring::success_probability).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DifficultyLevel {
    VeryEasy,
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl DifficultyLevel {
    /// Multiplicative factor applied to success probability.
    pub fn success_factor(self) -> f64 {
        match self {
            DifficultyLevel::VeryEasy => 1.2,
            DifficultyLevel::Easy => 1.1,
            DifficultyLevel::Medium => 1.0,
            DifficultyLevel::Hard => 0.9,
            DifficultyLevel::VeryHard => 0.8,
        }
    }
}

/// A scored, time-bounded problem to be solved during the competition.
///
/// Immutable for the duration of one [optimize](crate::evolve::optimize) call.
#[derive(Clone, Debug)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub difficulty: DifficultyLevel,
    pub base_points: u32,
    pub difficulty_multiplier: f64,
    pub required_skills: BTreeMap<String, f64>,
    pub time_limit_minutes: u32,
    pub historical_solve_rate: f64,
}

impl Task {
    /// Builds a task, clamping fields to the ranges the scoring kernel assumes. Clamping happens
    /// once, here at construction, rather than defensively on every scoring call.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        category: impl Into<String>,
        difficulty: DifficultyLevel,
        base_points: u32,
        difficulty_multiplier: f64,
        required_skills: BTreeMap<String, f64>,
        time_limit_minutes: u32,
        historical_solve_rate: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            difficulty,
            base_points: base_points.clamp(10, 1000),
            difficulty_multiplier: difficulty_multiplier.clamp(1.0, 5.0),
            required_skills,
            time_limit_minutes: time_limit_minutes.clamp(30, 300),
            historical_solve_rate: historical_solve_rate.clamp(0.0, 1.0),
        }
    }

    /// Default-filled task, for callers that only know a handful of fields (points 100,
    /// multiplier 1.0, limit 120, difficulty medium).
    pub fn with_defaults(id: u32, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            "general",
            DifficultyLevel::Medium,
            100,
            1.0,
            BTreeMap::new(),
            120,
            0.5,
        )
    }

    pub fn points_total(&self) -> f64 {
        self.base_points as f64 * self.difficulty_multiplier
    }
}

/// A candidate solver with skills and history.
///
/// Immutable for the duration of one [optimize](crate::evolve::optimize) call.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub skills: BTreeMap<String, f64>,
    pub history: f64,
    pub years_experience: f64,
    pub competitions_participated: u32,
    pub problems_solved: u32,
    pub available: bool,
    pub energy: Option<f64>,
    pub concentration: Option<f64>,
    /// Task categories this agent gravitates towards; nudges success probability up.
    pub preferred_categories: BTreeSet<String>,
    /// Task categories this agent tends to avoid; nudges success probability down.
    pub avoided_categories: BTreeSet<String>,
    /// Personal pace multiplier on estimated solve time, clamped to `[0.5, 2.0]`.
    pub speed_factor: f64,
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        skills: BTreeMap<String, f64>,
        history: f64,
        years_experience: f64,
        competitions_participated: u32,
        problems_solved: u32,
        available: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            skills,
            history: history.clamp(0.0, 1.0),
            years_experience: years_experience.max(0.0),
            competitions_participated,
            problems_solved,
            available,
            energy: None,
            concentration: None,
            preferred_categories: BTreeSet::new(),
            avoided_categories: BTreeSet::new(),
            speed_factor: 1.0,
        }
    }

    pub fn with_defaults(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, BTreeMap::new(), 0.5, 0.0, 0, 0, true)
    }

    pub fn with_dynamic_factors(mut self, energy: f64, concentration: f64) -> Self {
        self.energy = Some(energy.clamp(0.0, 1.0));
        self.concentration = Some(concentration.clamp(0.0, 1.0));
        self
    }

    pub fn with_preferences(
        mut self,
        preferred: impl IntoIterator<Item = String>,
        avoided: impl IntoIterator<Item = String>,
    ) -> Self {
        self.preferred_categories = preferred.into_iter().collect();
        self.avoided_categories = avoided.into_iter().collect();
        self
    }

    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor.clamp(0.5, 2.0);
        self
    }

    pub fn skill_level(&self, skill: &str) -> f64 {
        self.skills.get(skill).copied().unwrap_or(0.0)
    }
}

/// Optional overrides for the four main fitness terms.
///
/// Defaults to `{score: 0.4, compatibility: 0.3, quantity: 0.2, time: 0.1}`. Weights are
/// renormalized to sum to 1.0 before use.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StrategyWeights {
    pub score: f64,
    pub compatibility: f64,
    pub quantity: f64,
    pub time: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            score: 0.4,
            compatibility: 0.3,
            quantity: 0.2,
            time: 0.1,
        }
    }
}

/// Competition-wide constraints: the total time budget and the target team size.
#[derive(Clone, Debug)]
pub struct CompetitionConfig {
    pub total_time_minutes: f64,
    pub team_size: usize,
    pub strategy_weights: Option<StrategyWeights>,
}

impl CompetitionConfig {
    pub fn new(total_time_minutes: f64, team_size: usize) -> Self {
        Self {
            total_time_minutes,
            team_size,
            strategy_weights: None,
        }
    }

    pub fn with_strategy_weights(mut self, weights: StrategyWeights) -> Self {
        self.strategy_weights = Some(weights);
        self
    }
}
