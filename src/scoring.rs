//! The scoring kernel: pure, deterministic functions over a `(Task, Agent)` pair.
//!
//! Every function here tolerates missing or malformed inputs by falling back to documented
//! defaults instead of panicking or producing NaN/∞. Because [Task] and [Agent] are already
//! validated at construction (see [crate::model]), "malformed" mostly means "an edge value at
//! the boundary of its range".
use crate::model::{Agent, Task};

/// `skill-match, history` mixture weights for [compatibility].
const COMPATIBILITY_SKILL_WEIGHT: f64 = 0.7;
const COMPATIBILITY_HISTORY_WEIGHT: f64 = 0.3;
/// Compatibility credit given for a required skill the agent does not have at all.
const UNMATCHED_SKILL_CREDIT: f64 = 0.2;

const SUCCESS_PROB_MIN: f64 = 0.1;
const SUCCESS_PROB_MAX: f64 = 0.9;
/// Preference nudges for category matches against an agent's preferred/avoided lists.
const PREFERRED_CATEGORY_BONUS: f64 = 0.1;
const AVOIDED_CATEGORY_PENALTY: f64 = -0.2;

/// Mean of (required skill level / 10 years, competitions / 20, problems / 200), each capped at
/// 1 before averaging.
fn normalized_experience(agent: &Agent) -> f64 {
    let years = (agent.years_experience / 10.0).min(1.0);
    let competitions = (agent.competitions_participated as f64 / 20.0).min(1.0);
    let problems = (agent.problems_solved as f64 / 200.0).min(1.0);
    (years + competitions + problems) / 3.0
}

/// Skill-match component of [compatibility]: mean of matched skill levels, with unmatched
/// required skills contributing [UNMATCHED_SKILL_CREDIT].
fn skill_match(task: &Task, agent: &Agent) -> f64 {
    if task.required_skills.is_empty() {
        // No required skills: fall back fully to history.
        return agent.history;
    }
    let levels: Vec<f64> = task
        .required_skills
        .keys()
        .map(|skill| {
            if agent.skills.contains_key(skill) {
                agent.skill_level(skill)
            } else {
                UNMATCHED_SKILL_CREDIT
            }
        })
        .collect();
    levels.iter().sum::<f64>() / levels.len() as f64
}

/// Compatibility ∈ [0,1]: weighted mix of skill-match and historical success rate.
pub fn compatibility(task: &Task, agent: &Agent) -> f64 {
    if task.required_skills.is_empty() {
        // Every agent keeps non-zero compatibility via the history fallback alone.
        return (COMPATIBILITY_HISTORY_WEIGHT + COMPATIBILITY_SKILL_WEIGHT * agent.history.max(0.1))
            .clamp(0.0, 1.0);
    }
    let value =
        COMPATIBILITY_SKILL_WEIGHT * skill_match(task, agent) + COMPATIBILITY_HISTORY_WEIGHT * agent.history;
    value.clamp(0.0, 1.0)
}

/// Success probability ∈ [0.1, 0.9].
pub fn success_probability(task: &Task, agent: &Agent) -> f64 {
    let compat = compatibility(task, agent);
    let experience = normalized_experience(agent);
    let base = (agent.history + experience + compat + task.historical_solve_rate * 0.1) / 3.1;
    let mut value = base * task.difficulty.success_factor();

    if agent.preferred_categories.contains(&task.category) {
        value += PREFERRED_CATEGORY_BONUS;
    } else if agent.avoided_categories.contains(&task.category) {
        value += AVOIDED_CATEGORY_PENALTY;
    }

    value.clamp(SUCCESS_PROB_MIN, SUCCESS_PROB_MAX)
}

/// Estimated solve time in minutes, clamped to `[0.2·limit, 0.8·limit]`.
pub fn estimated_solve_time(task: &Task, agent: &Agent) -> f64 {
    let limit = task.time_limit_minutes as f64;
    let compat = compatibility(task, agent);
    let experience = normalized_experience(agent);

    // Higher experience/compatibility lowers the factor (faster solve).
    let factor = (1.0 - compat * 0.3 - experience * 0.2).max(0.5);
    let time = limit * 0.7 * factor * agent.speed_factor;

    time.clamp(limit * 0.2, limit * 0.8)
}

/// Expected score: `base_points · multiplier · success_probability`.
pub fn expected_score(task: &Task, agent: &Agent) -> f64 {
    task.points_total() * success_probability(task, agent)
}
