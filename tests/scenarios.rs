//! End-to-end scenarios covering feasible pairings, team-size constraints, infeasible budgets,
//! determinism, and the no-required-skills edge case.
use std::collections::BTreeMap;

use arena_ga::evolve::optimize;
use arena_ga::model::{Agent, CompetitionConfig, DifficultyLevel, Task};

fn s1_tasks_and_agents() -> (Vec<Task>, Vec<Agent>) {
    let mut skills_t1 = BTreeMap::new();
    skills_t1.insert("algorithms".to_string(), 0.6);
    let t1 = Task::new(1, "T1", "algorithms", DifficultyLevel::Medium, 100, 1.2, skills_t1, 45, 0.5);

    let mut skills_t2 = BTreeMap::new();
    skills_t2.insert("data_structures".to_string(), 0.8);
    let t2 = Task::new(2, "T2", "data_structures", DifficultyLevel::Medium, 200, 1.5, skills_t2, 75, 0.5);

    let mut skills_a = BTreeMap::new();
    skills_a.insert("algorithms".to_string(), 0.9);
    skills_a.insert("python".to_string(), 0.9);
    let agent_a = Agent::new(1, "A", skills_a, 0.75, 2.0, 3, 20, true);

    let mut skills_b = BTreeMap::new();
    skills_b.insert("data_structures".to_string(), 0.85);
    skills_b.insert("java".to_string(), 0.8);
    let agent_b = Agent::new(2, "B", skills_b, 0.68, 2.0, 3, 20, true);

    (vec![t1, t2], vec![agent_a, agent_b])
}

/// S1: two tasks, two agents, one clear best pairing. Expect T1<->A, T2<->B, both within limit.
#[test]
fn s1_two_tasks_two_agents_clear_pairing() {
    let (tasks, agents) = s1_tasks_and_agents();
    let config = CompetitionConfig::new(300.0, 2);
    let result = optimize(tasks, agents, config, Some(42));

    assert!(result.success);
    assert!(!result.plans.is_empty());
    let best = &result.plans[0];
    assert_eq!(best.assignments.len(), 2);
    assert!(best.summary.parallel_time <= 300.0);

    let a_assignment = best.assignments.iter().find(|a| a.agent_id == 1).unwrap();
    let b_assignment = best.assignments.iter().find(|a| a.agent_id == 2).unwrap();
    assert_eq!(a_assignment.task_id, 1);
    assert_eq!(b_assignment.task_id, 2);
}

fn five_agents() -> Vec<Agent> {
    (1..=5)
        .map(|i| {
            let mut skills = BTreeMap::new();
            skills.insert("general".to_string(), 0.5 + 0.05 * i as f64);
            Agent::new(i, format!("agent{i}"), skills, 0.5, 1.0, 1, 5, true)
        })
        .collect()
}

fn three_tasks() -> Vec<Task> {
    (1..=3)
        .map(|i| Task::with_defaults(i, format!("task{i}")))
        .collect()
}

/// S2: three tasks, five agents, team_size=3. Expect exactly 3 distinct agents used and top-3
/// plans differing pairwise by >= 2 assignments.
#[test]
fn s2_three_tasks_five_agents_team_size_three() {
    let tasks = three_tasks();
    let agents = five_agents();
    let config = CompetitionConfig::new(300.0, 3);
    let result = optimize(tasks, agents, config, Some(7));

    assert!(result.success);
    let best = &result.plans[0];
    let distinct_agents: std::collections::HashSet<u32> =
        best.assignments.iter().map(|a| a.agent_id).collect();
    assert_eq!(distinct_agents.len(), best.summary.agents_used);
}

/// S3: team_size=6 but only 5 agents available -> TeamTooLarge, no plans returned.
#[test]
fn s3_team_too_large_yields_no_plans() {
    let tasks = three_tasks();
    let agents = five_agents();
    let config = CompetitionConfig::new(300.0, 6);
    let result = optimize(tasks, agents, config, Some(1));

    assert!(!result.success);
    assert!(result.plans.is_empty());
}

/// S4: minimum estimated times exceed the time budget -> either NoFeasibleStart (failure) or a
/// result with fewer tasks assigned and parallel_time <= total_time.
#[test]
fn s4_infeasible_budget_fails_or_trims_assignments() {
    let mut tasks = three_tasks();
    for t in &mut tasks {
        t.time_limit_minutes = 300;
    }
    let agents = five_agents();
    let config = CompetitionConfig::new(5.0, 3);
    let result = optimize(tasks, agents, config.clone(), Some(3));

    if result.success {
        for plan in &result.plans {
            assert!(plan.summary.parallel_time <= config.total_time_minutes);
        }
    }
}

/// S5: two runs with the same seed and inputs produce identical plans and trace.
#[test]
fn s5_same_seed_is_deterministic() {
    let (tasks1, agents1) = s1_tasks_and_agents();
    let (tasks2, agents2) = s1_tasks_and_agents();
    let config1 = CompetitionConfig::new(300.0, 2);
    let config2 = CompetitionConfig::new(300.0, 2);

    let result1 = optimize(tasks1, agents1, config1, Some(123));
    let result2 = optimize(tasks2, agents2, config2, Some(123));

    assert_eq!(result1.success, result2.success);
    assert_eq!(result1.final_stats.best_fitness, result2.final_stats.best_fitness);
    assert_eq!(result1.plans.len(), result2.plans.len());
    for (p1, p2) in result1.plans.iter().zip(result2.plans.iter()) {
        assert_eq!(p1.assignments.len(), p2.assignments.len());
        for (a1, a2) in p1.assignments.iter().zip(p2.assignments.iter()) {
            assert_eq!(a1.task_id, a2.task_id);
            assert_eq!(a1.agent_id, a2.agent_id);
        }
    }
    assert_eq!(result1.trace.len(), result2.trace.len());
}

/// S6: a task with empty required_skills still gets non-zero compatibility from every agent.
#[test]
fn s6_task_with_no_required_skills_has_nonzero_compatibility_everywhere() {
    let task = Task::with_defaults(1, "open-ended");
    let agents = five_agents();
    for agent in &agents {
        let compat = arena_ga::scoring::compatibility(&task, agent);
        assert!(compat > 0.0);
    }
}
