//! A multi-objective genetic optimizer that assigns a subset of candidate agents to timed,
//! scored competition tasks.
//!
//! There are three main elements, the same shape the wider genetic-algorithm ecosystem uses:
//! * The [chromosome] (the search space) — a fixed-shape task×agent assignment matrix.
//! * The [fitness] function (the search goal) — a weighted, multi-component score in `[0,1]`.
//! * The [evolve] strategy (the search strategy) — an elitist generational loop with a
//!   diversified top-K result.
//!
//! ## Quick usage
//!
//! ```rust
//! use arena_ga::model::{Agent, CompetitionConfig, Task};
//! use arena_ga::evolve::optimize;
//!
//! let tasks = vec![Task::with_defaults(1, "two-sum"), Task::with_defaults(2, "graph-search")];
//! let agents = vec![Agent::with_defaults(1, "alice"), Agent::with_defaults(2, "bob")];
//! let config = CompetitionConfig::new(180.0, 2);
//!
//! let result = optimize(tasks, agents, config, Some(42));
//! assert!(result.success);
//! ```
//!
//! For cooperative cancellation or custom operator tuning, build an [evolve::Evolve] directly via
//! [evolve::EvolveBuilder] instead of the [evolve::optimize] convenience function.

pub mod chromosome;
pub mod crossover;
pub mod diversity;
pub mod error;
pub mod evolve;
pub mod evolve_stats;
pub mod fitness;
pub mod initialize;
pub mod model;
pub mod mutate;
pub mod population;
pub mod scoring;
pub mod select;
pub mod trace;
