//! Diversity filter / top-K selector: extracts up to `K` mutually dissimilar valid plans from a
//! population, falling back to forced perturbation when the population doesn't naturally offer
//! enough spread.
use rand::Rng;

use crate::chromosome::{self, Chromosome};
use crate::fitness;
use crate::model::{Agent, CompetitionConfig, Task};
use crate::mutate;
use crate::population::Individual;

pub const TOP_K: usize = 3;
const HAMMING_SIMILARITY_CEILING: f64 = 0.1;
const MIN_DIFFERING_ASSIGNMENTS: usize = 2;
const FORCED_DIVERSITY_SCAN_LIMIT: usize = 50;

/// §4.7 step 4 states the admission rule two ways that disagree at the margin: prose says
/// "admit only when BOTH (a) similarity ≤ ceiling AND (b) differing ≥ minimum", but the
/// testable invariant (§8 property 6) and the glossary both define top-K diversity as similarity
/// ≤ ceiling OR differing ≥ minimum. An AND reading would reject a plan that differs in exactly
/// one cell pair even though that one cell swap already drops similarity under the ceiling,
/// which is the opposite of what "diverse" should mean here. This follows the OR reading, since
/// that is what property 6 actually checks.
fn is_dissimilar_from_all(candidate: &Chromosome, admitted: &[Chromosome]) -> bool {
    admitted.iter().all(|other| {
        let similarity = candidate.hamming_similarity(other);
        let differing = candidate.differing_assignment_count(other);
        similarity <= HAMMING_SIMILARITY_CEILING || differing >= MIN_DIFFERING_ASSIGNMENTS
    })
}

/// Selects up to [TOP_K] pairwise-dissimilar valid individuals from `candidates`, which must
/// already be sorted by fitness descending. Individuals that fail the dissimilarity test are
/// skipped; if fewer than `K` are admitted after scanning the first
/// [FORCED_DIVERSITY_SCAN_LIMIT] candidates, remaining slots are filled by perturbing
/// (swap-mutating) further candidates until `K` plans are present or candidates run out.
pub fn select_top_k(
    candidates: &[Individual],
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Vec<Chromosome> {
    let valid: Vec<&Individual> = candidates
        .iter()
        .filter(|ind| ind.fitness_score().is_some())
        .collect();
    if valid.is_empty() {
        return Vec::new();
    }

    let mut admitted: Vec<Chromosome> = vec![valid[0].chromosome.clone()];

    let scan_limit = FORCED_DIVERSITY_SCAN_LIMIT.min(valid.len());
    for individual in valid.iter().take(scan_limit).skip(1) {
        if admitted.len() >= TOP_K {
            break;
        }
        if is_dissimilar_from_all(&individual.chromosome, &admitted) {
            admitted.push(individual.chromosome.clone());
        }
    }

    if admitted.len() < TOP_K {
        let cap = tasks.len().min(config.team_size);
        for individual in valid.iter().skip(scan_limit) {
            if admitted.len() >= TOP_K {
                break;
            }
            if let Some(perturbed) = swap_perturb_valid(&individual.chromosome, cap, tasks, agents, config, rng) {
                if is_dissimilar_from_all(&perturbed, &admitted) {
                    admitted.push(perturbed);
                }
            }
        }
        // Exhausted the untouched pool: force-perturb the best individual repeatedly rather
        // than return fewer than K when valid individuals exist (even when every candidate
        // looks alike, top-K must still come back distinct).
        let mut attempts = 0;
        while admitted.len() < TOP_K && attempts < FORCED_DIVERSITY_SCAN_LIMIT {
            let base = &valid[attempts % valid.len()].chromosome;
            if let Some(perturbed) = swap_perturb_valid(base, cap, tasks, agents, config, rng) {
                if is_dissimilar_from_all(&perturbed, &admitted) {
                    admitted.push(perturbed);
                }
            }
            attempts += 1;
        }
    }

    admitted
}

/// Applies the §4.7.5 forced-diversity perturbation — swap the agents of two existing
/// assignments, repair, then re-evaluate — and returns the result only if it is still a valid
/// plan (parallel time within budget). `None` means the perturbation didn't yield a usable plan
/// and the caller should try the next candidate.
fn swap_perturb_valid(
    base: &Chromosome,
    cap: usize,
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Option<Chromosome> {
    let mut perturbed = base.clone();
    mutate::swap(&mut perturbed, rng);
    chromosome::repair(&mut perturbed, cap, tasks, agents, rng);
    let evaluation = fitness::evaluate(&perturbed, tasks, agents, config);
    if !evaluation.components.valid {
        return None;
    }
    perturbed.fitness_score = Some(evaluation.fitness);
    Some(perturbed)
}
