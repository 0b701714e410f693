//! Genetic search over bounded reachability
//!
//! Target reachability `C·A^0..C·A^L` is computed once per run. A chromosome
//! holds one driver per target, always drawn from the target's ancestor
//! set, and fitness grows as the number of distinct drivers shrinks, with
//! drivers further upstream winning among equal counts. Each
//! generation keeps an elite, breeds the rest through crossover and
//! mutation, and offers its best distinct chromosomes to the archive.

pub mod chromosome;
pub mod parameters;
pub mod population;
pub mod reachability;

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algorithm::traits::{AlgorithmKind, ControlSolver, StopReason};
use crate::data_structures::control_path::{ArchiveUpdate, SolutionArchive};
use crate::data_structures::graph::ControlProblem;
use crate::execution::tracker::RunTracker;

use self::chromosome::Chromosome;
use self::parameters::GeneticParameters;
use self::population::{Breeder, Population};
use self::reachability::Reachability;

pub use self::parameters::{CrossoverType, MutationType};

#[derive(Debug, Clone)]
pub struct GeneticSolver {
    parameters: GeneticParameters,
    rng: ChaCha8Rng,
}

impl GeneticSolver {
    pub fn new(parameters: GeneticParameters) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(parameters.random_seed),
            parameters,
        }
    }

    /// Offers the generation's best distinct chromosomes to the archive
    fn harvest(
        population: &Population,
        reach: &Reachability,
        problem: &ControlProblem,
        archive: &mut SolutionArchive,
    ) -> ArchiveUpdate {
        population
            .leaders()
            .into_iter()
            .map(|chromosome| archive.offer(&chromosome.control_paths(reach, problem.graph())))
            .fold(ArchiveUpdate::Worse, ArchiveUpdate::merge)
    }
}

impl ControlSolver for GeneticSolver {
    type Parameters = GeneticParameters;

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Genetic
    }

    fn parameters(&self) -> &GeneticParameters {
        &self.parameters
    }

    fn summary(&self, problem: &ControlProblem) -> String {
        format!(
            "Genetic search for {} target(s) over {} node(s) and {} edge(s), maximum path length {}, population {}, crossover {}, mutation {}.",
            problem.targets().len(),
            problem.graph().node_count(),
            problem.graph().edge_count(),
            self.parameters.maximum_path_length,
            self.parameters.population_size,
            self.parameters.crossover_type,
            self.parameters.mutation_type
        )
    }

    fn search(
        &mut self,
        problem: &ControlProblem,
        tracker: &mut RunTracker<'_>,
        archive: &mut SolutionArchive,
    ) -> StopReason {
        let reach = Reachability::new(problem, self.parameters.maximum_path_length);
        let breeder = Breeder::new(&reach, problem.preferred(), &self.parameters);
        let mut population: Option<Population> = None;

        loop {
            if let Some(reason) = tracker.check_stop() {
                return reason;
            }
            let members: Vec<Chromosome> = match &population {
                None => breeder.initial(&mut self.rng),
                Some(current) => breeder.next_generation(current, &mut self.rng),
            };
            tracker.begin_iteration();
            let ranked = Population::rank(members, problem.preferred(), &reach);
            debug!(
                "genetic generation {}: best fitness {:.4}, {} leader(s)",
                tracker.iteration(),
                ranked.fitness().first().copied().unwrap_or_default(),
                ranked.leaders().len()
            );

            let update = Self::harvest(&ranked, &reach, problem, archive);
            tracker.record(update, archive);
            tracker.publish(archive);
            population = Some(ranked);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::{AnalysisError, RunStatus};
    use crate::data_structures::graph::NetworkSnapshot;
    use crate::execution::cancellation::CancellationToken;
    use crate::execution::monitor::{MemorySink, RunSettings};
    use crate::execution::runner::execute;
    use crate::AnalysisOutcome;

    fn parameters(seed: u64, length: usize) -> GeneticParameters {
        GeneticParameters {
            random_seed: seed,
            maximum_iterations: 40,
            maximum_iterations_without_improvement: 15,
            maximum_path_length: length,
            population_size: 20,
            random_genes_per_chromosome: 1,
            probability_mutation: 0.1,
            ..GeneticParameters::default()
        }
    }

    fn run(snapshot: &NetworkSnapshot, parameters: GeneticParameters) -> AnalysisOutcome {
        execute(
            &mut GeneticSolver::new(parameters),
            snapshot,
            RunSettings::default(),
            &mut MemorySink::new(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    fn driver_sets(outcome: &AnalysisOutcome) -> Vec<Vec<String>> {
        outcome
            .solutions
            .iter()
            .map(|solution| {
                let mut drivers: Vec<String> =
                    solution.driver_nodes().into_iter().map(str::to_string).collect();
                drivers.sort();
                drivers
            })
            .collect()
    }

    fn chain() -> NetworkSnapshot {
        NetworkSnapshot::from_edges([("1", "2"), ("2", "3"), ("3", "4")], &["4"], &[])
    }

    #[test]
    fn test_two_targets_share_a_driver() {
        let snapshot = NetworkSnapshot::from_edges([("1", "2"), ("1", "3")], &["2", "3"], &[]);
        let outcome = run(&snapshot, parameters(4, 3));
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.driver_count(), Some(1));
        assert_eq!(driver_sets(&outcome), vec![vec!["1".to_string()]]);
    }

    fn best_drivers(outcome: &AnalysisOutcome) -> Vec<&str> {
        outcome.best().unwrap().driver_nodes()
    }

    #[test]
    fn test_chain_root_is_the_best_driver() {
        for seed in [1, 8, 23] {
            let outcome = run(&chain(), parameters(seed, 3));
            assert_eq!(outcome.driver_count(), Some(1));
            assert_eq!(best_drivers(&outcome), vec!["1"]);
            let root = outcome.best().unwrap().path_for("4").unwrap();
            assert_eq!(root.nodes, vec!["4", "3", "2", "1"]);
        }
    }

    #[test]
    fn test_length_bound_limits_the_drivers() {
        for seed in [1, 8, 23] {
            let outcome = run(&chain(), parameters(seed, 1));
            assert_eq!(best_drivers(&outcome), vec!["3"]);
            let sets = driver_sets(&outcome);
            assert!(sets
                .iter()
                .all(|drivers| drivers == &vec!["3".to_string()] || drivers == &vec!["4".to_string()]));
        }
    }

    #[test]
    fn test_iterations_count_ranked_generations() {
        let mut parameters = parameters(2, 3);
        parameters.maximum_iterations = 6;
        parameters.maximum_iterations_without_improvement = 100;
        let outcome = run(&chain(), parameters);
        assert_eq!(outcome.iterations, 6);
    }

    #[test]
    fn test_isolated_target_drives_itself() {
        let snapshot = NetworkSnapshot::from_edges(Vec::<(&str, &str)>::new(), &["9"], &[]);
        let outcome = run(&snapshot, parameters(1, 3));
        assert_eq!(driver_sets(&outcome), vec![vec!["9".to_string()]]);
    }

    #[test]
    fn test_same_seed_same_solutions() {
        let edges = [("1", "2"), ("1", "3"), ("4", "3"), ("4", "5"), ("5", "6"), ("2", "6")];
        let snapshot = NetworkSnapshot::from_edges(edges, &["3", "6", "2"], &["4"]);
        for crossover in CrossoverType::ALL {
            let parameters = GeneticParameters {
                crossover_type: crossover,
                mutation_type: MutationType::DominantPreferred,
                ..parameters(99, 3)
            };
            let first = run(&snapshot, parameters.clone());
            let second = run(&snapshot, parameters);
            assert_eq!(first.solutions, second.solutions);
            assert_eq!(first.iterations, second.iterations);
        }
    }

    #[test]
    fn test_invalid_parameters_set_error_status() {
        let mut sink = MemorySink::new();
        let mut parameters = parameters(1, 3);
        parameters.percentage_elite = 2.0;
        let result = execute(
            &mut GeneticSolver::new(parameters),
            &chain(),
            RunSettings::default(),
            &mut sink,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(AnalysisError::InvalidParameter { .. })));
        assert_eq!(sink.last_status(), Some(RunStatus::Error));
    }
}
