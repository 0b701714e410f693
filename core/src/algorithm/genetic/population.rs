//! Population construction and the genetic operators
//!
//! All randomness comes from the solver's seeded RNG, drawn in a fixed
//! order; fitness is evaluated in parallel but is a pure function of the
//! chromosome, so a seed reproduces a run exactly.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use crate::algorithm::traits::NodeIndex;

use super::chromosome::Chromosome;
use super::parameters::GeneticParameters;
use super::reachability::Reachability;

/// Weight of a preferred node relative to any other when sampling genes
const PREFERRED_WEIGHT: f64 = 2.0;

/// Chromosomes of one generation, best first after [`Population::rank`]
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Chromosome>,
    fitness: Vec<f64>,
}

/// Gene-level operators bound to one problem
pub struct Breeder<'a> {
    reach: &'a Reachability,
    preferred: &'a [bool],
    parameters: &'a GeneticParameters,
}

impl Population {
    pub fn members(&self) -> &[Chromosome] {
        &self.members
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Evaluates fitness in parallel and sorts best first
    ///
    /// The sort is stable, so equally fit chromosomes keep their order.
    pub fn rank(members: Vec<Chromosome>, preferred: &[bool], reach: &Reachability) -> Self {
        let scores: Vec<f64> = members
            .par_iter()
            .map(|chromosome| chromosome.fitness(preferred, reach))
            .collect();

        let mut order: Vec<usize> = (0..members.len()).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

        let mut slots: Vec<Option<Chromosome>> = members.into_iter().map(Some).collect();
        let mut ranked = Vec::with_capacity(order.len());
        let mut fitness = Vec::with_capacity(order.len());
        for index in order {
            if let Some(chromosome) = slots[index].take() {
                ranked.push(chromosome);
                fitness.push(scores[index]);
            }
        }
        Self {
            members: ranked,
            fitness,
        }
    }

    /// Distinct chromosomes sharing the smallest driver count, best first
    pub fn leaders(&self) -> Vec<&Chromosome> {
        let best = match self.members.iter().map(Chromosome::driver_count).min() {
            Some(best) => best,
            None => return Vec::new(),
        };
        let mut leaders: Vec<&Chromosome> = Vec::new();
        for chromosome in &self.members {
            if chromosome.driver_count() == best && !leaders.contains(&chromosome) {
                leaders.push(chromosome);
            }
        }
        leaders
    }
}

impl<'a> Breeder<'a> {
    pub fn new(
        reach: &'a Reachability,
        preferred: &'a [bool],
        parameters: &'a GeneticParameters,
    ) -> Self {
        Self {
            reach,
            preferred,
            parameters,
        }
    }

    fn weight(&self, node: NodeIndex) -> f64 {
        if self.preferred[node] {
            PREFERRED_WEIGHT
        } else {
            1.0
        }
    }

    /// Ancestor of the target in `slot`, preferred nodes weighted double
    pub fn random_gene<R: Rng + ?Sized>(&self, slot: usize, rng: &mut R) -> NodeIndex {
        self.sample(self.reach.ancestors(slot), slot, rng)
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        candidates: &[NodeIndex],
        slot: usize,
        rng: &mut R,
    ) -> NodeIndex {
        candidates
            .choose_weighted(rng, |&node| self.weight(node))
            .copied()
            .unwrap_or_else(|_| self.reach.target(slot))
    }

    fn preferred_ancestors(&self, slot: usize) -> Vec<NodeIndex> {
        self.reach
            .ancestors(slot)
            .iter()
            .copied()
            .filter(|&node| self.preferred[node])
            .collect()
    }

    /// Ancestor already carrying the most targets, random among ties;
    /// `None` when no candidate drives anything yet
    fn dominant_gene<R: Rng + ?Sized>(
        &self,
        candidates: &[NodeIndex],
        loads: &HashMap<NodeIndex, usize>,
        rng: &mut R,
    ) -> Option<NodeIndex> {
        let best = candidates
            .iter()
            .filter_map(|node| loads.get(node).copied())
            .max()?;
        let tied: Vec<NodeIndex> = candidates
            .iter()
            .copied()
            .filter(|node| loads.get(node) == Some(&best))
            .collect();
        tied.choose(rng).copied()
    }

    /// Every gene drawn at random
    pub fn random_chromosome<R: Rng + ?Sized>(&self, rng: &mut R) -> Chromosome {
        let genes = (0..self.reach.target_count())
            .map(|slot| self.random_gene(slot, rng))
            .collect();
        Chromosome::new(genes)
    }

    /// A few random genes, then each remaining target joins the driver
    /// already controlling the most targets among its ancestors
    pub fn composed_chromosome<R: Rng + ?Sized>(&self, rng: &mut R) -> Chromosome {
        let count = self.reach.target_count();
        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(rng);

        let mut genes = vec![0; count];
        let mut loads: HashMap<NodeIndex, usize> = HashMap::new();
        for (position, &slot) in order.iter().enumerate() {
            let gene = if position < self.parameters.random_genes_per_chromosome {
                self.random_gene(slot, rng)
            } else {
                match self.dominant_gene(self.reach.ancestors(slot), &loads, rng) {
                    Some(gene) => gene,
                    None => self.random_gene(slot, rng),
                }
            };
            genes[slot] = gene;
            *loads.entry(gene).or_insert(0) += 1;
        }
        Chromosome::new(genes)
    }

    pub fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Chromosome> {
        let random = self.parameters.random_count();
        (0..self.parameters.population_size)
            .map(|index| {
                if index < random {
                    self.random_chromosome(rng)
                } else {
                    self.composed_chromosome(rng)
                }
            })
            .collect()
    }

    fn select<'p, R: Rng + ?Sized>(
        &self,
        population: &'p Population,
        rng: &mut R,
    ) -> (&'p Chromosome, f64) {
        let size = population.len();
        let index = if self.parameters.crossover_type.is_dominant() {
            let first = rng.gen_range(0..size);
            let second = rng.gen_range(0..size);
            first.min(second)
        } else {
            let indices: Vec<usize> = (0..size).collect();
            match indices.choose_weighted(rng, |&index| population.fitness[index]) {
                Ok(&index) => index,
                Err(_) => rng.gen_range(0..size),
            }
        };
        (&population.members[index], population.fitness[index])
    }

    /// Gene-wise crossover of two parents
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        first: (&Chromosome, f64),
        second: (&Chromosome, f64),
        rng: &mut R,
    ) -> Vec<NodeIndex> {
        let crossover = self.parameters.crossover_type;
        let (fitter, weaker) = if second.1 > first.1 {
            (second, first)
        } else {
            (first, second)
        };
        let fitter_loads = fitter.0.loads();
        let weaker_loads = weaker.0.loads();
        let total = fitter.1 + weaker.1;

        (0..fitter.0.genes().len())
            .map(|slot| {
                let a = fitter.0.gene(slot);
                let b = weaker.0.gene(slot);
                if a == b {
                    return a;
                }
                if crossover.favors_preferred() && self.preferred[a] != self.preferred[b] {
                    return if self.preferred[a] { a } else { b };
                }
                if crossover.is_dominant() {
                    if weaker_loads[&b] > fitter_loads[&a] {
                        b
                    } else {
                        a
                    }
                } else {
                    let share = if total > 0.0 { fitter.1 / total } else { 0.5 };
                    if rng.gen_bool(share) {
                        a
                    } else {
                        b
                    }
                }
            })
            .collect()
    }

    /// Replaces genes with probability `probabilityMutation`
    ///
    /// Genes that survive are counted first, so dominant mutation pulls
    /// mutated targets toward drivers the child already uses.
    pub fn mutate<R: Rng + ?Sized>(&self, genes: Vec<NodeIndex>, rng: &mut R) -> Chromosome {
        let mutation = self.parameters.mutation_type;
        let mutated: Vec<bool> = (0..genes.len())
            .map(|_| rng.gen_bool(self.parameters.probability_mutation))
            .collect();

        let mut loads: HashMap<NodeIndex, usize> = HashMap::new();
        for (slot, &gene) in genes.iter().enumerate() {
            if !mutated[slot] {
                *loads.entry(gene).or_insert(0) += 1;
            }
        }

        let mut genes = genes;
        for slot in (0..genes.len()).filter(|&slot| mutated[slot]) {
            let preferred = if mutation.favors_preferred() {
                self.preferred_ancestors(slot)
            } else {
                Vec::new()
            };
            let candidates = if preferred.is_empty() {
                self.reach.ancestors(slot)
            } else {
                preferred.as_slice()
            };
            let dominant = if mutation.is_dominant() {
                self.dominant_gene(candidates, &loads, rng)
            } else {
                None
            };
            let gene = match dominant {
                Some(gene) => gene,
                None => self.sample(candidates, slot, rng),
            };
            genes[slot] = gene;
            *loads.entry(gene).or_insert(0) += 1;
        }
        Chromosome::new(genes)
    }

    /// Elites carried over, the rest bred from selected parents
    pub fn next_generation<R: Rng + ?Sized>(
        &self,
        population: &Population,
        rng: &mut R,
    ) -> Vec<Chromosome> {
        let size = self.parameters.population_size;
        let elite = self.parameters.elite_count().min(population.len());
        let mut next: Vec<Chromosome> = population.members[..elite].to_vec();

        while next.len() < size {
            let first = self.select(population, rng);
            let second = self.select(population, rng);
            let genes = self.crossover(first, second, rng);
            next.push(self.mutate(genes, rng));
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::genetic::parameters::{CrossoverType, MutationType};
    use crate::data_structures::graph::{ControlProblem, NetworkSnapshot};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        problem: ControlProblem,
        reach: Reachability,
    }

    impl Fixture {
        // h feeds every target, x feeds t1 and t2, the preferred p feeds t3
        fn new() -> Self {
            let edges = [
                ("h", "t1"),
                ("h", "t2"),
                ("h", "t3"),
                ("h", "t4"),
                ("x", "t1"),
                ("x", "t2"),
                ("p", "t3"),
                ("q", "h"),
            ];
            let snapshot = NetworkSnapshot::from_edges(edges, &["t1", "t2", "t3", "t4"], &["p"]);
            let problem = ControlProblem::from_snapshot(&snapshot).unwrap();
            let reach = Reachability::new(&problem, 2);
            Self { problem, reach }
        }

        fn breeder<'a>(&'a self, parameters: &'a GeneticParameters) -> Breeder<'a> {
            Breeder::new(&self.reach, self.problem.preferred(), parameters)
        }
    }

    fn parameters() -> GeneticParameters {
        GeneticParameters {
            random_seed: 5,
            population_size: 30,
            random_genes_per_chromosome: 1,
            ..GeneticParameters::default()
        }
    }

    #[test]
    fn test_every_operator_stays_within_ancestor_sets() {
        let fixture = Fixture::new();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for crossover in CrossoverType::ALL {
            for mutation in MutationType::ALL {
                let parameters = GeneticParameters {
                    crossover_type: crossover,
                    mutation_type: mutation,
                    probability_mutation: 0.5,
                    ..parameters()
                };
                let breeder = fixture.breeder(&parameters);
                let mut members = breeder.initial(&mut rng);
                for _ in 0..5 {
                    let population = Population::rank(members, fixture.problem.preferred(), &fixture.reach);
                    members = breeder.next_generation(&population, &mut rng);
                    assert_eq!(members.len(), parameters.population_size);
                    assert!(members.iter().all(|c| c.is_within(&fixture.reach)));
                }
            }
        }
    }

    #[test]
    fn test_rank_sorts_best_first_and_keeps_ties_in_order() {
        // Indices: h 0, t1 1, t2 2, t3 3, t4 4, x 5, p 6, q 7
        let fixture = Fixture::new();
        let members = vec![
            Chromosome::new(vec![1, 2]),
            Chromosome::new(vec![0, 0]),
            Chromosome::new(vec![3, 4]),
            Chromosome::new(vec![5, 5]),
        ];
        let population = Population::rank(members, fixture.problem.preferred(), &fixture.reach);
        let genes: Vec<&[NodeIndex]> = population.members().iter().map(|c| c.genes()).collect();
        assert_eq!(genes, vec![&[0, 0][..], &[5, 5][..], &[1, 2][..], &[3, 4][..]]);
        assert!(population.fitness().windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(population.leaders().len(), 2);
    }

    #[test]
    fn test_rank_puts_upstream_leaders_first() {
        let fixture = Fixture::new();
        let graph = fixture.problem.graph();
        let h = graph.index_of("h").unwrap();
        let q = graph.index_of("q").unwrap();
        let t = |id: &str| graph.index_of(id).unwrap();

        let members = vec![
            Chromosome::new(vec![t("t1"), t("t2"), t("t3"), t("t4")]),
            Chromosome::new(vec![h, h, h, h]),
            Chromosome::new(vec![q, q, q, q]),
        ];
        let population = Population::rank(members, fixture.problem.preferred(), &fixture.reach);
        let leaders = population.leaders();
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].genes(), &[q, q, q, q]);
        assert_eq!(leaders[1].genes(), &[h, h, h, h]);
    }

    #[test]
    fn test_composed_chromosomes_share_drivers() {
        let fixture = Fixture::new();
        let parameters = parameters();
        let breeder = fixture.breeder(&parameters);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let composed: Vec<Chromosome> =
            (0..20).map(|_| breeder.composed_chromosome(&mut rng)).collect();
        let random: Vec<Chromosome> =
            (0..20).map(|_| breeder.random_chromosome(&mut rng)).collect();
        let average = |chromosomes: &[Chromosome]| {
            let total: usize = chromosomes.iter().map(Chromosome::driver_count).sum();
            total as f64 / chromosomes.len() as f64
        };
        assert!(average(&composed) < average(&random));
    }

    #[test]
    fn test_preferred_crossover_takes_the_preferred_gene() {
        let fixture = Fixture::new();
        let graph = fixture.problem.graph();
        let p = graph.index_of("p").unwrap();
        let h = graph.index_of("h").unwrap();
        let t = |id: &str| graph.index_of(id).unwrap();

        let parameters = GeneticParameters {
            crossover_type: CrossoverType::DominantPreferred,
            ..parameters()
        };
        let breeder = fixture.breeder(&parameters);
        let fitter = Chromosome::new(vec![h, h, h, h]);
        let weaker = Chromosome::new(vec![t("t1"), t("t2"), p, t("t4")]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let child = breeder.crossover((&fitter, 0.9), (&weaker, 0.1), &mut rng);
        assert_eq!(child, vec![h, h, p, h]);
    }

    #[test]
    fn test_dominant_gene_joins_the_busiest_driver() {
        let fixture = Fixture::new();
        let graph = fixture.problem.graph();
        let h = graph.index_of("h").unwrap();
        let x = graph.index_of("x").unwrap();
        let t4 = graph.index_of("t4").unwrap();

        let parameters = parameters();
        let breeder = fixture.breeder(&parameters);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let loads = HashMap::from([(h, 2), (x, 3)]);

        assert_eq!(breeder.dominant_gene(fixture.reach.ancestors(0), &loads, &mut rng), Some(x));
        assert_eq!(breeder.dominant_gene(fixture.reach.ancestors(3), &loads, &mut rng), Some(h));
        assert_eq!(
            breeder.dominant_gene(fixture.reach.ancestors(3), &HashMap::new(), &mut rng),
            None
        );
        assert!(fixture.reach.ancestors(3).contains(&t4));
    }

    #[test]
    fn test_mutation_without_probability_keeps_genes() {
        let fixture = Fixture::new();
        let graph = fixture.problem.graph();
        let h = graph.index_of("h").unwrap();
        let x = graph.index_of("x").unwrap();

        let parameters = GeneticParameters {
            mutation_type: MutationType::Dominant,
            probability_mutation: 0.0,
            ..parameters()
        };
        let breeder = fixture.breeder(&parameters);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let child = breeder.mutate(vec![x, x, h, h], &mut rng);
        assert_eq!(child.genes(), &[x, x, h, h]);
    }
}
