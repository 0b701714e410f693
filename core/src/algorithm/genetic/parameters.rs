//! Genetic search parameters and operator selectors
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{parse_value, time_seed, AnalysisError, SolverParameters};
use crate::execution::tracker::IterationLimits;

/// How parents are selected and genes inherited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossoverType {
    /// Fitness-proportional parents; each gene drawn from a parent with
    /// probability proportional to its fitness
    WeightedRandom,
    /// As `WeightedRandom`, but a gene whose driver is preferred wins
    WeightedRandomPreferred,
    /// Tournament parents; each gene taken from the parent in which its
    /// driver controls more targets
    Dominant,
    /// As `Dominant`, but a gene whose driver is preferred wins
    DominantPreferred,
}

/// How a mutated gene picks its new driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationType {
    /// Random ancestor, preferred nodes weighted double
    WeightedRandom,
    /// As `WeightedRandom`, drawing from preferred ancestors when any exist
    WeightedRandomPreferred,
    /// Ancestor already driving the most targets of the chromosome
    Dominant,
    /// As `Dominant`, among preferred ancestors when any exist
    DominantPreferred,
}

macro_rules! operator_names {
    ($kind:ident, $parameter:literal) => {
        impl $kind {
            pub const ALL: [$kind; 4] = [
                $kind::WeightedRandom,
                $kind::WeightedRandomPreferred,
                $kind::Dominant,
                $kind::DominantPreferred,
            ];

            pub fn name(self) -> &'static str {
                match self {
                    $kind::WeightedRandom => "WeightedRandom",
                    $kind::WeightedRandomPreferred => "WeightedRandomPreferred",
                    $kind::Dominant => "Dominant",
                    $kind::DominantPreferred => "DominantPreferred",
                }
            }

            pub fn is_dominant(self) -> bool {
                matches!(self, $kind::Dominant | $kind::DominantPreferred)
            }

            pub fn favors_preferred(self) -> bool {
                matches!(self, $kind::WeightedRandomPreferred | $kind::DominantPreferred)
            }
        }

        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $kind {
            type Err = AnalysisError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = value.trim();
                $kind::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        AnalysisError::invalid(
                            $parameter,
                            format!("unknown value '{}'", value),
                        )
                    })
            }
        }
    };
}

operator_names!(CrossoverType, "crossoverType");
operator_names!(MutationType, "mutationType");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneticParameters {
    pub random_seed: u64,
    pub maximum_iterations: usize,
    pub maximum_iterations_without_improvement: usize,
    pub maximum_path_length: usize,
    pub population_size: usize,
    /// Genes drawn at random before greedy composition takes over
    pub random_genes_per_chromosome: usize,
    /// Share of the initial population built fully at random
    pub percentage_random: f64,
    /// Share of each generation carried over unchanged
    pub percentage_elite: f64,
    pub probability_mutation: f64,
    pub crossover_type: CrossoverType,
    pub mutation_type: MutationType,
}

impl Default for GeneticParameters {
    fn default() -> Self {
        Self {
            random_seed: time_seed(),
            maximum_iterations: 10_000,
            maximum_iterations_without_improvement: 1_000,
            maximum_path_length: 5,
            population_size: 80,
            random_genes_per_chromosome: 25,
            percentage_random: 0.25,
            percentage_elite: 0.25,
            probability_mutation: 0.01,
            crossover_type: CrossoverType::WeightedRandom,
            mutation_type: MutationType::WeightedRandom,
        }
    }
}

impl GeneticParameters {
    /// Chromosomes kept unchanged between generations, at least one
    pub fn elite_count(&self) -> usize {
        let elite = (self.population_size as f64 * self.percentage_elite).ceil() as usize;
        elite.clamp(1, self.population_size.max(1))
    }

    /// Chromosomes of the first generation built fully at random
    pub fn random_count(&self) -> usize {
        let random = (self.population_size as f64 * self.percentage_random).round() as usize;
        random.min(self.population_size)
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), AnalysisError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::invalid(
            name,
            format!("{} is outside [0, 1]", value),
        ))
    }
}

impl SolverParameters for GeneticParameters {
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AnalysisError> {
        match name {
            "randomSeed" => self.random_seed = parse_value(name, value)?,
            "maximumIterations" => self.maximum_iterations = parse_value(name, value)?,
            "maximumIterationsWithoutImprovement" => {
                self.maximum_iterations_without_improvement = parse_value(name, value)?
            }
            "maximumPathLength" => self.maximum_path_length = parse_value(name, value)?,
            "populationSize" => self.population_size = parse_value(name, value)?,
            "randomGenesPerChromosome" => {
                self.random_genes_per_chromosome = parse_value(name, value)?
            }
            "percentageRandom" => self.percentage_random = parse_value(name, value)?,
            "percentageElite" => self.percentage_elite = parse_value(name, value)?,
            "probabilityMutation" => self.probability_mutation = parse_value(name, value)?,
            "crossoverType" => self.crossover_type = value.parse()?,
            "mutationType" => self.mutation_type = value.parse()?,
            _ => {
                return Err(AnalysisError::invalid(
                    name,
                    "unknown parameter for the genetic algorithm",
                ))
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.maximum_iterations == 0 {
            return Err(AnalysisError::invalid("maximumIterations", "must be at least 1"));
        }
        if self.maximum_iterations_without_improvement == 0 {
            return Err(AnalysisError::invalid(
                "maximumIterationsWithoutImprovement",
                "must be at least 1",
            ));
        }
        if self.population_size < 2 {
            return Err(AnalysisError::invalid("populationSize", "must be at least 2"));
        }
        check_fraction("percentageRandom", self.percentage_random)?;
        check_fraction("percentageElite", self.percentage_elite)?;
        check_fraction("probabilityMutation", self.probability_mutation)?;
        Ok(())
    }

    fn random_seed(&self) -> u64 {
        self.random_seed
    }

    fn limits(&self) -> IterationLimits {
        IterationLimits {
            maximum_iterations: self.maximum_iterations,
            maximum_iterations_without_improvement: self.maximum_iterations_without_improvement,
        }
    }
}
