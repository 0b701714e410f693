//! drivernet solver framework
//! Greedy and genetic searches for minimum driver sets
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod traits;
pub mod graph;
pub mod greedy;
pub mod genetic;

pub use self::traits::*;
pub use self::graph::*;
pub use self::greedy::{GreedySolver, Heuristic, HeuristicSet};
pub use self::genetic::{CrossoverType, GeneticSolver, MutationType};
