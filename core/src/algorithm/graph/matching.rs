//! Randomized Hopcroft-Karp maximum bipartite matching
//!
//! The controllability solvers need *a random* maximum matching rather than
//! the leftmost one a plain implementation returns. Two measures remove the
//! bias toward low indices:
//! - the right-hand side is used as the BFS/DFS primary side `U`, so the
//!   frontier nodes being matched drive the search
//! - adjacency lists are shuffled with the caller's RNG before every BFS
//!   layering phase, and the free `U` nodes are visited in shuffled order,
//!   each with a freshly shuffled adjacency list, during augmentation
//!
//! # Complexity
//! `O(E·√V)` phases-times-work, as in the classic algorithm. The DFS is
//! iterative, so deep layered graphs cannot overflow the stack.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, VecDeque};

use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::algorithm::traits::NodeIndex;

const INFINITE: usize = usize::MAX;

/// Hopcroft-Karp state over a local bipartite graph `U × V`
///
/// `adjacency[u]` lists the `V` indices adjacent to `u`. "Unmatched" is
/// `None`, never a sentinel id.
#[derive(Debug, Clone)]
pub struct HopcroftKarp {
    adjacency: Vec<Vec<usize>>,
    pair_u: Vec<Option<usize>>,
    pair_v: Vec<Option<usize>>,
    dist: Vec<usize>,
    cursor: Vec<usize>,
}

impl HopcroftKarp {
    pub fn new(adjacency: Vec<Vec<usize>>, v_count: usize) -> Self {
        let u_count = adjacency.len();
        Self {
            adjacency,
            pair_u: vec![None; u_count],
            pair_v: vec![None; v_count],
            dist: vec![INFINITE; u_count],
            cursor: vec![0; u_count],
        }
    }

    /// Deterministic maximum matching; returns its size
    pub fn solve(&mut self) -> usize {
        self.run(&mut |_: &mut [usize]| {})
    }

    /// Maximum matching chosen at random among maximum matchings
    pub fn solve_shuffled<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.run(&mut |items: &mut [usize]| items.shuffle(rng))
    }

    /// Partner of `u`, if matched
    pub fn partner_of_u(&self, u: usize) -> Option<usize> {
        self.pair_u[u]
    }

    /// Matched `(u, v)` pairs in `u` order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pair_u
            .iter()
            .enumerate()
            .filter_map(|(u, v)| v.map(|v| (u, v)))
    }

    fn run(&mut self, shuffle: &mut dyn FnMut(&mut [usize])) -> usize {
        let mut size = 0;
        let mut phases = 0;
        loop {
            for neighbors in self.adjacency.iter_mut() {
                shuffle(neighbors.as_mut_slice());
            }
            if !self.layer() {
                break;
            }
            phases += 1;

            let mut free: Vec<usize> = (0..self.adjacency.len())
                .filter(|&u| self.pair_u[u].is_none())
                .collect();
            shuffle(free.as_mut_slice());
            self.cursor.iter_mut().for_each(|c| *c = 0);

            for u in free {
                shuffle(self.adjacency[u].as_mut_slice());
                if self.augment(u) {
                    size += 1;
                }
            }
        }
        trace!("hopcroft-karp: matching of size {} after {} phase(s)", size, phases);
        size
    }

    /// BFS layering from every free `U` node; true if a free `V` is reachable
    fn layer(&mut self) -> bool {
        let mut queue = VecDeque::new();
        for u in 0..self.adjacency.len() {
            if self.pair_u[u].is_none() {
                self.dist[u] = 0;
                queue.push_back(u);
            } else {
                self.dist[u] = INFINITE;
            }
        }

        let mut found = false;
        while let Some(u) = queue.pop_front() {
            for &v in &self.adjacency[u] {
                match self.pair_v[v] {
                    None => found = true,
                    Some(next) if self.dist[next] == INFINITE => {
                        self.dist[next] = self.dist[u] + 1;
                        queue.push_back(next);
                    }
                    Some(_) => {}
                }
            }
        }
        found
    }

    /// Layered DFS from a free `u`; flips the path on success
    fn augment(&mut self, root: usize) -> bool {
        let mut stack = vec![root];

        while let Some(&u) = stack.last() {
            if self.cursor[u] >= self.adjacency[u].len() {
                // Dead end for the rest of this phase
                self.dist[u] = INFINITE;
                stack.pop();
                if let Some(&parent) = stack.last() {
                    self.cursor[parent] += 1;
                }
                continue;
            }

            let v = self.adjacency[u][self.cursor[u]];
            match self.pair_v[v] {
                None => {
                    for &w in stack.iter().rev() {
                        let chosen = self.adjacency[w][self.cursor[w]];
                        self.pair_u[w] = Some(chosen);
                        self.pair_v[chosen] = Some(w);
                    }
                    return true;
                }
                Some(next)
                    if self.dist[u] != INFINITE && self.dist[next] == self.dist[u] + 1 =>
                {
                    stack.push(next);
                }
                Some(_) => self.cursor[u] += 1,
            }
        }
        false
    }
}

/// Random maximum matching between `left` and `right` over `edges`
///
/// `edges` are `(left, right)` pairs; pairs whose endpoints are not in the
/// given lists are ignored. The result holds one `(left, right)` pair per
/// matched node. Empty inputs give an empty matching.
pub fn maximum_matching<R: Rng + ?Sized>(
    left: &[NodeIndex],
    right: &[NodeIndex],
    edges: &[(NodeIndex, NodeIndex)],
    rng: &mut R,
) -> Vec<(NodeIndex, NodeIndex)> {
    if left.is_empty() || right.is_empty() || edges.is_empty() {
        return Vec::new();
    }

    // Right nodes are the primary side U, left nodes are V
    let u_index: HashMap<NodeIndex, usize> =
        right.iter().enumerate().map(|(i, &node)| (node, i)).collect();
    let v_index: HashMap<NodeIndex, usize> =
        left.iter().enumerate().map(|(i, &node)| (node, i)).collect();

    let mut adjacency = vec![Vec::new(); right.len()];
    for &(source, target) in edges {
        if let (Some(&u), Some(&v)) = (u_index.get(&target), v_index.get(&source)) {
            if !adjacency[u].contains(&v) {
                adjacency[u].push(v);
            }
        }
    }

    let mut engine = HopcroftKarp::new(adjacency, left.len());
    engine.solve_shuffled(rng);

    engine
        .pairs()
        .map(|(u, v)| (left[v], right[u]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn is_matching(pairs: &[(usize, usize)], edges: &[(usize, usize)]) -> bool {
        let mut lefts = HashSet::new();
        let mut rights = HashSet::new();
        pairs
            .iter()
            .all(|pair| edges.contains(pair) && lefts.insert(pair.0) && rights.insert(pair.1))
    }

    /// Simple augmenting-path reference (Kuhn's algorithm)
    fn reference_size(left: &[usize], right: &[usize], edges: &[(usize, usize)]) -> usize {
        fn try_kuhn(
            l: usize,
            edges: &[(usize, usize)],
            right: &[usize],
            seen: &mut HashSet<usize>,
            owner: &mut std::collections::HashMap<usize, usize>,
        ) -> bool {
            for &(s, t) in edges {
                if s != l || !right.contains(&t) || !seen.insert(t) {
                    continue;
                }
                let free = match owner.get(&t).copied() {
                    None => true,
                    Some(other) => try_kuhn(other, edges, right, seen, owner),
                };
                if free {
                    owner.insert(t, l);
                    return true;
                }
            }
            false
        }

        let mut owner = std::collections::HashMap::new();
        left.iter()
            .filter(|&&l| try_kuhn(l, edges, right, &mut HashSet::new(), &mut owner))
            .count()
    }

    #[test]
    fn test_empty_inputs_give_empty_matching() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(maximum_matching(&[], &[1], &[(0, 1)], &mut rng).is_empty());
        assert!(maximum_matching(&[0], &[], &[(0, 1)], &mut rng).is_empty());
        assert!(maximum_matching(&[0], &[1], &[], &mut rng).is_empty());
    }

    #[test]
    fn test_matching_size_matches_reference() {
        let cases: Vec<(Vec<usize>, Vec<usize>, Vec<(usize, usize)>)> = vec![
            (vec![0, 1, 2], vec![3, 4, 5], vec![(0, 3), (0, 4), (1, 3), (2, 5)]),
            (vec![0, 1, 2, 3], vec![4, 5], vec![(0, 4), (1, 4), (2, 4), (3, 4)]),
            (
                vec![0, 1, 2, 3],
                vec![4, 5, 6, 7],
                vec![(0, 4), (0, 5), (1, 4), (2, 5), (2, 6), (3, 6), (3, 7), (1, 7)],
            ),
            // Same node on both sides, as with self-loops in a control graph
            (vec![0, 1, 2], vec![0, 1, 2], vec![(0, 0), (0, 1), (1, 2), (2, 0)]),
        ];

        for (seed, (left, right, edges)) in cases.iter().enumerate() {
            let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
            let pairs = maximum_matching(left, right, edges, &mut rng);
            assert!(is_matching(&pairs, edges), "not a matching: {:?}", pairs);
            assert_eq!(pairs.len(), reference_size(left, right, edges));
        }
    }

    #[test]
    fn test_pseudo_random_graphs_are_maximum() {
        let mut generator = ChaCha8Rng::seed_from_u64(7);
        for round in 0..50 {
            let left: Vec<usize> = (0..8).collect();
            let right: Vec<usize> = (8..16).collect();
            let edges: Vec<(usize, usize)> = left
                .iter()
                .flat_map(|&l| right.iter().map(move |&r| (l, r)))
                .filter(|_| generator.gen_bool(0.2))
                .collect();

            let mut rng = ChaCha8Rng::seed_from_u64(round);
            let pairs = maximum_matching(&left, &right, &edges, &mut rng);
            assert!(is_matching(&pairs, &edges));
            assert_eq!(pairs.len(), reference_size(&left, &right, &edges));
        }
    }

    #[test]
    fn test_different_seeds_yield_different_matchings() {
        // Complete bipartite K3,3 has six perfect matchings
        let left = vec![0, 1, 2];
        let right = vec![3, 4, 5];
        let edges: Vec<(usize, usize)> = left
            .iter()
            .flat_map(|&l| right.iter().map(move |&r| (l, r)))
            .collect();

        let distinct: HashSet<Vec<(usize, usize)>> = (0..40)
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut pairs = maximum_matching(&left, &right, &edges, &mut rng);
                pairs.sort_unstable();
                pairs
            })
            .collect();

        assert!(distinct.len() > 1);
        assert!(distinct.iter().all(|pairs| pairs.len() == 3));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let left = vec![0, 1, 2, 3];
        let right = vec![4, 5, 6];
        let edges = vec![(0, 4), (1, 4), (1, 5), (2, 5), (2, 6), (3, 6)];

        let first = maximum_matching(&left, &right, &edges, &mut ChaCha8Rng::seed_from_u64(11));
        let second = maximum_matching(&left, &right, &edges, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(first, second);
    }

    #[test]
    fn test_deterministic_solver_on_local_graph() {
        let mut engine = HopcroftKarp::new(vec![vec![0, 1], vec![0], vec![]], 2);
        assert_eq!(engine.solve(), 2);
        assert_eq!(engine.partner_of_u(1), Some(0));
        assert_eq!(engine.partner_of_u(0), Some(1));
        assert_eq!(engine.partner_of_u(2), None);
    }
}
