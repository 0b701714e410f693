//! Post-processing of grown control paths
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet};

use crate::algorithm::traits::NodeIndex;

/// Truncates every path at its earliest node that ends some path
///
/// Repeats until no path changes. A path is never cut below its target, and
/// every cut ends the path on a node that already drives another path, so
/// the driver set can only shrink.
pub fn cut_to_driven(paths: &mut [Vec<NodeIndex>]) -> usize {
    let mut cuts = 0;
    loop {
        let drivers: HashSet<NodeIndex> =
            paths.iter().filter_map(|path| path.last().copied()).collect();
        let mut changed = false;
        for path in paths.iter_mut() {
            if let Some(position) = path.iter().position(|node| drivers.contains(node)) {
                if position + 1 < path.len() {
                    path.truncate(position + 1);
                    changed = true;
                    cuts += 1;
                }
            }
        }
        if !changed {
            return cuts;
        }
    }
}

/// Slots whose driver also drives at least one other slot
pub fn shared_driver_slots(paths: &[Vec<NodeIndex>]) -> Vec<bool> {
    let mut load: HashMap<NodeIndex, usize> = HashMap::new();
    for driver in paths.iter().filter_map(|path| path.last()) {
        *load.entry(*driver).or_insert(0) += 1;
    }
    paths
        .iter()
        .map(|path| path.last().map_or(false, |driver| load[driver] > 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::control_path::driver_count;

    #[test]
    fn test_cut_collapses_onto_existing_driver() {
        // Target 10 runs through 5, which already drives target 11
        let mut paths = vec![vec![10, 5, 4, 3], vec![11, 6, 5]];
        let cuts = cut_to_driven(&mut paths);
        assert_eq!(cuts, 1);
        assert_eq!(paths, vec![vec![10, 5], vec![11, 6, 5]]);
        assert_eq!(driver_count(&paths), 1);
    }

    #[test]
    fn test_cut_removes_cycles_back_to_the_path_end() {
        let mut paths = vec![vec![3, 2, 3, 2, 3]];
        cut_to_driven(&mut paths);
        assert_eq!(paths, vec![vec![3]]);
    }

    #[test]
    fn test_cut_reaches_a_fixed_point() {
        // Target 1 already drives the second path
        let mut paths = vec![vec![1, 2, 7], vec![4, 2, 9, 1]];
        cut_to_driven(&mut paths);
        assert_eq!(paths, vec![vec![1], vec![4, 2, 9, 1]]);

        let mut paths = vec![vec![1, 2, 7], vec![4, 2, 9, 1], vec![5, 7]];
        cut_to_driven(&mut paths);
        assert_eq!(cut_to_driven(&mut paths), 0);
        assert!(paths.iter().all(|path| !path.is_empty()));
    }

    #[test]
    fn test_cut_never_increases_driver_count() {
        let cases = vec![
            vec![vec![0, 1, 2], vec![3, 2], vec![4, 1, 5]],
            vec![vec![0, 1, 2, 3], vec![4, 5, 6], vec![7, 3, 6]],
            vec![vec![0], vec![1, 0, 2]],
        ];
        for mut paths in cases {
            let before = driver_count(&paths);
            let targets: Vec<NodeIndex> = paths.iter().map(|path| path[0]).collect();
            let original = paths.clone();
            cut_to_driven(&mut paths);

            assert!(driver_count(&paths) <= before);
            for (slot, path) in paths.iter().enumerate() {
                assert_eq!(path[0], targets[slot]);
                assert!(original[slot].starts_with(path));
            }
        }
    }

    #[test]
    fn test_shared_driver_slots() {
        let paths = vec![vec![0, 1], vec![2, 1], vec![3]];
        assert_eq!(shared_driver_slots(&paths), vec![true, true, false]);
    }
}
