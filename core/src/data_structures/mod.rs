//! Network, path and matrix representations
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod control_path;
pub mod graph;
pub mod matrix;

pub use self::control_path::{
    ArchiveUpdate, ControlPath, ControlPathSet, IndexedPaths, SolutionArchive,
};
pub use self::graph::{ControlGraph, ControlProblem, EdgeSpec, NetworkSnapshot};
pub use self::matrix::Matrix;
