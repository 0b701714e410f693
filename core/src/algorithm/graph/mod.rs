pub mod matching;

pub use self::matching::{maximum_matching, HopcroftKarp};
