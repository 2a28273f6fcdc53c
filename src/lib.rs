//! Crossword filling as a constraint-satisfaction problem: node consistency, AC-3 propagation and
//! backtracking search with MRV/degree variable ordering and least-constraining-value ordering.

pub mod arc_consistency;
pub mod domains;
pub mod puzzle;
pub mod search;
pub mod solver;
pub mod vocabulary;

pub use arc_consistency::{ac3, revise, Arc, ArcConsistencyFailure, ArcConsistencyResult, ArcConsistencySuccess};
pub use domains::DomainStore;
pub use puzzle::{Direction, Overlap, Puzzle, PuzzleError, Variable, VariableId};
pub use search::{Assignment, Search, Statistics};
pub use solver::{render_grid, solve, Solution, SolveFailure, Solver, SolverConfig};
pub use vocabulary::{Vocabulary, Word, WordId};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The marker used for blocked cells when none is given explicitly.
pub const DEFAULT_BLOCKED_MARKER: char = '#';
