use instant::Instant;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

use crate::arc_consistency::{ac3, ArcConsistencyFailure};
use crate::domains::DomainStore;
use crate::puzzle::{Puzzle, Variable};
use crate::search::{Assignment, Search, Statistics};
use crate::vocabulary::Vocabulary;

/// Knobs for a single solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverConfig {
    /// Re-establish arc consistency after every tentative assignment (on a per-branch copy of the
    /// domains) and skip candidates that wipe out a neighbor.
    pub inference: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveFailure {
    /// Some variable has no candidate words left after node or arc consistency.
    UnsatisfiableDomain(Variable),
    /// The search exhausted every branch.
    NoSolutionFound,
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::UnsatisfiableDomain(variable) => {
                write!(f, "no candidate words remain for {}", variable)
            }
            SolveFailure::NoSolutionFound => write!(f, "no solution"),
        }
    }
}

impl std::error::Error for SolveFailure {}

/// A complete, consistent fill.
#[derive(Debug, Clone)]
pub struct Solution {
    pub words: BTreeMap<Variable, String>,
    pub statistics: Statistics,
}

impl Solution {
    pub fn get(&self, variable: &Variable) -> Option<&str> {
        self.words.get(variable).map(String::as_str)
    }

    /// The letter in each cell, or `None` for cells no word covers.
    pub fn letter_grid(&self, puzzle: &Puzzle) -> Vec<Vec<Option<char>>> {
        let mut letters = vec![vec![None; puzzle.width]; puzzle.height];

        for (variable, word) in &self.words {
            for ((row, col), letter) in variable.cells().zip(word.chars()) {
                letters[row][col] = Some(letter);
            }
        }

        letters
    }
}

/// Turn the given puzzle and solution into a rendered string, with `█` for blocked cells.
pub fn render_grid(puzzle: &Puzzle, solution: &Solution) -> String {
    let letters = solution.letter_grid(puzzle);

    puzzle
        .structure
        .iter()
        .zip(&letters)
        .map(|(structure_row, letter_row)| {
            structure_row
                .iter()
                .zip(letter_row)
                .map(|(&open, letter)| match (open, letter) {
                    (false, _) => '█',
                    (true, Some(letter)) => *letter,
                    (true, None) => ' ',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills a puzzle from a vocabulary: node consistency, then AC-3, then backtracking search.
pub struct Solver<'a> {
    puzzle: &'a Puzzle,
    vocabulary: &'a Vocabulary,
    config: SolverConfig,
    domains: DomainStore,
}

impl<'a> Solver<'a> {
    pub fn new(puzzle: &'a Puzzle, vocabulary: &'a Vocabulary, config: SolverConfig) -> Solver<'a> {
        Solver {
            puzzle,
            vocabulary,
            config,
            domains: DomainStore::new(puzzle, vocabulary),
        }
    }

    /// The current domains; narrowed in place by `enforce_node_consistency` and `ac3`.
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn enforce_node_consistency(&mut self) {
        self.domains.enforce_node_consistency(self.puzzle, self.vocabulary);
    }

    pub fn ac3(&mut self) -> Result<(), SolveFailure> {
        match ac3(self.puzzle, self.vocabulary, &mut self.domains, None) {
            Ok(success) => {
                debug!("AC-3 removed {} words", success.removals);
                Ok(())
            }
            Err(ArcConsistencyFailure { emptied_variable_id }) => Err(
                SolveFailure::UnsatisfiableDomain(*self.puzzle.variable(emptied_variable_id)),
            ),
        }
    }

    /// Search from the current domains, returning the first complete assignment found.
    pub fn backtrack(&self) -> (Option<Assignment>, Statistics) {
        let mut search = Search::new(self.puzzle, self.vocabulary, self.config.inference);
        let result = search.backtrack(&Assignment::empty(self.puzzle), &self.domains);
        (result, search.statistics)
    }

    pub fn solve(mut self) -> Result<Solution, SolveFailure> {
        let start = Instant::now();

        self.enforce_node_consistency();
        if let Some(variable_id) = self.domains.first_empty() {
            let variable = *self.puzzle.variable(variable_id);
            debug!("No words of length {} for {}", variable.length, variable);
            return Err(SolveFailure::UnsatisfiableDomain(variable));
        }

        self.ac3()?;

        let (assignment, mut statistics) = self.backtrack();
        statistics.duration = start.elapsed();
        debug!("Search finished: {:?}", statistics);

        let assignment = assignment.ok_or(SolveFailure::NoSolutionFound)?;
        Ok(self.materialize(&assignment, statistics))
    }

    fn materialize(&self, assignment: &Assignment, statistics: Statistics) -> Solution {
        let words = assignment
            .iter()
            .map(|(variable_id, word_id)| {
                (*self.puzzle.variable(variable_id), self.vocabulary.word(word_id).string.clone())
            })
            .collect();

        Solution { words, statistics }
    }
}

/// Solve a puzzle with the default configuration.
pub fn solve(puzzle: &Puzzle, vocabulary: &Vocabulary) -> Result<Solution, SolveFailure> {
    Solver::new(puzzle, vocabulary, SolverConfig::default()).solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Direction;

    #[test]
    fn test_single_slot() {
        let puzzle = Puzzle::from_template("___", '#').unwrap();
        let vocabulary = Vocabulary::new(["CAT", "DOG"]);

        let solution = solve(&puzzle, &vocabulary).unwrap();
        let word = solution.get(&Variable::new(0, 0, Direction::Across, 3)).unwrap();

        assert!(["CAT", "DOG"].contains(&word));
    }

    #[test]
    fn test_render_grid() {
        let puzzle = Puzzle::from_template("___\n_##\n_##\n", '#').unwrap();
        let vocabulary = Vocabulary::new(["CAT", "CAR", "DOG", "TIN"]);

        let solution = solve(&puzzle, &vocabulary).unwrap();
        let rendered = render_grid(&puzzle, &solution);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('C'));
        assert!(lines[1].ends_with("██"));
        assert_eq!(solution.letter_grid(&puzzle)[1][1], None);
    }

    #[test]
    fn test_empty_domain_after_node_consistency() {
        let puzzle = Puzzle::from_template("____", '#').unwrap();
        let vocabulary = Vocabulary::new(["CAT"]);

        assert_eq!(
            solve(&puzzle, &vocabulary).unwrap_err(),
            SolveFailure::UnsatisfiableDomain(Variable::new(0, 0, Direction::Across, 4))
        );
    }

    #[test]
    fn test_ac3_failure_is_reported() {
        let puzzle = Puzzle::from_template("____\n_###\n_###\n", '#').unwrap();
        let vocabulary = Vocabulary::new(["CAT", "TOYS"]);
        let mut solver = Solver::new(&puzzle, &vocabulary, SolverConfig::default());

        solver.enforce_node_consistency();

        assert_eq!(
            solver.ac3(),
            Err(SolveFailure::UnsatisfiableDomain(Variable::new(0, 0, Direction::Down, 3)))
        );
        assert!(solver.domains().is_empty(0));
    }

    #[test]
    fn test_duplicate_words_are_rejected_by_search() {
        // Distinctness isn't an arc constraint, so AC-3 passes and only the search rules it out.
        let puzzle = Puzzle::from_template("___\n_##\n_##\n", '#').unwrap();
        let vocabulary = Vocabulary::new(["CAT"]);
        let mut solver = Solver::new(&puzzle, &vocabulary, SolverConfig::default());

        solver.enforce_node_consistency();
        assert_eq!(solver.ac3(), Ok(()));
        assert_eq!(solver.domains().len(0), 1);

        assert_eq!(solver.solve().unwrap_err(), SolveFailure::NoSolutionFound);
    }

    #[test]
    fn test_ac3_and_backtrack_tolerate_words_of_other_lengths() {
        let puzzle = Puzzle::from_template("##_\n___\n", '#').unwrap();
        let vocabulary = Vocabulary::new(["AB", "CAT", "AT"]);
        let at = vocabulary.word_id("AT").unwrap();
        let cat = vocabulary.word_id("CAT").unwrap();

        let mut solver = Solver::new(&puzzle, &vocabulary, SolverConfig::default());
        solver.ac3().unwrap();
        assert_eq!(solver.domains().words(0).collect::<Vec<_>>(), vec![at]);
        assert_eq!(solver.domains().words(1).collect::<Vec<_>>(), vec![cat]);

        let solver = Solver::new(&puzzle, &vocabulary, SolverConfig::default());
        let (assignment, statistics) = solver.backtrack();
        let assignment = assignment.unwrap();
        println!("{:?}", statistics);

        assert!(assignment.is_complete());
        assert!(assignment.is_consistent(&puzzle, &vocabulary));
        assert_eq!(assignment.get(0), Some(at));
        assert_eq!(assignment.get(1), Some(cat));
    }

    #[test]
    fn test_puzzle_without_variables_is_trivially_solved() {
        let puzzle = Puzzle::from_template("_#_\n###\n", '#').unwrap();

        let solution = solve(&puzzle, &Vocabulary::default()).unwrap();

        assert!(solution.words.is_empty());
        assert_eq!(render_grid(&puzzle, &solution), " █ \n███");
    }
}
