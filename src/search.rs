use bit_set::BitSet;
use instant::Duration;
use log::trace;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::arc_consistency::{ac3, Arc};
use crate::domains::DomainStore;
use crate::puzzle::{Puzzle, VariableId};
use crate::vocabulary::{Vocabulary, WordId};

/// A struct tracking statistics about the search.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// How many partial assignments were expanded.
    pub states: u64,
    /// How many candidate words were abandoned after being tried.
    pub backtracks: u64,
    pub duration: Duration,
}

/// A partial mapping from variables to words. Extending an assignment produces a new value and
/// leaves the original alone, so abandoning a branch never needs an undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    used: BitSet,
    assigned_count: usize,
}

impl Assignment {
    pub fn empty(puzzle: &Puzzle) -> Assignment {
        Assignment {
            words: puzzle.variable_ids().map(|_| None).collect(),
            used: BitSet::new(),
            assigned_count: 0,
        }
    }

    /// Return a copy of this assignment with `variable_id` set to `word_id`.
    pub fn extend(&self, variable_id: VariableId, word_id: WordId) -> Assignment {
        let mut extended = self.clone();
        if let Some(previous) = extended.words[variable_id].replace(word_id) {
            if !extended.words.contains(&Some(previous)) {
                extended.used.remove(previous);
            }
        } else {
            extended.assigned_count += 1;
        }
        extended.used.insert(word_id);
        extended
    }

    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.words[variable_id]
    }

    pub fn is_assigned(&self, variable_id: VariableId) -> bool {
        self.words[variable_id].is_some()
    }

    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Does every variable have a word?
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
        self.words.iter().enumerate().filter_map(|(id, word)| word.map(|word| (id, word)))
    }

    /// Could `word_id` be given to the unassigned `variable_id` without breaking any constraint
    /// against the words already placed? Only the new word is checked.
    pub fn is_consistent_extension(
        &self,
        puzzle: &Puzzle,
        vocabulary: &Vocabulary,
        variable_id: VariableId,
        word_id: WordId,
    ) -> bool {
        let word = vocabulary.word(word_id);

        if word.len() != puzzle.variable(variable_id).length {
            return false;
        }

        if self.used.contains(word_id) {
            return false;
        }

        puzzle.neighbors(variable_id).iter().all(|&neighbor_id| {
            match (self.words[neighbor_id], puzzle.overlap(variable_id, neighbor_id)) {
                (Some(neighbor_word_id), Some(overlap)) => {
                    word.agrees_with(overlap.first, vocabulary.word(neighbor_word_id), overlap.second)
                }
                _ => true,
            }
        })
    }

    /// Check every constraint across the whole assignment: lengths, distinct words and agreeing
    /// letters on every crossing where both sides are assigned.
    pub fn is_consistent(&self, puzzle: &Puzzle, vocabulary: &Vocabulary) -> bool {
        let mut seen = BitSet::with_capacity(vocabulary.len());

        for (variable_id, word_id) in self.iter() {
            let word = vocabulary.word(word_id);
            if word.len() != puzzle.variable(variable_id).length || !seen.insert(word_id) {
                return false;
            }

            for &neighbor_id in puzzle.neighbors(variable_id) {
                if let (Some(neighbor_word_id), Some(overlap)) =
                    (self.words[neighbor_id], puzzle.overlap(variable_id, neighbor_id))
                {
                    if !word.agrees_with(overlap.first, vocabulary.word(neighbor_word_id), overlap.second) {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Backtracking search over partial assignments. Domains are only read here; when inference is
/// enabled each branch narrows its own clone of the store.
pub struct Search<'a> {
    puzzle: &'a Puzzle,
    vocabulary: &'a Vocabulary,
    inference: bool,
    pub statistics: Statistics,
}

impl<'a> Search<'a> {
    pub fn new(puzzle: &'a Puzzle, vocabulary: &'a Vocabulary, inference: bool) -> Search<'a> {
        Search { puzzle, vocabulary, inference, statistics: Statistics::default() }
    }

    /// Choose the unassigned variable with the fewest remaining words, preferring the one with
    /// the most neighbors on a tie, and then the lowest id.
    pub fn select_unassigned_variable(
        &self,
        assignment: &Assignment,
        domains: &DomainStore,
    ) -> Option<VariableId> {
        self.puzzle
            .variable_ids()
            .filter(|&variable_id| !assignment.is_assigned(variable_id))
            .min_by_key(|&variable_id| {
                (domains.len(variable_id), Reverse(self.puzzle.neighbors(variable_id).len()))
            })
    }

    /// The words in `variable_id`'s domain, ordered by how many words each would rule out in the
    /// domains of unassigned neighbors (fewest first). Ties keep domain order.
    pub fn order_domain_values(
        &self,
        variable_id: VariableId,
        assignment: &Assignment,
        domains: &DomainStore,
    ) -> Vec<WordId> {
        // For every unassigned crossing, count how many of the neighbor's words put each letter
        // in the shared cell. A candidate rules out everything that doesn't share its letter, and
        // one too short to reach the cell rules out the whole domain.
        let crossings: Vec<(usize, usize, HashMap<char, usize>)> = self
            .puzzle
            .neighbors(variable_id)
            .iter()
            .filter(|&&neighbor_id| !assignment.is_assigned(neighbor_id))
            .filter_map(|&neighbor_id| {
                let overlap = self.puzzle.overlap(variable_id, neighbor_id)?;
                let mut letter_counts: HashMap<char, usize> = HashMap::new();
                for word_id in domains.words(neighbor_id) {
                    if let Some(glyph) = self.vocabulary.word(word_id).glyph(overlap.second) {
                        *letter_counts.entry(glyph).or_insert(0) += 1;
                    }
                }
                Some((overlap.first, domains.len(neighbor_id), letter_counts))
            })
            .collect();

        let mut values: Vec<WordId> = domains.words(variable_id).collect();
        values.sort_by_cached_key(|&word_id| {
            let word = self.vocabulary.word(word_id);
            crossings
                .iter()
                .map(|(cell_idx, total, letter_counts)| {
                    let agreeing = word
                        .glyph(*cell_idx)
                        .and_then(|glyph| letter_counts.get(&glyph).copied())
                        .unwrap_or(0);
                    total - agreeing
                })
                .sum::<usize>()
        });
        values
    }

    /// Narrow a clone of `domains` to reflect `variable_id` being given `word_id`, then propagate
    /// with AC-3. Returns `None` if that empties some domain.
    fn infer(
        &self,
        domains: &DomainStore,
        variable_id: VariableId,
        word_id: WordId,
    ) -> Option<DomainStore> {
        let mut narrowed = domains.clone();
        narrowed.restrict_to(variable_id, word_id);

        let arcs: Vec<Arc> =
            self.puzzle.neighbors(variable_id).iter().map(|&neighbor_id| (neighbor_id, variable_id)).collect();

        ac3(self.puzzle, self.vocabulary, &mut narrowed, Some(arcs.as_slice())).ok()?;
        Some(narrowed)
    }

    /// Extend `assignment` to a complete, consistent assignment if one exists. The first one found
    /// is returned.
    pub fn backtrack(&mut self, assignment: &Assignment, domains: &DomainStore) -> Option<Assignment> {
        if assignment.is_complete() {
            return Some(assignment.clone());
        }
        self.statistics.states += 1;

        let variable_id = self.select_unassigned_variable(assignment, domains)?;
        trace!(
            "Filling {} with {} candidates ({} of {} assigned)",
            self.puzzle.variable(variable_id),
            domains.len(variable_id),
            assignment.len(),
            self.puzzle.variables.len(),
        );

        for word_id in self.order_domain_values(variable_id, assignment, domains) {
            if !assignment.is_consistent_extension(self.puzzle, self.vocabulary, variable_id, word_id) {
                continue;
            }

            let extended = assignment.extend(variable_id, word_id);

            let result = if self.inference {
                match self.infer(domains, variable_id, word_id) {
                    Some(narrowed) => self.backtrack(&extended, &narrowed),
                    None => None,
                }
            } else {
                self.backtrack(&extended, domains)
            };

            if result.is_some() {
                return result;
            }
            self.statistics.backtracks += 1;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{Direction, Variable};

    fn setup(template: &str, words: &[&str]) -> (Puzzle, Vocabulary, DomainStore) {
        let puzzle = Puzzle::from_template(template, '#').unwrap();
        let vocabulary = Vocabulary::new(words);
        let mut domains = DomainStore::new(&puzzle, &vocabulary);
        domains.enforce_node_consistency(&puzzle, &vocabulary);
        (puzzle, vocabulary, domains)
    }

    #[test]
    fn test_extend_leaves_parent_untouched() {
        let (puzzle, vocabulary, _) = setup("___\n_##\n_##\n", &["CAT", "CAR"]);
        let empty = Assignment::empty(&puzzle);

        let extended = empty.extend(0, vocabulary.word_id("CAT").unwrap());

        assert!(empty.is_empty());
        assert_eq!(extended.len(), 1);
        assert_eq!(extended.get(0), vocabulary.word_id("CAT"));
        assert!(!extended.is_complete());
    }

    #[test]
    fn test_consistent_extension_checks_all_constraints() {
        let (puzzle, vocabulary, _) =
            setup("___\n_##\n_##\n", &["CAT", "CAR", "DOG", "TOYS"]);
        let cat = vocabulary.word_id("CAT").unwrap();
        let assignment = Assignment::empty(&puzzle).extend(0, cat);

        let fits = |word: &str| {
            assignment.is_consistent_extension(&puzzle, &vocabulary, 1, vocabulary.word_id(word).unwrap())
        };

        // wrong length
        assert!(!fits("TOYS"));
        // already used
        assert!(!fits("CAT"));
        // crossing letter disagrees
        assert!(!fits("DOG"));
        assert!(fits("CAR"));
    }

    #[test]
    fn test_is_consistent_detects_duplicates() {
        let (puzzle, vocabulary, _) = setup("___\n###\n___\n", &["CAT"]);
        let assignment = Assignment::empty(&puzzle).extend(0, 0).extend(1, 0);

        assert!(assignment.is_complete());
        assert!(!assignment.is_consistent(&puzzle, &vocabulary));
    }

    #[test]
    fn test_select_prefers_smallest_domain_then_degree() {
        // Down (0,1) crosses both acrosses; the two acrosses only cross it.
        let (puzzle, vocabulary, mut domains) =
            setup("___\n#_#\n___\n", &["ABC", "DEF", "GHI", "BEH"]);
        let assignment = Assignment::empty(&puzzle);
        let search = Search::new(&puzzle, &vocabulary, false);

        let down = puzzle.variable_id(&Variable::new(0, 1, Direction::Down, 3)).unwrap();
        assert_eq!(search.select_unassigned_variable(&assignment, &domains), Some(down));

        let bottom = puzzle.variable_id(&Variable::new(2, 0, Direction::Across, 3)).unwrap();
        domains.remove(bottom, 0);
        assert_eq!(search.select_unassigned_variable(&assignment, &domains), Some(bottom));

        let assignment = assignment.extend(bottom, 1);
        domains.remove(down, 0);
        domains.remove(down, 1);
        assert_eq!(search.select_unassigned_variable(&assignment, &domains), Some(down));
    }

    #[test]
    fn test_order_domain_values_least_constraining_first() {
        let (puzzle, vocabulary, domains) =
            setup("___\n_##\n_##\n", &["CAT", "CAR", "CUB", "DOG", "TIN"]);
        let search = Search::new(&puzzle, &vocabulary, false);

        let order = search.order_domain_values(0, &Assignment::empty(&puzzle), &domains);
        let strings: Vec<&str> = order.iter().map(|&w| vocabulary.word(w).string.as_str()).collect();

        // C-words leave three options for the crossing, the others only one.
        assert_eq!(strings, vec!["CAR", "CAT", "CUB", "DOG", "TIN"]);
    }

    #[test]
    fn test_order_domain_values_counts_short_words_as_eliminated() {
        let puzzle = Puzzle::from_template("##_\n___\n", '#').unwrap();
        let vocabulary = Vocabulary::new(["AB", "CAT", "AT"]);
        let domains = DomainStore::new(&puzzle, &vocabulary);
        let search = Search::new(&puzzle, &vocabulary, false);

        let order = search.order_domain_values(0, &Assignment::empty(&puzzle), &domains);
        let strings: Vec<&str> = order.iter().map(|&w| vocabulary.word(w).string.as_str()).collect();

        // Only CAT reaches the crossing, so AT is the one word that leaves it an option.
        assert_eq!(strings, vec!["AT", "AB", "CAT"]);
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_neighbors() {
        let (puzzle, vocabulary, domains) = setup("___\n_##\n_##\n", &["TIN", "DOG", "CAT", "CAR"]);
        let search = Search::new(&puzzle, &vocabulary, false);
        let assignment = Assignment::empty(&puzzle).extend(1, vocabulary.word_id("DOG").unwrap());

        let order = search.order_domain_values(0, &assignment, &domains);

        assert_eq!(order, domains.words(0).collect::<Vec<_>>());
    }

    #[test]
    fn test_backtrack_does_not_mutate_domains() {
        let (puzzle, vocabulary, domains) = setup("___\n_##\n_##\n", &["CAT", "CAR", "DOG", "TIN"]);
        let before = domains.clone();

        for inference in [false, true] {
            let mut search = Search::new(&puzzle, &vocabulary, inference);
            let result = search.backtrack(&Assignment::empty(&puzzle), &domains).unwrap();

            assert!(result.is_complete());
            assert!(result.is_consistent(&puzzle, &vocabulary));
            assert_eq!(domains, before);
        }
    }
}
