use bit_set::BitSet;
use log::debug;

use crate::puzzle::{Puzzle, VariableId};
use crate::vocabulary::{Vocabulary, WordId};

/// The candidate words still possible for each variable, as sets of `WordId`s indexed by
/// `VariableId`. Words are only ever removed. Search works on clones when it needs to narrow a
/// domain speculatively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStore {
    domains: Vec<BitSet>,
}

impl DomainStore {
    /// Give every variable a copy of the full vocabulary.
    pub fn new(puzzle: &Puzzle, vocabulary: &Vocabulary) -> DomainStore {
        let full: BitSet = (0..vocabulary.len()).collect();

        DomainStore {
            domains: puzzle.variable_ids().map(|_| full.clone()).collect(),
        }
    }

    /// Remove every word whose length differs from its variable's length. Never fails, even if a
    /// domain ends up empty.
    pub fn enforce_node_consistency(&mut self, puzzle: &Puzzle, vocabulary: &Vocabulary) {
        for (variable_id, domain) in self.domains.iter_mut().enumerate() {
            let length = puzzle.variable(variable_id).length;
            let wrong_length: Vec<WordId> =
                domain.iter().filter(|&word_id| vocabulary.word(word_id).len() != length).collect();

            for word_id in wrong_length {
                domain.remove(word_id);
            }
        }

        debug!(
            "Node consistency left {} candidates, domain sizes {:?}",
            self.total_len(),
            self.domains.iter().map(BitSet::len).collect::<Vec<_>>()
        );
    }

    /// Candidate words for a variable, in ascending `WordId` order.
    pub fn words(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[variable_id].iter()
    }

    pub fn len(&self, variable_id: VariableId) -> usize {
        self.domains[variable_id].len()
    }

    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.domains[variable_id].is_empty()
    }

    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.domains[variable_id].contains(word_id)
    }

    pub fn remove(&mut self, variable_id: VariableId, word_id: WordId) -> bool {
        self.domains[variable_id].remove(word_id)
    }

    /// Narrow a variable's domain to a single word.
    pub fn restrict_to(&mut self, variable_id: VariableId, word_id: WordId) {
        let domain = &mut self.domains[variable_id];
        let keep = domain.contains(word_id);
        domain.clear();
        if keep {
            domain.insert(word_id);
        }
    }

    /// The first variable whose domain is empty, if any.
    pub fn first_empty(&self) -> Option<VariableId> {
        self.domains.iter().position(BitSet::is_empty)
    }

    pub fn total_len(&self) -> usize {
        self.domains.iter().map(BitSet::len).sum()
    }
}
