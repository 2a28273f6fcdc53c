use anyhow::Context;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the Vocabulary's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The letter at `cell_idx`, or `None` if the word is too short to reach it.
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }

    /// Do the two words put the same letter in a shared cell? A word that doesn't reach the cell
    /// never agrees.
    pub fn agrees_with(&self, cell_idx: usize, other: &Word, other_cell_idx: usize) -> bool {
        match (self.glyph(cell_idx), other.glyph(other_cell_idx)) {
            (Some(glyph), Some(other_glyph)) => glyph == other_glyph,
            _ => false,
        }
    }
}

/// The immutable set of candidate words. Words are normalized to uppercase, deduplicated and kept
/// in sorted order, so a `WordId` is stable for a given word list.
#[derive(Clone, Default)]
pub struct Vocabulary {
    words: Vec<Word>,
}

impl Debug for Vocabulary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Vocabulary {
    pub fn new<I, S>(words: I) -> Vocabulary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();

        Vocabulary {
            words: unique.into_iter().map(Word::new).collect(),
        }
    }

    /// Build a vocabulary from a plain-text list with one word per line.
    pub fn from_word_list(contents: &str) -> Vocabulary {
        Vocabulary::new(contents.lines())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Vocabulary> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;

        Ok(Vocabulary::from_word_list(&contents))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word_id(&self, string: &str) -> Option<WordId> {
        self.words.binary_search_by(|word| word.string.as_str().cmp(string)).ok()
    }
}
