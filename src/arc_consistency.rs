use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::puzzle::{Puzzle, VariableId};
use crate::vocabulary::{Vocabulary, WordId};

/// An ordered pair of variables `(x, y)`: revising it makes `x` consistent with `y`.
pub type Arc = (VariableId, VariableId);

/// Data structure used in `ac3` to track which arcs we still need to visit, in FIFO order. An
/// arc that is already waiting in the queue isn't added a second time.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    pending: HashSet<Arc>,
}

impl ArcQueue {
    fn new() -> ArcQueue {
        ArcQueue { queue: VecDeque::new(), pending: HashSet::new() }
    }

    fn with_initial_queue<Items>(items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue::new();
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    /// Every arc in the problem: `(x, y)` for each variable `x` and each neighbor `y`.
    fn all_arcs(puzzle: &Puzzle) -> ArcQueue {
        ArcQueue::with_initial_queue(
            puzzle.variable_ids().flat_map(|x| puzzle.neighbors(x).iter().map(move |&y| (x, y))),
        )
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.pending.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.pending.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `ac3`.
#[derive(Debug, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many words were removed across all domains.
    pub removals: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    /// The variable whose domain was emptied.
    pub emptied_variable_id: VariableId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x` arc consistent with `y` by removing every word from `x`'s domain that has no partner
/// in `y`'s domain agreeing on the shared cell. Returns the number of words removed, which is
/// zero when the variables don't overlap.
pub fn revise(
    puzzle: &Puzzle,
    vocabulary: &Vocabulary,
    domains: &mut DomainStore,
    x: VariableId,
    y: VariableId,
) -> usize {
    let overlap = match puzzle.overlap(x, y) {
        Some(overlap) => overlap,
        None => return 0,
    };

    // Which letters can `y` still put in the shared cell?
    let supported: HashSet<char> = domains
        .words(y)
        .filter_map(|word_id| vocabulary.word(word_id).glyph(overlap.second))
        .collect();

    let unsupported: Vec<WordId> = domains
        .words(x)
        .filter(|&word_id| match vocabulary.word(word_id).glyph(overlap.first) {
            Some(glyph) => !supported.contains(&glyph),
            None => true,
        })
        .collect();

    for &word_id in &unsupported {
        domains.remove(x, word_id);
    }

    unsupported.len()
}

/// Enforce arc consistency with AC-3. If `arcs` is `None`, begin with every arc in the problem;
/// otherwise only the given arcs are checked initially. Fails as soon as any domain is emptied.
pub fn ac3(
    puzzle: &Puzzle,
    vocabulary: &Vocabulary,
    domains: &mut DomainStore,
    arcs: Option<&[Arc]>,
) -> ArcConsistencyResult {
    let mut queue = match arcs {
        Some(arcs) => ArcQueue::with_initial_queue(arcs.iter().copied()),
        None => ArcQueue::all_arcs(puzzle),
    };

    let mut removals = 0;

    while let Some((x, y)) = queue.pop_front() {
        let removed = revise(puzzle, vocabulary, domains, x, y);
        if removed == 0 {
            continue;
        }
        removals += removed;
        trace!("Revising {} against {} removed {} words", x, y, removed);

        if domains.is_empty(x) {
            debug!("AC-3 emptied the domain of {}", puzzle.variable(x));
            return Err(ArcConsistencyFailure { emptied_variable_id: x });
        }

        // `x` shrank, so anything that relied on it for support has to be rechecked.
        for &z in puzzle.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess { removals })
}
