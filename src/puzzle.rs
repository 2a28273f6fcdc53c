use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given variable, based on its index in the Puzzle's `variables` field.
pub type VariableId = usize;

/// Zero-indexed (row, col) coords for a cell in the grid, where row = 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A slot in the grid that needs one word: start cell, direction and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable { row, col, direction, length }
    }

    /// Generate the coords for each cell of this variable.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {} : {}", self.row, self.col, self.direction, self.length)
    }
}

/// The cell shared by two crossing variables, as an index into each variable's word. `first`
/// always refers to the variable passed first to `Puzzle::overlap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub first: usize,
    pub second: usize,
}

impl Overlap {
    fn flipped(self) -> Overlap {
        Overlap { first: self.second, second: self.first }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    EmptyStructure,
    InvalidVariable(Variable),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::EmptyStructure => write!(f, "structure has no rows"),
            PuzzleError::InvalidVariable(variable) => {
                write!(f, "variable {} does not fit the open cells of the grid", variable)
            }
        }
    }
}

impl std::error::Error for PuzzleError {}

/// The static geometry of a crossword: which cells are open, which slots need words and where
/// those slots cross. Built once and read-only during solving.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub width: usize,
    pub height: usize,

    /// `structure[row][col]` is true for cells that are part of the crossword.
    pub structure: Vec<Vec<bool>>,

    pub variables: Vec<Variable>,

    neighbors: Vec<SmallVec<[VariableId; MAX_SLOT_LENGTH]>>,
    overlaps: HashMap<(VariableId, VariableId), Overlap>,
}

impl Puzzle {
    /// Parse a grid layout where `blocked` marks blocked cells and any other character is an open
    /// cell. Blank lines are ignored and short rows are padded with blocked cells. Surrounding
    /// whitespace is trimmed unless the blocked marker is itself whitespace.
    pub fn from_template(template: &str, blocked: char) -> Result<Puzzle, PuzzleError> {
        let rows: Vec<Vec<bool>> = template
            .lines()
            .map(|line| {
                if blocked.is_whitespace() {
                    line.trim_end_matches('\r')
                } else {
                    line.trim()
                }
            })
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|c| c != blocked).collect())
            .collect();

        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(PuzzleError::EmptyStructure);
        }

        let structure: Vec<Vec<bool>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, false);
                row
            })
            .collect();

        let is_open = |row: usize, col: usize| row < height && col < width && structure[row][col];

        let mut variables = vec![];
        for row in 0..height {
            for col in 0..width {
                if !structure[row][col] {
                    continue;
                }

                if row == 0 || !structure[row - 1][col] {
                    let length = (row..).take_while(|&r| is_open(r, col)).count();
                    if length > 1 {
                        variables.push(Variable::new(row, col, Direction::Down, length));
                    }
                }

                if col == 0 || !structure[row][col - 1] {
                    let length = (col..).take_while(|&c| is_open(row, c)).count();
                    if length > 1 {
                        variables.push(Variable::new(row, col, Direction::Across, length));
                    }
                }
            }
        }

        Puzzle::from_variables(width, height, structure, variables)
    }

    /// Build a puzzle from an explicit list of variables, computing neighbors and overlaps.
    pub fn from_variables(
        width: usize,
        height: usize,
        structure: Vec<Vec<bool>>,
        variables: Vec<Variable>,
    ) -> Result<Puzzle, PuzzleError> {
        if height == 0 || width == 0 || structure.len() != height {
            return Err(PuzzleError::EmptyStructure);
        }

        // Map each cell to the (variable, cell index) pairs that cover it.
        let mut cell_entries: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
            HashMap::new();

        for (variable_id, variable) in variables.iter().enumerate() {
            if variable.length == 0 {
                return Err(PuzzleError::InvalidVariable(*variable));
            }
            for (cell_idx, (row, col)) in variable.cells().enumerate() {
                let open = structure.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false);
                if !open || col >= width {
                    return Err(PuzzleError::InvalidVariable(*variable));
                }
                cell_entries.entry((row, col)).or_default().push((variable_id, cell_idx));
            }
        }

        let mut overlaps: HashMap<(VariableId, VariableId), Overlap> = HashMap::new();
        for entries in cell_entries.values() {
            for (a, &(x, x_cell)) in entries.iter().enumerate() {
                for &(y, y_cell) in &entries[a + 1..] {
                    if x == y {
                        continue;
                    }
                    let overlap = Overlap { first: x_cell, second: y_cell };
                    overlaps.entry((x, y)).or_insert(overlap);
                    overlaps.entry((y, x)).or_insert(overlap.flipped());
                }
            }
        }

        let mut neighbors: Vec<SmallVec<[VariableId; MAX_SLOT_LENGTH]>> =
            variables.iter().map(|_| SmallVec::new()).collect();
        for &(x, y) in overlaps.keys() {
            neighbors[x].push(y);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        Ok(Puzzle { width, height, structure, variables, neighbors, overlaps })
    }

    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variables.iter().position(|v| v == variable)
    }

    /// All variables sharing a cell with the given one, in ascending id order.
    pub fn neighbors(&self, variable_id: VariableId) -> &[VariableId] {
        &self.neighbors[variable_id]
    }

    /// Where `x` and `y` cross, oriented so that `first` indexes into `x`'s word. Works with
    /// either argument order.
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<Overlap> {
        self.overlaps.get(&(x, y)).copied()
    }

    pub fn variable_ids(&self) -> std::ops::Range<VariableId> {
        0..self.variables.len()
    }
}
