//! Exact mine probabilities for every hidden cell.
//!
//! The enumeration walks the grid in row-major order, branching hidden cells
//! into mine/safe and counting every placement that satisfies all revealed
//! numbers plus the global mine budget. Sub-counts are memoized on the
//! compact tuple `(position, budget, residuals of still-active constraints)`;
//! far from the revealed numbers most of the board is constraint-free, so the
//! same sub-problem recurs across many outer branches and the search
//! collapses into a dynamic program.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::*;

/// P(mine) for every hidden cell, keyed by flat cell index.
///
/// On a fully hidden board this is the closed-form prior `25/64` for every
/// cell; otherwise each hidden cell is enumerated with the cell pinned as a
/// mine, and the complement is derived from a lazily-computed grand total, so
/// `P(mine) + P(safe) = 1` by construction. Hidden cells with no revealed
/// neighbor are statistically interchangeable and share one enumerated value.
pub fn mine_probabilities(board: &[CellState; CELL_COUNT]) -> BTreeMap<CellId, f64> {
    let mut probabilities = BTreeMap::new();

    if board.iter().all(|state| !state.is_revealed()) {
        let prior = f64::from(MINE_COUNT) / CELL_COUNT as f64;
        for cell in 0..CELL_COUNT as u8 {
            probabilities.insert(cell, prior);
        }
        return probabilities;
    }

    let mut grand_total: Option<u64> = None;
    let mut interchangeable: Option<f64> = None;

    for cell in 0..CELL_COUNT as u8 {
        if board[usize::from(cell)].is_revealed() {
            continue;
        }
        let informative = neighbors(cell).any(|n| board[usize::from(n)].is_revealed());
        if !informative && let Some(shared) = interchangeable {
            probabilities.insert(cell, shared);
            continue;
        }

        let as_mine = Enumeration::new(board, Some(cell)).count();
        let total = match grand_total {
            Some(total) => total,
            None => {
                let total = Enumeration::new(board, None).count();
                grand_total = Some(total);
                total
            }
        };
        // a zero total cannot arise from a truthful board; a pinned branch
        // with zero completions is an ordinary 0 or 1
        let probability = if total == 0 {
            0.0
        } else {
            as_mine as f64 / total as f64
        };
        if !informative {
            interchangeable = Some(probability);
        }
        probabilities.insert(cell, probability);
    }

    probabilities
}

/// Role of one cell inside a single enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SolveCell {
    /// Hidden, free to branch either way.
    Open,
    /// Known mine: exposed on the board, or pinned by the caller.
    Mine,
    /// Pinned safe.
    Safe,
    /// Revealed number constraining its hidden neighbors.
    Clue(u8),
}

struct Enumeration {
    cells: [SolveCell; CELL_COUNT],
    /// Per clue cell, mines still owed among its not-yet-scanned neighbors.
    residual: [i8; CELL_COUNT],
    /// Per clue cell, the last row-major index of its neighborhood.
    deadline: [u8; CELL_COUNT],
    /// Clue ids in ascending order, for memo-key construction.
    clue_ids: Vec<CellId>,
    /// `settled[pos]`: clues whose neighborhood completed at `pos - 1`.
    settled: Vec<Vec<CellId>>,
    /// `capacity[pos]`: cells at index >= `pos` that may hold a mine.
    capacity: [u8; CELL_COUNT + 1],
    memo: BTreeMap<(u8, u8, Vec<u8>), u64>,
    budget: u8,
}

impl Enumeration {
    fn new(board: &[CellState; CELL_COUNT], pin_mine: Option<CellId>) -> Self {
        let mut cells = [SolveCell::Open; CELL_COUNT];
        for (slot, &state) in cells.iter_mut().zip(board.iter()) {
            *slot = match state {
                CellState::Hidden => SolveCell::Open,
                CellState::Revealed(MINE_VALUE) => SolveCell::Mine,
                CellState::Revealed(value) => SolveCell::Clue(value as u8),
            };
        }
        if let Some(cell) = pin_mine {
            cells[usize::from(cell)] = SolveCell::Mine;
        }
        Self::from_cells(cells)
    }

    fn from_cells(cells: [SolveCell; CELL_COUNT]) -> Self {
        let mut residual = [0i8; CELL_COUNT];
        let mut deadline = [0u8; CELL_COUNT];
        let mut clue_ids = Vec::new();
        let mut settled = Vec::new();
        settled.resize(CELL_COUNT + 1, Vec::new());

        for cell in 0..CELL_COUNT as u8 {
            if let SolveCell::Clue(value) = cells[usize::from(cell)] {
                residual[usize::from(cell)] = value as i8;
                let last = neighbors(cell).max().unwrap_or(cell);
                deadline[usize::from(cell)] = last;
                settled[usize::from(last) + 1].push(cell);
                clue_ids.push(cell);
            }
        }

        let mut capacity = [0u8; CELL_COUNT + 1];
        for pos in (0..CELL_COUNT).rev() {
            let minable = matches!(cells[pos], SolveCell::Open | SolveCell::Mine) as u8;
            capacity[pos] = capacity[pos + 1] + minable;
        }

        Self {
            cells,
            residual,
            deadline,
            clue_ids,
            settled,
            capacity,
            memo: BTreeMap::new(),
            budget: MINE_COUNT as u8,
        }
    }

    fn count(&mut self) -> u64 {
        let budget = self.budget;
        self.descend(0, budget)
    }

    fn descend(&mut self, pos: u8, budget: u8) -> u64 {
        // a clue whose whole neighborhood has been scanned must be exactly met
        for i in 0..self.settled[usize::from(pos)].len() {
            let clue = self.settled[usize::from(pos)][i];
            if self.residual[usize::from(clue)] != 0 {
                return 0;
            }
        }
        if usize::from(pos) == CELL_COUNT {
            return u64::from(budget == 0);
        }
        if budget > self.capacity[usize::from(pos)] {
            return 0;
        }

        let key = self.memo_key(pos, budget);
        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }

        let total = match self.cells[usize::from(pos)] {
            SolveCell::Safe | SolveCell::Clue(_) => self.descend(pos + 1, budget),
            SolveCell::Mine => self.descend_with_mine(pos, budget),
            SolveCell::Open => {
                self.descend(pos + 1, budget) + self.descend_with_mine(pos, budget)
            }
        };
        self.memo.insert(key, total);
        total
    }

    fn descend_with_mine(&mut self, pos: u8, budget: u8) -> u64 {
        if budget == 0 || !self.place_mine(pos) {
            return 0;
        }
        let below = self.descend(pos + 1, budget - 1);
        self.lift_mine(pos);
        below
    }

    /// Charges a mine at `pos` against its clue neighbors; refuses (without
    /// mutating) when any of them is already exactly met.
    fn place_mine(&mut self, pos: u8) -> bool {
        for n in neighbors(pos) {
            if matches!(self.cells[usize::from(n)], SolveCell::Clue(_))
                && self.residual[usize::from(n)] == 0
            {
                return false;
            }
        }
        for n in neighbors(pos) {
            if matches!(self.cells[usize::from(n)], SolveCell::Clue(_)) {
                self.residual[usize::from(n)] -= 1;
            }
        }
        true
    }

    fn lift_mine(&mut self, pos: u8) {
        for n in neighbors(pos) {
            if matches!(self.cells[usize::from(n)], SolveCell::Clue(_)) {
                self.residual[usize::from(n)] += 1;
            }
        }
    }

    /// Residuals are bounded 0..=8 and clues with a passed deadline are
    /// pinned at zero, so this key space is finite.
    fn memo_key(&self, pos: u8, budget: u8) -> (u8, u8, Vec<u8>) {
        let active = self
            .clue_ids
            .iter()
            .filter(|&&clue| self.deadline[usize::from(clue)] >= pos)
            .map(|&clue| self.residual[usize::from(clue)] as u8)
            .collect();
        (pos, budget, active)
    }
}
