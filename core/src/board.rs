use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::num::Saturating;

use ndarray::Array2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use minefray_protocol::HIDDEN_CELL;

use crate::*;

/// Revealed value of an exposed mine.
pub const MINE_VALUE: i8 = -1;

/// Player-visible state of one cell. A revealed value never changes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Hidden,
    Revealed(i8),
}

impl CellState {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

/// Ground-truth mine placement, fixed at game start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mask: Array2<bool>,
}

impl MineLayout {
    /// Unbiased placement of exactly [`MINE_COUNT`] mines: a flat vector of
    /// mine markers is Fisher–Yates shuffled by a seeded [`SmallRng`].
    /// Deterministic given `seed`.
    pub fn random(seed: u64) -> Self {
        use rand::prelude::*;

        let mut flat: Vec<bool> = (0..CELL_COUNT).map(|i| (i as u16) < MINE_COUNT).collect();
        flat.shuffle(&mut SmallRng::seed_from_u64(seed));
        let mask = Array2::from_shape_vec(GRID_DIM, flat).expect("grid shape is fixed");
        let layout = Self { mask };

        // double check mine count
        if layout.mine_count() != MINE_COUNT {
            log::warn!(
                "mine layout count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                MINE_COUNT
            );
        }
        layout
    }

    /// Explicit placement, mainly for crafted scenarios.
    pub fn from_mine_cells(cells: &[CellId]) -> Result<Self> {
        let mut mask: Array2<bool> = Array2::default(GRID_DIM);
        for &cell in cells {
            if usize::from(cell) >= CELL_COUNT {
                return Err(GameError::InvalidCell);
            }
            mask[grid_index(cell)] = true;
        }
        Ok(Self { mask })
    }

    pub fn contains_mine(&self, cell: CellId) -> bool {
        self.mask[grid_index(cell)]
    }

    pub fn mine_count(&self) -> u16 {
        self.mask.iter().filter(|&&mine| mine).count() as u16
    }

    pub fn safe_cell_count(&self) -> u16 {
        CELL_COUNT as u16 - self.mine_count()
    }

    /// [`MINE_VALUE`] for a mine, otherwise the count of mine neighbors
    /// among the up-to-8 adjacent cells.
    pub fn neighbor_value(&self, cell: CellId) -> i8 {
        if self.contains_mine(cell) {
            return MINE_VALUE;
        }
        neighbors(cell).filter(|&n| self.contains_mine(n)).count() as i8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    ExposedMine,
}

/// The authoritative grid: layout plus per-cell revealed state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    layout: MineLayout,
    cells: Array2<CellState>,
    revealed_safe: Saturating<u16>,
}

impl Board {
    pub fn new(layout: MineLayout) -> Self {
        Self {
            layout,
            cells: Array2::default(GRID_DIM),
            revealed_safe: Saturating(0),
        }
    }

    pub fn random(seed: u64) -> Self {
        Self::new(MineLayout::random(seed))
    }

    pub fn state_at(&self, cell: CellId) -> CellState {
        self.cells[grid_index(cell)]
    }

    pub fn has_mine(&self, cell: CellId) -> bool {
        self.layout.contains_mine(cell)
    }

    /// Opens a cell. A no-op on an already revealed cell; a revealed `0`
    /// cascades breadth-first through every still-hidden cell reachable over
    /// zero-valued cells, each revealed exactly once.
    pub fn reveal(&mut self, cell: CellId) -> RevealOutcome {
        if self.state_at(cell).is_revealed() {
            return RevealOutcome::NoChange;
        }
        let value = self.layout.neighbor_value(cell);
        self.cells[grid_index(cell)] = CellState::Revealed(value);
        if value == MINE_VALUE {
            return RevealOutcome::ExposedMine;
        }
        self.revealed_safe += 1;
        if value == 0 {
            self.cascade(cell);
        }
        RevealOutcome::Revealed
    }

    fn cascade(&mut self, origin: CellId) {
        let mut frontier = VecDeque::from([origin]);
        while let Some(cell) = frontier.pop_front() {
            for neighbor in neighbors(cell) {
                if self.state_at(neighbor).is_revealed() {
                    continue;
                }
                // every neighbor of a zero cell is safe
                let value = self.layout.neighbor_value(neighbor);
                debug_assert_ne!(value, MINE_VALUE);
                self.cells[grid_index(neighbor)] = CellState::Revealed(value);
                self.revealed_safe += 1;
                if value == 0 {
                    frontier.push_back(neighbor);
                }
            }
        }
    }

    /// True once every non-mine cell has been revealed.
    pub fn is_complete(&self) -> bool {
        self.revealed_safe == Saturating(self.layout.safe_cell_count())
    }

    /// Mines nobody has exposed yet.
    pub fn hidden_mine_count(&self) -> u16 {
        (0..CELL_COUNT as u8)
            .filter(|&cell| self.has_mine(cell) && !self.state_at(cell).is_revealed())
            .count() as u16
    }

    /// Flat per-cell view handed to the solver.
    pub fn states(&self) -> [CellState; CELL_COUNT] {
        let mut out = [CellState::Hidden; CELL_COUNT];
        for (slot, &state) in out.iter_mut().zip(self.cells.iter()) {
            *slot = state;
        }
        out
    }

    /// Wire encoding used in snapshots.
    pub fn codes(&self) -> Vec<i8> {
        self.cells
            .iter()
            .map(|state| match *state {
                CellState::Hidden => HIDDEN_CELL,
                CellState::Revealed(value) => value,
            })
            .collect()
    }
}
