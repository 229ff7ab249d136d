/// Flat row-major cell index on the fixed 8×8 table.
pub type CellId = u8;

/// Cells per side of the table.
pub const BOARD_SIDE: u8 = 8;
/// Total cell count.
pub const CELL_COUNT: usize = 64;
/// Mines placed at game start; fixed for every game.
pub const MINE_COUNT: u16 = 25;
/// Hard capacity of a room, humans and bots combined.
pub const MAX_SEATS: u8 = 8;

pub(crate) const GRID_DIM: (usize, usize) = (8, 8);

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Splits a flat index into `(x, y)` with `x` the row.
pub const fn cell_coords(cell: CellId) -> (u8, u8) {
    (cell / BOARD_SIDE, cell % BOARD_SIDE)
}

/// Inverse of [`cell_coords`].
pub const fn cell_index(x: u8, y: u8) -> CellId {
    x * BOARD_SIDE + y
}

pub(crate) fn grid_index(cell: CellId) -> (usize, usize) {
    let (x, y) = cell_coords(cell);
    (x as usize, y as usize)
}

/// The up-to-eight adjacent cells, clipped at the grid edge.
pub fn neighbors(cell: CellId) -> impl Iterator<Item = CellId> {
    let (x, y) = cell_coords(cell);
    DISPLACEMENTS.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < BOARD_SIDE && ny < BOARD_SIDE).then(|| cell_index(nx, ny))
    })
}
