//! Dense occupancy grid covering the parking lot.

use parking_jam_core::{CarId, CellCoord, LevelLayout, Tile};

use crate::cars::Car;

/// Content of a single lot cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Free parking space.
    Empty,
    /// Fixed obstacle loaded from the level map.
    Obstacle,
    /// Cell covered by the in-lot portion of a car.
    Car(CarId),
}

impl Cell {
    /// Integer tag matching the level map encoding: `0` empty, `-1`
    /// obstacle, car identifier plus one for occupied cells.
    #[must_use]
    pub fn tag(self) -> i64 {
        match self {
            Self::Empty => 0,
            Self::Obstacle => -1,
            Self::Car(car) => i64::from(car.get()) + 1,
        }
    }
}

/// Row-major occupancy array; reads and writes outside the lot are no-ops.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid without cells, used before any level is loaded.
    pub(crate) fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }

    /// Builds a grid holding the static obstacles of the layout.
    pub(crate) fn from_layout(layout: &LevelLayout) -> Self {
        let capacity_u64 = u64::from(layout.width) * u64::from(layout.height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut cells = vec![Cell::Empty; capacity];
        for (slot, tile) in cells.iter_mut().zip(layout.tiles.iter()) {
            if *tile == Tile::Obstacle {
                *slot = Cell::Obstacle;
            }
        }
        Self {
            width: layout.width,
            height: layout.height,
            cells,
        }
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub(crate) fn is_free(&self, cell: CellCoord) -> bool {
        self.get(cell) == Some(Cell::Empty)
    }

    fn set(&mut self, cell: CellCoord, value: Cell) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = value;
            }
        }
    }

    /// Tags every in-lot cell of the car's span with its identifier.
    pub(crate) fn mark_occupied(&mut self, car: &Car) {
        for position in car.span.positions() {
            if let Some(cell) = car.edge.point_at(position).cell(self.width, self.height) {
                self.set(cell, Cell::Car(car.id));
            }
        }
    }

    /// Releases every in-lot cell of the car's span still tagged with its identifier.
    pub(crate) fn clear_occupied(&mut self, car: &Car) {
        for position in car.span.positions() {
            if let Some(cell) = car.edge.point_at(position).cell(self.width, self.height) {
                if self.get(cell) == Some(Cell::Car(car.id)) {
                    self.set(cell, Cell::Empty);
                }
            }
        }
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
