//! ASCII rendering of the lot and the queues around it.

use std::{collections::HashMap, fmt::Write as _, iter};

use parking_jam_core::{BoardPoint, CarId};
use parking_jam_world::{query, Cell, World};

const CAR_GLYPHS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const OBSTACLE: char = '#';
const FREE: char = '.';

/// Letter used to draw the car on the board.
pub(crate) fn glyph(car: CarId) -> char {
    let index = usize::try_from(car.get()).unwrap_or(0) % CAR_GLYPHS.len();
    CAR_GLYPHS.get(index).map_or('?', |byte| char::from(*byte))
}

/// Draws the lot with row labels on the left; queued cars appear around it.
pub(crate) fn render(world: &World) -> String {
    let grid = query::grid_view(world);
    let (width, height) = grid.dimensions();

    let mut outside: HashMap<BoardPoint, char> = HashMap::new();
    for car in query::cars(world) {
        for position in car.span.positions() {
            let _ = outside.insert(car.edge.point_at(position), glyph(car.id));
        }
    }

    let last_column = i32::try_from(width).unwrap_or(i32::MAX) - 1;
    let last_row = i32::try_from(height).unwrap_or(i32::MAX) - 1;
    let columns = outside.keys().map(BoardPoint::column);
    let rows = outside.keys().map(BoardPoint::row);
    let min_column = columns.clone().chain(iter::once(0)).min().unwrap_or(0);
    let max_column = columns.chain(iter::once(last_column)).max().unwrap_or(0);
    let min_row = rows.clone().chain(iter::once(0)).min().unwrap_or(0);
    let max_row = rows.chain(iter::once(last_row)).max().unwrap_or(0);

    let mut board = String::new();
    for row in min_row..=max_row {
        let _ = write!(board, "{row:>3} ");
        for column in min_column..=max_column {
            let point = BoardPoint::new(column, row);
            let symbol = match point.cell(width, height) {
                Some(cell) => match grid.cell(cell) {
                    Some(Cell::Obstacle) => OBSTACLE,
                    Some(Cell::Car(car)) => glyph(car),
                    _ => FREE,
                },
                None => outside.get(&point).copied().unwrap_or(' '),
            };
            board.push(symbol);
        }
        let trimmed = board.trim_end_matches(' ').len();
        board.truncate(trimmed);
        board.push('\n');
    }
    let _ = writeln!(
        board,
        "parked {}/{}",
        query::parked_count(world),
        query::total_cars(world)
    );
    board
}
