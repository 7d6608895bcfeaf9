#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Parking Jam engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Level data crosses the boundary as an
//! immutable [`LevelLayout`] snapshot.

use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Discards the current puzzle and builds a fresh one from the layout.
    LoadLevel {
        /// Immutable level snapshot describing the grid and the cars.
        layout: LevelLayout,
    },
    /// Requests that the car be driven as far as its surroundings allow.
    ClickCar {
        /// Identifier of the clicked car.
        car: CarId,
    },
    /// Signals that the presentation finished animating the last move.
    FinishAnimation,
    /// Rebuilds the most recently loaded level from scratch.
    ResetLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a level finished loading.
    LevelLoaded {
        /// Human readable name of the level.
        name: String,
        /// Number of cars that were created.
        cars: u32,
        /// Number of cars that start parked inside the lot.
        parked: u32,
        /// Number of descriptors rejected during construction.
        rejected: u32,
    },
    /// Reports a car descriptor that was dropped while loading a level.
    CarRejected {
        /// Position of the descriptor within the layout's car list.
        index: usize,
        /// Specific reason the descriptor was rejected.
        reason: CarRejection,
    },
    /// Confirms that a car changed position.
    CarMoved {
        /// Identifier of the car that moved.
        car: CarId,
        /// Span the car covered before moving.
        from: Span,
        /// Span the car covers after moving.
        to: Span,
        /// Lot boundary crossing caused by the move, if any.
        transition: Transition,
        /// Indicates whether the car was dragged along by another car's move.
        chained: bool,
    },
    /// Reports that a click did not change the puzzle.
    MoveRejected {
        /// Identifier of the clicked car.
        car: CarId,
        /// Specific reason the click was ignored.
        reason: MoveRejection,
    },
    /// Reports a change of the number of cars parked inside the lot.
    ParkedCountChanged {
        /// Cars currently parked entirely inside the lot.
        parked: u32,
        /// Total number of cars in the level.
        total: u32,
    },
    /// Announces that every car of the level is parked.
    LevelCleared {
        /// Total number of cars in the level.
        total: u32,
    },
    /// Confirms that the animation gate was released.
    AnimationFinished,
    /// Reports a layout the world refused to load; the previous level stays.
    LevelRejected {
        /// Human readable name of the refused level.
        name: String,
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
    },
}

/// Status tag handed to the presentation layer alongside a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// The car ended entirely inside the lot after starting outside of it.
    Entered,
    /// The car left the lot after being entirely inside of it.
    Exited,
    /// The move did not change whether the car counts as parked.
    None,
}

/// Reasons a click may be ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// A previous move is still being animated.
    AnimationInProgress,
    /// Neither direction offers a single free cell.
    Blocked,
    /// No car with the provided identifier exists.
    UnknownCar,
    /// No level has been loaded yet.
    NoLevel,
}

/// Reasons a car descriptor may be rejected at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarRejection {
    /// The lane index lies outside the grid.
    LaneOutOfRange,
    /// The length is zero or longer than the lot along the slide axis.
    InvalidLength,
    /// Another car of the same lane already uses the queue order.
    DuplicateOrder,
    /// A parked car follows a car queued outside the lot.
    ParkedOutOfQueue,
    /// A parked car would overlap an obstacle or another car.
    ParkedCollision,
}

impl fmt::Display for CarRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LaneOutOfRange => write!(f, "lane lies outside the grid"),
            Self::InvalidLength => write!(f, "length does not fit the lot"),
            Self::DuplicateOrder => write!(f, "queue order already taken in lane"),
            Self::ParkedOutOfQueue => write!(f, "parked car queued behind an outside car"),
            Self::ParkedCollision => write!(f, "parked car overlaps an occupied cell"),
        }
    }
}

/// Unique identifier assigned to a car.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CarId(u32);

impl CarId {
    /// Creates a new car identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Side of the lot on which a lane queues its outside cars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Cars wait below the lot and drive up toward row zero.
    Bottom,
    /// Cars wait above the lot and drive down toward the last row.
    Top,
    /// Cars wait left of the lot and drive right toward the last column.
    Left,
    /// Cars wait right of the lot and drive left toward column zero.
    Right,
}

impl Side {
    /// All sides in a stable order.
    pub const ALL: [Side; 4] = [Side::Bottom, Side::Top, Side::Left, Side::Right];

    /// Axis step taken by a car driving into the lot.
    #[must_use]
    pub const fn inward_step(self) -> i32 {
        match self {
            Self::Bottom | Self::Right => -1,
            Self::Top | Self::Left => 1,
        }
    }

    /// Reports whether lanes of this side are grid columns.
    #[must_use]
    pub const fn lanes_are_columns(self) -> bool {
        matches!(self, Self::Bottom | Self::Top)
    }

    /// Number of cells a car can travel along inside a `width` by `height` lot.
    #[must_use]
    pub const fn axis_length(self, width: u32, height: u32) -> u32 {
        if self.lanes_are_columns() {
            height
        } else {
            width
        }
    }

    /// Number of lanes available on this side of a `width` by `height` lot.
    #[must_use]
    pub const fn lane_count(self, width: u32, height: u32) -> u32 {
        if self.lanes_are_columns() {
            width
        } else {
            height
        }
    }

    /// First axis position outside the lot on this side.
    #[must_use]
    pub const fn entry_position(self, axis_length: u32) -> i32 {
        match self {
            Self::Bottom | Self::Right => axis_length as i32,
            Self::Top | Self::Left => -1,
        }
    }

    /// Letter used by lane codes in level data.
    ///
    /// `U` names cars facing up, which queue on the bottom side.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Bottom => 'U',
            Self::Top => 'D',
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }

    /// Parses a lane code letter.
    #[must_use]
    pub const fn from_code(letter: char) -> Option<Self> {
        match letter {
            'U' | 'u' => Some(Self::Bottom),
            'D' | 'd' => Some(Self::Top),
            'L' | 'l' => Some(Self::Left),
            'R' | 'r' => Some(Self::Right),
            _ => None,
        }
    }
}

/// A single lane of one side of the lot: the axis and fixed coordinate a car slides along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    side: Side,
    lane: u32,
}

impl Edge {
    /// Creates a new edge descriptor.
    #[must_use]
    pub const fn new(side: Side, lane: u32) -> Self {
        Self { side, lane }
    }

    /// Side of the lot the lane queues on.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Column index for vertical lanes, row index for horizontal lanes.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Board point located at the provided axis position of this lane.
    #[must_use]
    pub const fn point_at(&self, position: i32) -> BoardPoint {
        if self.side.lanes_are_columns() {
            BoardPoint::new(self.lane as i32, position)
        } else {
            BoardPoint::new(position, self.lane as i32)
        }
    }

    /// Axis position of the board point if it lies on this lane.
    #[must_use]
    pub fn position_of(&self, point: BoardPoint) -> Option<i32> {
        let lane = i32::try_from(self.lane).ok()?;
        if self.side.lanes_are_columns() {
            (point.column() == lane).then_some(point.row())
        } else {
            (point.row() == lane).then_some(point.column())
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.side.code(), self.lane)
    }
}

impl FromStr for Edge {
    type Err = EdgeCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .ok_or_else(|| EdgeCodeError(trimmed.to_owned()))?;
        let side = Side::from_code(letter).ok_or_else(|| EdgeCodeError(trimmed.to_owned()))?;
        let lane = chars
            .as_str()
            .parse::<u32>()
            .map_err(|_| EdgeCodeError(trimmed.to_owned()))?;
        Ok(Self::new(side, lane))
    }
}

/// Error produced when a lane code such as `U0` cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeCodeError(String);

impl fmt::Display for EdgeCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a lane code", self.0)
    }
}

impl Error for EdgeCodeError {}

/// Cells covered by a car along its lane, measured in signed axis positions.
///
/// `head` is the end that leads when the car drives into the lot. Positions
/// outside `0..axis_length` describe the part of the car waiting outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    head: i32,
    tail: i32,
}

impl Span {
    /// Creates a span from explicit end positions.
    #[must_use]
    pub const fn new(head: i32, tail: i32) -> Self {
        Self { head, tail }
    }

    /// Builds the span of a car of `length` cells whose leading end sits at `head`.
    #[must_use]
    pub const fn from_head(side: Side, head: i32, length: u32) -> Self {
        let tail = head - side.inward_step() * (length as i32 - 1);
        Self { head, tail }
    }

    /// Leading end position.
    #[must_use]
    pub const fn head(&self) -> i32 {
        self.head
    }

    /// Trailing end position.
    #[must_use]
    pub const fn tail(&self) -> i32 {
        self.tail
    }

    /// Number of cells covered by the span.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.head.abs_diff(self.tail) + 1
    }

    /// Reports whether the axis position lies within the span.
    #[must_use]
    pub fn contains(&self, position: i32) -> bool {
        self.head.min(self.tail) <= position && position <= self.head.max(self.tail)
    }

    /// Iterates over the covered positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = i32> {
        self.head.min(self.tail)..=self.head.max(self.tail)
    }

    /// Reports whether every covered position lies within `0..axis_length`.
    #[must_use]
    pub fn is_inside(&self, axis_length: u32) -> bool {
        let limit = i64::from(axis_length);
        let low = i64::from(self.head.min(self.tail));
        let high = i64::from(self.head.max(self.tail));
        low >= 0 && high < limit
    }

    /// Reports whether no covered position lies within `0..axis_length`.
    #[must_use]
    pub fn is_outside(&self, axis_length: u32) -> bool {
        !self.positions().any(|position| within(position, axis_length))
    }

    /// Returns the span moved by `steps` cells in the inward direction of `side`.
    #[must_use]
    pub const fn shifted(&self, side: Side, steps: i32) -> Self {
        let delta = side.inward_step() * steps;
        Self {
            head: self.head + delta,
            tail: self.tail + delta,
        }
    }
}

/// Reports whether the axis position addresses a cell of the lot.
#[must_use]
pub fn within(position: i32, axis_length: u32) -> bool {
    position >= 0 && i64::from(position) < i64::from(axis_length)
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Signed board location that may lie outside the lot, where cars queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardPoint {
    column: i32,
    row: i32,
}

impl BoardPoint {
    /// Creates a new board point.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column of the point; negative values lie left of the lot.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row of the point; negative values lie above the lot.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Converts the point into a grid cell when it lies inside a `width` by `height` lot.
    #[must_use]
    pub fn cell(&self, width: u32, height: u32) -> Option<CellCoord> {
        if within(self.column, width) && within(self.row, height) {
            Some(CellCoord::new(
                self.column.unsigned_abs(),
                self.row.unsigned_abs(),
            ))
        } else {
            None
        }
    }
}

impl From<CellCoord> for BoardPoint {
    fn from(cell: CellCoord) -> Self {
        Self::new(cell.column() as i32, cell.row() as i32)
    }
}

/// Static content of a lot cell in level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Free parking space.
    Empty,
    /// Fixed obstacle that never changes during play.
    Obstacle,
}

impl Tile {
    /// Converts the numeric tag used by level maps.
    #[must_use]
    pub const fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            0 => Some(Self::Empty),
            -1 => Some(Self::Obstacle),
            _ => None,
        }
    }

    /// Numeric tag used by level maps.
    #[must_use]
    pub const fn tag(self) -> i64 {
        match self {
            Self::Empty => 0,
            Self::Obstacle => -1,
        }
    }
}

/// Level data describing one car before the world builds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarDescriptor {
    /// Lane the car belongs to.
    pub edge: Edge,
    /// Position in the lane's queue; zero waits closest to the lot.
    pub order: u32,
    /// Number of cells the car covers.
    pub length: u32,
    /// Indicates whether the car starts parked inside the lot.
    pub in_lot: bool,
}

impl CarDescriptor {
    /// Describes a car waiting outside the lot.
    #[must_use]
    pub const fn outside(edge: Edge, order: u32, length: u32) -> Self {
        Self {
            edge,
            order,
            length,
            in_lot: false,
        }
    }

    /// Describes a car that starts parked inside the lot.
    #[must_use]
    pub const fn parked(edge: Edge, order: u32, length: u32) -> Self {
        Self {
            edge,
            order,
            length,
            in_lot: true,
        }
    }
}

/// Largest number of columns or rows a lot may have.
pub const MAX_LOT_SIDE: u32 = 256;

/// Immutable snapshot of a level: the lot layout and the cars around it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Human readable name of the level.
    pub name: String,
    /// Number of columns in the lot.
    pub width: u32,
    /// Number of rows in the lot.
    pub height: u32,
    /// Row-major tiles, `width * height` entries with row zero at the top.
    pub tiles: Vec<Tile>,
    /// Cars in authoring order.
    pub cars: Vec<CarDescriptor>,
}

impl LevelLayout {
    /// Creates a layout of the provided size with every tile empty and no cars.
    ///
    /// Oversized dimensions produce a layout without tiles, which
    /// [`LevelLayout::has_supported_size`] reports as unsupported.
    #[must_use]
    pub fn open(name: impl Into<String>, width: u32, height: u32) -> Self {
        let capacity = if width <= MAX_LOT_SIDE && height <= MAX_LOT_SIDE {
            usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0)
        } else {
            0
        };
        Self {
            name: name.into(),
            width,
            height,
            tiles: vec![Tile::Empty; capacity],
            cars: Vec::new(),
        }
    }

    /// Reports whether both dimensions lie within `1..=MAX_LOT_SIDE` and the
    /// tile list covers the lot exactly.
    #[must_use]
    pub fn has_supported_size(&self) -> bool {
        let side = 1..=MAX_LOT_SIDE;
        side.contains(&self.width)
            && side.contains(&self.height)
            && u64::try_from(self.tiles.len()).ok()
                == Some(u64::from(self.width) * u64::from(self.height))
    }

    /// Returns the layout with an obstacle placed at the provided cell.
    #[must_use]
    pub fn with_obstacle(mut self, cell: CellCoord) -> Self {
        if let Some(index) = self.index(cell) {
            if let Some(tile) = self.tiles.get_mut(index) {
                *tile = Tile::Obstacle;
            }
        }
        self
    }

    /// Returns the layout with the car appended to the car list.
    #[must_use]
    pub fn with_car(mut self, car: CarDescriptor) -> Self {
        self.cars.push(car);
        self
    }

    /// Tile stored at the provided cell, if the cell lies inside the lot.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
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
