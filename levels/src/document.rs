use parking_jam_core::{CarDescriptor, Edge, LevelLayout, Tile, MAX_LOT_SIDE};
use serde::Deserialize;
use thiserror::Error;

const UNTITLED: &str = "untitled";

/// Errors that make a whole level document unusable.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The document is not valid TOML or a field has the wrong type.
    #[error("could not parse level document: {0}")]
    Syntax(#[from] toml::de::Error),
    /// A required top-level field is absent.
    #[error("level document is missing `{0}`")]
    MissingField(&'static str),
    /// The lot has no cells.
    #[error("level dimensions must be non-zero, found {width}x{height}")]
    ZeroDimensions {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
    },
    /// The lot is larger than any level may be.
    #[error("level dimensions {width}x{height} exceed the {limit}x{limit} limit")]
    Dimensions {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
        /// Largest supported number of columns or rows.
        limit: u32,
    },
    /// The map does not have one row per lot row.
    #[error("map has {found} rows but the level is {expected} rows high")]
    RowCount {
        /// Declared number of rows.
        expected: u32,
        /// Rows present in the map.
        found: usize,
    },
    /// A map row does not have one tile per lot column.
    #[error("map row {row} has {found} tiles but the level is {expected} columns wide")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Declared number of columns.
        expected: u32,
        /// Tiles present in the row.
        found: usize,
    },
    /// A map tile uses a value other than `0` or `-1`.
    #[error("map tile {value} at column {column}, row {row} is not 0 or -1")]
    UnknownTile {
        /// Zero-based column of the tile.
        column: usize,
        /// Zero-based row of the tile.
        row: usize,
        /// Value found in the map.
        value: i64,
    },
    /// The requested built-in level does not exist.
    #[error("there is no built-in level {number}; levels are numbered 1 to {count}")]
    UnknownLevel {
        /// Requested one-based level number.
        number: usize,
        /// Number of built-in levels.
        count: usize,
    },
}

/// Car entry that was dropped while reading a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedCar {
    /// Position of the entry within the document's `[[cars]]` list.
    pub index: usize,
    /// Human readable explanation.
    pub reason: String,
}

/// Level read from a document together with the car entries it dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLevel {
    /// Layout ready to be handed to the world.
    pub layout: LevelLayout,
    /// Car entries that could not be turned into descriptors.
    pub skipped: Vec<SkippedCar>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    map: Option<Vec<Vec<i64>>>,
    #[serde(default)]
    cars: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawCar {
    lane: String,
    #[serde(default)]
    order: u32,
    length: u32,
    #[serde(default)]
    in_lot: Flag,
}

/// Accepts both `true`/`false` and the `1`/`0` spelling of older level data.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
}

impl Default for Flag {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0,
        }
    }
}

/// Parses a TOML level document.
///
/// Problems with the lot itself fail the whole document. Problems with a
/// single car entry only drop that entry; the world validates the remaining
/// descriptors against the lot when the level is loaded.
pub fn parse(source: &str) -> Result<ParsedLevel, LevelError> {
    let raw: RawDocument = toml::from_str(source)?;
    let width = raw.width.ok_or(LevelError::MissingField("width"))?;
    let height = raw.height.ok_or(LevelError::MissingField("height"))?;
    if width == 0 || height == 0 {
        return Err(LevelError::ZeroDimensions { width, height });
    }
    if width > MAX_LOT_SIDE || height > MAX_LOT_SIDE {
        return Err(LevelError::Dimensions {
            width,
            height,
            limit: MAX_LOT_SIDE,
        });
    }

    let name = raw.name.unwrap_or_else(|| UNTITLED.to_owned());
    let mut layout = LevelLayout::open(name, width, height);
    if let Some(map) = raw.map {
        layout.tiles = read_map(&map, width, height)?;
    }

    let mut skipped = Vec::new();
    for (index, value) in raw.cars.into_iter().enumerate() {
        match read_car(value) {
            Ok(descriptor) => layout.cars.push(descriptor),
            Err(reason) => {
                tracing::warn!(level = %layout.name, index, %reason, "skipping car entry");
                skipped.push(SkippedCar { index, reason });
            }
        }
    }

    Ok(ParsedLevel { layout, skipped })
}

fn read_map(map: &[Vec<i64>], width: u32, height: u32) -> Result<Vec<Tile>, LevelError> {
    if usize::try_from(height).ok() != Some(map.len()) {
        return Err(LevelError::RowCount {
            expected: height,
            found: map.len(),
        });
    }

    let mut tiles = Vec::with_capacity(map.len() * map.first().map_or(0, Vec::len));
    for (row, values) in map.iter().enumerate() {
        if usize::try_from(width).ok() != Some(values.len()) {
            return Err(LevelError::RaggedRow {
                row,
                expected: width,
                found: values.len(),
            });
        }
        for (column, value) in values.iter().enumerate() {
            let tile = Tile::from_tag(*value).ok_or(LevelError::UnknownTile {
                column,
                row,
                value: *value,
            })?;
            tiles.push(tile);
        }
    }
    Ok(tiles)
}

fn read_car(value: toml::Value) -> Result<CarDescriptor, String> {
    let raw: RawCar = value.try_into().map_err(|error| error.to_string())?;
    let edge: Edge = raw.lane.parse().map_err(|error| format!("{error}"))?;
    Ok(CarDescriptor {
        edge,
        order: raw.order,
        length: raw.length,
        in_lot: raw.in_lot.is_set(),
    })
}
