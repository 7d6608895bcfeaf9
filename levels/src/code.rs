use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use parking_jam_core::{CarDescriptor, LevelLayout, Tile, MAX_LOT_SIDE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CODE_DOMAIN: &str = "parking";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub const CODE_HEADER: &str = "parking:v1";
/// Delimiter used to separate the prefix, lot dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding level codes.
#[derive(Debug, Error)]
pub enum LevelCodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("level code was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the code.
    #[error("level code is missing the prefix")]
    MissingPrefix,
    /// The code did not contain a version segment.
    #[error("level code is missing the version")]
    MissingVersion,
    /// The code did not include lot dimensions.
    #[error("level code is missing the lot dimensions")]
    MissingDimensions,
    /// The code did not include the payload segment.
    #[error("level code is missing the payload")]
    MissingPayload,
    /// The code used an unexpected prefix segment.
    #[error("level code prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    #[error("level code version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The lot dimensions could not be parsed from the code.
    #[error("could not parse lot dimensions '{0}'")]
    InvalidDimensions(String),
    /// The tile list does not cover the lot.
    #[error("level code carries {found} tiles for a {width}x{height} lot")]
    TileCount {
        /// Columns declared in the header.
        width: u32,
        /// Rows declared in the header.
        height: u32,
        /// Tiles present in the payload.
        found: usize,
    },
    /// A tile tag is neither `0` nor `-1`.
    #[error("level code contains unknown tile {0}")]
    UnknownTile(i64),
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not process level payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    name: String,
    tiles: Vec<i64>,
    cars: Vec<CarDescriptor>,
}

/// Encodes the layout into a single-line string suitable for sharing.
pub fn encode(layout: &LevelLayout) -> Result<String, LevelCodeError> {
    let payload = Payload {
        name: layout.name.clone(),
        tiles: layout.tiles.iter().map(|tile| tile.tag()).collect(),
        cars: layout.cars.clone(),
    };
    let json = serde_json::to_vec(&payload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{CODE_HEADER}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{encoded}",
        layout.width, layout.height
    ))
}

/// Decodes a layout from a level code.
pub fn decode(value: &str) -> Result<LevelLayout, LevelCodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelCodeError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelCodeError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelCodeError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelCodeError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelCodeError::MissingPayload)?;

    if domain != CODE_DOMAIN {
        return Err(LevelCodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(LevelCodeError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
    let decoded: Payload = serde_json::from_slice(&bytes)?;

    let expected = u64::from(width) * u64::from(height);
    if u64::try_from(decoded.tiles.len()).ok() != Some(expected) {
        return Err(LevelCodeError::TileCount {
            width,
            height,
            found: decoded.tiles.len(),
        });
    }

    let tiles = decoded
        .tiles
        .iter()
        .map(|tag| Tile::from_tag(*tag).ok_or(LevelCodeError::UnknownTile(*tag)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LevelLayout {
        name: decoded.name,
        width,
        height,
        tiles,
        cars: decoded.cars,
    })
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelCodeError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;

    let side = 1..=MAX_LOT_SIDE;
    if !side.contains(&width) || !side.contains(&height) {
        return Err(LevelCodeError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((width, height))
}
