#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level data for Parking Jam.
//!
//! Levels are authored as TOML documents. The crate ships the built-in
//! catalogue and converts layouts to and from compact shareable codes.

mod code;
mod document;

use parking_jam_core::LevelLayout;

pub use code::{decode, encode, LevelCodeError, CODE_HEADER};
pub use document::{parse, LevelError, ParsedLevel, SkippedCar};

const BUILTIN: [&str; 6] = [
    include_str!("../data/level1.toml"),
    include_str!("../data/level2.toml"),
    include_str!("../data/level3.toml"),
    include_str!("../data/level4.toml"),
    include_str!("../data/level5.toml"),
    include_str!("../data/level6.toml"),
];

/// Number of built-in levels.
#[must_use]
pub const fn count() -> usize {
    BUILTIN.len()
}

/// Loads the built-in level with the provided one-based number.
pub fn builtin(number: usize) -> Result<LevelLayout, LevelError> {
    let source = number
        .checked_sub(1)
        .and_then(|index| BUILTIN.get(index))
        .ok_or(LevelError::UnknownLevel {
            number,
            count: count(),
        })?;
    Ok(parse(source)?.layout)
}

/// Loads every built-in level in play order.
pub fn catalogue() -> Result<Vec<LevelLayout>, LevelError> {
    (1..=count()).map(builtin).collect()
}
