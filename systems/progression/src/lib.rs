#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level progression system: tracks the current and best level and decides
//! which level the world loads next.

use anyhow::{Context, Result};
use parking_jam_core::{Command, Event, LevelLayout};
use serde::{Deserialize, Serialize};

/// Persistent progress of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// One-based number of the level being played.
    pub current_level: usize,
    /// Highest level cleared so far; zero before the first clear.
    pub max_level: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_level: 1,
            max_level: 0,
        }
    }
}

impl Progress {
    /// Reports whether level `number` may be selected directly.
    #[must_use]
    pub fn is_unlocked(&self, number: usize) -> bool {
        number >= 1 && number <= self.max_level.saturating_add(1)
    }
}

/// Storage backend for progress, supplied by the adapter.
pub trait ProgressStore {
    /// Reads the stored progress, `None` when nothing was saved yet.
    fn load(&mut self) -> Result<Option<Progress>>;

    /// Persists the provided progress.
    fn save(&mut self, progress: &Progress) -> Result<()>;
}

/// In-memory store, useful for tests and throwaway sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Option<Progress>,
    saves: usize,
}

impl MemoryStore {
    /// Creates a store that already holds the provided progress.
    #[must_use]
    pub fn with_progress(progress: Progress) -> Self {
        Self {
            saved: Some(progress),
            saves: 0,
        }
    }

    /// Last saved progress.
    #[must_use]
    pub fn saved(&self) -> Option<Progress> {
        self.saved
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Progress>> {
        Ok(self.saved)
    }

    fn save(&mut self, progress: &Progress) -> Result<()> {
        self.saved = Some(*progress);
        self.saves += 1;
        Ok(())
    }
}

/// Player requests that change the level being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressInput {
    /// Advance to the following level, wrapping after the last one.
    NextLevel,
    /// Rebuild the current level.
    Restart,
    /// Jump to a specific one-based level number.
    Select(usize),
}

/// Pure system that reacts to level clears and player requests.
#[derive(Debug)]
pub struct Progression<S> {
    store: S,
    progress: Progress,
}

impl<S: ProgressStore> Progression<S> {
    /// Loads progress from the store, creating a default save when empty.
    pub fn new(mut store: S) -> Result<Self> {
        let progress = match store.load().context("failed to load progress")? {
            Some(progress) => progress,
            None => {
                let progress = Progress::default();
                store
                    .save(&progress)
                    .context("failed to create default progress")?;
                progress
            }
        };
        Ok(Self { store, progress })
    }

    /// Current progress snapshot.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Borrow of the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Emits the command that loads the current level.
    pub fn start(&mut self, catalogue: &[LevelLayout], out: &mut Vec<Command>) -> Result<()> {
        let number = if (1..=catalogue.len()).contains(&self.progress.current_level) {
            self.progress.current_level
        } else {
            1
        };
        self.enter(number, catalogue, out)
    }

    /// Consumes world events and an optional player request.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: Option<ProgressInput>,
        catalogue: &[LevelLayout],
        out: &mut Vec<Command>,
    ) -> Result<()> {
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelCleared { .. }))
        {
            self.record_clear()?;
        }

        match input {
            None => Ok(()),
            Some(ProgressInput::Restart) => {
                out.push(Command::ResetLevel);
                Ok(())
            }
            Some(ProgressInput::NextLevel) => {
                let next = self.progress.current_level.saturating_add(1);
                let next = if next > catalogue.len() { 1 } else { next };
                self.enter(next, catalogue, out)
            }
            Some(ProgressInput::Select(number)) => {
                if number > catalogue.len() || !self.progress.is_unlocked(number) {
                    tracing::warn!(
                        number,
                        max_level = self.progress.max_level,
                        "level is not available"
                    );
                    return Ok(());
                }
                self.enter(number, catalogue, out)
            }
        }
    }

    fn record_clear(&mut self) -> Result<()> {
        if self.progress.current_level <= self.progress.max_level {
            return Ok(());
        }
        self.progress.max_level = self.progress.current_level;
        tracing::info!(max_level = self.progress.max_level, "progress advanced");
        self.persist()
    }

    fn enter(
        &mut self,
        number: usize,
        catalogue: &[LevelLayout],
        out: &mut Vec<Command>,
    ) -> Result<()> {
        let Some(layout) = number.checked_sub(1).and_then(|index| catalogue.get(index)) else {
            tracing::warn!(number, "catalogue has no such level");
            return Ok(());
        };
        if self.progress.current_level != number {
            self.progress.current_level = number;
            self.persist()?;
        }
        out.push(Command::LoadLevel {
            layout: layout.clone(),
        });
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.store
            .save(&self.progress)
            .context("failed to save progress")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue(levels: usize) -> Vec<LevelLayout> {
        (1..=levels)
            .map(|number| LevelLayout::open(format!("Level {number}"), 3, 3))
            .collect()
    }

    fn loaded_name(out: &[Command]) -> Option<&str> {
        out.iter().find_map(|command| match command {
            Command::LoadLevel { layout } => Some(layout.name.as_str()),
            _ => None,
        })
    }

    #[test]
    fn empty_store_receives_a_default_save() {
        let progression = Progression::new(MemoryStore::default()).expect("progress loads");

        assert_eq!(progression.progress(), Progress::default());
        assert_eq!(progression.store().saved(), Some(Progress::default()));
    }

    #[test]
    fn clearing_raises_max_level_once() {
        let mut progression = Progression::new(MemoryStore::default()).expect("progress loads");
        let mut out = Vec::new();
        let cleared = [Event::LevelCleared { total: 3 }];

        progression
            .handle(&cleared, None, &catalogue(3), &mut out)
            .expect("handle succeeds");
        progression
            .handle(&cleared, None, &catalogue(3), &mut out)
            .expect("handle succeeds");

        assert_eq!(progression.progress().max_level, 1);
        assert_eq!(progression.store().saves(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn next_level_wraps_after_the_last() {
        let store = MemoryStore::with_progress(Progress {
            current_level: 3,
            max_level: 3,
        });
        let mut progression = Progression::new(store).expect("progress loads");
        let mut out = Vec::new();

        progression
            .handle(&[], Some(ProgressInput::NextLevel), &catalogue(3), &mut out)
            .expect("handle succeeds");

        assert_eq!(loaded_name(&out), Some("Level 1"));
        assert_eq!(progression.progress().current_level, 1);
        assert_eq!(progression.progress().max_level, 3);
    }

    #[test]
    fn locked_levels_cannot_be_selected() {
        let mut progression = Progression::new(MemoryStore::default()).expect("progress loads");
        let mut out = Vec::new();

        progression
            .handle(&[], Some(ProgressInput::Select(3)), &catalogue(5), &mut out)
            .expect("handle succeeds");
        assert!(out.is_empty());

        progression
            .handle(&[], Some(ProgressInput::Select(1)), &catalogue(5), &mut out)
            .expect("handle succeeds");
        assert_eq!(loaded_name(&out), Some("Level 1"));
    }

    #[test]
    fn restart_resets_the_world() {
        let mut progression = Progression::new(MemoryStore::default()).expect("progress loads");
        let mut out = Vec::new();

        progression
            .handle(&[], Some(ProgressInput::Restart), &catalogue(2), &mut out)
            .expect("handle succeeds");

        assert_eq!(out, vec![Command::ResetLevel]);
    }

    #[test]
    fn progress_survives_json() {
        let progress = Progress {
            current_level: 4,
            max_level: 5,
        };
        let json = serde_json::to_string(&progress).expect("serialize");
        let restored: Progress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, progress);
    }
}
