//! Parked-car bookkeeping that detects a cleared level.

use parking_jam_core::{Event, Transition};

/// Counts cars parked entirely inside the lot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CompletionTracker {
    parked: u32,
    total: u32,
}

impl CompletionTracker {
    pub(crate) fn new(parked: u32, total: u32) -> Self {
        Self {
            parked: parked.min(total),
            total,
        }
    }

    pub(crate) fn parked(&self) -> u32 {
        self.parked
    }

    pub(crate) fn total(&self) -> u32 {
        self.total
    }

    pub(crate) fn is_cleared(&self) -> bool {
        self.total > 0 && self.parked == self.total
    }

    /// Applies one boundary transition, announcing the cleared state when an
    /// entry brings the counter up to the total.
    pub(crate) fn record(&mut self, transition: Transition, out_events: &mut Vec<Event>) {
        match transition {
            Transition::Entered => {
                self.parked = self.parked.saturating_add(1).min(self.total);
            }
            Transition::Exited => {
                self.parked = self.parked.saturating_sub(1);
            }
            Transition::None => return,
        }

        out_events.push(Event::ParkedCountChanged {
            parked: self.parked,
            total: self.total,
        });

        if transition == Transition::Entered && self.is_cleared() {
            tracing::info!(total = self.total, "level cleared");
            out_events.push(Event::LevelCleared { total: self.total });
        }
    }
}
