#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns pointer clicks into car commands.

use parking_jam_core::{BoardPoint, CarId, Command, Event};

/// Maps clicked board points to `ClickCar` commands.
///
/// The system mirrors the world's animation gate from the event stream so
/// that clicks landing mid-animation are dropped before they reach the world.
#[derive(Debug, Default)]
pub struct Input {
    animating: bool,
}

impl Input {
    /// Consumes world events and the latest click to emit commands.
    ///
    /// `car_at` resolves a board point to the car covering it, including
    /// cars queued outside the lot.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        click: Option<BoardPoint>,
        car_at: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(BoardPoint) -> Option<CarId>,
    {
        for event in events {
            match event {
                Event::CarMoved { .. } => self.animating = true,
                Event::AnimationFinished | Event::LevelLoaded { .. } => self.animating = false,
                _ => {}
            }
        }

        let Some(point) = click else {
            return;
        };
        if self.animating {
            tracing::debug!(?point, "click ignored while a move is animating");
            return;
        }
        if let Some(car) = car_at(point) {
            out.push(Command::ClickCar { car });
        }
    }

    /// Reports whether a move animation is believed to be running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animating
    }
}
