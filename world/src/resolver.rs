//! Movement resolution for a single clicked car.
//!
//! A click first tries to drive the car into the lot. Only when that makes no
//! progress does the car reverse toward its queue side. Outside the lot the
//! grid has no cells, so same-lane cars waiting there are checked through
//! their records instead.

use parking_jam_core::{CarId, CellCoord, Span, Transition};

use crate::{
    cars::{Car, LaneFrame},
    grid::Grid,
};

/// Direction of travel relative to the lot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    /// Toward the far side of the lot.
    Inward,
    /// Back toward the lane's queue side.
    Outward,
}

/// Classification of a resolved click.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementOutcome {
    /// Neither direction offers a free cell.
    CannotMove,
    /// The car ends entirely inside the lot after starting outside of it.
    EntersLot {
        /// Cell reached by the car's leading end.
        stop: CellCoord,
    },
    /// The car repositions without leaving the lot.
    StaysInLot {
        /// Cell reached by the car's leading end.
        stop: CellCoord,
    },
    /// The car was parked and now has at least one cell outside the lot.
    ExitsLot {
        /// Axis position of the leading end after the move.
        head: i32,
    },
    /// The car was not parked before the move and is not parked after it.
    SlidesOutside {
        /// Axis position of the leading end after the move.
        head: i32,
    },
}

/// Fully resolved move of one car.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePlan {
    /// Identifier of the car being moved.
    pub car: CarId,
    /// Direction the car travels in.
    pub heading: Heading,
    /// Span before the move.
    pub from: Span,
    /// Span after the move; equal to `from` when the car cannot move.
    pub to: Span,
    /// Classification of the move.
    pub outcome: MovementOutcome,
}

impl MovePlan {
    /// Parked-state change caused by the move.
    #[must_use]
    pub fn transition(&self) -> Transition {
        match self.outcome {
            MovementOutcome::EntersLot { .. } => Transition::Entered,
            MovementOutcome::ExitsLot { .. } => Transition::Exited,
            _ => Transition::None,
        }
    }

    /// Reports whether the car crossed between parked and not parked.
    #[must_use]
    pub fn crosses_boundary(&self) -> bool {
        self.transition() != Transition::None
    }
}

/// Read-only surroundings used while scanning a lane.
pub(crate) struct Surroundings<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) cars: &'a [Car],
}

impl Surroundings<'_> {
    fn frame(&self, car: &Car) -> LaneFrame {
        let (width, height) = self.grid.dimensions();
        LaneFrame::new(car.edge, width, height)
    }

    /// Reports whether `car` may occupy the axis position of its lane.
    fn is_free(&self, frame: &LaneFrame, car: &Car, position: i32) -> bool {
        if let Some(cell) = frame.cell(position) {
            return self.grid.is_free(cell);
        }
        if !frame.is_queue_position(position) {
            return false;
        }
        !self.cars.iter().any(|other| {
            other.id != car.id && other.edge == car.edge && other.span.contains(position)
        })
    }

    /// Furthest span reachable by driving into the lot, if any.
    pub(crate) fn scan_inward(&self, car: &Car) -> Option<Span> {
        let frame = self.frame(car);
        let mut steps = 0;
        let mut lead = car.span.head();
        while self.is_free(&frame, car, lead + frame.inward()) {
            lead += frame.inward();
            steps += 1;
        }
        (steps > 0).then(|| car.span.shifted(frame.side(), steps))
    }

    /// Furthest span reachable by reversing, stopping once the car clears the lot.
    pub(crate) fn scan_outward(&self, car: &Car) -> Option<Span> {
        let frame = self.frame(car);
        let limit = frame.steps_to_clear(car.span);
        let mut steps: u32 = 0;
        let mut trail = car.span.tail();
        while steps < limit && self.is_free(&frame, car, trail - frame.inward()) {
            trail -= frame.inward();
            steps += 1;
        }
        let steps = i32::try_from(steps).ok()?;
        (steps > 0).then(|| car.span.shifted(frame.side(), -steps))
    }

    /// Evaluates a single direction without falling back to the other one.
    pub(crate) fn probe(&self, car: &Car, heading: Heading) -> MovePlan {
        let target = match heading {
            Heading::Inward => self.scan_inward(car),
            Heading::Outward => self.scan_outward(car),
        };
        self.plan(car, heading, target)
    }

    /// Resolves a click: inward when possible, otherwise outward.
    pub(crate) fn resolve(&self, car: &Car) -> MovePlan {
        let inward = self.probe(car, Heading::Inward);
        if inward.outcome != MovementOutcome::CannotMove {
            return inward;
        }
        self.probe(car, Heading::Outward)
    }

    fn plan(&self, car: &Car, heading: Heading, target: Option<Span>) -> MovePlan {
        let Some(to) = target else {
            return MovePlan {
                car: car.id,
                heading,
                from: car.span,
                to: car.span,
                outcome: MovementOutcome::CannotMove,
            };
        };
        let frame = self.frame(car);
        let now_in = to.is_inside(frame.axis_length());
        let outcome = match (car.in_lot, now_in, frame.cell(to.head())) {
            (false, true, Some(stop)) => MovementOutcome::EntersLot { stop },
            (true, true, Some(stop)) => MovementOutcome::StaysInLot { stop },
            (true, _, _) => MovementOutcome::ExitsLot { head: to.head() },
            (false, _, _) => MovementOutcome::SlidesOutside { head: to.head() },
        };
        MovePlan {
            car: car.id,
            heading,
            from: car.span,
            to,
            outcome,
        }
    }
}
