//! Chained repositioning of cars queued behind a mover.

use parking_jam_core::{CarId, Span, Transition};

use crate::{
    cars::{Car, LaneFrame},
    grid::Grid,
};

/// Change applied to one dragged car.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChainStep {
    pub(crate) car: CarId,
    pub(crate) from: Span,
    pub(crate) to: Span,
    pub(crate) transition: Transition,
}

/// Drags same-lane cars with a higher queue order up behind the mover.
///
/// Only cars waiting entirely outside the lot take part. Each one is placed
/// one cell beyond the outward-most car still ahead of it, but never closer
/// than the lane's entry position, so a dragged car cannot enter the lot.
pub(crate) fn propagate(cars: &mut [Car], grid: &mut Grid, mover: usize) -> Vec<ChainStep> {
    let Some(leader) = cars.get(mover) else {
        return Vec::new();
    };
    let (width, height) = grid.dimensions();
    let frame = LaneFrame::new(leader.edge, width, height);
    let axis_length = frame.axis_length();
    let (edge, order) = (leader.edge, leader.order);

    let mut followers: Vec<usize> = cars
        .iter()
        .enumerate()
        .filter(|(_, car)| {
            car.edge == edge && car.order > order && car.span.is_outside(axis_length)
        })
        .map(|(index, _)| index)
        .collect();
    followers.sort_by_key(|index| cars[*index].order);

    let mut steps = Vec::new();
    for index in followers {
        let current = cars[index].span;
        let anchor = cars
            .iter()
            .enumerate()
            .filter(|(other, car)| *other != index && car.edge == edge)
            .filter(|(_, car)| is_ahead(&frame, car.span, current))
            .map(|(_, car)| car.span.tail() - frame.inward())
            .fold(frame.entry(), |furthest, candidate| {
                if frame.outward_rank(candidate) > frame.outward_rank(furthest) {
                    candidate
                } else {
                    furthest
                }
            });

        let target = Span::from_head(frame.side(), anchor, cars[index].length);
        if target == current {
            continue;
        }

        let car = &mut cars[index];
        grid.clear_occupied(car);
        car.span = target;
        grid.mark_occupied(car);

        let now_in = target.is_inside(axis_length);
        let transition = match (car.in_lot, now_in) {
            (true, false) => {
                car.in_lot = false;
                Transition::Exited
            }
            _ => Transition::None,
        };

        steps.push(ChainStep {
            car: car.id,
            from: current,
            to: target,
            transition,
        });
    }
    steps
}

/// A car bounds a follower when its front lies closer to the lot than the
/// follower's rear.
fn is_ahead(frame: &LaneFrame, span: Span, follower: Span) -> bool {
    frame.outward_rank(span.head()) < frame.outward_rank(follower.tail())
}
