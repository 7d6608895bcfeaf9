//! Car records, lane geometry and level-load construction.

use std::collections::{BTreeMap, HashSet};

use parking_jam_core::{
    within, CarDescriptor, CarId, CarRejection, CellCoord, Edge, LevelLayout, Side, Span,
};

use crate::grid::Grid;

/// Mutable per-car state owned by the world.
#[derive(Clone, Debug)]
pub(crate) struct Car {
    /// Identifier allocated in descriptor order.
    pub(crate) id: CarId,
    /// Lane the car slides along.
    pub(crate) edge: Edge,
    /// Queue order within the lane.
    pub(crate) order: u32,
    /// Declared length in cells.
    pub(crate) length: u32,
    /// Current head and tail positions.
    pub(crate) span: Span,
    /// Cached flag: the whole span lies inside the lot.
    pub(crate) in_lot: bool,
}

/// Geometry of one lane inside a lot of known size.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LaneFrame {
    edge: Edge,
    width: u32,
    height: u32,
}

impl LaneFrame {
    pub(crate) fn new(edge: Edge, width: u32, height: u32) -> Self {
        Self {
            edge,
            width,
            height,
        }
    }

    pub(crate) fn side(&self) -> Side {
        self.edge.side()
    }

    pub(crate) fn inward(&self) -> i32 {
        self.edge.side().inward_step()
    }

    pub(crate) fn axis_length(&self) -> u32 {
        self.side().axis_length(self.width, self.height)
    }

    /// First position outside the lot on the lane's queue side.
    pub(crate) fn entry(&self) -> i32 {
        self.side().entry_position(self.axis_length())
    }

    /// Lot cell at the axis position, if the position lies inside the lot.
    pub(crate) fn cell(&self, position: i32) -> Option<CellCoord> {
        self.edge.point_at(position).cell(self.width, self.height)
    }

    /// Distance from the lot measured outward; larger is further out.
    pub(crate) fn outward_rank(&self, position: i32) -> i64 {
        -i64::from(self.inward()) * i64::from(position)
    }

    /// Reports whether the position lies in the queue region outside the lot.
    pub(crate) fn is_queue_position(&self, position: i32) -> bool {
        !within(position, self.axis_length())
            && self.outward_rank(position) >= self.outward_rank(self.entry())
    }

    /// Cells the car still has to travel outward until it clears the lot.
    pub(crate) fn steps_to_clear(&self, span: Span) -> u32 {
        let remaining = self.outward_rank(self.entry()) - self.outward_rank(span.head());
        u32::try_from(remaining.max(0)).unwrap_or(u32::MAX)
    }
}

/// Outcome of turning a layout's descriptors into cars.
#[derive(Debug, Default)]
pub(crate) struct Construction {
    pub(crate) cars: Vec<Car>,
    pub(crate) rejected: Vec<(usize, CarRejection)>,
}

/// Validates the layout's descriptors and places every accepted car.
///
/// Lanes are packed from the lot boundary outward in ascending queue order.
/// Parked cars must lead their lane and end flush with the boundary; every
/// following car sits exactly one cell beyond its predecessor's tail.
pub(crate) fn construct(layout: &LevelLayout, grid: &Grid) -> Construction {
    let mut construction = Construction::default();
    let mut lanes: BTreeMap<Edge, Vec<(usize, CarDescriptor)>> = BTreeMap::new();

    for (index, descriptor) in layout.cars.iter().copied().enumerate() {
        match validate(&descriptor, layout.width, layout.height) {
            Ok(()) => lanes.entry(descriptor.edge).or_default().push((index, descriptor)),
            Err(reason) => construction.rejected.push((index, reason)),
        }
    }

    let mut occupied: HashSet<CellCoord> = HashSet::new();
    let mut placed: Vec<(usize, CarDescriptor, Span)> = Vec::new();

    for (edge, mut queue) in lanes {
        queue.sort_by_key(|(index, descriptor)| (descriptor.order, *index));
        let frame = LaneFrame::new(edge, layout.width, layout.height);

        let mut accepted: Vec<(usize, CarDescriptor)> = Vec::with_capacity(queue.len());
        let mut seen_outside = false;
        for (index, descriptor) in queue {
            if accepted
                .last()
                .is_some_and(|(_, previous)| previous.order == descriptor.order)
            {
                construction
                    .rejected
                    .push((index, CarRejection::DuplicateOrder));
                continue;
            }
            if descriptor.in_lot && seen_outside {
                construction
                    .rejected
                    .push((index, CarRejection::ParkedOutOfQueue));
                continue;
            }
            seen_outside |= !descriptor.in_lot;
            accepted.push((index, descriptor));
        }

        loop {
            let spans = pack_lane(&frame, &accepted);
            let collision = accepted
                .iter()
                .zip(spans.iter())
                .position(|((_, descriptor), span)| {
                    descriptor.in_lot && !parked_span_fits(&frame, *span, grid, &occupied)
                });
            match collision {
                Some(position) => {
                    let (index, _) = accepted.remove(position);
                    construction
                        .rejected
                        .push((index, CarRejection::ParkedCollision));
                }
                None => {
                    for ((index, descriptor), span) in accepted.iter().zip(spans) {
                        if descriptor.in_lot {
                            occupied.extend(span.positions().filter_map(|p| frame.cell(p)));
                        }
                        placed.push((*index, *descriptor, span));
                    }
                    break;
                }
            }
        }
    }

    placed.sort_by_key(|(index, _, _)| *index);
    construction.cars = placed
        .into_iter()
        .enumerate()
        .map(|(position, (_, descriptor, span))| Car {
            id: CarId::new(u32::try_from(position).unwrap_or(u32::MAX)),
            edge: descriptor.edge,
            order: descriptor.order,
            length: descriptor.length,
            span,
            in_lot: descriptor.in_lot,
        })
        .collect();
    construction.rejected.sort_by_key(|(index, _)| *index);
    construction
}

fn validate(descriptor: &CarDescriptor, width: u32, height: u32) -> Result<(), CarRejection> {
    let side = descriptor.edge.side();
    if descriptor.edge.lane() >= side.lane_count(width, height) {
        return Err(CarRejection::LaneOutOfRange);
    }
    if descriptor.length == 0 || descriptor.length > side.axis_length(width, height) {
        return Err(CarRejection::InvalidLength);
    }
    Ok(())
}

fn pack_lane(frame: &LaneFrame, queue: &[(usize, CarDescriptor)]) -> Vec<Span> {
    let parked_cells: i64 = queue
        .iter()
        .filter(|(_, descriptor)| descriptor.in_lot)
        .map(|(_, descriptor)| i64::from(descriptor.length))
        .sum();
    let first_head = i64::from(frame.entry()) + i64::from(frame.inward()) * parked_cells;
    let mut head = i32::try_from(first_head).unwrap_or(frame.entry());

    let mut spans = Vec::with_capacity(queue.len());
    for (_, descriptor) in queue {
        let span = Span::from_head(frame.side(), head, descriptor.length);
        spans.push(span);
        head = span.tail() - frame.inward();
    }
    spans
}

fn parked_span_fits(
    frame: &LaneFrame,
    span: Span,
    grid: &Grid,
    occupied: &HashSet<CellCoord>,
) -> bool {
    span.is_inside(frame.axis_length())
        && span.positions().all(|position| {
            frame
                .cell(position)
                .is_some_and(|cell| grid.is_free(cell) && !occupied.contains(&cell))
        })
}
