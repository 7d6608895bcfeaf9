#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative puzzle state management for Parking Jam.
//!
//! The world owns the occupancy grid and every car record. Each command is
//! resolved synchronously: by the time [`apply`] returns, the logical state is
//! final and the emitted events describe what the presentation layer should
//! animate.

mod cars;
mod chain;
mod completion;
mod grid;
mod resolver;

use parking_jam_core::{CarId, Command, Event, LevelLayout, MoveRejection, Transition};

use cars::{construct, Car};
use completion::CompletionTracker;
use grid::Grid;
use resolver::Surroundings;

pub use grid::Cell;
pub use resolver::{Heading, MovePlan, MovementOutcome};

/// Represents the authoritative Parking Jam world state.
#[derive(Debug)]
pub struct World {
    layout: Option<LevelLayout>,
    grid: Grid,
    cars: Vec<Car>,
    tracker: CompletionTracker,
    animating: bool,
}

impl World {
    /// Creates a world without a level; clicks are rejected until one loads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            grid: Grid::empty(),
            cars: Vec::new(),
            tracker: CompletionTracker::default(),
            animating: false,
        }
    }

    fn load(&mut self, layout: LevelLayout, out_events: &mut Vec<Event>) {
        if !layout.has_supported_size() {
            tracing::warn!(
                level = %layout.name,
                width = layout.width,
                height = layout.height,
                tiles = layout.tiles.len(),
                "level layout rejected"
            );
            out_events.push(Event::LevelRejected {
                name: layout.name,
                width: layout.width,
                height: layout.height,
            });
            return;
        }

        let mut grid = Grid::from_layout(&layout);
        let construction = construct(&layout, &grid);
        for car in &construction.cars {
            grid.mark_occupied(car);
        }

        for (index, reason) in &construction.rejected {
            tracing::warn!(level = %layout.name, index, %reason, "car descriptor rejected");
            out_events.push(Event::CarRejected {
                index: *index,
                reason: *reason,
            });
        }

        let total = count(construction.cars.len());
        let parked = count(construction.cars.iter().filter(|car| car.in_lot).count());
        tracing::info!(level = %layout.name, cars = total, parked, "level loaded");
        out_events.push(Event::LevelLoaded {
            name: layout.name.clone(),
            cars: total,
            parked,
            rejected: count(construction.rejected.len()),
        });

        self.grid = grid;
        self.cars = construction.cars;
        self.tracker = CompletionTracker::new(parked, total);
        self.animating = false;
        if self.tracker.is_cleared() {
            tracing::info!(level = %layout.name, total, "level starts cleared");
            out_events.push(Event::LevelCleared { total });
        }
        self.layout = Some(layout);
    }

    fn click(&mut self, car: CarId, out_events: &mut Vec<Event>) {
        let rejection = if self.layout.is_none() {
            Some(MoveRejection::NoLevel)
        } else if self.animating {
            Some(MoveRejection::AnimationInProgress)
        } else {
            None
        };
        if let Some(reason) = rejection {
            out_events.push(Event::MoveRejected { car, reason });
            return;
        }

        let Some(index) = self.car_index(car) else {
            out_events.push(Event::MoveRejected {
                car,
                reason: MoveRejection::UnknownCar,
            });
            return;
        };

        let plan = Surroundings {
            grid: &self.grid,
            cars: &self.cars,
        }
        .resolve(&self.cars[index]);
        if plan.outcome == MovementOutcome::CannotMove {
            tracing::debug!(car = car.get(), "car is blocked in both directions");
            out_events.push(Event::MoveRejected {
                car,
                reason: MoveRejection::Blocked,
            });
            return;
        }

        let (width, height) = self.grid.dimensions();
        let axis_length = self.cars[index]
            .edge
            .side()
            .axis_length(width, height);
        let had_outside_cells = !plan.from.is_inside(axis_length);

        let mover = &mut self.cars[index];
        self.grid.clear_occupied(mover);
        mover.span = plan.to;
        mover.in_lot = plan.to.is_inside(axis_length);
        self.grid.mark_occupied(mover);
        tracing::debug!(
            car = car.get(),
            edge = %mover.edge,
            heading = ?plan.heading,
            outcome = ?plan.outcome,
            "car moved"
        );

        let chained = if plan.crosses_boundary() || had_outside_cells {
            chain::propagate(&mut self.cars, &mut self.grid, index)
        } else {
            Vec::new()
        };

        out_events.push(Event::CarMoved {
            car,
            from: plan.from,
            to: plan.to,
            transition: plan.transition(),
            chained: false,
        });
        for step in &chained {
            out_events.push(Event::CarMoved {
                car: step.car,
                from: step.from,
                to: step.to,
                transition: step.transition,
                chained: true,
            });
        }

        self.tracker.record(plan.transition(), out_events);
        for step in &chained {
            self.tracker.record(step.transition, out_events);
        }

        self.animating = true;
    }

    fn car_index(&self, car: CarId) -> Option<usize> {
        self.cars.iter().position(|candidate| candidate.id == car)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => world.load(layout, out_events),
        Command::ClickCar { car } => world.click(car, out_events),
        Command::FinishAnimation => {
            if world.animating {
                out_events.push(Event::AnimationFinished);
            }
            world.animating = false;
        }
        Command::ResetLevel => {
            if let Some(layout) = world.layout.clone() {
                world.load(layout, out_events);
            }
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use parking_jam_core::{BoardPoint, CarId, CellCoord, Edge, Span};

    use super::{Car, Cell, Grid, Heading, MovePlan, Surroundings, World};

    /// Name of the loaded level, if any.
    #[must_use]
    pub fn level_name(world: &World) -> Option<&str> {
        world.layout.as_ref().map(|layout| layout.name.as_str())
    }

    /// Exposes a read-only view of the occupancy grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        GridView { grid: &world.grid }
    }

    /// Captures snapshots of every car ordered by identifier.
    #[must_use]
    pub fn cars(world: &World) -> Vec<CarSnapshot> {
        let mut snapshots: Vec<CarSnapshot> = world.cars.iter().map(snapshot).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures a snapshot of a single car.
    #[must_use]
    pub fn car(world: &World, car: CarId) -> Option<CarSnapshot> {
        world
            .cars
            .iter()
            .find(|candidate| candidate.id == car)
            .map(snapshot)
    }

    /// Cars of one lane ordered by queue order.
    #[must_use]
    pub fn lane_cars(world: &World, edge: Edge) -> Vec<CarSnapshot> {
        let mut snapshots: Vec<CarSnapshot> = world
            .cars
            .iter()
            .filter(|car| car.edge == edge)
            .map(snapshot)
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.order);
        snapshots
    }

    /// Car covering the board point, looking outside the lot as well.
    #[must_use]
    pub fn car_at(world: &World, point: BoardPoint) -> Option<CarId> {
        let (width, height) = world.grid.dimensions();
        if let Some(cell) = point.cell(width, height) {
            return match world.grid.get(cell) {
                Some(Cell::Car(car)) => Some(car),
                _ => None,
            };
        }
        world
            .cars
            .iter()
            .find(|car| {
                car.edge
                    .position_of(point)
                    .is_some_and(|position| car.span.contains(position))
            })
            .map(|car| car.id)
    }

    /// Number of cars parked entirely inside the lot.
    #[must_use]
    pub fn parked_count(world: &World) -> u32 {
        world.tracker.parked()
    }

    /// Number of cars created for the loaded level.
    #[must_use]
    pub fn total_cars(world: &World) -> u32 {
        world.tracker.total()
    }

    /// Reports whether every car of the level is parked.
    #[must_use]
    pub fn is_cleared(world: &World) -> bool {
        world.tracker.is_cleared()
    }

    /// Reports whether a move animation still gates new clicks.
    #[must_use]
    pub fn is_animating(world: &World) -> bool {
        world.animating
    }

    /// Resolves a click without applying it.
    #[must_use]
    pub fn resolve(world: &World, car: CarId) -> Option<MovePlan> {
        let index = world.car_index(car)?;
        Some(surroundings(world).resolve(&world.cars[index]))
    }

    /// Evaluates a single direction for the car without applying it.
    #[must_use]
    pub fn probe(world: &World, car: CarId, heading: Heading) -> Option<MovePlan> {
        let index = world.car_index(car)?;
        Some(surroundings(world).probe(&world.cars[index], heading))
    }

    fn surroundings(world: &World) -> Surroundings<'_> {
        Surroundings {
            grid: &world.grid,
            cars: &world.cars,
        }
    }

    /// Immutable representation of a single car's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CarSnapshot {
        /// Unique identifier assigned to the car.
        pub id: CarId,
        /// Lane the car slides along.
        pub edge: Edge,
        /// Queue order within the lane.
        pub order: u32,
        /// Declared length in cells.
        pub length: u32,
        /// Current head and tail positions along the lane.
        pub span: Span,
        /// Indicates whether the car is parked entirely inside the lot.
        pub in_lot: bool,
    }

    fn snapshot(car: &Car) -> CarSnapshot {
        CarSnapshot {
            id: car.id,
            edge: car.edge,
            order: car.order,
            length: car.length,
            span: car.span,
            in_lot: car.in_lot,
        }
    }

    /// Read-only view into the occupancy grid.
    #[derive(Clone, Copy, Debug)]
    pub struct GridView<'a> {
        grid: &'a Grid,
    }

    impl<'a> GridView<'a> {
        /// Content of the cell, or `None` outside the lot.
        #[must_use]
        pub fn cell(&self, cell: CellCoord) -> Option<Cell> {
            self.grid.get(cell)
        }

        /// Returns an iterator over all cells in row-major order.
        pub fn iter(&self) -> impl Iterator<Item = Cell> + 'a {
            self.grid.cells().iter().copied()
        }

        /// Provides the dimensions of the lot as `(width, height)`.
        #[must_use]
        pub fn dimensions(&self) -> (u32, u32) {
            self.grid.dimensions()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_jam_core::{CarDescriptor, CellCoord, Edge, Span};

    fn lane(code: &str) -> Edge {
        code.parse().expect("valid lane code")
    }

    fn loaded(layout: LevelLayout) -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::LoadLevel { layout }, &mut events);
        (world, events)
    }

    fn click(world: &mut World, car: u32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::ClickCar {
                car: CarId::new(car),
            },
            &mut events,
        );
        let mut finished = Vec::new();
        apply(world, Command::FinishAnimation, &mut finished);
        events
    }

    #[test]
    fn clicks_before_loading_are_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ClickCar {
                car: CarId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::MoveRejected {
                car: CarId::new(0),
                reason: MoveRejection::NoLevel,
            }]
        );
    }

    #[test]
    fn loading_reports_created_and_rejected_cars() {
        let layout = LevelLayout::open("load", 5, 6)
            .with_car(CarDescriptor::outside(lane("U0"), 0, 3))
            .with_car(CarDescriptor::outside(lane("U9"), 0, 3));

        let (world, events) = loaded(layout);

        assert_eq!(
            events,
            vec![
                Event::CarRejected {
                    index: 1,
                    reason: parking_jam_core::CarRejection::LaneOutOfRange,
                },
                Event::LevelLoaded {
                    name: "load".to_owned(),
                    cars: 1,
                    parked: 0,
                    rejected: 1,
                },
            ]
        );
        assert_eq!(query::total_cars(&world), 1);
        assert_eq!(query::level_name(&world), Some("load"));
    }

    #[test]
    fn unknown_cars_are_rejected() {
        let (mut world, _) = loaded(
            LevelLayout::open("unknown", 5, 6)
                .with_car(CarDescriptor::outside(lane("U0"), 0, 1)),
        );

        let events = click(&mut world, 7);

        assert_eq!(
            events,
            vec![Event::MoveRejected {
                car: CarId::new(7),
                reason: MoveRejection::UnknownCar,
            }]
        );
    }

    #[test]
    fn finishing_without_animation_is_silent() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::FinishAnimation, &mut events);

        assert!(events.is_empty());
        assert!(!query::is_animating(&world));
    }

    #[test]
    fn grid_tracks_parked_cars() {
        let (mut world, _) = loaded(
            LevelLayout::open("grid", 5, 6).with_car(CarDescriptor::outside(lane("L2"), 0, 2)),
        );

        let _ = click(&mut world, 0);

        let grid = query::grid_view(&world);
        assert_eq!(
            grid.cell(CellCoord::new(4, 2)),
            Some(Cell::Car(CarId::new(0)))
        );
        assert_eq!(
            grid.cell(CellCoord::new(3, 2)),
            Some(Cell::Car(CarId::new(0)))
        );
        assert_eq!(
            grid.iter()
                .filter(|cell| *cell == Cell::Car(CarId::new(0)))
                .count(),
            2
        );
        assert_eq!(
            query::car(&world, CarId::new(0)).map(|car| car.span),
            Some(Span::new(4, 3))
        );
    }

    #[test]
    fn car_at_finds_queued_cars_outside_the_lot() {
        let (world, _) = loaded(
            LevelLayout::open("lookup", 5, 6)
                .with_car(CarDescriptor::outside(lane("R1"), 0, 2))
                .with_car(CarDescriptor::parked(lane("D3"), 0, 2)),
        );

        assert_eq!(
            query::car_at(&world, parking_jam_core::BoardPoint::new(6, 1)),
            Some(CarId::new(0))
        );
        assert_eq!(
            query::car_at(&world, parking_jam_core::BoardPoint::new(3, 0)),
            Some(CarId::new(1))
        );
        assert_eq!(
            query::car_at(&world, parking_jam_core::BoardPoint::new(7, 1)),
            None
        );
    }

    #[test]
    fn level_with_every_car_parked_loads_cleared() {
        let (world, events) = loaded(
            LevelLayout::open("pre", 5, 6).with_car(CarDescriptor::parked(lane("U0"), 0, 2)),
        );

        assert!(query::is_cleared(&world));
        assert_eq!(
            events,
            vec![
                Event::LevelLoaded {
                    name: "pre".to_owned(),
                    cars: 1,
                    parked: 1,
                    rejected: 0,
                },
                Event::LevelCleared { total: 1 },
            ]
        );
    }

    #[test]
    fn level_without_cars_is_not_cleared() {
        let (world, events) = loaded(LevelLayout::open("empty", 3, 3));

        assert!(!query::is_cleared(&world));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::LevelCleared { .. })));
    }

    #[test]
    fn oversized_layout_keeps_the_previous_level() {
        let (mut world, _) = loaded(
            LevelLayout::open("kept", 5, 6).with_car(CarDescriptor::outside(lane("U1"), 0, 2)),
        );
        let mut oversized = LevelLayout::open("huge", 4, 4);
        oversized.width = parking_jam_core::MAX_LOT_SIDE + 1;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadLevel { layout: oversized },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::LevelRejected {
                name: "huge".to_owned(),
                width: parking_jam_core::MAX_LOT_SIDE + 1,
                height: 4,
            }]
        );
        assert_eq!(query::level_name(&world), Some("kept"));
        assert_eq!(query::total_cars(&world), 1);
    }

    #[test]
    fn reset_rebuilds_the_last_layout() {
        let (mut world, _) = loaded(
            LevelLayout::open("reset", 5, 6).with_car(CarDescriptor::outside(lane("U1"), 0, 2)),
        );
        let _ = click(&mut world, 0);
        assert_eq!(query::parked_count(&world), 1);

        let mut events = Vec::new();
        apply(&mut world, Command::ResetLevel, &mut events);

        assert_eq!(query::parked_count(&world), 0);
        assert_eq!(
            query::car(&world, CarId::new(0)).map(|car| car.span),
            Some(Span::new(6, 7))
        );
        assert!(matches!(events.last(), Some(Event::LevelLoaded { .. })));
    }

    #[test]
    fn mover_events_precede_counter_updates() {
        let (mut world, _) = loaded(
            LevelLayout::open("order", 5, 6)
                .with_car(CarDescriptor::outside(lane("U0"), 0, 2))
                .with_car(CarDescriptor::outside(lane("U0"), 1, 1))
                .with_car(CarDescriptor::outside(lane("U4"), 0, 1)),
        );

        let events = click(&mut world, 0);

        assert_eq!(
            events,
            vec![
                Event::CarMoved {
                    car: CarId::new(0),
                    from: Span::new(6, 7),
                    to: Span::new(0, 1),
                    transition: Transition::Entered,
                    chained: false,
                },
                Event::CarMoved {
                    car: CarId::new(1),
                    from: Span::new(8, 8),
                    to: Span::new(6, 6),
                    transition: Transition::None,
                    chained: true,
                },
                Event::ParkedCountChanged {
                    parked: 1,
                    total: 3
                },
            ]
        );
    }
}
