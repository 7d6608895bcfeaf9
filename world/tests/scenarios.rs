use parking_jam_core::{
    CarDescriptor, CarId, CellCoord, Command, Edge, Event, LevelLayout, MoveRejection, Span,
    Transition,
};
use parking_jam_world::{self as world, query, Cell, Heading, MovementOutcome, World};

fn lane(code: &str) -> Edge {
    code.parse().expect("valid lane code")
}

fn load(layout: LevelLayout) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { layout }, &mut events);
    world
}

fn click(world: &mut World, car: u32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::ClickCar {
            car: CarId::new(car),
        },
        &mut events,
    );
    events
}

fn finish(world: &mut World) {
    let mut events = Vec::new();
    world::apply(world, Command::FinishAnimation, &mut events);
}

fn span_of(world: &World, car: u32) -> Span {
    query::car(world, CarId::new(car))
        .expect("car exists")
        .span
}

fn grid_tags(world: &World) -> Vec<i64> {
    query::grid_view(world).iter().map(Cell::tag).collect()
}

#[test]
fn single_car_enters_and_clears_the_level() {
    let mut world = load(
        LevelLayout::open("single", 5, 6).with_car(CarDescriptor::outside(lane("U0"), 0, 3)),
    );
    assert_eq!(span_of(&world, 0), Span::new(6, 8));
    assert_eq!(query::parked_count(&world), 0);

    let events = click(&mut world, 0);

    let span = span_of(&world, 0);
    assert!(span.head() <= 3, "car stopped short: {span:?}");
    assert_eq!(span, Span::new(0, 2));
    assert_eq!(query::parked_count(&world), 1);
    assert!(query::is_cleared(&world));
    assert_eq!(
        events,
        vec![
            Event::CarMoved {
                car: CarId::new(0),
                from: Span::new(6, 8),
                to: Span::new(0, 2),
                transition: Transition::Entered,
                chained: false,
            },
            Event::ParkedCountChanged {
                parked: 1,
                total: 1
            },
            Event::LevelCleared { total: 1 },
        ]
    );
}

#[test]
fn follower_closes_up_to_the_boundary_not_the_old_position() {
    let mut world = load(
        LevelLayout::open("queue", 5, 6)
            .with_car(CarDescriptor::outside(lane("U0"), 0, 2))
            .with_car(CarDescriptor::outside(lane("U0"), 1, 1)),
    );
    assert_eq!(span_of(&world, 1), Span::new(8, 8));

    let events = click(&mut world, 0);

    assert_eq!(span_of(&world, 0), Span::new(0, 1));
    assert_eq!(span_of(&world, 1), Span::new(6, 6));
    assert!(events.contains(&Event::CarMoved {
        car: CarId::new(1),
        from: Span::new(8, 8),
        to: Span::new(6, 6),
        transition: Transition::None,
        chained: true,
    }));
    assert!(!query::is_cleared(&world));
}

#[test]
fn follower_stays_adjacent_to_a_partially_entered_car() {
    let mut world = load(
        LevelLayout::open("straddle", 5, 6)
            .with_obstacle(CellCoord::new(1, 3))
            .with_car(CarDescriptor::outside(lane("U1"), 0, 3))
            .with_car(CarDescriptor::outside(lane("U1"), 1, 2)),
    );

    let _ = click(&mut world, 0);

    assert_eq!(span_of(&world, 0), Span::new(4, 6));
    assert_eq!(span_of(&world, 1), Span::new(7, 8));
    assert_eq!(query::parked_count(&world), 0);
}

#[test]
fn blocked_direction_is_reported_while_the_other_is_evaluated() {
    let mut world = load(
        LevelLayout::open("blocked", 5, 6)
            .with_car(CarDescriptor::parked(lane("U2"), 0, 2))
            .with_car(CarDescriptor::parked(lane("L3"), 0, 3)),
    );
    // The horizontal car occupies (2, 3), directly ahead of the vertical car.
    assert_eq!(span_of(&world, 0), Span::new(4, 5));
    assert_eq!(span_of(&world, 1), Span::new(2, 0));

    let inward = query::probe(&world, CarId::new(0), Heading::Inward).expect("car exists");
    assert_eq!(inward.outcome, MovementOutcome::CannotMove);
    assert_eq!(inward.to, inward.from);

    let outward = query::probe(&world, CarId::new(0), Heading::Outward).expect("car exists");
    assert_eq!(outward.outcome, MovementOutcome::ExitsLot { head: 6 });

    let _ = click(&mut world, 0);

    assert_eq!(span_of(&world, 0), Span::new(6, 7));
    assert_eq!(query::parked_count(&world), 1);
}

#[test]
fn clicks_during_animation_change_nothing() {
    let mut world = load(
        LevelLayout::open("gate", 5, 6)
            .with_car(CarDescriptor::outside(lane("U0"), 0, 2))
            .with_car(CarDescriptor::outside(lane("L5"), 0, 2)),
    );
    let _ = click(&mut world, 0);
    assert!(query::is_animating(&world));

    let tags_before = grid_tags(&world);
    let parked_before = query::parked_count(&world);

    let events = click(&mut world, 1);

    assert_eq!(
        events,
        vec![Event::MoveRejected {
            car: CarId::new(1),
            reason: MoveRejection::AnimationInProgress,
        }]
    );
    assert_eq!(grid_tags(&world), tags_before);
    assert_eq!(query::parked_count(&world), parked_before);
    assert_eq!(span_of(&world, 1), Span::new(-1, -2));

    finish(&mut world);
    assert!(!query::is_animating(&world));
    let _ = click(&mut world, 1);
    assert_eq!(query::parked_count(&world), 2);
}

#[test]
fn entering_then_reversing_restores_the_counter() {
    let mut world = load(
        LevelLayout::open("round trip", 5, 6)
            .with_car(CarDescriptor::outside(lane("U0"), 0, 3))
            .with_car(CarDescriptor::outside(lane("U4"), 0, 1)),
    );

    let _ = click(&mut world, 0);
    finish(&mut world);
    assert_eq!(query::parked_count(&world), 1);

    let events = click(&mut world, 0);
    finish(&mut world);

    assert_eq!(span_of(&world, 0), Span::new(6, 8));
    assert_eq!(query::parked_count(&world), 0);
    assert!(events.contains(&Event::ParkedCountChanged {
        parked: 0,
        total: 2
    }));
    assert!(grid_tags(&world).iter().all(|tag| *tag == 0));
}

#[test]
fn queued_car_cannot_pass_the_car_ahead() {
    let mut world = load(
        LevelLayout::open("order", 5, 6)
            .with_car(CarDescriptor::outside(lane("R2"), 0, 2))
            .with_car(CarDescriptor::outside(lane("R2"), 1, 2)),
    );

    let events = click(&mut world, 1);

    assert_eq!(
        events,
        vec![Event::MoveRejected {
            car: CarId::new(1),
            reason: MoveRejection::Blocked,
        }]
    );
    assert!(!query::is_animating(&world));
}

#[test]
fn every_side_drives_toward_its_far_wall() {
    let mut world = load(
        LevelLayout::open("sides", 5, 6)
            .with_car(CarDescriptor::outside(lane("U0"), 0, 2))
            .with_car(CarDescriptor::outside(lane("D4"), 0, 2))
            .with_car(CarDescriptor::outside(lane("L3"), 0, 2))
            .with_car(CarDescriptor::outside(lane("R2"), 0, 2)),
    );

    for car in 0..4 {
        let _ = click(&mut world, car);
        finish(&mut world);
    }

    assert_eq!(span_of(&world, 0), Span::new(0, 1));
    assert_eq!(span_of(&world, 1), Span::new(5, 4));
    assert_eq!(span_of(&world, 2), Span::new(4, 3));
    assert_eq!(span_of(&world, 3), Span::new(0, 1));
    assert!(query::is_cleared(&world));
    assert_eq!(
        query::car_at(&world, parking_jam_core::BoardPoint::new(0, 2)),
        Some(CarId::new(3))
    );
}

#[test]
fn lane_cars_are_listed_in_queue_order() {
    let world = load(
        LevelLayout::open("lanes", 5, 6)
            .with_car(CarDescriptor::outside(lane("D2"), 3, 1))
            .with_car(CarDescriptor::outside(lane("U2"), 0, 1))
            .with_car(CarDescriptor::outside(lane("D2"), 1, 2)),
    );

    let orders: Vec<u32> = query::lane_cars(&world, lane("D2"))
        .iter()
        .map(|car| car.order)
        .collect();

    assert_eq!(orders, vec![1, 3]);
    assert_eq!(span_of(&world, 2), Span::new(-1, -2));
    assert_eq!(span_of(&world, 0), Span::new(-3, -3));
}

#[test]
fn queued_car_facing_a_blocked_entry_never_backs_further_out() {
    let mut world = load(
        LevelLayout::open("wall", 5, 6)
            .with_obstacle(CellCoord::new(4, 2))
            .with_car(CarDescriptor::outside(lane("R2"), 0, 2)),
    );
    assert_eq!(span_of(&world, 0), Span::new(5, 6));

    let outward = query::probe(&world, CarId::new(0), Heading::Outward).expect("car exists");
    assert_eq!(outward.outcome, MovementOutcome::CannotMove);
    assert_eq!(outward.to, Span::new(5, 6));

    let events = click(&mut world, 0);

    assert_eq!(
        events,
        vec![Event::MoveRejected {
            car: CarId::new(0),
            reason: MoveRejection::Blocked,
        }]
    );
    assert_eq!(span_of(&world, 0), Span::new(5, 6));
    assert!(!query::is_animating(&world));
}
