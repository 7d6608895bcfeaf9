use parking_jam_core::{CarId, Command, Event};
use parking_jam_levels as levels;
use parking_jam_world::{self as world, query, World};

fn load(layout: parking_jam_core::LevelLayout) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { layout }, &mut events);
    (world, events)
}

#[test]
fn every_builtin_level_loads_without_rejections() {
    let catalogue = levels::catalogue().expect("catalogue loads");
    assert_eq!(catalogue.len(), levels::count());

    for layout in catalogue {
        let name = layout.name.clone();
        let descriptors = layout.cars.len();
        let (world, events) = load(layout);

        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::CarRejected { .. })),
            "{name} rejected cars: {events:?}"
        );
        assert_eq!(
            usize::try_from(query::total_cars(&world)).expect("count fits"),
            descriptors,
            "{name} lost cars"
        );
        assert_eq!(query::parked_count(&world), 0, "{name} starts parked");
    }
}

#[test]
fn first_level_is_cleared_by_driving_every_car_in() {
    let (mut world, _) = load(levels::builtin(1).expect("level 1 loads"));

    let mut cleared = false;
    for car in 0..query::total_cars(&world) {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ClickCar {
                car: CarId::new(car),
            },
            &mut events,
        );
        world::apply(&mut world, Command::FinishAnimation, &mut events);
        cleared |= events
            .iter()
            .any(|event| matches!(event, Event::LevelCleared { total: 3 }));
    }

    assert!(cleared, "level 1 was not cleared");
    assert!(query::is_cleared(&world));
}

#[test]
fn builtin_levels_survive_level_codes() {
    for layout in levels::catalogue().expect("catalogue loads") {
        let code = levels::encode(&layout).expect("layout encodes");
        assert!(code.starts_with(levels::CODE_HEADER));
        let decoded = levels::decode(&code).expect("code decodes");
        assert_eq!(decoded, layout);
    }
}

#[test]
fn level_names_follow_play_order() {
    let names: Vec<String> = levels::catalogue()
        .expect("catalogue loads")
        .into_iter()
        .map(|layout| layout.name)
        .collect();

    assert_eq!(
        names,
        vec!["Level 1", "Level 2", "Level 3", "Level 4", "Level 5", "Level 6"]
    );
}
