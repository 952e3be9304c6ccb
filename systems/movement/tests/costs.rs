use grid_tactics_core::{Orientation, TerrainType, UnitClass, UnitFamily, UnitId, WorldError};
use grid_tactics_system_movement::CostModel;
use grid_tactics_world::graphics::HeadlessLoader;
use grid_tactics_world::grid::BackgroundTile;
use grid_tactics_world::units::UnitSpec;
use grid_tactics_world::{query, GridConfig, World};

fn world_with_foot_unit(speed: i32) -> (World, UnitId) {
    let mut world = World::new(
        GridConfig::new(32, 32, 10, 10),
        Box::new(HeadlessLoader::new()),
    );
    let id = world.register_unit(UnitSpec::new(
        "rifleman",
        UnitClass::new(UnitFamily::Foot, 0),
        speed,
    ));
    (world, id)
}

#[test]
fn speed_two_foot_unit_crosses_plains_for_free() {
    let (world, id) = world_with_foot_unit(2);
    let unit = query::unit(&world, id).expect("registered");
    let model = CostModel::default();
    let tile = BackgroundTile::new("meadow", TerrainType::Plain);

    assert_eq!(model.terrain_unit_cost(unit.class(), tile.terrain()), 1);
    assert_eq!(model.move_cost(unit, &tile), Ok(0), "(1 + 0) / 2 truncates");
}

#[test]
fn move_cost_is_non_decreasing_in_the_movement_modifier() {
    let (world, id) = world_with_foot_unit(2);
    let unit = query::unit(&world, id).expect("registered");
    let model = CostModel::default();

    let mut previous = i32::MIN;
    for modifier in -3..=6 {
        let tile =
            BackgroundTile::new("meadow", TerrainType::Plain).with_movement_modifier(modifier);
        let cost = model.move_cost(unit, &tile).expect("valid speed");
        assert!(
            cost >= previous,
            "modifier {modifier} lowered the cost from {previous} to {cost}"
        );
        previous = cost;
    }
}

#[test]
fn move_cost_division_truncates_toward_zero() {
    let (world, id) = world_with_foot_unit(2);
    let unit = query::unit(&world, id).expect("registered");
    let model = CostModel::default();

    // (1 - 2) / 2 is -0.5; truncation toward zero yields 0, not -1.
    let tile = BackgroundTile::new("sunken road", TerrainType::Plain).with_movement_modifier(-2);
    assert_eq!(model.move_cost(unit, &tile), Ok(0));

    let tile = BackgroundTile::new("paved road", TerrainType::Plain).with_movement_modifier(-3);
    assert_eq!(model.move_cost(unit, &tile), Ok(-1));
}

#[test]
fn non_positive_speed_is_rejected_before_dividing() {
    let model = CostModel::default();
    let tile = BackgroundTile::new("meadow", TerrainType::Plain);

    for speed in [0, -3] {
        let (world, id) = world_with_foot_unit(speed);
        let unit = query::unit(&world, id).expect("registered");
        assert_eq!(
            model.move_cost(unit, &tile),
            Err(WorldError::InvalidSpeed { speed })
        );
    }
}

#[test]
fn step_cost_adds_the_turning_distance() {
    let (world, id) = world_with_foot_unit(1);
    let unit = query::unit(&world, id).expect("registered");
    let model = CostModel::default();
    let tile = BackgroundTile::new("meadow", TerrainType::Plain);

    // Facing north; an about-face to south costs the full half ring.
    assert_eq!(model.step_cost(unit, &tile, Orientation::South), Ok(1 + 4));
    assert_eq!(model.step_cost(unit, &tile, Orientation::North), Ok(1));
}

#[test]
fn terrain_cost_depends_on_the_family_not_the_subclass() {
    let model = CostModel::default();
    let scouts = UnitClass::new(UnitFamily::Foot, 0x01);
    let grenadiers = UnitClass::new(UnitFamily::Foot, 0x7f);

    for terrain in TerrainType::ALL {
        assert_eq!(
            model.terrain_unit_cost(scouts, terrain),
            model.terrain_unit_cost(grenadiers, terrain)
        );
    }
}
