#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless grid-tactics demonstration.
//!
//! Plays the role of the external map loader and input adapter: builds a
//! small map through the world's placement methods, stages two turns (one
//! clean, one with a blocked swap) and prints the resulting events and an
//! ASCII view of the grid.

use std::path::Path;

use anyhow::{Context, Result};
use grid_tactics_core::{
    Command, Event, GridCoord, Orientation, TerrainType, UnitClass, UnitFamily, UnitId,
};
use grid_tactics_rendering::{
    grid_to_screen, Color, FrameInput, Presentation, RenderingBackend, Scene, ScrollDirection,
    TileInstance, UnitInstance, Viewport,
};
use grid_tactics_system_movement::CostModel;
use grid_tactics_world::graphics::HeadlessLoader;
use grid_tactics_world::grid::BackgroundTile;
use grid_tactics_world::units::UnitSpec;
use grid_tactics_world::{apply, query, GridConfig, World};

const WINDOW_WIDTH: i32 = 640;
const WINDOW_HEIGHT: i32 = 480;
const TILE_SIZE: u32 = 32;
const GRID_TILES: u32 = 10;

fn main() -> Result<()> {
    let mut world = World::new(
        GridConfig::new(TILE_SIZE, TILE_SIZE, GRID_TILES, GRID_TILES),
        Box::new(HeadlessLoader::new()),
    );
    let viewport = Viewport::new(WINDOW_WIDTH, WINDOW_HEIGHT, TILE_SIZE as i32, TILE_SIZE as i32)?;

    build_map(&mut world)?;
    let (rifles, hussars) = muster_units(&mut world)?;
    preview_costs(&world, rifles)?;

    println!("\n-- first turn --");
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::StageMove {
            unit: rifles,
            to: GridCoord::new(1, 2),
            facing: Orientation::South,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::StageMove {
            unit: hussars,
            to: GridCoord::new(3, 1),
            facing: Orientation::East,
        },
        &mut events,
    );
    apply(&mut world, Command::CommitTurn, &mut events);
    print_events(&events);

    println!("\n-- second turn: both units order a swap --");
    events.clear();
    apply(
        &mut world,
        Command::StageMove {
            unit: rifles,
            to: GridCoord::new(3, 1),
            facing: Orientation::East,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::StageMove {
            unit: hussars,
            to: GridCoord::new(1, 2),
            facing: Orientation::West,
        },
        &mut events,
    );
    apply(&mut world, Command::CommitTurn, &mut events);
    print_events(&events);

    println!();
    print_map(&world);
    println!();

    let bounds = query::bounds(&world);
    let presentation = Presentation::new(
        "grid-tactics",
        Color::from_rgb_u8(24, 26, 28),
        viewport,
        build_scene(&world),
    );
    TextBackend.run(presentation, move |input, presentation| {
        if let Some(direction) = input.scroll {
            let (dx, dy) = match direction {
                ScrollDirection::Left => (-1, 0),
                ScrollDirection::Right => (1, 0),
                ScrollDirection::Up => (0, -1),
                ScrollDirection::Down => (0, 1),
            };
            presentation.viewport.scroll_by(dx, dy, bounds);
        }
    })?;

    let anchor = GridCoord::new(3, 1);
    let (sx, sy, status) = grid_to_screen(&viewport, anchor);
    println!(
        "cell ({}, {}) renders at pixel ({sx}, {sy}), {status:?}",
        anchor.x(),
        anchor.y()
    );
    Ok(())
}

/// Lays out the checkerboard of plain tiles the original bootstrap used,
/// with a swamp belt and an impassable ridge for variety.
fn build_map(world: &mut World) -> Result<()> {
    let meadow = world.load_graphic(Path::new("bg_sprite1.png"))?;
    let heath = world.load_graphic(Path::new("bg_sprite2.png"))?;

    for y in 0..GRID_TILES {
        for x in 0..GRID_TILES {
            let graphic = if (x + y) % 2 == 0 { meadow } else { heath };
            let tile = if y == 6 {
                BackgroundTile::new("swamp belt", TerrainType::Swamp)
                    .with_water_depth(1)
                    .with_movement_modifier(2)
            } else {
                BackgroundTile::new("open field", TerrainType::Plain)
            };
            world
                .set_tile(GridCoord::new(x, y), tile.with_graphic(graphic))
                .context("map layout stays inside the grid")?;
        }
    }

    // A short ridge units must walk around.
    for x in 4..=6 {
        world
            .set_traversable(GridCoord::new(x, 3), false)
            .context("ridge stays inside the grid")?;
    }
    Ok(())
}

fn muster_units(world: &mut World) -> Result<(UnitId, UnitId)> {
    let banner = world.load_graphic(Path::new("unit_sprite.png"))?;

    let rifles = world.register_unit(UnitSpec::new(
        "rifle company",
        UnitClass::new(UnitFamily::Foot, 0x01),
        2,
    ));
    let hussars = world.register_unit(
        UnitSpec::new(
            "hussar squadron",
            UnitClass::new(UnitFamily::Mounted, 0x01),
            3,
        )
        .with_orientation(Orientation::East)
        .with_max_movement_distance(3),
    );

    world.assign_unit_graphic(rifles, banner)?;
    world.assign_unit_graphic(hussars, banner)?;
    world.set_unit_alpha(hussars, 192)?;
    world.deploy_unit(rifles, GridCoord::new(1, 1))?;
    world.deploy_unit(hussars, GridCoord::new(2, 1))?;
    Ok((rifles, hussars))
}

fn preview_costs(world: &World, id: UnitId) -> Result<()> {
    let model = CostModel::default();
    let unit = query::unit(world, id).context("unit was just registered")?;
    let south = GridCoord::new(1, 2);
    let tile = query::grid(world)
        .tile_at(south)
        .context("map construction tiled every cell")?;

    println!(
        "moving {} onto the {} costs {}",
        unit.name(),
        tile.label(),
        model.move_cost(unit, tile)?
    );
    println!(
        "an about-face would cost {} turn steps",
        CostModel::turn_cost(unit.orientation(), Orientation::South)
    );
    Ok(())
}

/// Converts the world's render payload into the presentation contract.
fn build_scene(world: &World) -> Scene {
    let view = query::scene(world);
    Scene {
        tiles: view
            .tiles
            .iter()
            .map(|tile| TileInstance {
                cell: tile.at,
                sprite: tile.sprite,
            })
            .collect(),
        units: view
            .units
            .iter()
            .map(|unit| UnitInstance {
                cell: unit.at,
                sprite: unit.sprite,
                alpha: unit.alpha,
            })
            .collect(),
    }
}

/// Single-frame backend that presents the scene as text.
///
/// Stands in for a windowed backend: it feeds one frame of translated
/// input to the update closure, then describes what it would have drawn.
#[derive(Debug)]
struct TextBackend;

impl RenderingBackend for TextBackend {
    fn run<F>(self, mut presentation: Presentation, mut update: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Presentation) + 'static,
    {
        let input = FrameInput {
            scroll: Some(ScrollDirection::Right),
            ..FrameInput::default()
        };
        update(input, &mut presentation);
        println!(
            "{}: {} tile sprites, {} unit sprites, scrolled to ({}, {})",
            presentation.window_title,
            presentation.scene.tiles.len(),
            presentation.scene.units.len(),
            presentation.viewport.scroll_x(),
            presentation.viewport.scroll_y()
        );
        Ok(())
    }
}

fn print_events(events: &[Event]) {
    for event in events {
        match event {
            Event::MoveStaged { unit, to, .. } => {
                println!("  unit {} staged to ({}, {})", unit.get(), to.x(), to.y());
            }
            Event::UnitMoved { unit, from, to, .. } => {
                println!(
                    "  unit {} advanced ({}, {}) -> ({}, {})",
                    unit.get(),
                    from.x(),
                    from.y(),
                    to.x(),
                    to.y()
                );
            }
            Event::MoveRejected { unit, reason } => {
                println!("  unit {} held: {reason}", unit.get());
            }
            Event::TurnCommitted { moved, rejected } => {
                println!("  turn committed: {moved} moved, {rejected} held");
            }
        }
    }
}

fn print_map(world: &World) {
    let grid = query::grid(world);
    for y in 0..grid.tiles_y() {
        let mut row = String::new();
        for x in 0..grid.tiles_x() {
            let at = GridCoord::new(x, y);
            let glyph = match grid.unit_at(at) {
                Some(unit) => char::from(b'A' + (unit.get() % 26) as u8),
                None if !grid.is_traversable(at) => '#',
                None if grid.tile_at(at).is_some() => '.',
                None => ' ',
            };
            row.push(glyph);
        }
        println!("{row}");
    }
}
