#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the grid-tactics engine.
//!
//! The [`World`] composes the tactical grid, the owning unit registry and
//! the shared graphic store into one facade. Map construction flows
//! through direct methods (the external map loader's surface); the turn
//! flow goes through [`apply`], which executes [`Command`] values and
//! broadcasts [`Event`] values for adapters and systems. Reads go through
//! the [`query`] module. Every failing operation validates before it
//! mutates, so callers never observe partial state.

pub mod graphics;
pub mod grid;
pub mod units;

use std::collections::HashSet;
use std::path::Path;

use grid_tactics_core::{Command, Event, GridCoord, Orientation, UnitId, WorldError};

use graphics::{AssetError, AssetLoader, GraphicHandle, GraphicStore};
use grid::{BackgroundTile, Grid};
use units::{UnitRegistry, UnitSpec};

/// Dimensions used to build the world's grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    tile_width: u32,
    tile_height: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl GridConfig {
    /// Creates a new grid configuration.
    #[must_use]
    pub const fn new(tile_width: u32, tile_height: u32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            tile_width,
            tile_height,
            tiles_x,
            tiles_y,
        }
    }

    /// Width of a single tile in pixels.
    #[must_use]
    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Height of a single tile in pixels.
    #[must_use]
    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Number of tiles along the x axis.
    #[must_use]
    pub const fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    /// Number of tiles along the y axis.
    #[must_use]
    pub const fn tiles_y(&self) -> u32 {
        self.tiles_y
    }
}

/// Authoritative engine state: grid, unit registry and graphic store.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    registry: UnitRegistry,
    graphics: GraphicStore,
}

impl World {
    /// Creates a world with an empty grid, registry and graphic store.
    #[must_use]
    pub fn new(config: GridConfig, loader: Box<dyn AssetLoader>) -> Self {
        Self {
            grid: Grid::new(
                config.tile_width(),
                config.tile_height(),
                config.tiles_x(),
                config.tiles_y(),
            ),
            registry: UnitRegistry::new(),
            graphics: GraphicStore::new(loader),
        }
    }

    /// Loads a sprite file into the graphic store.
    ///
    /// The handle starts unreferenced; attaching it to tiles or units
    /// performs the acquisition.
    pub fn load_graphic(&mut self, path: &Path) -> Result<GraphicHandle, AssetError> {
        self.graphics.load(path)
    }

    /// Installs a background tile, acquiring its graphic resource.
    ///
    /// Any tile previously occupying the cell is dropped and its graphic
    /// released.
    pub fn set_tile(&mut self, at: GridCoord, tile: BackgroundTile) -> Result<(), WorldError> {
        if !self.grid.bounds().contains(at) {
            return Err(WorldError::OutOfBounds {
                x: at.x(),
                y: at.y(),
            });
        }
        if let Some(handle) = tile.graphic() {
            let _ = self.graphics.acquire(handle)?;
        }
        let displaced = self.grid.put_tile(at, tile)?;
        if let Some(previous) = displaced {
            if let Some(handle) = previous.graphic() {
                self.graphics.release(handle)?;
            }
        }
        Ok(())
    }

    /// Overrides whether units may enter a cell.
    pub fn set_traversable(&mut self, at: GridCoord, traversable: bool) -> Result<(), WorldError> {
        self.grid.set_traversable(at, traversable)
    }

    /// Registers a new unit, assigning it the next identifier.
    pub fn register_unit(&mut self, spec: UnitSpec) -> UnitId {
        self.registry.register(spec)
    }

    /// Unlinks a unit from the registry, the grid and the active list.
    ///
    /// With `destroy` the unit's graphic resource is released and the unit
    /// dropped; otherwise ownership transfers to the caller, graphic
    /// reference intact.
    pub fn unregister_unit(
        &mut self,
        id: UnitId,
        destroy: bool,
    ) -> Result<Option<units::Unit>, WorldError> {
        let position = self
            .registry
            .get(id)
            .ok_or(WorldError::NotFound { unit: id })?
            .position();
        let unit = self.registry.remove(id)?;
        if let Some(at) = position {
            let _ = self.grid.remove_unit(at)?;
        }
        if destroy {
            if let Some(handle) = unit.graphic().shared() {
                self.graphics.release(handle)?;
            }
            Ok(None)
        } else {
            Ok(Some(unit))
        }
    }

    /// Assigns a shared graphic to a unit, acquiring it and releasing any
    /// previously assigned graphic.
    pub fn assign_unit_graphic(
        &mut self,
        id: UnitId,
        handle: GraphicHandle,
    ) -> Result<(), WorldError> {
        if self.registry.get(id).is_none() {
            return Err(WorldError::NotFound { unit: id });
        }
        let _ = self.graphics.acquire(handle)?;
        let previous = match self.registry.get_mut(id) {
            Some(unit) => {
                let previous = unit.graphic().shared();
                unit.graphic_mut().set_shared(Some(handle));
                previous
            }
            None => None,
        };
        if let Some(old) = previous {
            self.graphics.release(old)?;
        }
        Ok(())
    }

    /// Sets a unit's alpha blending value.
    pub fn set_unit_alpha(&mut self, id: UnitId, alpha: u8) -> Result<(), WorldError> {
        let unit = self
            .registry
            .get_mut(id)
            .ok_or(WorldError::NotFound { unit: id })?;
        unit.graphic_mut().set_alpha(alpha);
        Ok(())
    }

    /// Places a registered unit on the grid.
    ///
    /// Validates the destination before mutating; a unit already deployed
    /// elsewhere is moved off its old cell.
    pub fn deploy_unit(&mut self, id: UnitId, at: GridCoord) -> Result<(), WorldError> {
        let previous = self
            .registry
            .get(id)
            .ok_or(WorldError::NotFound { unit: id })?
            .position();
        self.grid.place_unit(at, id)?;
        if let Some(old) = previous {
            if old != at {
                let _ = self.grid.remove_unit(old)?;
            }
        }
        if let Some(unit) = self.registry.get_mut(id) {
            unit.set_position(Some(at));
        }
        Ok(())
    }

    /// Takes a unit off the grid while keeping it registered.
    pub fn withdraw_unit(&mut self, id: UnitId) -> Result<(), WorldError> {
        let position = self
            .registry
            .get(id)
            .ok_or(WorldError::NotFound { unit: id })?
            .position();
        if let Some(at) = position {
            let _ = self.grid.remove_unit(at)?;
        }
        if let Some(unit) = self.registry.get_mut(id) {
            unit.set_position(None);
        }
        Ok(())
    }

    /// Empties every grid cell, releasing all tile graphics and taking
    /// every unit off the grid. Registered units stay registered.
    pub fn clear_map(&mut self) -> Result<(), WorldError> {
        for tile in self.grid.drain_tiles() {
            if let Some(handle) = tile.graphic() {
                self.graphics.release(handle)?;
            }
        }
        for unit in self.registry.iter_mut() {
            unit.set_position(None);
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically and broadcasting the resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StageMove { unit, to, facing } => {
            let deployed = world
                .registry
                .get(unit)
                .is_some_and(|state| state.position().is_some());
            if !deployed {
                out_events.push(Event::MoveRejected {
                    unit,
                    reason: WorldError::NotFound { unit },
                });
                return;
            }
            if let Some(state) = world.registry.get_mut(unit) {
                state.stage(to, facing);
            }
            let _ = world.registry.active_add(unit);
            log::debug!("unit {} staged to ({}, {})", unit.get(), to.x(), to.y());
            out_events.push(Event::MoveStaged { unit, to, facing });
        }
        Command::CommitTurn => commit_turn(world, out_events),
    }
}

#[derive(Clone, Copy, Debug)]
struct PlannedMove {
    unit: UnitId,
    from: GridCoord,
    to: GridCoord,
    facing: Orientation,
}

/// Validates every staged move against the pre-turn grid, then applies
/// the survivors as one batch so no reader observes a half-committed
/// turn. Rejected units are left untouched, staged state included.
fn commit_turn(world: &mut World, out_events: &mut Vec<Event>) {
    let active = world.registry.take_active();
    let mut planned: Vec<PlannedMove> = Vec::with_capacity(active.len());
    let mut claimed: HashSet<GridCoord> = HashSet::new();
    let mut rejected: u32 = 0;

    for id in active {
        let Some(unit) = world.registry.get(id) else {
            continue;
        };
        let Some(staged) = unit.staged() else {
            continue;
        };
        let (to, facing) = (staged.to(), staged.facing());
        let Some(from) = unit.position() else {
            rejected += 1;
            out_events.push(Event::MoveRejected {
                unit: id,
                reason: WorldError::NotFound { unit: id },
            });
            continue;
        };

        if let Some(reason) = validate_destination(world, id, to, &claimed) {
            rejected += 1;
            log::warn!("move of unit {} rejected: {reason}", id.get());
            out_events.push(Event::MoveRejected { unit: id, reason });
            continue;
        }

        let _ = claimed.insert(to);
        planned.push(PlannedMove {
            unit: id,
            from,
            to,
            facing,
        });
    }

    // Vacate every origin before occupying any destination.
    for step in &planned {
        let _ = world.grid.remove_unit(step.from);
    }
    for step in &planned {
        let _ = world.grid.place_unit(step.to, step.unit);
        if let Some(unit) = world.registry.get_mut(step.unit) {
            unit.set_position(Some(step.to));
            unit.set_orientation(step.facing);
            unit.clear_staged();
        }
        out_events.push(Event::UnitMoved {
            unit: step.unit,
            from: step.from,
            to: step.to,
            facing: step.facing,
        });
    }

    out_events.push(Event::TurnCommitted {
        moved: planned.len() as u32,
        rejected,
    });
}

fn validate_destination(
    world: &World,
    id: UnitId,
    to: GridCoord,
    claimed: &HashSet<GridCoord>,
) -> Option<WorldError> {
    if !world.grid.bounds().contains(to) {
        return Some(WorldError::OutOfBounds {
            x: to.x(),
            y: to.y(),
        });
    }
    let blocked = WorldError::Blocked {
        x: to.x(),
        y: to.y(),
    };
    if !world.grid.is_traversable(to) {
        return Some(blocked);
    }
    if world
        .grid
        .unit_at(to)
        .is_some_and(|occupant| occupant != id)
    {
        return Some(blocked);
    }
    if claimed.contains(&to) {
        return Some(blocked);
    }
    None
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use grid_tactics_core::{
        GridBounds, GridCoord, Orientation, SpriteHandle, UnitClass, UnitId, WorldError,
    };

    use super::World;
    use crate::graphics::GraphicHandle;
    use crate::grid::Grid;
    use crate::units::{StagedMove, Unit};

    /// Provides read-only access to the world's grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Extent of the world's grid in whole tiles.
    #[must_use]
    pub fn bounds(world: &World) -> GridBounds {
        world.grid.bounds()
    }

    /// Unit with the provided id, if registered.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.registry.get(id)
    }

    /// Units that changed this turn, in insertion order.
    #[must_use]
    pub fn active_units(world: &World) -> &[UnitId] {
        world.registry.active()
    }

    /// Current reference count of a graphic store entry.
    pub fn graphic_ref_count(world: &World, handle: GraphicHandle) -> Result<u32, WorldError> {
        world.graphics.ref_count(handle)
    }

    /// Immutable representation of a single unit's state used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct UnitSnapshot {
        /// Unique identifier assigned to the unit.
        pub id: UnitId,
        /// Display name of the unit.
        pub name: String,
        /// Class of the unit.
        pub class: UnitClass,
        /// Cell the unit occupies, if deployed.
        pub position: Option<GridCoord>,
        /// Current absolute facing.
        pub facing: Orientation,
        /// Move recorded for the pending turn, if any.
        pub staged: Option<StagedMove>,
        /// Speed the unit moves over tiles.
        pub speed: i32,
        /// Alpha blending value of the unit graphic.
        pub alpha: u8,
        /// Display-ready sprite backing the unit, if assigned.
        pub sprite: Option<SpriteHandle>,
    }

    /// Captures a read-only view of every registered unit, sorted by id.
    #[must_use]
    pub fn units(world: &World) -> Vec<UnitSnapshot> {
        let mut snapshots: Vec<UnitSnapshot> = world
            .registry
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id(),
                name: unit.name().to_owned(),
                class: unit.class(),
                position: unit.position(),
                facing: unit.orientation(),
                staged: unit.staged(),
                speed: unit.speed(),
                alpha: unit.graphic().alpha(),
                sprite: unit
                    .graphic()
                    .shared()
                    .and_then(|handle| world.graphics.sprite(handle).ok()),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Sprite placement for a populated background tile.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TileSprite {
        /// Cell the tile occupies.
        pub at: GridCoord,
        /// Display-ready sprite backing the tile.
        pub sprite: SpriteHandle,
    }

    /// Sprite placement for a deployed unit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UnitSprite {
        /// Cell the unit occupies.
        pub at: GridCoord,
        /// Display-ready sprite backing the unit.
        pub sprite: SpriteHandle,
        /// Alpha blending value of the unit graphic.
        pub alpha: u8,
    }

    /// Per-frame render payload for the external renderer.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct SceneView {
        /// Every populated tile with a graphic, in row-major order.
        pub tiles: Vec<TileSprite>,
        /// Every deployed unit with a graphic, sorted by id.
        pub units: Vec<UnitSprite>,
    }

    /// Captures the sprite handles, alpha values and destination cells the
    /// renderer collaborator consumes each frame.
    #[must_use]
    pub fn scene(world: &World) -> SceneView {
        let mut view = SceneView::default();
        for y in 0..world.grid.tiles_y() {
            for x in 0..world.grid.tiles_x() {
                let at = GridCoord::new(x, y);
                let sprite = world
                    .grid
                    .tile_at(at)
                    .and_then(|tile| tile.graphic())
                    .and_then(|handle| world.graphics.sprite(handle).ok());
                if let Some(sprite) = sprite {
                    view.tiles.push(TileSprite { at, sprite });
                }
            }
        }
        for snapshot in units(world) {
            if let (Some(at), Some(sprite)) = (snapshot.position, snapshot.sprite) {
                view.units.push(UnitSprite {
                    at,
                    sprite,
                    alpha: snapshot.alpha,
                });
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_tactics_core::{SpriteHandle, TerrainType, UnitClass, UnitFamily};
    use graphics::{ConvertError, LoadError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct LoaderLog {
        issued: u64,
        destroyed: Vec<SpriteHandle>,
    }

    #[derive(Debug)]
    struct StubLoader {
        log: Rc<RefCell<LoaderLog>>,
    }

    impl AssetLoader for StubLoader {
        fn load_sprite(&mut self, _path: &Path) -> Result<SpriteHandle, LoadError> {
            let mut log = self.log.borrow_mut();
            log.issued += 1;
            Ok(SpriteHandle::new(log.issued))
        }

        fn convert_for_display(
            &mut self,
            _sprite: SpriteHandle,
        ) -> Result<SpriteHandle, ConvertError> {
            let mut log = self.log.borrow_mut();
            log.issued += 1;
            Ok(SpriteHandle::new(log.issued))
        }

        fn destroy_sprite(&mut self, sprite: SpriteHandle) {
            self.log.borrow_mut().destroyed.push(sprite);
        }
    }

    fn new_world() -> (World, Rc<RefCell<LoaderLog>>) {
        let log = Rc::new(RefCell::new(LoaderLog::default()));
        let world = World::new(
            GridConfig::new(32, 32, 10, 10),
            Box::new(StubLoader {
                log: Rc::clone(&log),
            }),
        );
        (world, log)
    }

    fn foot_spec(name: &str) -> UnitSpec {
        UnitSpec::new(name, UnitClass::new(UnitFamily::Foot, 0), 2)
    }

    fn deployed_unit(world: &mut World, name: &str, at: GridCoord) -> UnitId {
        let id = world.register_unit(foot_spec(name));
        world.deploy_unit(id, at).expect("deployment succeeds");
        id
    }

    #[test]
    fn set_tile_acquires_and_releases_graphics() {
        let (mut world, _log) = new_world();
        let handle = world
            .load_graphic(Path::new("grass.png"))
            .expect("load succeeds");
        let at = GridCoord::new(0, 0);

        world
            .set_tile(
                at,
                grid::BackgroundTile::new("meadow", TerrainType::Plain).with_graphic(handle),
            )
            .expect("tile installs");
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(1));

        // Replacing with a tile sharing the same graphic keeps the count.
        world
            .set_tile(
                at,
                grid::BackgroundTile::new("meadow", TerrainType::Plain).with_graphic(handle),
            )
            .expect("tile replaces");
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(1));

        // Replacing with an unbacked tile drops the last reference.
        world
            .set_tile(at, grid::BackgroundTile::new("void", TerrainType::Plain))
            .expect("tile replaces");
        assert_eq!(
            query::graphic_ref_count(&world, handle),
            Err(WorldError::StaleGraphic)
        );
    }

    #[test]
    fn set_tile_out_of_bounds_leaves_the_graphic_untouched() {
        let (mut world, _log) = new_world();
        let handle = world
            .load_graphic(Path::new("grass.png"))
            .expect("load succeeds");

        let result = world.set_tile(
            GridCoord::new(10, 0),
            grid::BackgroundTile::new("meadow", TerrainType::Plain).with_graphic(handle),
        );
        assert_eq!(result, Err(WorldError::OutOfBounds { x: 10, y: 0 }));
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(0));
    }

    #[test]
    fn unregister_with_destroy_releases_the_unit_graphic() {
        let (mut world, log) = new_world();
        let handle = world
            .load_graphic(Path::new("rifleman.png"))
            .expect("load succeeds");
        let display_sprite = world.graphics.sprite(handle).expect("live entry");

        let a = world.register_unit(foot_spec("alpha"));
        let b = world.register_unit(foot_spec("bravo"));
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        world
            .assign_unit_graphic(a, handle)
            .expect("assignment succeeds");
        world
            .assign_unit_graphic(b, handle)
            .expect("assignment succeeds");
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(2));

        let removed = world.unregister_unit(a, true).expect("alpha is registered");
        assert!(removed.is_none());
        assert_eq!(world.registry.len(), 1);
        assert!(query::unit(&world, b).is_some());
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(1));

        let _ = world.unregister_unit(b, true).expect("bravo is registered");
        assert!(
            log.borrow().destroyed.contains(&display_sprite),
            "last release frees the shared sprite"
        );
    }

    #[test]
    fn unregister_without_destroy_transfers_ownership() {
        let (mut world, _log) = new_world();
        let handle = world
            .load_graphic(Path::new("rifleman.png"))
            .expect("load succeeds");
        let a = deployed_unit(&mut world, "alpha", GridCoord::new(3, 3));
        world
            .assign_unit_graphic(a, handle)
            .expect("assignment succeeds");

        let unit = world
            .unregister_unit(a, false)
            .expect("alpha is registered")
            .expect("unit is handed back");
        assert_eq!(unit.graphic().shared(), Some(handle));
        assert_eq!(query::graphic_ref_count(&world, handle), Ok(1));
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(3, 3)), None);
    }

    #[test]
    fn stage_and_commit_moves_the_unit() {
        let (mut world, _log) = new_world();
        let id = deployed_unit(&mut world, "alpha", GridCoord::new(1, 1));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: id,
                to: GridCoord::new(2, 1),
                facing: Orientation::East,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MoveStaged {
                unit: id,
                to: GridCoord::new(2, 1),
                facing: Orientation::East,
            }]
        );
        assert_eq!(query::active_units(&world), &[id]);
        assert!(query::unit(&world, id).expect("registered").is_dirty());
        // Staging never touches the grid.
        assert_eq!(
            query::grid(&world).unit_at(GridCoord::new(1, 1)),
            Some(id)
        );

        events.clear();
        apply(&mut world, Command::CommitTurn, &mut events);
        assert_eq!(
            events,
            vec![
                Event::UnitMoved {
                    unit: id,
                    from: GridCoord::new(1, 1),
                    to: GridCoord::new(2, 1),
                    facing: Orientation::East,
                },
                Event::TurnCommitted {
                    moved: 1,
                    rejected: 0,
                },
            ]
        );

        let unit = query::unit(&world, id).expect("registered");
        assert_eq!(unit.position(), Some(GridCoord::new(2, 1)));
        assert_eq!(unit.orientation(), Orientation::East);
        assert!(!unit.is_dirty());
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(1, 1)), None);
        assert_eq!(
            query::grid(&world).unit_at(GridCoord::new(2, 1)),
            Some(id)
        );
        assert!(query::active_units(&world).is_empty());
    }

    #[test]
    fn swapping_units_are_both_blocked_and_the_grid_is_unchanged() {
        let (mut world, _log) = new_world();
        let a = deployed_unit(&mut world, "alpha", GridCoord::new(0, 0));
        let b = deployed_unit(&mut world, "bravo", GridCoord::new(1, 0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: a,
                to: GridCoord::new(1, 0),
                facing: Orientation::East,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StageMove {
                unit: b,
                to: GridCoord::new(0, 0),
                facing: Orientation::West,
            },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::CommitTurn, &mut events);
        assert_eq!(
            events,
            vec![
                Event::MoveRejected {
                    unit: a,
                    reason: WorldError::Blocked { x: 1, y: 0 },
                },
                Event::MoveRejected {
                    unit: b,
                    reason: WorldError::Blocked { x: 0, y: 0 },
                },
                Event::TurnCommitted {
                    moved: 0,
                    rejected: 2,
                },
            ]
        );

        assert_eq!(query::grid(&world).unit_at(GridCoord::new(0, 0)), Some(a));
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(1, 0)), Some(b));
        let alpha = query::unit(&world, a).expect("registered");
        assert_eq!(alpha.position(), Some(GridCoord::new(0, 0)));
        assert_eq!(alpha.orientation(), Orientation::North);
        assert!(alpha.is_dirty(), "rejected units keep their staged state");
        assert!(query::active_units(&world).is_empty());
    }

    #[test]
    fn contested_destination_goes_to_the_first_staged_unit() {
        let (mut world, _log) = new_world();
        let a = deployed_unit(&mut world, "alpha", GridCoord::new(0, 0));
        let b = deployed_unit(&mut world, "bravo", GridCoord::new(4, 4));
        let contested = GridCoord::new(2, 2);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: a,
                to: contested,
                facing: Orientation::Southeast,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StageMove {
                unit: b,
                to: contested,
                facing: Orientation::Northwest,
            },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::CommitTurn, &mut events);

        assert!(events.contains(&Event::MoveRejected {
            unit: b,
            reason: WorldError::Blocked { x: 2, y: 2 },
        }));
        assert_eq!(query::grid(&world).unit_at(contested), Some(a));
        assert_eq!(
            query::unit(&world, b).expect("registered").position(),
            Some(GridCoord::new(4, 4))
        );
    }

    #[test]
    fn untraversable_and_out_of_bounds_destinations_are_rejected() {
        let (mut world, _log) = new_world();
        let a = deployed_unit(&mut world, "alpha", GridCoord::new(0, 0));
        let b = deployed_unit(&mut world, "bravo", GridCoord::new(5, 5));
        world
            .set_traversable(GridCoord::new(0, 1), false)
            .expect("in bounds");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: a,
                to: GridCoord::new(0, 1),
                facing: Orientation::South,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StageMove {
                unit: b,
                to: GridCoord::new(10, 5),
                facing: Orientation::East,
            },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::CommitTurn, &mut events);
        assert!(events.contains(&Event::MoveRejected {
            unit: a,
            reason: WorldError::Blocked { x: 0, y: 1 },
        }));
        assert!(events.contains(&Event::MoveRejected {
            unit: b,
            reason: WorldError::OutOfBounds { x: 10, y: 5 },
        }));
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(0, 0)), Some(a));
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(5, 5)), Some(b));
    }

    #[test]
    fn staging_unknown_or_undeployed_units_is_rejected() {
        let (mut world, _log) = new_world();
        let ghost = UnitId::new(42);
        let undeployed = world.register_unit(foot_spec("reserve"));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: ghost,
                to: GridCoord::new(0, 0),
                facing: Orientation::North,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StageMove {
                unit: undeployed,
                to: GridCoord::new(0, 0),
                facing: Orientation::North,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::MoveRejected {
                    unit: ghost,
                    reason: WorldError::NotFound { unit: ghost },
                },
                Event::MoveRejected {
                    unit: undeployed,
                    reason: WorldError::NotFound { unit: undeployed },
                },
            ]
        );
        assert!(query::active_units(&world).is_empty());
    }

    #[test]
    fn turning_in_place_updates_facing_only() {
        let (mut world, _log) = new_world();
        let at = GridCoord::new(4, 4);
        let id = deployed_unit(&mut world, "alpha", at);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StageMove {
                unit: id,
                to: at,
                facing: Orientation::South,
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::CommitTurn, &mut events);

        assert_eq!(
            events,
            vec![
                Event::UnitMoved {
                    unit: id,
                    from: at,
                    to: at,
                    facing: Orientation::South,
                },
                Event::TurnCommitted {
                    moved: 1,
                    rejected: 0,
                },
            ]
        );
        let unit = query::unit(&world, id).expect("registered");
        assert_eq!(unit.orientation(), Orientation::South);
        assert_eq!(query::grid(&world).unit_at(at), Some(id));
    }

    #[test]
    fn deploy_validates_before_moving_the_unit() {
        let (mut world, _log) = new_world();
        let a = deployed_unit(&mut world, "alpha", GridCoord::new(0, 0));
        let b = world.register_unit(foot_spec("bravo"));

        assert_eq!(
            world.deploy_unit(b, GridCoord::new(0, 0)),
            Err(WorldError::Blocked { x: 0, y: 0 })
        );
        assert_eq!(
            world.deploy_unit(b, GridCoord::new(10, 10)),
            Err(WorldError::OutOfBounds { x: 10, y: 10 })
        );
        assert_eq!(
            query::unit(&world, b).expect("registered").position(),
            None
        );

        // Redeploying an already placed unit vacates its old cell.
        world
            .deploy_unit(a, GridCoord::new(2, 0))
            .expect("redeploy succeeds");
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(0, 0)), None);
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(2, 0)), Some(a));

        // Withdrawing keeps the unit registered but off the grid.
        world.withdraw_unit(a).expect("alpha is registered");
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(2, 0)), None);
        assert_eq!(
            query::unit(&world, a).expect("still registered").position(),
            None
        );
    }

    #[test]
    fn clear_map_releases_tiles_and_undeploys_units() {
        let (mut world, _log) = new_world();
        let handle = world
            .load_graphic(Path::new("grass.png"))
            .expect("load succeeds");
        world
            .set_tile(
                GridCoord::new(0, 0),
                grid::BackgroundTile::new("meadow", TerrainType::Plain).with_graphic(handle),
            )
            .expect("tile installs");
        let id = deployed_unit(&mut world, "alpha", GridCoord::new(1, 1));

        world.clear_map().expect("teardown succeeds");
        assert!(query::grid(&world).tile_at(GridCoord::new(0, 0)).is_none());
        assert_eq!(query::grid(&world).unit_at(GridCoord::new(1, 1)), None);
        assert_eq!(
            query::unit(&world, id).expect("still registered").position(),
            None
        );
        assert_eq!(
            query::graphic_ref_count(&world, handle),
            Err(WorldError::StaleGraphic),
            "last tile reference freed the graphic"
        );
    }

    #[test]
    fn scene_reports_sprites_alpha_and_cells() {
        let (mut world, _log) = new_world();
        let tile_graphic = world
            .load_graphic(Path::new("grass.png"))
            .expect("load succeeds");
        let unit_graphic = world
            .load_graphic(Path::new("rifleman.png"))
            .expect("load succeeds");
        world
            .set_tile(
                GridCoord::new(2, 3),
                grid::BackgroundTile::new("meadow", TerrainType::Plain).with_graphic(tile_graphic),
            )
            .expect("tile installs");
        let id = deployed_unit(&mut world, "alpha", GridCoord::new(2, 3));
        world
            .assign_unit_graphic(id, unit_graphic)
            .expect("assignment succeeds");
        world.set_unit_alpha(id, 128).expect("alpha set");

        let scene = query::scene(&world);
        assert_eq!(scene.tiles.len(), 1);
        assert_eq!(scene.tiles[0].at, GridCoord::new(2, 3));
        assert_eq!(scene.units.len(), 1);
        assert_eq!(scene.units[0].at, GridCoord::new(2, 3));
        assert_eq!(scene.units[0].alpha, 128);
        assert_ne!(scene.units[0].sprite, scene.tiles[0].sprite);
    }
}
