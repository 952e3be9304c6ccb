//! Spatial grid of cells holding unit occupancy and owned terrain tiles.

use grid_tactics_core::{GridBounds, GridCoord, TerrainType, UnitId, WorldError};

use crate::graphics::GraphicHandle;

/// Terrain tile forming the background of a single cell.
///
/// Owned exclusively by the cell that holds it. The graphic handle refers
/// to a shared entry in the world's graphic store; acquisition and release
/// bookkeeping happens where tiles enter and leave the world, never here.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundTile {
    graphic: Option<GraphicHandle>,
    label: String,
    terrain: TerrainType,
    elevation: i32,
    water_depth: u32,
    movement_modifier: i32,
}

impl BackgroundTile {
    /// Creates a tile with no graphic, sea-level elevation and dry ground.
    #[must_use]
    pub fn new(label: impl Into<String>, terrain: TerrainType) -> Self {
        Self {
            graphic: None,
            label: label.into(),
            terrain,
            elevation: 0,
            water_depth: 0,
            movement_modifier: 0,
        }
    }

    /// Attaches a shared graphic to the tile.
    #[must_use]
    pub fn with_graphic(mut self, graphic: GraphicHandle) -> Self {
        self.graphic = Some(graphic);
        self
    }

    /// Overrides the height above sea level.
    #[must_use]
    pub fn with_elevation(mut self, elevation: i32) -> Self {
        self.elevation = elevation;
        self
    }

    /// Overrides the depth of water across the tile.
    #[must_use]
    pub fn with_water_depth(mut self, water_depth: u32) -> Self {
        self.water_depth = water_depth;
        self
    }

    /// Overrides the additive movement cost adjustment.
    #[must_use]
    pub fn with_movement_modifier(mut self, movement_modifier: i32) -> Self {
        self.movement_modifier = movement_modifier;
        self
    }

    /// Shared graphic backing the tile, if one was attached.
    #[must_use]
    pub const fn graphic(&self) -> Option<GraphicHandle> {
        self.graphic
    }

    /// Text shown when information about the tile is displayed.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Ground classification of the tile.
    #[must_use]
    pub const fn terrain(&self) -> TerrainType {
        self.terrain
    }

    /// Height above sea level; negative below it.
    #[must_use]
    pub const fn elevation(&self) -> i32 {
        self.elevation
    }

    /// Depth of water across the tile, zero for dry ground.
    #[must_use]
    pub const fn water_depth(&self) -> u32 {
        self.water_depth
    }

    /// Additive adjustment applied to movement cost onto this tile.
    #[must_use]
    pub const fn movement_modifier(&self) -> i32 {
        self.movement_modifier
    }
}

/// One cell of the tactical grid.
///
/// Holds at most one unit reference and one owned background tile. Fresh
/// cells are traversable until map construction says otherwise.
#[derive(Clone, Debug)]
pub struct GridElement {
    unit: Option<UnitId>,
    tile: Option<BackgroundTile>,
    traversable: bool,
}

impl GridElement {
    pub(crate) fn new() -> Self {
        Self {
            unit: None,
            tile: None,
            traversable: true,
        }
    }

    /// Unit occupying the cell, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    /// Background tile owned by the cell, if one was assigned.
    #[must_use]
    pub const fn tile(&self) -> Option<&BackgroundTile> {
        self.tile.as_ref()
    }

    /// Whether units may enter the cell.
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        self.traversable
    }
}

/// Rectangular container mapping coordinates to cell contents.
#[derive(Debug)]
pub struct Grid {
    cells: Vec<GridElement>,
    tile_width: u32,
    tile_height: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl Grid {
    /// Allocates a grid of empty, traversable cells.
    #[must_use]
    pub fn new(tile_width: u32, tile_height: u32, tiles_x: u32, tiles_y: u32) -> Self {
        let capacity_u64 = u64::from(tiles_x) * u64::from(tiles_y);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut cells = Vec::with_capacity(capacity);
        cells.resize_with(capacity, GridElement::new);
        Self {
            cells,
            tile_width,
            tile_height,
            tiles_x,
            tiles_y,
        }
    }

    /// Extent of the grid in whole tiles.
    #[must_use]
    pub const fn bounds(&self) -> GridBounds {
        GridBounds::new(self.tiles_x, self.tiles_y)
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

    /// Cell at the provided coordinate, or `None` out of bounds.
    #[must_use]
    pub fn cell(&self, at: GridCoord) -> Option<&GridElement> {
        self.index(at).and_then(|index| self.cells.get(index))
    }

    /// Records a unit as the occupant of a cell.
    ///
    /// Fails with `OutOfBounds` outside the grid and with `Blocked` when a
    /// different unit already occupies the cell; re-placing the same unit
    /// is a no-op. The failed call mutates nothing.
    pub fn place_unit(&mut self, at: GridCoord, unit: UnitId) -> Result<(), WorldError> {
        let cell = self.cell_mut(at)?;
        match cell.unit {
            Some(occupant) if occupant != unit => Err(WorldError::Blocked {
                x: at.x(),
                y: at.y(),
            }),
            _ => {
                cell.unit = Some(unit);
                Ok(())
            }
        }
    }

    /// Clears a cell's occupant, returning whoever was there.
    pub fn remove_unit(&mut self, at: GridCoord) -> Result<Option<UnitId>, WorldError> {
        let cell = self.cell_mut(at)?;
        Ok(cell.unit.take())
    }

    /// Unit occupying the cell; `None` when empty or out of bounds.
    #[must_use]
    pub fn unit_at(&self, at: GridCoord) -> Option<UnitId> {
        self.cell(at).and_then(GridElement::unit)
    }

    /// Background tile of the cell; `None` when absent or out of bounds.
    #[must_use]
    pub fn tile_at(&self, at: GridCoord) -> Option<&BackgroundTile> {
        self.cell(at).and_then(GridElement::tile)
    }

    /// Installs a tile into a cell, returning any displaced tile so the
    /// caller can release its graphic.
    pub fn put_tile(
        &mut self,
        at: GridCoord,
        tile: BackgroundTile,
    ) -> Result<Option<BackgroundTile>, WorldError> {
        let cell = self.cell_mut(at)?;
        Ok(cell.tile.replace(tile))
    }

    /// Overrides whether units may enter the cell.
    pub fn set_traversable(&mut self, at: GridCoord, traversable: bool) -> Result<(), WorldError> {
        let cell = self.cell_mut(at)?;
        cell.traversable = traversable;
        Ok(())
    }

    /// Whether units may enter the cell; out-of-bounds cells never admit.
    #[must_use]
    pub fn is_traversable(&self, at: GridCoord) -> bool {
        self.cell(at).is_some_and(GridElement::is_traversable)
    }

    /// Resets every cell to its freshly created state, yielding the owned
    /// tiles so their graphics can be released.
    pub(crate) fn drain_tiles(&mut self) -> Vec<BackgroundTile> {
        let mut tiles = Vec::new();
        for cell in &mut self.cells {
            if let Some(tile) = cell.tile.take() {
                tiles.push(tile);
            }
            *cell = GridElement::new();
        }
        tiles
    }

    fn index(&self, at: GridCoord) -> Option<usize> {
        if at.x() < self.tiles_x && at.y() < self.tiles_y {
            let x = usize::try_from(at.x()).ok()?;
            let y = usize::try_from(at.y()).ok()?;
            let width = usize::try_from(self.tiles_x).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }

    fn cell_mut(&mut self, at: GridCoord) -> Result<&mut GridElement, WorldError> {
        let index = self.index(at).ok_or(WorldError::OutOfBounds {
            x: at.x(),
            y: at.y(),
        })?;
        self.cells.get_mut(index).ok_or(WorldError::OutOfBounds {
            x: at.x(),
            y: at.y(),
        })
    }
}
