#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for grid-tactics adapters.
//!
//! Holds everything a rendering backend needs that is not authoritative
//! world state: the caller-owned [`Viewport`], the pure grid/screen
//! coordinate transforms with their boundary semantics, and the
//! [`Presentation`] payload backends draw each frame. Backends own the
//! window and the pixels; nothing here blits.

use anyhow::Result as AnyResult;
use grid_tactics_core::{GridBounds, GridCoord, SpriteHandle};
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportError {
    /// Tile dimensions must be positive to avoid division by zero in the
    /// coordinate transforms.
    #[error("tile dimensions {tile_width}x{tile_height} must be positive")]
    InvalidTileSize {
        /// Provided tile width that failed validation.
        tile_width: i32,
        /// Provided tile height that failed validation.
        tile_height: i32,
    },
}

/// Caller-owned window configuration and scroll state.
///
/// The engine treats this as read-only input each frame; it never owns the
/// window or video-surface lifecycle. The scroll offset is expressed in
/// whole tiles: the cell at `(scroll_x, scroll_y)` renders at the window's
/// top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    width: i32,
    height: i32,
    tile_width: i32,
    tile_height: i32,
    scroll_x: i32,
    scroll_y: i32,
    tiles_per_screen_x: i32,
    tiles_per_screen_y: i32,
}

impl Viewport {
    /// Creates a viewport anchored at the grid origin.
    ///
    /// The tiles-per-screen counts are derived from the window and tile
    /// dimensions. Fails when either tile dimension is not positive.
    pub fn new(
        width: i32,
        height: i32,
        tile_width: i32,
        tile_height: i32,
    ) -> Result<Self, ViewportError> {
        if tile_width <= 0 || tile_height <= 0 {
            return Err(ViewportError::InvalidTileSize {
                tile_width,
                tile_height,
            });
        }
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            scroll_x: 0,
            scroll_y: 0,
            tiles_per_screen_x: width / tile_width,
            tiles_per_screen_y: height / tile_height,
        })
    }

    /// Width of the window in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the window in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Width of a single tile in pixels.
    #[must_use]
    pub const fn tile_width(&self) -> i32 {
        self.tile_width
    }

    /// Height of a single tile in pixels.
    #[must_use]
    pub const fn tile_height(&self) -> i32 {
        self.tile_height
    }

    /// Grid x coordinate rendered at the window's left edge.
    #[must_use]
    pub const fn scroll_x(&self) -> i32 {
        self.scroll_x
    }

    /// Grid y coordinate rendered at the window's top edge.
    #[must_use]
    pub const fn scroll_y(&self) -> i32 {
        self.scroll_y
    }

    /// Number of whole tiles that fit across the window.
    #[must_use]
    pub const fn tiles_per_screen_x(&self) -> i32 {
        self.tiles_per_screen_x
    }

    /// Number of whole tiles that fit down the window.
    #[must_use]
    pub const fn tiles_per_screen_y(&self) -> i32 {
        self.tiles_per_screen_y
    }

    /// Shifts the scroll offset by whole tiles, clamped so the window
    /// never scrolls past the edge of the grid.
    pub fn scroll_by(&mut self, dx: i32, dy: i32, bounds: GridBounds) {
        let max_x = (bounds.tiles_x() as i32 - self.tiles_per_screen_x).max(0);
        let max_y = (bounds.tiles_y() as i32 - self.tiles_per_screen_y).max(0);
        self.scroll_x = (self.scroll_x + dx).clamp(0, max_x);
        self.scroll_y = (self.scroll_y + dy).clamp(0, max_y);
    }
}

/// Whether a transformed coordinate landed inside the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowStatus {
    /// The pixel coordinate is visible in the window.
    InWindow,
    /// The pixel coordinate falls outside the window.
    OutOfWindow,
}

/// Whether a transformed coordinate landed on a valid grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridStatus {
    /// The coordinate names a valid grid cell.
    OnGrid,
    /// The coordinate lies outside the grid.
    OffGrid,
}

/// Projects a grid coordinate onto window pixel coordinates.
///
/// The pixel position is the top-left corner of the cell's box after the
/// scroll offset is applied. The status reports whether that position is
/// visible; callers keep the raw position either way.
#[must_use]
pub fn grid_to_screen(viewport: &Viewport, at: GridCoord) -> (i32, i32, WindowStatus) {
    let sx = (at.x() as i32 - viewport.scroll_x()) * viewport.tile_width();
    let sy = (at.y() as i32 - viewport.scroll_y()) * viewport.tile_height();

    let status = if sx < 0 || sx > viewport.width() || sy < 0 || sy > viewport.height() {
        WindowStatus::OutOfWindow
    } else {
        WindowStatus::InWindow
    };
    (sx, sy, status)
}

/// Projects a window pixel coordinate back onto the grid.
///
/// A pixel may land anywhere inside a cell's box; flooring the division
/// recovers the cell index before the scroll offset is re-applied. The
/// status reports whether the result names a valid cell; callers keep the
/// raw coordinates either way.
#[must_use]
pub fn screen_to_grid(
    viewport: &Viewport,
    bounds: GridBounds,
    sx: i32,
    sy: i32,
) -> (i32, i32, GridStatus) {
    let gx = sx.div_euclid(viewport.tile_width()) + viewport.scroll_x();
    let gy = sy.div_euclid(viewport.tile_height()) + viewport.scroll_y();

    let status = if gx < 0 || gx >= bounds.tiles_x() as i32 || gy < 0 || gy >= bounds.tiles_y() as i32
    {
        GridStatus::OffGrid
    } else {
        GridStatus::OnGrid
    };
    (gx, gy, status)
}

/// Projects a window pixel coordinate onto a grid cell, or `None` when it
/// misses the grid.
#[must_use]
pub fn screen_to_cell(
    viewport: &Viewport,
    bounds: GridBounds,
    sx: i32,
    sy: i32,
) -> Option<GridCoord> {
    match screen_to_grid(viewport, bounds, sx, sy) {
        (gx, gy, GridStatus::OnGrid) => Some(GridCoord::new(gx as u32, gy as u32)),
        _ => None,
    }
}

/// Sprite placement for a background tile within the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileInstance {
    /// Grid cell the tile occupies.
    pub cell: GridCoord,
    /// Display-ready sprite backing the tile.
    pub sprite: SpriteHandle,
}

/// Sprite placement for a unit within the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitInstance {
    /// Grid cell the unit occupies.
    pub cell: GridCoord,
    /// Display-ready sprite backing the unit.
    pub sprite: SpriteHandle,
    /// Alpha blending value, 0 transparent through 255 opaque.
    pub alpha: u8,
}

/// Scene content a backend draws each frame, in grid coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene {
    /// Background tiles in row-major order.
    pub tiles: Vec<TileInstance>,
    /// Units drawn above the tiles.
    pub units: Vec<UnitInstance>,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Window configuration and scroll state.
    pub viewport: Viewport,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, viewport: Viewport, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            viewport,
            scene,
        }
    }
}

/// Scroll request translated from raw input by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Scroll one tile toward decreasing x.
    Left,
    /// Scroll one tile toward increasing x.
    Right,
    /// Scroll one tile toward decreasing y.
    Up,
    /// Scroll one tile toward increasing y.
    Down,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Scroll request detected on this frame, if any.
    pub scroll: Option<ScrollDirection>,
    /// Cursor position in window pixels, if the cursor is inside.
    pub cursor: Option<(i32, i32)>,
    /// Whether the user asked to quit on this frame.
    pub quit_requested: bool,
}

/// Rendering backend capable of presenting grid-tactics scenes.
pub trait RenderingBackend {
    /// Runs the backend until it is requested to exit.
    ///
    /// The `update` closure receives the input captured by the adapter
    /// each frame and may mutate the presentation (scroll the viewport,
    /// swap the scene) before it is drawn.
    fn run<F>(self, presentation: Presentation, update: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Presentation) + 'static;
}
