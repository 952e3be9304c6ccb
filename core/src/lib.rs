#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid-tactics engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and pure systems: coordinates, identifiers, the
//! terrain and unit-class encodings, the [`Command`] values adapters submit
//! to drive the turn flow, the [`Event`] values the world broadcasts after
//! processing them, and the recoverable [`WorldError`] taxonomy. Every
//! failure in that taxonomy is validated before any mutation occurs, so a
//! rejected operation leaves the world exactly as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Alpha blending value that renders a graphic fully opaque.
pub const ALPHA_OPAQUE: u8 = 255;

/// Unique identifier assigned to a unit.
///
/// Identifiers are allocated monotonically by the unit registry and are
/// never reused for the registry's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to a loaded, display-ready sprite.
///
/// Issued by the external asset loader; the engine stores and routes these
/// values but never interprets them. They are the only currency the
/// renderer collaborator understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteHandle(u64);

impl SpriteHandle {
    /// Creates a new sprite handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single grid cell expressed as x and y tile indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: u32,
    y: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based x index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based y index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Extent of a grid measured in whole tiles.
///
/// Valid indices satisfy `0 <= x < tiles_x` and `0 <= y < tiles_y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    tiles_x: u32,
    tiles_y: u32,
}

impl GridBounds {
    /// Creates a new bounds descriptor.
    #[must_use]
    pub const fn new(tiles_x: u32, tiles_y: u32) -> Self {
        Self { tiles_x, tiles_y }
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

    /// Reports whether the coordinate names a valid cell.
    #[must_use]
    pub const fn contains(&self, at: GridCoord) -> bool {
        at.x() < self.tiles_x && at.y() < self.tiles_y
    }
}

/// Absolute facing of a unit, one of the eight compass directions.
///
/// The discriminants form a ring: turning from one orientation to another
/// costs the shorter way around, never more than half the circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Facing decreasing y.
    North,
    /// Facing decreasing y, increasing x.
    Northeast,
    /// Facing increasing x.
    East,
    /// Facing increasing y, increasing x.
    Southeast,
    /// Facing increasing y.
    South,
    /// Facing increasing y, decreasing x.
    Southwest,
    /// Facing decreasing x.
    West,
    /// Facing decreasing y, decreasing x.
    Northwest,
}

impl Orientation {
    /// Number of compass directions on the ring.
    pub const COUNT: u8 = 8;

    /// Every orientation in ring order starting from north.
    pub const ALL: [Orientation; 8] = [
        Orientation::North,
        Orientation::Northeast,
        Orientation::East,
        Orientation::Southeast,
        Orientation::South,
        Orientation::Southwest,
        Orientation::West,
        Orientation::Northwest,
    ];

    /// Position of the orientation on the ring, north being zero.
    #[must_use]
    pub const fn index(&self) -> u8 {
        match self {
            Orientation::North => 0,
            Orientation::Northeast => 1,
            Orientation::East => 2,
            Orientation::Southeast => 3,
            Orientation::South => 4,
            Orientation::Southwest => 5,
            Orientation::West => 6,
            Orientation::Northwest => 7,
        }
    }

    /// Looks up the orientation at the provided ring position.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Orientation::North),
            1 => Some(Orientation::Northeast),
            2 => Some(Orientation::East),
            3 => Some(Orientation::Southeast),
            4 => Some(Orientation::South),
            5 => Some(Orientation::Southwest),
            6 => Some(Orientation::West),
            7 => Some(Orientation::Northwest),
            _ => None,
        }
    }

    /// Circular distance to another orientation in single turn steps.
    ///
    /// Symmetric, zero for equal orientations, at most half the ring (4).
    #[must_use]
    pub const fn turning_steps(&self, other: Orientation) -> u8 {
        let difference = self.index().abs_diff(other.index());
        if difference <= Self::COUNT - difference {
            difference
        } else {
            Self::COUNT - difference
        }
    }
}

/// Ground classification of a background tile.
///
/// Drives the terrain half of the movement cost lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    /// Open ground with no inherent obstacle.
    Plain,
    /// Soft, waterlogged ground.
    Swamp,
    /// Steep, rocky ground.
    Mountain,
    /// Flowing water.
    River,
}

impl TerrainType {
    /// Number of terrain classifications.
    pub const COUNT: usize = 4;

    /// Every terrain type in declaration order.
    pub const ALL: [TerrainType; 4] = [
        TerrainType::Plain,
        TerrainType::Swamp,
        TerrainType::Mountain,
        TerrainType::River,
    ];

    /// Dense index of the terrain type for table storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            TerrainType::Plain => 0,
            TerrainType::Swamp => 1,
            TerrainType::Mountain => 2,
            TerrainType::River => 3,
        }
    }
}

/// Broad movement family of a unit class.
///
/// Families form a closed set so that every `(family, terrain)` cost pair
/// exists by construction; an unpopulated table cell is unrepresentable
/// rather than a runtime condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitFamily {
    /// Units that travel on foot.
    Foot,
    /// Mounted or motorized ground units.
    Mounted,
    /// Units that travel on water.
    Waterborne,
}

impl UnitFamily {
    /// Number of unit families.
    pub const COUNT: usize = 3;

    /// Every family in declaration order.
    pub const ALL: [UnitFamily; 3] = [
        UnitFamily::Foot,
        UnitFamily::Mounted,
        UnitFamily::Waterborne,
    ];

    /// Wire byte identifying the family in a raw unit class.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            UnitFamily::Foot => 0x01,
            UnitFamily::Mounted => 0x02,
            UnitFamily::Waterborne => 0x03,
        }
    }

    /// Looks up the family for a wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(UnitFamily::Foot),
            0x02 => Some(UnitFamily::Mounted),
            0x03 => Some(UnitFamily::Waterborne),
            _ => None,
        }
    }

    /// Dense index of the family for table storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            UnitFamily::Foot => 0,
            UnitFamily::Mounted => 1,
            UnitFamily::Waterborne => 2,
        }
    }
}

/// Class of a unit encoded as a family/subclass byte pair.
///
/// The raw form packs the family byte into the high byte and the subclass
/// into the low byte, preserving the original wire encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitClass {
    family: UnitFamily,
    subclass: u8,
}

impl UnitClass {
    /// Creates a class from a family and a subclass discriminator.
    #[must_use]
    pub const fn new(family: UnitFamily, subclass: u8) -> Self {
        Self { family, subclass }
    }

    /// Movement family of the class.
    #[must_use]
    pub const fn family(&self) -> UnitFamily {
        self.family
    }

    /// Subclass discriminator within the family.
    #[must_use]
    pub const fn subclass(&self) -> u8 {
        self.subclass
    }

    /// Packs the class into its raw two-byte form.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        ((self.family.as_byte() as u16) << 8) | self.subclass as u16
    }

    /// Unpacks a raw two-byte class, rejecting unknown family bytes.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match UnitFamily::from_byte((raw >> 8) as u8) {
            Some(family) => Some(Self {
                family,
                subclass: (raw & 0x00ff) as u8,
            }),
            None => None,
        }
    }
}

/// Recoverable failures reported by the engine.
///
/// Every variant is detected before any mutation occurs; a failed
/// operation leaves all data structures exactly as they were. Allocation
/// failure is the only unrecoverable condition and aborts the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum WorldError {
    /// The coordinates lie outside the grid's valid index range.
    #[error("coordinates ({x}, {y}) lie outside the grid")]
    OutOfBounds {
        /// Requested x index.
        x: u32,
        /// Requested y index.
        y: u32,
    },
    /// The destination cell is untraversable or already claimed.
    #[error("cell ({x}, {y}) cannot accept the unit")]
    Blocked {
        /// Destination x index.
        x: u32,
        /// Destination y index.
        y: u32,
    },
    /// No registered (or deployed, where required) unit has this id.
    #[error("unit {unit:?} is not registered or not deployed")]
    NotFound {
        /// Identifier that failed to resolve.
        unit: UnitId,
    },
    /// A movement cost was requested for a non-positive speed.
    #[error("unit speed {speed} must be positive")]
    InvalidSpeed {
        /// Speed value that failed validation.
        speed: i32,
    },
    /// A graphic resource was released more times than it was acquired.
    #[error("graphic resource released while its reference count was zero")]
    DoubleRelease,
    /// A graphic handle refers to a slot that has been freed and reused.
    #[error("graphic handle refers to a freed resource")]
    StaleGraphic,
}

/// Commands that express the turn-flow mutations adapters may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Records a destination and facing on a unit without touching the
    /// grid; the move takes effect when the turn is committed.
    StageMove {
        /// Identifier of the unit being ordered.
        unit: UnitId,
        /// Destination cell for the move.
        to: GridCoord,
        /// Facing the unit should adopt at the destination.
        facing: Orientation,
    },
    /// Validates and applies every staged move as one batch, then clears
    /// the set of units that changed this turn.
    CommitTurn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a move order was recorded for the turn.
    MoveStaged {
        /// Identifier of the ordered unit.
        unit: UnitId,
        /// Destination cell recorded on the unit.
        to: GridCoord,
        /// Facing recorded on the unit.
        facing: Orientation,
    },
    /// Reports that a staged move was refused, leaving the unit and the
    /// grid untouched.
    MoveRejected {
        /// Identifier of the refused unit.
        unit: UnitId,
        /// Specific reason the move failed.
        reason: WorldError,
    },
    /// Confirms that a unit moved between two cells during a commit.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before the turn.
        from: GridCoord,
        /// Cell the unit occupies after the turn.
        to: GridCoord,
        /// Facing the unit adopted at the destination.
        facing: Orientation,
    },
    /// Announces that a commit finished and the active list was cleared.
    TurnCommitted {
        /// Number of units whose staged moves were applied.
        moved: u32,
        /// Number of units whose staged moves were refused.
        rejected: u32,
    },
}
