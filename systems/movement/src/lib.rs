#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure movement-cost system consumed by path planning.
//!
//! Defines the two edge weights a path search sums for each grid step: the
//! cost of moving a unit onto a tile and the cost of turning it to a new
//! facing. No state is mutated here; the world stays authoritative.

use grid_tactics_core::{Orientation, TerrainType, UnitClass, UnitFamily, WorldError};
use grid_tactics_world::grid::BackgroundTile;
use grid_tactics_world::units::Unit;

/// Dense `(family, terrain)` cost matrix.
///
/// Indexed by the closed [`UnitFamily`] and [`TerrainType`] sets, so every
/// cell exists by construction; there is no unpopulated combination for a
/// lookup to trip over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostTable {
    entries: [[i32; TerrainType::COUNT]; UnitFamily::COUNT],
}

impl CostTable {
    /// Creates a table from explicit entries, rows ordered by
    /// [`UnitFamily::ALL`] and columns by [`TerrainType::ALL`].
    #[must_use]
    pub const fn new(entries: [[i32; TerrainType::COUNT]; UnitFamily::COUNT]) -> Self {
        Self { entries }
    }

    /// The shipped tuning.
    ///
    /// Foot units suffer on rock and water, mounted units lose their edge
    /// off the plains, waterborne units only move freely on rivers.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new([
            // Plain, Swamp, Mountain, River
            [1, 3, 4, 5], // Foot
            [1, 4, 6, 6], // Mounted
            [6, 3, 8, 1], // Waterborne
        ])
    }

    /// Base cost for a family entering a terrain type.
    #[must_use]
    pub const fn cost(&self, family: UnitFamily, terrain: TerrainType) -> i32 {
        self.entries[family.index()][terrain.index()]
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Computes per-move and per-turn costs from unit and terrain data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostModel {
    table: CostTable,
}

impl CostModel {
    /// Creates a model over the provided cost table.
    #[must_use]
    pub const fn new(table: CostTable) -> Self {
        Self { table }
    }

    /// Table backing the model.
    #[must_use]
    pub const fn table(&self) -> &CostTable {
        &self.table
    }

    /// Base cost of a unit of the given class entering the terrain.
    ///
    /// Only the family half of the class participates in the lookup; the
    /// subclass refines behavior elsewhere.
    #[must_use]
    pub const fn terrain_unit_cost(&self, class: UnitClass, terrain: TerrainType) -> i32 {
        self.table.cost(class.family(), terrain)
    }

    /// Cost of moving the unit onto an adjacent tile.
    ///
    /// `(terrain_unit_cost + movement_modifier) / speed`, the division
    /// truncating toward zero. A non-positive speed fails with
    /// `InvalidSpeed` before any division happens.
    pub fn move_cost(&self, unit: &Unit, tile: &BackgroundTile) -> Result<i32, WorldError> {
        let speed = unit.speed();
        if speed <= 0 {
            return Err(WorldError::InvalidSpeed { speed });
        }
        let base = self.terrain_unit_cost(unit.class(), tile.terrain());
        Ok((base + tile.movement_modifier()) / speed)
    }

    /// Cost of turning between two facings: the circular distance around
    /// the eight compass directions, never more than 4.
    #[must_use]
    pub const fn turn_cost(from: Orientation, to: Orientation) -> u8 {
        from.turning_steps(to)
    }

    /// Combined weight of one grid step: move onto the tile plus turn to
    /// the new facing.
    pub fn step_cost(
        &self,
        unit: &Unit,
        tile: &BackgroundTile,
        facing: Orientation,
    ) -> Result<i32, WorldError> {
        let movement = self.move_cost(unit, tile)?;
        Ok(movement + i32::from(Self::turn_cost(unit.orientation(), facing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_every_family_terrain_pair() {
        let table = CostTable::standard();
        for family in UnitFamily::ALL {
            for terrain in TerrainType::ALL {
                assert!(
                    table.cost(family, terrain) > 0,
                    "{family:?} on {terrain:?} must carry a positive base cost"
                );
            }
        }
    }

    #[test]
    fn plains_are_cheapest_for_ground_families() {
        let table = CostTable::standard();
        for family in [UnitFamily::Foot, UnitFamily::Mounted] {
            for terrain in [TerrainType::Swamp, TerrainType::Mountain, TerrainType::River] {
                assert!(table.cost(family, TerrainType::Plain) < table.cost(family, terrain));
            }
        }
        assert!(
            table.cost(UnitFamily::Waterborne, TerrainType::River)
                < table.cost(UnitFamily::Waterborne, TerrainType::Plain)
        );
    }

    #[test]
    fn turn_cost_is_symmetric_zero_diagonal_and_capped_at_four() {
        for from in Orientation::ALL {
            assert_eq!(CostModel::turn_cost(from, from), 0);
            for to in Orientation::ALL {
                assert_eq!(CostModel::turn_cost(from, to), CostModel::turn_cost(to, from));
                assert!(CostModel::turn_cost(from, to) <= 4);
            }
        }
    }

    #[test]
    fn about_face_costs_half_the_ring() {
        assert_eq!(
            CostModel::turn_cost(Orientation::North, Orientation::South),
            4
        );
    }
}
