//! Unit state, the owning master registry and the per-turn active list.

use std::collections::HashMap;

use grid_tactics_core::{GridCoord, Orientation, UnitClass, UnitId, WorldError, ALPHA_OPAQUE};

use crate::graphics::GraphicHandle;

/// Destination and facing recorded on a unit until the turn commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedMove {
    to: GridCoord,
    facing: Orientation,
}

impl StagedMove {
    pub(crate) const fn new(to: GridCoord, facing: Orientation) -> Self {
        Self { to, facing }
    }

    /// Destination cell recorded for the move.
    #[must_use]
    pub const fn to(&self) -> GridCoord {
        self.to
    }

    /// Facing the unit adopts at the destination.
    #[must_use]
    pub const fn facing(&self) -> Orientation {
        self.facing
    }
}

/// Presentation state owned by a single unit.
///
/// The shared handle refers to an entry in the world's graphic store and
/// may back any number of units at once; the alpha value is this unit's
/// own blending factor, opaque by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitGraphic {
    shared: Option<GraphicHandle>,
    alpha: u8,
}

impl UnitGraphic {
    pub(crate) const fn new() -> Self {
        Self {
            shared: None,
            alpha: ALPHA_OPAQUE,
        }
    }

    /// Shared graphic backing the unit, if one was assigned.
    #[must_use]
    pub const fn shared(&self) -> Option<GraphicHandle> {
        self.shared
    }

    /// Alpha blending value, 0 transparent through 255 opaque.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }

    pub(crate) fn set_shared(&mut self, shared: Option<GraphicHandle>) {
        self.shared = shared;
    }

    pub(crate) fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }
}

/// Blueprint describing a unit to be registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSpec {
    name: String,
    class: UnitClass,
    speed: i32,
    orientation: Orientation,
    max_movement_distance: u32,
    field_of_view: u32,
    sight_distance: u32,
}

impl UnitSpec {
    /// Creates a blueprint facing north with single-tile defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, class: UnitClass, speed: i32) -> Self {
        Self {
            name: name.into(),
            class,
            speed,
            orientation: Orientation::North,
            max_movement_distance: 1,
            field_of_view: 1,
            sight_distance: 1,
        }
    }

    /// Overrides the initial facing.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Overrides the total distance the unit may move per turn.
    #[must_use]
    pub fn with_max_movement_distance(mut self, distance: u32) -> Self {
        self.max_movement_distance = distance;
        self
    }

    /// Overrides how far from its facing the unit can see.
    #[must_use]
    pub fn with_field_of_view(mut self, field_of_view: u32) -> Self {
        self.field_of_view = field_of_view;
        self
    }

    /// Overrides how far along its facing the unit can see.
    #[must_use]
    pub fn with_sight_distance(mut self, sight_distance: u32) -> Self {
        self.sight_distance = sight_distance;
        self
    }
}

/// Mobile unit tracked by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    id: UnitId,
    name: String,
    class: UnitClass,
    position: Option<GridCoord>,
    staged: Option<StagedMove>,
    speed: i32,
    orientation: Orientation,
    max_movement_distance: u32,
    field_of_view: u32,
    sight_distance: u32,
    graphic: UnitGraphic,
}

impl Unit {
    fn from_spec(id: UnitId, spec: UnitSpec) -> Self {
        Self {
            id,
            name: spec.name,
            class: spec.class,
            position: None,
            staged: None,
            speed: spec.speed,
            orientation: spec.orientation,
            max_movement_distance: spec.max_movement_distance,
            field_of_view: spec.field_of_view,
            sight_distance: spec.sight_distance,
            graphic: UnitGraphic::new(),
        }
    }

    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Display name of the unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class of the unit as a family/subclass pair.
    #[must_use]
    pub const fn class(&self) -> UnitClass {
        self.class
    }

    /// Cell the unit currently occupies; `None` while off the grid.
    #[must_use]
    pub const fn position(&self) -> Option<GridCoord> {
        self.position
    }

    /// Move recorded for the pending turn, if any.
    #[must_use]
    pub const fn staged(&self) -> Option<StagedMove> {
        self.staged
    }

    /// Whether the unit has an uncommitted staged move.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.staged.is_some()
    }

    /// Speed the unit moves over tiles; higher speed dampens modifiers.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Current absolute facing.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Total distance the unit may move in a single turn.
    #[must_use]
    pub const fn max_movement_distance(&self) -> u32 {
        self.max_movement_distance
    }

    /// How far from its facing the unit can see.
    #[must_use]
    pub const fn field_of_view(&self) -> u32 {
        self.field_of_view
    }

    /// How far along its facing the unit can see.
    #[must_use]
    pub const fn sight_distance(&self) -> u32 {
        self.sight_distance
    }

    /// Presentation state owned by the unit.
    #[must_use]
    pub const fn graphic(&self) -> &UnitGraphic {
        &self.graphic
    }

    pub(crate) fn set_position(&mut self, position: Option<GridCoord>) {
        self.position = position;
    }

    pub(crate) fn stage(&mut self, to: GridCoord, facing: Orientation) {
        self.staged = Some(StagedMove::new(to, facing));
    }

    pub(crate) fn clear_staged(&mut self) {
        self.staged = None;
    }

    pub(crate) fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub(crate) fn graphic_mut(&mut self) -> &mut UnitGraphic {
        &mut self.graphic
    }
}

/// Owning registry of all live units plus the non-owning active list.
///
/// The registry is the master list: it owns every unit and allocates ids
/// monotonically, never reusing one. The active list tracks the subset of
/// units that changed this turn by id only; removing an entry never frees
/// the unit it names.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    slots: HashMap<UnitId, usize>,
    next_id: u64,
    active: Vec<UnitId>,
}

impl UnitRegistry {
    /// Creates an empty registry with a reset identifier counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new unit, assigning it the next identifier.
    pub fn register(&mut self, spec: UnitSpec) -> UnitId {
        let id = UnitId::new(self.next_id);
        self.next_id += 1;
        let _ = self.slots.insert(id, self.units.len());
        self.units.push(Unit::from_spec(id, spec));
        id
    }

    /// Unlinks a unit, transferring ownership to the caller.
    ///
    /// Constant time via swap-remove; the active list is purged of the id
    /// so no stale reference survives the removal.
    pub fn remove(&mut self, id: UnitId) -> Result<Unit, WorldError> {
        let index = self
            .slots
            .remove(&id)
            .ok_or(WorldError::NotFound { unit: id })?;
        let unit = self.units.swap_remove(index);
        if let Some(moved) = self.units.get(index) {
            let _ = self.slots.insert(moved.id(), index);
        }
        let _ = self.active_remove(id);
        Ok(unit)
    }

    /// Unit with the provided id, if registered.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.slots.get(&id).and_then(|index| self.units.get(*index))
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let index = *self.slots.get(&id)?;
        self.units.get_mut(index)
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the registry holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterator over every registered unit in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Appends a unit to the active list, once.
    ///
    /// A unit already on the list keeps its original position.
    pub fn active_add(&mut self, id: UnitId) -> Result<(), WorldError> {
        if !self.slots.contains_key(&id) {
            return Err(WorldError::NotFound { unit: id });
        }
        if !self.active.contains(&id) {
            self.active.push(id);
        }
        Ok(())
    }

    /// Drops a unit from the active list without touching the unit.
    ///
    /// The insertion order of the remaining entries is preserved. Returns
    /// whether the id was present.
    pub fn active_remove(&mut self, id: UnitId) -> bool {
        let before = self.active.len();
        self.active.retain(|candidate| *candidate != id);
        self.active.len() != before
    }

    /// Units that changed this turn, in insertion order.
    #[must_use]
    pub fn active(&self) -> &[UnitId] {
        &self.active
    }

    pub(crate) fn take_active(&mut self) -> Vec<UnitId> {
        std::mem::take(&mut self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_tactics_core::UnitFamily;

    fn spec(name: &str) -> UnitSpec {
        UnitSpec::new(name, UnitClass::new(UnitFamily::Foot, 0), 2)
    }

    #[test]
    fn identifiers_are_monotonic_and_never_reused() {
        let mut registry = UnitRegistry::new();
        let first = registry.register(spec("alpha"));
        let second = registry.register(spec("bravo"));
        assert_eq!(first, UnitId::new(0));
        assert_eq!(second, UnitId::new(1));

        let _ = registry.remove(first).expect("alpha is registered");
        let third = registry.register(spec("charlie"));
        assert_eq!(third, UnitId::new(2), "removed ids stay retired");
    }

    #[test]
    fn swap_remove_keeps_remaining_lookups_intact() {
        let mut registry = UnitRegistry::new();
        let a = registry.register(spec("alpha"));
        let b = registry.register(spec("bravo"));
        let c = registry.register(spec("charlie"));

        let removed = registry.remove(a).expect("alpha is registered");
        assert_eq!(removed.name(), "alpha");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(b).map(Unit::name), Some("bravo"));
        assert_eq!(registry.get(c).map(Unit::name), Some("charlie"));
        assert_eq!(registry.remove(a), Err(WorldError::NotFound { unit: a }));
    }

    #[test]
    fn active_removal_preserves_order_and_leaves_units_alive() {
        let mut registry = UnitRegistry::new();
        let a = registry.register(spec("alpha"));
        let b = registry.register(spec("bravo"));
        let c = registry.register(spec("charlie"));

        registry.active_add(a).expect("alpha is registered");
        registry.active_add(b).expect("bravo is registered");
        registry.active_add(c).expect("charlie is registered");

        assert!(registry.active_remove(a));
        assert_eq!(registry.active(), &[b, c]);
        assert!(!registry.active_remove(a), "second removal finds nothing");

        // The master list never noticed.
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(a).map(Unit::name), Some("alpha"));
    }

    #[test]
    fn active_add_deduplicates_and_rejects_unknown_ids() {
        let mut registry = UnitRegistry::new();
        let a = registry.register(spec("alpha"));

        registry.active_add(a).expect("alpha is registered");
        registry.active_add(a).expect("repeat add is a no-op");
        assert_eq!(registry.active(), &[a]);

        let ghost = UnitId::new(99);
        assert_eq!(
            registry.active_add(ghost),
            Err(WorldError::NotFound { unit: ghost })
        );
    }

    #[test]
    fn removing_a_unit_purges_it_from_the_active_list() {
        let mut registry = UnitRegistry::new();
        let a = registry.register(spec("alpha"));
        let b = registry.register(spec("bravo"));
        registry.active_add(a).expect("alpha is registered");
        registry.active_add(b).expect("bravo is registered");

        let _ = registry.remove(a).expect("alpha is registered");
        assert_eq!(registry.active(), &[b]);
    }

    #[test]
    fn units_start_undirty_off_grid_and_opaque() {
        let mut registry = UnitRegistry::new();
        let id = registry.register(spec("alpha").with_orientation(Orientation::East));
        let unit = registry.get(id).expect("registered");

        assert_eq!(unit.position(), None);
        assert!(!unit.is_dirty());
        assert_eq!(unit.orientation(), Orientation::East);
        assert_eq!(unit.graphic().alpha(), ALPHA_OPAQUE);
        assert_eq!(unit.graphic().shared(), None);
    }
}
