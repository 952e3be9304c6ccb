//! Reference-counted storage for graphics shared between grid occupants.
//!
//! A loaded sprite may back any number of background tiles and unit
//! graphics at once. The [`GraphicStore`] arena tracks one reference count
//! per entry and destroys the underlying sprite exactly once, precisely
//! when a release drops the count from one to zero. Handles carry a
//! generation counter so a handle that outlives its entry is detected as
//! stale instead of resurrecting a recycled slot.

use std::fmt;
use std::path::{Path, PathBuf};

use grid_tactics_core::{SpriteHandle, WorldError};
use thiserror::Error;

/// Failure produced while decoding a sprite file.
#[derive(Debug, Error)]
#[error("sprite `{}` could not be decoded: {message}", .path.display())]
pub struct LoadError {
    path: PathBuf,
    message: String,
}

impl LoadError {
    /// Creates a new decode failure for the provided file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// File that failed to decode.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loader-provided description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure produced while converting a decoded sprite to display format.
#[derive(Debug, Error)]
#[error("sprite could not be converted to display format: {message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    /// Creates a new conversion failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Loader-provided description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Distinct failure kinds of the two-stage asset pipeline.
///
/// Decode and display-conversion failures are never collapsed; callers may
/// react differently, e.g. by substituting a fallback resource.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The sprite file could not be decoded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The decoded sprite could not be converted for display.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// External collaborator that decodes sprite files and owns sprite memory.
///
/// The engine calls this trait only from [`GraphicStore`] and propagates
/// the two failure kinds unchanged. `destroy_sprite` is invoked exactly
/// once per sprite the loader issued.
pub trait AssetLoader: fmt::Debug {
    /// Decodes the sprite file at `path` into a new sprite.
    fn load_sprite(&mut self, path: &Path) -> Result<SpriteHandle, LoadError>;

    /// Converts a decoded sprite into display format, yielding a new
    /// sprite and leaving the input sprite untouched.
    fn convert_for_display(&mut self, sprite: SpriteHandle) -> Result<SpriteHandle, ConvertError>;

    /// Frees the memory behind a sprite.
    fn destroy_sprite(&mut self, sprite: SpriteHandle);
}

/// Handle to an entry in the [`GraphicStore`].
///
/// Handles are plain copyable values; the store owns the reference count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphicHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry {
    sprite: SpriteHandle,
    ref_count: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena of shared graphic resources with explicit reference counts.
#[derive(Debug)]
pub struct GraphicStore {
    loader: Box<dyn AssetLoader>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl GraphicStore {
    /// Creates an empty store backed by the provided asset loader.
    #[must_use]
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Loads a sprite file and stores it as a new graphic entry.
    ///
    /// Runs the loader's two-stage pipeline: decode, then convert to
    /// display format. The intermediate decoded sprite is destroyed once
    /// conversion finishes either way. New entries start with a reference
    /// count of zero; holders must [`acquire`](Self::acquire) before
    /// storing the handle.
    pub fn load(&mut self, path: &Path) -> Result<GraphicHandle, AssetError> {
        let decoded = self.loader.load_sprite(path)?;
        let converted = match self.loader.convert_for_display(decoded) {
            Ok(sprite) => sprite,
            Err(error) => {
                self.loader.destroy_sprite(decoded);
                return Err(error.into());
            }
        };
        self.loader.destroy_sprite(decoded);

        let handle = self.insert(converted);
        log::debug!("loaded sprite {} into graphic slot {}", path.display(), handle.index);
        Ok(handle)
    }

    /// Increments the reference count and returns the handle for storage.
    pub fn acquire(&mut self, handle: GraphicHandle) -> Result<GraphicHandle, WorldError> {
        let entry = self.entry_mut(handle)?;
        entry.ref_count += 1;
        Ok(handle)
    }

    /// Decrements the reference count, destroying the sprite on one-to-zero.
    ///
    /// Releasing an entry whose count is already zero fails with
    /// [`WorldError::DoubleRelease`] and mutates nothing. When the count
    /// reaches zero the sprite is destroyed, the slot is recycled and its
    /// generation bumps so outstanding handles turn stale.
    pub fn release(&mut self, handle: GraphicHandle) -> Result<(), WorldError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(WorldError::StaleGraphic)?;
        let Some(entry) = slot.entry.as_mut() else {
            return Err(WorldError::StaleGraphic);
        };

        if entry.ref_count == 0 {
            return Err(WorldError::DoubleRelease);
        }
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(());
        }

        let retired = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(entry) = retired {
            self.loader.destroy_sprite(entry.sprite);
        }
        self.free.push(handle.index);
        Ok(())
    }

    /// Sprite behind the entry, for handing to the renderer collaborator.
    pub fn sprite(&self, handle: GraphicHandle) -> Result<SpriteHandle, WorldError> {
        Ok(self.entry(handle)?.sprite)
    }

    /// Current reference count of the entry.
    pub fn ref_count(&self, handle: GraphicHandle) -> Result<u32, WorldError> {
        Ok(self.entry(handle)?.ref_count)
    }

    /// Number of live entries in the store.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    fn insert(&mut self, sprite: SpriteHandle) -> GraphicHandle {
        let entry = Entry {
            sprite,
            ref_count: 0,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                GraphicHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                GraphicHandle {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn entry(&self, handle: GraphicHandle) -> Result<&Entry, WorldError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(WorldError::StaleGraphic)
    }

    fn entry_mut(&mut self, handle: GraphicHandle) -> Result<&mut Entry, WorldError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(WorldError::StaleGraphic)
    }
}

impl Drop for GraphicStore {
    fn drop(&mut self) {
        for slot in std::mem::take(&mut self.slots) {
            if let Some(entry) = slot.entry {
                self.loader.destroy_sprite(entry.sprite);
            }
        }
    }
}

/// Loader that issues synthetic sprites without touching the filesystem.
///
/// Backs adapters and tests that exercise the engine without a real
/// decoder; every requested path "decodes" into the next sequential
/// handle.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    issued: u64,
}

impl HeadlessLoader {
    /// Creates a loader with a reset handle counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self) -> SpriteHandle {
        self.issued += 1;
        SpriteHandle::new(self.issued)
    }
}

impl AssetLoader for HeadlessLoader {
    fn load_sprite(&mut self, _path: &Path) -> Result<SpriteHandle, LoadError> {
        Ok(self.issue())
    }

    fn convert_for_display(&mut self, _sprite: SpriteHandle) -> Result<SpriteHandle, ConvertError> {
        Ok(self.issue())
    }

    fn destroy_sprite(&mut self, _sprite: SpriteHandle) {}
}
