//! The ordered set of loaded overlays and the active selection.

use super::{OverlayError, OverlayImage, OverlayRecord, SourceImage};
use crate::config::OverlayDefaults;
use crate::geometry::{Corner, Point};

/// Loaded overlays in paint order (last on top).
///
/// Exactly one image is active whenever the stack is non-empty. Panel
/// edits go to the active image; images are only removed by [`remove`].
///
/// [`remove`]: OverlayStack::remove
#[derive(Debug, Clone, Default)]
pub struct OverlayStack {
    images: Vec<OverlayImage>,
    active: Option<usize>,
    defaults: OverlayDefaults,
    next_id: u64,
}

impl OverlayStack {
    pub fn new(defaults: OverlayDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Add a committed sketch on top and select it. Returns its id.
    pub fn add(&mut self, source: SourceImage) -> String {
        let id = self.fresh_id();
        self.images
            .push(OverlayImage::new(id.clone(), source, &self.defaults));
        self.active = Some(self.images.len() - 1);
        log::debug!("Added overlay {id}");
        id
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("sketch-{}", self.next_id);
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    /// Delete an image. If it was active, its neighbour below (or the new
    /// bottom image) becomes active.
    pub fn remove(&mut self, id: &str) -> Result<OverlayImage, OverlayError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| OverlayError::UnknownImage(id.to_string()))?;
        let removed = self.images.remove(index);

        self.active = match self.active {
            _ if self.images.is_empty() => None,
            Some(active) if active == index => Some(index.saturating_sub(1)),
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        log::debug!("Removed overlay {id}");
        Ok(removed)
    }

    pub fn select(&mut self, id: &str) -> Result<(), OverlayError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| OverlayError::UnknownImage(id.to_string()))?;
        self.active = Some(index);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&OverlayImage> {
        self.images.iter().find(|img| img.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut OverlayImage> {
        self.images.iter_mut().find(|img| img.id() == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.images.iter().position(|img| img.id() == id)
    }

    pub fn active(&self) -> Option<&OverlayImage> {
        self.active.and_then(|i| self.images.get(i))
    }

    pub fn active_mut(&mut self) -> Result<&mut OverlayImage, OverlayError> {
        self.active
            .and_then(|i| self.images.get_mut(i))
            .ok_or(OverlayError::NoActiveImage)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|img| img.id())
    }

    pub fn images(&self) -> &[OverlayImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn defaults(&self) -> &OverlayDefaults {
        &self.defaults
    }

    // Panel edits on the active image.

    pub fn set_opacity(&mut self, opacity: f64) -> Result<(), OverlayError> {
        self.active_mut()?.set_opacity(opacity);
        Ok(())
    }

    pub fn set_grayscale(&mut self, grayscale: bool) -> Result<(), OverlayError> {
        self.active_mut()?.set_grayscale(grayscale);
        Ok(())
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), OverlayError> {
        self.active_mut()?.set_scale(scale)
    }

    pub fn set_rotation(&mut self, rotation: f64) -> Result<(), OverlayError> {
        self.active_mut()?.set_rotation(rotation)
    }

    pub fn reset_transform(&mut self) -> Result<(), OverlayError> {
        self.active_mut()?.reset_transform();
        Ok(())
    }

    pub fn enter_warp(&mut self) -> Result<(), OverlayError> {
        self.active_mut()?.enter_warp()
    }

    pub fn exit_warp(&mut self) -> Result<(), OverlayError> {
        self.active_mut()?.exit_warp()
    }

    pub fn reset_warp(&mut self) -> Result<(), OverlayError> {
        self.active_mut()?.reset_warp()
    }

    pub fn move_corner(&mut self, corner: Corner, position: Point) -> Result<(), OverlayError> {
        self.active_mut()?.move_corner(corner, position)
    }

    pub fn set_natural_size(&mut self, id: &str, width: u32, height: u32) -> Result<(), OverlayError> {
        let image = self
            .get_mut(id)
            .ok_or_else(|| OverlayError::UnknownImage(id.to_string()))?;
        image.set_natural_size(width, height);
        Ok(())
    }

    pub fn to_records(&self) -> Vec<OverlayRecord> {
        self.images.iter().map(OverlayRecord::from).collect()
    }

    /// Replace the stack with loaded records.
    ///
    /// Invalid records and duplicate ids are skipped with a warning; the top
    /// image becomes active.
    pub fn load_records(&mut self, records: Vec<OverlayRecord>) {
        self.images.clear();
        for record in records {
            let id = record.id.clone();
            if self.index_of(&id).is_some() {
                log::warn!("Skipping duplicate overlay record {id}");
                continue;
            }
            match record.into_image() {
                Ok(image) => self.images.push(image),
                Err(e) => log::warn!("Skipping overlay record: {e}"),
            }
        }
        self.active = self.images.len().checked_sub(1);
    }

    pub fn from_records(defaults: OverlayDefaults, records: Vec<OverlayRecord>) -> Self {
        let mut stack = Self::new(defaults);
        stack.load_records(records);
        stack
    }
}
