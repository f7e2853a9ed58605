//! Persisted shape of an overlay.
//!
//! Storage lives outside the core; this is only the JSON-compatible record
//! the host saves and loads. Fields added after the first release
//! (`translation`, `naturalWidth`, `naturalHeight`) are optional on load.

use serde::{Deserialize, Serialize};

use super::{clamp_opacity, OverlayError, OverlayImage, Presentation, SourceImage};
use crate::geometry::{Point, Quad};
use crate::transform::AffineParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRecord {
    pub id: String,
    pub url: String,
    pub opacity: f64,
    pub scale: f64,
    pub rotation: f64,
    pub grayscale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_corners: Option<Quad>,
    #[serde(default)]
    pub translation: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<u32>,
}

impl From<&OverlayImage> for OverlayRecord {
    fn from(image: &OverlayImage) -> Self {
        let affine = image.affine();
        let source = image.source();
        let known = |v: u32| (v > 0).then_some(v);
        Self {
            id: image.id().to_string(),
            url: source.url.clone(),
            opacity: image.opacity(),
            scale: affine.scale,
            rotation: affine.rotation,
            grayscale: image.grayscale(),
            warp_corners: image.warp_corners(),
            translation: affine.translation,
            natural_width: known(source.natural_width),
            natural_height: known(source.natural_height),
        }
    }
}

impl OverlayRecord {
    /// Validate and clamp a loaded record.
    ///
    /// # Errors
    ///
    /// `OverlayError::InvalidRecord` for an empty id or url, or non-finite
    /// numbers. Out-of-range opacity, scale and rotation are clamped.
    pub fn into_image(self) -> Result<OverlayImage, OverlayError> {
        if self.id.is_empty() {
            return Err(OverlayError::InvalidRecord("empty id".to_string()));
        }
        if self.url.is_empty() {
            return Err(OverlayError::InvalidRecord(format!("{}: empty url", self.id)));
        }
        let finite = self.opacity.is_finite()
            && self.scale.is_finite()
            && self.rotation.is_finite()
            && self.translation.is_finite()
            && self.warp_corners.map_or(true, |q| q.is_finite());
        if !finite {
            return Err(OverlayError::InvalidRecord(format!(
                "{}: non-finite value",
                self.id
            )));
        }

        let affine = AffineParams::new(self.translation, self.scale, self.rotation);
        let presentation = match self.warp_corners {
            Some(corners) => Presentation::Warped {
                corners,
                frozen: affine,
            },
            None => Presentation::Affine(affine),
        };
        let source = SourceImage::new(
            self.url,
            self.natural_width.unwrap_or(0),
            self.natural_height.unwrap_or(0),
        );
        Ok(OverlayImage::from_parts(
            self.id,
            source,
            clamp_opacity(self.opacity),
            self.grayscale,
            presentation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayDefaults;
    use crate::geometry::Corner;

    const MINIMAL: &str = r#"{
        "id": "a",
        "url": "data:image/png;base64,AAAA",
        "opacity": 0.5,
        "scale": 1.2,
        "rotation": 45,
        "grayscale": true
    }"#;

    #[test]
    fn test_minimal_record_loads() {
        let record: OverlayRecord = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(record.translation, Point::ORIGIN);
        assert_eq!(record.warp_corners, None);

        let image = record.into_image().unwrap();
        assert_eq!(image.id(), "a");
        assert_eq!(image.affine().scale, 1.2);
        assert_eq!(image.affine().rotation, 45.0);
        assert!(image.grayscale());
        assert!(!image.is_warped());
        assert_eq!(image.natural_size(), (0.0, 0.0));
    }

    #[test]
    fn test_warp_corners_json_shape() {
        let json = r#"{
            "id": "b", "url": "u", "opacity": 1, "scale": 1, "rotation": 0,
            "grayscale": false,
            "warpCorners": {
                "tl": {"x": 0, "y": 0}, "tr": {"x": 10, "y": 0},
                "br": {"x": 10, "y": 10}, "bl": {"x": 0, "y": 10}
            }
        }"#;
        let image = serde_json::from_str::<OverlayRecord>(json)
            .unwrap()
            .into_image()
            .unwrap();
        assert!(image.is_warped());
        assert_eq!(image.warp_corners(), Some(Quad::from_size(10.0, 10.0)));
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let mut record: OverlayRecord = serde_json::from_str(MINIMAL).unwrap();
        record.opacity = 0.0;
        record.scale = 9.0;
        record.rotation = 400.0;
        let image = record.into_image().unwrap();
        assert_eq!(image.opacity(), 0.1);
        assert_eq!(image.affine().scale, 3.0);
        assert_eq!(image.affine().rotation, 40.0);
    }

    #[test]
    fn test_invalid_records_rejected() {
        let mut record: OverlayRecord = serde_json::from_str(MINIMAL).unwrap();
        record.id.clear();
        assert!(matches!(
            record.into_image(),
            Err(OverlayError::InvalidRecord(_))
        ));

        let mut record: OverlayRecord = serde_json::from_str(MINIMAL).unwrap();
        record.scale = f64::NAN;
        assert!(matches!(
            record.into_image(),
            Err(OverlayError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_record_from_image_skips_absent_fields() {
        let mut image = OverlayImage::new(
            "sketch-3",
            SourceImage::new("blob:x", 0, 0),
            &OverlayDefaults::default(),
        );
        let json = serde_json::to_value(OverlayRecord::from(&image)).unwrap();
        assert!(json.get("warpCorners").is_none());
        assert!(json.get("naturalWidth").is_none());
        assert_eq!(json["opacity"], 0.5);

        image.set_natural_size(40, 20);
        image.enter_warp().unwrap();
        image
            .move_corner(Corner::BottomLeft, Point::new(-3.0, 25.0))
            .unwrap();
        let json = serde_json::to_value(OverlayRecord::from(&image)).unwrap();
        assert_eq!(json["naturalWidth"], 40);
        assert_eq!(json["warpCorners"]["bl"]["x"], -3.0);
    }

    #[test]
    fn test_record_preserves_frozen_affine() {
        let mut image = OverlayImage::new(
            "sketch-4",
            SourceImage::new("blob:y", 100, 50),
            &OverlayDefaults::default(),
        );
        image.set_scale_rotation(2.0, 90.0).unwrap();
        image.enter_warp().unwrap();

        let restored = OverlayRecord::from(&image).into_image().unwrap();
        assert_eq!(restored.warp_corners(), image.warp_corners());
        assert_eq!(restored.affine(), image.affine());
    }
}
