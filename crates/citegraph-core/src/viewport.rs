use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::layout::ParamsError;
use crate::GraphKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomParams {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Scale factor per wheel unit is `exp(-delta * sensitivity)`.
    pub sensitivity: f32,
}

impl Default for ZoomParams {
    fn default() -> Self {
        Self {
            min_scale: 0.4,
            max_scale: 3.0,
            sensitivity: 0.0015,
        }
    }
}

impl ZoomParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let positive = |name, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ParamsError::OutOfRange { name, value: v })
            }
        };
        positive("min_scale", self.min_scale)?;
        positive("max_scale", self.max_scale)?;
        positive("sensitivity", self.sensitivity)?;
        if self.min_scale > self.max_scale {
            return Err(ParamsError::EmptyZoomRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        Ok(())
    }
}

/// World → surface mapping: `surface = world * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewportTransform {
    pub fn to_surface(&self, world: Vec2) -> Vec2 {
        world * self.scale + self.offset
    }

    pub fn to_world(&self, surface: Vec2) -> Vec2 {
        (surface - self.offset) / self.scale
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zooms about `pointer` so the world point under it stays put. The
    /// resulting scale is clamped to the configured bounds.
    pub fn zoom_at(&mut self, pointer: Vec2, delta: f32, params: &ZoomParams) {
        let factor = (-delta * params.sensitivity).exp();
        let target = (self.scale * factor).clamp(params.min_scale, params.max_scale);
        if !target.is_finite() || target == self.scale {
            return;
        }
        let anchor = self.to_world(pointer);
        self.scale = target;
        self.offset = pointer - anchor * target;
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SurfaceError {
    #[error("surface size {width}x{height} is not usable")]
    InvalidSize { width: f32, height: f32 },
    #[error("device pixel ratio {0} is not usable")]
    InvalidScale(f32),
}

/// Smallest logical size the view will lay out into.
pub fn min_surface(kind: GraphKind) -> Vec2 {
    match kind {
        GraphKind::Author => Vec2::new(320.0, 420.0),
        GraphKind::Citation => Vec2::new(480.0, 480.0),
    }
}

/// Drawing surface in logical pixels, with an integer backing scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    logical: Vec2,
    dpr: u32,
    min: Vec2,
}

impl Surface {
    pub fn new(width: f32, height: f32, dpr: f32, min: Vec2) -> Result<Self, SurfaceError> {
        let mut surface = Self {
            logical: min,
            dpr: 1,
            min,
        };
        surface.resize(width, height, dpr)?;
        Ok(surface)
    }

    /// Non-empty sizes below the minimum are raised to it; fractional ratios floor to
    /// an integer no smaller than 1.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        if !dpr.is_finite() {
            return Err(SurfaceError::InvalidScale(dpr));
        }
        self.logical = Vec2::new(width, height).max(self.min);
        self.dpr = dpr.floor().max(1.0) as u32;
        Ok(())
    }

    pub fn logical_size(&self) -> Vec2 {
        self.logical
    }

    pub fn dpr(&self) -> u32 {
        self.dpr
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let px = self.logical * self.dpr as f32;
        (px.x.round() as u32, px.y.round() as u32)
    }

    pub fn center(&self) -> Vec2 {
        self.logical * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_keeps_point_under_pointer() {
        let mut t = ViewportTransform {
            scale: 1.2,
            offset: Vec2::new(30.0, -12.0),
        };
        let pointer = Vec2::new(250.0, 180.0);
        let before = t.to_world(pointer);
        t.zoom_at(pointer, -200.0, &ZoomParams::default());
        assert!(t.scale > 1.2);
        assert!(t.to_world(pointer).distance(before) < 1e-3);
    }

    #[test]
    fn zoom_params_need_a_usable_range() {
        assert!(ZoomParams::default().validate().is_ok());
        let inverted = ZoomParams {
            min_scale: 3.0,
            max_scale: 0.4,
            ..ZoomParams::default()
        };
        assert!(matches!(inverted.validate(), Err(ParamsError::EmptyZoomRange { .. })));
        let nan = ZoomParams {
            sensitivity: f32::NAN,
            ..ZoomParams::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let p = ZoomParams::default();
        let mut t = ViewportTransform::default();
        t.zoom_at(Vec2::ZERO, -1e6, &p);
        assert_eq!(t.scale, 3.0);
        t.zoom_at(Vec2::ZERO, 1e6, &p);
        assert_eq!(t.scale, 0.4);
    }

    #[test]
    fn round_trip_through_transform() {
        let t = ViewportTransform {
            scale: 0.75,
            offset: Vec2::new(10.0, 20.0),
        };
        let w = Vec2::new(-42.0, 17.5);
        assert!(t.to_world(t.to_surface(w)).distance(w) < 1e-4);
    }

    #[test]
    fn surface_enforces_minimum_and_integer_ratio() {
        let s = Surface::new(100.0, 900.0, 1.75, min_surface(GraphKind::Author)).unwrap();
        assert_eq!(s.logical_size(), Vec2::new(320.0, 900.0));
        assert_eq!(s.dpr(), 1);
        assert_eq!(s.pixel_size(), (320, 900));

        let s = Surface::new(800.0, 600.0, 2.5, min_surface(GraphKind::Citation)).unwrap();
        assert_eq!(s.dpr(), 2);
        assert_eq!(s.pixel_size(), (1600, 1200));
        assert_eq!(s.center(), Vec2::new(400.0, 300.0));

        let s = Surface::new(800.0, 600.0, 0.5, Vec2::ZERO).unwrap();
        assert_eq!(s.dpr(), 1);
    }

    #[test]
    fn surface_rejects_empty_or_non_finite_input() {
        assert!(Surface::new(f32::NAN, 10.0, 1.0, Vec2::ZERO).is_err());
        assert_eq!(
            Surface::new(0.0, 10.0, 1.0, Vec2::ZERO),
            Err(SurfaceError::InvalidSize {
                width: 0.0,
                height: 10.0
            })
        );
        assert_eq!(
            Surface::new(10.0, 10.0, f32::INFINITY, Vec2::ZERO),
            Err(SurfaceError::InvalidScale(f32::INFINITY))
        );
    }
}
