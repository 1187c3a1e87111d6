//! In-memory collaborators for unit tests.

use std::collections::BTreeMap;

use nalgebra::{UnitQuaternion, Vector3};

use crate::scene::{Color, Scene, VisualDesc, VisualId, VisualShape, Viewpoint};

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedVisual {
    pub shape: VisualShape,
    pub color: Color,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

#[derive(Debug, Default)]
pub struct RecordingScene {
    visuals: BTreeMap<VisualId, RecordedVisual>,
    next_id: u64,
    pub transform_writes: usize,
    pub color_writes: Vec<(VisualId, Color)>,
}

impl RecordingScene {
    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn visual(&self, id: VisualId) -> Option<&RecordedVisual> {
        self.visuals.get(&id)
    }
}

impl Scene for RecordingScene {
    fn add_visual(&mut self, desc: VisualDesc) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id += 1;
        self.visuals.insert(
            id,
            RecordedVisual {
                shape: desc.shape,
                color: desc.color,
                translation: desc.translation,
                rotation: desc.rotation,
            },
        );
        id
    }

    fn remove_visual(&mut self, id: VisualId) {
        self.visuals.remove(&id);
    }

    fn set_transform(&mut self, id: VisualId, translation: Vector3<f32>, rotation: UnitQuaternion<f32>) {
        if let Some(v) = self.visuals.get_mut(&id) {
            v.translation = translation;
            v.rotation = rotation;
            self.transform_writes += 1;
        }
    }

    fn color(&self, id: VisualId) -> Option<Color> {
        self.visuals.get(&id).map(|v| v.color)
    }

    fn set_color(&mut self, id: VisualId, color: Color) {
        if let Some(v) = self.visuals.get_mut(&id) {
            v.color = color;
            self.color_writes.push((id, color));
        }
    }
}

/// A camera that only moves when told to.
#[derive(Clone, Copy, Debug)]
pub struct FixedViewpoint {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl FixedViewpoint {
    /// Looks down `-Z` from the origin.
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Camera at `position` looking along `dir`.
    pub fn looking(position: Vector3<f32>, dir: Vector3<f32>) -> Self {
        let orientation = UnitQuaternion::rotation_between(&-Vector3::z(), &dir)
            .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI));
        Self {
            position,
            orientation,
        }
    }
}

impl Viewpoint for FixedViewpoint {
    fn position(&self) -> Vector3<f32> {
        self.position
    }

    fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    fn orientation(&self) -> UnitQuaternion<f32> {
        self.orientation
    }
}
