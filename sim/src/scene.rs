//! Boundary contracts between the simulation core and whatever draws it.
//!
//! The core never owns rendering state. It talks to a [`Scene`] through opaque
//! [`VisualId`]s and to the camera through a [`Viewpoint`]. Physics stays the source of
//! truth; visuals are write-mostly mirrors.

use nalgebra::{UnitQuaternion, Vector3};

/// Opaque identifier of a visual object owned by a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u64);

impl VisualId {
    /// Packs the id into a collider `user_data` slot.
    ///
    /// Bit 64 is set so that `0` (Rapier's default user data) never decodes to a visual.
    #[inline]
    pub fn to_user_data(self) -> u128 {
        (self.0 as u128) | (1u128 << u64::BITS)
    }

    /// Inverse of [`VisualId::to_user_data`]. Returns `None` for colliders without a visual.
    #[inline]
    pub fn from_user_data(data: u128) -> Option<Self> {
        if data >> u64::BITS != 1 {
            return None;
        }
        Some(Self(data as u64))
    }
}

/// 24-bit sRGB color, `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const HIGHLIGHT: Color = Color(0xff_d1_66);
    pub const PROP: Color = Color(0x4f_8a_d9);
    pub const GROUND: Color = Color(0xa9_a9_a9);

    #[inline]
    pub fn rgb_u8(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    #[cfg(test)]
    pub fn from_rgb_u8([r, g, b]: [u8; 3]) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }
}

/// Geometry a visual should be built with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisualShape {
    Cuboid { half_extents: Vector3<f32> },
}

/// Everything a [`Scene`] needs to create a visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualDesc {
    pub shape: VisualShape,
    pub color: Color,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

/// Rendering side of the sandbox.
///
/// Operations on an id that was never issued or was already removed are no-ops.
pub trait Scene {
    fn add_visual(&mut self, desc: VisualDesc) -> VisualId;

    fn remove_visual(&mut self, id: VisualId);

    fn set_transform(&mut self, id: VisualId, translation: Vector3<f32>, rotation: UnitQuaternion<f32>);

    /// Current material color, `None` if the visual does not exist.
    fn color(&self, id: VisualId) -> Option<Color>;

    fn set_color(&mut self, id: VisualId, color: Color);
}

/// The first-person camera.
///
/// Orientation follows the usual camera convention: the view looks down local `-Z`,
/// local `+X` points right and local `+Y` up.
pub trait Viewpoint {
    fn position(&self) -> Vector3<f32>;

    fn set_position(&mut self, position: Vector3<f32>);

    fn orientation(&self) -> UnitQuaternion<f32>;

    /// World-space view direction.
    fn forward(&self) -> Vector3<f32> {
        self.orientation() * -Vector3::z()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_data_round_trips_visual_ids() {
        for raw in [0, 1, 42, u32::MAX as u64, u64::MAX] {
            let id = VisualId(raw);
            assert_eq!(VisualId::from_user_data(id.to_user_data()), Some(id));
        }
    }

    #[test]
    fn default_user_data_is_not_a_visual() {
        assert_eq!(VisualId::from_user_data(0), None);
        assert_eq!(VisualId::from_user_data(7), None);
    }

    #[test]
    fn color_channels_unpack_in_rgb_order() {
        assert_eq!(Color(0x12_34_56).rgb_u8(), [0x12, 0x34, 0x56]);
        assert_eq!(Color::from_rgb_u8([0xa9, 0xa9, 0xa9]), Color::GROUND);
    }
}
