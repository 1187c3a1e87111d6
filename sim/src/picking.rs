//! Crosshair picking: highlight flash on the targeted visual and click impulses on props.
//!
//! The highlight is a one-shot flash. Restorations are queued and flushed at the start of
//! the following tick, so a newly targeted visual shows the highlight for the frame rendered
//! after the tick that picked it and then returns to its own color. It does not flash again
//! while it stays targeted; moving the crosshair off it (or onto another visual) re-arms it.

use std::collections::VecDeque;

use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;

use crate::props::PropRegistry;
use crate::scene::{Color, Scene, VisualId, Viewpoint};
use crate::world::PhysicsWorld;

/// The visual under the crosshair this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickTarget {
    pub visual: VisualId,
    /// Color captured before the highlight was applied, once it has been.
    pub restore_color: Option<Color>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Restoration {
    visual: VisualId,
    color: Color,
}

#[derive(Debug)]
pub struct Interaction {
    target: Option<PickTarget>,
    /// Visual that already got its flash for the current stretch of targeting.
    flashed: Option<VisualId>,
    pending: VecDeque<Restoration>,
    highlight_color: Color,
    click_impulse: Vector3<f32>,
    max_distance: f32,
}

impl Interaction {
    pub fn new(highlight_color: Color, click_impulse: Vector3<f32>, max_distance: f32) -> Self {
        Self {
            target: None,
            flashed: None,
            pending: VecDeque::new(),
            highlight_color,
            click_impulse,
            max_distance,
        }
    }

    #[inline]
    pub fn target(&self) -> Option<PickTarget> {
        self.target
    }

    #[cfg(test)]
    pub fn pending_restorations(&self) -> usize {
        self.pending.len()
    }

    /// Flushes last tick's restorations, re-picks along the view ray and flashes a new hit.
    ///
    /// `exclude` is the viewer's own body, which the ray must pass through.
    pub fn tick(
        &mut self,
        world: &PhysicsWorld,
        view: &impl Viewpoint,
        scene: &mut impl Scene,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<PickTarget> {
        self.flush_restorations(scene);

        let hit = world.cast_pick_ray(view.position(), view.forward(), self.max_distance, exclude);
        let Some(hit) = hit else {
            self.target = None;
            self.flashed = None;
            return None;
        };

        if self.flashed == Some(hit.visual) {
            // Still on the flashed visual: keep the target and its captured color.
            return self.target;
        }

        self.flashed = None;
        self.target = Some(PickTarget {
            visual: hit.visual,
            restore_color: None,
        });
        self.highlight(scene);
        self.target
    }

    /// Applies the highlight to the current target and schedules its restoration.
    ///
    /// A target that already shows the highlight color is left alone, so calling this
    /// repeatedly within a tick never captures the highlight as the color to restore.
    pub fn highlight(&mut self, scene: &mut impl Scene) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        let Some(current) = scene.color(target.visual) else {
            return;
        };
        if current == self.highlight_color {
            return;
        }

        scene.set_color(target.visual, self.highlight_color);
        target.restore_color = Some(current);
        self.flashed = Some(target.visual);
        self.pending.push_back(Restoration {
            visual: target.visual,
            color: current,
        });
    }

    /// Runs every queued restoration in scheduling order.
    ///
    /// A restoration only touches the visual it captured, and only while that visual still
    /// shows the highlight; anything recolored since then keeps its newer color.
    pub fn flush_restorations(&mut self, scene: &mut impl Scene) {
        while let Some(r) = self.pending.pop_front() {
            if scene.color(r.visual) == Some(self.highlight_color) {
                scene.set_color(r.visual, r.color);
            }
        }
    }

    /// Pushes the targeted prop upward. Returns whether an impulse was applied.
    ///
    /// No target, or a target that is not a registered prop (e.g. the ground), is a no-op.
    pub fn click(&self, props: &PropRegistry, world: &mut PhysicsWorld) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let Some(prop) = props.find_by_visual(target.visual) else {
            return false;
        };
        log::debug!("impulse on prop {:?}", prop.visual);
        world.apply_impulse(prop.body, self.click_impulse)
    }
}
