//! Highlight animator
//!
//! Walks an ordered list of object ids forever. Each step brightens every
//! material under one object (and optionally nudges it along an axis), waits,
//! then puts everything back exactly as it was.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::color::{Hsl, Rgb};
use crate::diagram::Diagram;
use crate::material::MaterialSlot;
use crate::scene::NodeId;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOffset {
    pub axis: Axis,
    pub amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightSettings {
    /// How long each object stays highlighted
    pub step: Duration,
    pub lightness_boost: f32,
    pub offset: Option<PositionOffset>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(500),
            lightness_boost: 0.2,
            offset: None,
        }
    }
}

/// What one step changed, so it can be undone
#[derive(Debug, Clone)]
pub(crate) struct ActiveStep {
    node: NodeId,
    colors: Vec<(MaterialSlot, Hsl)>,
    position: Option<Vec3>,
}

impl ActiveStep {
    /// Snapshot every material under `node`, then brighten and displace it
    pub(crate) fn apply(diagram: &mut Diagram, node: NodeId, settings: &HighlightSettings) -> Self {
        let mut colors = Vec::new();
        for slot in diagram.scene.collect_materials(node) {
            if let Some(material) = diagram.scene.material_mut(slot) {
                let hsl = material.color.to_hsl();
                material.color = Rgb::from_hsl(hsl.boosted(settings.lightness_boost));
                colors.push((slot, hsl));
            }
        }

        let position = settings.offset.and_then(|offset| {
            let original = diagram.scene.translation(node)?;
            diagram
                .scene
                .set_translation(node, original + offset.axis.unit() * offset.amount);
            Some(original)
        });

        Self { node, colors, position }
    }

    pub(crate) fn restore(&self, diagram: &mut Diagram) {
        for (slot, hsl) in &self.colors {
            if let Some(material) = diagram.scene.material_mut(*slot) {
                material.color = Rgb::from_hsl(*hsl);
            }
        }
        if let Some(position) = self.position {
            diagram.scene.set_translation(self.node, position);
        }
    }
}

#[derive(Debug, Clone)]
pub struct HighlightSequence {
    ids: Vec<String>,
    settings: HighlightSettings,
    cursor: usize,
    elapsed: Duration,
    active: Option<ActiveStep>,
}

impl HighlightSequence {
    pub fn new(ids: Vec<String>, settings: HighlightSettings) -> Self {
        Self {
            ids,
            settings,
            cursor: 0,
            elapsed: Duration::ZERO,
            active: None,
        }
    }

    /// Id highlighted right now, if any
    pub fn current(&self) -> Option<&str> {
        self.active.as_ref().map(|_| self.ids[self.cursor].as_str())
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.ids.len();
    }

    /// Start the step at the cursor, skipping ids that do not resolve.
    /// Gives up after one full lap so an all-missing list just idles.
    fn begin_step(&mut self, diagram: &mut Diagram) {
        for _ in 0..self.ids.len() {
            let id = &self.ids[self.cursor];
            if let Some(node) = diagram.resolve(id) {
                self.active = Some(ActiveStep::apply(diagram, node, &self.settings));
                self.elapsed = Duration::ZERO;
                return;
            }
            trace!(id = %id, "Highlight target missing, skipped");
            self.advance();
        }
    }
}

impl Task for HighlightSequence {
    fn tick(&mut self, dt: Duration, diagram: &mut Diagram) -> TaskStatus {
        if self.ids.is_empty() {
            return TaskStatus::Finished;
        }

        match &self.active {
            None => self.begin_step(diagram),
            Some(step) => {
                self.elapsed += dt;
                if self.elapsed >= self.settings.step {
                    step.restore(diagram);
                    self.active = None;
                    self.advance();
                    self.begin_step(diagram);
                }
            }
        }
        TaskStatus::Running
    }

    fn cancel(&mut self, diagram: &mut Diagram) {
        if let Some(step) = self.active.take() {
            step.restore(diagram);
        }
    }
}
