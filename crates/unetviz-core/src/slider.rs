//! Periodic image swap on one cube face

use std::time::Duration;

use tracing::warn;

use crate::diagram::Diagram;
use crate::task::{Task, TaskStatus};

/// Shows `images[k % len]` on the `k`-th interval (0-based)
#[derive(Debug, Clone)]
pub struct Slider {
    id: String,
    images: Vec<String>,
    face_index: usize,
    interval: Duration,
    elapsed: Duration,
    ticks: usize,
}

impl Slider {
    pub fn new(id: impl Into<String>, images: Vec<String>, face_index: usize, interval: Duration) -> Self {
        Self {
            id: id.into(),
            images,
            face_index,
            interval,
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn image_for_tick(&self, tick: usize) -> Option<&str> {
        if self.images.is_empty() {
            return None;
        }
        self.images.get(tick % self.images.len()).map(String::as_str)
    }

    /// Intervals completed so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

impl Task for Slider {
    fn tick(&mut self, dt: Duration, diagram: &mut Diagram) -> TaskStatus {
        if self.images.is_empty() {
            warn!(id = %self.id, "Slider has no images, stopping");
            return TaskStatus::Finished;
        }
        if self.interval.is_zero() {
            warn!(id = %self.id, "Slider interval is zero, stopping");
            return TaskStatus::Finished;
        }

        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            let image = self.images[self.ticks % self.images.len()].clone();
            diagram.change_cube_image(&self.id, &image, self.face_index);
            self.ticks += 1;
        }
        TaskStatus::Running
    }
}
