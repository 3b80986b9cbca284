//! Cooperative tasks driven by the host frame clock
//!
//! Nothing here sleeps. The host calls [`Animations::tick`] once per frame with
//! the elapsed time; each task advances its own timers and returns control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::diagram::Diagram;
use crate::highlight::{HighlightSequence, HighlightSettings};
use crate::slider::Slider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Finished,
}

pub trait Task: Send + Sync {
    fn tick(&mut self, dt: Duration, diagram: &mut Diagram) -> TaskStatus;

    /// Runs once when the task's token is cancelled, before it is dropped
    fn cancel(&mut self, _diagram: &mut Diagram) {}
}

/// Shared stop flag for a running task
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle returned by [`Animations::start_slider`]
#[derive(Debug, Clone)]
pub struct SliderHandle {
    token: CancelToken,
}

impl SliderHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Entry {
    token: CancelToken,
    task: Box<dyn Task>,
}

/// Every running highlight sequence and slider
#[derive(Default)]
pub struct Animations {
    tasks: Vec<Entry>,
}

impl std::fmt::Debug for Animations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animations").field("tasks", &self.tasks.len()).finish()
    }
}

impl Animations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, task: impl Task + 'static) -> CancelToken {
        let token = CancelToken::new();
        self.tasks.push(Entry {
            token: token.clone(),
            task: Box::new(task),
        });
        token
    }

    /// Walk `ids` forever, pulsing one object per step
    pub fn highlight_sequence(&mut self, ids: Vec<String>, settings: HighlightSettings) -> CancelToken {
        self.spawn(HighlightSequence::new(ids, settings))
    }

    /// Cycle `images` onto face `face_index` of the cube `id`, one per `interval`
    pub fn start_slider(
        &mut self,
        id: impl Into<String>,
        images: Vec<String>,
        face_index: usize,
        interval: Duration,
    ) -> SliderHandle {
        let token = self.spawn(Slider::new(id, images, face_index, interval));
        SliderHandle { token }
    }

    pub fn tick(&mut self, dt: Duration, diagram: &mut Diagram) {
        self.tasks.retain_mut(|entry| {
            if entry.token.is_cancelled() {
                entry.task.cancel(diagram);
                return false;
            }
            entry.task.tick(dt, diagram) == TaskStatus::Running
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountDown {
        left: u32,
        cancelled: Arc<AtomicBool>,
    }

    impl Task for CountDown {
        fn tick(&mut self, _dt: Duration, _diagram: &mut Diagram) -> TaskStatus {
            self.left = self.left.saturating_sub(1);
            if self.left == 0 {
                TaskStatus::Finished
            } else {
                TaskStatus::Running
            }
        }

        fn cancel(&mut self, _diagram: &mut Diagram) {
            self.cancelled.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_finished_tasks_are_dropped() {
        let mut diagram = Diagram::new();
        let mut animations = Animations::new();
        let flag = Arc::new(AtomicBool::new(false));
        animations.spawn(CountDown {
            left: 2,
            cancelled: flag.clone(),
        });

        animations.tick(Duration::from_millis(16), &mut diagram);
        assert_eq!(animations.len(), 1);
        animations.tick(Duration::from_millis(16), &mut diagram);
        assert!(animations.is_empty());
        assert!(!flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_cancel_runs_cleanup() {
        let mut diagram = Diagram::new();
        let mut animations = Animations::new();
        let flag = Arc::new(AtomicBool::new(false));
        let token = animations.spawn(CountDown {
            left: 100,
            cancelled: flag.clone(),
        });

        token.cancel();
        animations.tick(Duration::from_millis(16), &mut diagram);
        assert!(animations.is_empty());
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_slider_handle_stop() {
        let mut diagram = Diagram::new();
        let mut animations = Animations::new();
        let handle = animations.start_slider(
            "preVisu",
            vec!["img/step0.jpeg".to_string()],
            4,
            Duration::from_millis(100),
        );
        animations.tick(Duration::from_millis(16), &mut diagram);
        assert_eq!(animations.len(), 1);

        handle.stop();
        assert!(handle.is_stopped());
        animations.tick(Duration::from_millis(16), &mut diagram);
        assert!(animations.is_empty());
    }
}
