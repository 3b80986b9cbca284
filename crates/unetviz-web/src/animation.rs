//! Highlight and slider animations on the Bevy frame clock

use bevy::prelude::*;
use unetviz_core::layout::start_animations;
use unetviz_core::{Animations, CancelToken, SliderHandle, ViewerConfig};

use crate::app::{DiagramState, ViewerSet};

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationState>()
            .add_systems(Update, tick_animations.in_set(ViewerSet::Animate));
    }
}

#[derive(Resource, Default)]
pub struct AnimationState {
    pub animations: Animations,
    highlight: Option<CancelToken>,
    slider: Option<SliderHandle>,
}

impl AnimationState {
    /// Stop whatever runs and start the highlight walk and the preview slider
    pub fn restart(&mut self, config: &ViewerConfig) {
        self.stop();
        let (highlight, slider) = start_animations(&mut self.animations, config);
        self.highlight = Some(highlight);
        self.slider = Some(slider);
    }

    /// Cancelled tasks restore their state on the next tick
    pub fn stop(&mut self) {
        if let Some(highlight) = self.highlight.take() {
            highlight.cancel();
        }
        if let Some(slider) = self.slider.take() {
            slider.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.highlight.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}

fn tick_animations(
    time: Res<Time>,
    mut state: ResMut<AnimationState>,
    mut diagram: ResMut<DiagramState>,
) {
    state.animations.tick(time.delta(), &mut diagram.0);
}
