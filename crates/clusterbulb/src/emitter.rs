//! Maps the cluster state to light commands, one per fast tick.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::light::{Light, Rgb};
use crate::state::ClusterState;

/// The last color actually emitted. Owned by the emitter alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorOutputState {
    pub last: Option<Rgb>,
}

impl ColorOutputState {
    /// Pick the color for `state` and remember it.
    ///
    /// `Both` alternates red and blue, so the blink rate is the tick rate.
    pub fn advance(&mut self, state: ClusterState) -> Rgb {
        let color = match state {
            ClusterState::Healthy => Rgb::GREEN,
            ClusterState::PullRequestsOpen => Rgb::BLUE,
            ClusterState::IssuesDetected => Rgb::RED,
            ClusterState::Both if self.last == Some(Rgb::RED) => Rgb::BLUE,
            ClusterState::Both => Rgb::RED,
        };
        self.last = Some(color);
        color
    }
}

pub struct ColorEmitter {
    light: Option<Arc<dyn Light>>,
    output: ColorOutputState,
    failing: bool,
}

impl ColorEmitter {
    /// `light` of `None` turns every tick into a silent no-op send.
    #[must_use]
    pub fn new(light: Option<Arc<dyn Light>>) -> Self {
        Self {
            light,
            output: ColorOutputState::default(),
            failing: false,
        }
    }

    /// Emit the color for `state`. Send failures are logged, never returned.
    pub async fn tick(&mut self, state: ClusterState) -> Rgb {
        let color = self.output.advance(state);

        let Some(light) = &self.light else {
            return color;
        };

        match light.set_color(color).await {
            Ok(()) => {
                if self.failing {
                    info!("Light reachable again");
                    self.failing = false;
                }
                debug!(state = %state, color = %color, "Emitted color");
            }
            Err(e) if self.failing => {
                debug!(error = %e, "Light still unreachable");
            }
            Err(e) => {
                warn!(error = %e, color = %color, "Failed to update light");
                self.failing = true;
            }
        }

        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::LightError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLight {
        colors: Mutex<Vec<Rgb>>,
    }

    #[async_trait]
    impl Light for RecordingLight {
        async fn set_color(&self, color: Rgb) -> Result<(), LightError> {
            self.colors.lock().unwrap().push(color);
            Ok(())
        }
    }

    #[test]
    fn test_single_states_map_to_fixed_colors() {
        let mut output = ColorOutputState::default();
        assert_eq!(output.advance(ClusterState::Healthy), Rgb::GREEN);
        assert_eq!(output.advance(ClusterState::PullRequestsOpen), Rgb::BLUE);
        assert_eq!(output.advance(ClusterState::IssuesDetected), Rgb::RED);
        assert_eq!(output.advance(ClusterState::IssuesDetected), Rgb::RED);
    }

    #[test]
    fn test_both_alternates_from_red() {
        let mut output = ColorOutputState {
            last: Some(Rgb::RED),
        };
        let sequence: Vec<Rgb> = (0..6).map(|_| output.advance(ClusterState::Both)).collect();
        assert_eq!(
            sequence,
            [Rgb::BLUE, Rgb::RED, Rgb::BLUE, Rgb::RED, Rgb::BLUE, Rgb::RED]
        );
        assert!(sequence.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_both_after_green_starts_red() {
        let mut output = ColorOutputState {
            last: Some(Rgb::GREEN),
        };
        assert_eq!(output.advance(ClusterState::Both), Rgb::RED);
        assert_eq!(output.advance(ClusterState::Both), Rgb::BLUE);
    }

    #[tokio::test]
    async fn test_tick_sends_one_command() {
        let light = Arc::new(RecordingLight::default());
        let mut emitter = ColorEmitter::new(Some(light.clone()));

        emitter.tick(ClusterState::Healthy).await;
        emitter.tick(ClusterState::Both).await;
        emitter.tick(ClusterState::Both).await;

        assert_eq!(
            *light.colors.lock().unwrap(),
            [Rgb::GREEN, Rgb::RED, Rgb::BLUE]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_light_still_tracks_output() {
        let mut emitter = ColorEmitter::new(None);
        assert_eq!(emitter.tick(ClusterState::Both).await, Rgb::RED);
        assert_eq!(emitter.tick(ClusterState::Both).await, Rgb::BLUE);
        assert_eq!(emitter.output.last, Some(Rgb::BLUE));
    }
}
