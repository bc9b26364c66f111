//! Presentation feedback raised by combat.
//!
//! Systems never call a camera or an audio device. They push
//! [`FeedbackEvent`]s into the step context, and whoever drives the
//! simulation drains them with
//! [`Simulation::take_feedback`](crate::sim::Simulation::take_feedback).
//! Nothing in the core reads them back.

/// A fire-and-forget side effect for the camera or the mixer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    /// Shake the camera by `intensity`.
    Shake { intensity: f32 },
    /// Play the named sound at `volume` (0.0 to 1.0).
    Sound { name: &'static str, volume: f32 },
}

/// Events collected during steps, drained by the driver.
#[derive(Debug, Default)]
pub struct Feedback {
    events: Vec<FeedbackEvent>,
}

impl Feedback {
    pub fn shake(&mut self, intensity: f32) {
        self.events.push(FeedbackEvent::Shake { intensity });
    }

    pub fn sound(&mut self, name: &'static str, volume: f32) {
        self.events.push(FeedbackEvent::Sound {
            name,
            volume: volume.clamp(0.0, 1.0),
        });
    }

    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut self.events)
    }
}
