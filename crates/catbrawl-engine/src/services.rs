//! Collaborators the arena talks to but does not implement.
//!
//! Chat, the broadcast prediction API and sound playback live outside the
//! simulation. The arena reaches them through three small traits bundled in
//! [`Services`]. Every call is fire-and-forget: a failing collaborator is
//! logged with `tracing::warn!` and the simulation carries on.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A sound the stage asks to be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A fist connected.
    Punch,
    /// Someone got kicked.
    Kick,
    /// Lightning struck.
    Thunder,
}

/// A prediction the arena opens when an event starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Question shown to viewers.
    pub title: String,
    /// Possible outcomes, in display order.
    pub outcomes: Vec<String>,
    /// Seconds viewers may place predictions.
    pub window_secs: f64,
}

/// A status change of the currently open prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredictionUpdate {
    /// No more predictions accepted.
    Locked,
    /// The outcome named `winner` won.
    Resolved { winner: String, reason: String },
    /// Refund everyone.
    Canceled { reason: String },
}

/// A collaborator refused or failed a call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator is offline or rejected the call.
    #[error("{service} is unavailable: {details}")]
    Unavailable {
        service: &'static str,
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Chat sink for announcements.
pub trait Messenger {
    /// Post one chat message.
    fn send_message(&mut self, text: &str) -> Result<(), ServiceError>;
}

/// Broadcast prediction API.
pub trait PredictionBoard {
    /// Open a new prediction.
    fn create_prediction(&mut self, request: &PredictionRequest) -> Result<(), ServiceError>;
    /// Change the status of the open prediction.
    fn update_prediction(&mut self, update: &PredictionUpdate) -> Result<(), ServiceError>;
}

/// Sound playback.
pub trait SoundBoard {
    /// Play a cue.
    fn play(&mut self, cue: SoundCue) -> Result<(), ServiceError>;
}

/// Collaborator that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Messenger for Silent {
    fn send_message(&mut self, _text: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl PredictionBoard for Silent {
    fn create_prediction(&mut self, _request: &PredictionRequest) -> Result<(), ServiceError> {
        Ok(())
    }

    fn update_prediction(&mut self, _update: &PredictionUpdate) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl SoundBoard for Silent {
    fn play(&mut self, _cue: SoundCue) -> Result<(), ServiceError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// The bundle of collaborators owned by an arena.
pub struct Services {
    messenger: Box<dyn Messenger>,
    predictions: Box<dyn PredictionBoard>,
    sounds: Box<dyn SoundBoard>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::silent()
    }
}

impl Services {
    /// Bundle three collaborators.
    pub fn new(
        messenger: Box<dyn Messenger>,
        predictions: Box<dyn PredictionBoard>,
        sounds: Box<dyn SoundBoard>,
    ) -> Self {
        Self {
            messenger,
            predictions,
            sounds,
        }
    }

    /// Collaborators that drop every call.
    pub fn silent() -> Self {
        Self::new(Box::new(Silent), Box::new(Silent), Box::new(Silent))
    }

    /// Post a chat message.
    pub fn announce(&mut self, text: &str) {
        if let Err(e) = self.messenger.send_message(text) {
            tracing::warn!(error = %e, text, "announcement dropped");
        }
    }

    /// Open a prediction.
    pub fn create_prediction(&mut self, request: &PredictionRequest) {
        if let Err(e) = self.predictions.create_prediction(request) {
            tracing::warn!(error = %e, title = %request.title, "failed to open prediction");
        }
    }

    /// Push a prediction status change.
    pub fn update_prediction(&mut self, update: &PredictionUpdate) {
        if let Err(e) = self.predictions.update_prediction(update) {
            tracing::warn!(error = %e, ?update, "failed to update prediction");
        }
    }

    /// Play a sound cue.
    pub fn play(&mut self, cue: SoundCue) {
        if let Err(e) = self.sounds.play(cue) {
            tracing::debug!(error = %e, ?cue, "sound skipped");
        }
    }
}

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

/// Collaborators that remember every call, for tests and the headless harness.
pub mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Everything the arena asked its collaborators to do.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Recorded {
        pub messages: Vec<String>,
        pub created: Vec<PredictionRequest>,
        pub updates: Vec<PredictionUpdate>,
        pub sounds: Vec<SoundCue>,
    }

    /// Shared handle to a [`Recorded`] log. Clones share the same log.
    #[derive(Debug, Default, Clone)]
    pub struct Recorder(Rc<RefCell<Recorded>>);

    impl Recorder {
        /// A copy of the log so far.
        pub fn snapshot(&self) -> Recorded {
            self.0.borrow().clone()
        }

        /// Chat messages so far.
        pub fn messages(&self) -> Vec<String> {
            self.0.borrow().messages.clone()
        }

        /// Prediction updates so far.
        pub fn updates(&self) -> Vec<PredictionUpdate> {
            self.0.borrow().updates.clone()
        }

        /// Forget everything recorded so far.
        pub fn reset(&self) {
            *self.0.borrow_mut() = Recorded::default();
        }
    }

    impl Messenger for Recorder {
        fn send_message(&mut self, text: &str) -> Result<(), ServiceError> {
            self.0.borrow_mut().messages.push(text.to_owned());
            Ok(())
        }
    }

    impl PredictionBoard for Recorder {
        fn create_prediction(&mut self, request: &PredictionRequest) -> Result<(), ServiceError> {
            self.0.borrow_mut().created.push(request.clone());
            Ok(())
        }

        fn update_prediction(&mut self, update: &PredictionUpdate) -> Result<(), ServiceError> {
            self.0.borrow_mut().updates.push(update.clone());
            Ok(())
        }
    }

    impl SoundBoard for Recorder {
        fn play(&mut self, cue: SoundCue) -> Result<(), ServiceError> {
            self.0.borrow_mut().sounds.push(cue);
            Ok(())
        }
    }

    /// A collaborator that fails every call.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Offline;

    fn offline(service: &'static str) -> ServiceError {
        ServiceError::Unavailable {
            service,
            details: "offline".to_owned(),
        }
    }

    impl Messenger for Offline {
        fn send_message(&mut self, _text: &str) -> Result<(), ServiceError> {
            Err(offline("chat"))
        }
    }

    impl PredictionBoard for Offline {
        fn create_prediction(&mut self, _request: &PredictionRequest) -> Result<(), ServiceError> {
            Err(offline("predictions"))
        }

        fn update_prediction(&mut self, _update: &PredictionUpdate) -> Result<(), ServiceError> {
            Err(offline("predictions"))
        }
    }

    impl SoundBoard for Offline {
        fn play(&mut self, _cue: SoundCue) -> Result<(), ServiceError> {
            Err(offline("sound"))
        }
    }

    /// Services backed by one shared recorder.
    pub fn services() -> (Services, Recorder) {
        let recorder = Recorder::default();
        let services = Services::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
        );
        (services, recorder)
    }

    /// Services where every collaborator is offline.
    pub fn offline_services() -> Services {
        Services::new(Box::new(Offline), Box::new(Offline), Box::new(Offline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_sees_every_call() {
        let (mut services, recorder) = recording::services();
        services.announce("hello");
        services.play(SoundCue::Kick);
        services.create_prediction(&PredictionRequest {
            title: "who wins?".to_owned(),
            outcomes: vec!["a".to_owned(), "b".to_owned()],
            window_secs: 10.0,
        });
        services.update_prediction(&PredictionUpdate::Locked);

        let log = recorder.snapshot();
        assert_eq!(log.messages, vec!["hello".to_owned()]);
        assert_eq!(log.sounds, vec![SoundCue::Kick]);
        assert_eq!(log.created.len(), 1);
        assert_eq!(log.updates, vec![PredictionUpdate::Locked]);
    }

    #[test]
    fn offline_collaborators_do_not_panic() {
        let mut services = recording::offline_services();
        services.announce("nobody hears this");
        services.play(SoundCue::Thunder);
        services.update_prediction(&PredictionUpdate::Canceled {
            reason: "x".to_owned(),
        });
    }
}
