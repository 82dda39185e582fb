//! States of a listing submission and the legal moves between them

use tracing::debug;

use crate::error::{Error, Result};

/// Where a submission currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    /// Editing with no photo attached
    #[default]
    Idle,

    /// A photo upload is in flight
    Uploading,

    /// Editing with at least one photo attached
    Ready,

    /// The listing is being written
    Submitting,

    /// The listing was written; the form starts over from here
    Submitted,

    /// Writing the listing failed; the form and photos are kept
    Failed { reason: String },
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Uploading => "uploading",
            SubmissionState::Ready => "ready",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Failed { .. } => "failed",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SubmissionState::Uploading | SubmissionState::Submitting)
    }
}

/// Something that happened to the submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    UploadStarted,

    /// An upload ended, successfully or not; `images` is the draft size after it
    UploadFinished { images: usize },

    /// The draft changed outside an upload, e.g. a photo was removed
    ImagesChanged { images: usize },

    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed { reason: String },
}

impl SubmissionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionEvent::UploadStarted => "upload-started",
            SubmissionEvent::UploadFinished { .. } => "upload-finished",
            SubmissionEvent::ImagesChanged { .. } => "images-changed",
            SubmissionEvent::SubmitStarted => "submit-started",
            SubmissionEvent::SubmitSucceeded => "submit-succeeded",
            SubmissionEvent::SubmitFailed { .. } => "submit-failed",
        }
    }
}

fn editing(images: usize) -> SubmissionState {
    if images == 0 {
        SubmissionState::Idle
    } else {
        SubmissionState::Ready
    }
}

/// Apply an event, rejecting moves that make no sense from the current state
pub fn transition(state: &SubmissionState, event: SubmissionEvent) -> Result<SubmissionState> {
    use SubmissionEvent as E;
    use SubmissionState as S;

    let next = match (state, event) {
        (S::Idle | S::Ready | S::Submitted | S::Failed { .. }, E::UploadStarted) => S::Uploading,
        (S::Uploading, E::UploadFinished { images }) => editing(images),
        (S::Idle | S::Ready | S::Submitted | S::Failed { .. }, E::ImagesChanged { images }) => {
            editing(images)
        }
        (S::Ready | S::Failed { .. }, E::SubmitStarted) => S::Submitting,
        (S::Submitting, E::SubmitSucceeded) => S::Submitted,
        (S::Submitting, E::SubmitFailed { reason }) => S::Failed { reason },
        (from, event) => {
            return Err(Error::InvalidTransition {
                from: from.name(),
                event: event.name(),
            })
        }
    };

    Ok(next)
}

/// A started upload or submit whose outcome is still pending.
///
/// Dropping it before [`InFlight::finish`] puts the state from before the
/// start event back, so a cancelled call leaves the flow editable.
pub(crate) struct InFlight<'a> {
    state: &'a mut SubmissionState,
    previous: Option<SubmissionState>,
}

impl<'a> InFlight<'a> {
    pub(crate) fn begin(state: &'a mut SubmissionState, event: SubmissionEvent) -> Result<Self> {
        let next = transition(state, event)?;
        let previous = std::mem::replace(state, next);
        Ok(Self {
            state,
            previous: Some(previous),
        })
    }

    /// The operation completed; keep the busy state for its finishing event
    pub(crate) fn finish(mut self) {
        self.previous = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!("{} abandoned, back to {}", self.state.name(), previous.name());
            *self.state = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut state = SubmissionState::default();
        for event in [
            SubmissionEvent::UploadStarted,
            SubmissionEvent::UploadFinished { images: 1 },
            SubmissionEvent::SubmitStarted,
            SubmissionEvent::SubmitSucceeded,
        ] {
            state = transition(&state, event).unwrap();
        }
        assert_eq!(state, SubmissionState::Submitted);
    }

    #[test]
    fn failed_upload_with_empty_draft_returns_to_idle() {
        let state = transition(&SubmissionState::Uploading, SubmissionEvent::UploadFinished { images: 0 });
        assert_eq!(state.unwrap(), SubmissionState::Idle);
    }

    #[test]
    fn removing_the_last_image_returns_to_idle() {
        let state = transition(&SubmissionState::Ready, SubmissionEvent::ImagesChanged { images: 0 });
        assert_eq!(state.unwrap(), SubmissionState::Idle);
    }

    #[test]
    fn failure_keeps_reason_and_allows_retry() {
        let failed = transition(
            &SubmissionState::Submitting,
            SubmissionEvent::SubmitFailed {
                reason: "offline".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            failed,
            SubmissionState::Failed {
                reason: "offline".to_string()
            }
        );
        assert_eq!(
            transition(&failed, SubmissionEvent::SubmitStarted).unwrap(),
            SubmissionState::Submitting
        );
    }

    #[test]
    fn illegal_moves_are_rejected() {
        let cases = [
            (SubmissionState::Idle, SubmissionEvent::SubmitStarted),
            (SubmissionState::Uploading, SubmissionEvent::SubmitStarted),
            (SubmissionState::Uploading, SubmissionEvent::UploadStarted),
            (SubmissionState::Submitting, SubmissionEvent::UploadStarted),
            (SubmissionState::Ready, SubmissionEvent::SubmitSucceeded),
            (SubmissionState::Idle, SubmissionEvent::UploadFinished { images: 1 }),
        ];

        for (state, event) in cases {
            let err = transition(&state, event).unwrap_err();
            assert!(matches!(err, Error::InvalidTransition { .. }));
        }
    }

    #[test]
    fn abandoned_submit_restores_previous_state() {
        let mut state = SubmissionState::Failed {
            reason: "offline".to_string(),
        };
        {
            let pending = InFlight::begin(&mut state, SubmissionEvent::SubmitStarted).unwrap();
            assert!(pending.state.is_busy());
        }
        assert_eq!(
            state,
            SubmissionState::Failed {
                reason: "offline".to_string()
            }
        );
    }

    #[test]
    fn finished_operation_stays_busy_until_its_outcome() {
        let mut state = SubmissionState::Ready;
        InFlight::begin(&mut state, SubmissionEvent::UploadStarted)
            .unwrap()
            .finish();
        assert_eq!(state, SubmissionState::Uploading);
        assert_eq!(
            transition(&state, SubmissionEvent::UploadFinished { images: 2 }).unwrap(),
            SubmissionState::Ready
        );
    }

    #[test]
    fn rejected_start_leaves_state_alone() {
        let mut state = SubmissionState::Idle;
        assert!(InFlight::begin(&mut state, SubmissionEvent::SubmitStarted).is_err());
        assert_eq!(state, SubmissionState::Idle);
    }

    #[test]
    fn transition_error_names_both_sides() {
        let err = transition(&SubmissionState::Idle, SubmissionEvent::SubmitStarted).unwrap_err();
        assert_eq!(err.to_string(), "Cannot apply submit-started while idle");
    }
}
