use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("exercise has already been answered")]
    AlreadyAnswered,
    #[error("a submission for this exercise is already in flight")]
    InFlight,
    #[error("no submission is in flight")]
    NotSubmitting,
}

/// Lifecycle of one exercise instance for a single user.
///
/// `Unanswered -> Submitting -> Answered`. `Answered` is terminal: the instance
/// accepts no further submissions. A failed persist returns to `Unanswered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExerciseState {
    #[default]
    Unanswered,
    Submitting,
    Answered {
        correct: bool,
    },
}

impl ExerciseState {
    /// Enter `Submitting`.
    ///
    /// # Errors
    ///
    /// `InFlight` while a submission is pending, `AlreadyAnswered` once locked.
    pub fn begin_submit(&mut self) -> Result<(), TransitionError> {
        match self {
            ExerciseState::Unanswered => {
                *self = ExerciseState::Submitting;
                Ok(())
            }
            ExerciseState::Submitting => Err(TransitionError::InFlight),
            ExerciseState::Answered { .. } => Err(TransitionError::AlreadyAnswered),
        }
    }

    /// Record the evaluated outcome after the attempt was stored.
    ///
    /// # Errors
    ///
    /// `NotSubmitting` unless a submission is in flight.
    pub fn finish(&mut self, correct: bool) -> Result<(), TransitionError> {
        match self {
            ExerciseState::Submitting => {
                *self = ExerciseState::Answered { correct };
                Ok(())
            }
            _ => Err(TransitionError::NotSubmitting),
        }
    }

    /// Undo `begin_submit` after the attempt could not be stored.
    ///
    /// # Errors
    ///
    /// `NotSubmitting` unless a submission is in flight.
    pub fn abort(&mut self) -> Result<(), TransitionError> {
        match self {
            ExerciseState::Submitting => {
                *self = ExerciseState::Unanswered;
                Ok(())
            }
            _ => Err(TransitionError::NotSubmitting),
        }
    }

    /// Whether input controls should be disabled.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !matches!(self, ExerciseState::Unanswered)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        match self {
            ExerciseState::Answered { correct } => Some(*correct),
            _ => None,
        }
    }
}
