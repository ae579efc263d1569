use std::time::Duration;

use super::media_source::ReadyState;
use crate::config::SamplingSettings;
use crate::error::CaptureError;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Seeking { attempt: u32 },
    RetryPending { attempt: u32 },
    Drawing,
    Done,
    Failed(CaptureError),
}

/// What happened since the last command.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureInput {
    Settled,
    SourceError(String),
    Drawn,
    DrawFailed(String),
    RetryElapsed,
    TimedOut,
}

/// What the driver of the machine should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureCommand {
    Seek(f64),
    AwaitSettle,
    Draw,
    RetryAfter(Duration),
    Finish,
    Abandon(CaptureError),
}

/// Per-frame capture state machine.
///
/// Pure bookkeeping: it never touches the source or the clock. The sampler
/// feeds it inputs (settle notifications, errors, timer expiry) and carries
/// out the commands it returns.
#[derive(Debug)]
pub struct CaptureMachine {
    target: f64,
    epsilon: f64,
    max_attempts: u32,
    backoff: Duration,
    attempts: u32,
    state: CaptureState,
}

impl CaptureMachine {
    pub fn new(target: f64, settings: &SamplingSettings) -> Self {
        Self {
            target,
            epsilon: settings.seek_epsilon_secs,
            max_attempts: settings.max_seek_attempts,
            backoff: settings.retry_backoff(),
            attempts: 0,
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, CaptureState::Done | CaptureState::Failed(_))
    }

    /// Draws straight away when the source already sits on the target, seeks otherwise.
    pub fn start(&mut self, ready: ReadyState, position: f64) -> CaptureCommand {
        if ready >= ReadyState::HaveFutureData && (position - self.target).abs() < self.epsilon {
            self.state = CaptureState::Drawing;
            return CaptureCommand::Draw;
        }
        self.begin_seek()
    }

    pub fn on(&mut self, input: CaptureInput) -> CaptureCommand {
        if self.is_terminal() {
            return self.current_command();
        }
        match (&self.state, input) {
            (_, CaptureInput::TimedOut) => self.fail(CaptureError::TimedOut),
            (CaptureState::Seeking { .. }, CaptureInput::Settled) => {
                self.state = CaptureState::Drawing;
                CaptureCommand::Draw
            }
            (CaptureState::Seeking { .. }, CaptureInput::SourceError(message)) => {
                self.retry_or_fail(CaptureError::Seek(message))
            }
            (CaptureState::Drawing, CaptureInput::Drawn) => {
                self.state = CaptureState::Done;
                CaptureCommand::Finish
            }
            (CaptureState::Drawing, CaptureInput::DrawFailed(message)) => {
                self.retry_or_fail(CaptureError::Draw(message))
            }
            (CaptureState::RetryPending { .. }, CaptureInput::RetryElapsed) => self.begin_seek(),
            (state, input) => {
                tracing::debug!("Ignoring {:?} while {:?}", input, state);
                self.current_command()
            }
        }
    }

    fn begin_seek(&mut self) -> CaptureCommand {
        self.attempts += 1;
        tracing::debug!("Seek attempt {} to {:.2}s", self.attempts, self.target);
        self.state = CaptureState::Seeking {
            attempt: self.attempts,
        };
        CaptureCommand::Seek(self.target)
    }

    fn retry_or_fail(&mut self, error: CaptureError) -> CaptureCommand {
        if self.attempts < self.max_attempts {
            tracing::debug!("{}, retrying in {:?}", error, self.backoff);
            self.state = CaptureState::RetryPending {
                attempt: self.attempts,
            };
            CaptureCommand::RetryAfter(self.backoff)
        } else {
            self.fail(CaptureError::AttemptsExhausted {
                attempts: self.attempts,
                last: error.to_string(),
            })
        }
    }

    fn fail(&mut self, error: CaptureError) -> CaptureCommand {
        self.state = CaptureState::Failed(error.clone());
        CaptureCommand::Abandon(error)
    }

    fn current_command(&self) -> CaptureCommand {
        match &self.state {
            CaptureState::Idle | CaptureState::Seeking { .. } => CaptureCommand::AwaitSettle,
            CaptureState::RetryPending { .. } => CaptureCommand::RetryAfter(self.backoff),
            CaptureState::Drawing => CaptureCommand::Draw,
            CaptureState::Done => CaptureCommand::Finish,
            CaptureState::Failed(error) => CaptureCommand::Abandon(error.clone()),
        }
    }
}
