use crate::game::ActionWindow;
use crate::net::{
    AnswerSubmission, ConnectionManager, Connector, Outbound, SendError, corrected_timestamp,
};

/// Anything that can put an outbound frame on the wire.
pub trait FrameSink {
    fn send_outbound(&mut self, outbound: &Outbound) -> Result<(), SendError>;
}

impl<C: Connector> FrameSink for ConnectionManager<C> {
    fn send_outbound(&mut self, outbound: &Outbound) -> Result<(), SendError> {
        ConnectionManager::send_outbound(self, outbound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent(AnswerSubmission),
    /// Same action already sent in the current window.
    Duplicate,
    /// No open transport. The action is not queued.
    Dropped,
}

/// Sends user actions stamped with the server-corrected time.
#[derive(Debug)]
pub struct ActionSubmitter {
    user: String,
    last_sent: Option<(u64, String)>,
}

impl ActionSubmitter {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            last_sent: None,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Forget what was sent. Sends are only queued on the transport, so after
    /// the transport goes away the same action must be allowed again.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }

    pub fn submit(
        &mut self,
        action_id: &str,
        now_ms: u64,
        offset_ms: i64,
        window: Option<ActionWindow>,
        sink: &mut impl FrameSink,
    ) -> SubmitOutcome {
        let window_start = window.map(|w| w.action_start);

        if let (Some(start), Some((sent_start, sent_id))) = (window_start, &self.last_sent) {
            if start == *sent_start && action_id == sent_id {
                log::debug!("Action {} already sent for window {}", action_id, start);
                return SubmitOutcome::Duplicate;
            }
        }

        let submission = AnswerSubmission {
            id: action_id.to_string(),
            timestamp: corrected_timestamp(now_ms, offset_ms),
            user: self.user.clone(),
        };

        match sink.send_outbound(&Outbound::Answer(submission.clone())) {
            Ok(()) => {
                self.last_sent = window_start.map(|start| (start, action_id.to_string()));
                SubmitOutcome::Sent(submission)
            }
            Err(e) => {
                log::debug!("Dropping action {}: {}", action_id, e);
                SubmitOutcome::Dropped
            }
        }
    }
}
