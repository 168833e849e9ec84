use std::sync::Arc;

use shared::domain::{ChatMessage, ChatRole};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::service::PrecastService;

/// Assistant turn appended when the chat service cannot be reached.
pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatSnapshot {
    pub transcript: Vec<ChatMessage>,
    pub state: ChatState,
}

impl ChatSnapshot {
    pub fn is_awaiting_reply(&self) -> bool {
        self.state == ChatState::AwaitingReply
    }

    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.transcript
            .last()
            .filter(|message| message.role == ChatRole::Assistant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// A turn was already awaiting its reply; nothing happened.
    Busy,
    Replied,
    /// The service failed and the fallback reply was appended instead.
    Recovered,
}

pub struct ChatSessionController {
    service: Arc<dyn PrecastService>,
    session: watch::Sender<ChatSnapshot>,
}

impl ChatSessionController {
    pub fn new(service: Arc<dyn PrecastService>) -> Self {
        let (session, _) = watch::channel(ChatSnapshot::default());
        Self { service, session }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.session.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.session.borrow().clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.session.borrow().transcript.clone()
    }

    pub fn state(&self) -> ChatState {
        self.session.borrow().state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.session.borrow().is_awaiting_reply()
    }

    /// Starts a new conversation. Refused while a reply is outstanding.
    pub fn clear(&self) -> bool {
        let mut cleared = false;
        self.session.send_if_modified(|session| {
            if session.is_awaiting_reply() {
                return false;
            }
            cleared = true;
            let changed = !session.transcript.is_empty();
            session.transcript.clear();
            changed
        });
        cleared
    }

    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank chat input");
            return SendOutcome::Ignored;
        }

        let mut outgoing = None;
        self.session.send_if_modified(|session| {
            if session.is_awaiting_reply() {
                return false;
            }
            session.transcript.push(ChatMessage::user(text));
            session.state = ChatState::AwaitingReply;
            outgoing = Some(session.transcript.clone());
            true
        });
        let Some(transcript) = outgoing else {
            warn!("chat turn already awaiting reply; rejecting send");
            return SendOutcome::Busy;
        };

        let turn = PendingTurn {
            session: &self.session,
            answered: false,
        };

        debug!(turns = transcript.len(), "sending chat transcript");
        let (reply, outcome) = match self.service.chat(&transcript).await {
            Ok(reply) => (ChatMessage::assistant(reply), SendOutcome::Replied),
            Err(err) => {
                warn!(error = %err, "chat service failed; appending fallback reply");
                (
                    ChatMessage::assistant(CHAT_FALLBACK_REPLY),
                    SendOutcome::Recovered,
                )
            }
        };

        turn.answer(reply);
        info!(turns = transcript.len() + 1, ?outcome, "chat turn completed");
        outcome
    }
}

/// The user turn awaiting its reply. Dropping it unanswered (the `send` future was
/// cancelled) closes the turn with the fallback reply so the session stays usable.
struct PendingTurn<'a> {
    session: &'a watch::Sender<ChatSnapshot>,
    answered: bool,
}

impl PendingTurn<'_> {
    fn answer(mut self, reply: ChatMessage) {
        self.answered = true;
        close_turn(self.session, reply);
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.answered {
            warn!("chat send dropped before its reply; appending fallback reply");
            close_turn(self.session, ChatMessage::assistant(CHAT_FALLBACK_REPLY));
        }
    }
}

fn close_turn(session: &watch::Sender<ChatSnapshot>, reply: ChatMessage) {
    session.send_modify(|session| {
        session.transcript.push(reply);
        session.state = ChatState::Idle;
    });
}

#[cfg(test)]
#[path = "tests/chat_session_tests.rs"]
mod tests;
