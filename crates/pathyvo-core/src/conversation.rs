//! # Mentor Conversation
//!
//! Transcript of a roadmap's mentor chat, seeded from the stored history.
//!
//! ```text
//! IDLE ──begin_send──► AWAITING_REPLY ──receive_reply / fail_reply──► IDLE
//! ```
//!
//! Only one turn may be in flight. The backend walks each conversation
//! through a fixed sequence of stages, one per user answer, until it
//! generates the roadmap and switches to open-ended mentoring.

use crate::activity::parse_timestamp;
use crate::types::{PathyvoError, RoadmapId, UserId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub sent_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReply,
}

// =============================================================================
// STAGES
// =============================================================================

/// Where the backend is in its career-guidance script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    #[default]
    InterestsStrengths,
    PreferredField,
    ValuesMotivation,
    WorkStyle,
    LongTermVision,
    RoadmapGeneration,
    Mentoring,
}

impl ConversationStage {
    /// Stages in script order.
    pub const ALL: [ConversationStage; 7] = [
        ConversationStage::InterestsStrengths,
        ConversationStage::PreferredField,
        ConversationStage::ValuesMotivation,
        ConversationStage::WorkStyle,
        ConversationStage::LongTermVision,
        ConversationStage::RoadmapGeneration,
        ConversationStage::Mentoring,
    ];

    /// The stage the backend assigns after `answers` user messages.
    #[must_use]
    pub fn after_user_messages(answers: usize) -> Self {
        Self::ALL
            .get(answers)
            .copied()
            .unwrap_or(ConversationStage::Mentoring)
    }

    /// 1-based position in the script.
    #[must_use]
    pub fn step(self) -> usize {
        self as usize + 1
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ConversationStage::InterestsStrengths => "Interests & strengths",
            ConversationStage::PreferredField => "Preferred field",
            ConversationStage::ValuesMotivation => "Values & motivation",
            ConversationStage::WorkStyle => "Work style",
            ConversationStage::LongTermVision => "Long-term vision",
            ConversationStage::RoadmapGeneration => "Roadmap generation",
            ConversationStage::Mentoring => "Mentoring",
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A stored message from `GET /chat/roadmap/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub sender: Sender,
    pub content: String,
    pub roadmap_id: RoadmapId,
    pub user_id: UserId,
    pub timestamp: String,
}

/// Body of `POST /ai/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorReply {
    pub message: String,
    pub stage: ConversationStage,
    #[serde(default)]
    pub roadmap_ready: bool,
}

/// Body of `POST /ai/create-roadmap-conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapConversation {
    pub roadmap_id: RoadmapId,
    pub initial_message: String,
    #[serde(default)]
    pub stage: ConversationStage,
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    state: ConversationState,
    stage: ConversationStage,
    roadmap_ready: bool,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation from stored messages, oldest first.
    ///
    /// Messages whose timestamp cannot be parsed are stamped `loaded_at`.
    /// The stage follows the number of user messages, as on the backend.
    #[must_use]
    pub fn from_history(history: &[StoredMessage], loaded_at: NaiveDateTime) -> Self {
        let mut messages: Vec<ChatMessage> = history
            .iter()
            .map(|m| ChatMessage {
                sender: m.sender,
                content: m.content.clone(),
                sent_at: parse_timestamp(&m.timestamp).unwrap_or(loaded_at),
            })
            .collect();
        messages.sort_by_key(|m| m.sent_at);

        let answers = messages.iter().filter(|m| m.sender == Sender::User).count();
        let stage = ConversationStage::after_user_messages(answers);
        Self {
            messages,
            state: ConversationState::Idle,
            stage,
            roadmap_ready: stage == ConversationStage::Mentoring,
        }
    }

    /// A fresh conversation opened by the mentor's greeting.
    #[must_use]
    pub fn started(opening: &RoadmapConversation, at: NaiveDateTime) -> Self {
        Self {
            messages: vec![ChatMessage {
                sender: Sender::Ai,
                content: opening.initial_message.clone(),
                sent_at: at,
            }],
            state: ConversationState::Idle,
            stage: opening.stage,
            roadmap_ready: false,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    /// Whether the backend has generated the roadmap's milestones.
    pub fn roadmap_ready(&self) -> bool {
        self.roadmap_ready
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record the user's message and wait for the reply.
    ///
    /// Returns the trimmed text to post. The transcript is unchanged on error.
    pub fn begin_send(&mut self, text: &str, at: NaiveDateTime) -> Result<String, PathyvoError> {
        if self.state == ConversationState::AwaitingReply {
            return Err(PathyvoError::AwaitingReply);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PathyvoError::EmptyMessage);
        }
        self.messages.push(ChatMessage {
            sender: Sender::User,
            content: trimmed.to_string(),
            sent_at: at,
        });
        self.state = ConversationState::AwaitingReply;
        Ok(trimmed.to_string())
    }

    /// Append the mentor's reply and take its stage. Ignored unless a reply
    /// is pending. `roadmap_ready` never goes back to false.
    pub fn receive_reply(&mut self, reply: MentorReply, at: NaiveDateTime) {
        if self.state != ConversationState::AwaitingReply {
            return;
        }
        self.messages.push(ChatMessage {
            sender: Sender::Ai,
            content: reply.message,
            sent_at: at,
        });
        self.stage = reply.stage;
        self.roadmap_ready |= reply.roadmap_ready;
        self.state = ConversationState::Idle;
    }

    /// The pending turn failed; the user's message stays in the transcript.
    pub fn fail_reply(&mut self) {
        self.state = ConversationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date")
    }

    fn reply(message: &str, stage: ConversationStage, ready: bool) -> MentorReply {
        MentorReply {
            message: message.to_string(),
            stage,
            roadmap_ready: ready,
        }
    }

    fn stored(id: u64, sender: Sender, timestamp: &str) -> StoredMessage {
        StoredMessage {
            id,
            sender,
            content: format!("message {id}"),
            roadmap_id: RoadmapId(3),
            user_id: UserId(7),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn send_and_reply_cycle() {
        let mut chat = Conversation::new();
        assert_eq!(chat.begin_send("  How do I start?  ", now()), Ok("How do I start?".into()));
        assert_eq!(chat.state(), ConversationState::AwaitingReply);

        chat.receive_reply(
            reply("Which field interests you?", ConversationStage::PreferredField, false),
            now(),
        );
        assert_eq!(chat.state(), ConversationState::Idle);
        assert_eq!(chat.stage(), ConversationStage::PreferredField);
        let senders: Vec<Sender> = chat.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Ai]);
    }

    #[test]
    fn rejects_blank_message() {
        let mut chat = Conversation::new();
        assert_eq!(chat.begin_send(" \n\t", now()), Err(PathyvoError::EmptyMessage));
        assert!(chat.messages().is_empty());
        assert_eq!(chat.state(), ConversationState::Idle);
    }

    #[test]
    fn rejects_second_send_while_waiting() {
        let mut chat = Conversation::new();
        assert!(chat.begin_send("first", now()).is_ok());
        assert_eq!(chat.begin_send("second", now()), Err(PathyvoError::AwaitingReply));
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn failure_returns_to_idle() {
        let mut chat = Conversation::new();
        assert!(chat.begin_send("hello", now()).is_ok());
        chat.fail_reply();
        assert_eq!(chat.state(), ConversationState::Idle);
        assert_eq!(chat.stage(), ConversationStage::InterestsStrengths);
        assert!(chat.begin_send("again", now()).is_ok());
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn stray_reply_is_ignored() {
        let mut chat = Conversation::new();
        chat.receive_reply(reply("unsolicited", ConversationStage::Mentoring, true), now());
        assert!(chat.messages().is_empty());
        assert!(!chat.roadmap_ready());
    }

    #[test]
    fn roadmap_ready_sticks() {
        let mut chat = Conversation::new();
        assert!(chat.begin_send("done", now()).is_ok());
        chat.receive_reply(reply("Roadmap created", ConversationStage::Mentoring, true), now());
        assert!(chat.begin_send("thanks", now()).is_ok());
        chat.receive_reply(reply("Anytime", ConversationStage::Mentoring, false), now());
        assert!(chat.roadmap_ready());
    }

    #[test]
    fn stage_follows_user_answers() {
        assert_eq!(
            ConversationStage::after_user_messages(0),
            ConversationStage::InterestsStrengths
        );
        assert_eq!(
            ConversationStage::after_user_messages(4),
            ConversationStage::LongTermVision
        );
        assert_eq!(
            ConversationStage::after_user_messages(5),
            ConversationStage::RoadmapGeneration
        );
        assert_eq!(ConversationStage::after_user_messages(40), ConversationStage::Mentoring);
        assert_eq!(ConversationStage::WorkStyle.step(), 4);
    }

    #[test]
    fn history_is_ordered_and_staged() {
        let history = vec![
            stored(2, Sender::User, "2025-03-01T10:05:00"),
            stored(1, Sender::Ai, "2025-03-01T10:00:00"),
            stored(3, Sender::Ai, "2025-03-01T10:06:00"),
        ];
        let chat = Conversation::from_history(&history, now());
        let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 1", "message 2", "message 3"]);
        assert_eq!(chat.stage(), ConversationStage::PreferredField);
        assert!(!chat.roadmap_ready());
        assert_eq!(chat.state(), ConversationState::Idle);
    }

    #[test]
    fn long_history_is_mentoring() {
        let history: Vec<StoredMessage> = (0..6)
            .map(|i| stored(i, Sender::User, "not a date"))
            .collect();
        let chat = Conversation::from_history(&history, now());
        assert_eq!(chat.stage(), ConversationStage::Mentoring);
        assert!(chat.roadmap_ready());
        assert!(chat.messages().iter().all(|m| m.sent_at == now()));
    }

    #[test]
    fn started_conversation_opens_with_greeting() {
        let opening = RoadmapConversation {
            roadmap_id: RoadmapId(9),
            initial_message: "Tell me what you enjoy.".into(),
            stage: ConversationStage::InterestsStrengths,
        };
        let chat = Conversation::started(&opening, now());
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].sender, Sender::Ai);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Sender::Ai).expect("json"), "\"ai\"");
        assert_eq!(serde_json::to_string(&Sender::User).expect("json"), "\"user\"");
        let reply: MentorReply = serde_json::from_str(
            r#"{"message": "Great", "stage": "values_motivation", "roadmap_ready": false}"#,
        )
        .expect("json");
        assert_eq!(reply.stage, ConversationStage::ValuesMotivation);
        let stored: StoredMessage = serde_json::from_str(
            r#"{"id": 1, "type": "ai", "content": "Hi", "roadmap_id": 3, "user_id": 7,
                "timestamp": "2025-03-01T10:00:00.123456"}"#,
        )
        .expect("json");
        assert_eq!(stored.sender, Sender::Ai);
    }
}
