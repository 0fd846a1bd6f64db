use serde::{Deserialize, Serialize};

use crate::conversations::{Conversation, DisplayIdentity};
use crate::models::{MessageRecord, ScoreField};

#[derive(Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "register")]
    Register {
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "send_message")]
    SendMessage {
        #[serde(rename = "conversationId")]
        conversation_id: String,
        #[serde(rename = "senderId")]
        sender_id: String,
        text: String,
    },
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "message_received")]
    MessageReceived {
        #[serde(rename = "conversationId")]
        conversation_id: String,
        message: MessageRecord,
    },
    #[serde(rename = "new_conversation")]
    NewConversation { conversation: ConversationRecord },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Conversation as pushed by the server; may carry a server-issued id
/// distinct from the match id, and a pre-joined display name.
#[derive(Serialize, Deserialize, Clone)]
pub struct ConversationRecord {
    pub id: String,
    #[serde(default, rename = "matchId")]
    pub match_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub compatibility: Option<ScoreField>,
}

impl ConversationRecord {
    pub fn normalize(self) -> Conversation {
        let match_id = self.match_id.unwrap_or_else(|| self.id.clone());
        let name = self.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            let short: String = match_id.chars().take(4).collect();
            format!("Match {short}")
        });
        Conversation {
            id: self.id,
            match_id,
            identity: DisplayIdentity {
                name,
                avatar_url: None,
            },
            compatibility: self.compatibility.map_or(0.0, |s| s.value()),
            new_match: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_event_wire_shape() {
        let raw = serde_json::to_string(&ClientEvent::Register {
            user_id: "u1".into(),
        })
        .unwrap();
        assert_eq!(raw, r#"{"type":"register","userId":"u1"}"#);
    }

    #[test]
    fn send_message_event_wire_shape() {
        let raw = serde_json::to_string(&ClientEvent::SendMessage {
            conversation_id: "m1".into(),
            sender_id: "u1".into(),
            text: "salut".into(),
        })
        .unwrap();
        assert_eq!(
            raw,
            r#"{"type":"send_message","conversationId":"m1","senderId":"u1","text":"salut"}"#
        );
    }

    #[test]
    fn parses_message_received_event() {
        let raw = r#"{
            "type": "message_received",
            "conversationId": "m1",
            "message": {
                "id": "msg1",
                "sender": "u2",
                "content": "salut",
                "timestamp": "2025-09-01T10:00:00Z"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        match event {
            ServerEvent::MessageReceived {
                conversation_id,
                message,
            } => {
                assert_eq!(conversation_id, "m1");
                assert_eq!(message.sender_id, "u2");
            }
            _ => panic!("wrong event kind"),
        }
    }

    #[test]
    fn pushed_conversation_gets_fallback_name() {
        let raw = r#"{
            "type": "new_conversation",
            "conversation": {"id": "c9", "matchId": "m4ab2", "compatibility": "92"}
        }"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        match event {
            ServerEvent::NewConversation { conversation } => {
                let c = conversation.normalize();
                assert_eq!(c.id, "c9");
                assert_eq!(c.match_id, "m4ab2");
                assert_eq!(c.identity.name, "Match m4ab");
                assert!((c.compatibility - 92.0).abs() < f32::EPSILON);
            }
            _ => panic!("wrong event kind"),
        }
    }
}
