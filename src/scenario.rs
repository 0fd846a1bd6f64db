//! The static presentation scenario: Sarah and Yassine, 92% compatible,
//! two scripted messages. Drives the offline demo mode through the same
//! orchestration paths as the live backend.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::channel::{non_blank, ChannelError, MessageChannel};
use crate::models::{Match, MatchStatus, Message, Participant, Profile};
use crate::session::Session;

pub const DEMO_USER_ID: &str = "sarah";
pub const DEMO_MATCH_ID: &str = "demo-match-1";

pub fn demo_session() -> Session {
    Session {
        user_id: DEMO_USER_ID.to_string(),
        token: "demo".to_string(),
    }
}

fn sarah() -> Profile {
    Profile {
        id: DEMO_USER_ID.to_string(),
        first_name: Some("Sarah".to_string()),
        last_name: None,
        age: None,
        university: Some("Université de Tunis El Manar".to_string()),
        tags: vec![
            "Calme".to_string(),
            "Non fumeuse".to_string(),
            "Se couche tôt".to_string(),
        ],
        avatar_url: Some("sarah.jpg".to_string()),
    }
}

fn yassine() -> Profile {
    Profile {
        id: "yassine".to_string(),
        first_name: Some("Yassine".to_string()),
        last_name: None,
        age: None,
        university: Some("Université de Tunis El Manar".to_string()),
        tags: vec![
            "Non fumeur".to_string(),
            "Adore cuisiner".to_string(),
            "Propre".to_string(),
        ],
        avatar_url: Some("yassine.jpg".to_string()),
    }
}

pub fn demo_matches() -> Vec<Match> {
    vec![Match {
        id: DEMO_MATCH_ID.to_string(),
        participant_a: Participant::Profile(sarah()),
        participant_b: Participant::Profile(yassine()),
        score: 92.0,
        status: MatchStatus::Pending,
    }]
}

pub fn demo_thread(conversation_id: &str) -> Vec<Message> {
    let scripted = [
        (
            DEMO_USER_ID,
            "Salut ! J’ai vu qu’on avait beaucoup de points en commun. \
             Tu veux qu’on se capte autour d’un café pour parler logement ?",
        ),
        (
            "yassine",
            "Oui, avec plaisir ! J’ai déjà repéré quelques annonces, on peut en discuter.",
        ),
    ];
    scripted
        .into_iter()
        .map(|(sender, content)| Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            read: true,
        })
        .collect()
}

/// Backend-free channel: serves the scripted thread and echoes sends
/// locally so the console flow works end to end offline.
pub struct DemoChannel;

#[async_trait]
impl MessageChannel for DemoChannel {
    async fn open(&mut self, conversation_id: &str) -> Result<Vec<Message>, ChannelError> {
        Ok(demo_thread(conversation_id))
    }

    async fn send(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Option<Message>, ChannelError> {
        let content = non_blank(content)?;
        Ok(Some(Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            read: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_candidate_resolves_to_yassine() {
        let matches = demo_matches();
        assert_eq!(matches.len(), 1);
        let other = matches[0].other_participant(DEMO_USER_ID);
        assert_eq!(other.id(), "yassine");
        assert!((matches[0].score - 92.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn demo_channel_serves_the_scripted_thread() {
        let mut channel = DemoChannel;
        let thread = channel.open(DEMO_MATCH_ID).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].sender_id, DEMO_USER_ID);
        assert_eq!(thread[1].sender_id, "yassine");

        let echo = channel.send(DEMO_MATCH_ID, DEMO_USER_ID, "ok!").await.unwrap();
        assert_eq!(echo.unwrap().content, "ok!");

        assert!(matches!(
            channel.send(DEMO_MATCH_ID, DEMO_USER_ID, "  ").await,
            Err(ChannelError::EmptyMessage)
        ));
    }
}
