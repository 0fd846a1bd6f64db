use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Match, MatchRecord, Message, MessageRecord};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Serialize)]
struct DecisionBody<'a> {
    student1_id: &'a str,
    student2_id: &'a str,
    match_score: f32,
    decision: &'a str,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    #[serde(rename = "matchId")]
    match_id: &'a str,
    sender: &'a str,
    content: &'a str,
}

/// The match list arrives wrapped in a `{"matches": [...]}` envelope on one
/// endpoint and as a bare array on another.
#[derive(Deserialize)]
#[serde(untagged)]
enum MatchesPayload {
    Wrapped { matches: Vec<MatchRecord> },
    Bare(Vec<MatchRecord>),
}

impl MatchesPayload {
    fn records(self) -> Vec<MatchRecord> {
        match self {
            MatchesPayload::Wrapped { matches } => matches,
            MatchesPayload::Bare(records) => records,
        }
    }
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    messages: Vec<MessageRecord>,
}

/// HTTP boundary to the Binomi backend. Attaches the session bearer token
/// to protected calls; all failures surface as `ApiError` and callers pick
/// the fallback.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.get(format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.post(format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Matches involving the given student, in server order. Server order
    /// is the contract; no client-side sort is applied. Records that
    /// normalize to nothing are dropped.
    pub async fn fetch_matches(&self, student_id: &str) -> Result<Vec<Match>, ApiError> {
        let response = self
            .get(&format!("/matches/matches/{student_id}"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let payload: MatchesPayload = response.json().await?;
        let matches: Vec<Match> = payload
            .records()
            .into_iter()
            .filter_map(MatchRecord::normalize)
            .collect();
        debug!("fetched {} matches for {}", matches.len(), student_id);
        Ok(matches)
    }

    /// Records an accept/reject decision for a displayed match.
    pub async fn send_decision(
        &self,
        m: &Match,
        decision: Decision,
    ) -> Result<(), ApiError> {
        let body = DecisionBody {
            student1_id: m.participant_a.id(),
            student2_id: m.participant_b.id(),
            match_score: m.score,
            decision: match decision {
                Decision::Accept => "accepted",
                Decision::Reject => "rejected",
            },
        };
        let response = self.post("/matches/matches/").json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// All messages of one conversation, in server-returned order.
    pub async fn fetch_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let response = self
            .get(&format!("/messages/{conversation_id}"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let envelope: MessagesEnvelope = response.json().await?;
        Ok(envelope
            .messages
            .into_iter()
            .map(|r| r.normalize(conversation_id))
            .collect())
    }

    /// Posts a message; the server echo is the persisted record.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let body = OutgoingMessage {
            match_id: conversation_id,
            sender: sender_id,
            content,
        };
        let response = self
            .post(&format!("/messages/{conversation_id}"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let echoed: MessageRecord = response.json().await?;
        Ok(echoed.normalize(conversation_id))
    }

    /// The logged-in student's own profile.
    pub async fn fetch_profile(&self) -> Result<Value, ApiError> {
        let response = self.get("/student/me").send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Updates the logged-in student's profile; returns the saved record.
    pub async fn update_profile(&self, profile: &Value) -> Result<Value, ApiError> {
        let builder = self.http.put(format!("{}/student/me", self.base_url));
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.json(profile).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    #[test]
    fn decodes_wrapped_match_payload() {
        let raw = r#"{"matches": [
            {"id": "m1", "student1_id": "u1", "student2_id": "u2",
             "match_score": "92", "status": "pending"}
        ]}"#;
        let payload: MatchesPayload = serde_json::from_str(raw).unwrap();
        let matches: Vec<Match> = payload
            .records()
            .into_iter()
            .filter_map(MatchRecord::normalize)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "m1");
        assert_eq!(matches[0].status, MatchStatus::Pending);
    }

    #[test]
    fn decodes_bare_match_payload() {
        let raw = r#"[
            {"user1": {"id": "u1"}, "user2": {"id": "u2"}, "score": 78.5}
        ]"#;
        let payload: MatchesPayload = serde_json::from_str(raw).unwrap();
        let matches: Vec<Match> = payload
            .records()
            .into_iter()
            .filter_map(MatchRecord::normalize)
            .collect();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - 78.5).abs() < f32::EPSILON);
    }

    #[test]
    fn preserves_server_order() {
        let raw = r#"{"matches": [
            {"id": "m2", "student1_id": "u1", "student2_id": "u3"},
            {"id": "m1", "student1_id": "u1", "student2_id": "u2"}
        ]}"#;
        let payload: MatchesPayload = serde_json::from_str(raw).unwrap();
        let ids: Vec<String> = payload
            .records()
            .into_iter()
            .filter_map(MatchRecord::normalize)
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["m2", "m1"]);
    }
}
