use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default, alias = "prenom")]
    pub first_name: Option<String>,
    #[serde(default, alias = "nom")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, alias = "universite")]
    pub university: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "image")]
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (None, None) => None,
            (first, last) => {
                let parts: Vec<&str> = [first.as_deref(), last.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                Some(parts.join(" "))
            }
        }
    }
}

/// The backend returns either a joined profile object or a bare id,
/// depending on the endpoint. Normalized here instead of presence checks
/// scattered through callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Participant {
    Profile(Profile),
    Id(String),
}

impl Participant {
    pub fn id(&self) -> &str {
        match self {
            Participant::Profile(p) => &p.id,
            Participant::Id(id) => id,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Participant::Profile(p) => Some(p),
            Participant::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: String,
    pub participant_a: Participant,
    pub participant_b: Participant,
    pub score: f32,
    pub status: MatchStatus,
}

impl Match {
    /// The participant that is not `me`. Inconsistent records (neither side
    /// is `me`) fall back to participant B rather than erroring.
    pub fn other_participant(&self, me: &str) -> &Participant {
        if self.participant_a.id() == me {
            &self.participant_b
        } else if self.participant_b.id() == me {
            &self.participant_a
        } else {
            &self.participant_b
        }
    }
}

/// Scores arrive as a number on one endpoint and a string on another.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreField {
    Number(f32),
    Text(String),
}

impl ScoreField {
    pub fn value(&self) -> f32 {
        match self {
            ScoreField::Number(n) => *n,
            ScoreField::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

/// Raw match record as returned by the backend. Two observed shapes:
/// joined profiles under `user1`/`user2` with `score`, or bare
/// `student1_id`/`student2_id` with a stringly `match_score` and `status`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user1: Option<Profile>,
    #[serde(default)]
    pub user2: Option<Profile>,
    #[serde(default)]
    pub student1_id: Option<String>,
    #[serde(default)]
    pub student2_id: Option<String>,
    #[serde(default)]
    pub score: Option<ScoreField>,
    #[serde(default)]
    pub match_score: Option<ScoreField>,
    #[serde(default)]
    pub status: Option<MatchStatus>,
}

impl MatchRecord {
    /// Collapses the endpoint-specific shapes into one `Match`. Records
    /// missing both participants are unusable and dropped by the caller.
    pub fn normalize(self) -> Option<Match> {
        let participant_a = self
            .user1
            .map(Participant::Profile)
            .or(self.student1_id.map(Participant::Id))?;
        let participant_b = self
            .user2
            .map(Participant::Profile)
            .or(self.student2_id.map(Participant::Id))?;

        // The list endpoint omits ids; synthesize one so cursor and
        // conversation keys stay stable for the session.
        let id = self
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let score = self
            .score
            .or(self.match_score)
            .map_or(0.0, |s| s.value());

        Some(Match {
            id,
            participant_a,
            participant_b,
            score,
            status: self.status.unwrap_or(MatchStatus::Pending),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// Raw message record; the conversation id is implied by the request path
/// and injected during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    #[serde(alias = "sender")]
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl MessageRecord {
    pub fn normalize(self, conversation_id: &str) -> Message {
        Message {
            id: self.id,
            conversation_id: conversation_id.to_string(),
            sender_id: self.sender_id,
            content: self.content,
            timestamp: self.timestamp,
            read: self.read,
        }
    }
}
