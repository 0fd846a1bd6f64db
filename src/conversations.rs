use serde::Serialize;

use crate::models::{Match, MatchStatus};

/// Who the conversation is with, as shown in the list. Never blank: when
/// the backend gives no joined profile, a synthetic label derived from the
/// match id stands in.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayIdentity {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: String,
    pub match_id: String,
    pub identity: DisplayIdentity,
    pub compatibility: f32,
    pub new_match: bool,
}

fn fallback_label(match_id: &str) -> String {
    let short: String = match_id.chars().take(4).collect();
    format!("Match {short}")
}

/// Display identity for the other side of a match, degrading from joined
/// profile name to the synthetic label.
pub fn display_identity(m: &Match, me: &str) -> DisplayIdentity {
    let other = m.other_participant(me);
    match other.profile() {
        Some(profile) => DisplayIdentity {
            name: profile
                .display_name()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| fallback_label(&m.id)),
            avatar_url: profile.avatar_url.clone(),
        },
        None => DisplayIdentity {
            name: fallback_label(&m.id),
            avatar_url: None,
        },
    }
}

fn conversation_from(m: &Match, me: &str, new_match: bool) -> Conversation {
    Conversation {
        id: m.id.clone(),
        match_id: m.id.clone(),
        identity: display_identity(m, me),
        compatibility: m.score,
        new_match,
    }
}

/// Conversation list: one entry per accepted match, in match order. A
/// conversation exists implicitly once its match is accepted; the client
/// never creates or deletes one.
pub fn derive(matches: &[Match], me: &str) -> Vec<Conversation> {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::Accepted)
        .map(|m| conversation_from(m, me, false))
        .collect()
}

/// The "new matches" strip: pending matches shown apart from the
/// conversation list.
pub fn pending_strip(matches: &[Match], me: &str) -> Vec<Conversation> {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::Pending)
        .map(|m| conversation_from(m, me, true))
        .collect()
}
