use log::debug;
use tokio::sync::mpsc;

use crate::api::{ApiClient, Decision};
use crate::channel::{ChannelError, MessageChannel};
use crate::conversations::{self, Conversation};
use crate::events::ServerEvent;
use crate::feed::{FeedView, MatchFeed};
use crate::models::{Match, MatchStatus, Message};
use crate::session::Session;

/// Non-blocking user notification, the toast analog.
#[derive(Debug, Clone)]
pub enum Notice {
    Info(String),
    Warn(String),
}

/// Owns all client view state: the candidate feed, the conversation list,
/// the selected conversation and its thread. Each piece is mutated only
/// here; the renderer reads snapshots.
pub struct App {
    session: Session,
    api: ApiClient,
    feed: MatchFeed,
    conversations: Vec<Conversation>,
    selected: Option<String>,
    messages: Vec<Message>,
    notices: mpsc::Sender<Notice>,
    offline: bool,
}

impl App {
    pub fn new(session: Session, api: ApiClient) -> (Self, mpsc::Receiver<Notice>) {
        let (notices, rx) = mpsc::channel(16);
        let feed = MatchFeed::new(&session.user_id);
        let app = App {
            session,
            api,
            feed,
            conversations: Vec::new(),
            selected: None,
            messages: Vec::new(),
            notices,
            offline: false,
        };
        (app, rx)
    }

    /// Offline mode (demo): decisions settle locally without a backend.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Toast semantics: dropped when nobody listens or the queue is full,
    /// never blocking orchestration.
    fn notify(&self, notice: Notice) {
        let _ = self.notices.try_send(notice);
    }

    pub async fn refresh_matches(&mut self) {
        let ticket = self.feed.begin_refresh();
        let result = self.api.fetch_matches(&self.session.user_id).await;
        if result.is_err() {
            self.notify(Notice::Warn("Could not load matches".to_string()));
        }
        self.feed.apply_fetch(ticket, result);
        self.rebuild_conversations();
    }

    /// Seeds the feed locally, bypassing the backend (demo mode).
    pub fn seed_matches(&mut self, matches: Vec<Match>) {
        let ticket = self.feed.begin_refresh();
        self.feed.apply_fetch(ticket, Ok(matches));
        self.rebuild_conversations();
    }

    // Derivation from the match list is authoritative: conversations
    // prepended by a new_conversation push survive only until the next
    // rebuild, when the refreshed match list takes over.
    fn rebuild_conversations(&mut self) {
        self.conversations =
            conversations::derive(self.feed.matches(), &self.session.user_id);
    }

    pub async fn accept(&mut self) {
        self.decide(Decision::Accept, MatchStatus::Accepted).await;
    }

    pub async fn reject(&mut self) {
        self.decide(Decision::Reject, MatchStatus::Rejected).await;
    }

    async fn decide(&mut self, decision: Decision, status: MatchStatus) {
        let Some(current) = self.feed.current().cloned() else {
            return;
        };
        let result = if self.offline {
            Ok(())
        } else {
            self.api.send_decision(&current, decision).await
        };
        if let Err(e) = &result {
            self.notify(Notice::Warn(format!("Decision was not saved: {e}")));
        } else if status == MatchStatus::Accepted {
            self.notify(Notice::Info("It's a match! You can now chat.".to_string()));
        }
        // the cursor advances exactly once whether or not the write landed
        self.feed.settle_decision(status, result.is_ok());
        self.rebuild_conversations();
    }

    pub fn skip(&mut self) {
        self.feed.skip();
    }

    /// The signed-in student's profile, or None when it cannot be loaded.
    pub async fn my_profile(&self) -> Option<serde_json::Value> {
        if self.offline {
            return None;
        }
        match self.api.fetch_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                self.notify(Notice::Warn(format!("Could not load profile: {e}")));
                None
            }
        }
    }

    /// Selecting a conversation replaces the thread wholesale with whatever
    /// the channel returns; a failed open degrades to an empty thread.
    pub async fn select_conversation(
        &mut self,
        conversation_id: &str,
        channel: &mut dyn MessageChannel,
    ) {
        self.selected = Some(conversation_id.to_string());
        match channel.open(conversation_id).await {
            Ok(thread) => self.messages = thread,
            Err(e) => {
                self.messages = Vec::new();
                self.notify(Notice::Warn(format!("Could not load messages: {e}")));
            }
        }
    }

    pub async fn send_message(&mut self, channel: &mut dyn MessageChannel, content: &str) {
        let Some(conversation_id) = self.selected.clone() else {
            self.notify(Notice::Warn("No conversation selected".to_string()));
            return;
        };
        match channel
            .send(&conversation_id, &self.session.user_id, content)
            .await
        {
            Ok(Some(echo)) => self.messages.push(echo),
            // event transport: the echo arrives as a pushed event
            Ok(None) => {}
            // blank input, nothing was sent and nothing is shown
            Err(ChannelError::EmptyMessage) => {}
            Err(e) => {
                self.notify(Notice::Warn(format!("Message was not delivered: {e}")));
            }
        }
    }

    /// Saves profile changes. Failures surface as a notice, never an error;
    /// returns whether the update landed.
    pub async fn update_my_profile(&self, profile: &serde_json::Value) -> bool {
        if self.offline {
            return false;
        }
        match self.api.update_profile(profile).await {
            Ok(_) => {
                self.notify(Notice::Info("Profile updated.".to_string()));
                true
            }
            Err(e) => {
                self.notify(Notice::Warn(format!("Profile update failed: {e}")));
                false
            }
        }
    }

    /// Applies one pushed event. Messages for conversations other than the
    /// selected one are dropped; new conversations are prepended
    /// unconditionally.
    pub fn apply_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::MessageReceived {
                conversation_id,
                message,
            } => {
                if self.selected.as_deref() == Some(conversation_id.as_str()) {
                    self.messages.push(message.normalize(&conversation_id));
                } else {
                    debug!("dropping message for unselected conversation {conversation_id}");
                }
            }
            ServerEvent::NewConversation { conversation } => {
                self.conversations.insert(0, conversation.normalize());
            }
            ServerEvent::Error { message } => self.notify(Notice::Warn(message)),
        }
    }

    pub fn feed_view(&self) -> FeedView<'_> {
        self.feed.view()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn pending_strip(&self) -> Vec<Conversation> {
        conversations::pending_strip(self.feed.matches(), &self.session.user_id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
