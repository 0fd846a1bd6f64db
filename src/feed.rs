use log::warn;

use crate::api::ApiError;
use crate::models::{Match, MatchStatus, Participant};

/// What the renderer should show for the swipe flow.
#[derive(Debug)]
pub enum FeedView<'a> {
    Candidate {
        candidate: &'a Match,
        other: &'a Participant,
    },
    NoMoreCandidates,
}

/// Candidate list plus the display cursor. The cursor only ever moves
/// forward; running past the end is the terminal no-more-candidates state
/// and a manual `begin_refresh`/`apply_fetch` cycle is the only way back.
pub struct MatchFeed {
    me: String,
    matches: Vec<Match>,
    cursor: usize,
    generation: u64,
}

impl MatchFeed {
    pub fn new(me: &str) -> Self {
        MatchFeed {
            me: me.to_string(),
            matches: Vec::new(),
            cursor: 0,
            generation: 0,
        }
    }

    /// Starts a refresh and returns the ticket that the eventual response
    /// must present. A newer refresh invalidates older tickets, so a slow
    /// response from a superseded fetch cannot clobber current state.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Applies a fetch result. Stale tickets are ignored; a failed fetch
    /// falls back to an empty list rather than reaching the renderer.
    pub fn apply_fetch(&mut self, ticket: u64, result: Result<Vec<Match>, ApiError>) {
        if ticket != self.generation {
            warn!("ignoring stale match fetch (ticket {ticket})");
            return;
        }

        self.matches = match result {
            Ok(matches) => matches,
            Err(e) => {
                warn!("match fetch failed, showing empty feed: {}", e);
                Vec::new()
            }
        };
        self.cursor = 0;
    }

    pub fn view(&self) -> FeedView<'_> {
        if self.is_exhausted() {
            return FeedView::NoMoreCandidates;
        }
        let candidate = &self.matches[self.cursor];
        FeedView::Candidate {
            candidate,
            other: candidate.other_participant(&self.me),
        }
    }

    pub fn current(&self) -> Option<&Match> {
        self.matches.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.matches.len()
    }

    /// Settles the displayed candidate after a decision round-trip. The
    /// status is mirrored locally only when the remote write succeeded, but
    /// the cursor advances exactly once either way: a transient backend
    /// error never blocks the swipe flow.
    pub fn settle_decision(&mut self, status: MatchStatus, remote_ok: bool) {
        if remote_ok {
            if let Some(m) = self.matches.get_mut(self.cursor) {
                m.status = status;
            }
        }
        self.advance();
    }

    /// Advances past the displayed candidate without any remote write.
    pub fn skip(&mut self) {
        self.advance();
    }

    fn advance(&mut self) {
        if self.cursor < self.matches.len() {
            self.cursor += 1;
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;

    fn pending(id: &str, a: &str, b: &str) -> Match {
        Match {
            id: id.into(),
            participant_a: Participant::Id(a.into()),
            participant_b: Participant::Id(b.into()),
            score: 92.0,
            status: MatchStatus::Pending,
        }
    }

    fn feed_with(matches: Vec<Match>) -> MatchFeed {
        let mut feed = MatchFeed::new("u1");
        let ticket = feed.begin_refresh();
        feed.apply_fetch(ticket, Ok(matches));
        feed
    }

    #[test]
    fn empty_feed_shows_no_more_candidates() {
        let feed = feed_with(Vec::new());
        assert!(matches!(feed.view(), FeedView::NoMoreCandidates));
        assert!(feed.is_exhausted());
    }

    #[test]
    fn failed_fetch_falls_back_to_empty_feed() {
        let mut feed = MatchFeed::new("u1");
        let ticket = feed.begin_refresh();
        feed.apply_fetch(ticket, Err(ApiError::Status(500)));
        assert!(matches!(feed.view(), FeedView::NoMoreCandidates));
    }

    #[test]
    fn stale_fetch_response_is_ignored() {
        let mut feed = MatchFeed::new("u1");
        let stale = feed.begin_refresh();
        let fresh = feed.begin_refresh();
        feed.apply_fetch(fresh, Ok(vec![pending("m1", "u1", "u2")]));
        feed.apply_fetch(stale, Ok(Vec::new()));
        assert_eq!(feed.current().map(|m| m.id.as_str()), Some("m1"));
    }

    #[test]
    fn accept_advances_exactly_once_on_success() {
        let mut feed = feed_with(vec![pending("m1", "u1", "u2")]);
        feed.settle_decision(MatchStatus::Accepted, true);
        assert_eq!(feed.cursor(), 1);
        assert_eq!(feed.matches()[0].status, MatchStatus::Accepted);
        assert!(matches!(feed.view(), FeedView::NoMoreCandidates));
    }

    #[test]
    fn accept_advances_exactly_once_on_failure() {
        let mut feed = feed_with(vec![pending("m1", "u1", "u2"), pending("m2", "u1", "u3")]);
        feed.settle_decision(MatchStatus::Accepted, false);
        assert_eq!(feed.cursor(), 1);
        // decision was not persisted, so the status stays pending
        assert_eq!(feed.matches()[0].status, MatchStatus::Pending);
        assert_eq!(feed.current().map(|m| m.id.as_str()), Some("m2"));
    }

    #[test]
    fn cursor_never_runs_out_of_bounds() {
        let mut feed = feed_with(vec![pending("m1", "u1", "u2")]);
        feed.skip();
        feed.skip();
        feed.skip();
        assert_eq!(feed.cursor(), 1);
        assert!(matches!(feed.view(), FeedView::NoMoreCandidates));
    }

    #[test]
    fn displayed_candidate_resolves_other_participant() {
        let feed = feed_with(vec![pending("m1", "u1", "u2")]);
        match feed.view() {
            FeedView::Candidate { candidate, other } => {
                assert_eq!(candidate.id, "m1");
                assert_eq!(other.id(), "u2");
            }
            FeedView::NoMoreCandidates => panic!("expected a candidate"),
        }
    }

    #[test]
    fn refresh_after_exhaustion_restarts_the_feed() {
        let mut feed = feed_with(vec![pending("m1", "u1", "u2")]);
        feed.skip();
        assert!(feed.is_exhausted());

        let ticket = feed.begin_refresh();
        feed.apply_fetch(ticket, Ok(vec![pending("m2", "u1", "u3")]));
        assert_eq!(feed.cursor(), 0);
        assert_eq!(feed.current().map(|m| m.id.as_str()), Some("m2"));
    }
}
