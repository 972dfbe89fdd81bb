//! Expert chat service: the server side of the session lifecycle.
//!
//! Every write is followed by a re-read of the row and one `SessionChange`
//! on the feed carrying it. Message appends read the array, push one entry,
//! and write the array back whole; two concurrent appends can lose one of
//! the messages. Status writes are compare-and-set against the status the
//! caller read, so a stale transition fails instead of rewinding the row.

use chrono::{DateTime, Utc};
use haven_types::error::{ExpertChatError, RepositoryError};
use haven_types::event::SessionChange;
use haven_types::expert::{
    ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus, NewExpertSession,
};
use haven_types::identity::Principal;
use haven_types::message::{ChatMessage, SenderRole};
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::feed::{ChangeFeed, SessionSubscription};
use crate::expert::access::AccessPolicy;
use crate::repository::expert::ExpertSessionRepository;

/// Orchestrates expert session writes, access checks, and change publishing.
///
/// Generic over `ExpertSessionRepository` so haven-core never depends on
/// haven-infra.
pub struct ExpertChatService<R: ExpertSessionRepository> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: ExpertSessionRepository> ExpertChatService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Create a `pending` session with the initial system message.
    pub async fn create_session(
        &self,
        principal: &Principal,
        request: NewExpertSession,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        if request.reason.trim().is_empty() {
            return Err(ExpertChatError::Validation(
                "please describe why you would like to speak with an expert".to_string(),
            ));
        }

        let session = ExpertChatSession::new_pending(principal.user_id, &request);
        self.repo.insert_session(&session).await?;

        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            urgency = %session.urgency,
            "expert session requested"
        );
        self.feed.publish(SessionChange::Inserted {
            session: session.clone(),
        });
        Ok(session)
    }

    /// Append one message and write the whole array back.
    ///
    /// An admin reply makes the replying admin the assigned one, which also
    /// accepts a `pending` session.
    pub async fn append_message(
        &self,
        principal: &Principal,
        session_id: &Uuid,
        text: &str,
        sender: SenderRole,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExpertChatError::Validation(
                "message cannot be empty".to_string(),
            ));
        }

        let session = self.load(session_id).await?;
        AccessPolicy::ensure_can_append(principal, &session, sender)?;
        if !session.accepts_messages() {
            return Err(ExpertChatError::SessionClosed);
        }

        let message = ChatMessage::new(text, sender);
        let now = message.timestamp;
        let mut messages = session.messages;
        messages.push(message);
        self.repo
            .replace_messages(session_id, &messages, now)
            .await
            .map_err(not_found)?;

        if principal.is_admin() && session.admin_id != Some(principal.user_id) {
            self.claim_for_reply(session_id, session.status, principal.user_id, now)
                .await?;
        }

        debug!(session_id = %session_id, sender = %sender, count = messages.len(), "message appended");
        self.publish_updated(session_id).await
    }

    /// Admin takes a `pending` session: `pending -> active`, admin id set.
    pub async fn accept(
        &self,
        principal: &Principal,
        session_id: &Uuid,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        AccessPolicy::ensure_can_transition(principal)?;
        let session = self.load(session_id).await?;
        self.transition(&session, ExpertSessionStatus::Active, Some(principal.user_id))
            .await?;

        info!(session_id = %session_id, admin_id = %principal.user_id, "expert session accepted");
        self.publish_updated(session_id).await
    }

    /// Admin closes an `active` session: `active -> completed`.
    pub async fn complete(
        &self,
        principal: &Principal,
        session_id: &Uuid,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        AccessPolicy::ensure_can_transition(principal)?;
        let session = self.load(session_id).await?;
        self.transition(&session, ExpertSessionStatus::Completed, session.admin_id)
            .await?;

        info!(session_id = %session_id, "expert session completed");
        self.publish_updated(session_id).await
    }

    pub async fn get_session(
        &self,
        principal: &Principal,
        session_id: &Uuid,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        let session = self.load(session_id).await?;
        AccessPolicy::ensure_can_view(principal, &session)?;
        Ok(session)
    }

    /// Users only ever see their own sessions, whatever the filter says.
    pub async fn list_sessions(
        &self,
        principal: &Principal,
        mut filter: ExpertSessionFilter,
    ) -> Result<Vec<ExpertChatSession>, ExpertChatError> {
        if !principal.is_admin() {
            filter.user_id = Some(principal.user_id);
        }
        Ok(self.repo.list_sessions(&filter).await?)
    }

    pub async fn delete_session(
        &self,
        principal: &Principal,
        session_id: &Uuid,
    ) -> Result<(), ExpertChatError> {
        let session = self.load(session_id).await?;
        AccessPolicy::ensure_can_delete(principal, &session)?;
        self.repo
            .delete_session(session_id)
            .await
            .map_err(not_found)?;

        info!(session_id = %session_id, "expert session deleted");
        self.feed.publish(SessionChange::Deleted {
            session_id: session.id,
            user_id: session.user_id,
        });
        Ok(())
    }

    /// Watch one session. Returns the current row alongside the subscription
    /// so the caller starts from a known state.
    pub async fn subscribe(
        &self,
        principal: &Principal,
        session_id: &Uuid,
    ) -> Result<(ExpertChatSession, SessionSubscription), ExpertChatError> {
        // Subscribe before reading so no change slips between the two.
        let subscription = self.feed.subscribe_session(*session_id);
        let session = self.get_session(principal, session_id).await?;
        Ok((session, subscription))
    }

    /// Watch every session (admins only).
    pub fn subscribe_all(
        &self,
        principal: &Principal,
    ) -> Result<SessionSubscription, ExpertChatError> {
        AccessPolicy::ensure_can_watch_all(principal)?;
        Ok(self.feed.subscribe_all())
    }

    /// Watch the caller's own sessions.
    pub fn subscribe_own(&self, principal: &Principal) -> SessionSubscription {
        self.feed.subscribe_user(principal.user_id)
    }

    /// Move `session` to `next`, provided the stored row still has the status
    /// it was read with. Otherwise report the transition from whatever the
    /// row holds now.
    async fn transition(
        &self,
        session: &ExpertChatSession,
        next: ExpertSessionStatus,
        admin_id: Option<Uuid>,
    ) -> Result<(), ExpertChatError> {
        ensure_transition(session, next)?;
        match self
            .repo
            .set_status(&session.id, session.status, next, admin_id, Utc::now())
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::Conflict(_)) => {
                let current = self.load(&session.id).await?;
                Err(ExpertChatError::InvalidTransition {
                    from: current.status,
                    to: next,
                })
            }
            Err(e) => Err(not_found(e)),
        }
    }

    /// Assign the replying admin, activating a `pending` session on the way.
    async fn claim_for_reply(
        &self,
        session_id: &Uuid,
        read_status: ExpertSessionStatus,
        admin_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), ExpertChatError> {
        match self
            .repo
            .set_status(
                session_id,
                read_status,
                ExpertSessionStatus::Active,
                Some(admin_id),
                now,
            )
            .await
        {
            Ok(()) => {
                info!(session_id = %session_id, admin_id = %admin_id, from = %read_status, "expert session claimed by reply");
                Ok(())
            }
            // Status moved on after the read; the message is kept, the assignment is not.
            Err(RepositoryError::Conflict(reason)) => {
                debug!(session_id = %session_id, %reason, "reply left assignment unchanged");
                Ok(())
            }
            Err(e) => Err(not_found(e)),
        }
    }

    async fn load(&self, session_id: &Uuid) -> Result<ExpertChatSession, ExpertChatError> {
        self.repo
            .get_session(session_id)
            .await?
            .ok_or(ExpertChatError::NotFound)
    }

    async fn publish_updated(
        &self,
        session_id: &Uuid,
    ) -> Result<ExpertChatSession, ExpertChatError> {
        let session = self.load(session_id).await?;
        self.feed.publish(SessionChange::Updated {
            session: session.clone(),
        });
        Ok(session)
    }
}

fn ensure_transition(
    session: &ExpertChatSession,
    next: ExpertSessionStatus,
) -> Result<(), ExpertChatError> {
    if session.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(ExpertChatError::InvalidTransition {
            from: session.status,
            to: next,
        })
    }
}

/// A row that vanished between read and write is a plain not-found.
fn not_found(err: RepositoryError) -> ExpertChatError {
    match err {
        RepositoryError::NotFound => ExpertChatError::NotFound,
        other => ExpertChatError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::testing::MemorySessionRepo;
    use haven_types::expert::{INITIAL_SYSTEM_MESSAGE, Urgency};
    use haven_types::identity::UserRole;

    fn service() -> ExpertChatService<MemorySessionRepo> {
        ExpertChatService::new(MemorySessionRepo::default(), ChangeFeed::new(64))
    }

    fn user() -> Principal {
        Principal::new(Uuid::now_v7(), UserRole::User)
    }

    fn admin() -> Principal {
        Principal::new(Uuid::now_v7(), UserRole::Admin)
    }

    fn request(reason: &str, urgency: Urgency) -> NewExpertSession {
        NewExpertSession {
            reason: reason.to_string(),
            urgency,
            mental_issue_root: None,
        }
    }

    #[tokio::test]
    async fn test_escalation_scenario() {
        let svc = service();
        let alice = user();
        let counsellor = admin();

        let created = svc
            .create_session(&alice, request("feeling overwhelmed", Urgency::High))
            .await
            .unwrap();
        assert_eq!(created.status, ExpertSessionStatus::Pending);
        assert_eq!(created.urgency, Urgency::High);
        assert!(created.admin_id.is_none());
        assert_eq!(created.messages.len(), 1);
        assert_eq!(created.messages[0].sender, SenderRole::Ai);
        assert_eq!(created.messages[0].content, INITIAL_SYSTEM_MESSAGE);

        let (_, mut sub) = svc.subscribe(&alice, &created.id).await.unwrap();

        let accepted = svc.accept(&counsellor, &created.id).await.unwrap();
        assert_eq!(accepted.status, ExpertSessionStatus::Active);
        assert_eq!(accepted.admin_id, Some(counsellor.user_id));

        let pushed = sub.recv().await.unwrap();
        let row = pushed.session().unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Active);
        assert_eq!(row.admin_id, Some(counsellor.user_id));

        let completed = svc.complete(&counsellor, &created.id).await.unwrap();
        assert_eq!(completed.status, ExpertSessionStatus::Completed);
        assert_eq!(completed.admin_id, Some(counsellor.user_id));
        let pushed = sub.recv().await.unwrap();
        assert_eq!(
            pushed.session().unwrap().status,
            ExpertSessionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_create_rejects_blank_reason() {
        let svc = service();
        let err = svc
            .create_session(&user(), request("   ", Urgency::Normal))
            .await
            .unwrap_err();
        assert!(matches!(err, ExpertChatError::Validation(_)));
        assert!(svc.list_sessions(&admin(), ExpertSessionFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transitions_never_regress() {
        let svc = service();
        let alice = user();
        let counsellor = admin();
        let s = svc
            .create_session(&alice, request("panic attacks", Urgency::Urgent))
            .await
            .unwrap();

        // pending -> completed is not exposed
        let err = svc.complete(&counsellor, &s.id).await.unwrap_err();
        assert!(matches!(
            err,
            ExpertChatError::InvalidTransition {
                from: ExpertSessionStatus::Pending,
                to: ExpertSessionStatus::Completed
            }
        ));

        svc.accept(&counsellor, &s.id).await.unwrap();
        // accepting twice is a regression to the same state
        assert!(svc.accept(&counsellor, &s.id).await.is_err());

        svc.complete(&counsellor, &s.id).await.unwrap();
        assert!(svc.accept(&counsellor, &s.id).await.is_err());
        assert!(svc.complete(&counsellor, &s.id).await.is_err());

        let row = svc.get_session(&alice, &s.id).await.unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_users_cannot_transition() {
        let svc = service();
        let alice = user();
        let s = svc
            .create_session(&alice, request("lonely", Urgency::Low))
            .await
            .unwrap();
        let err = svc.accept(&alice, &s.id).await.unwrap_err();
        assert!(matches!(err, ExpertChatError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_sequential_appends_keep_history() {
        let svc = service();
        let alice = user();
        let counsellor = admin();
        let s = svc
            .create_session(&alice, request("exam stress", Urgency::Normal))
            .await
            .unwrap();
        svc.accept(&counsellor, &s.id).await.unwrap();

        for (who, text, sender) in [
            (&alice, "hi", SenderRole::User),
            (&counsellor, "hello, I'm here", SenderRole::Doctor),
            (&alice, "thanks", SenderRole::User),
        ] {
            let before = svc.get_session(&alice, &s.id).await.unwrap();
            let after = svc.append_message(who, &s.id, text, sender).await.unwrap();
            assert_eq!(after.messages.len(), before.messages.len() + 1);
            assert_eq!(&after.messages[..before.messages.len()], &before.messages[..]);
            assert_eq!(after.messages.last().unwrap().content, text);
        }
        let row = svc.get_session(&alice, &s.id).await.unwrap();
        assert_eq!(row.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_completed_session_rejects_messages() {
        let svc = service();
        let alice = user();
        let counsellor = admin();
        let s = svc
            .create_session(&alice, request("grief", Urgency::High))
            .await
            .unwrap();
        svc.accept(&counsellor, &s.id).await.unwrap();
        svc.complete(&counsellor, &s.id).await.unwrap();

        let err = svc
            .append_message(&alice, &s.id, "one more thing", SenderRole::User)
            .await
            .unwrap_err();
        assert!(matches!(err, ExpertChatError::SessionClosed));
        let row = svc.get_session(&alice, &s.id).await.unwrap();
        assert_eq!(row.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_store() {
        let svc = service();
        let err = svc
            .append_message(&user(), &Uuid::now_v7(), "  ", SenderRole::User)
            .await
            .unwrap_err();
        // validation wins over the missing row
        assert!(matches!(err, ExpertChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_admin_reply_accepts_pending_session() {
        let svc = service();
        let alice = user();
        let counsellor = admin();
        let s = svc
            .create_session(&alice, request("burnout", Urgency::Normal))
            .await
            .unwrap();

        let row = svc
            .append_message(&counsellor, &s.id, "I can help", SenderRole::Doctor)
            .await
            .unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Active);
        assert_eq!(row.admin_id, Some(counsellor.user_id));
        assert_eq!(row.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_at_least_one() {
        let svc = Arc::new(service());
        let alice = user();
        let counsellor = admin();
        let s = svc
            .create_session(&alice, request("family issues", Urgency::Normal))
            .await
            .unwrap();
        svc.accept(&counsellor, &s.id).await.unwrap();

        let (a, b) = tokio::join!(
            svc.append_message(&alice, &s.id, "from the user", SenderRole::User),
            svc.append_message(&counsellor, &s.id, "from the expert", SenderRole::Doctor),
        );
        a.unwrap();
        b.unwrap();

        let row = svc.get_session(&alice, &s.id).await.unwrap();
        let survivors = row
            .messages
            .iter()
            .filter(|m| m.content == "from the user" || m.content == "from the expert")
            .count();
        assert!(survivors >= 1);
        assert!(row.messages.len() >= 2);
        assert_eq!(row.messages[0].content, INITIAL_SYSTEM_MESSAGE);
    }

    #[tokio::test]
    async fn test_users_only_see_their_own_sessions() {
        let svc = service();
        let alice = user();
        let bob = user();
        let a = svc
            .create_session(&alice, request("a", Urgency::Normal))
            .await
            .unwrap();
        svc.create_session(&bob, request("b", Urgency::Normal))
            .await
            .unwrap();

        let sneaky = ExpertSessionFilter {
            user_id: Some(bob.user_id),
            ..Default::default()
        };
        let seen = svc.list_sessions(&alice, sneaky).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, a.id);

        assert!(matches!(
            svc.get_session(&bob, &a.id).await.unwrap_err(),
            ExpertChatError::PermissionDenied(_)
        ));
        let all = svc
            .list_sessions(&admin(), ExpertSessionFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_publishes_and_removes() {
        let svc = service();
        let alice = user();
        let s = svc
            .create_session(&alice, request("stress", Urgency::Normal))
            .await
            .unwrap();
        let mut watch = svc.subscribe_all(&admin()).unwrap();

        assert!(svc.delete_session(&user(), &s.id).await.is_err());
        svc.delete_session(&alice, &s.id).await.unwrap();

        let change = watch.recv().await.unwrap();
        assert!(matches!(change, SessionChange::Deleted { session_id, .. } if session_id == s.id));
        assert!(matches!(
            svc.get_session(&alice, &s.id).await.unwrap_err(),
            ExpertChatError::NotFound
        ));
    }

    /// Wraps the memory store and, once armed, holds the next `get_session`
    /// open after it has read the row until `release` is notified.
    #[derive(Default)]
    struct GatedRepo {
        inner: MemorySessionRepo,
        armed: AtomicBool,
        read_done: Notify,
        release: Notify,
    }

    impl GatedRepo {
        fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    impl ExpertSessionRepository for GatedRepo {
        async fn insert_session(&self, session: &ExpertChatSession) -> Result<(), RepositoryError> {
            self.inner.insert_session(session).await
        }

        async fn get_session(
            &self,
            id: &Uuid,
        ) -> Result<Option<ExpertChatSession>, RepositoryError> {
            let row = self.inner.get_session(id).await;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.read_done.notify_one();
                self.release.notified().await;
            }
            row
        }

        async fn set_status(
            &self,
            id: &Uuid,
            expected: ExpertSessionStatus,
            status: ExpertSessionStatus,
            admin_id: Option<Uuid>,
            updated_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            self.inner
                .set_status(id, expected, status, admin_id, updated_at)
                .await
        }

        async fn replace_messages(
            &self,
            id: &Uuid,
            messages: &[ChatMessage],
            updated_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            self.inner.replace_messages(id, messages, updated_at).await
        }

        async fn delete_session(&self, id: &Uuid) -> Result<(), RepositoryError> {
            self.inner.delete_session(id).await
        }

        async fn list_sessions(
            &self,
            filter: &ExpertSessionFilter,
        ) -> Result<Vec<ExpertChatSession>, RepositoryError> {
            self.inner.list_sessions(filter).await
        }

        async fn count_by_status(
            &self,
            status: ExpertSessionStatus,
        ) -> Result<u64, RepositoryError> {
            self.inner.count_by_status(status).await
        }
    }

    #[tokio::test]
    async fn test_stale_accept_cannot_reopen_completed_session() {
        let svc = ExpertChatService::new(GatedRepo::default(), ChangeFeed::new(64));
        let alice = user();
        let slow = admin();
        let fast = admin();
        let s = svc
            .create_session(&alice, request("can't sleep", Urgency::High))
            .await
            .unwrap();

        svc.repo().arm();
        let (stale, ()) = tokio::join!(svc.accept(&slow, &s.id), async {
            // `slow` has read the row as pending and is parked.
            svc.repo().read_done.notified().await;
            svc.accept(&fast, &s.id).await.unwrap();
            svc.complete(&fast, &s.id).await.unwrap();
            svc.repo().release.notify_one();
        });

        assert!(matches!(
            stale.unwrap_err(),
            ExpertChatError::InvalidTransition {
                from: ExpertSessionStatus::Completed,
                to: ExpertSessionStatus::Active
            }
        ));
        let row = svc.get_session(&alice, &s.id).await.unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Completed);
        assert_eq!(row.admin_id, Some(fast.user_id));
    }

    #[tokio::test]
    async fn test_stale_admin_reply_keeps_completed_status() {
        let svc = ExpertChatService::new(GatedRepo::default(), ChangeFeed::new(64));
        let alice = user();
        let slow = admin();
        let fast = admin();
        let s = svc
            .create_session(&alice, request("homesick", Urgency::Normal))
            .await
            .unwrap();

        svc.repo().arm();
        let (reply, ()) = tokio::join!(
            svc.append_message(&slow, &s.id, "are you still there?", SenderRole::Doctor),
            async {
                svc.repo().read_done.notified().await;
                svc.accept(&fast, &s.id).await.unwrap();
                svc.complete(&fast, &s.id).await.unwrap();
                svc.repo().release.notify_one();
            }
        );

        // The reply was checked against the pending row it read, so it lands,
        // but it must not pull the session back to active.
        reply.unwrap();
        let row = svc.get_session(&alice, &s.id).await.unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Completed);
        assert_eq!(row.admin_id, Some(fast.user_id));
    }

    #[tokio::test]
    async fn test_admin_reply_takes_over_active_session() {
        let svc = service();
        let alice = user();
        let first = admin();
        let second = admin();
        let s = svc
            .create_session(&alice, request("relationship trouble", Urgency::Normal))
            .await
            .unwrap();
        svc.accept(&first, &s.id).await.unwrap();

        let row = svc
            .append_message(&second, &s.id, "covering for a colleague", SenderRole::Doctor)
            .await
            .unwrap();
        assert_eq!(row.status, ExpertSessionStatus::Active);
        assert_eq!(row.admin_id, Some(second.user_id));

        // The user's own replies never touch the assignment.
        let row = svc
            .append_message(&alice, &s.id, "ok", SenderRole::User)
            .await
            .unwrap();
        assert_eq!(row.admin_id, Some(second.user_id));
    }

    #[tokio::test]
    async fn test_subscribe_all_is_admin_only() {
        let svc = service();
        assert!(svc.subscribe_all(&user()).is_err());
    }
}
