//! Access rules checked at every expert session call.
//!
//! Users may create sessions and read, append to, and delete their own.
//! Admins may read, accept, complete, append to, and delete any session.

use haven_types::error::ExpertChatError;
use haven_types::expert::ExpertChatSession;
use haven_types::identity::Principal;
use haven_types::message::SenderRole;

pub struct AccessPolicy;

impl AccessPolicy {
    /// The sender role a principal writes messages as.
    pub fn sender_for(principal: &Principal) -> SenderRole {
        if principal.is_admin() {
            SenderRole::Doctor
        } else {
            SenderRole::User
        }
    }

    pub fn ensure_can_view(
        principal: &Principal,
        session: &ExpertChatSession,
    ) -> Result<(), ExpertChatError> {
        if principal.is_admin() || session.user_id == principal.user_id {
            Ok(())
        } else {
            Err(ExpertChatError::PermissionDenied(
                "session belongs to another user".to_string(),
            ))
        }
    }

    /// Owners and admins may write; the sender must match the caller's role.
    pub fn ensure_can_append(
        principal: &Principal,
        session: &ExpertChatSession,
        sender: SenderRole,
    ) -> Result<(), ExpertChatError> {
        Self::ensure_can_view(principal, session)?;
        let expected = Self::sender_for(principal);
        if sender != expected {
            return Err(ExpertChatError::PermissionDenied(format!(
                "{} may not send messages as '{sender}'",
                principal.role
            )));
        }
        Ok(())
    }

    /// Accept and complete are admin-only.
    pub fn ensure_can_transition(principal: &Principal) -> Result<(), ExpertChatError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(ExpertChatError::PermissionDenied(
                "only admins may change session status".to_string(),
            ))
        }
    }

    pub fn ensure_can_delete(
        principal: &Principal,
        session: &ExpertChatSession,
    ) -> Result<(), ExpertChatError> {
        Self::ensure_can_view(principal, session)
    }

    /// The admin-wide feed is admin-only.
    pub fn ensure_can_watch_all(principal: &Principal) -> Result<(), ExpertChatError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(ExpertChatError::PermissionDenied(
                "only admins may watch every session".to_string(),
            ))
        }
    }
}
