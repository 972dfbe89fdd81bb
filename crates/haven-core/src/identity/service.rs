//! Identity service: register profiles, issue tokens, authenticate callers.
//!
//! Plaintext tokens are returned once from `issue_token` and never stored.

use haven_types::error::IdentityError;
use haven_types::identity::{Principal, Profile, UserRole};
use tracing::{debug, info};
use uuid::Uuid;

use crate::identity::token::TokenHasher;
use crate::repository::profile::ProfileRepository;

pub struct IdentityService<P: ProfileRepository, H: TokenHasher> {
    profiles: P,
    hasher: H,
}

impl<P: ProfileRepository, H: TokenHasher> IdentityService<P, H> {
    pub fn new(profiles: P, hasher: H) -> Self {
        Self { profiles, hasher }
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    pub async fn register(
        &self,
        first_name: Option<String>,
        last_name: Option<String>,
        role: UserRole,
    ) -> Result<Profile, IdentityError> {
        let profile = Profile::new(normalize(first_name), normalize(last_name), role);
        self.profiles.create_profile(&profile).await?;
        info!(profile_id = %profile.id, role = %role, "profile registered");
        Ok(profile)
    }

    /// Issue a new bearer token for a profile. The plaintext is returned once.
    pub async fn issue_token(&self, profile_id: &Uuid) -> Result<String, IdentityError> {
        if self.profiles.get_profile(profile_id).await?.is_none() {
            return Err(IdentityError::NotFound);
        }
        let token = self.hasher.generate();
        self.profiles
            .create_token(profile_id, &self.hasher.hash(&token))
            .await?;
        info!(profile_id = %profile_id, "API token issued");
        Ok(token)
    }

    /// Resolve a plaintext bearer token to the caller's principal.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }
        let hash = self.hasher.hash(token);
        match self.profiles.find_profile_by_token_hash(&hash).await? {
            Some(profile) => {
                debug!(profile_id = %profile.id, "token authenticated");
                Ok(Principal::from(&profile))
            }
            None => Err(IdentityError::InvalidToken),
        }
    }

    pub async fn get(&self, id: &Uuid) -> Result<Profile, IdentityError> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or(IdentityError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Profile>, IdentityError> {
        Ok(self.profiles.list_profiles().await?)
    }
}

fn normalize(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::testing::MemoryProfileRepo;

    #[derive(Default)]
    struct CountingHasher {
        next: AtomicU32,
    }

    impl TokenHasher for CountingHasher {
        fn generate(&self) -> String {
            format!("tok-{}", self.next.fetch_add(1, Ordering::SeqCst))
        }

        fn hash(&self, token: &str) -> String {
            format!("h({token})")
        }
    }

    fn service() -> IdentityService<MemoryProfileRepo, CountingHasher> {
        IdentityService::new(MemoryProfileRepo::default(), CountingHasher::default())
    }

    #[tokio::test]
    async fn test_issue_and_authenticate() {
        let svc = service();
        let profile = svc
            .register(Some("Dana".into()), None, UserRole::Admin)
            .await
            .unwrap();
        let token = svc.issue_token(&profile.id).await.unwrap();

        let principal = svc.authenticate(&token).await.unwrap();
        assert_eq!(principal.user_id, profile.id);
        assert!(principal.is_admin());
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let svc = service();
        assert!(matches!(
            svc.authenticate("nope").await.unwrap_err(),
            IdentityError::InvalidToken
        ));
        assert!(matches!(
            svc.authenticate("").await.unwrap_err(),
            IdentityError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_token_for_missing_profile() {
        let svc = service();
        assert!(matches!(
            svc.issue_token(&Uuid::now_v7()).await.unwrap_err(),
            IdentityError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_blank_names_are_dropped() {
        let svc = service();
        let profile = svc
            .register(Some("  ".into()), Some(" Lee ".into()), UserRole::User)
            .await
            .unwrap();
        assert_eq!(profile.first_name, None);
        assert_eq!(profile.last_name.as_deref(), Some("Lee"));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }
}
