//! ProfileRepository trait definition.
//!
//! Profiles carry the role claim; API tokens are stored only as hashes.

use haven_types::error::RepositoryError;
use haven_types::identity::Profile;
use uuid::Uuid;

/// Repository trait for profiles and their API tokens.
pub trait ProfileRepository: Send + Sync {
    fn create_profile(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_profile(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// All profiles, ordered by created_at ASC.
    fn list_profiles(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Profile>, RepositoryError>> + Send;

    fn count_profiles(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Store a token hash for a profile. Hashes are unique.
    fn create_token(
        &self,
        profile_id: &Uuid,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up the profile owning a token hash.
    fn find_profile_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;
}
