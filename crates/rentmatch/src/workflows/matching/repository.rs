use super::domain::InvestorId;
use super::validation::StoredProfile;
use crate::workflows::RepositoryError;

/// Storage abstraction for investor preference rows.
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the investor's single preference row.
    fn upsert(&self, profile: StoredProfile) -> Result<StoredProfile, RepositoryError>;
    fn fetch(&self, investor_id: &InvestorId) -> Result<Option<StoredProfile>, RepositoryError>;
    /// Every stored row, active or not; batch callers filter.
    fn all(&self) -> Result<Vec<StoredProfile>, RepositoryError>;
}
