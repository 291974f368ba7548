use super::domain::{ResponderCandidate, UserAccount, UserId};
use super::geo::GeoPoint;

/// Read side of the user store. The auth collaborator owns writes; dispatch
/// only ever looks users up.
pub trait UserDirectory: Send + Sync {
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, DirectoryError>;

    /// Hospitals and donors whose geo-point lies within `radius_km` of
    /// `origin`, sorted ascending by great-circle distance. An empty result
    /// is not an error.
    fn find_nearby(
        &self,
        origin: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<ResponderCandidate>, DirectoryError>;
}

/// Error dispatch treats as a degraded lookup, never as a failed SOS.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}
