#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("invalid year: '{0}' (expected an integer)")]
    InvalidYear(String),
}
