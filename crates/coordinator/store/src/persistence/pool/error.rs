use diesel_async::pooled_connection::deadpool::BuildError;
use tokio::task::JoinError;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("certificate loading failed: {0}")]
    Certificates(#[from] JoinError),

    #[error("pool configuration rejected: {0}")]
    Build(#[from] BuildError),
}
