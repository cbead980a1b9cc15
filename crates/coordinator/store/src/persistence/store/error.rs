use diesel::result::{DatabaseErrorKind, Error as DieselError};

pub type Result<T, E = StoreError> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(DieselError),

    /// A unique index rejected the row, typically a concurrent insert of the same request or
    /// signature.
    #[error("conflict on {0}")]
    Conflict(String),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.constraint_name().unwrap_or(info.message()).to_string())
            },
            err => Self::Db(err),
        }
    }
}
