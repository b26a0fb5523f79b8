use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChronikaError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("processing error: {message}")]
    Processing { message: String },
}

impl ChronikaError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }
}

pub type ChronikaResult<T> = Result<T, ChronikaError>;

impl From<sea_orm::DbErr> for ChronikaError {
    fn from(value: sea_orm::DbErr) -> Self {
        ChronikaError::storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ChronikaError;

    #[test]
    fn helper_constructors_set_variants() {
        let err = ChronikaError::storage("disk");
        assert!(matches!(err, ChronikaError::Storage { .. }));
        let err = ChronikaError::not_found("missing");
        assert!(matches!(err, ChronikaError::NotFound { .. }));
        let err = ChronikaError::invalid("bad");
        assert!(matches!(err, ChronikaError::Validation { .. }));
        let err = ChronikaError::conflict("dup");
        assert!(matches!(err, ChronikaError::Conflict { .. }));
        let err = ChronikaError::processing("entity");
        assert!(matches!(err, ChronikaError::Processing { .. }));
    }
}
