// src/error.rs

use std::time::Duration;
use thiserror::Error;

use crate::csv_io::CsvError;
use crate::store::StoreError;

/// Ошибки операций над сотрудниками
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Неверные входные данные: исправить запрос и повторить
    #[error("validation failed: {0}")]
    Validation(String),

    /// Превышен лимит запросов: повторить позже
    #[error("Rate limit exceeded")]
    Throttled { retry_after: Duration },

    #[error("X-Org-Id header is required")]
    MissingOrganization,

    #[error("invalid upload: {0}")]
    Upload(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<CsvError> for ServiceError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::Encoding => ServiceError::Upload(err.to_string()),
            CsvError::Malformed(_) | CsvError::MissingColumn(_) => {
                ServiceError::Validation(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
