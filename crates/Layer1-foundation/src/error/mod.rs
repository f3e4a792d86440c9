//! Error types for GridTask
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// GridTask 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // Task/Executor 관련
    // ========================================================================
    #[error("Invalid task state: {0}")]
    InvalidState(String),

    #[error("Executor failed: {executor} - {message}")]
    Executor { executor: String, message: String },

    #[error("Executor unavailable: {0}")]
    ExecutorUnavailable(String),
}

impl Error {
    /// Executor 에러 생성 헬퍼
    pub fn executor(executor: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Executor {
            executor: executor.into(),
            message: message.into(),
        }
    }
}
