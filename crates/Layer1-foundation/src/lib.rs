//! # grid-foundation
//!
//! Foundation layer for GridTask:
//! - Error: 공통 에러 타입 (Error, Result)
//! - Storage: JsonStore (설정 파일 저장/로드)
//! - Config: 통합 설정 (GridConfig, TaskDefaults)

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{GridConfig, TaskDefaults, GRID_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{load_file, JsonStore};
