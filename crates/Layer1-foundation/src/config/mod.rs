//! Config - 통합 설정 관리
//!
//! - `grid.rs` - GridConfig 통합 설정 및 태스크 기본값

mod grid;

pub use grid::{GridConfig, TaskDefaults, GRID_CONFIG_FILE};
