//! Grid Config - 통합 설정
//!
//! 글로벌 설정과 프로젝트 설정을 병합하는 GridConfig

use crate::storage::{load_file, JsonStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 설정 파일명
pub const GRID_CONFIG_FILE: &str = "config.json";

// ============================================================================
// Grid Config (통합)
// ============================================================================

/// GridTask 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 새 태스크의 기본값
    #[serde(default)]
    pub task: TaskDefaults,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            task: TaskDefaults::default(),
        }
    }
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<GridConfig>(GRID_CONFIG_FILE)? {
                tracing::debug!("Loaded global config from {}", global.base_dir().display());
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.load_optional::<GridConfig>(GRID_CONFIG_FILE)? {
                tracing::debug!("Loaded project config from {}", project.base_dir().display());
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 특정 파일에서 로드
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }

    /// 프로젝트 설정 저장 (<root>/.gridtask/config.json), 저장된 경로 반환
    pub fn save_project(&self, root: impl Into<PathBuf>) -> Result<PathBuf> {
        JsonStore::project(root).save(GRID_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: GridConfig) {
        self.version = self.version.max(other.version);
        self.task.merge(other.task);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.task.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.task.capture_stdout = Some(capture);
        self
    }

    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.task.capture_stderr = Some(capture);
        self
    }
}

// ============================================================================
// Task Defaults
// ============================================================================

/// 태스크 기본값
///
/// 지정되지 않은 값은 상위 설정을 덮어쓰지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefaults {
    /// 타임아웃 (ms), 없으면 무제한
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// 표준 출력 캡처 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_stdout: Option<bool>,

    /// 표준 에러 캡처 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_stderr: Option<bool>,
}

impl TaskDefaults {
    pub fn captures_stdout(&self) -> bool {
        self.capture_stdout.unwrap_or(true)
    }

    pub fn captures_stderr(&self) -> bool {
        self.capture_stderr.unwrap_or(true)
    }

    fn merge(&mut self, other: TaskDefaults) {
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.capture_stdout.is_some() {
            self.capture_stdout = other.capture_stdout;
        }
        if other.capture_stderr.is_some() {
            self.capture_stderr = other.capture_stderr;
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn default_version() -> u32 {
    1
}
