//! Feature Flag 시스템 — pushdown 규칙과 병렬 실행의 런타임 토글
//!
//! 모든 Feature는 기본 활성화 상태이며, 환경 변수
//! `DBX_STREAM_FEATURE_<NAME>` 또는 JSON 파일로 덮어쓸 수 있다.

use crate::error::StreamResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Feature Flag 정의
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// WHERE 절 pushdown
    FilterPushdown,

    /// ORDER BY pushdown
    SortPushdown,

    /// LIMIT/OFFSET pushdown
    LimitPushdown,

    /// `count()` 를 `SELECT COUNT(*)` 로 대체
    CountPushdown,

    /// 병렬 in-memory 실행
    ParallelExecution,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::FilterPushdown,
        Feature::SortPushdown,
        Feature::LimitPushdown,
        Feature::CountPushdown,
        Feature::ParallelExecution,
    ];

    /// Feature를 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::FilterPushdown => "filter_pushdown",
            Feature::SortPushdown => "sort_pushdown",
            Feature::LimitPushdown => "limit_pushdown",
            Feature::CountPushdown => "count_pushdown",
            Feature::ParallelExecution => "parallel_execution",
        }
    }

    /// 문자열에서 Feature 파싱
    pub fn parse_feature(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == s)
    }

    /// 환경 변수 이름
    pub fn env_var_name(&self) -> String {
        format!("DBX_STREAM_FEATURE_{}", self.as_str().to_uppercase())
    }
}

/// Feature Flag 관리자
#[derive(Debug, Clone)]
pub struct FeatureFlags {
    /// 명시적으로 설정된 Feature 상태 (설정되지 않은 Feature는 활성화)
    flags: Arc<RwLock<HashMap<Feature, bool>>>,

    /// 영속성 파일 경로
    persistence_path: Option<PathBuf>,
}

impl FeatureFlags {
    /// 새 Feature Flag 관리자 생성
    pub fn new() -> Self {
        Self {
            flags: Arc::new(RwLock::new(HashMap::new())),
            persistence_path: None,
        }
    }

    /// 모든 pushdown 규칙을 끈 설정 (전체 in-memory 경로 강제)
    pub fn in_memory_only() -> Self {
        let flags = Self::new();
        flags.disable(Feature::FilterPushdown);
        flags.disable(Feature::SortPushdown);
        flags.disable(Feature::LimitPushdown);
        flags.disable(Feature::CountPushdown);
        flags
    }

    /// 영속성 경로 설정
    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.persistence_path = Some(path);
        self
    }

    /// Feature 활성화
    pub fn enable(&self, feature: Feature) {
        self.toggle(feature, true);
    }

    /// Feature 비활성화
    pub fn disable(&self, feature: Feature) {
        self.toggle(feature, false);
    }

    /// Feature 토글
    pub fn toggle(&self, feature: Feature, enabled: bool) {
        self.flags.write().insert(feature, enabled);
    }

    /// Feature 활성화 여부 확인
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.flags.read().get(&feature).copied().unwrap_or(true)
    }

    /// 환경 변수에서 로드
    pub fn load_from_env(&self) {
        for feature in Feature::ALL {
            if let Ok(value) = env::var(feature.env_var_name()) {
                let enabled = value.eq_ignore_ascii_case("true") || value == "1";
                self.toggle(feature, enabled);
            }
        }
    }

    /// 파일에서 로드
    pub fn load_from_file(&self) -> StreamResult<()> {
        if let Some(path) = self.persistence_path.as_ref().filter(|p| p.exists()) {
            let json = fs::read_to_string(path)?;
            let loaded: HashMap<String, bool> = serde_json::from_str(&json)?;

            let mut flags = self.flags.write();
            for (key, value) in loaded {
                match Feature::parse_feature(&key) {
                    Some(feature) => {
                        flags.insert(feature, value);
                    }
                    None => tracing::warn!(key = %key, "ignoring unknown stream feature"),
                }
            }
        }
        Ok(())
    }

    /// 파일에 저장
    pub fn save_to_file(&self) -> StreamResult<()> {
        if let Some(path) = &self.persistence_path {
            let serializable: HashMap<String, bool> = self
                .flags
                .read()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect();

            let json = serde_json::to_string_pretty(&serializable)?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(path, json)?;
        }
        Ok(())
    }

    /// 모든 Feature 상태 조회 (기본값 포함)
    pub fn all(&self) -> HashMap<Feature, bool> {
        Feature::ALL
            .into_iter()
            .map(|feature| (feature, self.is_enabled(feature)))
            .collect()
    }

    /// 모든 Feature 초기화 (기본값으로)
    pub fn reset(&self) {
        self.flags.write().clear();
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}
