//! 설정 관리 — faultline.toml 파싱 및 런타임 설정
//!
//! [`FaultlineConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FAULTLINE_COLLECTOR_MAX_ERRORS=20` 형식)
//! 3. 설정 파일 (`faultline.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), faultline_core::error::FaultlineError> {
//! use faultline_core::config::FaultlineConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FaultlineConfig::load("faultline.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FaultlineConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FaultlineError};
use crate::types::Severity;

/// 집계 버퍼 기본 크기 (핑거프린트당 보관하는 최근 발생 수)
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// 핑거프린트 계산에 사용하는 선두 스택 프레임 기본 수
pub const DEFAULT_MAX_TRACES: usize = 4;

/// 원인 체인 순회 기본 최대 깊이
pub const DEFAULT_MAX_CAUSE_DEPTH: usize = 16;

/// Faultline 통합 설정
///
/// `faultline.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 구성 요소는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultlineConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집기(집계 엔진) 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 익스포트 조회 엔드포인트 설정
    #[serde(default)]
    pub exporter: ExporterConfig,
    /// 게이트웨이 푸시 설정
    #[serde(default)]
    pub push: PushConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FaultlineConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FaultlineError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FaultlineError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FaultlineError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FaultlineError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FaultlineError> {
        toml::from_str(toml_str).map_err(|e| {
            FaultlineError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FAULTLINE_{SECTION}_{FIELD}`
    /// 예: `FAULTLINE_PUSH_GATEWAY_URL=http://gateway:6767`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FAULTLINE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FAULTLINE_GENERAL_LOG_FORMAT");

        // Collector
        override_usize(
            &mut self.collector.max_errors,
            "FAULTLINE_COLLECTOR_MAX_ERRORS",
        );
        override_usize(
            &mut self.collector.max_traces,
            "FAULTLINE_COLLECTOR_MAX_TRACES",
        );
        override_usize(
            &mut self.collector.max_cause_depth,
            "FAULTLINE_COLLECTOR_MAX_CAUSE_DEPTH",
        );
        override_string(
            &mut self.collector.default_severity,
            "FAULTLINE_COLLECTOR_DEFAULT_SEVERITY",
        );

        // Exporter
        override_bool(&mut self.exporter.enabled, "FAULTLINE_EXPORTER_ENABLED");
        override_string(
            &mut self.exporter.listen_addr,
            "FAULTLINE_EXPORTER_LISTEN_ADDR",
        );
        override_u16(&mut self.exporter.port, "FAULTLINE_EXPORTER_PORT");
        override_string(&mut self.exporter.endpoint, "FAULTLINE_EXPORTER_ENDPOINT");

        // Push
        override_bool(&mut self.push.enabled, "FAULTLINE_PUSH_ENABLED");
        override_string(&mut self.push.gateway_url, "FAULTLINE_PUSH_GATEWAY_URL");
        override_u64(&mut self.push.interval_secs, "FAULTLINE_PUSH_INTERVAL_SECS");
        override_u64(&mut self.push.timeout_secs, "FAULTLINE_PUSH_TIMEOUT_SECS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "FAULTLINE_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "FAULTLINE_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "FAULTLINE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FaultlineError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.collector.validate()?;

        if self.exporter.enabled && !self.exporter.endpoint.starts_with('/') {
            return Err(invalid(
                "exporter.endpoint",
                "must start with '/'".to_owned(),
            ));
        }

        if self.push.enabled {
            if !(self.push.gateway_url.starts_with("http://")
                || self.push.gateway_url.starts_with("https://"))
            {
                return Err(invalid(
                    "push.gateway_url",
                    "must be an http:// or https:// URL".to_owned(),
                ));
            }
            if self.push.interval_secs == 0 {
                return Err(invalid(
                    "push.interval_secs",
                    "must be greater than 0".to_owned(),
                ));
            }
            if self.push.timeout_secs == 0 {
                return Err(invalid(
                    "push.timeout_secs",
                    "must be greater than 0".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> FaultlineError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 수집기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 핑거프린트당 보관할 최근 발생 수
    pub max_errors: usize,
    /// 핑거프린트에 포함할 선두 스택 프레임 수
    pub max_traces: usize,
    /// 원인 체인 최대 깊이
    pub max_cause_depth: usize,
    /// 기본 심각도 (info, warning, error)
    pub default_severity: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            max_traces: DEFAULT_MAX_TRACES,
            max_cause_depth: DEFAULT_MAX_CAUSE_DEPTH,
            default_severity: Severity::Error.as_str().to_owned(),
        }
    }
}

impl CollectorConfig {
    /// 최대값 상한
    const MAX_ERRORS_LIMIT: usize = 1_000;
    const MAX_TRACES_LIMIT: usize = 64;
    const MAX_CAUSE_DEPTH_LIMIT: usize = 256;

    /// 수집기 설정값을 검증합니다.
    pub fn validate(&self) -> Result<(), FaultlineError> {
        if self.max_errors == 0 || self.max_errors > Self::MAX_ERRORS_LIMIT {
            return Err(invalid(
                "collector.max_errors",
                format!("must be 1-{}", Self::MAX_ERRORS_LIMIT),
            ));
        }

        if self.max_traces == 0 || self.max_traces > Self::MAX_TRACES_LIMIT {
            return Err(invalid(
                "collector.max_traces",
                format!("must be 1-{}", Self::MAX_TRACES_LIMIT),
            ));
        }

        if self.max_cause_depth == 0 || self.max_cause_depth > Self::MAX_CAUSE_DEPTH_LIMIT {
            return Err(invalid(
                "collector.max_cause_depth",
                format!("must be 1-{}", Self::MAX_CAUSE_DEPTH_LIMIT),
            ));
        }

        if self.severity().is_none() {
            return Err(invalid(
                "collector.default_severity",
                "must be one of: info, warning, error".to_owned(),
            ));
        }

        Ok(())
    }

    /// 기본 심각도를 파싱합니다.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_str_loose(&self.default_severity)
    }
}

/// 익스포트 조회 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 바인드 포트
    pub port: u16,
    /// 조회 경로
    pub endpoint: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1".to_owned(),
            port: 7777,
            endpoint: "/-/exceptions".to_owned(),
        }
    }
}

/// 게이트웨이 푸시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 게이트웨이 주소 (페이로드는 `{gateway_url}/errors`로 전송)
    pub gateway_url: String,
    /// 푸시 주기 (초)
    pub interval_secs: u64,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gateway_url: "http://localhost:6767".to_owned(),
            interval_secs: 30,
            timeout_secs: 10,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 바인드 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}
