//! 집계 엔진 설정
//!
//! [`AggregatorConfig`]는 core의 [`CollectorConfig`]를
//! 기반으로 수집기 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use faultline_core::config::FaultlineConfig;
//! use faultline_aggregator::config::AggregatorConfig;
//!
//! let core_config = FaultlineConfig::default();
//! let config = AggregatorConfig::from_core(&core_config.collector);
//! ```

use faultline_core::config::{
    CollectorConfig, DEFAULT_MAX_CAUSE_DEPTH, DEFAULT_MAX_ERRORS, DEFAULT_MAX_TRACES,
};
use faultline_core::types::Severity;

use crate::error::AggregatorError;

/// 집계 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// 핑거프린트당 보관할 최근 발생 수
    pub max_errors: usize,
    /// 핑거프린트에 포함할 선두 스택 프레임 수
    pub max_traces: usize,
    /// 원인 체인 최대 깊이
    pub max_cause_depth: usize,
    /// 심각도를 지정하지 않은 리포트의 심각도
    pub default_severity: Severity,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            max_traces: DEFAULT_MAX_TRACES,
            max_cause_depth: DEFAULT_MAX_CAUSE_DEPTH,
            default_severity: Severity::Error,
        }
    }
}

impl AggregatorConfig {
    const MAX_ERRORS_LIMIT: usize = 1_000;
    const MAX_TRACES_LIMIT: usize = 64;
    const MAX_CAUSE_DEPTH_LIMIT: usize = 256;

    /// core의 `CollectorConfig`에서 집계 설정을 생성합니다.
    ///
    /// 심각도 문자열을 해석할 수 없으면 `error`를 사용합니다.
    pub fn from_core(core: &CollectorConfig) -> Self {
        let default_severity = core.severity().unwrap_or_else(|| {
            tracing::warn!(
                value = %core.default_severity,
                "unknown default severity, falling back to error"
            );
            Severity::Error
        });

        Self {
            max_errors: core.max_errors,
            max_traces: core.max_traces,
            max_cause_depth: core.max_cause_depth,
            default_severity,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AggregatorError> {
        check_range("max_errors", self.max_errors, Self::MAX_ERRORS_LIMIT)?;
        check_range("max_traces", self.max_traces, Self::MAX_TRACES_LIMIT)?;
        check_range(
            "max_cause_depth",
            self.max_cause_depth,
            Self::MAX_CAUSE_DEPTH_LIMIT,
        )?;
        Ok(())
    }
}

fn check_range(field: &str, value: usize, max: usize) -> Result<(), AggregatorError> {
    if value == 0 || value > max {
        return Err(AggregatorError::Config {
            field: field.to_owned(),
            reason: format!("must be 1-{max}, got {value}"),
        });
    }
    Ok(())
}

/// 집계 설정 빌더
#[derive(Default)]
pub struct AggregatorConfigBuilder {
    config: AggregatorConfig,
}

impl AggregatorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 핑거프린트당 보관할 최근 발생 수를 설정합니다.
    pub fn max_errors(mut self, max_errors: usize) -> Self {
        self.config.max_errors = max_errors;
        self
    }

    /// 핑거프린트에 포함할 선두 프레임 수를 설정합니다.
    pub fn max_traces(mut self, max_traces: usize) -> Self {
        self.config.max_traces = max_traces;
        self
    }

    /// 원인 체인 최대 깊이를 설정합니다.
    pub fn max_cause_depth(mut self, depth: usize) -> Self {
        self.config.max_cause_depth = depth;
        self
    }

    /// 기본 심각도를 설정합니다.
    pub fn default_severity(mut self, severity: Severity) -> Self {
        self.config.default_severity = severity;
        self
    }

    /// 설정을 검증하고 `AggregatorConfig`를 생성합니다.
    pub fn build(self) -> Result<AggregatorConfig, AggregatorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
