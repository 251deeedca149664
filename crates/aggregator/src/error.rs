//! 집계 엔진 에러 타입
//!
//! [`AggregatorError`]는 설정 검증과 스냅샷 직렬화에서 발생하는 에러를 표현합니다.
//! 리포팅 경로(`report*`)는 에러를 반환하지 않으므로 이 타입은
//! 빌더와 익스포터에서만 나타납니다.
//! `From<AggregatorError> for FaultlineError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use faultline_core::error::{ConfigError, ExportError, FaultlineError};

/// 집계 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// 스냅샷 JSON 직렬화 실패
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<AggregatorError> for FaultlineError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::Encode(e) => {
                FaultlineError::Export(ExportError::Encode(e.to_string()))
            }
            AggregatorError::Config { field, reason } => {
                FaultlineError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn config_error_display() {
        let err = AggregatorError::Config {
            field: "max_errors".to_owned(),
            reason: "must be 1-1000".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("max_errors"));
        assert!(msg.contains("must be 1-1000"));
    }

    #[test]
    fn encode_error_converts_to_export_error() {
        let err: FaultlineError = AggregatorError::from(encode_error()).into();
        assert!(matches!(err, FaultlineError::Export(ExportError::Encode(_))));
    }

    #[test]
    fn config_error_converts_to_invalid_value() {
        let err: FaultlineError = AggregatorError::Config {
            field: "max_traces".to_owned(),
            reason: "must be 1-64".to_owned(),
        }
        .into();
        match err {
            FaultlineError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "max_traces");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
