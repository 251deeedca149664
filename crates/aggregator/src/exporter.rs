//! 스냅샷 익스포터 -- 집계 상태를 JSON 페이로드로 직렬화
//!
//! 익스포트는 읽기 전용입니다. 저장소를 비우거나 카운트를 초기화하지 않으므로
//! 변경 없이 두 번 익스포트하면 같은 바이트열이 나옵니다.
//! 푸시가 실패해도 다음 익스포트에 누적된 데이터가 모두 포함됩니다.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use faultline_core::metrics as m;

use crate::collector::ErrorCollector;
use crate::error::AggregatorError;
use crate::record::AggregateSnapshot;

/// 익스포트 페이로드의 콘텐츠 타입
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 익스포트 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// 수집기 인스턴스 ID
    pub target_uuid: Uuid,
    /// 집계 레코드 스냅샷 (집계 키 순)
    pub aggregated_errors: Vec<AggregateSnapshot>,
}

/// 에러 익스포터
///
/// 수집기를 공유 소유하며, 호출 시점의 스냅샷을 직렬화합니다.
#[derive(Debug, Clone)]
pub struct ErrorExporter {
    collector: Arc<ErrorCollector>,
}

impl ErrorExporter {
    /// 수집기에 대한 익스포터를 생성합니다.
    pub fn new(collector: Arc<ErrorCollector>) -> Self {
        Self { collector }
    }

    /// 대상 수집기를 반환합니다.
    pub fn collector(&self) -> &Arc<ErrorCollector> {
        &self.collector
    }

    /// 현재 시점의 페이로드를 생성합니다.
    ///
    /// 레코드별로 일관된 스냅샷이며, 서로 다른 레코드 사이의 시점은 다를 수 있습니다.
    pub fn snapshot(&self) -> ExportPayload {
        ExportPayload {
            target_uuid: self.collector.target_uuid(),
            aggregated_errors: self.collector.store().snapshot_all(),
        }
    }

    /// 현재 집계 상태를 JSON 바이트열로 직렬화합니다.
    pub fn export(&self) -> Result<Vec<u8>, AggregatorError> {
        let start = Instant::now();
        let payload = self.snapshot();
        let result = serde_json::to_vec(&payload);
        metrics::histogram!(m::EXPORT_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(bytes) => {
                metrics::counter!(m::EXPORTS_TOTAL, m::LABEL_RESULT => m::RESULT_SUCCESS)
                    .increment(1);
                tracing::trace!(
                    aggregates = payload.aggregated_errors.len(),
                    bytes = bytes.len(),
                    "snapshot exported"
                );
                Ok(bytes)
            }
            Err(e) => {
                metrics::counter!(m::EXPORTS_TOTAL, m::LABEL_RESULT => m::RESULT_FAILURE)
                    .increment(1);
                tracing::error!(error = %e, "failed to encode snapshot");
                Err(AggregatorError::Encode(e))
            }
        }
    }

    /// 현재 집계 상태를 JSON 문자열로 직렬화합니다.
    pub fn export_string(&self) -> Result<String, AggregatorError> {
        let bytes = self.export()?;
        // serde_json은 항상 유효한 UTF-8을 생성함
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use faultline_core::types::{ErrorInstance, ErrorOccurrence, HttpContext, Severity};

    use super::*;
    use crate::record::AggregateRecord;

    const FIXED_UUID: &str = "5d9893c6-51d6-11ea-8aad-f894c260afe5";

    fn fixed_collector() -> Arc<ErrorCollector> {
        let uuid = Uuid::parse_str(FIXED_UUID).unwrap();
        Arc::new(
            ErrorCollector::builder()
                .target_uuid(uuid)
                .stack_trace_provider(Vec::new)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn export_matches_wire_format() {
        let collector = fixed_collector();
        let uuid = Uuid::parse_str(FIXED_UUID).unwrap();
        let ts = Utc.with_ymd_and_hms(2020, 2, 17, 22, 42, 45).unwrap();

        let record = collector.store().get_or_insert_with("test", || {
            AggregateRecord::with_created_at("test", Severity::Error, 10, ts)
        });
        record.record(ErrorOccurrence {
            error: ErrorInstance::new(
                "testing",
                "",
                vec!["line 12:".to_owned(), "syntax error".to_owned()],
            ),
            uuid,
            timestamp: ts,
            severity: Severity::Error,
            http_context: Some(
                HttpContext::new("GET", "http://example.com")
                    .with_header("Cache-Control", "no-cache"),
            ),
        });

        let exported: serde_json::Value =
            serde_json::from_slice(&ErrorExporter::new(collector).export().unwrap()).unwrap();
        let expected = serde_json::json!({
            "target_uuid": "5d9893c6-51d6-11ea-8aad-f894c260afe5",
            "aggregated_errors": [{
                "aggregation_key": "test",
                "total_count": 1,
                "severity": "error",
                "created_at": "2020-02-17T22:42:45Z",
                "latest_errors": [{
                    "error": {
                        "class": "testing",
                        "message": "",
                        "stacktrace": ["line 12:", "syntax error"],
                        "cause": null
                    },
                    "uuid": "5d9893c6-51d6-11ea-8aad-f894c260afe5",
                    "timestamp": "2020-02-17T22:42:45Z",
                    "severity": "error",
                    "http_context": {
                        "request_method": "GET",
                        "request_url": "http://example.com",
                        "request_headers": {"Cache-Control": "no-cache"},
                        "request_body": null
                    }
                }]
            }]
        });
        assert_eq!(exported, expected);
    }

    #[test]
    fn empty_store_exports_empty_list() {
        let exporter = ErrorExporter::new(fixed_collector());
        let json = exporter.export_string().unwrap();
        assert_eq!(
            json,
            r#"{"target_uuid":"5d9893c6-51d6-11ea-8aad-f894c260afe5","aggregated_errors":[]}"#
        );
    }

    #[test]
    fn export_is_idempotent() {
        let collector = fixed_collector();
        collector.report_instance(ErrorInstance::new("a", "x", vec![]), None, Severity::Error);
        collector.report_instance(ErrorInstance::new("b", "y", vec![]), None, Severity::Info);

        let exporter = ErrorExporter::new(Arc::clone(&collector));
        let first = exporter.export().unwrap();
        let second = exporter.export().unwrap();
        assert_eq!(first, second);
        assert_eq!(collector.store().len(), 2);
    }

    #[test]
    fn export_reflects_reports_made_after_previous_export() {
        let collector = fixed_collector();
        let exporter = ErrorExporter::new(Arc::clone(&collector));
        collector.report_instance(ErrorInstance::new("a", "x", vec![]), None, Severity::Error);
        let before = exporter.snapshot();

        collector.report_instance(ErrorInstance::new("a", "x", vec![]), None, Severity::Error);
        let after = exporter.snapshot();

        assert_eq!(before.aggregated_errors[0].total_count, 1);
        assert_eq!(after.aggregated_errors[0].total_count, 2);
    }

    #[test]
    fn exported_payload_round_trips() {
        let collector = fixed_collector();
        collector.report_instance(
            ErrorInstance::new("outer", "failed", vec!["f0".to_owned()])
                .with_cause(ErrorInstance::new("inner", "root cause", vec![])),
            Some(HttpContext::new("POST", "http://example.com/x").with_body("{}")),
            Severity::Warning,
        );
        let exporter = ErrorExporter::new(collector);
        let parsed: ExportPayload = serde_json::from_slice(&exporter.export().unwrap()).unwrap();
        assert_eq!(parsed, exporter.snapshot());
    }
}
