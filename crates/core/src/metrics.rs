//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 구성 요소는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `faultline_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(faultline_core::metrics::ERRORS_REPORTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 심각도 레이블 키 (info, warning, error)
pub const LABEL_SEVERITY: &str = "severity";

/// 결과 레이블 값: 성공
pub const RESULT_SUCCESS: &str = "success";

/// 결과 레이블 값: 실패
pub const RESULT_FAILURE: &str = "failure";

// ─── 수집기 메트릭 ─────────────────────────────────────────────────

/// 리포트된 전체 에러 수 (counter, label: severity)
pub const ERRORS_REPORTED_TOTAL: &str = "faultline_errors_reported_total";

/// 새로 생성된 집계 레코드 수 (counter)
pub const AGGREGATES_CREATED_TOTAL: &str = "faultline_aggregates_created_total";

/// 버퍼에서 밀려난 발생 기록 수 (counter)
pub const OCCURRENCES_EVICTED_TOTAL: &str = "faultline_occurrences_evicted_total";

/// 현재 저장소의 핑거프린트 수 (gauge)
pub const AGGREGATES: &str = "faultline_aggregates";

// ─── 익스포트 메트릭 ───────────────────────────────────────────────

/// 익스포트 시도 수 (counter, label: result)
pub const EXPORTS_TOTAL: &str = "faultline_exports_total";

/// 스냅샷 생성 + 직렬화 소요 시간 (histogram, 초)
pub const EXPORT_DURATION_SECONDS: &str = "faultline_export_duration_seconds";

/// 게이트웨이 푸시 시도 수 (counter, label: result)
pub const PUSHES_TOTAL: &str = "faultline_pushes_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 익스포트 소요 시간 히스토그램 버킷 (초)
///
/// 10us ~ 1s 범위
pub const EXPORT_DURATION_BUCKETS: [f64; 8] =
    [0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.1, 1.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `faultline-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        ERRORS_REPORTED_TOTAL,
        "Total number of errors reported to the collector"
    );
    describe_counter!(
        AGGREGATES_CREATED_TOTAL,
        "Total number of distinct aggregation keys created"
    );
    describe_counter!(
        OCCURRENCES_EVICTED_TOTAL,
        "Total number of occurrences evicted from bounded per-key buffers"
    );
    describe_gauge!(AGGREGATES, "Number of aggregation keys currently stored");
    describe_counter!(EXPORTS_TOTAL, "Total number of snapshot exports by result");
    describe_histogram!(
        EXPORT_DURATION_SECONDS,
        "Time to snapshot and encode the aggregation store in seconds"
    );
    describe_counter!(PUSHES_TOTAL, "Total number of gateway pushes by result");
}
