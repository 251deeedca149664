//! 집계 레코드 -- 핑거프린트 하나의 누적 카운트와 최근 발생 기록
//!
//! [`AggregateRecord`]는 한 번 생성되면 저장소에서 제거되지 않습니다.
//! 카운트 증가와 버퍼 갱신은 같은 레코드 락 안에서 수행되므로
//! 동시 리포트에서도 카운트가 유실되지 않습니다.
//!
//! 심각도와 생성 시각은 레코드 생성 시점에 고정됩니다.
//! 이후 다른 심각도로 리포트된 발생은 각 발생 기록의 `severity`에만 남습니다.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use faultline_core::metrics as m;
use faultline_core::types::{ErrorOccurrence, Severity, rfc3339};

use crate::buffer::OccurrenceBuffer;

/// 락으로 보호되는 가변 상태
#[derive(Debug)]
struct RecordState {
    total_count: u64,
    latest: OccurrenceBuffer,
}

/// 핑거프린트별 집계 레코드
#[derive(Debug)]
pub struct AggregateRecord {
    aggregation_key: String,
    severity: Severity,
    created_at: DateTime<Utc>,
    state: Mutex<RecordState>,
}

impl AggregateRecord {
    /// 새 레코드를 생성합니다. 생성 시각은 현재 시각입니다.
    pub fn new(aggregation_key: impl Into<String>, severity: Severity, capacity: usize) -> Self {
        Self::with_created_at(aggregation_key, severity, capacity, Utc::now())
    }

    /// 생성 시각을 지정하여 레코드를 생성합니다.
    pub(crate) fn with_created_at(
        aggregation_key: impl Into<String>,
        severity: Severity,
        capacity: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            aggregation_key: aggregation_key.into(),
            severity,
            created_at,
            state: Mutex::new(RecordState {
                total_count: 0,
                latest: OccurrenceBuffer::new(capacity),
            }),
        }
    }

    /// 발생 기록을 추가하고 카운트를 1 증가시킵니다.
    ///
    /// 버퍼가 가득 찬 경우 가장 오래된 기록이 밀려납니다.
    pub fn record(&self, occurrence: ErrorOccurrence) {
        let evicted = {
            let mut state = self.lock();
            state.total_count += 1;
            state.latest.push(occurrence)
        };

        if evicted.is_some() {
            metrics::counter!(m::OCCURRENCES_EVICTED_TOTAL).increment(1);
        }
    }

    /// 집계 키를 반환합니다.
    pub fn aggregation_key(&self) -> &str {
        &self.aggregation_key
    }

    /// 레코드 심각도를 반환합니다.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// 레코드 생성 시각을 반환합니다.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 누적 발생 수를 반환합니다.
    pub fn total_count(&self) -> u64 {
        self.lock().total_count
    }

    /// 보관 중인 최근 발생 기록의 복사본을 반환합니다 (오래된 것 먼저).
    pub fn latest(&self) -> Vec<ErrorOccurrence> {
        self.lock().latest.to_vec()
    }

    /// 현재 시점의 일관된 스냅샷을 생성합니다.
    ///
    /// 카운트와 버퍼를 같은 락 안에서 복사합니다.
    pub fn snapshot(&self) -> AggregateSnapshot {
        let (total_count, latest_errors) = {
            let state = self.lock();
            (state.total_count, state.latest.to_vec())
        };

        AggregateSnapshot {
            aggregation_key: self.aggregation_key.clone(),
            total_count,
            severity: self.severity,
            created_at: self.created_at,
            latest_errors,
        }
    }

    // 리포트 도중 패닉이 나도 카운트와 버퍼는 항상 유효한 상태이므로 poison을 무시함
    fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 집계 레코드 스냅샷 (익스포트 페이로드 항목)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    /// 집계 키
    pub aggregation_key: String,
    /// 누적 발생 수
    pub total_count: u64,
    /// 레코드 심각도
    pub severity: Severity,
    /// 레코드 생성 시각
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
    /// 최근 발생 기록 (오래된 것 먼저)
    pub latest_errors: Vec<ErrorOccurrence>,
}
