//! 집계 저장소 -- 집계 키에서 레코드로의 매핑
//!
//! 키 공간은 `RwLock`으로 보호합니다. 기존 키 조회는 읽기 락만 잡고,
//! 새 키 삽입만 쓰기 락을 잡습니다. 레코드 내용 갱신은 레코드별 락으로
//! 독립적으로 동기화되므로 서로 다른 키의 리포트는 경합하지 않습니다.
//!
//! 키는 한 번 삽입되면 제거되지 않으며, 같은 키에 대해 레코드는
//! 최대 하나만 존재합니다.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use faultline_core::config::DEFAULT_MAX_ERRORS;
use faultline_core::metrics as m;
use faultline_core::types::Severity;

use crate::record::{AggregateRecord, AggregateSnapshot};

/// 집계 레코드 저장소
#[derive(Debug)]
pub struct AggregationStore {
    records: RwLock<HashMap<String, Arc<AggregateRecord>>>,
    /// 레코드별 버퍼 용량
    max_errors: usize,
}

impl AggregationStore {
    /// 레코드별 버퍼 용량을 지정하여 빈 저장소를 생성합니다.
    pub fn new(max_errors: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            max_errors,
        }
    }

    /// 레코드별 버퍼 용량을 반환합니다.
    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    /// 키에 해당하는 레코드를 반환하고, 없으면 새로 생성합니다.
    ///
    /// 같은 키로 동시에 호출되어도 레코드는 하나만 생성됩니다.
    /// `severity`는 레코드가 새로 생성될 때만 사용됩니다.
    pub fn get_or_create(&self, key: &str, severity: Severity) -> Arc<AggregateRecord> {
        self.get_or_insert_with(key, || {
            AggregateRecord::new(key, severity, self.max_errors)
        })
    }

    /// 키에 해당하는 레코드를 반환하고, 없으면 `make`로 생성하여 삽입합니다.
    pub(crate) fn get_or_insert_with<F>(&self, key: &str, make: F) -> Arc<AggregateRecord>
    where
        F: FnOnce() -> AggregateRecord,
    {
        if let Some(record) = self.get(key) {
            return record;
        }

        let (record, inserted, total) = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            // 읽기 락을 놓은 사이 다른 스레드가 먼저 삽입했을 수 있음
            if let Some(existing) = records.get(key) {
                (Arc::clone(existing), false, records.len())
            } else {
                let record = Arc::new(make());
                records.insert(key.to_owned(), Arc::clone(&record));
                (record, true, records.len())
            }
        };

        if inserted {
            tracing::debug!(
                aggregation_key = %key,
                severity = %record.severity(),
                aggregates = total,
                "new aggregate created"
            );
            metrics::counter!(m::AGGREGATES_CREATED_TOTAL).increment(1);
            metrics::gauge!(m::AGGREGATES).set(total as f64);
        }

        record
    }

    /// 키에 해당하는 레코드를 조회합니다.
    pub fn get(&self, key: &str) -> Option<Arc<AggregateRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// 저장된 집계 키 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 저장소가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 저장된 집계 키 목록을 정렬하여 반환합니다.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// 모든 레코드의 스냅샷을 집계 키 순으로 반환합니다.
    ///
    /// 키 공간 락은 레코드 핸들을 복사하는 동안만 잡고,
    /// 각 레코드는 자신의 락 안에서 복사합니다.
    pub fn snapshot_all(&self) -> Vec<AggregateSnapshot> {
        let records: Vec<Arc<AggregateRecord>> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut snapshots: Vec<AggregateSnapshot> =
            records.iter().map(|record| record.snapshot()).collect();
        snapshots.sort_unstable_by(|a, b| a.aggregation_key.cmp(&b.aggregation_key));
        snapshots
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}
