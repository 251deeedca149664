//! 발생 기록 버퍼 -- 핑거프린트별 최근 N개 보관
//!
//! [`OccurrenceBuffer`]는 고정 용량의 링 버퍼입니다. 가득 찬 상태에서
//! 새 기록이 들어오면 가장 오래된 기록을 밀어내고 뒤에 추가합니다.
//! 삽입 순서(오래된 것 먼저)가 그대로 스냅샷 순서가 됩니다.

use std::collections::VecDeque;

use faultline_core::types::ErrorOccurrence;

/// 고정 용량 발생 기록 버퍼
#[derive(Debug, Clone)]
pub struct OccurrenceBuffer {
    /// 버퍼 내부 저장소 (오래된 것 먼저)
    entries: VecDeque<ErrorOccurrence>,
    /// 최대 용량
    capacity: usize,
}

impl OccurrenceBuffer {
    /// 새 버퍼를 생성합니다.
    ///
    /// 용량 0은 허용하지 않으며 1로 보정합니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 발생 기록을 추가합니다.
    ///
    /// 용량을 초과하면 가장 오래된 기록을 제거하여 반환합니다.
    pub fn push(&mut self, occurrence: ErrorOccurrence) -> Option<ErrorOccurrence> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(occurrence);
        evicted
    }

    /// 보관 중인 기록을 오래된 것부터 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorOccurrence> {
        self.entries.iter()
    }

    /// 보관 중인 기록을 복사하여 반환합니다 (오래된 것 먼저).
    pub fn to_vec(&self) -> Vec<ErrorOccurrence> {
        self.entries.iter().cloned().collect()
    }

    /// 현재 보관 중인 기록 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 버퍼 최대 용량을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
