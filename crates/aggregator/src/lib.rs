#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`fingerprint`]: 집계 키 계산 (32비트 FNV-1a)
//! - [`buffer`]: 핑거프린트별 최근 발생 기록 링 버퍼
//! - [`record`]: 집계 레코드와 스냅샷
//! - [`store`]: 집계 키 -> 레코드 저장소
//! - [`collector`]: 리포팅 퍼사드
//! - [`exporter`]: JSON 스냅샷 익스포터
//! - [`stacktrace`]: `backtrace` 크레이트 기반 기본 스택 트레이스 제공자
//! - [`config`]: 집계 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입

pub mod buffer;
pub mod collector;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fingerprint;
pub mod record;
pub mod stacktrace;
pub mod store;

// --- 주요 타입 re-export ---

// 수집기
pub use collector::{ErrorCollector, ErrorCollectorBuilder};

// 익스포터
pub use exporter::{CONTENT_TYPE_JSON, ErrorExporter, ExportPayload};

// 설정
pub use config::{AggregatorConfig, AggregatorConfigBuilder};

// 에러
pub use error::AggregatorError;

// 핑거프린트
pub use fingerprint::{KeyDeriver, derive_key};

// 저장소
pub use record::{AggregateRecord, AggregateSnapshot};
pub use store::AggregationStore;

// 스택 트레이스
pub use stacktrace::BacktraceProvider;
