//! 에러 타입 — 도메인별 에러 정의
//!
//! 리포팅 경로(`report*`)는 에러를 반환하지 않습니다.
//! 여기 정의된 에러는 설정 로딩, 익스포트, 푸시처럼 호출자가
//! 재시도하거나 알려야 하는 경로에서만 사용됩니다.

/// Faultline 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FaultlineError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스냅샷 직렬화 에러
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// 원격 전송 에러
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스냅샷 익스포트 에러
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 페이로드 인코딩 실패
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

/// 원격 전송 에러
///
/// 전송 실패는 인메모리 상태에 영향을 주지 않습니다.
/// 다음 익스포트에 누적된 데이터가 모두 포함됩니다.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 잘못된 전송 대상 주소
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// 요청 전송 실패 (연결, 타임아웃 등)
    #[error("request failed: {0}")]
    Request(String),

    /// 대상이 성공이 아닌 상태 코드로 응답
    #[error("unexpected response status: {status}")]
    Status { status: u16 },
}
