//! 도메인 타입 — 에러 발생 정보와 HTTP 컨텍스트
//!
//! 모든 타입은 익스포트 페이로드의 JSON 필드명을 그대로 따릅니다.
//! 필드명을 바꾸면 수집 백엔드와의 와이어 호환성이 깨집니다.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Warning < Error`).
/// 기본값은 `Error`입니다. 별도 지정 없이 리포트된 에러는 `Error`로 기록됩니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 정보성
    Info,
    /// 경고
    Warning,
    /// 에러
    #[default]
    Error,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            _ => None,
        }
    }

    /// 와이어 형식 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 에러 인스턴스
///
/// 에러 클래스, 메시지, 스택 트레이스, 원인 체인을 담습니다.
/// `cause`는 유한한 단방향 체인이며 각 노드는 상위 노드가 소유합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInstance {
    /// 에러 런타임 타입 식별자
    pub class: String,
    /// 에러 메시지
    pub message: String,
    /// 스택 트레이스 (가장 안쪽 프레임이 먼저)
    pub stacktrace: Vec<String>,
    /// 원인 에러
    pub cause: Option<Box<ErrorInstance>>,
}

impl ErrorInstance {
    /// 새 에러 인스턴스를 생성합니다.
    pub fn new(
        class: impl Into<String>,
        message: impl Into<String>,
        stacktrace: Vec<String>,
    ) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            stacktrace,
            cause: None,
        }
    }

    /// 원인 에러를 연결합니다.
    pub fn with_cause(mut self, cause: ErrorInstance) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 원인 체인의 길이를 반환합니다 (자기 자신 제외).
    pub fn cause_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.cause.as_deref();
        while let Some(cause) = current {
            depth += 1;
            current = cause.cause.as_deref();
        }
        depth
    }

    /// 원인 체인을 최대 `max_depth` 단계로 자릅니다.
    ///
    /// 외부에서 받은 인스턴스의 체인 길이를 제한할 때 사용합니다.
    pub fn truncate_causes(&mut self, max_depth: usize) {
        if max_depth == 0 {
            self.cause = None;
            return;
        }
        if let Some(cause) = self.cause.as_mut() {
            cause.truncate_causes(max_depth - 1);
        }
    }
}

impl fmt::Display for ErrorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

/// HTTP 요청 컨텍스트
///
/// 에러가 발생한 시점의 요청 정보입니다. 한 번 연결되면 변경되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpContext {
    /// 요청 메서드 (GET, POST 등)
    pub request_method: String,
    /// 요청 URL
    pub request_url: String,
    /// 요청 헤더 (헤더명은 수신된 대소문자 그대로)
    pub request_headers: BTreeMap<String, String>,
    /// 요청 본문 (수집하지 않은 경우 `None`)
    pub request_body: Option<String>,
}

impl HttpContext {
    /// 메서드와 URL로 새 컨텍스트를 생성합니다.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            request_method: method.into(),
            request_url: url.into(),
            ..Self::default()
        }
    }

    /// 헤더를 추가합니다.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// 요청 본문을 설정합니다.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }
}

/// 에러 발생 — 한 번의 리포트로 생성되는 단일 에러 기록
///
/// 리포트 시점에 생성되며 이후 변경되지 않습니다.
/// 집계 레코드의 버퍼 슬롯 하나가 밀려날 때까지 소유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOccurrence {
    /// 에러 인스턴스
    pub error: ErrorInstance,
    /// 발생 고유 ID
    pub uuid: Uuid,
    /// 수집 시각 (UTC)
    #[serde(with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
    /// 심각도
    pub severity: Severity,
    /// HTTP 컨텍스트 (없으면 `null`로 직렬화)
    pub http_context: Option<HttpContext>,
}

impl ErrorOccurrence {
    /// 새 ID와 현재 시각으로 발생 기록을 생성합니다.
    pub fn new(error: ErrorInstance, severity: Severity, http_context: Option<HttpContext>) -> Self {
        Self {
            error,
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            http_context,
        }
    }
}

/// RFC 3339 UTC 타임스탬프 직렬화 (`2020-02-17T22:42:45Z`)
///
/// 소수 초는 0이 아닐 때만 출력합니다.
pub mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// 타임스탬프를 RFC 3339 문자열로 직렬화합니다.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    /// RFC 3339 문자열을 UTC 타임스탬프로 역직렬화합니다.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_default_is_error() {
        assert_eq!(Severity::default(), Severity::Error);
    }

    #[test]
    fn severity_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("INFO"), Some(Severity::Info));
        assert_eq!(Severity::from_str_loose("warn"), Some(Severity::Warning));
        assert_eq!(Severity::from_str_loose("Error"), Some(Severity::Error));
        assert_eq!(Severity::from_str_loose("fatal"), None);
    }

    #[test]
    fn empty_instance_serializes_with_null_cause() {
        let json = serde_json::to_value(ErrorInstance::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "class": "",
                "message": "",
                "stacktrace": [],
                "cause": null
            })
        );
    }

    #[test]
    fn nested_cause_serializes_recursively() {
        let inner = ErrorInstance::new("io", "connection reset", vec![]);
        let outer = ErrorInstance::new("db", "query failed", vec!["frame".to_owned()])
            .with_cause(inner);
        let json = serde_json::to_value(&outer).unwrap();
        assert_eq!(json["cause"]["class"], "io");
        assert_eq!(json["cause"]["cause"], serde_json::Value::Null);
        assert_eq!(outer.cause_depth(), 1);
    }

    #[test]
    fn truncate_causes_caps_chain() {
        let mut instance = ErrorInstance::new("e0", "", vec![]);
        for i in 1..=5 {
            instance = ErrorInstance::new(format!("e{i}"), "", vec![]).with_cause(instance);
        }
        assert_eq!(instance.cause_depth(), 5);

        instance.truncate_causes(2);
        assert_eq!(instance.cause_depth(), 2);

        instance.truncate_causes(0);
        assert_eq!(instance.cause_depth(), 0);
        assert!(instance.cause.is_none());
    }

    #[test]
    fn http_context_serializes_absent_body_as_null() {
        let ctx = HttpContext::new("GET", "http://example.com").with_header("Cache-Control", "no-cache");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "request_method": "GET",
                "request_url": "http://example.com",
                "request_headers": {"Cache-Control": "no-cache"},
                "request_body": null
            })
        );
    }

    #[test]
    fn occurrence_timestamp_is_rfc3339_utc() {
        let mut occurrence = ErrorOccurrence::new(ErrorInstance::default(), Severity::Error, None);
        occurrence.timestamp = Utc.with_ymd_and_hms(2020, 2, 17, 22, 42, 45).unwrap();
        let json = serde_json::to_value(&occurrence).unwrap();
        assert_eq!(json["timestamp"], "2020-02-17T22:42:45Z");
        assert_eq!(json["http_context"], serde_json::Value::Null);
    }

    #[test]
    fn occurrence_ids_are_unique() {
        let a = ErrorOccurrence::new(ErrorInstance::default(), Severity::Error, None);
        let b = ErrorOccurrence::new(ErrorInstance::default(), Severity::Error, None);
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn occurrence_deserializes_from_wire() {
        let raw = r#"{
            "error": {"class": "testing", "message": "", "stacktrace": ["line 12:"], "cause": null},
            "uuid": "5d9893c6-51d6-11ea-8aad-f894c260afe5",
            "timestamp": "2020-02-17T22:42:45Z",
            "severity": "warning",
            "http_context": null
        }"#;
        let occurrence: ErrorOccurrence = serde_json::from_str(raw).unwrap();
        assert_eq!(occurrence.severity, Severity::Warning);
        assert_eq!(occurrence.error.stacktrace, vec!["line 12:"]);
        assert_eq!(
            occurrence.timestamp,
            Utc.with_ymd_and_hms(2020, 2, 17, 22, 42, 45).unwrap()
        );
    }
}
