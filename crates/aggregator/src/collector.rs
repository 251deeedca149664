//! 에러 수집기 -- 리포팅 진입점
//!
//! [`ErrorCollector`]는 애플리케이션 코드가 직접 호출하는 퍼사드입니다.
//! 리포트 한 번마다 다음을 수행합니다.
//!
//! 1. 에러 클래스, 메시지, 원인 체인을 추출하고 스택 트레이스를 캡처
//! 2. 집계 키 계산
//! 3. 저장소에서 레코드를 조회하거나 생성
//! 4. 새 발생 기록(UUID, 시각, 심각도, HTTP 컨텍스트)을 레코드에 추가
//!
//! 리포팅 경로는 실패하지 않으며 값을 반환하지 않습니다.
//! 여러 스레드에서 동시에 호출할 수 있습니다.
//!
//! # 사용 예시
//! ```ignore
//! use std::sync::Arc;
//! use faultline_aggregator::ErrorCollector;
//!
//! let collector = Arc::new(ErrorCollector::new());
//! if let Err(e) = "abc".parse::<i32>() {
//!     collector.report(&e);
//! }
//! ```

use std::any::type_name;
use std::error::Error;
use std::fmt;

use uuid::Uuid;

use faultline_core::metrics as m;
use faultline_core::provider::{HttpContextSource, StackTraceProvider};
use faultline_core::types::{ErrorInstance, ErrorOccurrence, HttpContext, Severity};

use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::fingerprint::KeyDeriver;
use crate::stacktrace::BacktraceProvider;
use crate::store::AggregationStore;

/// 원인 에러의 클래스를 알 수 없을 때 사용하는 이름
pub const UNKNOWN_CLASS: &str = "unknown";

/// 에러 수집기
///
/// 인스턴스마다 고유한 `target_uuid`를 가지며, 익스포트 페이로드에서
/// 이 수집기를 식별하는 데 사용됩니다.
pub struct ErrorCollector {
    target_uuid: Uuid,
    store: AggregationStore,
    key_deriver: KeyDeriver,
    stack_traces: Box<dyn StackTraceProvider>,
    config: AggregatorConfig,
}

impl ErrorCollector {
    /// 기본 설정과 `backtrace` 크레이트 기반 스택 트레이스로 수집기를 생성합니다.
    pub fn new() -> Self {
        Self::from_parts(
            AggregatorConfig::default(),
            Uuid::new_v4(),
            Box::new(BacktraceProvider::new()),
        )
    }

    /// 수집기 빌더를 생성합니다.
    pub fn builder() -> ErrorCollectorBuilder {
        ErrorCollectorBuilder::new()
    }

    fn from_parts(
        config: AggregatorConfig,
        target_uuid: Uuid,
        stack_traces: Box<dyn StackTraceProvider>,
    ) -> Self {
        Self {
            target_uuid,
            store: AggregationStore::new(config.max_errors),
            key_deriver: KeyDeriver::with_max_traces(config.max_traces),
            stack_traces,
            config,
        }
    }

    /// 수집기 인스턴스 ID를 반환합니다.
    pub fn target_uuid(&self) -> Uuid {
        self.target_uuid
    }

    /// 집계 저장소를 반환합니다.
    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    /// 수집기 설정을 반환합니다.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// 기본 심각도로 에러를 리포트합니다.
    ///
    /// 에러 클래스는 `E`의 타입 이름입니다. `&dyn Error`로 전달하면
    /// 구체 타입을 알 수 없으므로 가능하면 구체 타입으로 호출해야 합니다.
    pub fn report<E>(&self, error: &E)
    where
        E: Error + ?Sized,
    {
        self.report_with_severity(error, self.config.default_severity);
    }

    /// 지정한 심각도로 에러를 리포트합니다.
    pub fn report_with_severity<E>(&self, error: &E, severity: Severity)
    where
        E: Error + ?Sized,
    {
        let instance = self.capture(error);
        self.add(instance, severity, None);
    }

    /// HTTP 컨텍스트와 함께 에러를 리포트합니다.
    pub fn report_with_http_context<E>(&self, error: &E, context: HttpContext)
    where
        E: Error + ?Sized,
    {
        let instance = self.capture(error);
        self.add(instance, self.config.default_severity, Some(context));
    }

    /// 라이브 HTTP 요청에서 컨텍스트를 추출하여 에러와 함께 리포트합니다.
    ///
    /// 메서드, URL, 헤더만 추출하며 본문은 기록하지 않습니다.
    pub fn report_with_http_request<E, R>(&self, error: &E, request: &R)
    where
        E: Error + ?Sized,
        R: HttpContextSource + ?Sized,
    {
        let instance = self.capture(error);
        self.add(
            instance,
            self.config.default_severity,
            Some(request.http_context()),
        );
    }

    /// 이미 구성된 에러 인스턴스를 리포트합니다.
    ///
    /// 스택 트레이스를 캡처하지 않고 인스턴스를 그대로 사용합니다.
    /// 원인 체인은 `max_cause_depth`로 잘립니다. 빈 인스턴스도 유효한 입력입니다.
    pub fn report_instance(
        &self,
        mut instance: ErrorInstance,
        http_context: Option<HttpContext>,
        severity: Severity,
    ) {
        instance.truncate_causes(self.config.max_cause_depth);
        self.add(instance, severity, http_context);
    }

    fn capture<E>(&self, error: &E) -> ErrorInstance
    where
        E: Error + ?Sized,
    {
        let mut instance = ErrorInstance::new(
            type_name::<E>(),
            error.to_string(),
            self.stack_traces.capture(),
        );
        instance.cause = cause_chain(error.source(), self.config.max_cause_depth).map(Box::new);
        instance
    }

    fn add(&self, instance: ErrorInstance, severity: Severity, http_context: Option<HttpContext>) {
        let key = self.key_deriver.derive(&instance);
        let record = self.store.get_or_create(&key, severity);
        record.record(ErrorOccurrence::new(instance, severity, http_context));

        metrics::counter!(m::ERRORS_REPORTED_TOTAL, m::LABEL_SEVERITY => severity.as_str())
            .increment(1);
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCollector")
            .field("target_uuid", &self.target_uuid)
            .field("aggregates", &self.store.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// `source()` 체인을 최대 `max_depth` 단계까지 인스턴스로 변환합니다.
///
/// 원인 에러는 스택 트레이스가 없으므로 `stacktrace`는 비어 있습니다.
fn cause_chain(
    mut current: Option<&(dyn Error + 'static)>,
    max_depth: usize,
) -> Option<ErrorInstance> {
    let mut chain = Vec::new();
    while let Some(err) = current {
        if chain.len() >= max_depth {
            break;
        }
        chain.push(ErrorInstance::new(class_of(err), err.to_string(), Vec::new()));
        current = err.source();
    }

    chain
        .into_iter()
        .rev()
        .reduce(|inner, outer| outer.with_cause(inner))
}

/// `Debug` 출력의 선두 식별자를 클래스 이름으로 사용합니다.
///
/// 트레이트 객체에서는 구체 타입 이름을 얻을 수 없으므로 근사값입니다.
/// `ParseIntError { kind: InvalidDigit }`는 `ParseIntError`가 됩니다.
fn class_of(err: &(dyn Error + 'static)) -> String {
    let debug = format!("{err:?}");
    let end = debug
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .unwrap_or(debug.len());
    match &debug[..end] {
        "" => UNKNOWN_CLASS.to_owned(),
        name => name.to_owned(),
    }
}

/// 에러 수집기 빌더
pub struct ErrorCollectorBuilder {
    config: AggregatorConfig,
    target_uuid: Option<Uuid>,
    stack_traces: Option<Box<dyn StackTraceProvider>>,
}

impl ErrorCollectorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: AggregatorConfig::default(),
            target_uuid: None,
            stack_traces: None,
        }
    }

    /// 집계 설정을 지정합니다.
    pub fn config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// 수집기 인스턴스 ID를 지정합니다. 지정하지 않으면 무작위 v4 UUID를 사용합니다.
    pub fn target_uuid(mut self, uuid: Uuid) -> Self {
        self.target_uuid = Some(uuid);
        self
    }

    /// 스택 트레이스 제공자를 지정합니다.
    pub fn stack_trace_provider(mut self, provider: impl StackTraceProvider + 'static) -> Self {
        self.stack_traces = Some(Box::new(provider));
        self
    }

    /// 설정을 검증하고 수집기를 생성합니다.
    pub fn build(self) -> Result<ErrorCollector, AggregatorError> {
        self.config.validate()?;

        let stack_traces = self
            .stack_traces
            .unwrap_or_else(|| Box::new(BacktraceProvider::new()));
        let collector = ErrorCollector::from_parts(
            self.config,
            self.target_uuid.unwrap_or_else(Uuid::new_v4),
            stack_traces,
        );

        tracing::debug!(
            target_uuid = %collector.target_uuid,
            max_errors = collector.config.max_errors,
            max_traces = collector.config.max_traces,
            "error collector created"
        );
        Ok(collector)
    }
}

impl Default for ErrorCollectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
