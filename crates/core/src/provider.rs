//! 협력자 trait — 리포팅 경로의 외부 확장 포인트 정의
//!
//! 스택 트레이스 캡처와 라이브 HTTP 요청에서의 컨텍스트 추출은
//! 집계 엔진 바깥의 책임입니다. 엔진은 이 trait을 통해서만 호출합니다.

use http::{HeaderMap, Method, Uri};

use crate::types::HttpContext;

/// 스택 트레이스 제공자
///
/// 호출 시점의 스택 트레이스를 프레임 문자열 목록으로 반환합니다.
/// 가장 안쪽 프레임이 먼저 와야 합니다. 캡처할 수 없으면 빈 목록을 반환합니다.
pub trait StackTraceProvider: Send + Sync {
    /// 현재 호출 지점의 스택 트레이스를 캡처합니다.
    fn capture(&self) -> Vec<String>;
}

impl<F> StackTraceProvider for F
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn capture(&self) -> Vec<String> {
        self()
    }
}

/// HTTP 컨텍스트 추출 대상
///
/// 라이브 요청 객체에서 메서드, URL, 헤더를 추출합니다.
/// 버퍼링되지 않은 본문은 추출하지 않으며 `request_body`는 `None`이 됩니다.
pub trait HttpContextSource {
    /// 요청에서 HTTP 컨텍스트를 추출합니다.
    fn http_context(&self) -> HttpContext;
}

impl HttpContextSource for HttpContext {
    fn http_context(&self) -> HttpContext {
        self.clone()
    }
}

/// 본문 타입과 무관하게 요청 라인과 헤더만 추출합니다.
impl<B> HttpContextSource for http::Request<B> {
    fn http_context(&self) -> HttpContext {
        context_from_parts(self.method(), self.uri(), self.headers())
    }
}

impl HttpContextSource for http::request::Parts {
    fn http_context(&self) -> HttpContext {
        context_from_parts(&self.method, &self.uri, &self.headers)
    }
}

/// 요청 라인과 헤더에서 컨텍스트를 구성합니다.
///
/// `http` 크레이트는 헤더명을 소문자로 정규화하므로 헤더명은 소문자로 기록됩니다.
/// 같은 이름의 헤더가 여러 개면 `", "`로 이어 붙입니다.
fn context_from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> HttpContext {
    let mut ctx = HttpContext::new(method.as_str(), uri.to_string());
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        ctx.request_headers
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    ctx
}
