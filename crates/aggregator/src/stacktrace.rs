//! 기본 스택 트레이스 제공자 -- `backtrace` 크레이트 기반
//!
//! [`BacktraceProvider`]는 호출 시점의 백트레이스를 캡처하고 심볼마다
//! `"<symbol> (<file>:<line>:<col>)"` 형식의 프레임 문자열을 만듭니다.
//! 인라인된 함수도 물리 프레임 안의 심볼 하나로 나타나므로 각각 별도 프레임이 됩니다.
//! 캡처 자체를 수행하는 선두 프레임(백트레이스 내부, 이 크레이트의 리포팅 경로)은
//! 제외하므로 첫 프레임은 `report*`를 호출한 함수가 됩니다.
//!
//! 심볼 정보가 없는 프레임은 `<unknown>`으로 남습니다.

use std::path::Path;

use backtrace::{Backtrace, BacktraceSymbol};

use faultline_core::provider::StackTraceProvider;

/// 심볼 이름을 얻지 못한 프레임
pub const UNKNOWN_FRAME: &str = "<unknown>";

/// 선두에서 건너뛸 프레임 심볼 접두어
const INTERNAL_FRAME_MARKERS: &[&str] = &[
    "backtrace::",
    "<faultline_aggregator::stacktrace::BacktraceProvider as ",
    "faultline_aggregator::collector::ErrorCollector",
];

/// `backtrace::Backtrace` 기반 스택 트레이스 제공자
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceProvider;

impl BacktraceProvider {
    /// 새 제공자를 생성합니다.
    pub const fn new() -> Self {
        Self
    }
}

impl StackTraceProvider for BacktraceProvider {
    fn capture(&self) -> Vec<String> {
        let backtrace = Backtrace::new();
        let mut frames = Vec::with_capacity(backtrace.frames().len());

        for frame in backtrace.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                frames.push(UNKNOWN_FRAME.to_owned());
                continue;
            }
            frames.extend(symbols.iter().map(symbol_frame));
        }

        strip_internal_frames(frames)
    }
}

fn symbol_frame(symbol: &BacktraceSymbol) -> String {
    // `{:#}`는 맹글링 해시 접미사를 생략
    let name = symbol.name().map(|name| format!("{name:#}"));
    format_frame(
        name.as_deref(),
        symbol.filename(),
        symbol.lineno(),
        symbol.colno(),
    )
}

/// 심볼 구성 요소를 프레임 문자열로 조립합니다.
///
/// 파일이 없으면 심볼 이름만, 줄/열 번호는 있는 만큼만 붙입니다.
pub fn format_frame(
    name: Option<&str>,
    file: Option<&Path>,
    line: Option<u32>,
    column: Option<u32>,
) -> String {
    let name = name.unwrap_or(UNKNOWN_FRAME);
    let Some(file) = file else {
        return name.to_owned();
    };

    let file = file.display();
    match (line, column) {
        (Some(line), Some(column)) => format!("{name} ({file}:{line}:{column})"),
        (Some(line), None) => format!("{name} ({file}:{line})"),
        (None, _) => format!("{name} ({file})"),
    }
}

fn strip_internal_frames(frames: Vec<String>) -> Vec<String> {
    let skip = frames
        .iter()
        .take_while(|frame| {
            INTERNAL_FRAME_MARKERS
                .iter()
                .any(|marker| frame.starts_with(marker))
        })
        .count();
    frames.into_iter().skip(skip).collect()
}
