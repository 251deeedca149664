//! Panic reporting.
//!
//! [`install_panic_reporter`] chains a panic hook that records every panic
//! in the collector (class `panic`, severity `error`) before delegating to
//! the previously installed hook. The panic location becomes the first frame
//! so that panics with the same message at different call sites stay apart.

use std::any::Any;
use std::panic::PanicHookInfo;
use std::sync::Arc;

use faultline_aggregator::{BacktraceProvider, ErrorCollector};
use faultline_core::provider::StackTraceProvider;
use faultline_core::types::{ErrorInstance, Severity};

/// Class recorded for panics.
pub const PANIC_CLASS: &str = "panic";

/// Frames emitted by the unwinding machinery and this hook.
const HOOK_FRAME_MARKERS: &[&str] = &["panic", "backtrace", "unwind", "<alloc::boxed::Box"];

/// Install a panic hook that reports to `collector`.
///
/// The previous hook still runs afterwards, so the default stderr message
/// and any abort behavior are preserved.
pub fn install_panic_reporter(collector: Arc<ErrorCollector>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        collector.report_instance(panic_instance(info), None, Severity::Error);
        previous(info);
    }));
    tracing::debug!("panic reporter installed");
}

fn panic_instance(info: &PanicHookInfo<'_>) -> ErrorInstance {
    let mut stacktrace = Vec::new();
    if let Some(location) = info.location() {
        stacktrace.push(format!(
            "{}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    stacktrace.extend(strip_hook_frames(BacktraceProvider::new().capture()));

    ErrorInstance::new(PANIC_CLASS, payload_message(info.payload()), stacktrace)
}

/// Extract the panic message from a `&str` or `String` payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

fn strip_hook_frames(frames: Vec<String>) -> Vec<String> {
    let skip = frames
        .iter()
        .take_while(|frame| {
            frame.starts_with("faultline_daemon::panic")
                || HOOK_FRAME_MARKERS.iter().any(|m| frame.contains(m))
        })
        .count();
    frames.into_iter().skip(skip).collect()
}
