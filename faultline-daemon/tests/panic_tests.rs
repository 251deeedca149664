//! Panic reporter tests.
//!
//! The panic hook is process-global, so every test here runs serially.

use std::panic;
use std::sync::Arc;

use serial_test::serial;

use faultline_aggregator::ErrorCollector;
use faultline_core::types::Severity;
use faultline_daemon::panic::{PANIC_CLASS, install_panic_reporter};

fn collector() -> Arc<ErrorCollector> {
    Arc::new(ErrorCollector::new())
}

/// Run `f` with the reporter installed, then restore the default hook.
fn with_reporter<F: FnOnce() + panic::UnwindSafe>(collector: &Arc<ErrorCollector>, f: F) {
    install_panic_reporter(Arc::clone(collector));
    let result = panic::catch_unwind(f);
    let _ = panic::take_hook();
    assert!(result.is_err(), "closure was expected to panic");
}

#[test]
#[serial]
fn test_panic_is_reported_with_location() {
    let collector = collector();
    with_reporter(&collector, || panic!("boom"));

    let aggregates = collector.store().snapshot_all();
    assert_eq!(aggregates.len(), 1);
    let aggregate = &aggregates[0];
    assert!(aggregate.aggregation_key.starts_with("panic@"));
    assert_eq!(aggregate.severity, Severity::Error);

    let error = &aggregate.latest_errors[0].error;
    assert_eq!(error.class, PANIC_CLASS);
    assert_eq!(error.message, "boom");
    assert!(error.stacktrace[0].contains("panic_tests.rs"));
}

#[test]
#[serial]
fn test_formatted_panic_message_is_captured() {
    let collector = collector();
    let id = 7;
    with_reporter(&collector, move || panic!("request {id} failed"));

    let error = &collector.store().snapshot_all()[0].latest_errors[0].error;
    assert_eq!(error.message, "request 7 failed");
}

#[test]
#[serial]
fn test_repeated_panics_at_same_site_are_grouped() {
    let collector = collector();
    install_panic_reporter(Arc::clone(&collector));
    for _ in 0..3 {
        let _ = panic::catch_unwind(|| panic!("same"));
    }
    let _ = panic::take_hook();

    let aggregates = collector.store().snapshot_all();
    assert_eq!(aggregates.len(), 1);
    assert_eq!(aggregates[0].total_count, 3);
}
