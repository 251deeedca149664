#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use faultline_aggregator::{AggregatorConfigBuilder, ErrorCollector, ErrorExporter, ExportPayload};
use faultline_core::types::{ErrorInstance, HttpContext, Severity};

/// 퍼저용 리포트 한 건
#[derive(Arbitrary, Debug)]
struct FuzzReport {
    /// 작은 클래스/메시지 공간에서 골라 같은 키가 자주 반복되도록 함
    class: u8,
    message: u8,
    frames: Vec<String>,
    severity: u8,
    http: Option<(String, String, Vec<(String, String)>, Option<String>)>,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    max_errors: u8,
    reports: Vec<FuzzReport>,
}

fuzz_target!(|input: FuzzInput| {
    let max_errors = usize::from(input.max_errors % 16) + 1;
    let config = AggregatorConfigBuilder::new()
        .max_errors(max_errors)
        .build()
        .unwrap();
    let collector = Arc::new(
        ErrorCollector::builder()
            .config(config)
            .stack_trace_provider(Vec::new)
            .build()
            .unwrap(),
    );

    // 리포트 수 제한 (성능)
    let reports: Vec<FuzzReport> = input.reports.into_iter().take(256).collect();
    let total = reports.len() as u64;

    for report in reports {
        let severity = match report.severity % 3 {
            0 => Severity::Info,
            1 => Severity::Warning,
            _ => Severity::Error,
        };
        let http_context = report.http.map(|(method, url, headers, body)| {
            let mut ctx = HttpContext::new(method, url);
            for (name, value) in headers.into_iter().take(16) {
                ctx = ctx.with_header(name, value);
            }
            if let Some(body) = body {
                ctx = ctx.with_body(body);
            }
            ctx
        });
        let instance = ErrorInstance::new(
            format!("class{}", report.class % 4),
            format!("message{}", report.message % 4),
            report.frames.into_iter().take(8).collect(),
        );
        collector.report_instance(instance, http_context, severity);
    }

    let exporter = ErrorExporter::new(Arc::clone(&collector));
    let bytes = exporter.export().unwrap();
    assert_eq!(bytes, exporter.export().unwrap());

    let payload: ExportPayload = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload.target_uuid, collector.target_uuid());
    assert_eq!(payload.aggregated_errors.len(), collector.store().len());

    let mut sum = 0;
    for aggregate in &payload.aggregated_errors {
        assert!(aggregate.latest_errors.len() <= max_errors);
        assert!(aggregate.total_count >= aggregate.latest_errors.len() as u64);
        sum += aggregate.total_count;
    }
    assert_eq!(sum, total);
});
