#![no_main]

use libfuzzer_sys::fuzz_target;

use faultline_aggregator::ExportPayload;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = serde_json::from_slice::<ExportPayload>(data) {
        let encoded = serde_json::to_vec(&payload).unwrap();
        let decoded: ExportPayload = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }
});
