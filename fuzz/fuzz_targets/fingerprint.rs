#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use faultline_aggregator::fingerprint::{KeyDeriver, fnv1a_32};
use faultline_core::types::ErrorInstance;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    class: String,
    message: String,
    frames: Vec<String>,
    /// 선두 프레임 수 (1..=64로 보정)
    max_traces: u8,
    /// 잘린 뒤쪽 프레임 대체값
    tail: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let max_traces = usize::from(input.max_traces % 64) + 1;
    let deriver = KeyDeriver::with_max_traces(max_traces);
    let instance = ErrorInstance::new(input.class.clone(), input.message.clone(), input.frames);

    let key = deriver.derive(&instance);
    assert_eq!(key, deriver.derive(&instance));

    let (prefix, hex) = key.rsplit_once('@').unwrap();
    assert_eq!(prefix, input.class);
    assert!(!hex.is_empty() && hex.len() <= 8);
    assert_eq!(u32::from_str_radix(hex, 16).unwrap(), deriver.hash(&instance));

    // 해시 입력은 메시지 + 선두 프레임의 단순 연결
    let joined: String = std::iter::once(instance.message.as_str())
        .chain(instance.stacktrace.iter().take(max_traces).map(String::as_str))
        .collect();
    assert_eq!(deriver.hash(&instance), fnv1a_32(joined.as_bytes()));

    // 선두 프레임 이후를 바꿔도 키는 같음
    if instance.stacktrace.len() >= max_traces {
        let mut frames: Vec<String> = instance.stacktrace[..max_traces].to_vec();
        frames.extend(input.tail);
        let other = ErrorInstance::new(input.class, input.message, frames);
        assert_eq!(deriver.derive(&other), key);
    }
});
