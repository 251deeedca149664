//! 집계 키 계산 -- 에러 클래스, 메시지, 선두 스택 프레임으로 핑거프린트 생성
//!
//! 키 형식은 `<class>@<hash>`입니다. `hash`는 메시지와 선두 `max_traces`개
//! 프레임을 구분자 없이 이어 붙인 바이트열의 32비트 FNV-1a 값이며,
//! 0 패딩 없는 소문자 16진수로 표기합니다. 클래스는 해시 입력에 포함되지 않고
//! 접두어로만 붙습니다.
//!
//! 깊은 프레임만 다른 에러(재귀, 호출 지점 차이)는 같은 키로 묶입니다.
//! 해시 함수와 입력 구성을 바꾸면 기존 수집 백엔드의 키와 호환되지 않습니다.

use std::fmt::Write as _;
use std::hash::Hasher;

use faultline_core::config::DEFAULT_MAX_TRACES;
use faultline_core::types::ErrorInstance;

/// FNV-1a 32비트 오프셋 기저값
pub const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32비트 소수
pub const FNV32_PRIME: u32 = 0x0100_0193;

/// 키 포맷팅이 실패했을 때 사용하는 해시 자리 표시자
pub const SENTINEL_HASH: &str = "0";

/// 32비트 FNV-1a 해셔
///
/// 바이트 단위로 XOR 후 곱하는 누산기입니다. `write`를 여러 번 호출한 결과는
/// 입력을 이어 붙여 한 번에 호출한 결과와 같습니다.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32 {
    state: u32,
}

impl Fnv1a32 {
    /// 오프셋 기저값으로 초기화된 해셔를 생성합니다.
    pub const fn new() -> Self {
        Self {
            state: FNV32_OFFSET_BASIS,
        }
    }

    /// 현재 32비트 해시 값을 반환합니다.
    pub const fn finish32(&self) -> u32 {
        self.state
    }
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1a32 {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u32::from(*byte);
            self.state = self.state.wrapping_mul(FNV32_PRIME);
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.state)
    }
}

/// 바이트열의 32비트 FNV-1a 해시를 계산합니다.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1a32::new();
    hasher.write(bytes);
    hasher.finish32()
}

/// 집계 키 계산기
///
/// 상태가 없는 순수 함수이며, 같은 입력에 대해 항상 같은 키를 반환합니다.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    max_traces: usize,
}

impl KeyDeriver {
    /// 기본 선두 프레임 수(4)로 계산기를 생성합니다.
    pub const fn new() -> Self {
        Self {
            max_traces: DEFAULT_MAX_TRACES,
        }
    }

    /// 해시에 포함할 선두 프레임 수를 지정하여 계산기를 생성합니다.
    pub const fn with_max_traces(max_traces: usize) -> Self {
        Self { max_traces }
    }

    /// 해시에 포함하는 선두 프레임 수를 반환합니다.
    pub const fn max_traces(&self) -> usize {
        self.max_traces
    }

    /// 메시지와 선두 프레임의 해시 값을 계산합니다.
    ///
    /// 프레임이 `max_traces`보다 적으면 있는 프레임을 모두 사용합니다.
    pub fn hash(&self, instance: &ErrorInstance) -> u32 {
        let mut hasher = Fnv1a32::new();
        hasher.write(instance.message.as_bytes());
        for frame in instance.stacktrace.iter().take(self.max_traces) {
            hasher.write(frame.as_bytes());
        }
        hasher.finish32()
    }

    /// 에러 인스턴스의 집계 키(`<class>@<hex>`)를 계산합니다.
    pub fn derive(&self, instance: &ErrorInstance) -> String {
        let hash = self.hash(instance);
        let prefix_len = instance.class.len() + 1;

        let mut key = String::with_capacity(prefix_len + 8);
        key.push_str(&instance.class);
        key.push('@');
        if let Err(e) = write!(key, "{hash:x}") {
            tracing::error!(
                class = %instance.class,
                error = %e,
                "failed to format aggregation key hash, using sentinel"
            );
            key.truncate(prefix_len);
            key.push_str(SENTINEL_HASH);
        }
        key
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new()
    }
}

/// 기본 설정으로 집계 키를 계산합니다.
pub fn derive_key(instance: &ErrorInstance) -> String {
    KeyDeriver::new().derive(instance)
}
