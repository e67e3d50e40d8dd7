#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use stepwise_core::steps::StepRegistry;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 스텝 패턴 (최대 4개 사용)
    patterns: Vec<String>,
    /// 디스패치 대상 스텝 문장
    text: String,
}

fuzz_target!(|input: FuzzInput| {
    let mut registry = StepRegistry::new();
    for pattern in input.patterns.iter().take(4) {
        let _ = registry.register(pattern, |_, _| Ok(()));
    }

    if let Ok((pattern, args)) = registry.resolve(&input.text) {
        assert!(registry.patterns().any(|p| p == pattern));
        // 캡처된 인자는 항상 비어 있지 않음 (`.+?`)
        for name in ["element", "baseline", "page"] {
            if let Some(value) = args.get(name) {
                assert!(!value.is_empty());
            }
        }
    }
});
