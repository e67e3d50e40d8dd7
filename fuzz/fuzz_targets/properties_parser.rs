#![no_main]

use libfuzzer_sys::fuzz_target;
use stepwise_core::properties::parse_properties;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(store) = parse_properties(content, "fuzz/toolium.conf") {
            // 섹션 목록과 섹션 순회가 같은 키 집합을 가리켜야 함
            for name in store.section_names() {
                assert!(store.section(name).next().is_some());
            }
            let _ = store.get_bool("Driver.enabled");
            let _ = store.get_f64("VisualTests.threshold");
        }
    }
});
