#![no_main]

use libfuzzer_sys::fuzz_target;
use stepwise_core::PropertyStore;
use stepwise_core::properties::parse_json_properties;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(overlay) = parse_json_properties(content, "fuzz/qa-properties.json") {
            let mut base = PropertyStore::new();
            let overridden = base.merge(&overlay);
            assert_eq!(overridden, 0);
            assert_eq!(base.len(), overlay.len());
        }
    }
});
