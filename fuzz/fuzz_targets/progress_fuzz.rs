#![no_main]

use libfuzzer_sys::fuzz_target;
use routine_load_admin::progress::PartitionOffsets;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(offsets) = PartitionOffsets::parse(text) {
        // overflow-checks are on: advancing must never overflow.
        let advanced = offsets.advanced();
        assert_eq!(advanced.len(), offsets.len());
        let _ = offsets.render_advanced();
    }
});
