#![no_main]

use libfuzzer_sys::fuzz_target;
use routine_load_admin::monitor::RecordingReporter;
use routine_load_admin::rewrite::{patch_group_id, recreate_definition};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // First line is the progress descriptor, the rest the definition.
    let (progress, definition) = text.split_once('\n').unwrap_or((text, ""));

    let reporter = RecordingReporter::new();
    let out = recreate_definition(definition, "db1", "job1", progress, &reporter);

    let again = patch_group_id(&out);
    assert_eq!(again, out, "group id rewrite is not idempotent");
});
