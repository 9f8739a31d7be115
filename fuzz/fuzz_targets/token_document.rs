#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let text = String::from_utf8_lossy(data);
    if let Ok(unit) = bareword::unit_from_document("fuzz.json", &text) {
        let _ = bareword::analyze(unit, bareword::Mode::Permissive);
    }
});
