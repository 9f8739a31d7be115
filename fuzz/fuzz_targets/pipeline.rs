#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Avoid pathological allocations in the harness itself; libFuzzer will still mutate below this.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let first = bareword::analyze_source("fuzz.pl", &src, bareword::Mode::Strict);
    let second = bareword::analyze_source("fuzz.pl", &src, bareword::Mode::Strict);
    assert_eq!(first, second);
});
