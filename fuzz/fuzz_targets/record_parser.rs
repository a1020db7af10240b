#![no_main]

use libfuzzer_sys::fuzz_target;
use ssp::record::parse_depth;
use ssp::{CallStats, TimeVal};

fuzz_target!(|data: &[u8]| {
    // Records are read lossily, so arbitrary bytes must never panic a parser
    let input = String::from_utf8_lossy(data);
    let _ = parse_depth(&input);
    if let Some(tv) = TimeVal::parse(&input) {
        assert_eq!(TimeVal::parse(&tv.to_string()), Some(tv));
    }
    if let Some(stats) = CallStats::parse(&input) {
        let _ = stats.to_string();
    }
});
