#![no_main]
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use soil_core::Calibration;

#[derive(Debug, Arbitrary)]
struct Input {
    wet: i32,
    dry: i32,
    raw: i32,
}

fuzz_target!(|input: Input| {
    let Ok(cal) = Calibration::new(input.wet, input.dry) else {
        return;
    };
    let v = cal.normalize(input.raw).value();
    assert!((0.0..=1.0).contains(&v), "{input:?} -> {v}");
});
