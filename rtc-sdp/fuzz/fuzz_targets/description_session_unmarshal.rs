#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(description) = rtc_sdp::SessionDescription::unmarshal(text) {
            let _ = rtc_sdp::SessionDescription::unmarshal(&description.marshal());
        }
    }
});
