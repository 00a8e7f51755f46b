#![no_main]

use gstlink::classify::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary gateway bodies must classify and decode without panicking.
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let resp = GatewayResponse::from_value(&value);
    for endpoint in [Endpoint::GenerateIrn, Endpoint::CancelIrn, Endpoint::GenerateEwayBill] {
        match classify(&resp, endpoint) {
            ClassifiedOutcome::Success(result) => {
                let _ = decode_result::<IrnDetails>(result.as_ref(), endpoint);
                let _ = decode_result::<EwayBill>(result.as_ref(), endpoint);
            }
            ClassifiedOutcome::AlreadyExists(result) => {
                let _ = duplicate_irn(result.as_ref());
            }
            ClassifiedOutcome::ValidationError(_) => {}
        }
    }
});
