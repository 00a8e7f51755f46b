use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use gstlink::classify::*;

const TWO_ERRORS: &str = "2174 : For inter-state transaction, CGST and SGST amounts are not applicable; only IGST amount is applicable, 3095 : Supplier GSTIN is inactive";

fn many_errors(n: usize) -> String {
    (0..n)
        .map(|i| format!("{} : Item {i} has an invalid HSN code", 2000 + i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn duplicate_response() -> Value {
    json!({
        "success": false,
        "message": "2150 : Duplicate IRN",
        "result": [{
            "ErrorCode": "2150",
            "ErrorMessage": "Duplicate IRN",
            "Desc": {"AckNo": 112010000000123u64, "AckDt": "2024-01-01 10:00:00", "Irn": "a5c12dca80e743321740b001fd70953e8738d109865d28ba4013750f2046f229"}
        }]
    })
}

fn bench_sanitize(c: &mut Criterion) {
    c.bench_function("sanitize_two_errors", |b| {
        b.iter(|| sanitize_error_message(black_box(TWO_ERRORS)))
    });
}

fn bench_sanitize_50(c: &mut Criterion) {
    let message = many_errors(50);
    c.bench_function("sanitize_50_errors", |b| {
        b.iter(|| sanitize_error_message(black_box(&message)))
    });
}

fn bench_classify_rejection(c: &mut Criterion) {
    let raw = json!({"success": false, "message": TWO_ERRORS});
    c.bench_function("classify_validation_error", |b| {
        b.iter(|| {
            let resp = GatewayResponse::from_value(black_box(&raw));
            classify(&resp, Endpoint::GenerateIrn)
        })
    });
}

fn bench_duplicate_irn(c: &mut Criterion) {
    let raw = duplicate_response();
    c.bench_function("classify_and_extract_duplicate_irn", |b| {
        b.iter(|| {
            let resp = GatewayResponse::from_value(black_box(&raw));
            match classify(&resp, Endpoint::GenerateIrn) {
                ClassifiedOutcome::AlreadyExists(result) => duplicate_irn(result.as_ref()).ok(),
                _ => None,
            }
        })
    });
}

criterion_group!(
    benches,
    bench_sanitize,
    bench_sanitize_50,
    bench_classify_rejection,
    bench_duplicate_irn,
);
criterion_main!(benches);
