use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use english_chat_relay::relay::splitter::split_response;
use english_chat_relay::relay::upstream::parse_completion;
use english_chat_relay::types::{ErrorResponse, RelayResult};
use serde_json::json;

fn tutor_answer(paragraphs: usize) -> String {
    let english = (0..paragraphs)
        .map(|i| {
            format!(
                "{}. \"Ubiquitous\" means present everywhere. Example: Smartphones are ubiquitous today.",
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let chinese = (0..paragraphs)
        .map(|i| format!("{}. “Ubiquitous” 的意思是无处不在。例句：如今智能手机无处不在。", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n<div class=\"translation\">{}</div>", english, chinese)
}

fn bench_split_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_response");

    for paragraphs in [1, 10, 50].iter() {
        let with_marker = tutor_answer(*paragraphs);
        let without_marker = with_marker.replace("<div class=\"translation\">", "\n");

        group.bench_with_input(
            BenchmarkId::new("marker", paragraphs),
            &with_marker,
            |b, content| b.iter(|| black_box(split_response(black_box(content)))),
        );

        group.bench_with_input(
            BenchmarkId::new("last_line_fallback", paragraphs),
            &without_marker,
            |b, content| b.iter(|| black_box(split_response(black_box(content)))),
        );
    }

    group.finish();
}

fn bench_json_handling(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_handling");

    let completion = json!({
        "id": "chatcmpl-bench",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": tutor_answer(10)},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 250, "completion_tokens": 600, "total_tokens": 850}
    })
    .to_string();

    group.bench_function("parse_completion", |b| {
        b.iter(|| black_box(parse_completion(black_box(completion.as_bytes())).unwrap()))
    });

    let result = RelayResult::new("Hello world", "你好世界");
    group.bench_function("serialize_result", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&result)).unwrap()))
    });

    let error = ErrorResponse::new("Internal server error").with_details("Request timeout");
    group.bench_function("serialize_error", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&error)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_split_response, bench_json_handling);
criterion_main!(benches);
