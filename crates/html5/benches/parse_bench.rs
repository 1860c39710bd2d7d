use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use html5::{Parser, ParserOptions};
use html5_test_support::ArenaSink;

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 4_000;

fn make_blocks(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 48);
    out.push_str("<!DOCTYPE html><html><body>");
    for i in 0..blocks {
        out.push_str("<div class=box><span>item ");
        out.push_str(&i.to_string());
        out.push_str("</span><img src=x></div>");
    }
    out.push_str("</body></html>");
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn parse_document(input: &[u8]) -> ArenaSink {
    let sink = ArenaSink::new();
    let document = sink.document();
    let mut parser = Parser::new(
        sink,
        document,
        ParserOptions {
            charset: Some("utf-8".to_string()),
            ..ParserOptions::default()
        },
    )
    .expect("parser");
    parser.parse_chunk(input).expect("parse");
    parser.finish().expect("finish");
    parser.into_sink()
}

fn bench_parse_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("parse_small", |b| {
        b.iter(|| {
            let sink = parse_document(black_box(input.as_bytes()));
            black_box(sink.nodes.len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("parse_large", |b| {
        b.iter_batched(
            || input.clone(),
            |input| {
                let sink = parse_document(black_box(input.as_bytes()));
                black_box(sink.nodes.len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_parse_chunked(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("parse_chunked_64b", |b| {
        b.iter(|| {
            let sink = ArenaSink::new();
            let document = sink.document();
            let mut parser = Parser::new(
                sink,
                document,
                ParserOptions {
                    charset: Some("utf-8".to_string()),
                    ..ParserOptions::default()
                },
            )
            .expect("parser");
            for chunk in input.as_bytes().chunks(64) {
                parser.parse_chunk(black_box(chunk)).expect("parse");
            }
            parser.finish().expect("finish");
            black_box(parser.into_sink().nodes.len());
        });
    });
}

fn bench_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(64 * 1024);
    c.bench_function("rawtext_adversarial_64k", |b| {
        b.iter(|| {
            let sink = parse_document(black_box(input.as_bytes()));
            black_box(sink.nodes.len());
        });
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_large,
    bench_parse_chunked,
    bench_rawtext_adversarial
);
criterion_main!(benches);
