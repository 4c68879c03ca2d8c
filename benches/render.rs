use criterion::{black_box, criterion_group, criterion_main, Criterion};
use markweave_core::Extensions;
use markweave_html::HtmlRenderer;
use markweave_parser::Document;

fn generate_markdown(sections: usize) -> String {
    let mut md = String::new();
    for i in 0..sections {
        md.push_str(&format!("## Section {}\n\n", i));
        md.push_str("Some *emphasis*, **strong** text and `code` with a [link](https://example.com).\n");
        md.push_str("A footnote reference[^n] and a bare link www.example.com here.\n\n");
        md.push_str("- first item\n- second item\n  - nested item\n\n");
        md.push_str("> quoted *text*\n> continues\n\n");
        md.push_str("| a | b |\n|:--|--:|\n| 1 | 2 |\n\n");
        md.push_str("```rust\nfn main() {}\n```\n\n");
    }
    md.push_str("[^n]: The note.\n");
    md
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(20);

    let content = generate_markdown(100);
    let renderer = HtmlRenderer::default();
    let ext = Extensions::BLOCK | Extensions::SPAN;

    group.bench_function("html_all_extensions", |b| {
        let doc = Document::with_defaults(&renderer, ext);
        b.iter(|| {
            let mut out = Vec::new();
            doc.render(&mut out, black_box(content.as_bytes()));
            black_box(out);
        });
    });

    group.bench_function("html_no_extensions", |b| {
        let doc = Document::with_defaults(&renderer, Extensions::empty());
        b.iter(|| {
            let mut out = Vec::new();
            doc.render(&mut out, black_box(content.as_bytes()));
            black_box(out);
        });
    });

    group.finish();
}

fn bench_deep_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_nesting");
    group.sample_size(20);

    let quotes = format!("{}text\n", "> ".repeat(5_000));
    let renderer = HtmlRenderer::default();
    let doc = Document::with_defaults(&renderer, Extensions::empty());

    group.bench_function("quotes", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            doc.render(&mut out, black_box(quotes.as_bytes()));
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_deep_nesting);
criterion_main!(benches);
