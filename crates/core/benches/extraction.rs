use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nuntius_core::{DEFAULT_MAX_LENGTH, Document, extract_main_content};

/// Builds a news-like page: nav/header/footer noise around an `article`
/// holding the given number of paragraphs.
fn article_page(paragraphs: usize) -> String {
    let mut page = String::from(
        "<!DOCTYPE html><html><head><title>Benchmark</title>\
         <script>var tracker = 1;</script><style>p { margin: 0; }</style></head><body>\
         <nav><a href=\"/\">Home</a><a href=\"/world\">World</a></nav>\
         <header><h1>The Daily Benchmark</h1></header>\
         <article>",
    );
    for i in 0..paragraphs {
        page.push_str(&format!(
            "<p>Paragraph {i}: wire reports continue to arrive from correspondents \
             in the region, and editors expect further updates within the hour.</p>"
        ));
    }
    page.push_str(
        "</article><aside>Related articles</aside>\
         <footer>Subscribe to our newsletter</footer></body></html>",
    );
    page
}

/// Builds a page with no recognized content container, forcing the
/// paragraph-fallback scan over every `p` in the document.
fn selectorless_page(paragraphs: usize) -> String {
    let mut page = String::from("<!DOCTYPE html><html><body><div class=\"page\">");
    for i in 0..paragraphs {
        page.push_str(&format!(
            "<p>Block {i}: the committee heard testimony for several hours before \
             adjourning without a vote on the amended proposal.</p>"
        ));
    }
    page.push_str("</div></body></html>");
    page
}

fn bench_parse(c: &mut Criterion) {
    let small = article_page(10);
    let medium = article_page(100);
    let large = article_page(1000);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "2KB"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "15KB"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "150KB"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let small = article_page(10);
    let medium = article_page(100);
    let large = article_page(1000);

    let mut group = c.benchmark_group("extract");

    // Extraction detaches noise nodes, so every iteration parses a fresh
    // document. Subtract the parse group to isolate the extraction cost.
    for (name, size, html) in [("small", "2KB", &small), ("medium", "15KB", &medium), ("large", "150KB", &large)] {
        group.bench_with_input(BenchmarkId::new(name, size), html, |b, html| {
            b.iter(|| {
                let mut doc = Document::parse(black_box(html)).unwrap();
                extract_main_content(&mut doc, DEFAULT_MAX_LENGTH)
            })
        });
    }

    group.finish();
}

fn bench_paragraph_fallback(c: &mut Criterion) {
    let html = selectorless_page(100);

    c.bench_function("paragraph_fallback", |b| {
        b.iter(|| {
            let mut doc = Document::parse(black_box(&html)).unwrap();
            extract_main_content(&mut doc, DEFAULT_MAX_LENGTH)
        })
    });
}

criterion_group!(benches, bench_parse, bench_extraction, bench_paragraph_fallback);
criterion_main!(benches);
