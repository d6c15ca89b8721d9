//! Content stream and writer benchmarks
//!
//! Run with: `cargo bench content_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdfgraph::parser::{extract_text, ContentParser};
use pdfgraph::{EncryptOptions, EncryptionAlgorithm, Page, PdfWriter};
use std::io::Cursor;

fn text_content(lines: usize) -> Vec<u8> {
    let mut content = b"BT /F1 12 Tf 72 712 Td\n".to_vec();
    for i in 0..lines {
        content.extend_from_slice(
            format!("[(Line) -250 ({i}) 120 (of the document)] TJ 0 -14 Td\n").as_bytes(),
        );
    }
    content.extend_from_slice(b"ET\n");
    content
}

fn inline_image_content(size: usize) -> Vec<u8> {
    let mut content = format!("q {size} 0 0 1 0 0 cm BI /W {size} /H 1 /CS /G /BPC 8 ID ")
        .into_bytes();
    // no white-space, so the scanner never sees a terminator candidate
    content.extend((0..size).map(|i| b'a' + (i % 26) as u8));
    content.extend_from_slice(b" EI Q\n");
    content
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse");
    for lines in [10, 100, 1000] {
        let content = text_content(lines);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &content, |b, content| {
            b.iter(|| ContentParser::parse(black_box(content)).unwrap())
        });
    }
    group.finish();
}

fn benchmark_extract_text(c: &mut Criterion) {
    let content = text_content(500);
    c.bench_function("extract_text_500_lines", |b| {
        b.iter(|| extract_text(black_box(&content)).unwrap())
    });
}

fn benchmark_inline_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline_image");
    for size in [1024, 64 * 1024] {
        let content = inline_image_content(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| ContentParser::parse(black_box(content)).unwrap())
        });
    }
    group.finish();
}

fn build_writer(pages: usize, algorithm: Option<EncryptionAlgorithm>) -> PdfWriter {
    let mut writer = PdfWriter::new();
    let content = text_content(20);
    for _ in 0..pages {
        let mut page = Page::letter();
        page.set_contents(content.clone());
        writer.add_page(&page).unwrap();
    }
    if let Some(algorithm) = algorithm {
        let options = EncryptOptions {
            algorithm,
            ..EncryptOptions::default()
        };
        writer.encrypt("user", "owner", Some(options)).unwrap();
    }
    writer
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_document");
    for (label, algorithm) in [
        ("plain", None),
        ("rc4_128", Some(EncryptionAlgorithm::Rc4_128)),
        ("aes_128", Some(EncryptionAlgorithm::Aes128)),
    ] {
        let mut writer = build_writer(50, algorithm);
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut out = Cursor::new(Vec::new());
                writer.write(&mut out).unwrap();
                black_box(out.into_inner())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_extract_text,
    benchmark_inline_image,
    benchmark_write
);
criterion_main!(benches);
