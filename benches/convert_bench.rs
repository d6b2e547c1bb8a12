use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use szamla::core::*;
use szamla::nav::{self, Document};

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn build_invoice(code: &str, lines: u32) -> Invoice {
    let mut builder = InvoiceBuilder::new(code, test_date())
        .currency("EUR")
        .exchange_rate("EUR", "HUF", dec!(390.25))
        .payment_key("credit-transfer")
        .supplier(
            PartyBuilder::new("Benchmark Kft.")
                .tax_id("HU", "12345678202")
                .address(
                    AddressBuilder::new("Budapest", "1051", "HU")
                        .street("Fő")
                        .number("1")
                        .build(),
                )
                .build(),
        )
        .customer(
            PartyBuilder::new("Kunde GmbH")
                .tax_id("DE", "123456789")
                .address(
                    AddressBuilder::new("München", "80331", "DE")
                        .street("Leopoldstr.")
                        .number("42")
                        .build(),
                )
                .build(),
        );

    for i in 1..=lines {
        let line = LineBuilder::new(format!("Service item {i}"), dec!(5), dec!(120)).unit("h");
        let line = if i % 3 == 0 {
            line.vat_ext(nav::EXT_EXEMPTION_CODE, "AAM").build()
        } else {
            line.vat(dec!(27)).build()
        };
        builder = builder.add_line(line);
    }

    builder.build().unwrap()
}

fn bench_build_invoice(c: &mut Criterion) {
    c.bench_function("build_invoice_10_lines", |b| {
        b.iter(|| black_box(build_invoice("BENCH-001", 10)));
    });
}

fn bench_convert_10(c: &mut Criterion) {
    let invoice = build_invoice("BENCH-001", 10);
    c.bench_function("nav_convert_10_lines", |b| {
        b.iter(|| black_box(nav::to_nav_xml(black_box(&invoice))));
    });
}

fn bench_convert_100(c: &mut Criterion) {
    let invoice = build_invoice("BENCH-BIG", 100);
    c.bench_function("nav_convert_100_lines", |b| {
        b.iter(|| black_box(nav::to_nav_xml(black_box(&invoice))));
    });
}

fn bench_render_only(c: &mut Criterion) {
    let doc = Document::from_invoice(&build_invoice("BENCH-BIG", 100)).unwrap();
    c.bench_function("nav_render_100_lines", |b| {
        b.iter(|| black_box(black_box(&doc).to_xml()));
    });
}

fn bench_parse_json(c: &mut Criterion) {
    let json = serde_json::to_string(&build_invoice("BENCH-BIG", 100)).unwrap();
    c.bench_function("gobl_parse_100_lines", |b| {
        b.iter(|| black_box(Invoice::from_json(black_box(&json))));
    });
}

criterion_group!(
    benches,
    bench_build_invoice,
    bench_convert_10,
    bench_convert_100,
    bench_render_only,
    bench_parse_json,
);
criterion_main!(benches);
