//! Block scan throughput: row-at-a-time vs batch strategy across filter shapes.
//!
//! Run:
//!   cargo bench --bench block_scan_bench

#![forbid(unsafe_code)]

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use colblk_column::constants::BLOCK_SIZE;
use colblk_column::wire::encode_predicates;
use colblk_column::{
    BoolOp, ColumnDescriptor, CompareOp, FilterPredicate, OutputType, ParsedColumnFilter,
    ScanConfig, compile, scan_block, worst_case_output_size,
};
use colblk_types::LogicalType;
use colblk_types::codecs::narrow_le;

const SEED: u64 = 0xB10C_5CA4_0000_0001;

fn seed_block(width: usize, rows: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut out = Vec::with_capacity(rows * width);
    for _ in 0..rows {
        narrow_le(rng.random_range(0..10_000i128), width, &mut out);
    }
    out
}

fn filter_for(desc: &ColumnDescriptor, bop: BoolOp, preds: &[FilterPredicate]) -> ParsedColumnFilter {
    compile(
        &encode_predicates(preds),
        desc.width,
        desc.logical_type,
        preds.len() as u16,
        bop,
    )
    .unwrap()
}

fn bench_block_scan(c: &mut Criterion) {
    let rows = BLOCK_SIZE;
    let desc = ColumnDescriptor::new(8, LogicalType::BigInt).with_output(OutputType::BOTH);
    let block = seed_block(8, rows);
    let capacity = worst_case_output_size(rows, desc.output, desc.width);

    let range = filter_for(
        &desc,
        BoolOp::And,
        &[
            FilterPredicate::int(CompareOp::Ge, 2_500, 8),
            FilterPredicate::int(CompareOp::Lt, 7_500, 8),
        ],
    );
    let in_list: Vec<_> = (0..32)
        .map(|i| FilterPredicate::int(CompareOp::Eq, i * 311, 8))
        .collect();
    let in_set = filter_for(&desc, BoolOp::Or, &in_list);

    let mut g = c.benchmark_group("block_scan_8k_i64");
    g.throughput(Throughput::Elements(rows as u64));
    for (name, config) in [
        ("vertical", ScanConfig::default()),
        ("row", ScanConfig::row_at_a_time()),
    ] {
        g.bench_function(format!("range_{name}"), |b| {
            b.iter(|| {
                let r = scan_block(&desc, &range, black_box(&block), &[], capacity, &config)
                    .unwrap();
                black_box(r.header.values_written)
            })
        });
        g.bench_function(format!("in_set_{name}"), |b| {
            b.iter(|| {
                let r = scan_block(&desc, &in_set, black_box(&block), &[], capacity, &config)
                    .unwrap();
                black_box(r.header.values_written)
            })
        });
    }
    g.finish();
}

fn bench_compile(c: &mut Criterion) {
    let desc = ColumnDescriptor::new(4, LogicalType::Int);
    let preds: Vec<_> = (0..64)
        .map(|i| FilterPredicate::int(CompareOp::Eq, i, 4))
        .collect();
    let blob = encode_predicates(&preds);
    c.bench_function("compile_64_eq_set", |b| {
        b.iter(|| {
            compile(black_box(&blob), desc.width, desc.logical_type, 64, BoolOp::Or).unwrap()
        })
    });
}

criterion_group!(benches, bench_block_scan, bench_compile);
criterion_main!(benches);
