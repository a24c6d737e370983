mod common;

use colblk_column::constants::{BLOCK_SIZE, ROWS_PER_LOGICAL_BLOCK};
use colblk_column::{BoolOp, ColumnDescriptor, CompareOp, FilterPredicate, OutputType, ScanConfig};
use colblk_scan::{
    BlockRef, BlockSource, ColumnCommand, ColumnCommandConfig, MemBlockSource, StepInput,
    ZoneMapEntry,
};
use colblk_test_utils::init_tracing_for_tests;
use colblk_types::LogicalType;

use common::{column_source, command, logical_block};

#[test]
fn scan_decodes_rids_values_and_zone_map() {
    init_tracing_for_tests();
    let source = MemBlockSource::new();
    // Fourth logical block of a 4-byte column.
    source
        .insert_column(12, &logical_block(4, |row| row as i128))
        .unwrap();
    let desc = ColumnDescriptor::new(4, LogicalType::Int).with_output(OutputType::BOTH);
    let cmd = command(desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Gt, 8000, 4)]);
    let base = 3 * ROWS_PER_LOGICAL_BLOCK as u64;

    let out = cmd.execute(&source, BlockRef::new(12, base), None).unwrap();
    assert_eq!(out.len(), 191);
    assert_eq!(out.rel_rids, (8001..=8191).collect::<Vec<u16>>());
    assert_eq!(out.abs_rids.first(), Some(&(base + 8001)));
    assert_eq!(out.values.last(), Some(&8191));
    assert_eq!(out.rid_map, 0b1000_0000_0000_0000);
    assert_eq!((out.header.cache_io, out.header.physical_io), (0, 4));
    let zone = ZoneMapEntry::Narrow { min: 0, max: 8191 };
    assert_eq!(out.min_max, Some(zone));
    assert_eq!(cmd.zone_entry(12), Some(zone));

    let again = cmd.execute(&source, BlockRef::new(12, base), None).unwrap();
    assert_eq!((again.header.cache_io, again.header.physical_io), (4, 0));
    assert_eq!(again.rel_rids, out.rel_rids);
}

#[test]
fn step_loads_only_blocks_holding_input_rows() {
    // Only the first physical block of an 8-byte column exists; reading any
    // other one would fail.
    let source = MemBlockSource::new();
    let mut first = Vec::with_capacity(BLOCK_SIZE);
    for row in 0..BLOCK_SIZE / 8 {
        first.extend_from_slice(&(row as i64 * 10).to_le_bytes());
    }
    source.insert(0, first).unwrap();

    let desc = ColumnDescriptor::new(8, LogicalType::BigInt)
        .with_output(OutputType::BOTH)
        .as_step();
    let cmd = ColumnCommand::projection(desc, ColumnCommandConfig::default(), ScanConfig::default())
        .unwrap();
    let input = StepInput::from_rids(vec![5, 100, 1000]);
    assert_eq!(input.rid_map, 0b11);

    let out = cmd.execute(&source, BlockRef::new(0, 0), Some(&input)).unwrap();
    assert_eq!(out.rel_rids, vec![5, 100, 1000]);
    assert_eq!(out.values, vec![50, 1000, 10000]);
    assert_eq!(out.header.physical_io, 1);
    assert!(!out.header.valid_min_max);
    assert_eq!(out.min_max, None);
    assert!(cmd.zone_map().is_empty());
}

#[test]
fn step_without_input_rows_does_nothing() {
    let source = MemBlockSource::new();
    let desc = ColumnDescriptor::new(4, LogicalType::Int).as_step();
    let cmd = command(desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Eq, 1, 4)]);
    for input in [None, Some(StepInput::default())] {
        let out = cmd
            .execute(&source, BlockRef::new(40, 9), input.as_ref())
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.block, BlockRef::new(40, 9));
        assert_eq!(out.header.physical_io + out.header.cache_io, 0);
    }
}

#[test]
fn scan_past_last_block_sees_empty_rows() {
    let source = MemBlockSource::new();
    let mut first = Vec::with_capacity(BLOCK_SIZE);
    for row in 0..BLOCK_SIZE / 2 {
        first.extend_from_slice(&((row % 100) as i16).to_le_bytes());
    }
    source.insert(0, first).unwrap();
    assert_eq!(source.last_lbid(), Some(0));

    let desc = ColumnDescriptor::new(2, LogicalType::SmallInt);
    let cmd = command(desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Ge, 0, 2)]);
    let out = cmd.execute(&source, BlockRef::new(0, 0), None).unwrap();
    assert_eq!(out.len(), BLOCK_SIZE / 2);
    assert_eq!(out.header.physical_io, 1);
    assert_eq!(out.min_max, Some(ZoneMapEntry::Narrow { min: 0, max: 99 }));
}

#[test]
fn absolute_rids_are_optional() {
    let source = column_source(1, 1, |_, row| (row % 50) as i128);
    let desc = ColumnDescriptor::new(1, LogicalType::TinyInt).with_output(OutputType::RID);
    let config = ColumnCommandConfig {
        make_abs_rids: false,
        capture_min_max: false,
    };
    let cmd = ColumnCommand::with_predicates(
        desc,
        BoolOp::None,
        &[FilterPredicate::int(CompareOp::Eq, 49, 1)],
        config,
        ScanConfig::default(),
    )
    .unwrap();
    let out = cmd.execute(source.as_ref(), BlockRef::new(0, 1 << 20), None).unwrap();
    assert_eq!(out.len(), ROWS_PER_LOGICAL_BLOCK / 50);
    assert_eq!(out.rel_rids[0], 49);
    assert!(out.abs_rids.is_empty());
    assert!(out.values.is_empty());
    assert_eq!(out.min_max, None);
    assert!(cmd.zone_map().is_empty());
}

#[test]
fn wide_decimal_values_and_zone_map() {
    const E21: i128 = 1_000_000_000_000_000_000_000;
    let source = column_source(16, 1, |_, row| (row as i128 - 4096) * E21);
    let desc = ColumnDescriptor::new(16, LogicalType::Decimal).with_decimal(0, 38);
    let cmd = command(desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Lt, 0, 16)]);
    let out = cmd.execute(source.as_ref(), BlockRef::new(0, 0), None).unwrap();
    assert_eq!(out.len(), 4096);
    assert!(out.values.is_empty());
    assert_eq!(out.wide_values[0], -4096 * E21);
    assert_eq!(out.wide_values[4095], -E21);
    assert_eq!(out.header.physical_io, 16);
    assert_eq!(
        cmd.zone_entry(0),
        Some(ZoneMapEntry::Wide {
            min: -4096 * E21,
            max: 4095 * E21
        })
    );
}

#[test]
fn unsigned_values_are_zero_extended() {
    let source = column_source(4, 1, |_, row| if row == 0 { 0xFFFF_FFF0 } else { 1 });
    let desc = ColumnDescriptor::new(4, LogicalType::UInt).with_output(OutputType::BOTH);
    let cmd = command(desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Gt, 1, 4)]);
    let out = cmd.execute(source.as_ref(), BlockRef::new(0, 0), None).unwrap();
    assert_eq!(out.rel_rids, vec![0]);
    assert_eq!(out.values, vec![0xFFFF_FFF0]);
    assert_eq!(
        out.min_max,
        Some(ZoneMapEntry::Narrow {
            min: 1,
            max: 0xFFFF_FFF0
        })
    );
}

#[test]
fn scan_feeds_a_step_on_another_column() {
    let source = MemBlockSource::new();
    source
        .insert_column(0, &logical_block(4, |row| row as i128))
        .unwrap();
    source
        .insert_column(100, &logical_block(1, |row| (row % 50) as i128))
        .unwrap();

    let a_desc = ColumnDescriptor::new(4, LogicalType::Int).with_output(OutputType::RID);
    let a = command(a_desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Lt, 100, 4)]);
    let a_out = a.execute(&source, BlockRef::new(0, 0), None).unwrap();
    assert_eq!(a_out.len(), 100);

    let b_desc = ColumnDescriptor::new(1, LogicalType::TinyInt)
        .with_output(OutputType::BOTH)
        .as_step();
    let b = command(b_desc, BoolOp::None, &[FilterPredicate::int(CompareOp::Eq, 7, 1)]);
    let b_out = b
        .execute(&source, BlockRef::new(100, 0), Some(&a_out.as_input()))
        .unwrap();
    assert_eq!(b_out.rel_rids, vec![7, 57]);
    assert_eq!(b_out.values, vec![7, 7]);
    assert_eq!(b_out.header.physical_io, 1);
}
