mod common;

use std::sync::Arc;
use std::thread;

use colblk_column::{
    BoolOp, ColumnDescriptor, CompareOp, FilterPredicate, OutputType, ParsedColumnFilter,
    ScanConfig,
};
use colblk_types::LogicalType;

use common::*;

/// Compile-time proof that the step-level shared state can cross threads.
#[test]
fn shared_step_state_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ParsedColumnFilter>();
    assert_send_sync::<ColumnDescriptor>();
    assert_send_sync::<ScanConfig>();
}

/// One compiled filter shared by many threads, each scanning its own block.
#[test]
fn concurrent_block_scans_share_one_filter() {
    const THREADS: usize = 8;
    const ROWS: usize = 4096;

    let desc = Arc::new(ColumnDescriptor::new(4, LogicalType::Int).with_output(OutputType::RID));
    let filter = Arc::new(compile_preds(
        &desc,
        BoolOp::And,
        &[
            FilterPredicate::int(CompareOp::Ge, 100, 4),
            FilterPredicate::int(CompareOp::Lt, 200, 4),
        ],
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let desc = Arc::clone(&desc);
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                let values: Vec<i128> = (0..ROWS as i128).map(|i| i + t as i128 * 10).collect();
                let block = int_block(&values, 4);
                let r = scan_with(&desc, &filter, &block, &[], &ScanConfig::default());
                (t, rids_of(&r, &desc))
            })
        })
        .collect();

    for h in handles {
        let (t, rids) = h.join().unwrap();
        let first = 100 - t * 10;
        let expected: Vec<u16> = (first..200 - t * 10).map(|r| r as u16).collect();
        assert_eq!(rids, expected, "thread {t}");
    }
}
