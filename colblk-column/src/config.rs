/// Run-time configuration for block scans (no hidden constants).
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Allow the batch strategy when no predicate needs per-value flag handling.
    pub vertical_filtering: bool,
    /// Widest column, in bytes, whose scans report min/max.
    pub max_min_max_width: usize,
    /// Fail a scan whose output would exceed the caller's capacity instead of
    /// trusting the worst-case sizing contract.
    pub check_output_capacity: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            vertical_filtering: true,
            max_min_max_width: 16,
            check_output_capacity: true,
        }
    }
}

impl ScanConfig {
    /// Force the row-at-a-time strategy.
    pub fn row_at_a_time() -> Self {
        Self {
            vertical_filtering: false,
            ..Self::default()
        }
    }
}
