/// Run-time configuration of a column command (no hidden constants).
#[derive(Debug, Clone)]
pub struct ColumnCommandConfig {
    /// Also produce absolute row ids (`base_rid + rid`) for every match.
    pub make_abs_rids: bool,
    /// Record the min/max a full scan reports against the block's id.
    pub capture_min_max: bool,
}

impl Default for ColumnCommandConfig {
    fn default() -> Self {
        Self {
            make_abs_rids: true,
            capture_min_max: true,
        }
    }
}
