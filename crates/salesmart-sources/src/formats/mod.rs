mod columnar;
mod delimited;
mod snapshot;
mod spreadsheet;

pub use columnar::read_parquet;
pub use delimited::read_delimited;
pub use snapshot::{read_snapshot, snapshot_frame, SnapshotRecord};
pub use spreadsheet::{cell_value, read_workbook};
