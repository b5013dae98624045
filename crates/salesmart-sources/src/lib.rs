pub mod cells;
pub mod errors;
pub mod formats;
pub mod partition;
mod registry;

pub use cells::{CellValue, RecordTable};
pub use errors::SourceError;
pub use formats::{read_snapshot, snapshot_frame, SnapshotRecord};
pub use partition::{parse_partition_path, parse_sales_filename, DateParseError, DateSegment, PartitionDate};
pub use registry::{DelimitedTable, ParquetTable, TableReader, WorkbookTable};
