// Parquet file-tree sink
//
// Layout: {root}/{dataset}/{table}/{part}.parquet. Every append writes a
// fresh, uniquely named part file; nothing is rewritten, so repeated runs
// accumulate parts. Readers treat the table directory as one dataset.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::schema::{ColumnType, CsvTable};
use crate::sink::ensure_dir;
use crate::Result;

/// File-tree sink rooted at a local directory
#[derive(Debug)]
pub struct FileTreeSink {
    root_dir: PathBuf,
    dataset_name: String,
}

impl FileTreeSink {
    /// Ensure the root directory exists and return the sink.
    ///
    /// Safe to call repeatedly; an existing tree is reused as-is.
    pub fn prepare(root_dir: &Path, dataset_name: &str) -> Result<Self> {
        ensure_dir(root_dir)?;
        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            dataset_name: dataset_name.to_string(),
        })
    }

    /// Write one decoded asset as a new Parquet part file under the table's
    /// directory. Returns rows written.
    pub fn append(&self, table: &str, data: &CsvTable) -> Result<u64> {
        let table_dir = self.root_dir.join(&self.dataset_name).join(table);
        ensure_dir(&table_dir)?;

        let schema = arrow_schema(&data.columns, &data.types);
        let batch = record_batch(schema.clone(), data)?;

        let part_name = format!(
            "{}-{}.parquet",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            Uuid::new_v4().simple()
        );
        let path = table_dir.join(&part_name);

        let file = File::create(&path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        debug!(path = %path.display(), rows = data.row_count(), "Wrote parquet part");
        info!(table = %table, part = %part_name, rows = data.row_count(), "Appended part file");

        Ok(data.row_count())
    }

    /// Directory holding a table's part files.
    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.root_dir.join(&self.dataset_name).join(table)
    }
}

fn arrow_schema(columns: &[String], types: &[ColumnType]) -> Arc<Schema> {
    let fields: Vec<Field> = columns
        .iter()
        .zip(types)
        .map(|(name, ty)| {
            let data_type = match ty {
                ColumnType::BigInt => DataType::Int64,
                ColumnType::Double => DataType::Float64,
                ColumnType::Text => DataType::Utf8,
            };
            Field::new(name.as_str(), data_type, true)
        })
        .collect();

    Arc::new(Schema::new(fields))
}

fn record_batch(schema: Arc<Schema>, data: &CsvTable) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(data.columns.len());

    for (index, column_type) in data.types.iter().enumerate() {
        let cells = data
            .rows
            .iter()
            .map(|row| row.get(index).and_then(|c| c.as_deref()));

        let array: ArrayRef = match column_type {
            ColumnType::BigInt => Arc::new(
                cells
                    .map(|c| c.and_then(|v| v.parse::<i64>().ok()))
                    .collect::<Int64Array>(),
            ),
            ColumnType::Double => Arc::new(
                cells
                    .map(|c| c.and_then(|v| v.parse::<f64>().ok()))
                    .collect::<Float64Array>(),
            ),
            ColumnType::Text => Arc::new(cells.collect::<StringArray>()),
        };

        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

// ============================================================================
// Tests
// ============================================================================
