// Postgres warehouse sink
//
// Each asset load is one transaction: ensure the table exists with the
// asset's inferred schema, then append its rows in chunked multi-row
// inserts. Append only - no upserts, no conflict handling; re-running a
// period accumulates rows.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::schema::{ColumnType, CsvTable};
use crate::Result;

/// Rows per INSERT statement. Bounded further by the bind-parameter limit
/// when a table is wide.
const INSERT_CHUNK_ROWS: usize = 500;

/// Postgres caps bind parameters per statement at u16::MAX; stay under it.
const MAX_BIND_PARAMS: usize = 60_000;

/// Warehouse sink backed by a Postgres connection pool
#[derive(Debug)]
pub struct WarehouseSink {
    pool: PgPool,
    dataset_name: String,
}

impl WarehouseSink {
    /// Connect the pool and ensure the dataset schema exists.
    pub async fn connect(connection_string: &str, dataset_name: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(connection_string)
            .await?;

        sqlx::query(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(dataset_name)
        ))
        .execute(&pool)
        .await?;

        info!(dataset = %dataset_name, "Warehouse ready");

        Ok(Self {
            pool,
            dataset_name: dataset_name.to_string(),
        })
    }

    /// Append one decoded asset to the table, creating it on first contact.
    pub async fn append(&self, table: &str, data: &CsvTable) -> Result<u64> {
        let qualified = format!(
            "{}.{}",
            quote_ident(&self.dataset_name),
            quote_ident(table)
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(&create_table_sql(&qualified, &data.columns, &data.types))
            .execute(&mut *tx)
            .await?;

        let chunk_rows = chunk_rows_for(data.columns.len());
        let mut appended = 0u64;

        for chunk in data.rows.chunks(chunk_rows) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(insert_prefix(&qualified, &data.columns));

            builder.push_values(chunk, |mut b, row| {
                for (index, column_type) in data.types.iter().enumerate() {
                    let cell = row.get(index).and_then(|c| c.as_deref());
                    match column_type {
                        ColumnType::BigInt => {
                            b.push_bind(cell.and_then(|v| v.parse::<i64>().ok()));
                        },
                        ColumnType::Double => {
                            b.push_bind(cell.and_then(|v| v.parse::<f64>().ok()));
                        },
                        ColumnType::Text => {
                            b.push_bind(cell.map(|v| v.to_string()));
                        },
                    }
                }
            });

            let result = builder.build().execute(&mut *tx).await?;
            appended += result.rows_affected();
        }

        tx.commit().await?;

        debug!(table = %qualified, rows = appended, "Appended rows");

        Ok(appended)
    }

    /// Close the connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Quote an identifier for Postgres, escaping embedded quotes.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn pg_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::BigInt => "BIGINT",
        ColumnType::Double => "DOUBLE PRECISION",
        ColumnType::Text => "TEXT",
    }
}

fn create_table_sql(qualified: &str, columns: &[String], types: &[ColumnType]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .zip(types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), pg_type(*ty)))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified,
        column_defs.join(", ")
    )
}

fn insert_prefix(qualified: &str, columns: &[String]) -> String {
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!("INSERT INTO {} ({}) ", qualified, column_list.join(", "))
}

/// Rows per statement, bounded by the bind-parameter limit for wide tables.
fn chunk_rows_for(column_count: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / column_count.max(1);
    INSERT_CHUNK_ROWS.min(by_params).max(1)
}

// ============================================================================
// Tests
// ============================================================================
