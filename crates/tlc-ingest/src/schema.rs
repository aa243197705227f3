// CSV decode and schema derivation
//
// The trip CSVs carry their schema in the header row only, so each asset is
// decoded into a column-named table and a type is inferred per column by
// scanning its values. Inference is deliberately narrow - integers, floats,
// and text - which is all the destinations need; anything ambiguous stays
// text. Empty cells become NULLs.

use tracing::debug;

use crate::Result;

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Text,
}

/// A decoded CSV asset: normalized headers, inferred types, and rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Normalized column names, in file order
    pub columns: Vec<String>,

    /// Inferred type per column, parallel to `columns`
    pub types: Vec<ColumnType>,

    /// Row values in file order; `None` is an empty cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl CsvTable {
    /// Decode CSV bytes into a table with normalized headers and inferred
    /// column types.
    pub fn parse(data: &[u8]) -> Result<CsvTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers = reader.headers()?.clone();
        let columns = normalize_headers(&headers);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<Option<String>> = record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        let types = infer_types(columns.len(), &rows);
        debug!(
            columns = columns.len(),
            rows = rows.len(),
            "Decoded CSV table"
        );

        Ok(CsvTable {
            columns,
            types,
            rows,
        })
    }

    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalize raw headers into valid, unique snake_case identifiers.
fn normalize_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (index, raw) in headers.iter().enumerate() {
        let mut name = normalize_identifier(raw);
        if name.is_empty() {
            name = format!("column_{}", index);
        }

        // Duplicate headers get a positional suffix to stay addressable.
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            name = format!("{}_{}", name, *count);
        }

        columns.push(name);
    }

    columns
}

/// Lowercase, map every non-alphanumeric run to a single underscore, and
/// guard against a leading digit.
pub fn normalize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;

    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }

    let out = out.trim_end_matches('_').to_string();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", out)
    } else {
        out
    }
}

/// Infer one type per column: BigInt if every non-null value parses as i64,
/// Double if every non-null value parses as f64, Text otherwise (including
/// all-null columns).
fn infer_types(column_count: usize, rows: &[Vec<Option<String>>]) -> Vec<ColumnType> {
    (0..column_count)
        .map(|col| {
            let mut any_value = false;
            let mut all_int = true;
            let mut all_float = true;

            for row in rows {
                let Some(Some(value)) = row.get(col) else {
                    continue;
                };
                any_value = true;
                if all_int && value.parse::<i64>().is_err() {
                    all_int = false;
                }
                if all_float && value.parse::<f64>().is_err() {
                    all_float = false;
                }
                if !all_int && !all_float {
                    break;
                }
            }

            if !any_value {
                ColumnType::Text
            } else if all_int {
                ColumnType::BigInt
            } else if all_float {
                ColumnType::Double
            } else {
                ColumnType::Text
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let data = b"VendorID,fare_amount,store_and_fwd_flag\n1,12.5,N\n2,7.0,Y\n";
        let table = CsvTable::parse(data).unwrap();

        assert_eq!(
            table.columns,
            vec!["vendorid", "fare_amount", "store_and_fwd_flag"]
        );
        assert_eq!(
            table.types,
            vec![ColumnType::BigInt, ColumnType::Double, ColumnType::Text]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_empty_cells_are_null() {
        let data = b"a,b\n1,\n,2\n";
        let table = CsvTable::parse(data).unwrap();

        assert_eq!(table.rows[0][1], None);
        assert_eq!(table.rows[1][0], None);
        // Nulls do not break integer inference
        assert_eq!(table.types, vec![ColumnType::BigInt, ColumnType::BigInt]);
    }

    #[test]
    fn test_parse_headers_only() {
        let data = b"a,b\n";
        let table = CsvTable::parse(data).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.types, vec![ColumnType::Text, ColumnType::Text]);
    }

    #[test]
    fn test_mixed_column_degrades_to_text() {
        let data = b"v\n1\nabc\n2.5\n";
        let table = CsvTable::parse(data).unwrap();
        assert_eq!(table.types, vec![ColumnType::Text]);
    }

    #[test]
    fn test_ints_and_floats_infer_double() {
        let data = b"v\n1\n2.5\n";
        let table = CsvTable::parse(data).unwrap();
        assert_eq!(table.types, vec![ColumnType::Double]);
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("VendorID"), "vendorid");
        assert_eq!(normalize_identifier("Trip Distance"), "trip_distance");
        assert_eq!(normalize_identifier("fare($)"), "fare");
        assert_eq!(normalize_identifier("  padded  "), "padded");
        assert_eq!(normalize_identifier("2nd_col"), "_2nd_col");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn test_duplicate_headers_get_suffix() {
        let data = b"a,A,a\n1,2,3\n";
        let table = CsvTable::parse(data).unwrap();
        assert_eq!(table.columns, vec!["a", "a_2", "a_3"]);
    }

    #[test]
    fn test_unnamed_header_gets_positional_name() {
        let data = b"a,,b\n1,2,3\n";
        let table = CsvTable::parse(data).unwrap();
        assert_eq!(table.columns, vec!["a", "column_1", "b"]);
    }
}
