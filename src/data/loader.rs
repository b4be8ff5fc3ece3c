use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{parser, periods, unit_inference};

/// Rows scanned when looking for the header row.
const HEADER_SCAN_ROWS: usize = 50;

/// Result of loading a sheet: column names and column data as strings.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub source_name: String,
    pub columns: Vec<String>,
    pub column_data: Vec<Vec<String>>, // column-major: column_data[col_idx][row_idx]
    pub row_count: usize,
}

/// One numeric metric column of an imported sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricColumn {
    pub name: String,
    pub unit: String,
    /// Parallel to `MetricSheet::periods`; unparseable cells are NaN.
    #[serde(with = "nullable_values")]
    pub values: Vec<f64>,
}

/// JSON has no NaN, so missing cells are stored as `null`.
mod nullable_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let cells: Vec<Option<f64>> = values.iter().map(|v| v.is_finite().then_some(*v)).collect();
        cells.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let cells = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(cells.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

/// A tabular metric import: one row per reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSheet {
    pub name: String,
    pub periods: Vec<String>,
    pub metrics: Vec<MetricColumn>,
}

/// Load a CSV or Excel file and return the column names and raw string data.
pub fn load_file(path: &Path) -> Result<LoadedData, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(path)?,
        "xls" | "xlsx" => read_excel_rows(path)?,
        _ => return Err(format!("Unsupported file format: .{ext}")),
    };

    let source_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported")
        .to_string();
    into_columns(source_name, rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let content = std::fs::read(path).map_err(|e| format!("Cannot read file: {e}"))?;
    Ok(parse_csv_rows(&parser::decode_text(content)))
}

/// Split CSV text into rows. Malformed records are skipped.
pub fn parse_csv_rows(text: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut all_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => all_rows.push(record.iter().map(|s| s.to_string()).collect()),
            Err(e) => tracing::warn!("Skipping malformed CSV record: {e}"),
        }
    }
    all_rows
}

fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Cannot open Excel file: {e}"))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or("No sheets found")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Cannot read sheet: {e}"))?;

    Ok(range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => match dt.as_datetime() {
                        Some(d) => d.format("%Y-%m-%d").to_string(),
                        None => dt.to_string(),
                    },
                    Data::DateTimeIso(s) => s.clone(),
                    Data::DurationIso(s) => s.clone(),
                    Data::Error(e) => format!("{e:?}"),
                })
                .collect()
        })
        .collect())
}

/// Convert raw rows into column-major data below the detected header row.
pub fn into_columns(source_name: String, all_rows: Vec<Vec<String>>) -> Result<LoadedData, String> {
    let header_row = parser::detect_header_row(&all_rows, HEADER_SCAN_ROWS);
    if all_rows.is_empty() || header_row >= all_rows.len() {
        return Err("No data found after header detection".to_string());
    }

    let columns: Vec<String> = all_rows[header_row]
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let name = s.trim();
            if name.is_empty() {
                format!("Column {}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    let data_rows: Vec<&Vec<String>> = all_rows[header_row + 1..]
        .iter()
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
        .collect();
    if data_rows.is_empty() {
        return Err("No data rows below the header".to_string());
    }

    let num_cols = columns.len();
    let mut column_data: Vec<Vec<String>> = vec![Vec::new(); num_cols];
    let row_count = data_rows.len();

    for row in data_rows {
        for (col_idx, col_data) in column_data.iter_mut().enumerate() {
            col_data.push(row.get(col_idx).cloned().unwrap_or_default());
        }
    }

    Ok(LoadedData {
        source_name,
        columns,
        column_data,
        row_count,
    })
}

/// Extract numeric f64 values from a string column.
/// Returns (values, fraction_valid) where invalid entries become NaN.
/// Thousands separators and trailing `%` are tolerated.
pub fn column_to_f64(data: &[String]) -> (Vec<f64>, f64) {
    let mut values = Vec::with_capacity(data.len());
    let mut valid = 0usize;
    for s in data {
        let cleaned: String = s
            .trim()
            .trim_end_matches('%')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match cleaned.trim().parse::<f64>() {
            Ok(v) => {
                values.push(v);
                if v.is_finite() {
                    valid += 1;
                }
            }
            Err(_) => values.push(f64::NAN),
        }
    }
    let frac = if data.is_empty() { 0.0 } else { valid as f64 / data.len() as f64 };
    (values, frac)
}

/// Build a metric sheet from the chosen period column and metric columns.
///
/// Rows with a blank period label are dropped. Rows are put in
/// chronological order when every label parses as a period.
pub fn build_metric_sheet(
    loaded: &LoadedData,
    period_col: usize,
    metric_cols: &[usize],
) -> Result<MetricSheet, String> {
    let period_data = loaded
        .column_data
        .get(period_col)
        .ok_or_else(|| format!("Period column {period_col} out of range"))?;
    if metric_cols.is_empty() {
        return Err("Select at least one metric column".to_string());
    }

    let keep: Vec<usize> = (0..loaded.row_count)
        .filter(|&r| !period_data[r].trim().is_empty())
        .collect();
    if keep.is_empty() {
        return Err("The period column is empty".to_string());
    }

    let labels: Vec<String> = keep.iter().map(|&r| period_data[r].trim().to_string()).collect();
    let order = periods::chronological_order(&labels).unwrap_or_else(|| (0..labels.len()).collect());

    let mut metrics = Vec::with_capacity(metric_cols.len());
    for &col in metric_cols {
        let name = loaded
            .columns
            .get(col)
            .ok_or_else(|| format!("Metric column {col} out of range"))?
            .clone();
        let (values, frac) = column_to_f64(&loaded.column_data[col]);
        if frac == 0.0 {
            tracing::warn!("Column '{name}' has no numeric values");
        }
        let values = order.iter().map(|&i| values[keep[i]]).collect();
        metrics.push(MetricColumn {
            unit: unit_inference::infer_unit(&name),
            name,
            values,
        });
    }

    Ok(MetricSheet {
        name: loaded.source_name.clone(),
        periods: order.iter().map(|&i| labels[i].clone()).collect(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "Monthly export\n\
                       Month,Energy (MWh),Water,Notes\n\
                       2024-02,12.5,\"1,200\",ok\n\
                       2024-01,10,900,\n\
                       ,,,\n\
                       2024-03,n/a,1100,late\n";

    fn loaded() -> LoadedData {
        into_columns("plant".to_string(), parse_csv_rows(CSV)).unwrap()
    }

    #[test]
    fn splits_columns_below_header() {
        let data = loaded();
        assert_eq!(data.columns, vec!["Month", "Energy (MWh)", "Water", "Notes"]);
        assert_eq!(data.row_count, 3);
        assert_eq!(data.column_data[2][0], "1,200");
    }

    #[test]
    fn numeric_conversion_reports_valid_fraction() {
        let col: Vec<String> = ["1", "2.5%", "x", "1,000"].iter().map(|s| s.to_string()).collect();
        let (vals, frac) = column_to_f64(&col);
        assert_eq!(vals[1], 2.5);
        assert!(vals[2].is_nan());
        assert_eq!(vals[3], 1000.0);
        assert_eq!(frac, 0.75);
    }

    #[test]
    fn builds_sorted_metric_sheet() {
        let sheet = build_metric_sheet(&loaded(), 0, &[1, 2]).unwrap();
        assert_eq!(sheet.name, "plant");
        assert_eq!(sheet.periods, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(sheet.metrics[0].unit, "MWh");
        assert_eq!(sheet.metrics[0].values[0], 10.0);
        assert!(sheet.metrics[0].values[2].is_nan());
        assert_eq!(sheet.metrics[1].values, vec![900.0, 1200.0, 1100.0]);
    }

    #[test]
    fn missing_cells_survive_json() {
        let sheet = build_metric_sheet(&loaded(), 0, &[1]).unwrap();
        let json = serde_json::to_string(&sheet).unwrap();
        assert!(json.contains("null"));
        let back: MetricSheet = serde_json::from_str(&json).unwrap();
        assert!(back.metrics[0].values[2].is_nan());
        assert_eq!(back.metrics[0].values[1], 12.5);
    }

    #[test]
    fn metric_selection_is_required() {
        assert!(build_metric_sheet(&loaded(), 0, &[]).is_err());
        assert!(build_metric_sheet(&loaded(), 9, &[1]).is_err());
    }

    #[test]
    fn loads_csv_from_disk_and_rejects_unknown_extensions() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let data = load_file(file.path()).unwrap();
        assert_eq!(data.row_count, 3);

        let other = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(load_file(other.path()).unwrap_err().contains("Unsupported"));
    }
}
