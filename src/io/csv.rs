use csv::{ReaderBuilder, Writer};
use std::fs::File;
use std::path::Path;

use crate::core::error::{check_aligned, Error, Result};
use crate::table::FeatureTable;

/// Read a feature table and its target from a CSV file with a header row
///
/// Every column other than `target_column` and the optional `id_column`
/// becomes a feature, in file order. All feature and target cells must parse
/// as numbers.
///
/// # Arguments
/// * `path` - CSV file
/// * `target_column` - Name of the target column
/// * `id_column` - Name of a row identifier column to skip, if any
pub fn read_feature_csv<P: AsRef<Path>>(
    path: P,
    target_column: &str,
    id_column: Option<&str>,
) -> Result<(FeatureTable, Vec<f64>)> {
    let file = File::open(path.as_ref())?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let target_index = headers
        .iter()
        .position(|h| h == target_column)
        .ok_or_else(|| Error::ColumnNotFound(target_column.to_string()))?;
    if let Some(id) = id_column {
        if !headers.iter().any(|h| h == id) {
            return Err(Error::ColumnNotFound(id.to_string()));
        }
    }

    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|&i| i != target_index && Some(headers[i].as_str()) != id_column)
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); feature_indices.len()];
    let mut target = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        target.push(parse_cell(&record, target_index, &headers, row)?);
        for (values, &i) in columns.iter_mut().zip(feature_indices.iter()) {
            values.push(parse_cell(&record, i, &headers, row)?);
        }
    }

    let table = FeatureTable::from_columns(
        feature_indices
            .iter()
            .map(|&i| headers[i].clone())
            .zip(columns),
    )?;
    if table.ncols() > 0 {
        check_aligned(table.nrows(), target.len())?;
    }
    Ok((table, target))
}

fn parse_cell(record: &csv::StringRecord, index: usize, headers: &[String], row: usize) -> Result<f64> {
    let raw = record.get(index).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        Error::InvalidValue(format!(
            "column '{}' row {}: '{}' is not a number",
            headers[index],
            row + 1,
            raw
        ))
    })
}

/// Write a feature table and its target to a CSV file
///
/// The target is written as the last column under `target_column`.
pub fn write_feature_csv<P: AsRef<Path>>(
    table: &FeatureTable,
    target_column: &str,
    target: &[f64],
    path: P,
) -> Result<()> {
    if table.ncols() > 0 {
        check_aligned(table.nrows(), target.len())?;
    }
    let file = File::create(path.as_ref())?;
    let mut wtr = Writer::from_writer(file);

    let mut header: Vec<&str> = table.column_names().iter().map(String::as_str).collect();
    header.push(target_column);
    wtr.write_record(&header)?;

    let columns = table.view().columns();
    for (row, value) in target.iter().enumerate() {
        let mut record: Vec<String> = columns.iter().map(|c| c[row].to_string()).collect();
        record.push(value.to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
