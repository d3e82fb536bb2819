use crate::types::{TargetTable, VarianceReport};
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::error::Error;
use tabled::builder::Builder;
use tabled::{settings::Style, Table, Tabled};

pub const VARIANCE_HEADERS: [&str; 7] = [
    "Category",
    "Pre Consumer (TPA)",
    "Post Consumer (TPA)",
    "Export (TPA)",
    "Total Consumption (TPA)",
    "Purchase (Tons)",
    "Difference (%)",
];

/// Write the analysis workbook: `Sheet1` holds the variance table, and one
/// `Target_{n}` sheet exists per projection table.
///
/// Quantities are written as numbers so a re-read reproduces the values.
pub fn write_workbook(
    path: &str,
    report: &VarianceReport,
    targets: &[TargetTable],
) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;
    for (col, header) in VARIANCE_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (i, row) in report.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.category.as_str())?;
        sheet.write_number(r, 1, row.pre_consumer)?;
        sheet.write_number(r, 2, row.post_consumer)?;
        sheet.write_number(r, 3, row.export)?;
        sheet.write_number(r, 4, row.total_consumption)?;
        sheet.write_number(r, 5, row.purchase)?;
        sheet.write_number(r, 6, row.difference_percent)?;
    }

    for (n, table) in targets.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("Target_{}", n + 1))?;
        let mut col: u16 = 0;
        sheet.write_string(0, col, "Category")?;
        col += 1;
        sheet.write_string(0, col, table.year_one.as_str())?;
        col += 1;
        sheet.write_string(0, col, table.year_two.as_str())?;
        col += 1;
        sheet.write_string(0, col, "Avg")?;
        col += 1;
        if table.producer {
            sheet.write_string(0, col, format!("Registered Sales ({})", table.year_two))?;
            col += 1;
        }
        sheet.write_string(0, col, format!("Target {}", table.target_year))?;

        for (i, row) in table.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            let mut col: u16 = 0;
            sheet.write_string(r, col, row.category.as_str())?;
            col += 1;
            sheet.write_number(r, col, row.year_one_qty)?;
            col += 1;
            sheet.write_number(r, col, row.year_two_qty)?;
            col += 1;
            sheet.write_number(r, col, row.average)?;
            col += 1;
            if let Some(offset) = row.registered_sales {
                sheet.write_number(r, col, offset)?;
                col += 1;
            }
            sheet.write_number(r, col, row.target)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Whole-file JSON replace; the summary document is a materialized view,
/// so the last write wins.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Console preview of one target table. Built row by row because the
/// column names carry the observed years.
pub fn preview_target_table(table: &TargetTable) {
    let mut builder = Builder::default();
    let mut headers = vec![
        "Category".to_string(),
        table.year_one.clone(),
        table.year_two.clone(),
        "Avg".to_string(),
    ];
    if table.producer {
        headers.push(format!("Registered Sales ({})", table.year_two));
    }
    headers.push(format!("Target {}", table.target_year));
    builder.push_record(headers);

    for row in &table.rows {
        let mut record = vec![
            row.category.clone(),
            row.year_one_qty.to_string(),
            row.year_two_qty.to_string(),
            row.average.to_string(),
        ];
        if let Some(offset) = row.registered_sales {
            record.push(offset.to_string());
        }
        record.push(row.target.to_string());
        builder.push_record(record);
    }

    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
