use crate::normalize::normalize_category;
use crate::types::{PurchaseRecord, SalesRecord, SkuRecord};
use crate::util::parse_numeric_or_zero;
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::error::Error;
use std::path::Path;

// Exact header strings the declaration and purchase sheets are expected to
// carry. Missing columns default to 0/empty rather than failing the load.
const SALES_CATEGORY: &str = "Category of Plastic";
const SALES_PRE: &str = "Pre Consumer Waste Plastic Quantity (TPA)";
const SALES_POST: &str = "Post Consumer Waste Plastic Quantity (TPA)";
const SALES_EXPORT: &str = "Export Quantity Plastic Quantity (TPA)";
const SALES_YEAR: &str = "Year";
const SALES_REGISTRATION: &str = "Registration Type";

const PURCHASE_CATEGORY: &str = "Category of Plastic";
const PURCHASE_QTY: &str = "Total Plastic Qty (Tons)";
const PURCHASE_REGISTRATION: &str = "Registration Status";

const SKU_CODE: &str = "SKU";
const SKU_DESCRIPTION: &str = "Product Description";
const SKU_MARKING: &str = "Marking Status";
const SKU_LABELLING: &str = "Labelling Status";

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub unmatched_categories: usize,
}

/// Read a spreadsheet into a uniform grid of trimmed strings.
///
/// `.csv` goes through the csv crate; anything else is treated as an Excel
/// workbook and read from its first sheet via calamine.
pub fn read_grid(path: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => read_csv_grid(path),
        _ => read_xlsx_grid(path),
    }
}

fn read_csv_grid(path: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;
    let mut grid = Vec::new();
    for result in rdr.records() {
        // Unreadable records are skipped, not fatal.
        let Ok(record) = result else { continue };
        grid.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(grid)
}

fn read_xlsx_grid(path: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("workbook has no sheets")?;
    let range = workbook.worksheet_range(&sheet)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Load the sales/declaration sheet. The sales file is mandatory for an
/// analysis run, so a missing or unreadable file is a hard error here.
///
/// The returned [`LoadReport`] counts rows whose category label will not
/// match any canonical bucket; those rows still load and are dropped later
/// by the aggregator.
pub fn load_sales(path: &str) -> Result<(Vec<SalesRecord>, LoadReport), Box<dyn Error>> {
    let grid = read_grid(path)?;
    let mut report = LoadReport::default();
    let Some(headers) = grid.first() else {
        return Ok((Vec::new(), report));
    };
    let category = column_index(headers, SALES_CATEGORY);
    let pre = column_index(headers, SALES_PRE);
    let post = column_index(headers, SALES_POST);
    let export = column_index(headers, SALES_EXPORT);
    let year = column_index(headers, SALES_YEAR);
    let registration = column_index(headers, SALES_REGISTRATION);

    let mut records = Vec::new();
    for row in &grid[1..] {
        if is_blank(row) {
            continue;
        }
        report.total_rows += 1;
        let record = SalesRecord {
            category: cell(row, category).to_string(),
            year: cell(row, year).trim().to_string(),
            pre_consumer_qty: parse_numeric_or_zero(cell(row, pre)),
            post_consumer_qty: parse_numeric_or_zero(cell(row, post)),
            export_qty: parse_numeric_or_zero(cell(row, export)),
            registration_type: cell(row, registration).to_string(),
        };
        if normalize_category(&record.category).is_none() {
            report.unmatched_categories += 1;
        }
        report.kept_rows += 1;
        records.push(record);
    }
    Ok((records, report))
}

/// Load the optional purchase-register sheet.
pub fn load_purchases(path: &str) -> Result<(Vec<PurchaseRecord>, LoadReport), Box<dyn Error>> {
    let grid = read_grid(path)?;
    let mut report = LoadReport::default();
    let Some(headers) = grid.first() else {
        return Ok((Vec::new(), report));
    };
    let category = column_index(headers, PURCHASE_CATEGORY);
    let qty = column_index(headers, PURCHASE_QTY);
    let registration = column_index(headers, PURCHASE_REGISTRATION);

    let mut records = Vec::new();
    for row in &grid[1..] {
        if is_blank(row) {
            continue;
        }
        report.total_rows += 1;
        records.push(PurchaseRecord {
            category: cell(row, category).to_string(),
            quantity_tons: parse_numeric_or_zero(cell(row, qty)),
            registration_status: cell(row, registration).to_string(),
        });
        report.kept_rows += 1;
    }
    Ok((records, report))
}

/// Load the optional per-SKU marking/labelling sheet.
pub fn load_skus(path: &str) -> Result<Vec<SkuRecord>, Box<dyn Error>> {
    let grid = read_grid(path)?;
    let Some(headers) = grid.first() else {
        return Ok(Vec::new());
    };
    let sku = column_index(headers, SKU_CODE);
    let description = column_index(headers, SKU_DESCRIPTION);
    let marking = column_index(headers, SKU_MARKING);
    let labelling = column_index(headers, SKU_LABELLING);

    let mut records = Vec::new();
    for row in &grid[1..] {
        if is_blank(row) {
            continue;
        }
        records.push(SkuRecord {
            sku: cell(row, sku).to_string(),
            description: cell(row, description).to_string(),
            marking_status: cell(row, marking).to_string(),
            labelling_status: cell(row, labelling).to_string(),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn sales_sheet_maps_exact_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "sales.csv",
            "Category of Plastic,Pre Consumer Waste Plastic Quantity (TPA),Post Consumer Waste Plastic Quantity (TPA),Export Quantity Plastic Quantity (TPA),Year\n\
             Cat-I,10,5,0,2023-24\n\
             Cat III,3,,2,2023-24\n",
        );
        let (records, report) = load_sales(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.unmatched_categories, 0);
        assert_eq!(records[0].pre_consumer_qty, 10.0);
        assert_eq!(records[1].post_consumer_qty, 0.0);
        assert_eq!(records[1].export_qty, 2.0);
        assert_eq!(records[0].year, "2023-24");
    }

    #[test]
    fn missing_optional_columns_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "sales.csv",
            "Category of Plastic,Year\nCat-II,2022-23\n",
        );
        let (records, _) = load_sales(&path).unwrap();
        assert_eq!(records[0].pre_consumer_qty, 0.0);
        assert_eq!(records[0].registration_type, "");
    }

    #[test]
    fn unknown_categories_are_counted_not_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "sales.csv",
            "Category of Plastic,Year\nAluminium,2022-23\nCat-I,2022-23\n",
        );
        let (records, report) = load_sales(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.unmatched_categories, 1);
    }

    #[test]
    fn purchase_sheet_loads_quantities() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "purchase.csv",
            "Category of Plastic,Total Plastic Qty (Tons),Registration Status\n\
             CAT-I,120.5,Registered\n\
             Cat II,abc,Unregistered\n",
        );
        let (records, report) = load_purchases(&path).unwrap();
        assert_eq!(report.kept_rows, 2);
        assert_eq!(records[0].quantity_tons, 120.5);
        assert_eq!(records[1].quantity_tons, 0.0);
        assert_eq!(records[1].registration_status, "Unregistered");
    }

    #[test]
    fn missing_sales_file_is_an_error() {
        assert!(load_sales("no_such_file.csv").is_err());
    }
}
