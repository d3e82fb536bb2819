// End-to-end run of the reconciliation pipeline: loader -> aggregation ->
// variance -> projection -> workbook, with a re-read of the written file.
use epr_report::analysis::{aggregate, compute_variance, project_targets, RegisteredSales};
use epr_report::loader;
use epr_report::output;
use epr_report::report::{build_summary, AnalysisKey};
use epr_report::types::{PurchaseRecord, SalesRecord};
use epr_report::util::parse_numeric_or_zero;
use std::io::Write;

fn sale(category: &str, year: &str, pre: f64, post: f64, export: f64) -> SalesRecord {
    SalesRecord {
        category: category.to_string(),
        year: year.to_string(),
        pre_consumer_qty: pre,
        post_consumer_qty: post,
        export_qty: export,
        registration_type: String::new(),
    }
}

fn purchase(category: &str, tons: f64) -> PurchaseRecord {
    PurchaseRecord {
        category: category.to_string(),
        quantity_tons: tons,
        registration_status: String::new(),
    }
}

#[test]
fn workbook_round_trip_reproduces_variance_table() {
    let sales = vec![
        sale("Cat-I", "2022-23", 10.0, 5.0, 0.0),
        sale("Cat-I", "2023-24", 3.0, 0.0, 2.0),
        sale("Cat III Flexible", "2023-24", 7.5, 1.25, 0.0),
        sale("out of taxonomy", "2023-24", 99.0, 0.0, 0.0),
    ];
    let purchases = vec![purchase("CAT-I", 18.0), purchase("Cat III", 10.0)];
    let agg = aggregate(&sales, &purchases);
    let variance = compute_variance(&agg);
    let targets = project_targets(&agg, false, &RegisteredSales::default());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.xlsx");
    let path = path.to_str().unwrap();
    output::write_workbook(path, &variance, &targets).unwrap();

    // Re-read the first sheet and compare against the computed table.
    let grid = loader::read_grid(path).unwrap();
    assert_eq!(grid[0], output::VARIANCE_HEADERS.to_vec());
    assert_eq!(grid.len(), 1 + variance.rows.len());
    for (row, expected) in grid[1..].iter().zip(variance.rows.iter()) {
        assert_eq!(row[0], expected.category);
        assert!((parse_numeric_or_zero(&row[4]) - expected.total_consumption).abs() < 1e-9);
        assert!((parse_numeric_or_zero(&row[5]) - expected.purchase).abs() < 1e-9);
        assert!((parse_numeric_or_zero(&row[6]) - expected.difference_percent).abs() < 1e-9);
    }

    // The dropped label stays out of every bucket.
    let total_row = variance.rows.last().unwrap();
    assert_eq!(total_row.total_consumption, 28.75);
    assert_eq!(total_row.purchase, 28.0);
}

#[test]
fn csv_input_feeds_the_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let sales_path = dir.path().join("sales.csv");
    let mut f = std::fs::File::create(&sales_path).unwrap();
    writeln!(
        f,
        "Category of Plastic,Pre Consumer Waste Plastic Quantity (TPA),Post Consumer Waste Plastic Quantity (TPA),Export Quantity Plastic Quantity (TPA),Year,Registration Type"
    )
    .unwrap();
    writeln!(f, "Cat-I,100,0,0,2022-23,").unwrap();
    writeln!(f, "Cat-I,90,0,0,2023-24,").unwrap();
    writeln!(f, "Cat-I,30,0,0,2023-24,Registered").unwrap();
    drop(f);

    let (sales, load_report) = loader::load_sales(sales_path.to_str().unwrap()).unwrap();
    assert_eq!(load_report.kept_rows, 3);

    let agg = aggregate(&sales, &[]);
    let registered = RegisteredSales::from_records(&sales);
    let variance = compute_variance(&agg);
    let targets = project_targets(&agg, true, &registered);

    assert_eq!(targets.len(), 1);
    let row = &targets[0].rows[0];
    assert_eq!(row.average, 110.0);
    assert_eq!(row.registered_sales, Some(30.0));
    assert_eq!(row.target, 80.0);

    let out = dir.path().join("summary.json");
    let summary = build_summary(
        AnalysisKey {
            client: "acme".to_string(),
            facility_type: "plant".to_string(),
            item_id: "1".to_string(),
        },
        &agg,
        &variance,
        &targets,
        &registered,
        &[],
        &[],
        "epr_analysis.xlsx",
    );
    output::write_json(out.to_str().unwrap(), &summary).unwrap();

    let raw = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["client"], "acme");
    assert_eq!(value["summary"]["portal_summary"].as_array().unwrap().len(), 5);
    assert_eq!(
        value["summary"]["target_tables"][0]["rows"][0]["Target 2024-25"],
        80.0
    );
}
