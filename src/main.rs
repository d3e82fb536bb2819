// Entry point and high-level CLI flow.
//
// - Option [1] loads the declaration sheet plus the optional purchase and
//   SKU sheets, printing diagnostics.
// - Option [2] runs the reconciliation, writes the analysis workbook and
//   the JSON summary document, and previews every table.
// - After an analysis the user can go back to the menu or exit.
use epr_report::analysis::{aggregate, compute_variance, project_targets, RegisteredSales};
use epr_report::loader;
use epr_report::output;
use epr_report::report::{self, AnalysisKey};
use epr_report::types::{PurchaseRecord, SalesRecord, SkuRecord};
use epr_report::util::{format_int, format_number};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

const SALES_FILE: &str = "sales_declarations.xlsx";
const PURCHASE_FILE: &str = "purchase_register.xlsx";
const SKU_FILE: &str = "sku_compliance.xlsx";
const OUTPUT_WORKBOOK: &str = "epr_analysis.xlsx";
const OUTPUT_SUMMARY: &str = "analysis_summary.json";

// Simple in-memory app state so the sheets are loaded once but the
// analysis can be rerun (e.g. for both entity types) in a single session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        sales: None,
        purchases: Vec::new(),
        skus: Vec::new(),
    })
});

struct AppState {
    sales: Option<Vec<SalesRecord>>,
    purchases: Vec<PurchaseRecord>,
    skus: Vec<SkuRecord>,
}

/// Read a single line of input after printing a prompt.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_or_default(label: &str, default: &str) -> String {
    let value = prompt(&format!("{} [{}]: ", label, default));
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn prompt_yes_no(label: &str) -> bool {
    loop {
        match prompt(&format!("{} (Y/N): ", label)).to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the declaration sheet and the optional purchase
/// and SKU sheets.
///
/// The sales file is mandatory; the other two degrade silently to empty
/// sets when absent.
fn handle_load() {
    let (sales, sales_report) = match loader::load_sales(SALES_FILE) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", SALES_FILE, e);
            return;
        }
    };
    println!(
        "Declaration sheet loaded ({} rows, {} with unrecognized category).",
        format_int(sales_report.kept_rows as i64),
        format_int(sales_report.unmatched_categories as i64)
    );

    let purchases = if Path::new(PURCHASE_FILE).exists() {
        match loader::load_purchases(PURCHASE_FILE) {
            Ok((records, purchase_report)) => {
                println!(
                    "Purchase register loaded ({} rows).",
                    format_int(purchase_report.kept_rows as i64)
                );
                records
            }
            Err(e) => {
                eprintln!("Failed to load {}: {}", PURCHASE_FILE, e);
                Vec::new()
            }
        }
    } else {
        println!("Note: no purchase register found; purchase totals will be zero.");
        Vec::new()
    };

    let skus = if Path::new(SKU_FILE).exists() {
        match loader::load_skus(SKU_FILE) {
            Ok(records) => {
                println!("SKU sheet loaded ({} rows).", format_int(records.len() as i64));
                records
            }
            Err(e) => {
                eprintln!("Failed to load {}: {}", SKU_FILE, e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    println!();
    let mut state = APP_STATE.lock().unwrap();
    state.sales = Some(sales);
    state.purchases = purchases;
    state.skus = skus;
}

/// Handle option [2]: run the reconciliation and write both outputs.
fn handle_analysis() {
    let (sales, purchases, skus) = {
        let state = APP_STATE.lock().unwrap();
        (
            state.sales.clone(),
            state.purchases.clone(),
            state.skus.clone(),
        )
    };
    let Some(sales) = sales else {
        println!("Error: no declaration sheet loaded. Please load the files first (option 1).\n");
        return;
    };

    let key = AnalysisKey {
        client: prompt_or_default("Client ID", "default"),
        facility_type: prompt_or_default("Facility type", "plant"),
        item_id: prompt_or_default("Facility item ID", "1"),
    };
    let is_producer = prompt_yes_no("Is the entity registered as a Producer?");
    println!();

    let agg = aggregate(&sales, &purchases);
    let registered = RegisteredSales::from_records(&sales);
    let variance = compute_variance(&agg);
    let targets = project_targets(&agg, is_producer, &registered);

    if let Err(e) = output::write_workbook(OUTPUT_WORKBOOK, &variance, &targets) {
        eprintln!("Write error: {}", e);
    }
    let summary = report::build_summary(
        key,
        &agg,
        &variance,
        &targets,
        &registered,
        &purchases,
        &skus,
        OUTPUT_WORKBOOK,
    );
    if let Err(e) = output::write_json(OUTPUT_SUMMARY, &summary) {
        eprintln!("Write error: {}", e);
    }

    println!("Pre/Post-Consumption Reconciliation");
    println!("(Per category, with Total row)\n");
    output::preview_table_rows(&variance.rows, variance.rows.len());
    println!(
        "Total consumption: {} TPA, total purchase: {} tons, difference: {}%\n",
        format_number(variance.total_consumption, 4),
        format_number(variance.total_purchase, 4),
        format_number(variance.difference_percent, 2)
    );

    if targets.is_empty() {
        println!("Target projection skipped: fewer than two financial years observed.\n");
    }
    for (n, table) in targets.iter().enumerate() {
        println!(
            "Target Table {} ({} / {} -> {})\n",
            n + 1,
            table.year_one,
            table.year_two,
            table.target_year
        );
        output::preview_target_table(table);
    }

    if !summary.sku_rows.is_empty() {
        println!("SKU Marking & Labelling Compliance\n");
        output::preview_table_rows(&summary.sku_rows, 10);
    }

    if summary.insights.is_empty() {
        println!("Auditor insights: no findings above thresholds.");
    } else {
        println!("Auditor insights:");
        for note in &summary.insights {
            println!("- {}", note);
        }
    }
    println!(
        "\n(Workbook exported to {}, summary to {})\n",
        OUTPUT_WORKBOOK, OUTPUT_SUMMARY
    );
}

fn main() {
    loop {
        println!("EPR Compliance Analysis");
        println!("[1] Load spreadsheets");
        println!("[2] Run analysis and generate reports\n");
        match prompt("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_analysis();
                if !prompt_yes_no("Back to menu?") {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
