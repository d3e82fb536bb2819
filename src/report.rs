// Report data assembly: reshapes analysis output into the persisted
// summary document and the auditor-facing table structures.
use crate::analysis::{Aggregates, RegisteredSales};
use crate::types::{
    Category, PurchaseRecord, PurchaseSummaryRow, SalesSummaryRow, SkuComplianceRow, SkuRecord,
    TargetTable, VarianceReport, VarianceRow,
};
use crate::util::round2;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

// Audit thresholds agreed with the regulatory audience. The exact values
// are part of the report's contract.
const CRITICAL_VARIANCE_PERCENT: f64 = 10.0;
const MIN_REGISTERED_SHARE_PERCENT: f64 = 50.0;
const MAX_UNREGISTERED_PURCHASE_PERCENT: f64 = 20.0;

/// Identity of the facility an analysis run belongs to. One summary
/// document exists per key and is overwritten wholesale on every save.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisKey {
    pub client: String,
    #[serde(rename = "type")]
    pub facility_type: String,
    pub item_id: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryBody {
    pub portal_summary: Vec<VarianceRow>,
    pub target_tables: Vec<Value>,
    pub difference_percent: f64,
    pub total_purchase: f64,
    pub total_consumption: f64,
}

/// The persisted analysis document: a materialized view, not an event log.
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    #[serde(flatten)]
    pub key: AnalysisKey,
    pub summary: SummaryBody,
    pub rows: Vec<VarianceRow>,
    pub sales_summary: Vec<SalesSummaryRow>,
    pub purchase_summary: Vec<PurchaseSummaryRow>,
    pub sku_rows: Vec<SkuComplianceRow>,
    pub insights: Vec<String>,
    pub output_file: String,
    pub last_updated: DateTime<Utc>,
}

/// Render one target table with its year-specific column names, the shape
/// the PDF template consumes.
pub fn target_table_json(table: &TargetTable) -> Value {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            obj.insert("Category".to_string(), json!(row.category));
            obj.insert(table.year_one.clone(), json!(row.year_one_qty));
            obj.insert(table.year_two.clone(), json!(row.year_two_qty));
            obj.insert("Avg".to_string(), json!(row.average));
            if let Some(offset) = row.registered_sales {
                obj.insert(
                    format!("Registered Sales ({})", table.year_two),
                    json!(offset),
                );
            }
            obj.insert(format!("Target {}", table.target_year), json!(row.target));
            Value::Object(obj)
        })
        .collect();
    json!({
        "year_one": table.year_one,
        "year_two": table.year_two,
        "target_year": table.target_year,
        "producer": table.producer,
        "rows": rows,
    })
}

pub fn sales_summary_rows(agg: &Aggregates) -> Vec<SalesSummaryRow> {
    Category::ALL
        .iter()
        .map(|cat| {
            let totals = agg.sales.get(cat).copied().unwrap_or_default();
            SalesSummaryRow {
                category: cat.label().to_string(),
                pre_consumer: totals.pre_consumer,
                post_consumer: totals.post_consumer,
                export: totals.export,
                total: totals.consumption(),
            }
        })
        .collect()
}

pub fn purchase_summary_rows(agg: &Aggregates) -> Vec<PurchaseSummaryRow> {
    Category::ALL
        .iter()
        .map(|cat| PurchaseSummaryRow {
            category: cat.label().to_string(),
            purchase: agg.purchase.get(cat).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Share of declared consumption covered by registered sales channels, as
/// a percentage.
pub fn registered_sales_share(registered: &RegisteredSales, report: &VarianceReport) -> f64 {
    if report.total_consumption > 0.0 {
        round2(registered.total() / report.total_consumption * 100.0)
    } else {
        0.0
    }
}

/// Share of purchased tonnage sourced from unregistered suppliers, as a
/// percentage.
pub fn unregistered_purchase_share(purchases: &[PurchaseRecord]) -> f64 {
    let total: f64 = purchases.iter().map(|p| p.quantity_tons).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let unregistered: f64 = purchases
        .iter()
        .filter(|p| p.registration_status.to_lowercase().contains("unregistered"))
        .map(|p| p.quantity_tons)
        .sum();
    round2(unregistered / total * 100.0)
}

/// Templated auditor-insight sentences conditioned on the audit thresholds.
pub fn auditor_insights(
    report: &VarianceReport,
    registered_share: f64,
    unregistered_purchase: f64,
) -> Vec<String> {
    let mut notes = Vec::new();
    for row in &report.rows {
        if row.category == "Total" {
            continue;
        }
        if row.difference_percent.abs() > CRITICAL_VARIANCE_PERCENT {
            notes.push(format!(
                "Critical discrepancy in {}: declared consumption deviates from purchases by {:.2}%, beyond the {:.0}% audit tolerance.",
                row.category, row.difference_percent, CRITICAL_VARIANCE_PERCENT
            ));
        }
    }
    if report.difference_percent.abs() > CRITICAL_VARIANCE_PERCENT {
        notes.push(format!(
            "Critical discrepancy overall: total consumption deviates from total purchases by {:.2}%.",
            report.difference_percent
        ));
    }
    if registered_share < MIN_REGISTERED_SHARE_PERCENT {
        notes.push(format!(
            "Warning: only {:.2}% of declared sales volume is routed through registered channels; at least {:.0}% coverage is expected.",
            registered_share, MIN_REGISTERED_SHARE_PERCENT
        ));
    }
    if unregistered_purchase > MAX_UNREGISTERED_PURCHASE_PERCENT {
        notes.push(format!(
            "Risk: {:.2}% of purchased plastic originates from unregistered suppliers, above the {:.0}% risk threshold.",
            unregistered_purchase, MAX_UNREGISTERED_PURCHASE_PERCENT
        ));
    }
    notes
}

fn normalize_status(raw: &str) -> &'static str {
    let t = raw.trim().to_ascii_lowercase();
    if t.is_empty() {
        return "Not Provided";
    }
    if t.contains("non") || t == "no" || t == "n" {
        return "Non-Compliant";
    }
    if t == "yes" || t == "y" || t.contains("compliant") || t.contains("done") {
        return "Compliant";
    }
    "Non-Compliant"
}

/// Reshape raw per-SKU marking/labelling records into report rows with a
/// combined compliance status.
pub fn sku_compliance_rows(records: &[SkuRecord]) -> Vec<SkuComplianceRow> {
    records
        .iter()
        .map(|record| {
            let marking = normalize_status(&record.marking_status);
            let labelling = normalize_status(&record.labelling_status);
            let status = if marking == "Compliant" && labelling == "Compliant" {
                "Compliant"
            } else if marking == "Not Provided" || labelling == "Not Provided" {
                "Incomplete"
            } else {
                "Non-Compliant"
            };
            SkuComplianceRow {
                sku: record.sku.clone(),
                description: record.description.clone(),
                marking: marking.to_string(),
                labelling: labelling.to_string(),
                status: status.to_string(),
            }
        })
        .collect()
}

/// Assemble the full persisted document for one analysis run.
#[allow(clippy::too_many_arguments)]
pub fn build_summary(
    key: AnalysisKey,
    agg: &Aggregates,
    variance: &VarianceReport,
    targets: &[TargetTable],
    registered: &RegisteredSales,
    purchases: &[PurchaseRecord],
    skus: &[SkuRecord],
    output_file: &str,
) -> AnalysisSummary {
    let registered_share = registered_sales_share(registered, variance);
    let unregistered_purchase = unregistered_purchase_share(purchases);
    let insights = auditor_insights(variance, registered_share, unregistered_purchase);
    AnalysisSummary {
        key,
        summary: SummaryBody {
            portal_summary: variance.rows.clone(),
            target_tables: targets.iter().map(target_table_json).collect(),
            difference_percent: variance.difference_percent,
            total_purchase: variance.total_purchase,
            total_consumption: variance.total_consumption,
        },
        rows: variance.rows.clone(),
        sales_summary: sales_summary_rows(agg),
        purchase_summary: purchase_summary_rows(agg),
        sku_rows: sku_compliance_rows(skus),
        insights,
        output_file: output_file.to_string(),
        last_updated: Utc::now(),
    }
}
