use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// The four canonical plastic-packaging categories of the EPR regime.
///
/// Every free-text label from an uploaded sheet either maps onto exactly one
/// of these buckets or is dropped from the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "Cat-I")]
    CatI,
    #[serde(rename = "Cat-II")]
    CatII,
    #[serde(rename = "Cat-III")]
    CatIII,
    #[serde(rename = "Cat-IV")]
    CatIV,
}

impl Category {
    /// All categories in regulatory order. Aggregates are pre-seeded from
    /// this list so reports always carry exactly four category rows.
    pub const ALL: [Category; 4] = [
        Category::CatI,
        Category::CatII,
        Category::CatIII,
        Category::CatIV,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::CatI => "Cat-I",
            Category::CatII => "Cat-II",
            Category::CatIII => "Cat-III",
            Category::CatIV => "Cat-IV",
        }
    }

    /// Map an uppercase Roman-numeral token onto a category.
    pub fn from_numeral(numeral: &str) -> Option<Category> {
        match numeral {
            "I" => Some(Category::CatI),
            "II" => Some(Category::CatII),
            "III" => Some(Category::CatIII),
            "IV" => Some(Category::CatIV),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the uploaded sales/declaration sheet. Ephemeral: lives only
/// for the duration of a single analysis run, never persisted verbatim.
#[derive(Debug, Clone, Default)]
pub struct SalesRecord {
    pub category: String,
    pub year: String,
    pub pre_consumer_qty: f64,
    pub post_consumer_qty: f64,
    pub export_qty: f64,
    pub registration_type: String,
}

impl SalesRecord {
    pub fn row_total(&self) -> f64 {
        self.pre_consumer_qty + self.post_consumer_qty + self.export_qty
    }
}

/// One row of the optional purchase-register sheet.
#[derive(Debug, Clone, Default)]
pub struct PurchaseRecord {
    pub category: String,
    pub quantity_tons: f64,
    pub registration_status: String,
}

/// One row of the optional per-SKU marking/labelling sheet.
#[derive(Debug, Clone, Default)]
pub struct SkuRecord {
    pub sku: String,
    pub description: String,
    pub marking_status: String,
    pub labelling_status: String,
}

/// One line of the purchase-vs-consumption variance table, plus the
/// synthetic "Total" row appended at the end.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VarianceRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Pre Consumer (TPA)")]
    #[tabled(rename = "Pre Consumer (TPA)")]
    pub pre_consumer: f64,
    #[serde(rename = "Post Consumer (TPA)")]
    #[tabled(rename = "Post Consumer (TPA)")]
    pub post_consumer: f64,
    #[serde(rename = "Export (TPA)")]
    #[tabled(rename = "Export (TPA)")]
    pub export: f64,
    #[serde(rename = "Total Consumption (TPA)")]
    #[tabled(rename = "Total Consumption (TPA)")]
    pub total_consumption: f64,
    #[serde(rename = "Purchase (Tons)")]
    #[tabled(rename = "Purchase (Tons)")]
    pub purchase: f64,
    #[serde(rename = "Difference (%)")]
    #[tabled(rename = "Difference (%)")]
    pub difference_percent: f64,
}

/// The full variance table together with its grand totals. The totals are
/// recomputed from the summed columns, never averaged from the per-category
/// percentages.
#[derive(Debug, Clone)]
pub struct VarianceReport {
    pub rows: Vec<VarianceRow>,
    pub total_consumption: f64,
    pub total_purchase: f64,
    pub difference_percent: f64,
}

/// Projection line for a single category within one [`TargetTable`].
///
/// `registered_sales` is populated only for Producer entities; for brand
/// owners and importers the offset column does not exist at all.
#[derive(Debug, Clone)]
pub struct TargetRow {
    pub category: String,
    pub year_one_qty: f64,
    pub year_two_qty: f64,
    pub average: f64,
    pub registered_sales: Option<f64>,
    pub target: f64,
}

/// Forward target projection for one consecutive pair of observed financial
/// years. When more than two distinct years are present, one table exists
/// per pair.
#[derive(Debug, Clone)]
pub struct TargetTable {
    pub year_one: String,
    pub year_two: String,
    pub target_year: String,
    pub producer: bool,
    pub rows: Vec<TargetRow>,
}

/// Per-category sales totals, previewed on load and embedded in the
/// persisted summary.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SalesSummaryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Pre Consumer (TPA)")]
    #[tabled(rename = "Pre Consumer (TPA)")]
    pub pre_consumer: f64,
    #[serde(rename = "Post Consumer (TPA)")]
    #[tabled(rename = "Post Consumer (TPA)")]
    pub post_consumer: f64,
    #[serde(rename = "Export (TPA)")]
    #[tabled(rename = "Export (TPA)")]
    pub export: f64,
    #[serde(rename = "Total (TPA)")]
    #[tabled(rename = "Total (TPA)")]
    pub total: f64,
}

/// Per-category purchase totals.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PurchaseSummaryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Purchase (Tons)")]
    #[tabled(rename = "Purchase (Tons)")]
    pub purchase: f64,
}

/// Reshaped per-SKU compliance line for the audit report.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SkuComplianceRow {
    #[serde(rename = "SKU")]
    #[tabled(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Description")]
    #[tabled(rename = "Description")]
    pub description: String,
    #[serde(rename = "Marking")]
    #[tabled(rename = "Marking")]
    pub marking: String,
    #[serde(rename = "Labelling")]
    #[tabled(rename = "Labelling")]
    pub labelling: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}
