// Pre/post-consumption reconciliation and target projection.
//
// Everything here is a pure function over in-memory records: aggregates are
// rebuilt wholesale on every run, never mutated incrementally.
use crate::normalize::{normalize_category, normalize_purchase_category};
use crate::types::{
    Category, PurchaseRecord, SalesRecord, TargetRow, TargetTable, VarianceReport, VarianceRow,
};
use crate::util::{next_financial_year, round2, round4};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default)]
pub struct SalesTotals {
    pub pre_consumer: f64,
    pub post_consumer: f64,
    pub export: f64,
}

impl SalesTotals {
    pub fn consumption(&self) -> f64 {
        self.pre_consumer + self.post_consumer + self.export
    }
}

/// Per-category totals for one analysis run.
///
/// `yearly` holds the sales row totals keyed by the raw year string and is
/// the input to target projection; rows without a year are still counted in
/// the flat `sales` totals but excluded from `yearly`.
#[derive(Debug, Default, Clone)]
pub struct Aggregates {
    pub sales: BTreeMap<Category, SalesTotals>,
    pub purchase: BTreeMap<Category, f64>,
    pub yearly: BTreeMap<Category, BTreeMap<String, f64>>,
}

/// Bucket sales and purchase rows by canonical category.
///
/// Rows whose label matches no bucket are silently discarded. All four
/// categories are pre-seeded so downstream tables always have exactly four
/// category rows, observed or not.
pub fn aggregate(sales: &[SalesRecord], purchases: &[PurchaseRecord]) -> Aggregates {
    let mut agg = Aggregates::default();
    for cat in Category::ALL {
        agg.sales.insert(cat, SalesTotals::default());
        agg.purchase.insert(cat, 0.0);
        agg.yearly.insert(cat, BTreeMap::new());
    }

    for record in sales {
        let Some(cat) = normalize_category(&record.category) else {
            continue;
        };
        let totals = agg.sales.entry(cat).or_default();
        totals.pre_consumer += record.pre_consumer_qty;
        totals.post_consumer += record.post_consumer_qty;
        totals.export += record.export_qty;

        let year = record.year.trim();
        if !year.is_empty() {
            *agg.yearly
                .entry(cat)
                .or_default()
                .entry(year.to_string())
                .or_insert(0.0) += record.row_total();
        }
    }

    for record in purchases {
        let Some(cat) = normalize_purchase_category(&record.category) else {
            continue;
        };
        *agg.purchase.entry(cat).or_insert(0.0) += record.quantity_tons;
    }

    agg
}

// Zero purchase means zero difference, not infinity; the report must never
// carry a NaN.
fn difference_percent(consumption: f64, purchase: f64) -> f64 {
    if purchase > 0.0 {
        (consumption / purchase - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Merge sales consumption against purchases per category and append the
/// synthetic "Total" row.
///
/// The total row's difference percent is recomputed from the summed
/// columns; averaging the per-category percentages would be wrong whenever
/// purchase magnitudes differ.
pub fn compute_variance(agg: &Aggregates) -> VarianceReport {
    let mut rows = Vec::with_capacity(Category::ALL.len() + 1);
    let mut sum = SalesTotals::default();
    let mut sum_purchase = 0.0;

    for cat in Category::ALL {
        let totals = agg.sales.get(&cat).copied().unwrap_or_default();
        let purchase = agg.purchase.get(&cat).copied().unwrap_or(0.0);
        let consumption = totals.consumption();
        rows.push(VarianceRow {
            category: cat.label().to_string(),
            pre_consumer: round4(totals.pre_consumer),
            post_consumer: round4(totals.post_consumer),
            export: round4(totals.export),
            total_consumption: round4(consumption),
            purchase: round4(purchase),
            difference_percent: round2(difference_percent(consumption, purchase)),
        });
        sum.pre_consumer += totals.pre_consumer;
        sum.post_consumer += totals.post_consumer;
        sum.export += totals.export;
        sum_purchase += purchase;
    }

    let total_consumption = sum.consumption();
    let total_difference = round2(difference_percent(total_consumption, sum_purchase));
    rows.push(VarianceRow {
        category: "Total".to_string(),
        pre_consumer: round4(sum.pre_consumer),
        post_consumer: round4(sum.post_consumer),
        export: round4(sum.export),
        total_consumption: round4(total_consumption),
        purchase: round4(sum_purchase),
        difference_percent: total_difference,
    });

    VarianceReport {
        rows,
        total_consumption: round4(total_consumption),
        total_purchase: round4(sum_purchase),
        difference_percent: total_difference,
    }
}

/// Registered-sales totals per (category, year), built from declaration
/// rows whose registration-type text contains "registered" but not
/// "unregistered".
///
/// Producers net these volumes out of their projected targets because they
/// are already reported under registered-sale schemes.
#[derive(Debug, Default, Clone)]
pub struct RegisteredSales {
    totals: BTreeMap<(Category, String), f64>,
}

impl RegisteredSales {
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let mut totals: BTreeMap<(Category, String), f64> = BTreeMap::new();
        for record in records {
            let kind = record.registration_type.to_lowercase();
            if !kind.contains("registered") || kind.contains("unregistered") {
                continue;
            }
            let Some(cat) = normalize_category(&record.category) else {
                continue;
            };
            let year = record.year.trim();
            if year.is_empty() {
                continue;
            }
            *totals.entry((cat, year.to_string())).or_insert(0.0) += record.row_total();
        }
        RegisteredSales { totals }
    }

    pub fn lookup(&self, category: Category, year: &str) -> f64 {
        self.totals
            .get(&(category, year.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }
}

/// Project forward targets from two-year rolling averages.
///
/// One table is produced per consecutive pair of observed years; fewer than
/// two distinct years yields no tables. Years are compared as plain
/// strings, which is only correct while every year shares the `YYYY-YY`
/// shape (kept as-is for compatibility with existing reports).
pub fn project_targets(
    agg: &Aggregates,
    is_producer: bool,
    registered: &RegisteredSales,
) -> Vec<TargetTable> {
    let years: Vec<String> = agg
        .yearly
        .values()
        .flat_map(|by_year| by_year.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if years.len() < 2 {
        return Vec::new();
    }

    let mut tables = Vec::with_capacity(years.len() - 1);
    for i in 0..years.len() - 1 {
        let year_one = &years[i];
        let year_two = &years[i + 1];
        let target_year = years
            .get(i + 2)
            .cloned()
            .unwrap_or_else(|| next_financial_year(year_two));

        let mut rows = Vec::with_capacity(Category::ALL.len());
        for cat in Category::ALL {
            let by_year = agg.yearly.get(&cat);
            let v1 = by_year.and_then(|m| m.get(year_one)).copied().unwrap_or(0.0);
            let v2 = by_year.and_then(|m| m.get(year_two)).copied().unwrap_or(0.0);
            let average = (v1 + v2) / 2.0;
            let (registered_sales, target) = if is_producer {
                let offset = registered.lookup(cat, year_two);
                (Some(round4(offset)), average - offset)
            } else {
                (None, average)
            };
            rows.push(TargetRow {
                category: cat.label().to_string(),
                year_one_qty: round4(v1),
                year_two_qty: round4(v2),
                average: round4(average),
                registered_sales,
                target: round4(target),
            });
        }
        tables.push(TargetTable {
            year_one: year_one.clone(),
            year_two: year_two.clone(),
            target_year,
            producer: is_producer,
            rows,
        });
    }
    tables
}
