//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use poolshare::allocation::DateWeights;
use poolshare::reports::RoiReport;
use poolshare::utils::{format_amount, format_currency, format_percentage, format_weight};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

#[derive(Serialize)]
struct JsonLogEntry {
    #[serde(rename = "type")]
    flow_type: &'static str,
    amount: String,
    date: String,
    transaction_id: String,
}

#[derive(Serialize)]
struct JsonPosition {
    first_deposit_date: Option<String>,
    total_investment: String,
    share_percentage: String,
    final_asset_value: String,
    roi: String,
    transaction_log: Vec<JsonLogEntry>,
}

fn dollars(value: Decimal) -> String {
    format!("${}", format_amount(value))
}

/// Format an ROI report as investor → round → result JSON
pub fn format_report_json(report: &RoiReport) -> String {
    let mut investors: BTreeMap<&str, BTreeMap<&str, JsonPosition>> = BTreeMap::new();

    for (investor, rounds) in report.by_investor() {
        let entry = investors.entry(investor).or_default();
        for (round, p) in rounds {
            let transaction_log = p
                .transaction_log
                .iter()
                .map(|e| JsonLogEntry {
                    flow_type: e.flow_type.as_str(),
                    amount: format_amount(e.amount),
                    date: e.date.format("%Y-%m-%d").to_string(),
                    transaction_id: e.transaction_id.clone(),
                })
                .collect();

            entry.insert(
                round,
                JsonPosition {
                    first_deposit_date: p
                        .first_deposit_date
                        .map(|d| d.format("%Y-%m-%d").to_string()),
                    total_investment: dollars(p.total_investment),
                    share_percentage: format_percentage(p.share_percentage),
                    final_asset_value: dollars(p.final_asset_value),
                    roi: format_percentage(p.roi),
                    transaction_log,
                },
            );
        }
    }

    serde_json::to_string_pretty(&investors)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format an ROI report for terminal table output
pub fn format_report_table(report: &RoiReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{} Pool Allocation\n\n", "📊".cyan().bold()));

    #[derive(Tabled)]
    struct PositionRow {
        #[tabled(rename = "Investor")]
        investor: String,
        #[tabled(rename = "Round")]
        round: String,
        #[tabled(rename = "First Deposit")]
        first_deposit: String,
        #[tabled(rename = "Invested")]
        invested: String,
        #[tabled(rename = "Withdrawn")]
        withdrawn: String,
        #[tabled(rename = "Share")]
        share: String,
        #[tabled(rename = "Final Value")]
        final_value: String,
        #[tabled(rename = "ROI")]
        roi: String,
    }

    let rows: Vec<PositionRow> = report
        .positions
        .iter()
        .map(|p| {
            let roi = format_percentage(p.roi);
            let roi = if p.roi >= Decimal::ZERO {
                roi.green().to_string()
            } else {
                roi.red().to_string()
            };

            PositionRow {
                investor: p.key.investor.clone(),
                round: p.key.round_code.clone(),
                first_deposit: p
                    .first_deposit_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                invested: format_currency(p.total_investment),
                withdrawn: format_currency(p.total_withdrawal),
                share: format_percentage(p.share_percentage),
                final_value: format_currency(p.final_asset_value),
                roi,
            }
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    // Right-align all columns except Investor (0), Round (1) and First Deposit (2)
    table.modify(Columns::new(3..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{} Summary", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Final Account Value:".bold(),
        format_currency(report.final_value)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Total Share:".bold(),
        format_percentage(report.total_share_percentage())
    ));
    output.push_str(&format!(
        "\n{:<24} {}\n",
        "Total Distributed:".bold(),
        format_currency(report.total_final_asset_value())
    ));

    output
}

/// Format date-level weights for terminal table output
pub fn format_weights_table(weights: &DateWeights) -> String {
    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Deposits")]
        deposits: String,
        #[tabled(rename = "Pool Value Before")]
        start_value: String,
        #[tabled(rename = "Weight")]
        weight: String,
    }

    let rows: Vec<WeightRow> = weights
        .iter()
        .map(|w| WeightRow {
            date: w.date.format("%Y-%m-%d").to_string(),
            deposits: format_currency(w.total_deposit),
            start_value: format_currency(w.start_value),
            weight: format_weight(w.weight),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    format!(
        "\n{} Deposit Date Weights\n\n{}\n\n{:<16} {}\n",
        "📅".cyan().bold(),
        table,
        "Total Weight:".bold(),
        format_weight(weights.total())
    )
}

/// Format date-level weights as a JSON array
pub fn format_weights_json(weights: &DateWeights) -> String {
    #[derive(Serialize)]
    struct JsonWeight {
        date: String,
        total_deposit: String,
        start_value: String,
        weight: String,
    }

    let rows: Vec<JsonWeight> = weights
        .iter()
        .map(|w| JsonWeight {
            date: w.date.format("%Y-%m-%d").to_string(),
            total_deposit: format_amount(w.total_deposit),
            start_value: format_amount(w.start_value),
            weight: format_weight(w.weight),
        })
        .collect();

    serde_json::to_string_pretty(&rows)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format empty ledger message
pub fn format_empty_report() -> String {
    format!(
        "{} No deposits or withdrawals found\nCheck the transaction file passed with: {} report --transactions <file>\n",
        "ℹ".blue().bold(),
        "poolshare".bold()
    )
}
