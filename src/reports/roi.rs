use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;

use crate::allocation::{Allocation, LogEntry};
use crate::error::{AllocationError, Result};
use crate::models::AllocationKey;
use crate::valuation::ValuationIndex;

/// Final value and return of one allocation key
#[derive(Debug, Clone, PartialEq)]
pub struct PositionResult {
    pub key: AllocationKey,
    pub first_deposit_date: Option<NaiveDate>,
    pub total_investment: Decimal,
    pub total_withdrawal: Decimal,
    pub weighted_share: Decimal,
    pub share_percentage: Decimal,
    pub final_asset_value: Decimal,
    pub roi: Decimal, // Percentage, signed
    /// Ascending by date
    pub transaction_log: Vec<LogEntry>,
}

#[derive(Debug, Clone)]
pub struct RoiReport {
    pub final_value: Decimal,
    pub total_weight: Decimal,
    pub positions: Vec<PositionResult>,
}

impl RoiReport {
    /// Results grouped by investor, then round code
    pub fn by_investor(&self) -> BTreeMap<&str, BTreeMap<&str, &PositionResult>> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, &PositionResult>> = BTreeMap::new();
        for p in &self.positions {
            grouped
                .entry(p.key.investor.as_str())
                .or_default()
                .insert(p.key.round_code.as_str(), p);
        }
        grouped
    }

    pub fn total_share_percentage(&self) -> Decimal {
        self.positions.iter().map(|p| p.share_percentage).sum()
    }

    pub fn total_final_asset_value(&self) -> Decimal {
        self.positions.iter().map(|p| p.final_asset_value).sum()
    }
}

/// Distribute the final account value by weighted share and derive each key's ROI.
///
/// ROI = (final value - invested + withdrawn) / invested * 100
pub fn calculate_roi(allocation: &Allocation, valuations: &ValuationIndex) -> Result<RoiReport> {
    let final_value = valuations.final_value();
    info!("Final account value: {:.2}", final_value);

    if let Some((key, _)) = allocation
        .positions
        .iter()
        .find(|(_, s)| s.total_investment.is_zero())
    {
        return Err(AllocationError::ZeroInvestment { key: key.clone() });
    }

    let total_weight = allocation.total_weight();
    if !allocation.positions.is_empty() && total_weight <= Decimal::ZERO {
        return Err(AllocationError::AllocationInvariantViolation {
            detail: format!("weighted shares sum to {}", total_weight),
        });
    }

    let hundred = Decimal::ONE_HUNDRED;
    let positions = allocation
        .positions
        .iter()
        .map(|(key, state)| {
            let proportional_share = state.weighted_share / total_weight;
            let final_asset_value = proportional_share * final_value;
            let roi = (final_asset_value - state.total_investment + state.total_withdrawal)
                / state.total_investment
                * hundred;

            PositionResult {
                key: key.clone(),
                first_deposit_date: state.first_deposit_date,
                total_investment: state.total_investment,
                total_withdrawal: state.total_withdrawal,
                weighted_share: state.weighted_share,
                share_percentage: proportional_share * hundred,
                final_asset_value,
                roi,
                transaction_log: allocation.log.sorted(key),
            }
        })
        .collect::<Vec<_>>();

    info!(
        "Calculated ROI for {} investor-round combinations",
        positions.len()
    );

    Ok(RoiReport {
        final_value,
        total_weight,
        positions,
    })
}
