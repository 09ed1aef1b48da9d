//! Seller listing quotes: how an asking price compares with the valuation

use serde::{Deserialize, Serialize};

use super::pricing::ValuationResult;
use super::returns::{IrrAnalysis, ReturnAnalyzer};
use crate::assumptions::MarketAssumptions;
use crate::error::Result;
use crate::policy::PolicyRecord;

/// Seller-side view of a listing at a given asking price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingQuote {
    pub asking_price: f64,
    /// Marketplace fee charged to the seller on the asking price
    pub platform_fee: f64,
    /// What the seller receives after the fee
    pub seller_net: f64,
    /// asking_price - surrender_value
    pub premium_over_surrender: f64,
    /// asking_price / recommended_price
    pub asking_to_recommended: f64,
    /// Asking at or below surrender value leaves the seller worse off than surrendering
    pub below_surrender: bool,
    /// Buyer returns if the listing sells at the asking price
    pub buyer_returns: IrrAnalysis,
}

/// Quote a seller's asking price against a completed valuation
pub fn quote_listing(
    policy: &PolicyRecord,
    valuation: &ValuationResult,
    asking_price: f64,
    assumptions: &MarketAssumptions,
) -> Result<ListingQuote> {
    let buyer_returns =
        ReturnAnalyzer::analyze(policy, &valuation.cash_flows, asking_price, assumptions)?;

    let platform_fee = asking_price * assumptions.platform_fee_rate;
    let below_surrender = asking_price <= valuation.surrender_value;
    if below_surrender {
        log::warn!(
            "asking price {:.2} is at or below surrender value {:.2}",
            asking_price,
            valuation.surrender_value
        );
    }

    Ok(ListingQuote {
        asking_price,
        platform_fee,
        seller_net: asking_price - platform_fee,
        premium_over_surrender: asking_price - valuation.surrender_value,
        asking_to_recommended: asking_price / valuation.recommended_price,
        below_surrender,
        buyer_returns,
    })
}
