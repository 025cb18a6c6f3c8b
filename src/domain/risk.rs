//! Position sizing and risk/reward helpers.

use serde::Serialize;

use super::error::MarketlabError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSize {
    pub quantity: f64,
    pub total_cost: f64,
    pub risk_amount: f64,
    pub risk_per_share: f64,
    pub account_risk_pct: f64,
}

/// Shares to buy so that a fill at the stop loses exactly `risk_pct` of the
/// account.
pub fn position_size(
    account_value: f64,
    risk_pct: f64,
    entry_price: f64,
    stop_loss_price: f64,
) -> Result<PositionSize, MarketlabError> {
    if account_value <= 0.0 {
        return Err(MarketlabError::invalid_input(
            "account value must be positive",
        ));
    }
    if risk_pct <= 0.0 {
        return Err(MarketlabError::invalid_input(
            "risk percentage must be positive",
        ));
    }
    if entry_price <= 0.0 {
        return Err(MarketlabError::invalid_input("entry price must be positive"));
    }
    let risk_per_share = (entry_price - stop_loss_price).abs();
    if risk_per_share == 0.0 {
        return Err(MarketlabError::invalid_input(
            "entry price and stop-loss price must differ",
        ));
    }

    let risk_amount = account_value * risk_pct / 100.0;
    let quantity = risk_amount / risk_per_share;
    Ok(PositionSize {
        quantity,
        total_cost: quantity * entry_price,
        risk_amount,
        risk_per_share,
        account_risk_pct: risk_pct,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReward {
    pub risk: f64,
    pub reward: f64,
    pub risk_reward_ratio: f64,
    pub risk_pct: f64,
    pub reward_pct: f64,
}

/// Reward per unit of risk for a planned entry/stop/target triple.
pub fn risk_reward(
    entry_price: f64,
    stop_loss_price: f64,
    take_profit_price: f64,
) -> Result<RiskReward, MarketlabError> {
    if entry_price <= 0.0 {
        return Err(MarketlabError::invalid_input("entry price must be positive"));
    }
    let risk = (entry_price - stop_loss_price).abs();
    let reward = (take_profit_price - entry_price).abs();
    if risk == 0.0 {
        return Err(MarketlabError::invalid_input(
            "entry price and stop-loss price must differ",
        ));
    }

    Ok(RiskReward {
        risk,
        reward,
        risk_reward_ratio: reward / risk,
        risk_pct: risk / entry_price * 100.0,
        reward_pct: reward / entry_price * 100.0,
    })
}
