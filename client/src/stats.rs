use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::BotStatistic;

/// Totals across every bot's statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_deposit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit: Decimal,
    pub total_cycles: u64,
    /// Total profit over total deposit, in percent (0 with no deposit)
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_profit_percentage: Decimal,
    pub profitable_bots: usize,
    pub active_bots: usize,
}

impl StatsSummary {
    pub fn from_statistics(stats: &[BotStatistic]) -> Self {
        let total_deposit: Decimal = stats.iter().map(|s| s.deposit_usdt).sum();
        let total_profit: Decimal = stats.iter().map(|s| s.profit_usdt).sum();
        let total_cycles = stats.iter().map(|s| s.cycles_completed).sum();

        let avg_profit_percentage = if total_deposit > Decimal::ZERO {
            (total_profit / total_deposit * Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Self {
            total_deposit,
            total_profit,
            total_cycles,
            avg_profit_percentage,
            profitable_bots: stats.iter().filter(|s| s.profit_usdt > Decimal::ZERO).count(),
            active_bots: stats.len(),
        }
    }
}
