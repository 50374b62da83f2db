//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::domain::{LiquidityStatus, OpportunitiesSnapshot, OpportunityKind};

#[derive(Debug, Parser)]
#[command(
    name = "spreadhawk",
    version,
    about = "Cross-venue prediction market arbitrage scanner"
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scan tick and print the snapshot.
    Scan,
    /// Scan continuously at the configured poll interval.
    Watch,
    /// Run the real-time streaming engine.
    Stream,
}

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Spread %")]
    spread_pct: String,
    #[tabled(rename = "Max profit $")]
    max_profit: String,
    #[tabled(rename = "Liquidity")]
    liquidity: String,
    #[tabled(rename = "Action")]
    action: String,
}

/// Render the snapshot as a table.
#[must_use]
pub fn render_snapshot(snapshot: &OpportunitiesSnapshot) -> String {
    if snapshot.opportunities.is_empty() {
        return "No opportunities found.".to_string();
    }

    let rows: Vec<OpportunityRow> = snapshot
        .opportunities
        .iter()
        .map(|opp| OpportunityRow {
            market: truncate(&opp.event_name, 40),
            kind: match opp.kind {
                OpportunityKind::Guaranteed => "guaranteed".green().to_string(),
                _ => "spread".yellow().to_string(),
            },
            spread_pct: format!("{:.2}", opp.spread_pct),
            max_profit: if opp.potential_profit > Decimal::ZERO {
                format!("{:.2}", opp.potential_profit)
            } else {
                "-".to_string()
            },
            liquidity: match opp.liquidity.status {
                LiquidityStatus::Available => "available".to_string(),
                LiquidityStatus::SpreadClosed => "closed".red().to_string(),
                LiquidityStatus::NoLiquidity => "none".red().to_string(),
                LiquidityStatus::NotAnalyzed => "-".to_string(),
            },
            action: truncate(&opp.action, 44),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!(
        "{table}\n{} opportunities, scanned at {}",
        snapshot.total_count, snapshot.scanned_at
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OpportunitiesSnapshot;

    #[test]
    fn empty_snapshot_renders_placeholder() {
        let snapshot = OpportunitiesSnapshot::from_opportunities(vec![]);
        assert_eq!(render_snapshot(&snapshot), "No opportunities found.");
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        let long = truncate("a-much-longer-string-than-allowed", 10);
        assert_eq!(long.chars().count(), 10);
        assert!(long.ends_with('…'));
    }
}
