use std::path::PathBuf;

use clap::Parser;
use rust_decimal::Decimal;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::services::swap::SwapIntent;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Swap tokens on Osmosis along the route suggested by the Skip API"
)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, env = "SKIPTRADE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Symbol of the token to sell
    #[arg(long = "from")]
    pub token_from: String,

    /// Symbol of the token to buy
    #[arg(long = "to")]
    pub token_to: String,

    /// Amount to sell, in display units
    #[arg(long, allow_negative_numbers = true, value_parser = parse_exact_decimal)]
    pub amount: Decimal,

    /// Let Skip split the amount across several routes
    #[arg(long, default_value_t = false)]
    pub split: bool,

    /// Restrict routing to the Osmosis pool manager
    #[arg(long, default_value_t = false)]
    pub only_osmosis: bool,

    /// Build and save the command without submitting it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Gas adjustment (overrides config)
    #[arg(long, value_parser = parse_exact_decimal)]
    pub gas_adjustment: Option<Decimal>,

    /// Fee amount in gas-token base units (overrides config)
    #[arg(long)]
    pub fees: Option<u64>,

    /// Slippage tolerance in percent (overrides config)
    #[arg(long, value_parser = parse_exact_decimal)]
    pub slippage_percent: Option<Decimal>,

    /// Abort if the route fails the slippage check
    #[arg(long, default_value_t = false)]
    pub pre_check: bool,
}

/// Rejects input `Decimal` would have to round to hold.
fn parse_exact_decimal(value: &str) -> Result<Decimal, String> {
    Decimal::from_str_exact(value.trim())
        .map_err(|err| format!("{value} is not an exact decimal amount: {err}"))
}

impl Cli {
    pub fn intent(&self) -> SwapIntent {
        SwapIntent {
            token_from: self.token_from.clone(),
            token_to: self.token_to.clone(),
            amount: self.amount,
            split_routes: self.split,
            only_osmosis: self.only_osmosis,
            dry_run: self.dry_run,
            pre_check: self.pre_check,
            gas_adjustment: self.gas_adjustment,
            fees: self.fees,
            slippage_percent: self.slippage_percent,
        }
    }
}
