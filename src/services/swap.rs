//! One swap, end to end: resolve symbols, convert the amount, ask Skip for a
//! route, apply the slippage floor, build the `osmosisd` command, run it and
//! notify on success.

mod error;
pub use error::{SwapError, SwapErrorKind};

use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::models::messages::SwapRequest;
use crate::models::tokens::{TokenDescriptor, TokenRegistry};
use crate::services::command::{
    build_swap_command, sender_identity, SubmissionParams, SwapAmounts, SwapCommand,
};
use crate::services::executor::{ExecutionOutcome, Executor};
use crate::services::notify::{Notifier, SwapSummary};
use crate::services::route::RouteResolver;
use crate::services::slippage::{check_slippage, SlippageDecision};
use crate::services::units::{format_display, to_base_units, to_display_units};

/// Per-run inputs from the command line. `None` falls back to the config.
#[derive(Debug, Clone, Default)]
pub struct SwapIntent {
    pub token_from: String,
    pub token_to: String,
    pub amount: Decimal,
    pub split_routes: bool,
    pub only_osmosis: bool,
    pub dry_run: bool,
    pub pre_check: bool,
    pub gas_adjustment: Option<Decimal>,
    pub fees: Option<u64>,
    pub slippage_percent: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct SwapReport {
    pub token_from: String,
    pub token_to: String,
    pub amount_in: Decimal,
    pub amount_in_base: BigUint,
    pub estimated_amount_out: Decimal,
    pub estimated_amount_out_base: BigUint,
    pub minimum_amount_out: BigUint,
    pub pool_ids: Vec<String>,
    pub command: SwapCommand,
    pub outcome: ExecutionOutcome,
    pub notified: bool,
}

pub async fn run_swap(
    config: &AppConfig,
    registry: &TokenRegistry,
    resolver: &dyn RouteResolver,
    notifier: &dyn Notifier,
    intent: &SwapIntent,
) -> Result<SwapReport, SwapError> {
    let (from, to) = resolve_tokens(registry, &intent.token_from, &intent.token_to)?;

    let slippage_percent = intent.slippage_percent.unwrap_or(config.slippage_percent);
    let gas_adjustment = intent.gas_adjustment.unwrap_or(config.gas_adjustment);
    let fees = intent.fees.unwrap_or(config.fees);
    if gas_adjustment <= Decimal::ZERO {
        return Err(SwapError::invalid("gas adjustment must be > 0"));
    }

    let amount_in_base = to_base_units(intent.amount, from.divisor)
        .map_err(|err| SwapError::invalid(format!("Invalid amount: {err}")))?;
    if amount_in_base.is_zero() {
        return Err(SwapError::invalid(format!(
            "Amount {} {} is below one base unit",
            intent.amount, from.symbol
        )));
    }

    let mut request = SwapRequest::new(&amount_in_base, &from.denom, &to.denom, &config.chain_id)
        .with_split_routes(intent.split_routes);
    if intent.only_osmosis {
        request = request.only_osmosis();
    }

    let route = resolver.resolve_route(&request).await.ok_or_else(|| {
        SwapError::route_unavailable(format!(
            "No route found from {} to {}",
            from.symbol, to.symbol
        ))
    })?;

    let estimated_amount_out = to_display_units(&route.estimated_amount_out, to.divisor)
        .map_err(|err| SwapError::route_unavailable(format!("Unusable route estimate: {err}")))?;
    info!(
        event = "route_summary",
        from = from.symbol.as_str(),
        to = to.symbol.as_str(),
        amount_in = %intent.amount,
        estimated_amount_out = %format_display(estimated_amount_out, 6),
        "Optimal route from {} to {}",
        from.symbol,
        to.symbol
    );

    let decision = check_slippage(
        &route.estimated_amount_out,
        slippage_percent,
        route.price_impact_percent,
    )
    .map_err(|err| SwapError::invalid(err.to_string()))?;
    if let SlippageDecision::Reject { reason, .. } = &decision {
        if intent.pre_check {
            warn!(
                event = "pre_check_failed",
                from = from.symbol.as_str(),
                to = to.symbol.as_str(),
                reason = reason.as_str(),
                "Pre-check failed"
            );
            return Err(SwapError::slippage_rejected(format!(
                "Pre-check failed: {reason}"
            )));
        }
        warn!(
            reason = reason.as_str(),
            "Slippage check would reject this route; continuing without --pre-check"
        );
    }
    let minimum_amount_out = decision.minimum_output().clone();

    let params = SubmissionParams {
        program: config.chain_binary.clone(),
        sender: sender_identity(&config.account, intent.dry_run).to_string(),
        chain_id: config.chain_id.clone(),
        gas_adjustment,
        fees,
        gas_token: config.gas_token.clone(),
        node: config.node.clone(),
        keyring_backend: config.keyring_backend.clone(),
    };
    let amounts = SwapAmounts {
        token_in_amount: amount_in_base.clone(),
        token_out_minimum: minimum_amount_out.clone(),
    };
    let built = build_swap_command(&route, &amounts, &params).ok_or_else(|| {
        SwapError::command_build(format!(
            "Route from {} to {} has no executable swap operation",
            from.symbol, to.symbol
        ))
    })?;
    if built.token_in_denom != from.denom {
        warn!(
            expected = from.denom.as_str(),
            route = built.token_in_denom.as_str(),
            "First hop input denom differs from requested denom"
        );
    }
    info!(
        event = "command_built",
        pools = %built.pool_ids.join(" -> "),
        denoms = %built.denom_path.join(","),
        minimum_amount_out = %minimum_amount_out,
        "Swap command built"
    );

    let executor = Executor::new(
        config.command_output_path.clone(),
        intent.dry_run,
        config.chain_client_timeout,
    );
    let outcome = executor
        .execute(&built.command, &config.account.password)
        .await;

    let notified = if outcome.tx_hash.is_some() {
        let summary = SwapSummary {
            token_from: from.symbol.clone(),
            token_to: to.symbol.clone(),
            amount_in: intent.amount,
            estimated_amount_out,
            pool_ids: built.pool_ids.clone(),
            sender: config.account.address.clone(),
        };
        notifier.notify(&outcome, &summary).await
    } else {
        false
    };

    Ok(SwapReport {
        token_from: from.symbol,
        token_to: to.symbol,
        amount_in: intent.amount,
        amount_in_base,
        estimated_amount_out,
        estimated_amount_out_base: route.estimated_amount_out,
        minimum_amount_out,
        pool_ids: built.pool_ids,
        command: built.command,
        outcome,
        notified,
    })
}

fn resolve_tokens(
    registry: &TokenRegistry,
    token_from: &str,
    token_to: &str,
) -> Result<(TokenDescriptor, TokenDescriptor), SwapError> {
    let from = registry.descriptor(token_from);
    let to = registry.descriptor(token_to);
    match (from, to) {
        (Some(from), Some(to)) => {
            if from.denom == to.denom {
                return Err(SwapError::invalid(format!(
                    "Cannot swap {} into itself",
                    from.symbol
                )));
            }
            Ok((from, to))
        }
        (from, to) => {
            let missing: Vec<String> = [(from, token_from), (to, token_to)]
                .into_iter()
                .filter(|(descriptor, _)| descriptor.is_none())
                .map(|(_, symbol)| symbol.trim().to_uppercase())
                .collect();
            Err(SwapError::unknown_token(format!(
                "Unknown token: {}",
                missing.join(", ")
            )))
        }
    }
}
