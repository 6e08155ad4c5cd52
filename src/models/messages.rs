use std::str::FromStr;

use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub const OSMOSIS_POOL_MANAGER: &str = "osmosis-poolmanager";

/// Body of a Skip `v2/fungible/route` request.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub amount_in: String,
    pub source_asset_denom: String,
    pub source_asset_chain_id: String,
    pub dest_asset_denom: String,
    pub dest_asset_chain_id: String,
    pub cumulative_affiliate_fee_bps: String,
    pub allow_multi_tx: bool,
    pub allow_unsafe: bool,
    pub smart_swap_options: SmartSwapOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_venues: Option<Vec<SwapVenue>>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct SmartSwapOptions {
    pub split_routes: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SwapVenue {
    pub chain_id: String,
    pub name: String,
}

impl SwapRequest {
    /// Same-chain swap with zero affiliate fee, restricted to a single
    /// transaction.
    pub fn new(amount_in: &BigUint, denom_in: &str, denom_out: &str, chain_id: &str) -> Self {
        Self {
            amount_in: amount_in.to_str_radix(10),
            source_asset_denom: denom_in.to_string(),
            source_asset_chain_id: chain_id.to_string(),
            dest_asset_denom: denom_out.to_string(),
            dest_asset_chain_id: chain_id.to_string(),
            cumulative_affiliate_fee_bps: "0".to_string(),
            allow_multi_tx: false,
            allow_unsafe: true,
            smart_swap_options: SmartSwapOptions {
                split_routes: false,
            },
            swap_venues: None,
        }
    }

    pub fn with_split_routes(mut self, split_routes: bool) -> Self {
        self.smart_swap_options.split_routes = split_routes;
        self
    }

    pub fn only_osmosis(mut self) -> Self {
        self.swap_venues = Some(vec![SwapVenue {
            chain_id: self.source_asset_chain_id.clone(),
            name: OSMOSIS_POOL_MANAGER.to_string(),
        }]);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub pool: String,
    pub denom_in: String,
    pub denom_out: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOperation {
    DirectSwap(Vec<Hop>),
    SmartSwap(Vec<Hop>),
    /// Transfers and any other non-swap step.
    Other,
}

impl RouteOperation {
    /// Hop list of a swap operation, if it has at least one hop.
    pub fn swap_hops(&self) -> Option<&[Hop]> {
        match self {
            RouteOperation::DirectSwap(hops) | RouteOperation::SmartSwap(hops)
                if !hops.is_empty() =>
            {
                Some(hops.as_slice())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRoute {
    pub estimated_amount_out: BigUint,
    pub price_impact_percent: Option<Decimal>,
    pub operations: Vec<RouteOperation>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteResponse {
    pub estimated_amount_out: String,
    #[serde(default)]
    pub swap_price_impact_percent: Option<String>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawOperation {
    #[serde(default)]
    pub swap: Option<RawSwap>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawSwap {
    #[serde(default)]
    pub swap_in: Option<RawSwapIn>,
    #[serde(default)]
    pub smart_swap_in: Option<RawSmartSwapIn>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawSwapIn {
    #[serde(default)]
    pub swap_operations: Vec<RawHop>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawSmartSwapIn {
    #[serde(default)]
    pub swap_operations: Vec<RawHop>,
    #[serde(default)]
    pub swap_routes: Vec<RawSwapIn>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawHop {
    #[serde(deserialize_with = "string_or_number")]
    pub pool: String,
    pub denom_in: String,
    pub denom_out: String,
}

impl From<RawHop> for Hop {
    fn from(raw: RawHop) -> Self {
        Hop {
            pool: raw.pool,
            denom_in: raw.denom_in,
            denom_out: raw.denom_out,
        }
    }
}

impl From<RawOperation> for RouteOperation {
    fn from(raw: RawOperation) -> Self {
        let Some(swap) = raw.swap else {
            return RouteOperation::Other;
        };

        if let Some(swap_in) = swap.swap_in {
            if !swap_in.swap_operations.is_empty() {
                return RouteOperation::DirectSwap(into_hops(swap_in.swap_operations));
            }
        }

        match swap.smart_swap_in {
            Some(smart) if !smart.swap_operations.is_empty() => {
                RouteOperation::SmartSwap(into_hops(smart.swap_operations))
            }
            Some(mut smart) if smart.swap_routes.len() == 1 => {
                let route = smart.swap_routes.remove(0);
                RouteOperation::SmartSwap(into_hops(route.swap_operations))
            }
            _ => RouteOperation::Other,
        }
    }
}

fn into_hops(raw: Vec<RawHop>) -> Vec<Hop> {
    raw.into_iter().map(Hop::from).collect()
}

impl TryFrom<RouteResponse> for SwapRoute {
    type Error = String;

    fn try_from(response: RouteResponse) -> Result<Self, Self::Error> {
        let estimated_amount_out = BigUint::from_str(response.estimated_amount_out.trim())
            .map_err(|_| {
                format!(
                    "Invalid estimated_amount_out: {}",
                    response.estimated_amount_out
                )
            })?;
        let price_impact_percent = response
            .swap_price_impact_percent
            .as_deref()
            .and_then(|value| Decimal::from_str(value.trim()).ok());

        Ok(SwapRoute {
            estimated_amount_out,
            price_impact_percent,
            operations: response
                .operations
                .into_iter()
                .map(RouteOperation::from)
                .collect(),
        })
    }
}

/// Accepts `"1"` or `1` for identifiers the APIs are inconsistent about.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Signed(value) => value.to_string(),
        Raw::Unsigned(value) => value.to_string(),
    })
}
