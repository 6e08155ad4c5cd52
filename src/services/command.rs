use std::fmt;

use num_bigint::BigUint;
use rust_decimal::Decimal;

use crate::config::AccountConfig;
use crate::models::messages::SwapRoute;

/// Program plus argument vector. Executed without a shell; `Display` is
/// only for the diagnostic sink and the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCommand {
    program: String,
    args: Vec<String>,
}

impl SwapCommand {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for SwapCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SwapAmounts {
    pub token_in_amount: BigUint,
    pub token_out_minimum: BigUint,
}

#[derive(Debug, Clone)]
pub struct SubmissionParams {
    pub program: String,
    pub sender: String,
    pub chain_id: String,
    pub gas_adjustment: Decimal,
    pub fees: u64,
    pub gas_token: String,
    pub node: Option<String>,
    pub keyring_backend: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BuiltSwap {
    pub command: SwapCommand,
    pub pool_ids: Vec<String>,
    pub denom_path: Vec<String>,
    pub token_in_denom: String,
}

/// Dry runs show the address so the command can be read without key access;
/// live runs need the key name for signing.
pub fn sender_identity(account: &AccountConfig, dry_run: bool) -> &str {
    if dry_run {
        &account.address
    } else {
        &account.name
    }
}

/// Builds `tx gamm swap-exact-amount-in` from the first operation that
/// carries swap hops. Returns `None` if the route has no such operation.
pub fn build_swap_command(
    route: &SwapRoute,
    amounts: &SwapAmounts,
    params: &SubmissionParams,
) -> Option<BuiltSwap> {
    let hops = route.operations.iter().find_map(|op| op.swap_hops())?;
    let first = hops.first()?;

    let pool_ids: Vec<String> = hops.iter().map(|hop| hop.pool.clone()).collect();
    let denom_path: Vec<String> = hops.iter().map(|hop| hop.denom_out.clone()).collect();
    let token_in_denom = first.denom_in.clone();

    let mut args = vec![
        "tx".to_string(),
        "gamm".to_string(),
        "swap-exact-amount-in".to_string(),
        format!("{}{}", amounts.token_in_amount, token_in_denom),
        amounts.token_out_minimum.to_str_radix(10),
        "--swap-route-pool-ids".to_string(),
        pool_ids.join(","),
        "--swap-route-denoms".to_string(),
        denom_path.join(","),
        "--from".to_string(),
        params.sender.clone(),
        "--chain-id".to_string(),
        params.chain_id.clone(),
        "--gas".to_string(),
        "auto".to_string(),
        "--gas-adjustment".to_string(),
        params.gas_adjustment.normalize().to_string(),
        "--fees".to_string(),
        format!("{}{}", params.fees, params.gas_token),
    ];
    if let Some(node) = &params.node {
        args.push("--node".to_string());
        args.push(node.clone());
    }
    if let Some(backend) = &params.keyring_backend {
        args.push("--keyring-backend".to_string());
        args.push(backend.clone());
    }
    args.push("-y".to_string());

    Some(BuiltSwap {
        command: SwapCommand::new(params.program.clone(), args),
        pool_ids,
        denom_path,
        token_in_denom,
    })
}
