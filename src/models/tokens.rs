use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// One entry of the assets file: a pool and the two tokens it trades.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolAssets {
    pub token_name_1: String,
    pub token_name_2: String,
    pub denom_1: String,
    pub denom_2: String,
    pub divisor_denom_1: u64,
    pub divisor_denom_2: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub denom: String,
    pub divisor: u64,
}

/// Symbol <-> denomination lookups built once from the assets file.
///
/// The same token usually appears in many pools, so identical re-insertions
/// are accepted. A symbol or denomination that comes back with different
/// data is rejected instead of silently overwriting the first entry.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    symbol_to_denom: HashMap<String, String>,
    denom_to_symbol: HashMap<String, String>,
    denom_to_divisor: HashMap<String, u64>,
}

impl TokenRegistry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pools: HashMap<String, PoolAssets> = serde_json::from_str(&raw)
            .map_err(|err| RegistryError::Malformed(format!("{}: {}", path.display(), err)))?;

        let mut ordered: Vec<(String, PoolAssets)> = pools.into_iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let registry = Self::from_pools(ordered.into_iter().map(|(_, pool)| pool))?;
        if registry.is_empty() {
            return Err(RegistryError::Malformed(format!(
                "{}: no pools defined",
                path.display()
            )));
        }
        info!(
            event = "registry_loaded",
            path = %path.display(),
            tokens = registry.len(),
            "Token registry loaded"
        );
        Ok(registry)
    }

    pub fn from_pools<I>(pools: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = PoolAssets>,
    {
        let mut registry = Self::default();
        for pool in pools {
            registry.insert(&pool.token_name_1, &pool.denom_1, pool.divisor_denom_1)?;
            registry.insert(&pool.token_name_2, &pool.denom_2, pool.divisor_denom_2)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, symbol: &str, denom: &str, divisor: u64) -> Result<(), RegistryError> {
        let symbol = symbol.trim().to_uppercase();
        let denom = denom.trim();
        if symbol.is_empty() || denom.is_empty() {
            return Err(RegistryError::Malformed(
                "token name and denom must not be empty".to_string(),
            ));
        }
        if divisor == 0 {
            return Err(RegistryError::InvalidDivisor {
                denom: denom.to_string(),
            });
        }

        if let Some(existing) = self.symbol_to_denom.get(&symbol) {
            if existing != denom {
                return Err(RegistryError::ConflictingSymbol {
                    symbol,
                    existing: existing.clone(),
                    incoming: denom.to_string(),
                });
            }
        }
        if let Some(existing) = self.denom_to_symbol.get(denom) {
            if existing != &symbol {
                return Err(RegistryError::ConflictingDenom {
                    denom: denom.to_string(),
                    existing: existing.clone(),
                    incoming: symbol,
                });
            }
        }
        if let Some(existing) = self.denom_to_divisor.get(denom) {
            if *existing != divisor {
                return Err(RegistryError::ConflictingDivisor {
                    denom: denom.to_string(),
                    existing: *existing,
                    incoming: divisor,
                });
            }
            debug!(symbol = symbol.as_str(), denom, "Token already registered");
            return Ok(());
        }

        self.symbol_to_denom.insert(symbol.clone(), denom.to_string());
        self.denom_to_symbol.insert(denom.to_string(), symbol);
        self.denom_to_divisor.insert(denom.to_string(), divisor);
        Ok(())
    }

    pub fn denom_for(&self, symbol: &str) -> Option<&str> {
        self.symbol_to_denom
            .get(&symbol.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn symbol_for(&self, denom: &str) -> Option<&str> {
        self.denom_to_symbol.get(denom).map(String::as_str)
    }

    pub fn divisor_for(&self, denom: &str) -> Option<u64> {
        self.denom_to_divisor.get(denom).copied()
    }

    pub fn descriptor(&self, symbol: &str) -> Option<TokenDescriptor> {
        let symbol = symbol.trim().to_uppercase();
        let denom = self.symbol_to_denom.get(&symbol)?;
        let divisor = self.denom_to_divisor.get(denom)?;
        Some(TokenDescriptor {
            symbol,
            denom: denom.clone(),
            divisor: *divisor,
        })
    }

    pub fn descriptors(&self) -> impl Iterator<Item = TokenDescriptor> + '_ {
        self.symbol_to_denom.iter().filter_map(|(symbol, denom)| {
            self.denom_to_divisor
                .get(denom)
                .map(|divisor| TokenDescriptor {
                    symbol: symbol.clone(),
                    denom: denom.clone(),
                    divisor: *divisor,
                })
        })
    }

    pub fn len(&self) -> usize {
        self.symbol_to_denom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_to_denom.is_empty()
    }
}

#[derive(Debug)]
pub enum RegistryError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed(String),
    InvalidDivisor {
        denom: String,
    },
    ConflictingSymbol {
        symbol: String,
        existing: String,
        incoming: String,
    },
    ConflictingDenom {
        denom: String,
        existing: String,
        incoming: String,
    },
    ConflictingDivisor {
        denom: String,
        existing: u64,
        incoming: u64,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Read { path, source } => {
                write!(f, "failed to read assets file {}: {}", path.display(), source)
            }
            RegistryError::Malformed(message) => write!(f, "malformed assets file: {}", message),
            RegistryError::InvalidDivisor { denom } => {
                write!(f, "divisor for {} must be positive", denom)
            }
            RegistryError::ConflictingSymbol {
                symbol,
                existing,
                incoming,
            } => write!(
                f,
                "symbol {} maps to both {} and {}",
                symbol, existing, incoming
            ),
            RegistryError::ConflictingDenom {
                denom,
                existing,
                incoming,
            } => write!(
                f,
                "denom {} is registered as both {} and {}",
                denom, existing, incoming
            ),
            RegistryError::ConflictingDivisor {
                denom,
                existing,
                incoming,
            } => write!(
                f,
                "denom {} has conflicting divisors {} and {}",
                denom, existing, incoming
            ),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}
