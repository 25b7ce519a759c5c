//! Strategy registry: the single mapping from strategy identifier to
//! contract name, required config fields, constructor ordering, and the
//! persisted-state file names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six deployable contract-driven strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Arbitrage,
    Flashloan,
    Frontrunning,
    Sandwich,
    Liquidation,
    Hft,
}

/// Static description of one strategy's deployment shape.
///
/// `constructor_fields` is ordered exactly as the contract constructor expects
/// its arguments. Every required field is a constructor field, but not every
/// constructor field is required (`fromAccount` on liquidation resolves to an
/// empty argument when absent).
#[derive(Debug, Clone, Copy)]
pub struct StrategySpec {
    pub name: &'static str,
    pub contract_name: &'static str,
    pub required_fields: &'static [&'static str],
    pub constructor_fields: &'static [&'static str],
    pub config_file: &'static str,
    pub abi_file: &'static str,
    pub address_field: &'static str,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Self::Arbitrage,
        Self::Flashloan,
        Self::Frontrunning,
        Self::Sandwich,
        Self::Liquidation,
        Self::Hft,
    ];

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "arbitrage" => Some(Self::Arbitrage),
            "flashloan" => Some(Self::Flashloan),
            "frontrunning" => Some(Self::Frontrunning),
            "sandwich" => Some(Self::Sandwich),
            "liquidation" => Some(Self::Liquidation),
            "hft" => Some(Self::Hft),
            _ => None,
        }
    }

    pub fn spec(self) -> &'static StrategySpec {
        match self {
            Self::Arbitrage => &StrategySpec {
                name: "arbitrage",
                contract_name: "Arbitrage",
                required_fields: &["uniswapRouter", "sushiswapRouter"],
                constructor_fields: &["uniswapRouter", "sushiswapRouter"],
                config_file: "arbitrage_config.json",
                abi_file: "arbitrage_abi.json",
                address_field: "arbitrageContractAddress",
            },
            Self::Flashloan => &StrategySpec {
                name: "flashloan",
                contract_name: "FlashLoan",
                required_fields: &["lendingPoolAddress", "wethAddress"],
                constructor_fields: &["lendingPoolAddress", "wethAddress"],
                config_file: "flashloan_config.json",
                abi_file: "flashloan_abi.json",
                address_field: "flashloanContractAddress",
            },
            Self::Frontrunning => &StrategySpec {
                name: "frontrunning",
                contract_name: "FrontRunning",
                required_fields: &["uniswapRouter"],
                constructor_fields: &["uniswapRouter"],
                config_file: "front_running_config.json",
                abi_file: "frontrunning_abi.json",
                address_field: "frontRunningContractAddress",
            },
            Self::Sandwich => &StrategySpec {
                name: "sandwich",
                contract_name: "Sandwich",
                required_fields: &["uniswapRouter"],
                constructor_fields: &["uniswapRouter"],
                config_file: "sandwich_config.json",
                abi_file: "sandwich_abi.json",
                address_field: "sandwichContractAddress",
            },
            Self::Liquidation => &StrategySpec {
                name: "liquidation",
                contract_name: "Liquidation",
                required_fields: &[
                    "aavePoolAddress",
                    "compoundComptrollerAddress",
                    "ctokenBorrowed",
                    "ctokenCollateral",
                ],
                constructor_fields: &[
                    "aavePoolAddress",
                    "compoundComptrollerAddress",
                    "fromAccount",
                    "ctokenBorrowed",
                    "ctokenCollateral",
                ],
                config_file: "liquidation_config.json",
                abi_file: "liquidation_abi.json",
                address_field: "liquidationContractAddress",
            },
            Self::Hft => &StrategySpec {
                name: "hft",
                contract_name: "HFT",
                required_fields: &["uniswapRouter", "sushiswapRouter"],
                constructor_fields: &["uniswapRouter", "sushiswapRouter"],
                config_file: "hft_config.json",
                abi_file: "hft_abi.json",
                address_field: "hftContractAddress",
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_strategy_name() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_str(strategy.as_str()), Some(strategy));
        }
        assert_eq!(Strategy::from_str("momentum"), None);
    }

    #[test]
    fn required_fields_are_a_subset_of_constructor_fields() {
        for strategy in Strategy::ALL {
            let spec = strategy.spec();
            for field in spec.required_fields {
                assert!(
                    spec.constructor_fields.contains(field),
                    "{}: required field {} is not a constructor field",
                    spec.name,
                    field
                );
            }
        }
    }

    #[test]
    fn address_fields_follow_the_contract_naming() {
        assert_eq!(
            Strategy::Arbitrage.spec().address_field,
            "arbitrageContractAddress"
        );
        // FrontRunning keeps the inner capital from its contract name.
        assert_eq!(
            Strategy::Frontrunning.spec().address_field,
            "frontRunningContractAddress"
        );
        assert_eq!(
            Strategy::Frontrunning.spec().config_file,
            "front_running_config.json"
        );
    }

    #[test]
    fn liquidation_passes_from_account_without_requiring_it() {
        let spec = Strategy::Liquidation.spec();
        assert!(spec.constructor_fields.contains(&"fromAccount"));
        assert!(!spec.required_fields.contains(&"fromAccount"));
        assert_eq!(spec.constructor_fields.len(), 5);
    }
}
