use error_stack::{Report, report};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::Error;

pub const NATIVE_TOKEN_EVM_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
pub const EVM_NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const NATIVE_TOKEN_EVM_ADDRESSES: [&str; 2] = [NATIVE_TOKEN_EVM_ADDRESS, EVM_NULL_ADDRESS];

pub fn is_native_token_evm_address(address: &str) -> bool {
    NATIVE_TOKEN_EVM_ADDRESSES.contains(&address.to_lowercase().as_str())
}

/// Chains the Gasless API is documented to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, EnumIter, Hash)]
#[repr(u64)]
pub enum ChainId {
    Ethereum = 1,
    Optimism = 10,
    Bsc = 56,
    Polygon = 137,
    Base = 8453,
    ArbitrumOne = 42161,
    Avalanche = 43114,
    Linea = 59144,
    Scroll = 534352,
    Blast = 81457,
    Mode = 34443,
}

impl ChainId {
    pub fn supported_chains() -> Vec<ChainId> {
        ChainId::iter().collect()
    }
}

impl TryFrom<u64> for ChainId {
    type Error = Report<Error>;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        ChainId::iter()
            .find(|chain| *chain as u64 == value)
            .ok_or_else(|| {
                report!(Error::ParseError)
                    .attach_printable(format!("Unsupported chain ID: {value}"))
            })
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ethereum => write!(f, "Ethereum"),
            Self::Optimism => write!(f, "Optimism"),
            Self::Bsc => write!(f, "BSC"),
            Self::Polygon => write!(f, "Polygon"),
            Self::Base => write!(f, "Base"),
            Self::ArbitrumOne => write!(f, "Arbitrum One"),
            Self::Avalanche => write!(f, "Avalanche"),
            Self::Linea => write!(f, "Linea"),
            Self::Scroll => write!(f, "Scroll"),
            Self::Blast => write!(f, "Blast"),
            Self::Mode => write!(f, "Mode"),
        }
    }
}
