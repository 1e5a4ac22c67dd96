//! Swap core for the WAGUS interface: debounced quoting against an external
//! router, on-chain balance tracking, and transaction execution through a
//! pluggable wallet signer. The crate is a library consumed by a UI host; it
//! has no surface of its own beyond the orchestrator.

pub mod amount;
pub mod balance;
pub mod config;
pub mod decimals;
pub mod error;
pub mod executor;
pub mod monitoring;
pub mod quote;
pub mod signer;
pub mod swap;
pub mod token;

// Re-export the types a host wires together.
pub use balance::{BalanceLoader, BalanceSnapshot, TokenBalance};
pub use config::Settings;
pub use decimals::DecimalsResolver;
pub use error::{BalanceErrorKind, Result, SwapError};
pub use executor::{SwapExecutor, SwapOutcome};
pub use quote::{QuoteClient, QuoteResponse, SwapResponse};
pub use signer::{KeypairSigner, SimulatedSigner, WalletSigner};
pub use swap::{SwapOrchestrator, SwapSide};
pub use token::{default_catalog, Token};
