use futures::future::join_all;
use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Account as TokenAccount;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::BalanceErrorKind;
use crate::token::Token;

/// A fetched balance. `Unknown` means the lookup failed transiently (rate
/// limit, RPC outage) and is distinct from a confirmed zero holding: it
/// displays as 0 but should be retried, while `Known(0.0)` should not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenBalance {
    Known(f64),
    Unknown,
}

impl TokenBalance {
    /// The value shown to the user. The unknown case folds to 0 for display
    /// only; the variant itself preserves the distinction.
    pub fn display(&self) -> f64 {
        match self {
            TokenBalance::Known(v) => *v,
            TokenBalance::Unknown => 0.0,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, TokenBalance::Known(_))
    }
}

/// Symbol-keyed snapshot of wallet balances. Always complete: one entry per
/// requested token.
pub type BalanceSnapshot = HashMap<String, TokenBalance>;

#[derive(Default)]
struct BalanceState {
    balances: BalanceSnapshot,
    loading: bool,
}

/// Fetches on-chain balances for the token catalog: a native lookup for SOL
/// and associated-token-account lookups for everything else.
pub struct BalanceLoader {
    rpc: Arc<RpcClient>,
    state: Mutex<BalanceState>,
}

impl BalanceLoader {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self {
            rpc,
            state: Mutex::new(BalanceState::default()),
        }
    }

    /// Concurrently fetches a balance for every token and replaces the held
    /// snapshot wholesale. One token failing does not abort its siblings,
    /// and no stale entries from a previous snapshot survive.
    pub async fn fetch_all(&self, wallet: &Pubkey, tokens: &[Token]) -> BalanceSnapshot {
        self.state.lock().loading = true;
        debug!(wallet = %wallet, tokens = tokens.len(), "Fetching balances");

        let fetches = tokens.iter().map(|token| async move {
            let balance = self.fetch_one(wallet, token).await;
            (token.symbol.clone(), balance)
        });

        let snapshot: BalanceSnapshot = join_all(fetches).await.into_iter().collect();

        let mut state = self.state.lock();
        state.balances = snapshot.clone();
        state.loading = false;
        info!(entries = snapshot.len(), "Balance snapshot replaced");
        snapshot
    }

    async fn fetch_one(&self, wallet: &Pubkey, token: &Token) -> TokenBalance {
        if token.is_native() {
            return self.fetch_native(wallet, token).await;
        }
        self.fetch_spl(wallet, token).await
    }

    async fn fetch_native(&self, wallet: &Pubkey, token: &Token) -> TokenBalance {
        match self.rpc.get_balance(wallet).await {
            Ok(lamports) => {
                let balance = lamports as f64 / LAMPORTS_PER_SOL as f64;
                debug!(symbol = %token.symbol, balance, "Native balance fetched");
                TokenBalance::Known(balance)
            }
            Err(err) => {
                let kind = BalanceErrorKind::classify(&err);
                warn!(symbol = %token.symbol, kind = %kind, error = %err, "Native balance unknown");
                TokenBalance::Unknown
            }
        }
    }

    async fn fetch_spl(&self, wallet: &Pubkey, token: &Token) -> TokenBalance {
        let mint = match Pubkey::from_str(&token.mint) {
            Ok(mint) => mint,
            Err(err) => {
                warn!(symbol = %token.symbol, error = %err, "Invalid mint address in catalog");
                return TokenBalance::Known(0.0);
            }
        };

        let ata = get_associated_token_address(wallet, &mint);
        match self
            .rpc
            .get_account_with_commitment(&ata, CommitmentConfig::confirmed())
            .await
        {
            // No associated account yet: a confirmed zero, normal for wallets
            // that never received this token.
            Ok(response) => match response.value {
                None => {
                    debug!(symbol = %token.symbol, "Associated account not created, balance 0");
                    TokenBalance::Known(0.0)
                }
                Some(account) => match TokenAccount::unpack_from_slice(&account.data) {
                    Ok(token_account) => {
                        let balance = crate::amount::from_atomic(token_account.amount, token.decimals);
                        debug!(symbol = %token.symbol, balance, "Token balance fetched");
                        TokenBalance::Known(balance)
                    }
                    Err(err) => {
                        warn!(symbol = %token.symbol, error = %err, "Failed to unpack token account");
                        TokenBalance::Unknown
                    }
                },
            },
            Err(err) => {
                let kind = BalanceErrorKind::classify(&err);
                match kind {
                    BalanceErrorKind::MissingAccount => {
                        debug!(symbol = %token.symbol, "Account lookup says missing, balance 0");
                        TokenBalance::Known(0.0)
                    }
                    _ => {
                        warn!(symbol = %token.symbol, kind = %kind, error = %err, "Token balance unknown");
                        TokenBalance::Unknown
                    }
                }
            }
        }
    }

    pub fn balances(&self) -> BalanceSnapshot {
        self.state.lock().balances.clone()
    }

    /// Balance of a token by symbol, folded to 0 when absent or unknown.
    pub fn balance_of(&self, symbol: &str) -> f64 {
        self.state
            .lock()
            .balances
            .get(symbol)
            .map(TokenBalance::display)
            .unwrap_or(0.0)
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.balances.clear();
        state.loading = false;
    }

    #[cfg(test)]
    pub(crate) fn set_snapshot(&self, snapshot: BalanceSnapshot) {
        self.state.lock().balances = snapshot;
    }
}
