use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::amount::{format_adaptive, parse_display_amount, sanitize_amount_input};
use crate::balance::BalanceLoader;
use crate::config::Settings;
use crate::decimals::DecimalsResolver;
use crate::error::{Result, SwapError};
use crate::executor::{SwapExecutor, SwapOutcome};
use crate::quote::{Debouncer, QuoteClient};
use crate::signer::WalletSigner;
use crate::token::{opposite_of, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSide {
    From,
    To,
}

struct PairState {
    from_token: Token,
    to_token: Token,
    from_amount: String,
    to_amount: String,
}

/// Coordinates the swap pipeline: owns the selected pair and amounts, drives
/// debounced quoting, gates execution, and refreshes balances after a
/// confirmed swap.
///
/// Invariant: the from and to tokens are always distinct, and both amounts
/// reset whenever either selection changes.
pub struct SwapOrchestrator {
    catalog: Vec<Token>,
    quotes: Arc<QuoteClient>,
    balances: Arc<BalanceLoader>,
    executor: Arc<SwapExecutor>,
    decimals: Arc<DecimalsResolver>,
    debouncer: Debouncer,
    refresh_delay: Duration,
    state: Mutex<PairState>,
}

impl SwapOrchestrator {
    pub fn new(
        settings: &Settings,
        signer: Arc<dyn WalletSigner>,
        catalog: Vec<Token>,
    ) -> Result<Self> {
        if catalog.len() < 2 {
            return Err(SwapError::ConfigError(
                "Token catalog needs at least two entries".to_string(),
            ));
        }

        let rpc = Arc::new(RpcClient::new(settings.solana_rpc_url.clone()));
        let quotes = Arc::new(QuoteClient::new(settings));
        let balances = Arc::new(BalanceLoader::new(rpc.clone()));
        let executor = Arc::new(SwapExecutor::new(rpc, signer));
        let decimals = Arc::new(DecimalsResolver::new(
            &settings.token_list_url,
            Duration::from_millis(settings.token_list_timeout_ms),
        ));

        let state = PairState {
            from_token: catalog[0].clone(),
            to_token: catalog[1].clone(),
            from_amount: String::new(),
            to_amount: String::new(),
        };

        Ok(Self {
            catalog,
            quotes,
            balances,
            executor,
            decimals,
            debouncer: Debouncer::new(Duration::from_millis(settings.quote_debounce_ms)),
            refresh_delay: Duration::from_millis(settings.balance_refresh_delay_ms),
            state: Mutex::new(state),
        })
    }

    /// Handles from-amount input. The value is sanitized at the boundary
    /// (sign and exponent characters stripped) and any held quote is dropped,
    /// since it priced the previous amount. A positive amount schedules a
    /// debounced re-quote, anything else clears the output side.
    pub fn set_from_amount(self: &Arc<Self>, value: &str) {
        let clean = sanitize_amount_input(value);
        let positive = parse_display_amount(&clean)
            .map(|v| v > 0.0)
            .unwrap_or(false);

        {
            let mut state = self.state.lock();
            state.from_amount = clean.clone();
            if !positive {
                state.to_amount.clear();
            }
        }

        if positive {
            // The held quote priced the previous amount; drop it now so it
            // cannot be executed during the debounce window.
            self.quotes.invalidate();
            let this = Arc::clone(self);
            self.debouncer.call(async move {
                this.refresh_quote(clean).await;
            });
        } else {
            self.debouncer.cancel();
            self.quotes.invalidate();
        }
    }

    async fn refresh_quote(self: Arc<Self>, amount: String) {
        let (from_token, to_token) = {
            let state = self.state.lock();
            (state.from_token.clone(), state.to_token.clone())
        };

        // Resolve the output precision first, degrading to the catalog value.
        let to_decimals = self
            .decimals
            .resolve(&to_token.mint)
            .await
            .unwrap_or(to_token.decimals);

        let output = self
            .quotes
            .request_quote(
                &from_token.mint,
                &to_token.mint,
                &amount,
                from_token.decimals,
                to_decimals,
            )
            .await;

        let mut state = self.state.lock();
        match output {
            Some(out) => state.to_amount = format_adaptive(out),
            None => state.to_amount.clear(),
        }
    }

    /// Exchanges the from/to sides, amounts included. The held quote priced
    /// the opposite direction, so it is dropped along with any pending
    /// refresh; executing again requires a fresh quote.
    pub fn swap_direction(&self) {
        self.debouncer.cancel();
        self.quotes.invalidate();

        let mut state = self.state.lock();
        let state = &mut *state;
        std::mem::swap(&mut state.from_token, &mut state.to_token);
        std::mem::swap(&mut state.from_amount, &mut state.to_amount);
    }

    /// Selects `token` for one side of the pair. If it collides with the
    /// other side, that side is forced to a different catalog entry. Both
    /// amounts reset and any in-flight quote work is cancelled.
    pub fn select_token(&self, side: SwapSide, token: &Token) {
        self.debouncer.cancel();
        self.quotes.invalidate();

        let mut state = self.state.lock();
        match side {
            SwapSide::From => {
                state.from_token = token.clone();
                if state.to_token.symbol == token.symbol {
                    if let Some(opposite) = opposite_of(&self.catalog, &token.symbol) {
                        state.to_token = opposite.clone();
                    }
                }
            }
            SwapSide::To => {
                state.to_token = token.clone();
                if state.from_token.symbol == token.symbol {
                    if let Some(opposite) = opposite_of(&self.catalog, &token.symbol) {
                        state.from_token = opposite.clone();
                    }
                }
            }
        }
        state.from_amount.clear();
        state.to_amount.clear();
        debug!(from = %state.from_token.symbol, to = %state.to_token.symbol, "Token pair updated");
    }

    /// The full source-token balance, formatted for direct re-entry as the
    /// from amount.
    pub fn max_from_balance(&self) -> String {
        let symbol = self.state.lock().from_token.symbol.clone();
        format_adaptive(self.balances.balance_of(&symbol))
    }

    /// Fills the from amount with the full balance of the source token.
    pub fn set_max_amount(self: &Arc<Self>) {
        let amount = self.max_from_balance();
        self.set_from_amount(&amount);
    }

    /// True when the entered amount exceeds the known source-token balance.
    /// Empty input is not insufficient, it is merely absent.
    pub fn is_insufficient_balance(&self, amount: &str) -> bool {
        let value = match parse_display_amount(&sanitize_amount_input(amount)) {
            Some(v) => v,
            None => return false,
        };
        let symbol = self.state.lock().from_token.symbol.clone();
        value > self.balances.balance_of(&symbol)
    }

    /// Gate for the swap action: authenticated, positive amount within the
    /// source balance, and nothing in flight.
    pub fn can_execute(&self, authenticated: bool) -> bool {
        if !authenticated {
            return false;
        }

        let (amount, from_symbol) = {
            let state = self.state.lock();
            (state.from_amount.clone(), state.from_token.symbol.clone())
        };

        let value = match parse_display_amount(&sanitize_amount_input(&amount)) {
            Some(v) if v > 0.0 => v,
            _ => return false,
        };

        if self.quotes.is_loading() || self.balances.is_loading() || self.executor.is_executing() {
            return false;
        }

        value <= self.balances.balance_of(&from_symbol)
    }

    /// Executes the held quote as a swap. On success, schedules a delayed
    /// balance refresh so the re-query lands after chain state propagates.
    pub async fn execute_swap(self: &Arc<Self>, user: Pubkey) -> Result<SwapOutcome> {
        let outcome = self.executor.execute(&self.quotes, &user).await?;

        info!(signature = %outcome.signature(), "Swap executed, scheduling balance refresh");
        let this = Arc::clone(self);
        let delay = self.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let tokens = this.catalog.clone();
            this.balances.fetch_all(&user, &tokens).await;
        });

        Ok(outcome)
    }

    pub async fn refresh_balances(&self, wallet: &Pubkey) {
        self.balances.fetch_all(wallet, &self.catalog).await;
    }

    pub fn balances(&self) -> crate::balance::BalanceSnapshot {
        self.balances.balances()
    }

    /// Balance line for one side of the pair.
    pub fn display_balance(&self, symbol: &str, authenticated: bool) -> String {
        if !authenticated {
            return "--".to_string();
        }
        if self.balances.is_loading() {
            return "Loading...".to_string();
        }
        format_adaptive(self.balances.balance_of(symbol))
    }

    /// Ratio of the displayed output to input amounts, `None` while loading
    /// or incomplete.
    pub fn exchange_rate(&self) -> Option<String> {
        if self.quotes.is_loading() {
            return None;
        }
        let (from_amount, to_amount) = {
            let state = self.state.lock();
            (state.from_amount.clone(), state.to_amount.clone())
        };
        let from = parse_display_amount(&from_amount)?;
        let to = parse_display_amount(&to_amount)?;
        if from <= 0.0 {
            return None;
        }
        Some(format_adaptive(to / from))
    }

    /// Teardown on wallet disconnect: cancels in-flight work and returns
    /// every register to its initial idle value.
    pub fn reset(&self) {
        self.debouncer.cancel();
        self.quotes.invalidate();
        self.executor.clear_state();
        self.balances.clear();

        let mut state = self.state.lock();
        state.from_amount.clear();
        state.to_amount.clear();
    }

    pub fn from_token(&self) -> Token {
        self.state.lock().from_token.clone()
    }

    pub fn to_token(&self) -> Token {
        self.state.lock().to_token.clone()
    }

    pub fn from_amount(&self) -> String {
        self.state.lock().from_amount.clone()
    }

    pub fn to_amount(&self) -> String {
        self.state.lock().to_amount.clone()
    }

    pub fn quote_error(&self) -> Option<String> {
        self.quotes.error()
    }

    pub fn transaction_error(&self) -> Option<String> {
        self.executor.error()
    }

    pub fn is_loading_quote(&self) -> bool {
        self.quotes.is_loading()
    }

    pub fn is_loading_balances(&self) -> bool {
        self.balances.is_loading()
    }

    pub fn catalog(&self) -> &[Token] {
        &self.catalog
    }

    #[cfg(test)]
    pub(crate) fn balances_for_test(&self) -> &BalanceLoader {
        &self.balances
    }
}
