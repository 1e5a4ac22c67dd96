use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::amount::{from_atomic, to_atomic};
use crate::config::Settings;
use crate::error::{Result, SwapError};

mod debounce;
mod types;

pub use debounce::Debouncer;
pub use types::{
    PlatformFee, PrioritizationFeeLamports, PriorityLevelWithMaxLamports, QuoteResponse,
    RoutePlanStep, SwapInfo, SwapRequest, SwapResponse,
};

const QUOTE_ERROR_MESSAGE: &str = "Failed to fetch quote";

#[derive(Default)]
struct QuoteState {
    current_quote: Option<QuoteResponse>,
    error: Option<String>,
    loading: bool,
    in_flight: Option<AbortHandle>,
}

/// Client for the external router's quote and swap-build endpoints.
///
/// At most one quote request is outstanding at a time: issuing a new request
/// aborts the previous one, and a response is only committed as the current
/// quote if no newer request was issued while it was in flight. A stale
/// response can therefore never overwrite a fresher one.
pub struct QuoteClient {
    http: reqwest::Client,
    api_base: String,
    slippage_bps: u16,
    max_accounts: u8,
    max_priority_fee_lamports: u64,
    generation: AtomicU64,
    state: Mutex<QuoteState>,
}

impl QuoteClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: settings.jupiter_api_url.clone(),
            slippage_bps: settings.slippage_bps,
            max_accounts: settings.max_accounts,
            max_priority_fee_lamports: settings.max_priority_fee_lamports,
            generation: AtomicU64::new(0),
            state: Mutex::new(QuoteState::default()),
        }
    }

    /// Requests a quote for swapping `amount` (a positive decimal string) of
    /// the input mint into the output mint. Cancels any prior in-flight
    /// request first.
    ///
    /// Returns the output amount in decimal form, or `None` on failure,
    /// cancellation, or supersession. Failure sets the error slot;
    /// cancellation does not.
    pub async fn request_quote(
        &self,
        from_mint: &str,
        to_mint: &str,
        amount: &str,
        from_decimals: u8,
        to_decimals: u8,
    ) -> Option<f64> {
        let atomic_in = to_atomic(amount, from_decimals);
        if atomic_in == 0 {
            return None;
        }

        let generation = self.next_generation();
        let (abort_handle, registration) = AbortHandle::new_pair();
        {
            let mut state = self.state.lock();
            if let Some(previous) = state.in_flight.replace(abort_handle) {
                previous.abort();
            }
            state.error = None;
            state.loading = true;
        }

        debug!(from_mint, to_mint, atomic_in, generation, "Requesting quote");

        let request = self.fetch_quote(from_mint, to_mint, atomic_in);
        match Abortable::new(request, registration).await {
            Ok(Ok(quote)) => self.commit_quote(generation, quote, to_decimals),
            Ok(Err(err)) => {
                warn!(error = %err, "Quote request failed");
                self.commit_failure(generation);
                None
            }
            // Aborted by a newer request or a teardown: silently discarded,
            // no error state.
            Err(_aborted) => {
                debug!(generation, "Quote request superseded");
                None
            }
        }
    }

    async fn fetch_quote(
        &self,
        from_mint: &str,
        to_mint: &str,
        atomic_in: u64,
    ) -> Result<QuoteResponse> {
        let url = format!(
            "{}/quote?inputMint={}&outputMint={}&amount={}&slippageBps={}&restrictIntermediateTokens=true&maxAccounts={}",
            self.api_base, from_mint, to_mint, atomic_in, self.slippage_bps, self.max_accounts,
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SwapError::api("jupiter", body, Some(status)));
        }

        Ok(response.json::<QuoteResponse>().await?)
    }

    /// Commits a successful response as the current quote, unless a newer
    /// request was issued while this one was in flight.
    fn commit_quote(
        &self,
        generation: u64,
        quote: QuoteResponse,
        to_decimals: u8,
    ) -> Option<f64> {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding stale quote response");
            return None;
        }

        let atomic_out = quote.out_amount.parse::<u64>().unwrap_or(0);
        info!(
            in_amount = %quote.in_amount,
            out_amount = %quote.out_amount,
            price_impact = %quote.price_impact_pct,
            "Quote received"
        );

        state.current_quote = Some(quote);
        state.loading = false;
        state.in_flight = None;
        Some(from_atomic(atomic_out, to_decimals))
    }

    fn commit_failure(&self, generation: u64) {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        state.error = Some(QUOTE_ERROR_MESSAGE.to_string());
        state.loading = false;
        state.in_flight = None;
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Builds the swap transaction payload from the current quote. The quote
    /// is consumed: a new one must be requested before the next build.
    pub async fn build_swap_payload(&self, user: &Pubkey) -> Result<SwapResponse> {
        let quote = self
            .state
            .lock()
            .current_quote
            .take()
            .ok_or(SwapError::NoQuoteAvailable)?;

        let request = SwapRequest {
            user_public_key: user.to_string(),
            quote_response: quote,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            dynamic_slippage: true,
            prioritization_fee_lamports: PrioritizationFeeLamports {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: self.max_priority_fee_lamports,
                    priority_level: "veryHigh".to_string(),
                },
            },
        };

        let response = self
            .http
            .post(format!("{}/swap", self.api_base))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SwapError::api("jupiter", body, Some(status)));
        }

        let payload = response.json::<SwapResponse>().await?;
        info!(
            last_valid_block_height = payload.last_valid_block_height,
            "Swap payload built"
        );
        Ok(payload)
    }

    /// Aborts any in-flight request and drops the current quote and error
    /// state. Used on token selection changes and teardown.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.in_flight.take() {
            handle.abort();
        }
        // Bump the generation so a response already past its abort point
        // still fails the commit check.
        self.next_generation();
        state.current_quote = None;
        state.error = None;
        state.loading = false;
    }

    pub fn has_quote(&self) -> bool {
        self.state.lock().current_quote.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    #[cfg(test)]
    pub(crate) fn seed_quote(&self, quote: QuoteResponse) {
        self.state.lock().current_quote = Some(quote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> QuoteClient {
        QuoteClient::new(&Settings {
            jupiter_api_url: "http://127.0.0.1:1".to_string(),
            ..Settings::default()
        })
    }

    fn test_quote(out_amount: &str) -> QuoteResponse {
        serde_json::from_str(&format!(
            r#"{{
                "inputMint": "a", "inAmount": "50000000", "outputMint": "b",
                "outAmount": "{}", "otherAmountThreshold": "0",
                "swapMode": "ExactIn", "slippageBps": 50,
                "priceImpactPct": "0.01", "routePlan": []
            }}"#,
            out_amount
        ))
        .unwrap()
    }

    #[test]
    fn test_stale_response_never_overwrites_newer_request() {
        let client = test_client();
        let older = client.next_generation();
        let newer = client.next_generation();

        // The older response arrives after the newer request was issued: it
        // must be discarded.
        assert_eq!(client.commit_quote(older, test_quote("1000000000"), 9), None);
        assert!(!client.has_quote());

        // The newer response commits.
        let out = client.commit_quote(newer, test_quote("2000000000"), 9);
        assert_eq!(out, Some(2.0));
        assert!(client.has_quote());
    }

    #[test]
    fn test_stale_failure_sets_no_error() {
        let client = test_client();
        let older = client.next_generation();
        let _newer = client.next_generation();

        client.commit_failure(older);
        assert_eq!(client.error(), None);
    }

    #[test]
    fn test_failure_sets_generic_error() {
        let client = test_client();
        let generation = client.next_generation();
        client.commit_failure(generation);
        assert_eq!(client.error().as_deref(), Some(QUOTE_ERROR_MESSAGE));
        assert!(!client.is_loading());

        client.clear_error();
        assert_eq!(client.error(), None);
    }

    #[test]
    fn test_invalidate_drops_quote_and_error() {
        let client = test_client();
        let generation = client.next_generation();
        client.commit_quote(generation, test_quote("5"), 6);
        assert!(client.has_quote());

        client.invalidate();
        assert!(!client.has_quote());
        assert_eq!(client.error(), None);
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn test_build_swap_payload_requires_quote() {
        let client = test_client();
        let user = Pubkey::new_unique();
        let result = client.build_swap_payload(&user).await;
        assert!(matches!(result, Err(SwapError::NoQuoteAvailable)));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let client = test_client();
        assert_eq!(client.request_quote("a", "b", "0", 6, 9).await, None);
        assert_eq!(client.request_quote("a", "b", "", 6, 9).await, None);
        // No error state: this is input validation, not a failed request.
        assert_eq!(client.error(), None);
    }
}
