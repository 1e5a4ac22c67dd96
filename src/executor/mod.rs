use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, SwapError};
use crate::quote::QuoteClient;
use crate::signer::WalletSigner;

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Result of a swap execution. The signer's receipt is authoritative: a
/// signature whose confirmation poll failed or expired is reported as
/// `SignedUnconfirmed` rather than as a swap failure, since the signer's own
/// infrastructure may already have confirmed it through another path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Confirmed(Signature),
    SignedUnconfirmed(Signature),
}

impl SwapOutcome {
    pub fn signature(&self) -> Signature {
        match self {
            SwapOutcome::Confirmed(sig) | SwapOutcome::SignedUnconfirmed(sig) => *sig,
        }
    }
}

#[derive(Default)]
struct ExecutorState {
    error: Option<String>,
    last_signature: Option<Signature>,
    executing: bool,
}

/// Drives a held quote through the swap-build endpoint, the wallet signer,
/// and chain confirmation.
pub struct SwapExecutor {
    rpc: Arc<RpcClient>,
    signer: Arc<dyn WalletSigner>,
    state: Mutex<ExecutorState>,
}

impl SwapExecutor {
    pub fn new(rpc: Arc<RpcClient>, signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            rpc,
            signer,
            state: Mutex::new(ExecutorState::default()),
        }
    }

    /// Executes the current quote as a swap for `user`. A new attempt clears
    /// the previous transaction error before starting.
    pub async fn execute(&self, quotes: &QuoteClient, user: &Pubkey) -> Result<SwapOutcome> {
        {
            let mut state = self.state.lock();
            state.error = None;
            state.last_signature = None;
            state.executing = true;
        }

        let result = self.run(quotes, user).await;

        let mut state = self.state.lock();
        state.executing = false;
        match &result {
            Ok(outcome) => state.last_signature = Some(outcome.signature()),
            Err(err) => state.error = Some(err.to_string()),
        }
        result
    }

    async fn run(&self, quotes: &QuoteClient, user: &Pubkey) -> Result<SwapOutcome> {
        let payload = quotes.build_swap_payload(user).await?;

        let raw = BASE64_STANDARD
            .decode(&payload.swap_transaction)
            .map_err(|e| SwapError::Payload(format!("Invalid base64 transaction: {}", e)))?;
        let transaction: VersionedTransaction = bincode::deserialize(&raw)
            .map_err(|e| SwapError::Payload(format!("Failed to deserialize transaction: {}", e)))?;

        let address = self.select_wallet(user)?;
        let signature = self.signer.sign_and_submit(transaction, &address).await?;

        // The chain's null-signature sentinel means nothing was executed.
        if signature == Signature::default() {
            return Err(SwapError::NullSignature);
        }
        info!(signature = %signature, "Transaction submitted");

        if self
            .confirm_within_window(&signature, payload.last_valid_block_height)
            .await
        {
            info!(signature = %signature, "Transaction confirmed");
            Ok(SwapOutcome::Confirmed(signature))
        } else {
            // Logged, not overturned: the receipt above stands.
            warn!(signature = %signature, "Confirmation poll did not succeed within the validity window");
            Ok(SwapOutcome::SignedUnconfirmed(signature))
        }
    }

    /// Selects the connected wallet matching `user`, falling back to the
    /// first connected wallet with a warning. The fallback is a deliberate
    /// best-effort policy for hosts with multiple linked wallets.
    fn select_wallet(&self, user: &Pubkey) -> Result<Pubkey> {
        let connected = self.signer.connected_addresses();
        if connected.is_empty() {
            return Err(SwapError::Wallet("No wallet connected".to_string()));
        }

        match connected.iter().find(|address| *address == user) {
            Some(address) => Ok(*address),
            None => {
                warn!(
                    requested = %user,
                    using = %connected[0],
                    "No exact wallet match, using first available wallet"
                );
                Ok(connected[0])
            }
        }
    }

    /// Polls signature status until confirmed or the block-height ceiling
    /// from the build step passes.
    async fn confirm_within_window(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> bool {
        loop {
            match self.rpc.get_signature_statuses(&[*signature]).await {
                Ok(response) => {
                    if let Some(Some(status)) = response.value.first() {
                        if status.err.is_some() {
                            warn!(signature = %signature, error = ?status.err, "Transaction errored on chain");
                            return false;
                        }
                        if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                            return true;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Signature status query failed");
                    return false;
                }
            }

            match self.rpc.get_block_height().await {
                Ok(height) if height > last_valid_block_height => {
                    warn!(
                        height,
                        last_valid_block_height, "Validity window passed without confirmation"
                    );
                    return false;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "Block height query failed");
                    return false;
                }
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn last_signature(&self) -> Option<Signature> {
        self.state.lock().last_signature
    }

    pub fn is_executing(&self) -> bool {
        self.state.lock().executing
    }

    /// Clears error and signature state, e.g. on teardown.
    pub fn clear_state(&self) {
        let mut state = self.state.lock();
        state.error = None;
        state.last_signature = None;
    }
}
