use async_trait::async_trait;
use rand::Rng;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, SwapError};

/// External wallet interface: signs and submits a prebuilt transaction on
/// behalf of one of its connected addresses. The variant (real or simulated)
/// is chosen at construction time, not probed at runtime.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Addresses of all currently connected wallets.
    fn connected_addresses(&self) -> Vec<Pubkey>;

    /// Signs the transaction with the wallet for `address` and submits it.
    async fn sign_and_submit(
        &self,
        transaction: VersionedTransaction,
        address: &Pubkey,
    ) -> Result<Signature>;
}

/// Network-backed signer holding local keypairs and submitting through RPC.
pub struct KeypairSigner {
    rpc: Arc<RpcClient>,
    keypairs: Vec<Keypair>,
}

impl KeypairSigner {
    pub fn new(rpc: Arc<RpcClient>, keypairs: Vec<Keypair>) -> Self {
        Self { rpc, keypairs }
    }

    /// Builds a signer from base58-encoded private keys, the format wallet
    /// exports use.
    pub fn from_base58(rpc: Arc<RpcClient>, keys: &[&str]) -> Result<Self> {
        let keypairs = keys
            .iter()
            .map(|key| {
                let bytes = bs58::decode(key)
                    .into_vec()
                    .map_err(|e| SwapError::ConfigError(format!("Invalid base58 private key: {}", e)))?;
                Keypair::from_bytes(&bytes)
                    .map_err(|e| SwapError::ConfigError(format!("Failed to create keypair: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rpc, keypairs })
    }
}

#[async_trait]
impl WalletSigner for KeypairSigner {
    fn connected_addresses(&self) -> Vec<Pubkey> {
        self.keypairs.iter().map(|kp| kp.pubkey()).collect()
    }

    async fn sign_and_submit(
        &self,
        mut transaction: VersionedTransaction,
        address: &Pubkey,
    ) -> Result<Signature> {
        let keypair = self
            .keypairs
            .iter()
            .find(|kp| kp.pubkey() == *address)
            .ok_or_else(|| SwapError::Wallet(format!("No keypair for address {}", address)))?;

        let num_signers = transaction.signatures.len();
        let slot = transaction
            .message
            .static_account_keys()
            .iter()
            .take(num_signers)
            .position(|key| key == address)
            .ok_or_else(|| {
                SwapError::Wallet(format!("Address {} is not a required signer", address))
            })?;

        let signature = keypair.sign_message(&transaction.message.serialize());
        transaction.signatures[slot] = signature;

        info!(signature = %signature, "Transaction signed, submitting");
        self.rpc
            .send_transaction(&transaction)
            .await
            .map_err(|e| SwapError::SolanaRpc(format!("Failed to send transaction: {}", e)))
    }
}

/// Signer for configurations without a wallet hook: sleeps to mimic network
/// latency, then returns a synthetic signature without touching the chain.
pub struct SimulatedSigner {
    addresses: Vec<Pubkey>,
    delay: Duration,
}

impl SimulatedSigner {
    pub fn new(addresses: Vec<Pubkey>) -> Self {
        Self {
            addresses,
            delay: Duration::from_secs(2),
        }
    }

    pub fn with_delay(addresses: Vec<Pubkey>, delay: Duration) -> Self {
        Self { addresses, delay }
    }
}

#[async_trait]
impl WalletSigner for SimulatedSigner {
    fn connected_addresses(&self) -> Vec<Pubkey> {
        self.addresses.clone()
    }

    async fn sign_and_submit(
        &self,
        _transaction: VersionedTransaction,
        address: &Pubkey,
    ) -> Result<Signature> {
        warn!(address = %address, "Simulated signer active: transaction will not reach the chain");
        tokio::time::sleep(self.delay).await;

        let mut bytes = [0u8; 64];
        rand::thread_rng().fill(&mut bytes[..]);
        let signature = Signature::from(bytes);
        info!(signature = %signature, "Simulated transaction complete");
        Ok(signature)
    }
}
