use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::convert::TryFrom;
use std::env;

pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_JUPITER_API_URL: &str = "https://lite-api.jup.ag/swap/v1";
pub const DEFAULT_TOKEN_LIST_URL: &str = "https://token.jup.ag/all";

pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;
pub const DEFAULT_QUOTE_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MAX_ACCOUNTS: u8 = 64;
pub const DEFAULT_MAX_PRIORITY_FEE_LAMPORTS: u64 = 1_000_000;
pub const DEFAULT_BALANCE_REFRESH_DELAY_MS: u64 = 2_000;
pub const DEFAULT_TOKEN_LIST_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Network endpoints
    pub solana_rpc_url: String,
    pub jupiter_api_url: String,
    pub token_list_url: String,

    // Quoting
    pub slippage_bps: u16,
    pub quote_debounce_ms: u64,
    pub max_accounts: u8,

    // Execution
    pub max_priority_fee_lamports: u64,
    pub balance_refresh_delay_ms: u64,

    // Decimals resolution
    pub token_list_timeout_ms: u64,

    // When true, swaps go through the simulated signer instead of a
    // network-backed wallet.
    pub simulation_mode: bool,

    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solana_rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            jupiter_api_url: DEFAULT_JUPITER_API_URL.to_string(),
            token_list_url: DEFAULT_TOKEN_LIST_URL.to_string(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            quote_debounce_ms: DEFAULT_QUOTE_DEBOUNCE_MS,
            max_accounts: DEFAULT_MAX_ACCOUNTS,
            max_priority_fee_lamports: DEFAULT_MAX_PRIORITY_FEE_LAMPORTS,
            balance_refresh_delay_ms: DEFAULT_BALANCE_REFRESH_DELAY_MS,
            token_list_timeout_ms: DEFAULT_TOKEN_LIST_TIMEOUT_MS,
            simulation_mode: false,
            log_level: "info".to_string(),
        }
    }
}

impl TryFrom<Config> for Settings {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let defaults = Settings::default();
        Ok(Settings {
            solana_rpc_url: config
                .get_string("solana_rpc_url")
                .unwrap_or(defaults.solana_rpc_url),
            jupiter_api_url: config
                .get_string("jupiter_api_url")
                .unwrap_or(defaults.jupiter_api_url),
            token_list_url: config
                .get_string("token_list_url")
                .unwrap_or(defaults.token_list_url),
            slippage_bps: config
                .get_int("slippage_bps")
                .map(|v| v as u16)
                .unwrap_or(defaults.slippage_bps),
            quote_debounce_ms: config
                .get_int("quote_debounce_ms")
                .map(|v| v as u64)
                .unwrap_or(defaults.quote_debounce_ms),
            max_accounts: config
                .get_int("max_accounts")
                .map(|v| v as u8)
                .unwrap_or(defaults.max_accounts),
            max_priority_fee_lamports: config
                .get_int("max_priority_fee_lamports")
                .map(|v| v as u64)
                .unwrap_or(defaults.max_priority_fee_lamports),
            balance_refresh_delay_ms: config
                .get_int("balance_refresh_delay_ms")
                .map(|v| v as u64)
                .unwrap_or(defaults.balance_refresh_delay_ms),
            token_list_timeout_ms: config
                .get_int("token_list_timeout_ms")
                .map(|v| v as u64)
                .unwrap_or(defaults.token_list_timeout_ms),
            simulation_mode: config
                .get_bool("simulation_mode")
                .unwrap_or(defaults.simulation_mode),
            log_level: config.get_string("log_level").unwrap_or(defaults.log_level),
        })
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = ConfigBuilder::<DefaultState>::default()
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("WAGUS"))
            .build()?;

        Settings::try_from(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let config = ConfigBuilder::<DefaultState>::default()
            .add_source(Environment::default())
            .build()?;

        Settings::try_from(config)
    }
}
