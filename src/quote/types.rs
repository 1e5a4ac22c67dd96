use serde::{Deserialize, Serialize};

/// One hop of the route plan returned by the router. Opaque to the swap
/// pipeline: it is echoed back verbatim when building the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub amm_key: String,
    pub label: Option<String>,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    pub fee_amount: String,
    pub fee_mint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFee {
    pub amount: String,
    pub fee_bps: i32,
}

/// A price quote from the router. Held as the single "current quote" until
/// superseded or consumed by the swap build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    pub other_amount_threshold: String,
    pub swap_mode: String,
    pub slippage_bps: u16,
    #[serde(default)]
    pub platform_fee: Option<PlatformFee>,
    pub price_impact_pct: String,
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    #[serde(default)]
    pub time_taken: Option<f64>,
}

/// Priority-fee hint: let the router pick the level but cap the spend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityLevelWithMaxLamports {
    pub max_lamports: u64,
    pub priority_level: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFeeLamports {
    pub priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub user_public_key: String,
    pub quote_response: QuoteResponse,
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_compute_unit_limit: bool,
    pub dynamic_slippage: bool,
    pub prioritization_fee_lamports: PrioritizationFeeLamports,
}

/// The opaque, fee-optimized transaction payload plus its validity window.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64-encoded serialized transaction.
    pub swap_transaction: String,
    pub last_valid_block_height: u64,
    #[serde(default)]
    pub prioritization_fee_lamports: Option<u64>,
    #[serde(default)]
    pub compute_unit_limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_response_deserializes_router_shape() {
        let raw = r#"{
            "inputMint": "7BMxgTQhTthoBcQizzFoLyhmSDscM56uMramXGMhpump",
            "inAmount": "50000000",
            "outputMint": "So11111111111111111111111111111111111111112",
            "outAmount": "2000000000",
            "otherAmountThreshold": "1990000000",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "priceImpactPct": "0.01",
            "routePlan": [{
                "swapInfo": {
                    "ammKey": "amm111",
                    "label": "Meteora",
                    "inputMint": "7BMxgTQhTthoBcQizzFoLyhmSDscM56uMramXGMhpump",
                    "outputMint": "So11111111111111111111111111111111111111112",
                    "inAmount": "50000000",
                    "outAmount": "2000000000",
                    "feeAmount": "2500",
                    "feeMint": "7BMxgTQhTthoBcQizzFoLyhmSDscM56uMramXGMhpump"
                },
                "percent": 100
            }],
            "contextSlot": 123456789
        }"#;

        let quote: QuoteResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(quote.in_amount, "50000000");
        assert_eq!(quote.out_amount, "2000000000");
        assert_eq!(quote.slippage_bps, 50);
        assert_eq!(quote.route_plan.len(), 1);
        assert_eq!(quote.route_plan[0].percent, 100);
    }

    #[test]
    fn test_swap_request_serializes_priority_ceiling() {
        let quote: QuoteResponse = serde_json::from_str(
            r#"{
                "inputMint": "a", "inAmount": "1", "outputMint": "b",
                "outAmount": "2", "otherAmountThreshold": "2",
                "swapMode": "ExactIn", "slippageBps": 50,
                "priceImpactPct": "0", "routePlan": []
            }"#,
        )
        .unwrap();

        let request = SwapRequest {
            user_public_key: "user111".to_string(),
            quote_response: quote,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            dynamic_slippage: true,
            prioritization_fee_lamports: PrioritizationFeeLamports {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: 1_000_000,
                    priority_level: "veryHigh".to_string(),
                },
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dynamicComputeUnitLimit"], true);
        assert_eq!(json["dynamicSlippage"], true);
        assert_eq!(
            json["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["maxLamports"],
            1_000_000
        );
    }

    #[test]
    fn test_swap_response_deserializes_validity_window() {
        let raw = r#"{
            "swapTransaction": "AQAB",
            "lastValidBlockHeight": 279632475,
            "prioritizationFeeLamports": 9999,
            "computeUnitLimit": 388876
        }"#;
        let response: SwapResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.last_valid_block_height, 279632475);
        assert_eq!(response.prioritization_fee_lamports, Some(9999));
    }
}
