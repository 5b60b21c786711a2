use ethers::types::U256;
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::as_string;

// Platform fee: 6%
pub const PLATFORM_FEE_BPS: u64 = 600;
pub const BPS_DENOMINATOR: u64 = 10_000;

pub const WEI_PER_ETH: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);
const ETH_DECIMALS: usize = 18;

/// 0.0001 ETH, the lowest price a video, tier or bundle can be listed at.
pub const MIN_PRICE_WEI: U256 = U256([100_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    #[serde(serialize_with = "as_string")]
    pub platform_fee: U256,
    #[serde(serialize_with = "as_string")]
    pub creator_earning: U256,
}

/// Splits a payment the way the contract does: `price * 600 / 10000` to the
/// platform, the remainder to the creator.
pub fn calculate_fees(price: U256) -> FeeSplit {
    let bps = U256::from(PLATFORM_FEE_BPS);
    let denominator = U256::from(BPS_DENOMINATOR);

    // price * bps / denom without the intermediate product overflowing
    let platform_fee = price / denominator * bps + price % denominator * bps / denominator;

    FeeSplit {
        platform_fee,
        creator_earning: price - platform_fee,
    }
}

/// Renders wei as ETH with `decimals` fractional digits, rounding half up.
pub fn format_eth(wei: U256, decimals: usize) -> String {
    let decimals = decimals.min(ETH_DECIMALS);
    let scale = U256::exp10(ETH_DECIMALS - decimals);

    let mut units = wei / scale;
    if scale > U256::one() && (wei % scale) * U256::from(2) >= scale {
        units = units.saturating_add(U256::one());
    }

    if decimals == 0 {
        return units.to_string();
    }

    let divisor = U256::exp10(decimals);
    format!(
        "{}.{:0width$}",
        units / divisor,
        (units % divisor).as_u64(),
        width = decimals
    )
}

/// Parses a decimal ETH amount into wei. Digits past the 18th decimal are dropped.
pub fn parse_eth(text: &str) -> Result<U256, ApiError> {
    let text = text.trim();
    let invalid = || ApiError::Validation(format!("Invalid ETH amount: {}", text));

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole_wei = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| invalid())?
    };

    let mut digits: String = fraction.chars().take(ETH_DECIMALS).collect();
    while digits.len() < ETH_DECIMALS {
        digits.push('0');
    }
    let fraction_wei = digits.parse::<u64>().map_err(|_| invalid())?;

    whole_wei
        .checked_mul(WEI_PER_ETH)
        .and_then(|wei| wei.checked_add(U256::from(fraction_wei)))
        .ok_or_else(invalid)
}

/// Parses a listing price and enforces the minimum.
pub fn parse_price(text: &str) -> Result<U256, ApiError> {
    let price = parse_eth(text)?;
    check_min_price(price)?;
    Ok(price)
}

pub fn check_min_price(price: U256) -> Result<(), ApiError> {
    if price < MIN_PRICE_WEI {
        return Err(ApiError::Validation("Minimum price is 0.0001 ETH".to_string()));
    }
    Ok(())
}
