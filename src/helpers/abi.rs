use ethers::abi::{self, Detokenize, ParamType, Token, Tokenizable};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;

use crate::errors::ApiError;

/// Calldata for `signature` (e.g. `getVideo(uint256)`) applied to `args`.
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(abi::encode(args));
    data.into()
}

/// Decodes return data laid out as `outputs` into a typed value or tuple.
pub fn decode_output<D: Detokenize>(outputs: &[ParamType], data: &[u8]) -> Result<D, ApiError> {
    let tokens = abi::decode(outputs, data).map_err(|e| ApiError::Decode(e.to_string()))?;
    D::from_tokens(tokens).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decodes a single dynamic array of tuples, e.g. `(address,string,uint256)[]`.
pub fn decode_tuple_array<T: Tokenizable>(fields: Vec<ParamType>, data: &[u8]) -> Result<Vec<T>, ApiError> {
    let outputs = [ParamType::Array(Box::new(ParamType::Tuple(fields)))];
    let mut tokens = abi::decode(&outputs, data).map_err(|e| ApiError::Decode(e.to_string()))?;

    let items = tokens
        .pop()
        .and_then(Token::into_array)
        .ok_or_else(|| ApiError::Decode("expected an array".to_string()))?;

    items
        .into_iter()
        .map(|item| T::from_token(item).map_err(|e| ApiError::Decode(e.to_string())))
        .collect()
}

pub fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

/// Ids and counts come back as uint256 but are small in practice.
pub fn to_u64(value: U256) -> Result<u64, ApiError> {
    if value > U256::from(u64::MAX) {
        return Err(ApiError::Decode(format!("value {} does not fit in 64 bits", value)));
    }
    Ok(value.as_u64())
}

pub fn parse_address(text: &str) -> Result<Address, ApiError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::Validation(format!("Invalid address: {}", text)));
    }

    digits
        .parse::<Address>()
        .map_err(|_| ApiError::Validation(format!("Invalid address: {}", text)))
}
