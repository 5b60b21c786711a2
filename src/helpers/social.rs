use ethers::abi::{ParamType, Token};
use ethers::types::{Address, Bytes, U256};

use crate::config::ChainConfig;
use crate::errors::ApiError;
use crate::helpers::abi::{decode_output, decode_tuple_array, encode_call, to_u64, uint};
use crate::helpers::chain::ChainReader;
use crate::helpers::discovery::MAX_PAGE_SIZE;
use crate::helpers::fees::format_eth;
use crate::models::{Comment, Tip, TipBalance};

/// Typed view functions of the social contract: comments and tips.
pub struct SocialContract<'a> {
    reader: &'a dyn ChainReader,
    chain: &'a ChainConfig,
    address: Address,
}

impl<'a> SocialContract<'a> {
    pub fn new(reader: &'a dyn ChainReader, chain: &'a ChainConfig) -> Result<Self, ApiError> {
        Ok(SocialContract {
            reader,
            chain,
            address: chain.social()?,
        })
    }

    async fn read(&self, signature: &str, args: &[Token]) -> Result<Bytes, ApiError> {
        self.reader
            .call(self.chain, self.address, encode_call(signature, args), None)
            .await
    }

    /// Comments `offset..offset + limit` on `video_id`, oldest first. Indexes are positions in the full list.
    pub async fn get_comments(&self, video_id: u64, offset: u64, limit: u64) -> Result<Vec<Comment>, ApiError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let data = self
            .read(
                "getComments(uint256,uint256,uint256)",
                &[uint(video_id), uint(offset), uint(limit)],
            )
            .await?;

        let rows: Vec<(Address, String, U256, U256, bool)> = decode_tuple_array(
            vec![
                ParamType::Address,
                ParamType::String,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Bool,
            ],
            &data,
        )?;

        rows.into_iter()
            .zip(offset..)
            .map(|((author, content, timestamp, likes, is_deleted), index)| {
                Ok(Comment {
                    index,
                    author,
                    content,
                    timestamp: to_u64(timestamp)?,
                    likes: to_u64(likes)?,
                    is_deleted,
                })
            })
            .collect()
    }

    pub async fn creator_tips(&self, creator: Address, offset: u64, limit: u64) -> Result<Vec<Tip>, ApiError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let data = self
            .read(
                "getCreatorTips(address,uint256,uint256)",
                &[Token::Address(creator), uint(offset), uint(limit)],
            )
            .await?;

        let rows: Vec<(Address, U256, String, U256)> = decode_tuple_array(
            vec![
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::String,
                ParamType::Uint(256),
            ],
            &data,
        )?;

        rows.into_iter()
            .map(|(tipper, amount, message, timestamp)| {
                Ok(Tip {
                    tipper,
                    amount,
                    amount_eth: format_eth(amount, 6),
                    message,
                    timestamp: to_u64(timestamp)?,
                })
            })
            .collect()
    }

    /// Tips received and not yet withdrawn.
    pub async fn creator_tip_balance(&self, creator: Address) -> Result<TipBalance, ApiError> {
        let data = self
            .read("creatorTipBalance(address)", &[Token::Address(creator)])
            .await?;
        let balance: U256 = decode_output(&[ParamType::Uint(256)], &data)?;

        Ok(TipBalance::new(creator, balance))
    }
}

#[cfg(test)]
mod tests {
    use ethers::abi;

    use super::*;
    use crate::test_support::{addr, arg, test_config, uint_return, MockChain};

    fn comment(author: u8, content: &str, likes: u64, deleted: bool) -> Token {
        Token::Tuple(vec![
            Token::Address(addr(author)),
            Token::String(content.to_string()),
            uint(1_700_000_000),
            uint(likes),
            Token::Bool(deleted),
        ])
    }

    #[actix_web::test]
    async fn comments_are_indexed_from_the_offset() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let mock = MockChain::new().on("getComments(uint256,uint256,uint256)", |args| {
            assert_eq!(arg(args, 0), 4);
            assert_eq!(arg(args, 2), MAX_PAGE_SIZE);
            Ok(abi::encode(&[Token::Array(vec![
                comment(0x01, "first!", 2, false),
                comment(0x02, "", 0, true),
            ])]))
        });

        let comments = SocialContract::new(&mock, chain)
            .unwrap()
            .get_comments(4, 10, 500)
            .await
            .unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].index, 10);
        assert_eq!(comments[0].author, addr(0x01));
        assert_eq!(comments[0].likes, 2);
        assert_eq!(comments[1].index, 11);
        assert!(comments[1].is_deleted);
    }

    #[actix_web::test]
    async fn tips_and_balance_decode() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let mock = MockChain::new()
            .on("getCreatorTips(address,uint256,uint256)", |_| {
                Ok(abi::encode(&[Token::Array(vec![Token::Tuple(vec![
                    Token::Address(addr(0x03)),
                    Token::Uint(U256::from(2_000_000_000_000_000u64)),
                    Token::String("love it".to_string()),
                    uint(1_700_000_000),
                ])])]))
            })
            .on("creatorTipBalance(address)", |_| Ok(uint_return(5_000_000_000_000_000u64)));

        let social = SocialContract::new(&mock, chain).unwrap();

        let tips = social.creator_tips(addr(0xaa), 0, 20).await.unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].tipper, addr(0x03));
        assert_eq!(tips[0].amount_eth, "0.002000");
        assert_eq!(tips[0].message, "love it");

        let balance = social.creator_tip_balance(addr(0xaa)).await.unwrap();
        assert_eq!(balance.balance, U256::from(5_000_000_000_000_000u64));
        assert_eq!(balance.balance_eth, "0.005000");
    }

    #[test]
    fn missing_social_contract_is_a_config_error() {
        let config = crate::config::Config::from_lookup(|_| None).unwrap();
        let mock = MockChain::new();

        assert!(SocialContract::new(&mock, config.chain(None).unwrap()).is_err());
    }
}
