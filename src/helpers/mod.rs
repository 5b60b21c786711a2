pub mod abi;
pub mod access;
pub mod cache;
pub mod chain;
pub mod contract;
pub mod discovery;
pub mod fees;
pub mod ipfs;
pub mod multipart_parsing;
pub mod paywall;
pub mod pinata;
pub mod social;
