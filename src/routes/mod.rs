pub mod comments;
pub mod creators;
pub mod platform;
pub mod subscriptions;
pub mod transactions;
pub mod upload;
pub mod video;
