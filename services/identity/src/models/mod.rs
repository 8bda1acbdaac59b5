//! Data models for the identity service

pub mod channel;
pub mod user;

pub use channel::ChannelProfile;
pub use user::{LoginCredentials, NewUser, PublicUser, User};
