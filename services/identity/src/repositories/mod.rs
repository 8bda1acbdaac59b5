//! Postgres-backed implementations of the store traits

pub mod subscription;
pub mod user;

pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
