//! Session store module
//!
//! Holds at most one signed-in user profile and mirrors it to durable
//! storage so it survives a daemon restart:
//! - `UserProfile`: the resident profile
//! - `ProfileStorage`: key/value durable storage (file backed in the daemon)
//! - `SessionStore`: sign-in, sign-out and rehydration

mod profile;
mod storage;
mod store;

pub use profile::UserProfile;
pub use storage::FileStorage;
pub use store::SessionStore;

#[cfg(test)]
pub use storage::MemoryStorage;
