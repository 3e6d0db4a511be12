//! In-memory store adapters.
//!
//! Each store keeps a table behind a `std::sync::RwLock`. Records that change
//! after creation (households, polls) sit behind their own `Mutex` so that
//! membership and vote mutations are serialised per record without blocking
//! the whole table. No lock is held across an `.await`.
//!
//! Lock poisoning is reported through each port's `Query` error.

mod household_repository;
mod poll_repository;
mod user_repository;

pub use household_repository::InMemoryHouseholdRepository;
pub use poll_repository::InMemoryPollRepository;
pub use user_repository::InMemoryUserRepository;

fn poisoned(lock: &str) -> String {
    format!("{lock} lock poisoned")
}
