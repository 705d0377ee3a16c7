pub mod clock;
pub mod retry;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::FixedClock;
pub use retry::{retry_on_transient, IsTransient, RetryConfig};
