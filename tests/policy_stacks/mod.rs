//! Runtime behaviour of compiled policies, alone and stacked.

mod breaker;
mod bulkhead;
mod cache;
mod order_verification;
mod retry;
mod test_utils;
