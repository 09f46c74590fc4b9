#![warn(
    unused_extern_crates,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::fallible_impl_from,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::dbg_macro
)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![forbid(unsafe_code)]

pub mod bitcoin;
pub mod database;
pub mod eos;
pub mod room;
pub mod swap;

mod secret;
mod swap_id;
mod timestamp;

#[cfg(test)]
mod arbitrary;

pub use self::{
    database::Database,
    secret::{Secret, SecretHash},
    swap::{Seller, Step, SwapParams},
    swap_id::{SharedSwapId, SwapId},
    timestamp::{btc_lock_time, RelativeTime, Timestamp},
};
