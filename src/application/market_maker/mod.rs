//! Fixed-product market maker.
//!
//! A pool holds one position per combined outcome of its conditions and
//! trades them against collateral along the constant-product curve.
//! Liquidity providers own pool shares and collect a pro-rata cut of every
//! trading fee through the fee-pool weight.
//!
//! - `pool`: state, views and split/merge plumbing
//! - `funding`: add and remove liquidity, move shares
//! - `trading`: quotes, buy and sell
//! - `fees`: fee settlement and withdrawal

mod fees;
mod funding;
mod pool;
mod trading;

pub use pool::MarketMaker;
