//! Jupiter Adapter
//!
//! Ultra and quote/swap execution venues, wallet holdings snapshots and
//! token metadata lookup against Jupiter's HTTP APIs.

mod client;
mod quote;
mod swap;
mod token_list;
mod ultra;
mod venue;

pub use client::{JupiterClient, JupiterConfig};
pub use quote::{QuoteRequest, QuoteResponse};
pub use swap::{SwapRequest, SwapResponse};
pub use token_list::{TokenDirectory, TokenInfo};
pub use ultra::{ExecuteRequest, ExecuteResponse, HoldingsResponse, OrderRequest, OrderResponse};
pub use venue::{QuoteSwapVenue, UltraVenue};
