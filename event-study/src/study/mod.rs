//! Event-study calculations.
//!
//! - Session-aligned return windows around an event
//! - Fixed-horizon returns after an event

pub mod horizon;
pub mod window;

pub use horizon::{horizon_returns, HorizonReturn, DEFAULT_HORIZONS};
pub use window::{window_returns, WindowSpec, WindowedReturns};
