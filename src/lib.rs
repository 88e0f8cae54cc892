//! Bankroll Desk - desktop client for monitoring and withdrawing a
//! crash-game bankroll over socket RPC.

pub mod config;
pub mod divest;
pub mod format;
pub mod gui;
pub mod history;
pub mod mirror;
pub mod session;
