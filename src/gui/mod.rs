//! GUI module for the Bankroll Desk application
//!
//! This module provides the graphical user interface built with egui/eframe.
//!
//! ## Module Structure
//!
//! - `app` - Main GuiApp struct, state types, and core application logic
//! - `async_job` - Generic async job polling for background tasks
//! - `theme` - Centralized theme and styling system (AppTheme)
//! - `confirm` - Modal confirmation prompt shared with the withdrawal protocol
//! - `notifications` - Notification feed shown in the top bar
//! - `views` - View rendering functions (home, history, withdrawal form)
//!
//! ## Usage
//!
//! ```no_run
//! use bankroll_desk::config::Config;
//! use bankroll_desk::gui;
//!
//! let config = Config::default();
//! gui::launch(config).expect("Failed to launch GUI");
//! ```

mod app;
pub mod async_job;
pub mod confirm;
pub mod notifications;
pub mod theme;
pub mod views;

// Re-export main public API
pub use app::{launch, GuiApp, GuiSection};

// Re-export commonly used types from submodules for convenience
pub use async_job::AsyncJob;
pub use confirm::ModalConfirm;
pub use notifications::{NotificationEntry, NotificationKind};
pub use theme::{configure_style, AppTheme};
