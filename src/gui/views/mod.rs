//! View rendering functions, one per navigation section.

mod history;
mod home;
mod withdraw;

pub use history::view_history;
pub use home::view_home;
pub use withdraw::view_withdraw;
