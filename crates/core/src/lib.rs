#![forbid(unsafe_code)]

pub mod filter;
pub mod model;
pub mod paging;
pub mod reveal;
pub mod scoring;

pub use filter::FilterCriteria;
pub use paging::Paginator;
pub use reveal::{RevealMode, RevealTracker};
pub use scoring::{OptionStatus, PageScore, SheetStatus};
