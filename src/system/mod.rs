pub mod collector;
pub mod filter;
pub mod process;
pub mod snapshot;
pub mod source;
