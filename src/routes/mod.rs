pub mod cache;
pub mod catalog;
pub mod share;
pub mod timeline;
pub mod util;
