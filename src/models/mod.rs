pub mod dataset;
pub mod filter;
pub mod page;
pub mod record;

pub use dataset::*;
pub use filter::*;
pub use page::*;
pub use record::*;
