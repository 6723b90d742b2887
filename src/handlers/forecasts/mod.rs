pub mod collection;
pub mod page;
pub mod record;

/// Base of the continuation links emitted by paged reads
pub const NEXT_PAGE_PATH: &str = "/api/forecasts/page/next";

// Re-export handler functions for use in routing
pub use collection::get as collection_get;
pub use collection::post as collection_post;

pub use record::get as record_get;
pub use record::put as record_put;
pub use record::delete as record_delete;

pub use page::first as page_first;
pub use page::next as page_next;
