pub mod collection;
pub mod detail;

// Re-export handler functions for use in routing
pub use collection::get as collection_get;
pub use collection::post as collection_post;

pub use detail::delete as detail_delete;
pub use detail::get as detail_get;
pub use detail::patch as detail_patch;
