pub mod internal_page;

pub use internal_page::{BPlusTreeInternalPage, InternalPageHeader};
