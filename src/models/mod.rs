mod content;

pub use content::{
    ContentItem, ContentUpdate, CountEntry, NewContent, PageMetadata, SearchRequest,
    DEFAULT_PLATFORM,
};
