pub mod metadata;

pub use metadata::{ExtractionRules, MetadataExtractor};
