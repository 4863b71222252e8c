pub mod page_extractor;
pub mod robots;
pub mod sitemap;

pub use page_extractor::{AssetUrls, ExtractedPage, PageExtractor};
