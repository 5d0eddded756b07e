pub mod page_fetcher;

pub use page_fetcher::{download_to_dir, BrowserFetcher, PageFetcher};
