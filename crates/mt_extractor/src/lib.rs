pub mod extractor;
pub mod fetcher;
pub mod links;

pub use extractor::{ClassRule, Extractor, ExtractorConfig};
pub use fetcher::HttpFetcher;
pub use links::{first_url, parse_command, Command};

pub mod prelude {
    pub use super::extractor::{Extractor, ExtractorConfig};
    pub use super::fetcher::HttpFetcher;
    pub use mt_core::{ArticleSource, ExtractedArticle, ExtractionFailure, FetchError, Fetcher};
}
