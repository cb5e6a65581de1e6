pub mod error;
pub mod models;
pub mod types;

pub use error::{
    BackendErrorKind, Error, ExtractionFailure, FetchError, Result, SendError, TranslationFailure,
};
pub use models::{Fetcher, Messenger, TranslationModel};
pub use types::{
    ArticleSource, Backend, ChatId, ChatRef, ExtractedArticle, InboundMessage, TextKind,
    TranslationRequest, TARGET_LANGUAGE,
};
