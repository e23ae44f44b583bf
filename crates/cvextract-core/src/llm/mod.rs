pub mod openai;
pub mod prompt;

use crate::error::CvError;
use crate::extraction::PageImage;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text completion that must answer with a single JSON object.
pub trait ChatClient: Send + Sync {
    fn complete_json<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<serde_json::Value, CvError>>;
}

/// Vision completion that transcribes the text visible in one page image.
pub trait VisionClient: Send + Sync {
    fn transcribe<'a>(&'a self, image: &'a PageImage) -> BoxFuture<'a, Result<String, CvError>>;
}
