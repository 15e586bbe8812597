//! Attachment acquisition for Relaycord: HTTP download and image
//! re-encoding.

pub mod fetcher;
pub mod normalizer;

pub use fetcher::HttpFetcher;
pub use normalizer::JpegNormalizer;
