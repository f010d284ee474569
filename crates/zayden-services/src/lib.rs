//! # zayden-services
//!
//! Implementations of the external collaborators: the HTTP scraper client
//! and the ffmpeg-backed media converter, plus sticker metadata embedding.

pub mod exif;
pub mod ffmpeg;
pub mod http;

pub use ffmpeg::FfmpegConverter;
pub use http::HttpScraper;
