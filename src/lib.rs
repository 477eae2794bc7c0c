//! sponsorlens - sponsored post detection for Naver blog search.
//!
//! Searches blog posts, crawls each hit and decides whether it is a paid
//! review. Text evidence is checked first; image and sticker OCR follows, and
//! expensive OCR on recent posts is handed to a background queue.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod scrapers;
pub mod server;
pub mod services;
pub mod utils;
