pub mod accounts;
pub mod error;
pub mod posts;
pub mod slug;
pub mod statistics;
pub mod summarizer;
