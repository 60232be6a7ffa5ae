pub mod config;
pub mod cookie;
pub mod crawler;
pub mod docx;
pub mod logger;
pub mod models;
pub mod selection;
pub mod titles;
pub mod utils;

pub use config::Config;
pub use crawler::{BackupCrawler, BackupSummary, ContentError, LoginState, Processor};
pub use docx::Docx;
pub use models::{Chapter, ChapterContent, Work};
