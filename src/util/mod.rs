pub mod retry;
pub mod rich_text;
