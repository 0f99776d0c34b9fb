pub mod news;

pub use news::{NewsEnvelope, NewsRecord};
