mod client;
mod types;

pub use client::HttpToastRepository;
pub use types::{CreateToastRequest, RandomToastRequest, VoteRequest};
