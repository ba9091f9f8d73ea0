pub mod local_store;
pub mod memory;

#[cfg(feature = "db")]
pub mod db;

#[cfg(feature = "http")]
pub mod http;
