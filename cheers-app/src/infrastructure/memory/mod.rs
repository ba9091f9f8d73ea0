mod toast_repository;

pub use toast_repository::InMemoryToastRepository;
