pub mod clock;
pub mod manager;
pub mod model;
pub mod storage;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use manager::OtpManager;
pub use storage::sqlite_backend::SqliteBackend;
