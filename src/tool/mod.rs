/// kubectl version resolution and binary fetching
pub mod fetcher;
pub mod platform;
pub mod version;

pub use fetcher::BinaryFetcher;
pub use platform::Platform;
pub use version::VersionResolver;
