pub mod assets;
pub mod response;
pub mod sentry;
pub mod stats;
