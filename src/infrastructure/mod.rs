pub mod cipher;
pub mod directories;
pub mod logging;
pub mod rate_limit;
pub mod shutdown;
