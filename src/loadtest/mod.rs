pub mod error;
pub mod options;
pub mod request;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod webhook_get;
pub mod webhook_post;
