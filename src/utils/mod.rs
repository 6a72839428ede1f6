/// Shared helpers for process execution and retries
pub mod command;
pub mod retry;
