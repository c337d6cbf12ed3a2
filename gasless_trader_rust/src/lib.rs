pub mod api;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod retry;
pub mod signer;
#[cfg(test)]
pub mod tests;
