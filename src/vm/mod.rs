pub mod bridge;
pub mod notifier;
