pub mod clock;
pub mod notifier;

pub use clock::SystemClock;
pub use notifier::LogNotifier;
