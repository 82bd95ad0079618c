pub mod notifier;

pub use notifier::SmtpNotifier;
