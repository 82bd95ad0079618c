pub mod book_catalog;
pub mod clock;
pub mod loan_store;
pub mod notifier;
pub mod user_lookup;

pub use book_catalog::BookCatalog;
pub use clock::Clock;
pub use loan_store::LoanStore;
pub use notifier::{Notifier, SentMessage};
pub use user_lookup::UserLookup;
