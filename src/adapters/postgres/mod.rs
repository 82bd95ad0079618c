pub mod book_catalog;
pub mod loan_store;
pub mod user_lookup;

// パブリックに型を再エクスポート
pub use book_catalog::BookCatalog as PostgresBookCatalog;
pub use loan_store::LoanStore as PostgresLoanStore;
pub use user_lookup::UserLookup as PostgresUserLookup;
