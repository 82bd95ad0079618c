mod errors;
mod loan_service;
mod notification;
mod overdue_scanner;

pub use errors::{LoanApplicationError, NotificationFailed, Result};
pub use loan_service::{
    LoanOutcome, LoanPolicy, ServiceDependencies, create_loan, get_loans_for_user, list_due_soon,
    return_loan,
};
pub use notification::{Notice, due_soon_reminder, loan_confirmation, return_notice};
pub use overdue_scanner::{OverdueScanner, ScanReport, ScannerHandle, ScannerSettings};
