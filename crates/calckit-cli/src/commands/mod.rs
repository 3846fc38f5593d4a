pub mod investment;
pub mod loan;
