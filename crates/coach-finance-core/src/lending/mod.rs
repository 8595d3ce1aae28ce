pub mod commercial;
pub mod loan;
pub mod mortgage;
