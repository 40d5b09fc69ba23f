pub mod candidate;
pub mod email;
pub mod employee;
pub mod job_posting;
pub mod leave_balance;
pub mod leave_request;
pub mod leave_type;
pub mod role;
