use crate::api::candidate::{CandidateFilter, CandidateStatusReq, CreateCandidate};
use crate::api::email::{CreateTemplate, UpsertEmailConfig};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::job_posting::{CreatePosting, PostingFilter};
use crate::api::leave_balance::BalanceFilter;
use crate::api::leave_request::{CreateLeave, DecisionReq, LeaveFilter, LeaveListResponse};
use crate::api::leave_type::CreateLeaveType;
use crate::api::payroll::{
    CreatePayroll, PaginatedPayrollResponse, PayrollQuery, PayrollResponse, UpdatePayroll,
};
use crate::model::candidate::Candidate;
use crate::model::email::{EmailConfiguration, EmailTemplate};
use crate::model::employee::Employee;
use crate::model::job_posting::JobPosting;
use crate::model::leave_balance::LeaveBalanceView;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Core API",
        version = "1.0.0",
        description = r#"
## Multi-tenant HR Management System

This API powers a multi-tenant HR system. Every record belongs to a tenant
(company); the tenant is taken from the caller's JWT and threaded through
every query.

### Key Features
- **Employee Management**
  - Create, update, list, and view employee profiles with generated employee codes
- **Leave Management**
  - Leave type catalog per tenant, running balances with accrual, and the
    request/approve/reject/cancel workflow
- **Recruitment**
  - Job postings and candidate pipeline
- **Payroll Management**
  - Generate payrolls, update salaries, and view payroll records
- **Email Configuration**
  - Per-tenant templates and SMTP settings

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Only authorized roles such as **Admin** or **Manager** can access sensitive operations.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::delete_leave,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::get_leave_type,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_balance::list_balances,
        crate::api::leave_balance::initialize_balances,
        crate::api::leave_balance::accrue_balances,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::job_posting::create_posting,
        crate::api::job_posting::list_postings,
        crate::api::job_posting::get_posting,
        crate::api::job_posting::update_posting,
        crate::api::job_posting::delete_posting,

        crate::api::candidate::create_candidate,
        crate::api::candidate::list_candidates,
        crate::api::candidate::get_candidate,
        crate::api::candidate::update_candidate_status,
        crate::api::candidate::delete_candidate,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,

        crate::api::email::create_template,
        crate::api::email::list_templates,
        crate::api::email::get_template,
        crate::api::email::update_template,
        crate::api::email::delete_template,
        crate::api::email::get_email_config,
        crate::api::email::upsert_email_config
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveRequest,
            LeaveListResponse,
            CreateLeave,
            DecisionReq,
            LeaveType,
            CreateLeaveType,
            LeaveBalanceView,
            BalanceFilter,
            CreateEmployee,
            EmployeeQuery,
            Employee,
            EmployeeListResponse,
            JobPosting,
            CreatePosting,
            PostingFilter,
            Candidate,
            CreateCandidate,
            CandidateStatusReq,
            CandidateFilter,
            PaginatedPayrollResponse,
            PayrollResponse,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            EmailTemplate,
            CreateTemplate,
            EmailConfiguration,
            UpsertEmailConfig
        )
    ),
    tags(
        (name = "Leave", description = "Leave request workflow APIs"),
        (name = "Leave Type", description = "Leave type catalog APIs"),
        (name = "Leave Balance", description = "Leave balance ledger APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Recruitment", description = "Job posting and candidate APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Email", description = "Email template and SMTP configuration APIs"),
    )
)]
pub struct ApiDoc;
