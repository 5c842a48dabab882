pub mod attendance;
pub mod employee;
pub mod epf;
pub mod invoice;
pub mod leave_request;
pub mod machine;
pub mod role;
pub mod supervisor;
pub mod user;
pub mod work_query;
