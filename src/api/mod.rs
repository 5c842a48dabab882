pub mod attendance;
pub mod employee;
pub mod epf;
pub mod invoice;
pub mod leave;
pub mod machine;
pub mod supervisor;
pub mod upload;
pub mod work_query;
