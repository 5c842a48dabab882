use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, AttendanceSummary, SummaryQuery,
};
use crate::api::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeQuery, EmployeeStatus, SetPhoto,
};
use crate::api::epf::{CreateEpf, EpfListResponse, EpfQuery, UpdateEpf};
use crate::api::invoice::{
    CreateInvoice, InvoiceListResponse, InvoiceQuery, InvoiceStatus, UpdateInvoice,
};
use crate::api::leave::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveStats, LeaveStatus, LeaveType,
};
use crate::api::machine::{
    AssignMachine, CreateMachine, MachineListResponse, MachineQuery, MachineStatus,
    SetMachineStatus,
};
use crate::api::supervisor::{CreateSupervisor, SupervisorListResponse, SupervisorQuery};
use crate::api::work_query::{
    CreateWorkQuery, SetWorkQueryStatus, WorkQueryFilter, WorkQueryListResponse, WorkQueryStatus,
};
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::epf::EpfContribution;
use crate::model::invoice::Invoice;
use crate::model::leave_request::LeaveRequest;
use crate::model::machine::Machine;
use crate::model::supervisor::Supervisor;
use crate::model::work_query::WorkQuery;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce ERP API",
        version = "1.0.0",
        description = r#"
## Workforce ERP backend

REST backend for employee records, multi-tier leave approval, attendance,
invoicing, EPF contributions, machine tracking, work queries, supervisors
and media uploads.

### Leave tiers
`/leaves`, `/manager-leaves` and `/admin-leaves` expose the same operations;
approval always needs a role one tier above the request family.

### Security
Endpoints under the API prefix require a **JWT Bearer** access token from
`/auth/login`.

### Response format
JSON envelopes with a `success` flag; list endpoints are paginated.
"#,
    ),
    paths(
        crate::api::leave::leave_list,
        crate::api::leave::leave_stats,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_list,
        crate::api::attendance::attendance_summary,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::set_employee_photo,

        crate::api::invoice::create_invoice,
        crate::api::invoice::list_invoices,
        crate::api::invoice::get_invoice,
        crate::api::invoice::update_invoice,
        crate::api::invoice::send_invoice,
        crate::api::invoice::pay_invoice,
        crate::api::invoice::delete_invoice,

        crate::api::epf::create_epf,
        crate::api::epf::update_epf,
        crate::api::epf::get_epf,
        crate::api::epf::delete_epf,
        crate::api::epf::list_epf,

        crate::api::machine::create_machine,
        crate::api::machine::list_machines,
        crate::api::machine::get_machine,
        crate::api::machine::update_machine,
        crate::api::machine::assign_machine,
        crate::api::machine::set_machine_status,
        crate::api::machine::delete_machine,

        crate::api::work_query::create_work_query,
        crate::api::work_query::list_work_queries,
        crate::api::work_query::get_work_query,
        crate::api::work_query::set_work_query_status,
        crate::api::work_query::delete_work_query,

        crate::api::supervisor::create_supervisor,
        crate::api::supervisor::list_supervisors,
        crate::api::supervisor::get_supervisor,
        crate::api::supervisor::update_supervisor,
        crate::api::supervisor::delete_supervisor,

        crate::api::upload::upload_file
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            EmployeeQuery,
            CreateEmployee,
            EmployeeListResponse,
            SetPhoto,

            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeaveStats,
            LeaveFilter,
            CreateLeave,
            LeaveListResponse,

            Attendance,
            AttendanceFilter,
            AttendanceListResponse,
            AttendanceSummary,
            SummaryQuery,

            Invoice,
            InvoiceStatus,
            InvoiceQuery,
            CreateInvoice,
            UpdateInvoice,
            InvoiceListResponse,

            EpfContribution,
            EpfQuery,
            CreateEpf,
            UpdateEpf,
            EpfListResponse,

            Machine,
            MachineStatus,
            MachineQuery,
            CreateMachine,
            AssignMachine,
            SetMachineStatus,
            MachineListResponse,

            WorkQuery,
            WorkQueryStatus,
            WorkQueryFilter,
            CreateWorkQuery,
            SetWorkQueryStatus,
            WorkQueryListResponse,

            Supervisor,
            SupervisorQuery,
            CreateSupervisor,
            SupervisorListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Multi-tier leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Invoice", description = "Invoicing APIs"),
        (name = "EPF", description = "Provident fund contribution APIs"),
        (name = "Machine", description = "Machine/asset tracking APIs"),
        (name = "WorkQuery", description = "Work query APIs"),
        (name = "Supervisor", description = "Supervisor management APIs"),
        (name = "Upload", description = "Media upload APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
