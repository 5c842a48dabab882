use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One provident-fund contribution record per employee per month.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EpfContribution {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,
    pub gross_salary: f64,
    pub employee_contribution: f64,
    pub employer_contribution: f64,
    pub total_contribution: f64,
}
