use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Machine {
    pub id: u64,
    #[schema(example = "MC-014")]
    pub machine_code: String,
    #[schema(example = "Overlock 4-thread")]
    pub name: String,
    #[schema(example = "sewing")]
    pub category: String,
    #[schema(example = "Floor 2, Line B")]
    pub location: String,
    #[schema(value_type = String, format = "date")]
    pub purchase_date: NaiveDate,
    #[schema(example = "active")]
    pub status: String,
    #[schema(nullable = true)]
    pub assigned_employee_id: Option<u64>,
}
