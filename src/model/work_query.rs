use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WorkQuery {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Machine 14 jams on heavy fabric")]
    pub subject: String,
    pub description: String,
    #[schema(example = "open")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
