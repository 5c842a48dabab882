use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "invoice_no": "INV-2026-0001",
        "client_name": "Acme Apparel Ltd",
        "issue_date": "2026-01-05",
        "due_date": "2026-02-05",
        "subtotal": 120000.0,
        "tax": 18000.0,
        "total": 138000.0,
        "status": "sent",
        "notes": null
    })
)]
pub struct Invoice {
    pub id: u64,
    #[schema(example = "INV-2026-0001")]
    pub invoice_no: String,
    #[schema(example = "Acme Apparel Ltd")]
    pub client_name: String,
    #[schema(value_type = String, format = "date")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub due_date: NaiveDate,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    #[schema(example = "draft")]
    pub status: String,
    #[schema(nullable = true)]
    pub notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
