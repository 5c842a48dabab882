use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Supervisor {
    pub id: u64,
    #[schema(example = "Jane Perera")]
    pub name: String,
    #[schema(example = "jane.perera@company.com")]
    pub email: String,
    #[schema(example = "+94771234567", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Cutting")]
    pub section: String,
}
