use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use futures_util::TryStreamExt;
use serde_json::json;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::media;

/// Upload a file and forward it to the media store
#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    request_body(content = Object, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = Object, example = json!({
            "success": true,
            "data": {
                "public_id": "uploads/abc123",
                "secure_url": "https://res.cloudinary.com/acme/image/upload/v1/abc123.jpg"
            }
        })),
        (status = 400, description = "Missing or oversized file"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Media store unreachable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Upload"
)]
pub async fn upload_file(
    _auth: AuthUser,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename = String::from("upload.bin");

    while let Some(mut field) = payload.try_next().await? {
        if field.name() != "file" {
            continue;
        }

        if let Some(name) = field.content_disposition().get_filename() {
            filename = name.to_string();
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if buf.len() + chunk.len() > config.max_upload_bytes {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "success": false,
                    "message": format!("File exceeds the {} byte limit", config.max_upload_bytes)
                })));
            }
            buf.extend_from_slice(&chunk);
        }

        file_bytes = Some(buf);
        break;
    }

    let bytes = match file_bytes {
        Some(b) if !b.is_empty() => b,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Missing file field"
            })));
        }
    };

    let uploaded = match media::upload(config.get_ref(), bytes, &filename).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, filename, "Upload forwarding failed");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Upload failed"
            })));
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "public_id": uploaded.public_id,
            "secure_url": uploaded.secure_url
        }
    })))
}
