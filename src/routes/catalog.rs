//! Catalog endpoints: list the full catalog and upload study materials

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::db::{CatalogRepository, Course};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Document and presentation formats accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "ppt", "pptx"];

/// Upload size cap in bytes.
const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getFiles", get(get_files))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

fn extension_allowed(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// GET /getFiles - every course with its full nested hierarchy.
async fn get_files(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    let repo = CatalogRepository::new(state.db());
    let catalog = repo.list_all().await?;
    Ok(Json(catalog))
}

/// One parsed upload form: the file plus its catalog coordinates.
struct UploadForm {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
    course_name: String,
    semester: i64,
    subject_name: String,
}

impl UploadForm {
    /// Read the multipart body. Any missing field is a 400, matching the
    /// generic all-fields-required contract.
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
        let mut course_name: Option<String> = None;
        let mut semester: Option<String> = None;
        let mut subject_name: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest("Failed to read upload".to_string())
        })? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    let filename = field
                        .file_name()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "upload".to_string());
                    let content_type = field.content_type().map(|s| s.to_string());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::debug!("Failed to read file field: {}", e);
                            AppError::BadRequest("Failed to read upload".to_string())
                        })?
                        .to_vec();
                    file = Some((filename, content_type, data));
                }
                "courseName" => course_name = Some(Self::text_field(field).await?),
                "semester" => semester = Some(Self::text_field(field).await?),
                "name" => subject_name = Some(Self::text_field(field).await?),
                _ => {}
            }
        }

        let missing = || AppError::BadRequest("All fields are required".to_string());

        let (filename, content_type, data) = file.ok_or_else(missing)?;
        let course_name = course_name.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let semester = semester.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let subject_name = subject_name.filter(|s| !s.is_empty()).ok_or_else(missing)?;

        if data.is_empty() {
            return Err(missing());
        }

        let semester: i64 = semester
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("Semester must be a number".to_string()))?;

        Ok(Self {
            filename,
            content_type,
            data,
            course_name,
            semester,
            subject_name,
        })
    }

    async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
        field
            .text()
            .await
            .map_err(|_| AppError::BadRequest("Failed to read upload".to_string()))
    }
}

/// POST /upload - store the file bytes and record the catalog entry.
///
/// Requires a valid session cookie.
async fn upload(
    State(state): State<AppState>,
    _user: AuthUser,
    multipart: Multipart,
) -> Result<Json<Vec<Course>>> {
    let form = UploadForm::from_multipart(multipart).await?;

    if !extension_allowed(&form.filename) {
        return Err(AppError::BadRequest(
            "File type not allowed".to_string(),
        ));
    }

    let url = state
        .s3_client()
        .store_upload(&form.filename, form.content_type.as_deref(), form.data)
        .await?;

    let repo = CatalogRepository::new(state.db());
    let catalog = repo
        .record_upload(&form.course_name, form.semester, &form.subject_name, &url)
        .await?;

    tracing::info!(
        "Recorded upload {} under {}/{}",
        form.subject_name,
        form.course_name,
        form.semester
    );

    Ok(Json(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_and_presentation_extensions_are_allowed() {
        assert!(extension_allowed("notes.pdf"));
        assert!(extension_allowed("slides.PPTX"));
        assert!(extension_allowed("summary.doc"));
        assert!(extension_allowed("deck.ppt"));
        assert!(extension_allowed("report.docx"));
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(!extension_allowed("payload.exe"));
        assert!(!extension_allowed("archive.zip"));
        assert!(!extension_allowed("photo.jpeg"));
        assert!(!extension_allowed("no_extension"));
    }
}
