use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::FileCategory;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::params::{AppPath, AppQuery};
use crate::files::UploadItem;
use crate::models::file::{FileListResponse, FileRecord, SlotQuery};
use crate::state::AppState;

/// Multipart field name carrying uploaded files.
const FILES_FIELD: &str = "files";

pub fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.upload_body_limit())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFiles",
    summary = "Upload files to a slot",
    description = "Stores every `files` multipart part under the owner and category. \
        Each part must carry a filename. All parts are attempted; on failure the first \
        error is returned and parts that were stored stay stored.",
    params(SlotQuery),
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 201, description = "Files stored", body = FileListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Duplicate file name for owner (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_files(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SlotQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let items = collect_items(multipart, state.config.files.max_files_per_request).await?;
    if items.is_empty() {
        return Err(AppError::Validation(format!(
            "At least one '{FILES_FIELD}' part is required"
        )));
    }

    let records = state
        .files
        .store(query.owner_id, query.category, items)
        .await?;

    Ok((StatusCode::CREATED, Json(FileListResponse::from(records))))
}

#[utoipa::path(
    put,
    path = "/",
    tag = "Files",
    operation_id = "replaceFiles",
    summary = "Replace the files of a slot",
    description = "Deletes every file of the owner and category, then stores the uploaded \
        `files` parts. Sending no parts clears the slot.",
    params(SlotQuery),
    request_body(content_type = "multipart/form-data", description = "Zero or more `files` parts"),
    responses(
        (status = 200, description = "Slot replaced", body = FileListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Duplicate file name for owner (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn replace_files(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SlotQuery>,
    multipart: Multipart,
) -> Result<Json<FileListResponse>, AppError> {
    let items = collect_items(multipart, state.config.files.max_files_per_request).await?;

    let records = state
        .files
        .update(query.owner_id, query.category, items)
        .await?;

    Ok(Json(FileListResponse::from(records)))
}

#[utoipa::path(
    get,
    path = "/{filename}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the stored bytes as an attachment. The content type is guessed \
        from the file name.",
    params(("filename" = String, Path, description = "Generated storage name")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "File not readable (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    AppPath(filename): AppPath<String>,
) -> Result<Response, AppError> {
    let loaded = state.files.load_as_stream(&filename).await?;

    let content_type = mime_guess::from_path(&loaded.filename)
        .first_or_octet_stream()
        .to_string();

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&loaded.filename),
        );
    if let Some(size) = loaded.size {
        response = response.header(header::CONTENT_LENGTH, size.to_string());
    }

    response
        .body(Body::from_stream(ReaderStream::new(loaded.reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    delete,
    path = "/{filename}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file by name",
    params(("filename" = String, Path, description = "Generated storage name")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    AppPath(filename): AppPath<String>,
) -> Result<StatusCode, AppError> {
    state.files.delete(&filename).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/id/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata by ID",
    params(("id" = i64, Path, description = "File record ID")),
    responses(
        (status = 200, description = "File metadata", body = FileRecord),
        (status = 400, description = "Invalid ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<FileRecord>, AppError> {
    Ok(Json(state.files.get_by_id(id).await?))
}

#[utoipa::path(
    delete,
    path = "/id/{id}",
    tag = "Files",
    operation_id = "deleteFileById",
    summary = "Delete a file by ID",
    params(("id" = i64, Path, description = "File record ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Invalid ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file_by_id(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.files.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{category}/{owner_id}",
    tag = "Files",
    operation_id = "listSlotFiles",
    summary = "List the files of a slot",
    description = "Returns every file of the owner and category, ordered by ID. \
        The category is matched case-insensitively.",
    params(
        ("category" = FileCategory, Path, description = "File category"),
        ("owner_id" = i64, Path, description = "Owner ID"),
    ),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 400, description = "Unknown category (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_slot_files(
    State(state): State<AppState>,
    AppPath((category, owner_id)): AppPath<(String, i64)>,
) -> Result<Json<FileListResponse>, AppError> {
    let category = parse_category(&category)?;
    let records = state
        .files
        .get_by_owner_and_category(owner_id, category)
        .await?;

    Ok(Json(FileListResponse::from(records)))
}

#[utoipa::path(
    delete,
    path = "/{category}/{owner_id}",
    tag = "Files",
    operation_id = "deleteSlotFiles",
    summary = "Delete the files of a slot",
    description = "Deletes every file of the owner and category. Deletion continues past \
        individual failures, which are reported together.",
    params(
        ("category" = FileCategory, Path, description = "File category"),
        ("owner_id" = i64, Path, description = "Owner ID"),
    ),
    responses(
        (status = 204, description = "Slot cleared"),
        (status = 400, description = "Unknown category (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Some files could not be deleted (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_slot_files(
    State(state): State<AppState>,
    AppPath((category, owner_id)): AppPath<(String, i64)>,
) -> Result<StatusCode, AppError> {
    let category = parse_category(&category)?;
    state
        .files
        .delete_by_owner_and_category(owner_id, category)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_category(raw: &str) -> Result<FileCategory, AppError> {
    raw.parse()
        .map_err(|e: common::ParseCategoryError| AppError::Validation(e.to_string()))
}

/// Read every `files` part into memory. Other fields are ignored.
async fn collect_items(
    mut multipart: Multipart,
    max_files: usize,
) -> Result<Vec<UploadItem>, AppError> {
    let mut items = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if items.len() >= max_files {
            return Err(AppError::Validation(format!(
                "At most {max_files} files may be uploaded per request"
            )));
        }

        let original_filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File part must have a filename".into()))?;
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;

        items.push(UploadItem::from_bytes(original_filename, content_type, data));
    }

    Ok(items)
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
