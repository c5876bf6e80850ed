use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{Document, DocumentCategory};

use super::{AppState, new_id, now};

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub project_id: String,
    pub category: DocumentCategory,
    /// Display name; the file name is used when blank.
    pub name: String,
    pub uploaded_by: String,
}

/// Read the whole payload from `reader`, then store it. Nothing is written
/// when the read fails.
pub async fn upload_document<R>(
    state: &AppState,
    upload: DocumentUpload,
    file_name: &str,
    mut reader: R,
) -> AppResult<Document>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|source| AppError::Upload {
            file: file_name.to_string(),
            source,
        })?;

    store_document(state, upload, file_name, &bytes)
}

pub async fn upload_document_from_path(
    state: &AppState,
    upload: DocumentUpload,
    path: &Path,
) -> AppResult<Document> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::validation(format!("{} is not a file", path.display())))?;
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| AppError::Upload {
            file: path.display().to_string(),
            source,
        })?;
    upload_document(state, upload, &file_name, file).await
}

fn store_document(
    state: &AppState,
    upload: DocumentUpload,
    file_name: &str,
    bytes: &[u8],
) -> AppResult<Document> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(AppError::validation("file name is required"));
    }
    if upload.uploaded_by.trim().is_empty() {
        return Err(AppError::validation("uploader is required"));
    }
    if state.projects.find(|p| p.id == upload.project_id)?.is_none() {
        return Err(AppError::not_found("project", upload.project_id.as_str()));
    }

    let name = match upload.name.trim() {
        "" => file_name.to_string(),
        name => name.to_string(),
    };
    let document = Document {
        id: new_id(),
        project_id: upload.project_id,
        category: upload.category,
        name,
        file_name: file_name.to_string(),
        file_data: STANDARD.encode(bytes),
        uploaded_at: now(),
        uploaded_by: upload.uploaded_by.trim().to_string(),
    };
    state.documents.insert(document.clone())?;

    info!(
        document_id = %document.id,
        project_id = %document.project_id,
        category = document.category.as_str(),
        size = bytes.len(),
        "document uploaded"
    );
    Ok(document)
}

pub fn get_document_by_id(state: &AppState, id: &str) -> AppResult<Option<Document>> {
    state.documents.find(|d| d.id == id)
}

/// Decoded payload of a stored document.
pub fn document_bytes(state: &AppState, id: &str) -> AppResult<Vec<u8>> {
    let document =
        get_document_by_id(state, id)?.ok_or_else(|| AppError::not_found("document", id))?;
    // Records may hold a `data:<mime>;base64,` URL rather than bare base64.
    let payload = match document.file_data.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => document.file_data.as_str(),
    };
    STANDARD
        .decode(payload.as_bytes())
        .map_err(|err| AppError::validation(format!("document {id} payload is not base64: {err}")))
}

pub fn list_documents_by_project(state: &AppState, project_id: &str) -> AppResult<Vec<Document>> {
    state.documents.filter(|d| d.project_id == project_id)
}

pub fn list_documents_by_category(
    state: &AppState,
    project_id: &str,
    category: DocumentCategory,
) -> AppResult<Vec<Document>> {
    state
        .documents
        .filter(|d| d.project_id == project_id && d.category == category)
}

/// Returns whether a document was removed; unknown ids are a no-op.
pub fn delete_document(state: &AppState, id: &str) -> AppResult<bool> {
    let removed = state.documents.remove_where(|d| d.id == id)? > 0;
    if removed {
        info!(document_id = %id, "document deleted");
    }
    Ok(removed)
}
