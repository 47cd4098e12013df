use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, UploaderError};
use crate::verify::VerificationOutcome;

/// A picked photo, held in memory until it is submitted or removed.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub data: Arc<Vec<u8>>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: data.len() as u64,
            data: Arc::new(data),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| UploaderError::io(&name, &e))?;
        Ok(Self::new(name, media_type_for(path), data))
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Media type declared for a file picked from disk, by extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

/// A file admitted to the batch together with how it was verified.
#[derive(Debug, Clone)]
pub struct AcceptedEntry {
    pub file: CandidateFile,
    pub outcome: VerificationOutcome,
}

impl AcceptedEntry {
    pub fn has_warning(&self) -> bool {
        self.outcome.requires_confirmation
    }
}

/// One per-file result. Items follow the order the files were sent in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadResultItem {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub succeeded: usize,
    #[serde(default)]
    pub failed: usize,
    pub results: Vec<UploadResultItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Success,
    Error(String),
}

/// One row of the submission progress list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub name: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub upload_time: Option<String>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl HistoryRecord {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub total_count: usize,
    #[serde(default)]
    pub success_count: usize,
    #[serde(default)]
    pub failed_count: usize,
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("a/IMG_001.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn loads_candidate_from_disk() {
        let mut tmp = tempfile::Builder::new().suffix(".jpeg").tempfile().unwrap();
        tmp.write_all(b"0123456789").unwrap();

        let file = CandidateFile::from_path(tmp.path()).await.unwrap();
        assert_eq!(file.size, 10);
        assert_eq!(file.media_type, "image/jpeg");
        assert!(file.is_image());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CandidateFile::from_path(&dir.path().join("gone.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploaderError::Io { .. }));
    }

    #[test]
    fn parses_upload_response() {
        let body = r#"{
            "success": true, "total": 2, "succeeded": 1, "failed": 1,
            "results": [
                {"file_name": "a.jpg", "success": true, "file_id": "f1", "file_size": 10},
                {"file_name": "b.jpg", "success": false, "error_code": "FILE_TOO_LARGE", "error_message": "too big"}
            ]
        }"#;
        let response: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].error_message.as_deref(), Some("too big"));
    }
}
