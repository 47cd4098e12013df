use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, warn};

use super::types::{
    AcceptedEntry, ErrorBody, FileStatus, HistoryResponse, UploadResponse, UploadResultItem, UploadStatus,
};
use crate::error::{Result, UploaderError};
use crate::session::SessionIdentity;

/// Per-row statuses for one finished submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub rows: Vec<FileStatus>,
    pub succeeded: usize,
    pub total: usize,
}

impl SubmissionReport {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    server: Url,
}

impl UploadClient {
    pub fn new(server: Url) -> Self {
        Self::with_http(reqwest::Client::new(), server)
    }

    pub fn with_http(http: reqwest::Client, server: Url) -> Self {
        Self { http, server }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.server
            .join(path)
            .map_err(|e| UploaderError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    pub fn build_form(session: &SessionIdentity, entries: &[AcceptedEntry]) -> Result<Form> {
        let mut form = Form::new()
            .text("business_id", session.business_id.clone())
            .text("doc_number", session.doc_number.clone())
            .text("doc_type", session.doc_type.as_param());
        if let Some(product_type) = &session.product_type {
            form = form.text("product_type", product_type.clone());
        }

        for entry in entries {
            let part = Part::bytes(entry.file.data.as_ref().clone())
                .file_name(entry.file.name.clone())
                .mime_str(&entry.file.media_type)
                .map_err(|e| UploaderError::Transport(format!("{}: {}", entry.file.name, e)))?;
            form = form.part("files", part);
        }
        Ok(form)
    }

    /// Sends the whole batch in one request and maps the per-file results back
    /// onto the submitted order.
    pub async fn submit(&self, session: &SessionIdentity, entries: &[AcceptedEntry]) -> Result<SubmissionReport> {
        let url = self.endpoint("api/upload")?;
        let form = Self::build_form(session, entries)?;
        info!(business_id = %session.business_id, files = entries.len(), "submitting batch");

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = server_detail(status, &body);
            warn!(%status, %detail, "upload rejected");
            return Err(UploaderError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: UploadResponse = serde_json::from_slice(&body)?;
        debug!(
            total = parsed.total,
            succeeded = parsed.succeeded,
            failed = parsed.failed,
            "upload response"
        );

        let names: Vec<String> = entries.iter().map(|e| e.file.name.clone()).collect();
        let report = correlate_results(&names, &parsed.results)?;
        if (parsed.total, parsed.succeeded, parsed.failed) != (report.total, report.succeeded, report.failed()) {
            warn!(
                reported_total = parsed.total,
                reported_succeeded = parsed.succeeded,
                reported_failed = parsed.failed,
                succeeded = report.succeeded,
                failed = report.failed(),
                "upload summary disagrees with per-file results"
            );
        }
        Ok(report)
    }

    pub async fn fetch_history(&self, business_id: &str) -> Result<HistoryResponse> {
        let url = self.endpoint(&format!("api/history/{}", business_id))?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(UploaderError::Server {
                status: status.as_u16(),
                detail: server_detail(status, &body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn server_detail(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| format!("upload failed ({})", status))
}

/// Pairs result items with submitted names by position. A length mismatch is
/// a protocol error and produces no rows at all.
pub fn correlate_results(names: &[String], results: &[UploadResultItem]) -> Result<SubmissionReport> {
    if names.len() != results.len() {
        return Err(UploaderError::Protocol {
            expected: names.len(),
            received: results.len(),
        });
    }

    let rows: Vec<FileStatus> = names
        .iter()
        .zip(results)
        .map(|(name, item)| FileStatus {
            name: name.clone(),
            status: if item.success {
                UploadStatus::Success
            } else {
                UploadStatus::Error(
                    item.error_message
                        .clone()
                        .unwrap_or_else(|| "Upload failed".to_string()),
                )
            },
        })
        .collect();

    let succeeded = rows
        .iter()
        .filter(|r| r.status == UploadStatus::Success)
        .count();

    Ok(SubmissionReport {
        total: rows.len(),
        rows,
        succeeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(success: bool, message: Option<&str>) -> UploadResultItem {
        UploadResultItem {
            success,
            error_message: message.map(str::to_string),
        }
    }

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("IMG_{}.jpg", i)).collect()
    }

    #[test]
    fn maps_results_by_position() {
        let report = correlate_results(
            &names(3),
            &[item(true, None), item(false, Some("storage quota exceeded")), item(true, None)],
        )
        .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.rows[0].status, UploadStatus::Success);
        assert_eq!(report.rows[1].name, "IMG_2.jpg");
        assert_eq!(
            report.rows[1].status,
            UploadStatus::Error("storage quota exceeded".to_string())
        );
    }

    #[test]
    fn missing_error_message_gets_default() {
        let report = correlate_results(&names(1), &[item(false, None)]).unwrap();
        assert_eq!(report.rows[0].status, UploadStatus::Error("Upload failed".to_string()));
    }

    #[test]
    fn length_mismatch_is_protocol_error() {
        let err = correlate_results(&names(3), &[item(true, None), item(true, None)]).unwrap_err();
        assert_eq!(
            err,
            UploaderError::Protocol {
                expected: 3,
                received: 2
            }
        );
    }

    #[test]
    fn server_detail_prefers_body() {
        let detail = server_detail(StatusCode::BAD_REQUEST, br#"{"detail": "too many files"}"#);
        assert_eq!(detail, "too many files");

        let detail = server_detail(StatusCode::BAD_GATEWAY, b"<html>");
        assert!(detail.contains("502"));
    }

    #[test]
    fn endpoints_resolve_against_server_origin() {
        let client = UploadClient::new(Url::parse("http://10.0.0.5:10000/").unwrap());
        assert_eq!(
            client.endpoint("api/history/42").unwrap().as_str(),
            "http://10.0.0.5:10000/api/history/42"
        );
    }

    mod wire {
        use super::*;
        use crate::session::DocType;
        use crate::upload::types::CandidateFile;
        use crate::verify::{VerificationOutcome, VerificationStatus};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio::task::JoinHandle;

        struct Captured {
            head: String,
            body: String,
        }

        /// Serves one request with a canned reply and hands back what it received.
        async fn serve_once(status: &'static str, reply: &'static str) -> (Url, JoinHandle<Captured>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();

            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut chunk = [0u8; 4096];

                let head_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    assert!(n > 0, "connection closed before headers");
                    raw.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
                let lower = head.to_ascii_lowercase();
                let content_length = lower
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap());

                let body = match content_length {
                    Some(len) => {
                        while raw.len() < head_end + len {
                            let n = socket.read(&mut chunk).await.unwrap();
                            assert!(n > 0, "connection closed mid-body");
                            raw.extend_from_slice(&chunk[..n]);
                        }
                        raw[head_end..head_end + len].to_vec()
                    }
                    None => {
                        while !raw.ends_with(b"0\r\n\r\n") {
                            let n = socket.read(&mut chunk).await.unwrap();
                            assert!(n > 0, "connection closed mid-body");
                            raw.extend_from_slice(&chunk[..n]);
                        }
                        dechunk(&raw[head_end..])
                    }
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reply.len(),
                    reply
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();

                Captured {
                    head,
                    body: String::from_utf8_lossy(&body).to_string(),
                }
            });
            (url, handle)
        }

        fn dechunk(mut data: &[u8]) -> Vec<u8> {
            let mut out = Vec::new();
            loop {
                let line_end = data.windows(2).position(|w| w == b"\r\n").unwrap();
                let size_field = std::str::from_utf8(&data[..line_end]).unwrap();
                let size = usize::from_str_radix(size_field.split(';').next().unwrap().trim(), 16).unwrap();
                data = &data[line_end + 2..];
                if size == 0 {
                    return out;
                }
                out.extend_from_slice(&data[..size]);
                data = &data[size + 2..];
            }
        }

        fn client(server: Url) -> UploadClient {
            UploadClient::with_http(reqwest::Client::builder().no_proxy().build().unwrap(), server)
        }

        fn session(product_type: Option<&str>) -> SessionIdentity {
            SessionIdentity {
                business_id: "10293".to_string(),
                doc_number: "SO-1".to_string(),
                doc_type: DocType::Transfer,
                product_type: product_type.map(str::to_string),
            }
        }

        fn entry(name: &str, data: &[u8]) -> AcceptedEntry {
            AcceptedEntry {
                file: CandidateFile::new(name, "image/jpeg", data.to_vec()),
                outcome: VerificationOutcome {
                    status: VerificationStatus::IdentityMatched,
                    code_detected: true,
                    identity_matched: true,
                    decoded_payload: None,
                    requires_confirmation: false,
                    message: None,
                    extracted: None,
                },
            }
        }

        fn position(body: &str, needle: &str) -> usize {
            body.find(needle)
                .unwrap_or_else(|| panic!("{:?} not found in request body", needle))
        }

        #[tokio::test]
        async fn submit_sends_session_fields_and_files_in_batch_order() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{"success": true, "total": 3, "succeeded": 2, "failed": 1, "results": [
                    {"file_name": "first.jpg", "success": true},
                    {"file_name": "second.jpg", "success": false, "error_message": "too big"},
                    {"file_name": "third.jpg", "success": true}
                ]}"#,
            )
            .await;
            let entries = vec![
                entry("first.jpg", b"AAAA"),
                entry("second.jpg", b"BBBB"),
                entry("third.jpg", b"CCCC"),
            ];

            let report = client(url).submit(&session(None), &entries).await.unwrap();
            let captured = server.await.unwrap();

            assert!(captured.head.starts_with("POST /api/upload "));
            assert!(captured
                .head
                .to_ascii_lowercase()
                .contains("content-type: multipart/form-data; boundary="));

            let body = &captured.body;
            let business_id = position(body, "name=\"business_id\"");
            let doc_number = position(body, "name=\"doc_number\"");
            let doc_type = position(body, "name=\"doc_type\"");
            assert!(business_id < doc_number && doc_number < doc_type);
            assert!(body.contains("10293"));
            assert!(body.contains("SO-1"));
            assert!(body.contains("转库"));
            assert!(!body.contains("name=\"product_type\""));

            assert_eq!(body.matches("name=\"files\"").count(), 3);
            let first = position(body, "filename=\"first.jpg\"");
            let second = position(body, "filename=\"second.jpg\"");
            let third = position(body, "filename=\"third.jpg\"");
            assert!(doc_type < first && first < second && second < third);
            assert!(first < position(body, "AAAA") && position(body, "AAAA") < second);
            assert!(body.contains("image/jpeg"));

            assert_eq!(report.total, 3);
            assert_eq!(report.succeeded, 2);
            assert_eq!(report.rows[1].name, "second.jpg");
            assert_eq!(report.rows[1].status, UploadStatus::Error("too big".to_string()));
        }

        #[tokio::test]
        async fn product_type_is_sent_when_present() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{"success": true, "total": 1, "succeeded": 1, "failed": 0, "results": [{"success": true}]}"#,
            )
            .await;

            client(url)
                .submit(&session(Some("diesel")), &[entry("a.jpg", b"x")])
                .await
                .unwrap();
            let body = server.await.unwrap().body;
            assert!(position(&body, "name=\"product_type\"") < position(&body, "name=\"files\""));
            assert!(body.contains("diesel"));
        }

        #[tokio::test]
        async fn short_result_list_is_protocol_error() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{"success": true, "total": 2, "succeeded": 1, "failed": 0, "results": [{"success": true}]}"#,
            )
            .await;

            let err = client(url)
                .submit(&session(None), &[entry("a.jpg", b"x"), entry("b.jpg", b"y")])
                .await
                .unwrap_err();
            server.await.unwrap();
            assert_eq!(
                err,
                UploaderError::Protocol {
                    expected: 2,
                    received: 1
                }
            );
        }

        #[tokio::test]
        async fn rejected_request_carries_server_detail() {
            let (url, server) = serve_once("400 Bad Request", r#"{"detail": "at most 10 files per upload"}"#).await;

            let err = client(url)
                .submit(&session(None), &[entry("a.jpg", b"x")])
                .await
                .unwrap_err();
            server.await.unwrap();
            assert_eq!(
                err,
                UploaderError::Server {
                    status: 400,
                    detail: "at most 10 files per upload".to_string()
                }
            );
        }

        #[tokio::test]
        async fn history_is_fetched_for_business_id() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{"total_count": 2, "success_count": 1, "failed_count": 1, "records": [
                    {"file_name": "a.jpg", "file_size": 2048, "upload_time": "2024-05-01T08:30:00", "status": "success"},
                    {"file_name": "b.jpg", "file_size": 10, "status": "failed", "error_message": "too big"}
                ]}"#,
            )
            .await;

            let history = client(url).fetch_history("10293").await.unwrap();
            let captured = server.await.unwrap();

            assert!(captured.head.starts_with("GET /api/history/10293 "));
            assert_eq!(history.total_count, 2);
            assert!(history.records[0].is_success());
            assert_eq!(history.records[1].error_message.as_deref(), Some("too big"));
        }
    }
}
