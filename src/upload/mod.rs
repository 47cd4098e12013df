mod batch;
mod batch_queue;
mod client;
mod types;

pub use batch::{AcceptedBatch, SubmitGate};
pub use batch_queue::{
    BatchQueue, Decision, DecisionRequest, GestureOutcome, Notice, NoticeLevel, QueueEvent,
};
pub use client::{correlate_results, SubmissionReport, UploadClient};
pub use types::{
    media_type_for, AcceptedEntry, CandidateFile, FileStatus, HistoryRecord, HistoryResponse,
    UploadResponse, UploadResultItem, UploadStatus,
};
