use reqwest::Url;

use crate::session::{is_digit_string, SessionIdentity};

/// Identifiers read back out of a decoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIdentity {
    pub business_id: String,
    pub doc_number: Option<String>,
    pub doc_type: Option<String>,
}

/// Reads the identifiers from a payload link such as
/// `http://host:10000/?business_id=123&doc_number=SO1&doc_type=销售`.
///
/// Returns `None` when the payload is not a URL or its `business_id` is
/// missing or not all digits.
pub fn extract(payload: &str) -> Option<ExtractedIdentity> {
    let url = Url::parse(payload).ok()?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    let business_id = param("business_id").filter(|id| is_digit_string(id))?;

    Some(ExtractedIdentity {
        business_id,
        doc_number: param("doc_number"),
        doc_type: param("doc_type"),
    })
}

/// Only the business identifier takes part in the match; document number and
/// type are carried for display.
pub fn matches(extracted: &ExtractedIdentity, session: &SessionIdentity) -> bool {
    extracted.business_id == session.business_id
}
