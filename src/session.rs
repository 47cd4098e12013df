//! Session identity, read once from the scanned entry link.

use reqwest::Url;
use std::fmt;

use crate::error::{Result, UploaderError};

/// The fixed set of document types a session can be opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Sales,
    Transfer,
    Other,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::Sales, DocType::Transfer, DocType::Other];

    /// The value carried in links and sent to the server.
    pub fn as_param(&self) -> &'static str {
        match self {
            DocType::Sales => "销售",
            DocType::Transfer => "转库",
            DocType::Other => "其他",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_param() == value)
    }

    /// Header colour for this document type.
    pub fn theme_hex(&self) -> &'static str {
        match self {
            DocType::Sales => "#1677ff",
            DocType::Transfer => "#fa8c16",
            DocType::Other => "#722ed1",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Immutable for the lifetime of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub business_id: String,
    pub doc_number: String,
    pub doc_type: DocType,
    pub product_type: Option<String>,
}

impl SessionIdentity {
    pub fn from_entry_url(entry: &Url) -> Result<Self> {
        let param = |name: &str| {
            entry
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let business_id = param("business_id")
            .filter(|id| is_digit_string(id))
            .ok_or_else(|| {
                UploaderError::session("Invalid business document ID; scan the correct QR code")
            })?;

        let doc_number = param("doc_number")
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| UploaderError::session("Missing document number parameter"))?;

        let doc_type = param("doc_type")
            .and_then(|t| DocType::from_param(&t))
            .ok_or_else(|| UploaderError::session("Invalid document type parameter"))?;

        let product_type = param("product_type").filter(|p| !p.is_empty());

        Ok(Self {
            business_id,
            doc_number,
            doc_type,
            product_type,
        })
    }

    pub fn title(&self) -> String {
        format!("{} - {}", self.doc_type, self.doc_number)
    }
}

/// Non-empty and ASCII digits only.
pub fn is_digit_string(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
