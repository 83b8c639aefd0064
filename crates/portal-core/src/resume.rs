//! Resume uploads and the local checks run before submission.

use std::fmt;

use bytes::Bytes;

use crate::ValidationError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Default upper bound on a resume upload, in bytes.
pub const DEFAULT_MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// A resume file about to be attached to a new application.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeUpload {
  pub filename:     String,
  /// MIME type as reported by the picker, if any.
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

impl ResumeUpload {
  pub fn new(
    filename: impl Into<String>,
    content_type: Option<String>,
    bytes: impl Into<Bytes>,
  ) -> Self {
    Self {
      filename: filename.into(),
      content_type,
      bytes: bytes.into(),
    }
  }

  /// A file counts as a PDF if either its MIME type or its extension says so.
  pub fn is_pdf(&self) -> bool {
    let by_type = self
      .content_type
      .as_deref()
      .is_some_and(|t| t.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE));
    let by_name = self.filename.to_ascii_lowercase().ends_with(".pdf");
    by_type || by_name
  }

  pub fn validate(&self, max_bytes: usize) -> Result<(), ValidationError> {
    if self.filename.trim().is_empty() {
      return Err(ValidationError::MissingField("resume"));
    }
    if !self.is_pdf() {
      return Err(ValidationError::NotPdf {
        filename:     self.filename.clone(),
        content_type: self.content_type.clone(),
      });
    }
    if self.bytes.is_empty() {
      return Err(ValidationError::EmptyResume(self.filename.clone()));
    }
    if self.bytes.len() > max_bytes {
      return Err(ValidationError::ResumeTooLarge {
        size:  self.bytes.len(),
        limit: max_bytes,
      });
    }
    Ok(())
  }
}

impl fmt::Debug for ResumeUpload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResumeUpload")
      .field("filename", &self.filename)
      .field("content_type", &self.content_type)
      .field("len", &self.bytes.len())
      .finish()
  }
}
