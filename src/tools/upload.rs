//! Handler for the `upload_report_pdf` tool.
//!
//! Presentation-only: builds the report's URL under the configured
//! repository base address. No bytes are transferred.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::config::UploadConfig;
use crate::tools::envelope::{HandlerFailure, ToolOutput};
use crate::tools::registry::{HandlerFuture, ToolHandler};
use crate::tools::schema::{Field, Schema, ValidatedArguments};

/// Characters escaped in a filename: everything except ASCII alphanumerics
/// and `- _ . ! ~ * ' ( )`.
const FILENAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Destination URL for `filename` under `base`, with the filename
/// percent-encoded as a single path segment.
///
/// Returned as a string so `.` and `..` stay literal; parsing into a `Url`
/// would collapse them.
pub fn report_url(base: &Url, filename: &str) -> Result<String, HandlerFailure> {
    if base.cannot_be_a_base() {
        return Err(HandlerFailure::new("Invalid report repository URL", base));
    }
    Ok(format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        utf8_percent_encode(filename, FILENAME)
    ))
}

/// Handler for the `upload_report_pdf` tool.
pub struct UploadReportHandler {
    base_url: Url,
}

impl UploadReportHandler {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
        }
    }
}

impl ToolHandler for UploadReportHandler {
    fn name(&self) -> &str {
        "upload_report_pdf"
    }

    fn description(&self) -> &str {
        "Uploads a PDF to the reporting tool repository and returns a URL"
    }

    fn input_schema(&self) -> Schema {
        Schema::new().field(
            Field::string("filename")
                .description("The name of the PDF file being uploaded")
                .required(),
        )
    }

    fn execute(&self, args: ValidatedArguments) -> HandlerFuture<'_> {
        Box::pin(async move {
            let filename = args.require_str("filename")?;
            let url = report_url(&self.base_url, filename)?;
            tracing::info!(filename, url = %url, "Report registered");

            Ok(ToolOutput::text(format!(
                "✅ Uploaded \"{}\" to the reporting tool.\n📎 URL: {}",
                filename, url
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::dispatch::{Dispatcher, InvocationRequest};
    use crate::tools::registry::ToolRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_report_url_default_base() {
        let url = report_url(&UploadConfig::default().base_url, "q3.pdf").unwrap();
        assert_eq!(url, "http://localhost:8080/reports/q3.pdf");
    }

    #[test]
    fn test_report_url_escapes_filename() {
        let url = report_url(&base("http://localhost:8080/reports"), "Q3 report/final.pdf").unwrap();
        assert_eq!(url, "http://localhost:8080/reports/Q3%20report%2Ffinal.pdf");
    }

    #[test]
    fn test_report_url_escapes_reserved_characters() {
        let base = base("http://localhost:8080/reports");
        assert_eq!(
            report_url(&base, "Q3&Q4=v2+final;draft.pdf").unwrap(),
            "http://localhost:8080/reports/Q3%26Q4%3Dv2%2Bfinal%3Bdraft.pdf"
        );
        assert_eq!(
            report_url(&base, "it's (final)!~*.pdf").unwrap(),
            "http://localhost:8080/reports/it's%20(final)!~*.pdf"
        );
        assert_eq!(
            report_url(&base, "résumé.pdf").unwrap(),
            "http://localhost:8080/reports/r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn test_report_url_keeps_dot_segments() {
        let base = base("http://localhost:8080/reports");
        assert_eq!(report_url(&base, "..").unwrap(), "http://localhost:8080/reports/..");
        assert_eq!(report_url(&base, ".").unwrap(), "http://localhost:8080/reports/.");
    }

    #[test]
    fn test_report_url_trailing_slash_base() {
        let url = report_url(&base("https://reports.example.com/repo/"), "a.pdf").unwrap();
        assert_eq!(url, "https://reports.example.com/repo/a.pdf");
    }

    #[test]
    fn test_report_url_rejects_opaque_base() {
        let err = report_url(&base("mailto:reports@example.com"), "a.pdf").unwrap_err();
        assert_eq!(err.context(), "Invalid report repository URL");
    }

    #[tokio::test]
    async fn test_upload_via_dispatcher() {
        let registry = ToolRegistry::new()
            .with_handler(UploadReportHandler::new(&UploadConfig::default()))
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let args = json!({ "filename": "x.pdf" }).as_object().cloned().unwrap();
        let response = dispatcher
            .dispatch(InvocationRequest::new("upload_report_pdf", args))
            .await;
        assert!(!response.is_error());
        assert_eq!(
            response.text(),
            "✅ Uploaded \"x.pdf\" to the reporting tool.\n📎 URL: http://localhost:8080/reports/x.pdf"
        );

        let response = dispatcher
            .dispatch(InvocationRequest::new("upload_report_pdf", Default::default()))
            .await;
        assert!(response.is_error());
        assert!(response.text().contains("filename"));
    }
}
