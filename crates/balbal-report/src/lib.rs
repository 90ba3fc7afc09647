//! # BalBal Report
//!
//! Structured error reports for failures captured in the preview.
//!
//! An [`ErrorReporter`] builds an [`ErrorReport`] (attaching a request id
//! when the caller has none), renders it as plain text and escaped HTML and
//! delivers it through a [`ReportTransport`]:
//!
//! - [`MailTransport`]: multipart mail over SMTP with STARTTLS
//! - [`HttpTransport`]: JSON POST to the report endpoint
//! - [`MemoryTransport`]: keeps reports in memory for tests
//!
//! ```ignore
//! let reporter = ErrorReporter::new(ReportFormatter::default(), Arc::new(MemoryTransport::new()));
//! reporter
//!     .report(ErrorDetails::new("TypeError", "x is not a function"), None)
//!     .await?;
//! ```

pub mod error;
pub mod format;
pub mod report;
pub mod reporter;
pub mod transport;

pub use error::{DeliveryError, DeliveryResult};
pub use format::{RenderedReport, ReportFormatter, escape_html, text_to_html};
pub use report::{ErrorDetails, ErrorReport, ReportContext, ReportSubmission};
pub use reporter::ErrorReporter;
pub use transport::{
	DeliveredReport, DeliveryReceipt, HttpTransport, MailTransport, MemoryTransport,
	ReportTransport, compose_message,
};
