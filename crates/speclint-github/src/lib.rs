//! # speclint-github
//!
//! GitHub integration for speclint:
//!
//! - [`RepositoryInfo`] read from the workflow event payload
//! - [`Annotation`] built from lint diagnostics
//! - [`CheckRunReporter`] creating and completing check runs through any
//!   [`CheckRuns`] implementation ([`OctocrabChecks`] in production)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod annotation;
pub mod checks;
pub mod client;
pub mod event;

pub use annotation::{has_failures, sort_annotations, Annotation, AnnotationLevel};
pub use checks::{
    CheckRun, CheckRunReporter, CheckRuns, Conclusion, OctocrabChecks, ReportError,
    MAX_ANNOTATIONS_PER_REQUEST,
};
pub use client::{api_base_url, build_client, ClientError};
pub use event::{EventError, RepositoryInfo};
