//! # Rusty Report
//!
//! Refreshes tables inside Word (`.docx`) reports with the result of a query,
//! keeping every table where it is and formatted the way it was.
//!
//! ## Features
//!
//! - **Structure index**: tables grouped under the heading that precedes them,
//!   with row/column counts and header-row texts
//! - **Instruction resolution**: a free-form instruction such as "update the loss
//!   table by exposure year" is mapped to one table by an external LLM, checked
//!   against the index and backed by a deterministic column-overlap search
//! - **Format preserving replacement**: the new table inherits the old table's
//!   properties, header row properties and per-column widths, and takes its slot
//! - **DuckDB query service**: datasets come from SQL run against DuckDB, either
//!   literally or generated from a prompt by an external command
//! - **Pluggable resolvers**: a local command (`ollama run mistral`) or the Ollama
//!   HTTP API
//!
//! ## Example
//!
//! ```no_run
//! use rusty_report::Config;
//! use rusty_report::Document;
//! use rusty_report::QueryService;
//! use rusty_report::UpdateSession;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let detector = config.heading_detector()?;
//! let resolver = config.semantic_resolver()?;
//! let query = config.query_service()?;
//!
//! let mut session = UpdateSession::new(Document::open("report.docx")?, &detector, resolver.as_ref());
//! let result = query.fetch("SELECT exposure_year, SUM(incurred) AS incurred FROM losses GROUP BY 1")?;
//! let report = session.apply("update the incurred losses by exposure year", &result.dataset)?;
//! println!("{}", report);
//! session.save("report-updated.docx")?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod document;
pub mod error;
pub mod helpers;
pub mod query;
pub mod replace;
pub mod resolver;
pub mod session;
pub mod structure;

pub use config::Config;
pub use document::styles::HeadingDetector;
pub use document::styles::StylePatternDetector;
pub use document::Document;
pub use error::RustyReportError;
pub use query::Dataset;
pub use query::QueryService;
pub use replace::replace_table;
pub use resolver::resolve;
pub use resolver::SemanticResolver;
pub use session::UpdateReport;
pub use session::UpdateSession;
pub use structure::describe;
pub use structure::index;
pub use structure::Section;
pub use structure::TableRef;
