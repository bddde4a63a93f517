//! # plate_core - Steel Plate Combination Selector
//!
//! `plate_core` picks, for every segment of a structural member, the lightest
//! web + flange plate combination from a fabricator's plate library that
//! passes the active rules. All inputs and outputs are serde-serializable, so
//! runs can be driven from JSON as easily as from spreadsheets.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: the same inputs always pick the same plates; weight
//!   ties break on library row order
//! - **Explicit configuration**: the config is an immutable value passed by
//!   reference, never global state
//! - **Rich Errors**: structured error types, not just strings
//! - **Honest placeholders**: code checks without real limits say
//!   "Not evaluated" instead of passing silently
//!
//! ## Quick Start
//!
//! ```rust
//! use plate_core::{CodeLimits, Config, DepthRange, FrameType, Member, PlateLibrary};
//! use plate_core::run::run_selection;
//!
//! let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[(10.0, 150.0), (12.0, 150.0)]).unwrap();
//! let config = Config::default().with_depth_range(FrameType::ClearSpan, DepthRange::new(0.0, 100.0));
//! let members = vec![Member::new("M1", 6.0, FrameType::ClearSpan)];
//!
//! let report = run_selection(&members, &library, &config, &CodeLimits::new()).unwrap();
//! let row = &report.rows[0];
//! assert_eq!(row.flange.unwrap().thickness_mm, 10.0);
//!
//! // Serialize for storage or transmission
//! let json = serde_json::to_string_pretty(&report).unwrap();
//! assert!(json.contains("\"mark\": \"M1-1\""));
//! ```
//!
//! ## Modules
//!
//! - [`library`] - Plate library (web and flange tables)
//! - [`member`] - Members, frame types and design codes
//! - [`config`] - Run configuration and feature flags
//! - [`code_limits`] - Nullable design-code limits
//! - [`segments`] - Segment builder and bay patterns
//! - [`selection`] - Combination generator, rule engine, weight calculator and ranker
//! - [`report`] - Report rows and writers (xlsx, csv, json)
//! - [`io`] - Input and library readers
//! - [`run`] - Whole-run driver
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - Atomic file writes

pub mod code_limits;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod io;
pub mod library;
pub mod member;
pub mod report;
pub mod run;
pub mod segments;
pub mod selection;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use code_limits::{CodeLimitSet, CodeLimits};
pub use config::{Config, DepthModel, DepthRange, FeatureFlags, SegmentRule};
pub use errors::{PlateError, PlateResult};
pub use library::{Plate, PlateKind, PlateLibrary};
pub use member::{DesignCode, FrameType, Member};
pub use report::{ReportSummary, SelectionReport};
pub use run::{RunInputs, SegmentDiagnosis};
pub use segments::{BayPattern, Segment, SegmentBuilder};
