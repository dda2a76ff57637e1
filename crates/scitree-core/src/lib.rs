//! # scitree-core
//!
//! Core types shared by every scitree crate:
//! - [`Document`] and [`Section`]: the pre-embedded corpus records
//! - Temporal helpers ([`DateCutoff`], [`RecencyWeight`], [`publication_year`])
//! - [`paper_url`]: corpus id to arXiv link
//! - [`Settings`]: per-run configuration
//! - Error hierarchy ([`ScitreeError`], [`LoadError`], [`TemporalError`])

pub mod config;
pub mod document;
pub mod error;
pub mod paper;
pub mod temporal;

pub use config::{CorpusPaths, FilterSettings, Settings};
pub use document::{Document, DocumentText, Section};
pub use error::{LoadError, Result, ScitreeError, TemporalError};
pub use paper::paper_url;
pub use temporal::{current_year, publication_year, DateCutoff, RecencyWeight};
