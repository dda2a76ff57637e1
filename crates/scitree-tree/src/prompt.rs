//! Prompt assembly for node expansion.

use std::fmt::Write as _;

use scitree_core::DocumentText;

use crate::mode::Mode;

/// Persona used when no background is configured.
pub const DEFAULT_BACKGROUND: &str =
    "You are an expert astronomer trying to understand the science case for a future observatory.";

/// Background persona with the optional observatory description appended.
#[must_use]
pub fn persona(background: Option<&str>, experiment: Option<&str>) -> String {
    let mut out = background.unwrap_or(DEFAULT_BACKGROUND).trim_end().to_string();
    if let Some(experiment) = experiment.map(str::trim).filter(|e| !e.is_empty()) {
        out.push(' ');
        out.push_str(experiment);
    }
    out
}

/// `"<persona>\n<template>"`, or `None` at the terminal level.
#[must_use]
pub fn system_prompt(persona: &str, mode: Mode, n: usize) -> Option<String> {
    mode.template(n).map(|template| format!("{persona}\n{template}"))
}

/// `"<label>: <text>\n"` followed by `"<id>: <abstract>\n"` per document.
#[must_use]
pub fn input_block(mode: Mode, text: &str, documents: &[DocumentText]) -> String {
    let mut out = format!("{}: {text}\n", mode.label());
    for doc in documents {
        let _ = writeln!(out, "{}: {}", doc.id, doc.abstract_text);
    }
    out
}
