//! Loading the FAQ table from CSV

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use super::entry::{FaqEntry, KnowledgeBase};
use crate::error::{Result, SupportError};

fn is_question_header(header: &str) -> bool {
    header.contains("question") || header == "q"
}

fn is_answer_header(header: &str) -> bool {
    header.contains("answer") || header.contains("response") || header == "a"
}

/// Locate the question and answer columns, matching headers case-insensitively
fn find_columns(headers: &StringRecord) -> Result<(usize, usize)> {
    let mut question = None;
    let mut answer = None;

    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim().to_lowercase();
        if question.is_none() && is_question_header(&header) {
            question = Some(idx);
        } else if answer.is_none() && is_answer_header(&header) {
            answer = Some(idx);
        }
    }

    match (question, answer) {
        (Some(q), Some(a)) => Ok((q, a)),
        _ => Err(SupportError::KnowledgeLoad(format!(
            "expected question and answer columns, found: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Empty cells and pandas-style "nan" placeholders carry no content
fn usable(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
}

/// Read a knowledge base from any CSV source
pub fn load_from_reader<R: Read>(reader: R) -> Result<KnowledgeBase> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let (question_idx, answer_idx) = find_columns(csv.headers()?)?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for record in csv.records() {
        let record = record?;
        match (
            usable(record.get(question_idx)),
            usable(record.get(answer_idx)),
        ) {
            (Some(question), Some(answer)) => entries.push(FaqEntry::new(question, answer)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} incomplete FAQ row(s)", skipped);
    }

    Ok(KnowledgeBase::from_entries(entries))
}

/// Read a knowledge base from a CSV file
pub fn load_from_path(path: impl AsRef<Path>) -> Result<KnowledgeBase> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        SupportError::KnowledgeLoad(format!("cannot open {}: {}", path.display(), e))
    })?;
    let knowledge = load_from_reader(file)?;
    info!("Loaded {} FAQ entries from {}", knowledge.len(), path.display());
    Ok(knowledge)
}
