//! CLI entry point for inspecting a notes document.
//!
//! # Responsibility
//! - Open (or seed) the notes file given as the only argument.
//! - Print the note hierarchy as an indented outline.
//!
//! # Environment
//! - `EASYNOTES_LOG_DIR`: absolute directory; enables file logging when set.
//! - `EASYNOTES_LOG_LEVEL`: overrides the build-mode default level.

use easynotes_core::{
    default_log_level, init_logging, JsonFileDocumentRepository, NoteService, StoreResult,
};
use std::process::ExitCode;

const DEFAULT_NOTES_PATH: &str = "./notes.json";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("EASYNOTES_LOG_DIR") {
        let level = std::env::var("EASYNOTES_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("easynotes: logging disabled: {err}");
        }
    }

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_NOTES_PATH.to_string());

    match print_outline(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_outline module=cli status=error kind={:?}", err.kind());
            eprintln!("easynotes: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_outline(path: &str) -> StoreResult<()> {
    let service = NoteService::open(JsonFileDocumentRepository::new(path))?;
    println!("easynotes_core version={}", easynotes_core::core_version());
    println!("{path}: {} notes", service.len());

    let mut stack = vec![(service.root(), 0usize)];
    while let Some((note, depth)) = stack.pop() {
        println!(
            "{}- {} [{} articles]",
            "  ".repeat(depth),
            note.title,
            note.articles.len()
        );
        let children = service.children(&note.id)?;
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(())
}
