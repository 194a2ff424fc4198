//! CLI output formatting for all commands.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Package
//!
//! ```text
//! Recipes
//! 001 Pancakes (2 steps)
//!     Source: pancakes.txt
//! 002 Tomato Soup (1 step)
//!     Source: soup.txt
//!
//! Assets
//!     index.html
//!     js/recipe.js
//!
//! Manifest: dist/recipe_list.json
//! ```
//!
//! ## Publish
//!
//! ```text
//! Local: 12 files, remote: 11 files
//! Push (2 files)
//!     dist/recipe_list.json → recipe_list.json
//!     dist/recipes/waffles.json → recipes/waffles.json
//! Delete (1 file, pending: remote deletion is not performed)
//!     recipes/crepes.json
//! Unchanged: 10
//!
//! [001/002] recipe_list.json
//! [002/002] FAILED dist/recipes/waffles.json: Upload timed out
//!
//! Uploaded 1, failed 1
//! ```

use crate::index::SyncRoots;
use crate::package::{PackageResult, ParsedRecipe};
use crate::publish::{PublishOutcome, SyncPlan};
use crate::sync::DeletionState;
use crate::upload::{UploadEvent, UploadReport};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 file`, `2 files`.
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn recipe_lines(index: usize, recipe: &ParsedRecipe) -> Vec<String> {
    vec![
        format!(
            "{} {} ({})",
            format_index(index),
            recipe.document.title,
            plural(recipe.document.steps.len(), "step", "steps")
        ),
        format!("{}Source: {}", indent(1), file_name(&recipe.source)),
    ]
}

// ============================================================================
// Package / check
// ============================================================================

/// Format package output: recipes, copied assets, manifest location.
pub fn format_package_output(result: &PackageResult) -> Vec<String> {
    let mut lines = format_check_output(&result.recipes);

    if !result.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &result.assets {
            let display = asset
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            lines.push(format!("{}{}", indent(1), display));
        }
    }

    lines.push(String::new());
    lines.push(format!("Manifest: {}", result.manifest_path.display()));
    lines
}

/// Format the parsed recipe list.
pub fn format_check_output(recipes: &[ParsedRecipe]) -> Vec<String> {
    let mut lines = vec!["Recipes".to_string()];
    if recipes.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, recipe) in recipes.iter().enumerate() {
        lines.extend(recipe_lines(i + 1, recipe));
    }
    lines
}

pub fn print_package_output(result: &PackageResult) {
    for line in format_package_output(result) {
        println!("{}", line);
    }
}

pub fn print_check_output(recipes: &[ParsedRecipe]) {
    for line in format_check_output(recipes) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish
// ============================================================================

/// Format a sync plan: what will be pushed, what should be deleted.
pub fn format_plan(plan: &SyncPlan, roots: &SyncRoots) -> Vec<String> {
    let worklist = &plan.worklist;
    let mut lines = vec![format!(
        "Local: {}, remote: {}",
        plural(plan.local_files, "file", "files"),
        plural(plan.remote_files, "file", "files")
    )];

    lines.push(format!(
        "Push ({})",
        plural(worklist.to_push.len(), "file", "files")
    ));
    for local in &worklist.to_push {
        let remote = roots
            .remote_path_for(Path::new(local))
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("{}{} → {}", indent(1), local, remote));
    }

    let deletes = &worklist.to_delete;
    if !deletes.is_empty() {
        let state = match deletes.state() {
            DeletionState::Pending => "pending: remote deletion is not performed",
            DeletionState::Executed => "deleted",
        };
        lines.push(format!(
            "Delete ({}, {})",
            plural(deletes.len(), "file", "files"),
            state
        ));
        for remote in deletes.paths() {
            lines.push(format!("{}{}", indent(1), remote));
        }
    }

    lines.push(format!("Unchanged: {}", worklist.unchanged));
    lines
}

/// Format one upload progress event as a single line.
pub fn format_upload_event(event: &UploadEvent) -> String {
    match event {
        UploadEvent::Uploaded {
            index,
            total,
            remote_path,
            ..
        } => format!(
            "[{}/{}] {}",
            format_index(*index),
            format_index(*total),
            remote_path
        ),
        UploadEvent::Failed {
            index,
            total,
            local_path,
            error,
        } => format!(
            "[{}/{}] FAILED {}: {}",
            format_index(*index),
            format_index(*total),
            local_path,
            error
        ),
    }
}

/// Format the end-of-run upload summary, listing every failure again.
pub fn format_upload_summary(report: &UploadReport) -> Vec<String> {
    if report.attempted() == 0 {
        return vec!["Nothing to upload".to_string()];
    }

    let mut lines = vec![format!(
        "Uploaded {}, failed {}",
        report.uploaded.len(),
        report.failed.len()
    )];
    for failure in &report.failed {
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            failure.local_path,
            failure.error
        ));
    }
    lines
}

pub fn print_plan(plan: &SyncPlan, roots: &SyncRoots) {
    for line in format_plan(plan, roots) {
        println!("{}", line);
    }
}

pub fn print_publish_summary(outcome: &PublishOutcome) {
    println!();
    for line in format_upload_summary(&outcome.uploads) {
        println!("{}", line);
    }
}
