//! Site packaging: recipes in, static site out.
//!
//! ```text
//! recipes/                     dist/
//! ├── pancakes.txt      ──►    ├── recipe_list.json     # manifest
//! └── soup.txt                 ├── recipes/
//!                              │   ├── pancakes.json
//! client/                      │   └── soup.json
//! ├── index.html        ──►    ├── index.html
//! └── js/recipe.js             └── js/recipe.js
//! ```
//!
//! Every regular file directly inside the recipes directory is a recipe
//! (hidden files are skipped); its id is the filename stem. Ids must be
//! unique: `stew.txt` and `stew.md` in the same directory fail the build.
//! The manifest lives outside the records directory, so any stem is a valid
//! id. Recipes are parsed
//! in parallel with [rayon](https://docs.rs/rayon), but a malformed recipe
//! fails the whole build and nothing is written. The first failure in filename
//! order is the one reported.
//!
//! Client assets are copied verbatim into the output root, keeping their
//! directory layout.

use crate::recipe::{self, ParseError, RecipeDocument};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the output root holding recipe records.
pub const RECIPES_SUBDIR: &str = "recipes";

/// Manifest filename at the output root.
pub const MANIFEST_FILENAME: &str = "recipe_list.json";

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Recipes directory not found: {0}")]
    RecipesNotFound(PathBuf),
    #[error("Failed to parse {path}: {source}")]
    Recipe { path: PathBuf, source: ParseError },
    #[error("Recipe id '{id}' used by more than one file: {paths:?}")]
    DuplicateId { id: String, paths: Vec<PathBuf> },
}

/// A recipe file and its parsed document.
#[derive(Debug, Clone)]
pub struct ParsedRecipe {
    /// Filename stem; names the output record and the manifest entry.
    pub id: String,
    pub source: PathBuf,
    pub document: RecipeDocument,
}

/// One line of the recipe manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub title: String,
    pub id: String,
}

/// What a package run produced, for display.
#[derive(Debug)]
pub struct PackageResult {
    pub recipes: Vec<ParsedRecipe>,
    /// Copied client assets, relative to the output root.
    pub assets: Vec<PathBuf>,
    pub manifest_path: PathBuf,
}

/// Parse every recipe, then write records, manifest, and client assets.
pub fn package(
    recipes_dir: &Path,
    client_dir: &Path,
    output_dir: &Path,
) -> Result<PackageResult, PackageError> {
    let recipes = parse_all(recipes_dir)?;

    let records_dir = output_dir.join(RECIPES_SUBDIR);
    fs::create_dir_all(&records_dir)?;
    for recipe in &recipes {
        write_record(&records_dir, recipe)?;
    }

    let manifest_path = output_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(&build_manifest(&recipes))?;
    fs::write(&manifest_path, json)?;

    let assets = copy_assets(client_dir, output_dir)?;

    tracing::info!(
        recipes = recipes.len(),
        assets = assets.len(),
        output = %output_dir.display(),
        "packaged site"
    );

    Ok(PackageResult {
        recipes,
        assets,
        manifest_path,
    })
}

/// Parse every recipe in `recipes_dir`, sorted by filename.
pub fn parse_all(recipes_dir: &Path) -> Result<Vec<ParsedRecipe>, PackageError> {
    let files = recipe_files(recipes_dir)?;

    let results: Vec<Result<ParsedRecipe, PackageError>> = files
        .par_iter()
        .map(|path| {
            let document = recipe::parse_file(path).map_err(|source| PackageError::Recipe {
                path: path.clone(),
                source,
            })?;
            Ok(ParsedRecipe {
                id: recipe_id(path),
                source: path.clone(),
                document,
            })
        })
        .collect();

    let recipes: Vec<ParsedRecipe> = results.into_iter().collect::<Result<_, _>>()?;
    check_unique_ids(&recipes)?;
    Ok(recipes)
}

/// Fail on the first id (in id order) claimed by more than one file.
fn check_unique_ids(recipes: &[ParsedRecipe]) -> Result<(), PackageError> {
    let mut by_id: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
    for recipe in recipes {
        by_id
            .entry(recipe.id.as_str())
            .or_default()
            .push(recipe.source.clone());
    }
    match by_id.into_iter().find(|(_, paths)| paths.len() > 1) {
        Some((id, paths)) => Err(PackageError::DuplicateId {
            id: id.to_string(),
            paths,
        }),
        None => Ok(()),
    }
}

/// Regular, non-hidden files directly inside `recipes_dir`, sorted.
fn recipe_files(recipes_dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
    if !recipes_dir.is_dir() {
        return Err(PackageError::RecipesNotFound(recipes_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(recipes_dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if path.is_file() && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn recipe_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn write_record(records_dir: &Path, recipe: &ParsedRecipe) -> Result<(), PackageError> {
    let path = records_dir.join(format!("{}.json", recipe.id));
    let json = serde_json::to_string_pretty(&recipe.document)?;
    fs::write(path, json)?;
    Ok(())
}

/// Manifest entries for parsed recipes, in id order.
pub fn build_manifest(recipes: &[ParsedRecipe]) -> Vec<ManifestEntry> {
    let mut entries: Vec<ManifestEntry> = recipes
        .iter()
        .map(|r| ManifestEntry {
            title: r.document.title.clone(),
            id: r.id.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}

/// Copy every file under `client_dir` into `output_dir`.
///
/// A missing client directory is not an error: the site then consists of the
/// recipe records alone.
fn copy_assets(client_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
    if !client_dir.is_dir() {
        tracing::warn!(dir = %client_dir.display(), "client directory not found, no assets copied");
        return Ok(Vec::new());
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(client_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(client_dir) else {
            continue;
        };
        let dest = output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied.push(rel.to_path_buf());
    }
    Ok(copied)
}
