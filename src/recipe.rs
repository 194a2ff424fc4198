//! Plain-text recipe parser.
//!
//! A recipe is a sequence of blocks separated by blank lines. The first block
//! is the header and holds exactly one line, the title. Every following block
//! is one step:
//!
//! ```text
//! Pancakes
//!
//! - flour
//! - milk
//! + griddle
//! Mix and cook.
//!
//! - maple syrup
//! Serve warm.
//! ```
//!
//! Within a step each line is classified on its own:
//!
//! | Line starts with | Goes to |
//! |---|---|
//! | `-` | `ingredients` (leading `-`/space stripped) |
//! | `+` | `other_inputs` (leading `+`/space stripped) |
//! | anything else | `instructions`, joined with single spaces |
//!
//! Classification is line-local: a step that interleaves instructions and
//! ingredients comes out bucketed, and the original interleaving is not kept.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Header must be exactly one title line, found {lines}")]
    MalformedHeader { lines: usize },
}

/// A parsed recipe, serialized as-is into `recipes/<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDocument {
    pub title: String,
    pub steps: Vec<Step>,
}

/// One step of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub ingredients: Vec<String>,
    pub other_inputs: Vec<String>,
    /// All instruction lines of the step flattened into one string.
    pub instructions: Option<String>,
}

/// Parse a recipe from any buffered reader.
pub fn parse_recipe<R: BufRead>(reader: R) -> Result<RecipeDocument, ParseError> {
    let mut blocks = BlockReader::new(reader);

    let header = blocks.next_block()?;
    let title = parse_header(header)?;

    let mut steps = Vec::new();
    loop {
        let block = blocks.next_block()?;
        if block.is_empty() {
            break;
        }
        steps.push(parse_step(&block));
    }

    Ok(RecipeDocument { title, steps })
}

/// Open and parse a recipe file.
pub fn parse_file(path: &Path) -> Result<RecipeDocument, ParseError> {
    let file = File::open(path)?;
    parse_recipe(BufReader::new(file))
}

fn parse_header(mut lines: Vec<String>) -> Result<String, ParseError> {
    if lines.len() != 1 {
        return Err(ParseError::MalformedHeader { lines: lines.len() });
    }
    Ok(lines.remove(0))
}

fn parse_step(lines: &[String]) -> Step {
    let mut step = Step::default();

    for line in lines {
        if line.starts_with('-') {
            step.ingredients
                .push(line.trim_start_matches(['-', ' ']).to_string());
        } else if line.starts_with('+') {
            step.other_inputs
                .push(line.trim_start_matches(['+', ' ']).to_string());
        } else {
            step.instructions = Some(match step.instructions.take() {
                Some(existing) => format!("{existing} {line}"),
                None => line.clone(),
            });
        }
    }

    step
}

/// Reads a document one blank-line-delimited block at a time.
struct BlockReader<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> BlockReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Next block of trimmed, non-blank lines.
    ///
    /// Blank lines before the block are skipped. An empty result means the
    /// stream is exhausted.
    fn next_block(&mut self) -> io::Result<Vec<String>> {
        let mut block = Vec::new();
        for line in self.lines.by_ref() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                if !block.is_empty() {
                    return Ok(block);
                }
            } else {
                block.push(line.to_string());
            }
        }
        Ok(block)
    }
}
