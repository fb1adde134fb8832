//! Client for the external entity-detection subprocess.
//!
//! The detector is a black box: it receives raw text on stdin and prints
//! `{"detectedEntities": [{entity, confidence, ...}]}` sorted by descending
//! confidence. A non-zero exit, malformed output, or a spawn failure all
//! degrade to "no candidates" — the route resolver still produces a
//! (lower-confidence) decision without it.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::types::DetectedEntity;

/// Source of pre-extracted entity candidates for a text snippet.
pub trait EntityDetector {
    fn detect(&self, text: &str) -> Vec<DetectedEntity>;
}

/// Runs a configured command, piping the text to its stdin.
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetectorOutput {
    #[serde(default, rename = "detectedEntities")]
    detected_entities: Vec<DetectedEntity>,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` command line; empty -> None.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    fn run(&self, text: &str) -> std::io::Result<Option<String>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(text.as_bytes())?;
        }
        // Drop stdin so the child sees EOF before we wait.
        drop(child.stdin.take());

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl EntityDetector for CommandDetector {
    fn detect(&self, text: &str) -> Vec<DetectedEntity> {
        let stdout = match self.run(text) {
            Ok(Some(stdout)) => stdout,
            Ok(None) => {
                log::debug!("Entity detector '{}' exited non-zero", self.program);
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Entity detector '{}' failed to run: {}", self.program, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<DetectorOutput>(&stdout) {
            Ok(parsed) => parsed.detected_entities,
            Err(e) => {
                log::warn!("Entity detector '{}' produced malformed output: {}", self.program, e);
                Vec::new()
            }
        }
    }
}
