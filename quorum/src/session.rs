//! Interactive session state
//!
//! A session owns the schema snapshot and the current consensus mode. Only
//! an explicit mode switch mutates it; query text never survives a command.

use std::sync::Arc;

use crate::ensemble::ConsensusMode;
use crate::prompts::PromptBuilder;
use crate::schema::SchemaDescription;

/// Inputs shorter than this are rejected as commands.
pub const MIN_QUERY_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct Session {
    mode: ConsensusMode,
    schema: Arc<SchemaDescription>,
    prompts: PromptBuilder,
}

impl Session {
    pub fn new(schema: SchemaDescription, mode: ConsensusMode) -> Self {
        let prompts = PromptBuilder::new(&schema);
        Self {
            mode,
            schema: Arc::new(schema),
            prompts,
        }
    }

    pub fn mode(&self) -> ConsensusMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConsensusMode) {
        self.mode = mode;
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    SwitchMode(ConsensusMode),
    Query(String),
    /// Too short to be a query; re-prompt.
    Invalid,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            return Self::Exit;
        }
        if let Some(mode) = ConsensusMode::from_token(input) {
            return Self::SwitchMode(mode);
        }
        if input.chars().count() < MIN_QUERY_LEN {
            return Self::Invalid;
        }
        Self::Query(input.to_string())
    }
}
