//! Sequence templates
//!
//! A template is a `+`-separated list of tokens such as `ad+id+music`.
//! Each token becomes at most one item in the composed job.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One slot of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Station id from the rotating id queue
    Id,
    /// Advertisement from the rotating ad queue
    Ad,
    /// DJ solo
    Solo,
    /// Station jingle
    Jingle,
    /// Long or short station id, drawn by probability
    StationId,
    /// Day-eligible news bulletin
    News,
    /// Music track with optional intro/outro narration
    Music,
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(Token::Id),
            "ad" | "adv" => Ok(Token::Ad),
            "solo" | "djsolo" => Ok(Token::Solo),
            "jingle" | "adkult" => Ok(Token::Jingle),
            "station-id" | "idkult" => Ok(Token::StationId),
            "news" => Ok(Token::News),
            "music" | "musica" => Ok(Token::Music),
            other => Err(Error::Config(format!("unknown template token '{}'", other))),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Id => "id",
            Token::Ad => "ad",
            Token::Solo => "solo",
            Token::Jingle => "jingle",
            Token::StationId => "station-id",
            Token::News => "news",
            Token::Music => "music",
        };
        f.write_str(s)
    }
}

/// Named, ordered list of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    tokens: Vec<Token>,
}

impl Template {
    pub fn parse(s: &str) -> Result<Self> {
        let tokens = s
            .split('+')
            .map(Token::from_str)
            .collect::<Result<Vec<_>>>()?;
        if tokens.is_empty() {
            return Err(Error::Config("empty template".to_string()));
        }
        let name = tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        Ok(Self { name, tokens })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
