//! The ritual DSL.
//!
//! A tiny line-oriented command language for batching an OmniCore
//! integrate/activate/generate-thought sequence:
//!
//! ```text
//! :: awaken the resonance core
//! initiate Nikola Tesla
//! frequency => 1115
//! ```
//!
//! Each line is either `key => value` or `key value...`; lines starting
//! with `::` are comments. `initiate` names the entity and `frequency`
//! gives a positive integer. Anything less is a compilation error the
//! executor logs rather than propagates.

use std::collections::HashMap;
use thiserror::Error;

/// A compiled ritual script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RitualScript {
    pub entity_name: String,
    pub frequency: u32,
}

/// Ritual compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RitualError {
    #[error("Ritual malformed. Requires 'initiate <name>' and 'frequency => <number>'.")]
    MissingDirectives,
    #[error("Ritual frequency '{0}' is not a positive integer.")]
    InvalidFrequency(String),
}

/// Compiles ritual source into a script.
pub fn parse_ritual(source: &str) -> Result<RitualScript, RitualError> {
    let mut commands: HashMap<String, String> = HashMap::new();

    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("::") {
            continue;
        }

        if let Some((key, value)) = line.split_once("=>") {
            commands.insert(key.trim().to_string(), value.trim().to_string());
        } else {
            let mut parts = line.split_whitespace();
            if let Some(key) = parts.next() {
                let value = parts.collect::<Vec<_>>().join(" ");
                commands.insert(key.to_string(), value);
            }
        }
    }

    let entity_name = commands
        .get("initiate")
        .filter(|name| !name.is_empty())
        .cloned()
        .ok_or(RitualError::MissingDirectives)?;

    let raw_frequency = commands
        .get("frequency")
        .filter(|freq| !freq.is_empty())
        .ok_or(RitualError::MissingDirectives)?;

    let frequency = raw_frequency
        .parse::<u32>()
        .ok()
        .filter(|f| *f > 0)
        .ok_or_else(|| RitualError::InvalidFrequency(raw_frequency.clone()))?;

    Ok(RitualScript {
        entity_name,
        frequency,
    })
}
