// dqc-core/src/domain/uri.rs

use serde::Serialize;

use crate::domain::error::DomainError;

/// Scheme accepted today.
const SUPPORTED_SCHEMES: [&str; 1] = ["dataplex"];
/// Schemes we recognize but do not resolve yet.
const RESERVED_SCHEMES: [&str; 2] = ["bigquery", "local"];

/// The fixed hierarchical path: four levels terminating at an entity.
const REQUIRED_SEGMENTS: [&str; 5] = ["projects", "locations", "lakes", "zones", "entities"];

/// Characters never valid anywhere in the part after `scheme://`.
const FORBIDDEN_URI_CHARS: [char; 5] = ['?', '#', '&', '@', ':'];

/// A compact locator addressing an entity held in the external metadata
/// registry, e.g.
/// `dataplex://projects/p/locations/l/lakes/lk/zones/z/entities/e`.
///
/// Segment values are paired with segment names by strict alternation of
/// path tokens; a value containing `/` therefore shifts the pairing and
/// surfaces as a missing required segment. No escaping mechanism exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityUri {
    pub uri: String,
    pub scheme: String,
    /// Segment name/value pairs in declaration order.
    pub segments: Vec<(String, String)>,
    /// Value of the final `entities` segment, case as written. Entity ids
    /// are normalized later, at entity construction.
    pub entity_id: String,
}

impl EntityUri {
    pub fn parse(uri: &str) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::InvalidUri {
            uri: uri.to_string(),
            reason,
        };

        let (scheme, remainder) = uri
            .split_once("://")
            .ok_or_else(|| invalid("missing '://' scheme separator".to_string()))?;

        if RESERVED_SCHEMES.contains(&scheme) {
            return Err(DomainError::NotImplemented(format!(
                "entity URI scheme '{scheme}://' is recognized but not supported yet"
            )));
        }
        if !SUPPORTED_SCHEMES.contains(&scheme) {
            return Err(invalid(format!("unknown scheme '{scheme}://'")));
        }

        let tokens: Vec<&str> = remainder.split('/').collect();
        if tokens.len() % 2 != 0 {
            return Err(invalid(format!(
                "expected alternating segment/value path tokens, got {} tokens",
                tokens.len()
            )));
        }

        let segments: Vec<(String, String)> = tokens
            .chunks_exact(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        // Elided higher-level segments (starting the path below `projects`)
        // must not silently default to anything.
        if let Some((first, _)) = segments.first() {
            if first != REQUIRED_SEGMENTS[0] && REQUIRED_SEGMENTS.contains(&first.as_str()) {
                return Err(DomainError::NotImplemented(format!(
                    "entity URI with elided higher-level segments (starts at '{first}') \
                     is not supported; spell out the full path from 'projects'"
                )));
            }
        }

        for required in REQUIRED_SEGMENTS {
            let value = segments
                .iter()
                .find(|(name, _)| name == required)
                .map(|(_, value)| value.as_str());
            match value {
                None => return Err(invalid(format!("missing required segment '{required}'"))),
                Some("") => {
                    return Err(invalid(format!("segment '{required}' has an empty value")));
                }
                Some(_) => {}
            }
        }

        let entity_value = segments
            .iter()
            .find(|(name, _)| name == "entities")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();

        if entity_value.ends_with('*') {
            return Err(DomainError::NotImplemented(format!(
                "wildcard entity id '{entity_value}' is not supported"
            )));
        }

        // Checked last: a wildcard URI reads as unimplemented even when it
        // also carries a blocklisted character.
        if let Some(c) = remainder
            .chars()
            .find(|c| FORBIDDEN_URI_CHARS.contains(c) || c.is_whitespace())
        {
            return Err(invalid(format!("forbidden character '{c}' in URI path")));
        }

        Ok(EntityUri {
            uri: uri.to_string(),
            scheme: scheme.to_string(),
            entity_id: entity_value,
            segments,
        })
    }

    /// Canonical reconstructed hierarchical path. This is the key the
    /// configuration cache uses to index remotely-resolved entities.
    pub fn compound_primary_key(&self) -> String {
        REQUIRED_SEGMENTS
            .iter()
            .filter_map(|name| {
                self.segments
                    .iter()
                    .find(|(seg, _)| seg == name)
                    .map(|(seg, value)| format!("{seg}/{value}"))
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn segment(&self, name: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(seg, _)| seg == name)
            .map(|(_, value)| value.as_str())
    }
}
