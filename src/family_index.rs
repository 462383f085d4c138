//! Bidirectional target-to-family association.

use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use log::warn;

use crate::error::FamsortError;
use crate::seqio::open_text;

/// Total mapping from reference targets to family labels, with its
/// inverse. Targets absent from the supplied map become their own
/// singleton family.
#[derive(Debug, Default)]
pub struct TargetFamilyIndex {
    target_to_family: IndexMap<String, String>,
    family_to_targets: IndexMap<String, Vec<String>>,
}

impl TargetFamilyIndex {
    /// Build the index from (target, family) pairs plus the
    /// authoritative target list from the reference collection.
    ///
    /// A repeated target in `pairs` is fatal. Reference targets missing
    /// from `pairs` are appended as self-mapped singleton families, with
    /// one warning naming all of them.
    pub fn build(
        pairs: Vec<(String, String)>,
        reference_targets: &[String],
    ) -> Result<Self, FamsortError> {
        let mut target_to_family = IndexMap::with_capacity(pairs.len());
        for (target, family) in pairs {
            if target_to_family.insert(target.clone(), family).is_some() {
                return Err(FamsortError::DuplicateTarget { target });
            }
        }

        let missing: Vec<String> = reference_targets
            .iter()
            .filter(|t| !target_to_family.contains_key(*t))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(
                "{} target(s) absent from the family map, each becomes its own family:\n\t- {}",
                missing.len(),
                missing.join("\n\t- ")
            );
            for target in missing {
                target_to_family.insert(target.clone(), target);
            }
        }

        let mut family_to_targets: IndexMap<String, Vec<String>> = IndexMap::new();
        for (target, family) in &target_to_family {
            family_to_targets
                .entry(family.clone())
                .or_default()
                .push(target.clone());
        }

        Ok(Self {
            target_to_family,
            family_to_targets,
        })
    }

    /// Family label for a target, if the target is known.
    pub fn family_of(&self, target: &str) -> Option<&str> {
        self.target_to_family.get(target).map(|s| s.as_str())
    }

    /// Targets of a family, in insertion order.
    pub fn targets_of(&self, family: &str) -> Option<&[String]> {
        self.family_to_targets.get(family).map(|v| v.as_slice())
    }

    pub fn num_targets(&self) -> usize {
        self.target_to_family.len()
    }

    pub fn num_families(&self) -> usize {
        self.family_to_targets.len()
    }
}

/// Read the two-column target-to-family link file. The delimiter is
/// auto-detected per line: tab, comma, or semicolon if present, any
/// whitespace otherwise.
pub fn read_family_map<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>, FamsortError> {
    let path = path.as_ref();
    let reader = open_text(path)?;

    let mut pairs = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| FamsortError::MissingInput {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match split_map_line(&line) {
            Some(pair) => pairs.push(pair),
            None => {
                return Err(FamsortError::BadRecord {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    detail: "expected two columns (target, family)".to_string(),
                })
            }
        }
    }

    Ok(pairs)
}

fn split_map_line(line: &str) -> Option<(String, String)> {
    for delim in ['\t', ',', ';'] {
        if line.contains(delim) {
            let (target, family) = line.split_once(delim)?;
            let (target, family) = (target.trim(), family.trim());
            if target.is_empty() || family.is_empty() {
                return None;
            }
            return Some((target.to_string(), family.to_string()));
        }
    }

    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(target), Some(family)) => Some((target.to_string(), family.to_string())),
        _ => None,
    }
}
