//! Delegation graph validation.
//!
//! A delegated binding may point at another delegated binding. That is
//! fine as long as the chain ends in a real service; a chain that loops
//! back would recurse forever on first use. [`DelegationGraph`] finds such
//! loops at bootstrap.
//!
//! Entries that do not resolve or do not classify contribute no edges:
//! they fail on their own when requested.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::config::ConfigValue;
use crate::descriptor::ServiceDescriptor;
use crate::error::{CircularDelegationError, WakilError};
use crate::key::DottedKey;
use crate::path;

/// Edges between delegated bindings.
///
/// # Algorithm
/// Each binding has at most one outgoing edge (its descriptor's target),
/// so a depth-first walk with a "currently visiting" set finds every
/// cycle.
#[derive(Debug)]
pub(crate) struct DelegationGraph {
    /// binding -> binding it delegates to, if that target is itself bound
    edges: BTreeMap<String, Option<String>>,
    visiting: HashSet<String>,
    validated: HashSet<String>,
    path: Vec<String>,
}

impl DelegationGraph {
    /// Builds the graph for `bindings` from the configuration snapshot.
    pub fn new(root: &ConfigValue, bindings: &[DottedKey]) -> Self {
        let bound: HashSet<&str> = bindings.iter().map(DottedKey::as_str).collect();

        let edges = bindings
            .iter()
            .map(|binding| {
                let target = path::resolve_key(root, binding)
                    .ok()
                    .and_then(|value| ServiceDescriptor::classify(value).target())
                    .filter(|target| bound.contains(target))
                    .map(str::to_string);
                (binding.to_string(), target)
            })
            .collect();

        Self {
            edges,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates that no binding delegates back to itself.
    ///
    /// # Errors
    /// [`WakilError::CircularDelegation`] with the offending chain.
    #[instrument(skip(self), name = "delegation_validation")]
    pub fn validate(&mut self) -> Result<(), WakilError> {
        let bindings: Vec<String> = self.edges.keys().cloned().collect();

        debug!(binding_count = bindings.len(), "Validating delegation graph");

        for binding in bindings {
            if !self.validated.contains(&binding) {
                self.validate_binding(&binding)?;
            }
        }

        Ok(())
    }

    fn validate_binding(&mut self, binding: &str) -> Result<(), WakilError> {
        if self.validated.contains(binding) {
            return Ok(());
        }

        if self.visiting.contains(binding) {
            let cycle_start = self.path.iter().position(|b| b == binding).unwrap_or(0);

            let mut chain: Vec<String> = self.path[cycle_start..].to_vec();
            chain.push(binding.to_string());

            warn!(cycle = ?chain, "Circular delegation detected");

            return Err(WakilError::CircularDelegation(CircularDelegationError { chain }));
        }

        self.visiting.insert(binding.to_string());
        self.path.push(binding.to_string());

        if let Some(target) = self.edges.get(binding).cloned().flatten() {
            self.validate_binding(&target)?;
        }

        self.path.pop();
        self.visiting.remove(binding);
        self.validated.insert(binding.to_string());

        Ok(())
    }
}
