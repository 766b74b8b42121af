//! Layer-pair dispatch table.
//!
//! A profile maps the querying collider's layer to a rule set, and a rule set
//! maps the candidate's layer to a response. A missing entry means the pair is
//! never tested. Lookup is directional and keyed by exact layer value.

use std::collections::HashMap;
use std::fmt;

use crate::layer::CollisionLayer;
use crate::types::ContactInfo;

/// Called synchronously for each confirmed contact.
pub type CollisionResponse = Box<dyn FnMut(&ContactInfo) + Send>;

/// Responses of one querying layer, keyed by candidate layer.
#[derive(Default)]
pub struct CollisionRules {
    responses: HashMap<CollisionLayer, CollisionResponse>,
}

impl CollisionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the response for `candidate`.
    pub fn insert<F>(&mut self, candidate: CollisionLayer, response: F) -> &mut Self
    where
        F: FnMut(&ContactInfo) + Send + 'static,
    {
        self.responses.insert(candidate, Box::new(response));
        self
    }

    pub fn has_rule(&self, candidate: CollisionLayer) -> bool {
        self.responses.contains_key(&candidate)
    }

    pub fn remove(&mut self, candidate: CollisionLayer) -> Option<CollisionResponse> {
        self.responses.remove(&candidate)
    }

    pub fn response_mut(&mut self, candidate: CollisionLayer) -> Option<&mut CollisionResponse> {
        self.responses.get_mut(&candidate)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl fmt::Debug for CollisionRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut layers: Vec<_> = self.responses.keys().collect();
        layers.sort();
        f.debug_struct("CollisionRules").field("layers", &layers).finish()
    }
}

/// Full dispatch table for a world.
#[derive(Default, Debug)]
pub struct CollisionProfile {
    rules: HashMap<CollisionLayer, CollisionRules>,
}

impl CollisionProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole rule set of `query`.
    pub fn insert_rules(&mut self, query: CollisionLayer, rules: CollisionRules) -> &mut Self {
        self.rules.insert(query, rules);
        self
    }

    /// Register `response` for contacts found by `query` bodies against `candidate` bodies.
    pub fn on<F>(&mut self, query: CollisionLayer, candidate: CollisionLayer, response: F) -> &mut Self
    where
        F: FnMut(&ContactInfo) + Send + 'static,
    {
        self.rules.entry(query).or_default().insert(candidate, response);
        self
    }

    pub fn has_profile(&self, query: CollisionLayer) -> bool {
        self.rules.contains_key(&query)
    }

    pub fn has_rule(&self, query: CollisionLayer, candidate: CollisionLayer) -> bool {
        self.rules.get(&query).is_some_and(|r| r.has_rule(candidate))
    }

    pub fn rules(&self, query: CollisionLayer) -> Option<&CollisionRules> {
        self.rules.get(&query)
    }

    pub fn rules_mut(&mut self, query: CollisionLayer) -> Option<&mut CollisionRules> {
        self.rules.get_mut(&query)
    }

    pub fn response_mut(&mut self, query: CollisionLayer, candidate: CollisionLayer) -> Option<&mut CollisionResponse> {
        self.rules.get_mut(&query)?.response_mut(candidate)
    }

    pub fn remove_profile(&mut self, query: CollisionLayer) -> Option<CollisionRules> {
        self.rules.remove(&query)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
