//! Provider and mapper registries
//!
//! Built once while the engine is configured, then shared read-only.
//! Providers answer in registration order (first match wins); mappers
//! answer in priority order.

use crate::{DefaultValueMapper, FunctionAdapter, FunctionProvider, HostValue, NativeFunction, ValueMapper};
use keel_core::{FunctionValue, KeelError, Value};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

// ========== Providers ==========

/// Function providers in registration order
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn FunctionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider<P: FunctionProvider + 'static>(self, provider: P) -> Self {
        self.with_shared_provider(Arc::new(provider))
    }

    pub fn with_shared_provider(mut self, provider: Arc<dyn FunctionProvider>) -> Self {
        self.providers.push(provider);
        tracing::debug!(position = self.providers.len() - 1, "registered function provider");
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First provider that resolves `(name, arg_count)`
    pub fn resolve(&self, name: &str, arg_count: usize) -> Option<NativeFunction> {
        self.providers.iter().enumerate().find_map(|(index, provider)| {
            let found = provider.resolve_function(name, arg_count)?;
            tracing::trace!(function = name, arg_count, provider = index, "function resolved");
            Some(found)
        })
    }

    /// Union of every provider's names, without duplicates
    pub fn function_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .flat_map(|p| p.function_names())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

// ========== Mappers ==========

struct MapperEntry {
    priority: i32,
    mapper: Arc<dyn ValueMapper>,
}

/// Value mappers ordered by (priority desc, registration asc), with the
/// built-in conversions as the last resort
#[derive(Clone, Default)]
pub struct MapperRegistry {
    entries: Vec<Arc<MapperEntry>>,
    fallback: DefaultValueMapper,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper<M: ValueMapper + 'static>(self, mapper: M) -> Self {
        self.with_shared_mapper(Arc::new(mapper))
    }

    /// Insert after every mapper of equal or higher priority, so the list
    /// stays in dispatch order
    pub fn with_shared_mapper(mut self, mapper: Arc<dyn ValueMapper>) -> Self {
        let priority = mapper.priority();
        let position = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        tracing::debug!(mapper = mapper.name(), priority, position, "registered value mapper");
        self.entries.insert(position, Arc::new(MapperEntry { priority, mapper }));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered mappers in dispatch order
    pub fn mappers(&self) -> impl Iterator<Item = &Arc<dyn ValueMapper>> {
        self.entries.iter().map(|e| &e.mapper)
    }

    /// Lift a host object: first mapper to recognize it wins, then the
    /// built-in conversions, else `UnsupportedValue`
    pub fn to_value(&self, host: &HostValue) -> Result<Value, KeelError> {
        let inner = |nested: &HostValue| self.to_value(nested);

        for entry in &self.entries {
            if let Some(value) = entry.mapper.to_value(host, &inner)? {
                tracing::trace!(mapper = entry.mapper.name(), host = host.type_name(), "lifted host value");
                return Ok(value);
            }
        }
        if let Some(value) = self.fallback.to_value(host, &inner)? {
            return Ok(value);
        }

        tracing::debug!(host = host.type_name(), "no mapper recognized host value");
        Err(KeelError::unsupported_host_value(host.type_name()))
    }

    /// Lower a value, symmetric to `to_value`
    pub fn from_value(&self, value: &Value) -> Result<HostValue, KeelError> {
        let inner = |nested: &Value| self.from_value(nested);

        for entry in &self.entries {
            if let Some(host) = entry.mapper.from_value(value, &inner)? {
                tracing::trace!(mapper = entry.mapper.name(), variant = value.type_name(), "lowered value");
                return Ok(host);
            }
        }
        if let Some(host) = self.fallback.from_value(value, &inner)? {
            return Ok(host);
        }

        Err(KeelError::unsupported_value(value.type_name()))
    }
}

// ========== Composition ==========

/// Central registry: the providers and mappers of one engine
#[derive(Clone)]
pub struct Registry {
    providers: ProviderRegistry,
    mappers: MapperRegistry,
    suggestions: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            providers: ProviderRegistry::new(),
            mappers: MapperRegistry::new(),
            suggestions: true,
        }
    }

    pub fn with_provider<P: FunctionProvider + 'static>(mut self, provider: P) -> Self {
        self.providers = self.providers.with_provider(provider);
        self
    }

    pub fn with_shared_provider(mut self, provider: Arc<dyn FunctionProvider>) -> Self {
        self.providers = self.providers.with_shared_provider(provider);
        self
    }

    pub fn with_mapper<M: ValueMapper + 'static>(mut self, mapper: M) -> Self {
        self.mappers = self.mappers.with_mapper(mapper);
        self
    }

    pub fn with_shared_mapper(mut self, mapper: Arc<dyn ValueMapper>) -> Self {
        self.mappers = self.mappers.with_shared_mapper(mapper);
        self
    }

    /// Whether "not found" errors list similarly named functions
    pub fn with_suggestions(mut self, enabled: bool) -> Self {
        self.suggestions = enabled;
        self
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    pub fn function_names(&self) -> Vec<String> {
        self.providers.function_names()
    }

    /// Resolve and adapt; `None` when no provider knows the function
    pub fn get_function(&self, name: &str, arg_count: usize) -> Option<Result<FunctionValue, KeelError>> {
        self.providers
            .resolve(name, arg_count)
            .map(|native| FunctionAdapter.adapt(name, native))
    }

    pub fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value, KeelError> {
        match self.get_function(name, args.len()) {
            Some(function) => function?.call(args),
            None => {
                let mut err = KeelError::no_function(name, args.len());
                if self.suggestions {
                    let similar = self.find_similar_functions(name);
                    if !similar.is_empty() {
                        let shown: Vec<&str> = similar.iter().take(5).map(|s| s.as_str()).collect();
                        err = err.with_suggestion(format!("Similar: {}", shown.join(", ")));
                    }
                }
                Err(err)
            }
        }
    }

    pub fn to_value(&self, host: &HostValue) -> Result<Value, KeelError> {
        self.mappers.to_value(host)
    }

    pub fn from_value(&self, value: &Value) -> Result<HostValue, KeelError> {
        self.mappers.from_value(value)
    }

    /// Function names resembling `name`, most similar first
    fn find_similar_functions(&self, name: &str) -> Vec<String> {
        let query = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self
            .function_names()
            .into_iter()
            .filter_map(|candidate| {
                let score = Self::similarity_score(&query, &candidate.to_lowercase());
                (score > 0).then_some((candidate, score))
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = if candidate.starts_with(query) {
            100
        } else if candidate.contains(query) {
            50
        } else if query.contains(candidate) {
            30
        } else {
            0
        };

        // shared characters count only once the names already overlap
        if score > 0 {
            let query_chars: HashSet<char> = query.chars().collect();
            let candidate_chars: HashSet<char> = candidate.chars().collect();
            score += query_chars.intersection(&candidate_chars).count() * 2;

            let len_diff = query.len().abs_diff(candidate.len());
            if len_diff < 5 {
                score += 5 - len_diff;
            }
        }
        score
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
