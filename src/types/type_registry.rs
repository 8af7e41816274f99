use crate::types::StructureDefinition;
use indexmap::IndexMap;
use std::collections::HashMap;
use url::Url;

/// Bidirectional lookup between definition ids and canonical URLs.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    id_to_url: HashMap<String, String>,
    url_to_id: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build registry from a definition set
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = &'a StructureDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(&definition.id, &definition.url);
        }
        registry
    }

    pub fn register(&mut self, id: &str, url: &str) {
        self.id_to_url.insert(id.to_string(), url.to_string());
        self.url_to_id.insert(url.to_string(), id.to_string());
    }

    pub fn id_to_url(&self, id: &str) -> Option<&str> {
        self.id_to_url.get(id).map(String::as_str)
    }

    /// Exact URL match first, then the URL with a `|version` suffix
    /// stripped.
    pub fn url_to_id(&self, url: &str) -> Option<&str> {
        self.url_to_id
            .get(url)
            .or_else(|| {
                url.split_once('|')
                    .and_then(|(unversioned, _)| self.url_to_id.get(unversioned))
            })
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_url.is_empty()
    }

    /// Last path segment of a canonical URL, used as a best-effort id when
    /// the URL is not registered.
    pub fn id_from_canonical(url: &str) -> Option<String> {
        let unversioned = url.split('|').next().unwrap_or(url);
        match Url::parse(unversioned) {
            Ok(parsed) => parsed
                .path_segments()
                .and_then(|segments| segments.last())
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
            Err(_) => unversioned
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        }
    }
}

/// Definitions keyed by id, in load order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    by_id: IndexMap<String, StructureDefinition>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: Vec<StructureDefinition>) -> Self {
        let mut index = Self::new();
        for definition in definitions {
            index.insert(definition);
        }
        index
    }

    /// Later definitions with the same id replace earlier ones.
    pub fn insert(&mut self, definition: StructureDefinition) {
        if let Some(previous) = self.by_id.insert(definition.id.clone(), definition) {
            tracing::warn!(
                "Duplicate StructureDefinition id {}, keeping the later one",
                previous.id
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&StructureDefinition> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureDefinition> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
