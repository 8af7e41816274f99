use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaGenError {
    #[error("StructureDefinition {id} has derivation 'constraint' but no baseDefinition")]
    MissingBaseDefinition { id: String },

    #[error("Base definition URL {url} could not be converted to a type id for {id}")]
    UnresolvedBaseUrl { id: String, url: String },

    #[error("Base definition {base_id} not found for {id}")]
    BaseDefinitionNotFound { id: String, base_id: String },

    #[error("Circular baseDefinition chain detected at {id}")]
    CircularBaseDefinition { id: String },

    #[error("StructureDefinition {id} has no snapshot")]
    MissingSnapshot { id: String },

    #[error("Element list is empty: {context}")]
    EmptyElementList { context: String },

    #[error("Element {path} is out of order: parent {expected_parent} has not appeared before it")]
    ElementOrder {
        path: String,
        expected_parent: String,
    },

    #[error("Malformed element at {path}: {message}")]
    MalformedElement { path: String, message: String },

    #[error("Ambiguous type at {path}: expected exactly one type, found {count}")]
    AmbiguousType { path: String, count: usize },

    #[error("Choice suffix '{suffix}' at {path} matches none of the declared types")]
    UnknownChoiceType { path: String, suffix: String },

    #[error("Type {type_code} referenced at {path} is not in the definition set")]
    TypeNotFound { path: String, type_code: String },

    #[error("contentReference {reference} at {path} is not intended for root type {root}")]
    InvalidContentReference {
        path: String,
        reference: String,
        root: String,
    },

    #[error("contentReference {reference} at {path} does not resolve to an element")]
    UnresolvedContentReference { path: String, reference: String },

    #[error("Element not found: {path}")]
    ElementNotFound { path: String },

    #[error("Failed to parse record at {source_name}:{line}: {source}")]
    RecordParse {
        source_name: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Concurrency error: {message}")]
    Concurrency { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchemaGenError>;

impl SchemaGenError {
    pub fn missing_base_definition<S: Into<String>>(id: S) -> Self {
        Self::MissingBaseDefinition { id: id.into() }
    }

    pub fn unresolved_base_url<S: Into<String>>(id: S, url: S) -> Self {
        Self::UnresolvedBaseUrl {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn base_definition_not_found<S: Into<String>>(id: S, base_id: S) -> Self {
        Self::BaseDefinitionNotFound {
            id: id.into(),
            base_id: base_id.into(),
        }
    }

    pub fn circular_base_definition<S: Into<String>>(id: S) -> Self {
        Self::CircularBaseDefinition { id: id.into() }
    }

    pub fn missing_snapshot<S: Into<String>>(id: S) -> Self {
        Self::MissingSnapshot { id: id.into() }
    }

    pub fn empty_element_list<S: Into<String>>(context: S) -> Self {
        Self::EmptyElementList {
            context: context.into(),
        }
    }

    pub fn element_order<S: Into<String>>(path: S, expected_parent: S) -> Self {
        Self::ElementOrder {
            path: path.into(),
            expected_parent: expected_parent.into(),
        }
    }

    pub fn malformed_element<S: Into<String>>(path: S, message: S) -> Self {
        Self::MalformedElement {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn ambiguous_type<S: Into<String>>(path: S, count: usize) -> Self {
        Self::AmbiguousType {
            path: path.into(),
            count,
        }
    }

    pub fn unknown_choice_type<S: Into<String>>(path: S, suffix: S) -> Self {
        Self::UnknownChoiceType {
            path: path.into(),
            suffix: suffix.into(),
        }
    }

    pub fn type_not_found<S: Into<String>>(path: S, type_code: S) -> Self {
        Self::TypeNotFound {
            path: path.into(),
            type_code: type_code.into(),
        }
    }

    pub fn invalid_content_reference<S: Into<String>>(path: S, reference: S, root: S) -> Self {
        Self::InvalidContentReference {
            path: path.into(),
            reference: reference.into(),
            root: root.into(),
        }
    }

    pub fn unresolved_content_reference<S: Into<String>>(path: S, reference: S) -> Self {
        Self::UnresolvedContentReference {
            path: path.into(),
            reference: reference.into(),
        }
    }

    pub fn element_not_found<S: Into<String>>(path: S) -> Self {
        Self::ElementNotFound { path: path.into() }
    }

    pub fn config_error<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn concurrency_error<S: Into<String>>(message: S) -> Self {
        Self::Concurrency {
            message: message.into(),
        }
    }

    /// Element path the error is attributed to, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ElementOrder { path, .. }
            | Self::MalformedElement { path, .. }
            | Self::AmbiguousType { path, .. }
            | Self::UnknownChoiceType { path, .. }
            | Self::TypeNotFound { path, .. }
            | Self::InvalidContentReference { path, .. }
            | Self::UnresolvedContentReference { path, .. }
            | Self::ElementNotFound { path } => Some(path),
            _ => None,
        }
    }

    /// Lookup failures mean the corpus is missing something another
    /// definition points at, as opposed to a definition being malformed.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedBaseUrl { .. }
                | Self::BaseDefinitionNotFound { .. }
                | Self::TypeNotFound { .. }
        )
    }
}
