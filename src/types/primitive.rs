/// FHIR primitive data types, including the FHIRPath system types that
/// appear on `id` and `value` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Code,
    Id,
    Markdown,
    Uri,
    Url,
    Canonical,
    Oid,
    Uuid,
    Decimal,
    Integer,
    Integer64,
    UnsignedInt,
    PositiveInt,
    Date,
    DateTime,
    Instant,
    Time,
    Boolean,
    Base64Binary,
    Xhtml,
}

/// Value-level shape of a primitive, independent of any output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveValue {
    Text,
    Uri,
    Uuid,
    Number,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Boolean,
}

const FHIRPATH_SYSTEM_PREFIX: &str = "http://hl7.org/fhirpath/System.";

impl PrimitiveType {
    pub fn from_code(code: &str) -> Option<Self> {
        let primitive = match code {
            "string" => Self::String,
            "code" => Self::Code,
            "id" => Self::Id,
            "markdown" => Self::Markdown,
            "uri" => Self::Uri,
            "url" => Self::Url,
            "canonical" => Self::Canonical,
            "oid" => Self::Oid,
            "uuid" => Self::Uuid,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "integer64" => Self::Integer64,
            "unsignedInt" => Self::UnsignedInt,
            "positiveInt" => Self::PositiveInt,
            "date" => Self::Date,
            "dateTime" => Self::DateTime,
            "instant" => Self::Instant,
            "time" => Self::Time,
            "boolean" => Self::Boolean,
            "base64Binary" => Self::Base64Binary,
            "xhtml" => Self::Xhtml,
            _ => return Self::from_system_code(code),
        };
        Some(primitive)
    }

    fn from_system_code(code: &str) -> Option<Self> {
        let system = code
            .strip_prefix(FHIRPATH_SYSTEM_PREFIX)
            .or_else(|| code.strip_prefix("System."))?;
        match system {
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "Integer" => Some(Self::Integer),
            "Long" => Some(Self::Integer64),
            "Decimal" => Some(Self::Decimal),
            "Date" => Some(Self::Date),
            "DateTime" => Some(Self::DateTime),
            "Time" => Some(Self::Time),
            _ => None,
        }
    }

    pub fn is_primitive_code(code: &str) -> bool {
        Self::from_code(code).is_some()
    }

    pub fn value_kind(self) -> PrimitiveValue {
        match self {
            Self::Uri | Self::Url | Self::Canonical => PrimitiveValue::Uri,
            Self::Uuid => PrimitiveValue::Uuid,
            Self::Decimal => PrimitiveValue::Number,
            Self::Integer | Self::Integer64 => PrimitiveValue::Integer,
            Self::UnsignedInt => PrimitiveValue::NonNegativeInteger,
            Self::PositiveInt => PrimitiveValue::PositiveInteger,
            Self::Boolean => PrimitiveValue::Boolean,
            Self::String
            | Self::Code
            | Self::Id
            | Self::Markdown
            | Self::Oid
            | Self::Date
            | Self::DateTime
            | Self::Instant
            | Self::Time
            | Self::Base64Binary
            | Self::Xhtml => PrimitiveValue::Text,
        }
    }
}
