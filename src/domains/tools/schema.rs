//! Schema validation for tool arguments.
//!
//! Every tool declares its input as a parameter struct deriving
//! [`schemars::JsonSchema`]. The generated JSON Schema is advertised to the
//! client unchanged and compiled here into a [`SchemaContract`]: an ordered
//! list of field rules that raw arguments are checked against before any
//! handler runs.
//!
//! Validation is two-staged:
//! 1. [`validate`] checks presence, JSON types and unknown fields, producing
//!    one violation per field in declaration order.
//! 2. [`ValidatedArguments::into_typed`] deserializes the checked object into
//!    the tool's parameter struct.
//!
//! Neither stage panics; both report a [`ValidationFailure`].

use std::fmt;

use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;
use serde_json::Value;

// ============================================================================
// Contract
// ============================================================================

/// JSON type expected for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer { unsigned: bool },
    Number,
    Boolean,
    Array,
    Object,
    /// No usable type information (e.g. `$ref` or mixed unions).
    Any,
}

impl FieldKind {
    fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer { unsigned: false } => "integer",
            Self::Integer { unsigned: true } => "non-negative integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer { unsigned: false }),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// Validation rule for one declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Whether an explicit `null` is a meaningful value for this field.
    pub nullable: bool,
    /// Allowed values when the schema declares an `enum`.
    pub allowed: Option<Vec<Value>>,
    /// Inclusive bounds for integer fields, from `format`, `minimum` and
    /// `maximum`.
    pub bounds: Option<IntegerBounds>,
}

/// Inclusive range an integer field must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    pub min: i128,
    pub max: i128,
}

impl IntegerBounds {
    /// Range of the Rust integer type named by a schemars `format`.
    fn of_format(format: &str) -> Option<Self> {
        let (min, max) = match format {
            "int8" => (i8::MIN as i128, i8::MAX as i128),
            "int16" => (i16::MIN as i128, i16::MAX as i128),
            "int32" => (i32::MIN as i128, i32::MAX as i128),
            "int64" => (i64::MIN as i128, i64::MAX as i128),
            "uint8" => (0, u8::MAX as i128),
            "uint16" => (0, u16::MAX as i128),
            "uint32" => (0, u32::MAX as i128),
            "uint64" => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(Self { min, max })
    }

    fn narrow(self, min: Option<i128>, max: Option<i128>) -> Self {
        Self {
            min: min.map_or(self.min, |m| m.max(self.min)),
            max: max.map_or(self.max, |m| m.min(self.max)),
        }
    }

    fn check(&self, value: i128) -> Result<(), String> {
        if value < self.min {
            Err(format!("must be at least {}, got {}", self.min, value))
        } else if value > self.max {
            Err(format!("must be at most {}, got {}", self.max, value))
        } else {
            Ok(())
        }
    }
}

/// Checkable contract compiled from a tool's JSON Schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaContract {
    fields: Vec<FieldSpec>,
    /// Reject fields not declared in `properties`.
    closed: bool,
}

impl SchemaContract {
    /// Compile a JSON Schema object into a contract.
    ///
    /// Field order follows the order of `properties`, which matches the
    /// declaration order of the parameter struct.
    pub fn compile(schema: &JsonObject) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| compile_field(name, property, &required))
                    .collect()
            })
            .unwrap_or_default();

        let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));

        Self { fields, closed }
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Whether undeclared fields are rejected.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn compile_field(name: &str, property: &Value, required: &[&str]) -> FieldSpec {
    let mut nullable = property
        .get("nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let mut kinds = Vec::new();

    collect_types(property, &mut kinds, &mut nullable);
    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = property.get(key).and_then(Value::as_array) {
            for variant in variants {
                collect_types(variant, &mut kinds, &mut nullable);
            }
        }
    }

    kinds.dedup();
    let kind = match kinds.as_slice() {
        [single] => single.clone(),
        _ => FieldKind::Any,
    };

    let kind = match kind {
        FieldKind::Integer { .. } => FieldKind::Integer {
            unsigned: property
                .get("minimum")
                .and_then(Value::as_f64)
                .is_some_and(|min| min >= 0.0),
        },
        other => other,
    };

    let allowed = property
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter(|v| !v.is_null()).cloned().collect());

    let bounds = match kind {
        FieldKind::Integer { .. } => integer_bounds(property),
        _ => None,
    };

    FieldSpec {
        name: name.to_string(),
        kind,
        required: required.contains(&name),
        nullable,
        allowed,
        bounds,
    }
}

fn integer_bounds(property: &Value) -> Option<IntegerBounds> {
    let min = property.get("minimum").and_then(as_i128);
    let max = property.get("maximum").and_then(as_i128);

    let base = property
        .get("format")
        .and_then(Value::as_str)
        .and_then(IntegerBounds::of_format);

    match (base, min, max) {
        (Some(base), _, _) => Some(base.narrow(min, max)),
        (None, None, None) => None,
        (None, _, _) => Some(IntegerBounds {
            min: min.unwrap_or(i128::MIN),
            max: max.unwrap_or(i128::MAX),
        }),
    }
}

fn as_i128(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

fn collect_types(schema: &Value, kinds: &mut Vec<FieldKind>, nullable: &mut bool) {
    if schema.get("$ref").is_some() {
        kinds.push(FieldKind::Any);
        return;
    }

    let names: Vec<&str> = match schema.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    for name in names {
        if name == "null" {
            *nullable = true;
        } else if let Some(kind) = FieldKind::from_type_name(name) {
            kinds.push(kind);
        }
    }
}

// ============================================================================
// Validation results
// ============================================================================

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Aggregate validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Failure with one violation.
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Number of violated fields.
    pub fn count(&self) -> usize {
        self.violations.len()
    }

    /// Violations joined as `"<field>: <reason>, ..."`.
    pub fn message(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input ({} errors) - {}", self.count(), self.message())
    }
}

impl std::error::Error for ValidationFailure {}

/// Arguments that satisfied a [`SchemaContract`].
///
/// Explicit `null`s on optional, non-nullable fields are dropped so that
/// serde defaults apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArguments(JsonObject);

impl ValidatedArguments {
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Deserialize into the tool's parameter type.
    pub fn into_typed<P: DeserializeOwned>(self) -> Result<P, ValidationFailure> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ValidationFailure::single("arguments", e.to_string()))
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate raw arguments against a contract.
pub fn validate(
    contract: &SchemaContract,
    raw: &JsonObject,
) -> Result<ValidatedArguments, ValidationFailure> {
    let mut violations = Vec::new();
    let mut checked = JsonObject::new();

    for field in contract.fields() {
        match raw.get(&field.name) {
            None | Some(Value::Null) if field.required && !field.nullable => {
                violations.push(violation(&field.name, "field required"));
            }
            None => {}
            Some(Value::Null) => {
                if field.nullable {
                    checked.insert(field.name.clone(), Value::Null);
                }
            }
            Some(value) => match check_value(field, value) {
                Ok(()) => {
                    checked.insert(field.name.clone(), value.clone());
                }
                Err(reason) => violations.push(violation(&field.name, reason)),
            },
        }
    }

    for (name, value) in raw {
        if contract.field(name).is_some() {
            continue;
        }
        if contract.is_closed() {
            violations.push(violation(name, "unrecognized field"));
        } else {
            checked.insert(name.clone(), value.clone());
        }
    }

    if violations.is_empty() {
        Ok(ValidatedArguments(checked))
    } else {
        Err(ValidationFailure { violations })
    }
}

fn violation(field: &str, reason: impl Into<String>) -> Violation {
    Violation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_value(field: &FieldSpec, value: &Value) -> Result<(), String> {
    let conforms = match &field.kind {
        FieldKind::String => value.is_string(),
        FieldKind::Integer { unsigned } => match value {
            Value::Number(n) if n.is_u64() => true,
            Value::Number(n) if n.is_i64() => !unsigned,
            _ => false,
        },
        FieldKind::Number => value.is_number(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Array => value.is_array(),
        FieldKind::Object => value.is_object(),
        FieldKind::Any => true,
    };

    if !conforms {
        return Err(format!(
            "expected {}, got {}",
            field.kind.label(),
            json_type_name(value)
        ));
    }

    if let (Some(bounds), Some(number)) = (&field.bounds, as_i128(value)) {
        bounds.check(number)?;
    }

    if let Some(allowed) = &field.allowed {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(format!("expected one of {}", options.join(", ")));
        }
    }

    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(n) if n.as_i64().is_some_and(|i| i < 0) => "negative integer",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::handler::server::tool::schema_for_type;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct LookupParams {
        user_id: String,
        #[serde(default)]
        include_details: bool,
        #[serde(default = "default_page")]
        page: u32,
        tag: Option<String>,
    }

    fn default_page() -> u32 {
        1
    }

    fn contract() -> SchemaContract {
        SchemaContract::compile(&schema_for_type::<LookupParams>())
    }

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_compile_keeps_declaration_order() {
        let names: Vec<_> = contract().fields().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["user_id", "include_details", "page", "tag"]);
    }

    #[test]
    fn test_compile_kinds_and_required() {
        let contract = contract();
        let fields = contract.fields();
        assert_eq!(fields[0].kind, FieldKind::String);
        assert!(fields[0].required);
        assert_eq!(fields[1].kind, FieldKind::Boolean);
        assert!(!fields[1].required);
        assert_eq!(fields[2].kind, FieldKind::Integer { unsigned: true });
        assert_eq!(fields[3].kind, FieldKind::String);
        assert!(fields[3].nullable);
        assert!(contract.is_closed());
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(&contract(), &object(json!({}))).unwrap_err();
        assert_eq!(err.count(), 1);
        assert_eq!(err.message(), "user_id: field required");
    }

    #[test]
    fn test_violations_in_declaration_order() {
        let args = object(json!({
            "extra": 1,
            "page": "two",
            "include_details": "yes",
        }));
        let err = validate(&contract(), &args).unwrap_err();
        assert_eq!(err.count(), 4);
        assert_eq!(
            err.message(),
            "user_id: field required, include_details: expected boolean, got string, \
             page: expected non-negative integer, got string, extra: unrecognized field"
        );
        assert!(err.to_string().starts_with("invalid input (4 errors) - "));
    }

    #[test]
    fn test_negative_integer_rejected_for_unsigned() {
        let args = object(json!({"user_id": "1", "page": -3}));
        let err = validate(&contract(), &args).unwrap_err();
        assert_eq!(
            err.message(),
            "page: expected non-negative integer, got negative integer"
        );
    }

    #[test]
    fn test_integer_out_of_range_names_the_field() {
        let contract = contract();
        assert_eq!(
            contract.fields()[2].bounds,
            Some(IntegerBounds {
                min: 0,
                max: u32::MAX as i128
            })
        );

        let args = object(json!({"user_id": "1", "page": 5_000_000_000u64}));
        let err = validate(&contract, &args).unwrap_err();
        assert_eq!(err.count(), 1);
        assert_eq!(err.message(), "page: must be at most 4294967295, got 5000000000");
    }

    #[test]
    fn test_explicit_maximum_narrows_bounds() {
        let schema = object(json!({
            "type": "object",
            "properties": {"n": {"type": "integer", "format": "int32", "maximum": 100}}
        }));
        let contract = SchemaContract::compile(&schema);
        let err = validate(&contract, &object(json!({"n": 101}))).unwrap_err();
        assert_eq!(err.message(), "n: must be at most 100, got 101");
        assert!(validate(&contract, &object(json!({"n": -5}))).is_ok());
    }

    #[test]
    fn test_valid_arguments_round_trip_to_typed() {
        let args = object(json!({"user_id": "42", "include_details": true, "page": 3}));
        let validated = validate(&contract(), &args).unwrap();
        assert_eq!(validated.as_object(), &args);

        let typed: LookupParams = validated.into_typed().unwrap();
        assert_eq!(
            typed,
            LookupParams {
                user_id: "42".to_string(),
                include_details: true,
                page: 3,
                tag: None,
            }
        );
    }

    #[test]
    fn test_null_on_optional_field_uses_default() {
        let args = object(json!({"user_id": "42", "page": null, "tag": null}));
        let typed: LookupParams = validate(&contract(), &args).unwrap().into_typed().unwrap();
        assert_eq!(typed.page, 1);
        assert_eq!(typed.tag, None);
    }

    #[test]
    fn test_null_on_required_field_is_missing() {
        let args = object(json!({"user_id": null}));
        let err = validate(&contract(), &args).unwrap_err();
        assert_eq!(err.message(), "user_id: field required");
    }

    #[test]
    fn test_open_schema_passes_unknown_fields() {
        let schema = object(json!({
            "type": "object",
            "properties": {"q": {"type": "string"}},
            "required": ["q"]
        }));
        let contract = SchemaContract::compile(&schema);
        assert!(!contract.is_closed());

        let validated = validate(&contract, &object(json!({"q": "x", "other": 1}))).unwrap();
        assert_eq!(validated.as_object().len(), 2);
    }

    #[test]
    fn test_enum_membership() {
        let schema = object(json!({
            "type": "object",
            "properties": {"order": {"type": "string", "enum": ["asc", "desc"]}}
        }));
        let contract = SchemaContract::compile(&schema);
        let err = validate(&contract, &object(json!({"order": "up"}))).unwrap_err();
        assert_eq!(err.message(), "order: expected one of \"asc\", \"desc\"");
        assert!(validate(&contract, &object(json!({"order": "asc"}))).is_ok());
    }

    #[test]
    fn test_into_typed_reports_residual_errors() {
        let schema = object(json!({"type": "object", "properties": {"n": {"type": "integer"}}}));
        let contract = SchemaContract::compile(&schema);

        #[derive(Debug, Deserialize)]
        struct Small {
            #[allow(dead_code)]
            n: u8,
        }

        let validated = validate(&contract, &object(json!({"n": 1000}))).unwrap();
        let err = validated.into_typed::<Small>().unwrap_err();
        assert_eq!(err.count(), 1);
        assert!(err.message().starts_with("arguments: "));
    }
}
