//! Declarative description of an entity: the fields its form edits, the
//! columns its table shows and the list view it is browsed through.

use ede_api::Resource;
use ede_config::upload::UploadConfig;
use ede_types::Attachment;
use serde_json::{Value, json};

use crate::confirm::ActionKind;
use crate::display::Column;
use crate::form::FormError;
use crate::query::ListSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Integer,
    Bool,
    /// One of a fixed set of values
    Choice(Vec<String>),
    /// Comma separated input stored as a string array
    Tags,
}

impl FieldKind {
    pub fn empty_value(&self) -> Value {
        match self {
            Self::Text | Self::LongText | Self::Choice(_) => json!(""),
            Self::Integer => json!(0),
            Self::Bool => json!(false),
            Self::Tags => json!([]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Filter whose current value seeds this field on create
    pub inherit_filter: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            default: None,
            inherit_filter: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn inherits(mut self, filter: impl Into<String>) -> Self {
        self.inherit_filter = Some(filter.into());
        self
    }

    /// Declared default, else the kind's empty value
    pub fn initial_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.empty_value())
    }

    pub fn is_missing(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Convert operator input into this field's JSON value
    pub fn parse_input(&self, input: &str) -> Result<Value, FormError> {
        let trimmed = input.trim();
        let invalid = |reason: String| FormError::InvalidField {
            name: self.name.clone(),
            reason,
        };

        match &self.kind {
            FieldKind::Text | FieldKind::LongText => Ok(json!(input)),
            FieldKind::Integer if trimmed.is_empty() => Ok(self.initial_value()),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(|n| json!(n))
                .map_err(|_| invalid(format!("{trimmed} is not a whole number"))),
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(json!(true)),
                "false" | "no" | "0" | "off" | "" => Ok(json!(false)),
                other => Err(invalid(format!("{other} is not a yes/no value"))),
            },
            FieldKind::Choice(options) => {
                if trimmed.is_empty() || options.iter().any(|o| o == trimmed) {
                    Ok(json!(trimmed))
                } else {
                    Err(invalid(format!("expected one of {}", options.join(", "))))
                }
            }
            FieldKind::Tags => Ok(json!(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            )),
        }
    }
}

/// Client-side checks on a staged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRule {
    pub mime_prefix: String,
    pub max_bytes: usize,
}

impl AttachmentRule {
    pub fn audio(config: &UploadConfig) -> Self {
        Self {
            mime_prefix: config.audio_mime_prefix.clone(),
            max_bytes: config.max_audio_bytes,
        }
    }

    pub fn validate(&self, attachment: &Attachment) -> Result<(), FormError> {
        if !attachment.mime_type.starts_with(&self.mime_prefix) {
            return Err(FormError::AttachmentType {
                expected: self.mime_prefix.clone(),
                actual: attachment.mime_type.clone(),
            });
        }
        if attachment.size() > self.max_bytes {
            return Err(FormError::AttachmentTooLarge {
                size: attachment.size(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EntitySchema {
    /// Plural, as used in paths and prompts
    pub name: String,
    /// Singular
    pub label: String,
    pub resource: Resource,
    pub fields: Vec<FieldDescriptor>,
    pub columns: Vec<Column>,
    pub list: ListSchema,
    pub attachment: Option<AttachmentRule>,
    pub pollable: bool,
    pub actions: Vec<ActionKind>,
}

impl EntitySchema {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        resource: Resource,
        list: ListSchema,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            resource,
            fields: Vec::new(),
            columns: Vec::new(),
            list,
            attachment: None,
            pollable: false,
            actions: vec![ActionKind::Delete, ActionKind::BulkDelete],
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_attachment(mut self, rule: AttachmentRule) -> Self {
        self.attachment = Some(rule);
        self
    }

    pub fn with_actions(mut self, actions: &[ActionKind]) -> Self {
        self.actions = actions.to_vec();
        self
    }

    pub fn pollable(mut self) -> Self {
        self.pollable = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn supports(&self, action: ActionKind) -> bool {
        self.actions.contains(&action)
    }
}
