use serde::{Deserialize, Serialize};

/// `LlmConfig` の入出力スキーマを構成する 1 フィールド分の構造記述。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub description: String,
    pub kind: FieldKind,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldKind {
    Integer,
    Number,
    Boolean,
    String,
    Array(Box<FieldSchema>),
    Object(Vec<FieldSchema>),
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: FieldKind) -> FieldSchema {
        FieldSchema {
            name: name.into(),
            description: description.into(),
            kind,
            optional: false,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::String)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::Boolean)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::Number)
    }

    pub fn array(name: impl Into<String>, description: impl Into<String>, item: FieldSchema) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::Array(Box::new(item)))
    }

    pub fn object(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: impl IntoIterator<Item = FieldSchema>,
    ) -> FieldSchema {
        FieldSchema::new(name, description, FieldKind::Object(fields.into_iter().collect()))
    }

    pub fn as_nullable(mut self) -> FieldSchema {
        self.optional = true;
        self
    }
}
