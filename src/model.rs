use crate::i18n::{Lang, Msg};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_STATE_CLASS: &str = "com.rebuild.core.support.state.HowtoState";

/// Display type of a metadata field, sent upper-case on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    NText,
    Phone,
    Email,
    Url,
    Number,
    Decimal,
    Date,
    DateTime,
    Time,
    Picklist,
    MultiSelect,
    Tag,
    Classification,
    Reference,
    N2nReference,
    File,
    Image,
    Avatar,
    Barcode,
    Location,
    Sign,
    Bool,
    State,
    Series,
    // Named by a page URL but unknown to this build; passed through verbatim.
    Other(String),
}

impl FieldType {
    /// Types offered by the type selector, in display order.
    pub const SELECTABLE: [FieldType; 25] = [
        FieldType::Text,
        FieldType::NText,
        FieldType::Phone,
        FieldType::Email,
        FieldType::Url,
        FieldType::Number,
        FieldType::Decimal,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Time,
        FieldType::Picklist,
        FieldType::MultiSelect,
        FieldType::Tag,
        FieldType::Classification,
        FieldType::Reference,
        FieldType::N2nReference,
        FieldType::File,
        FieldType::Image,
        FieldType::Avatar,
        FieldType::Barcode,
        FieldType::Location,
        FieldType::Sign,
        FieldType::Bool,
        FieldType::State,
        FieldType::Series,
    ];

    pub fn parse(s: &str) -> FieldType {
        match s {
            "TEXT" => FieldType::Text,
            "NTEXT" => FieldType::NText,
            "PHONE" => FieldType::Phone,
            "EMAIL" => FieldType::Email,
            "URL" => FieldType::Url,
            "NUMBER" => FieldType::Number,
            "DECIMAL" => FieldType::Decimal,
            "DATE" => FieldType::Date,
            "DATETIME" => FieldType::DateTime,
            "TIME" => FieldType::Time,
            "PICKLIST" => FieldType::Picklist,
            "MULTISELECT" => FieldType::MultiSelect,
            "TAG" => FieldType::Tag,
            "CLASSIFICATION" => FieldType::Classification,
            "REFERENCE" => FieldType::Reference,
            "N2NREFERENCE" => FieldType::N2nReference,
            "FILE" => FieldType::File,
            "IMAGE" => FieldType::Image,
            "AVATAR" => FieldType::Avatar,
            "BARCODE" => FieldType::Barcode,
            "LOCATION" => FieldType::Location,
            "SIGN" => FieldType::Sign,
            "BOOL" => FieldType::Bool,
            "STATE" => FieldType::State,
            "SERIES" => FieldType::Series,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::NText => "NTEXT",
            FieldType::Phone => "PHONE",
            FieldType::Email => "EMAIL",
            FieldType::Url => "URL",
            FieldType::Number => "NUMBER",
            FieldType::Decimal => "DECIMAL",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATETIME",
            FieldType::Time => "TIME",
            FieldType::Picklist => "PICKLIST",
            FieldType::MultiSelect => "MULTISELECT",
            FieldType::Tag => "TAG",
            FieldType::Classification => "CLASSIFICATION",
            FieldType::Reference => "REFERENCE",
            FieldType::N2nReference => "N2NREFERENCE",
            FieldType::File => "FILE",
            FieldType::Image => "IMAGE",
            FieldType::Avatar => "AVATAR",
            FieldType::Barcode => "BARCODE",
            FieldType::Location => "LOCATION",
            FieldType::Sign => "SIGN",
            FieldType::Bool => "BOOL",
            FieldType::State => "STATE",
            FieldType::Series => "SERIES",
            FieldType::Other(s) => s.as_str(),
        }
    }

    pub fn label(&self, lang: Lang) -> String {
        let (zh, en) = match self {
            FieldType::Text => ("文本", "Text"),
            FieldType::NText => ("多行文本", "Multi-line text"),
            FieldType::Phone => ("电话", "Phone"),
            FieldType::Email => ("邮箱", "Email"),
            FieldType::Url => ("链接", "URL"),
            FieldType::Number => ("整数", "Integer"),
            FieldType::Decimal => ("小数", "Decimal"),
            FieldType::Date => ("日期", "Date"),
            FieldType::DateTime => ("日期时间", "Date time"),
            FieldType::Time => ("时间", "Time"),
            FieldType::Picklist => ("下拉列表", "Picklist"),
            FieldType::MultiSelect => ("多选", "Multi-select"),
            FieldType::Tag => ("标签", "Tag"),
            FieldType::Classification => ("分类", "Classification"),
            FieldType::Reference => ("引用", "Reference"),
            FieldType::N2nReference => ("多引用", "N2N reference"),
            FieldType::File => ("附件", "File"),
            FieldType::Image => ("图片", "Image"),
            FieldType::Avatar => ("头像", "Avatar"),
            FieldType::Barcode => ("二维码/条码", "Barcode"),
            FieldType::Location => ("位置", "Location"),
            FieldType::Sign => ("签名", "Signature"),
            FieldType::Bool => ("布尔", "Boolean"),
            FieldType::State => ("状态", "State"),
            FieldType::Series => ("自动编号", "Series"),
            FieldType::Other(s) => return s.clone(),
        };
        match lang {
            Lang::Zh => zh.to_string(),
            Lang::En => en.to_string(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Reference | FieldType::N2nReference)
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        FieldType::parse(&s)
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

/// Conditional form sections; each reveals only for the types it lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Reference,
    Classification,
    State,
}

impl Section {
    pub fn shows_for(self, t: &FieldType) -> bool {
        match self {
            Section::Reference => t.is_reference(),
            Section::Classification => *t == FieldType::Classification,
            Section::State => *t == FieldType::State,
        }
    }
}

/// Raw values read off the form at submit time.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub label: String,
    pub field_type: Option<FieldType>,
    pub comments: String,
    pub ref_entity: String,
    pub ref_classification: String,
    pub state_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    pub entity: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub comments: String,
    pub ref_entity: String,
    pub ref_classification: String,
    pub state_class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field label is empty")]
    MissingLabel,
    #[error("reference entity is not selected")]
    MissingRefEntity,
    #[error("classification is not selected")]
    MissingClassification,
    #[error("state class is empty")]
    MissingStateClass,
}

impl ValidationError {
    pub fn msg(self) -> Msg {
        match self {
            ValidationError::MissingLabel => Msg::EnterFieldName,
            ValidationError::MissingRefEntity => Msg::SelectRefEntity,
            ValidationError::MissingClassification => Msg::SelectClassification,
            ValidationError::MissingStateClass => Msg::SelectStateClass,
        }
    }

    /// Form field the error belongs to.
    pub fn field_name(self) -> &'static str {
        match self {
            ValidationError::MissingLabel => crate::widgets::form::F_LABEL,
            ValidationError::MissingRefEntity => crate::widgets::form::F_REF_ENTITY,
            ValidationError::MissingClassification => crate::widgets::form::F_REF_CLASSIFICATION,
            ValidationError::MissingStateClass => crate::widgets::form::F_STATE_CLASS,
        }
    }
}

impl FieldDraft {
    /// Validates in fixed order and stops at the first failure.
    pub fn compose(entity: &str, v: &FormValues) -> Result<FieldDraft, ValidationError> {
        let label = v.label.trim();
        let ref_entity = v.ref_entity.trim();
        let ref_classification = v.ref_classification.trim();
        let state_class = match v.state_class.trim() {
            "" => DEFAULT_STATE_CLASS,
            s => s,
        };
        let field_type = v.field_type.clone().unwrap_or(FieldType::Text);

        if label.is_empty() {
            return Err(ValidationError::MissingLabel);
        }
        if field_type.is_reference() && ref_entity.is_empty() {
            return Err(ValidationError::MissingRefEntity);
        } else if field_type == FieldType::Classification && ref_classification.is_empty() {
            return Err(ValidationError::MissingClassification);
        } else if field_type == FieldType::State && state_class.is_empty() {
            return Err(ValidationError::MissingStateClass);
        }

        Ok(FieldDraft {
            entity: entity.to_string(),
            label: label.to_string(),
            field_type,
            comments: v.comments.trim().to_string(),
            ref_entity: ref_entity.to_string(),
            ref_classification: ref_classification.to_string(),
            state_class: state_class.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// An option with an empty value, shown when a list has no usable data.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self::new(String::new(), label)
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub entity_name: String,
    #[serde(default)]
    pub entity_label: String,
    // Name of the owning main entity when this one is a detail entity.
    #[serde(default)]
    pub main_entity: Option<JsonValue>,
}

impl EntityDescriptor {
    pub fn is_detail(&self) -> bool {
        self.main_entity.as_ref().map(is_truthy).unwrap_or(false)
    }
}

/// Per-session option list: fetched on first demand, never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LazyOptions {
    #[default]
    Unloaded,
    Requested,
    Loaded(Vec<SelectOption>),
}

impl LazyOptions {
    /// Moves `Unloaded` to `Requested` and reports whether a fetch should start.
    pub fn begin(&mut self) -> bool {
        if matches!(self, LazyOptions::Unloaded) {
            *self = LazyOptions::Requested;
            true
        } else {
            false
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LazyOptions::Loaded(_))
    }
}

/// Script-style truthiness of a JSON value.
pub fn is_truthy(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
