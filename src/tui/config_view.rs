use crate::config::Config;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct ConfigField {
    pub label: &'static str,
    pub value: String,
    pub default: String,
    pub field_type: FieldType,
}

impl ConfigField {
    /// Differs from the built-in default.
    pub fn is_override(&self) -> bool {
        self.value != self.default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U32,
    U64,
    Url,
    Path,
}

impl FieldType {
    /// Field-level check applied when an edit is committed. Cross-field and
    /// semantic validation stays with the host.
    fn check(self, raw: &str) -> Result<(), String> {
        match self {
            FieldType::U32 => raw
                .parse::<u32>()
                .map(|_| ())
                .map_err(|_| "expected a whole number".to_string()),
            FieldType::U64 => raw
                .parse::<u64>()
                .map(|_| ())
                .map_err(|_| "expected a whole number of milliseconds".to_string()),
            FieldType::Url => {
                if raw.starts_with("http://") || raw.starts_with("https://") {
                    Ok(())
                } else {
                    Err("expected an http(s) URL".to_string())
                }
            }
            FieldType::Path => {
                if raw.is_empty() {
                    Err("path must not be empty".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

pub fn build_fields(seed: &Config) -> Vec<ConfigField> {
    let defaults = Config::default();
    let field = |label, value: String, default: String, field_type| ConfigField {
        label,
        value,
        default,
        field_type,
    };
    vec![
        field(
            "target_count",
            seed.target_count.to_string(),
            defaults.target_count.to_string(),
            FieldType::U32,
        ),
        field(
            "source_url",
            seed.source_url.clone(),
            defaults.source_url.clone(),
            FieldType::Url,
        ),
        field(
            "max_retries",
            seed.max_retries.to_string(),
            defaults.max_retries.to_string(),
            FieldType::U32,
        ),
        field(
            "retry_delay_ms",
            seed.retry_delay_ms.to_string(),
            defaults.retry_delay_ms.to_string(),
            FieldType::U64,
        ),
        field(
            "navigation_timeout_ms",
            seed.navigation_timeout_ms.to_string(),
            defaults.navigation_timeout_ms.to_string(),
            FieldType::U64,
        ),
        field(
            "report_path",
            seed.report_path.clone(),
            defaults.report_path.clone(),
            FieldType::Path,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    None,
    Submit(Value),
    Close,
}

#[derive(Debug, Clone)]
pub struct SettingsViewState {
    pub fields: Vec<ConfigField>,
    pub selected_field: usize,
    pub editing: bool,
    pub edit_buffer: String,
    /// Why the form was re-opened, from the host.
    pub notice: Option<String>,
    /// Last field-level edit error.
    pub error: Option<String>,
}

impl SettingsViewState {
    pub fn new(seed: &Config, notice: Option<String>) -> Self {
        Self {
            fields: build_fields(seed),
            selected_field: 0,
            editing: false,
            edit_buffer: String::new(),
            notice,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SettingsAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return SettingsAction::Close;
        }
        if self.editing {
            self.handle_edit_key(key.code);
            return SettingsAction::None;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_field + 1 < self.fields.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Enter => {
                self.edit_buffer = self.fields[self.selected_field].value.clone();
                self.editing = true;
                self.error = None;
            }
            KeyCode::Char('d') => {
                let field = &mut self.fields[self.selected_field];
                field.value = field.default.clone();
                self.error = None;
            }
            KeyCode::Char('s') => return SettingsAction::Submit(self.to_payload()),
            KeyCode::Esc | KeyCode::Char('q') => return SettingsAction::Close,
            _ => {}
        }
        SettingsAction::None
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                let raw = self.edit_buffer.trim().to_string();
                let field = &mut self.fields[self.selected_field];
                match field.field_type.check(&raw) {
                    Ok(()) => {
                        field.value = raw;
                        self.editing = false;
                        self.edit_buffer.clear();
                        self.error = None;
                    }
                    Err(reason) => self.error = Some(format!("{}: {}", field.label, reason)),
                }
            }
            KeyCode::Esc => {
                self.editing = false;
                self.edit_buffer.clear();
                self.error = None;
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => self.edit_buffer.push(c),
            _ => {}
        }
    }

    /// The settings record as the host decodes it. Numeric fields that fail
    /// to parse are sent as strings so the host rejects them.
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        for field in &self.fields {
            let value = match field.field_type {
                FieldType::U32 | FieldType::U64 => field
                    .value
                    .parse::<u64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::from(field.value.clone())),
                FieldType::Url | FieldType::Path => Value::from(field.value.clone()),
            };
            map.insert(field.label.to_string(), value);
        }
        Value::Object(map)
    }
}
