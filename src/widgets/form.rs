use crate::i18n::{Lang, Msg};
use crate::model::{FieldType, FormValues, Section, SelectOption};
use crate::widgets::chrome::panel_block;
use ratatui::prelude::*;
use ratatui::widgets::*;

pub const F_LABEL: &str = "fieldLabel";
pub const F_TYPE: &str = "type";
pub const F_COMMENTS: &str = "comments";
pub const F_REF_ENTITY: &str = "refEntity";
pub const F_REF_CLASSIFICATION: &str = "refClassification";
pub const F_STATE_CLASS: &str = "stateClass";
pub const F_SAVE_AND_NEW: &str = "saveAndNew";

pub const OPTIONS_VISIBLE: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Text,
    TextArea {
        max_lines: usize,
    },
    Checkbox,
    Select {
        options: Vec<SelectOption>,
        cursor: usize,
        selected: usize,
        offset: usize,
    },
}

#[derive(Clone, Debug)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub error: Option<String>,
    pub hint: Option<String>,
    // Only shown while the selected type belongs to this section
    pub section: Option<Section>,
    pub hidden: bool,
}

impl FormField {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        let value = match kind {
            FieldKind::Checkbox => FieldValue::Bool(false),
            _ => FieldValue::Text(String::new()),
        };
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: false,
            kind,
            value,
            error: None,
            hint: None,
            section: None,
            hidden: false,
        }
    }

    fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                options,
                cursor: 0,
                selected: 0,
                offset: 0,
            },
        )
    }

    fn in_section(mut self, s: Section) -> Self {
        self.section = Some(s);
        self.hidden = true;
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormState {
    pub title: String,
    pub fields: Vec<FormField>,
    // Index into `fields`; `fields.len()` is the save button
    pub selected: usize,
    pub editing: bool,
    // Submission in flight; the save button is disabled
    pub loading: bool,
    pub lang: Lang,
}

/// The field-creation form with every section hidden and TEXT selected.
pub fn build_field_form(lang: Lang) -> FormState {
    let type_options = FieldType::SELECTABLE
        .iter()
        .map(|t| SelectOption::new(t.as_str(), t.label(lang)))
        .collect();
    let mut state_class = FormField::new(F_STATE_CLASS, lang.text(Msg::StateClass), FieldKind::Text)
        .in_section(Section::State)
        .required();
    state_class.hint = Some(lang.text(Msg::StateClassHint).to_string());
    FormState {
        title: lang.text(Msg::FormTitle).to_string(),
        fields: vec![
            FormField::new(F_LABEL, lang.text(Msg::FieldLabel), FieldKind::Text).required(),
            FormField::select(F_TYPE, lang.text(Msg::FieldType), type_options).required(),
            FormField::select(F_REF_ENTITY, lang.text(Msg::RefEntity), Vec::new())
                .in_section(Section::Reference)
                .required(),
            FormField::select(
                F_REF_CLASSIFICATION,
                lang.text(Msg::RefClassification),
                Vec::new(),
            )
            .in_section(Section::Classification)
            .required(),
            state_class,
            FormField::new(
                F_COMMENTS,
                lang.text(Msg::Comments),
                FieldKind::TextArea { max_lines: 3 },
            ),
            FormField::new(F_SAVE_AND_NEW, lang.text(Msg::SaveAndNew), FieldKind::Checkbox),
        ],
        selected: 0,
        editing: false,
        loading: false,
        lang,
    }
}

impl FormState {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn save_idx(&self) -> usize {
        self.fields.len()
    }

    pub fn text(&self, name: &str) -> String {
        match self.field(name) {
            Some(FormField {
                kind: FieldKind::Select {
                    options, selected, ..
                },
                ..
            }) => options
                .get(*selected)
                .map(|o| o.value.clone())
                .unwrap_or_default(),
            Some(FormField {
                value: FieldValue::Text(s),
                ..
            }) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn set_text(&mut self, name: &str, text: &str) {
        if let Some(f) = self.field_mut(name) {
            if let FieldValue::Text(s) = &mut f.value {
                *s = text.to_string();
            }
        }
    }

    pub fn checked(&self, name: &str) -> bool {
        matches!(
            self.field(name).map(|f| &f.value),
            Some(FieldValue::Bool(true))
        )
    }

    pub fn set_checked(&mut self, name: &str, on: bool) {
        if let Some(f) = self.field_mut(name) {
            f.value = FieldValue::Bool(on);
        }
    }

    pub fn set_hidden(&mut self, name: &str, hidden: bool) {
        if let Some(f) = self.field_mut(name) {
            f.hidden = hidden;
        }
    }

    /// Replaces a select's options and selects the first one.
    pub fn set_options(&mut self, name: &str, opts: Vec<SelectOption>) {
        if let Some(f) = self.field_mut(name) {
            if let FieldKind::Select {
                options,
                cursor,
                selected,
                offset,
            } = &mut f.kind
            {
                *options = opts;
                *cursor = 0;
                *selected = 0;
                *offset = 0;
            }
        }
    }

    pub fn options(&self, name: &str) -> &[SelectOption] {
        match self.field(name).map(|f| &f.kind) {
            Some(FieldKind::Select { options, .. }) => options,
            _ => &[],
        }
    }

    pub fn selected_type(&self) -> Option<FieldType> {
        let v = self.text(F_TYPE);
        if v.is_empty() {
            None
        } else {
            Some(FieldType::parse(&v))
        }
    }

    /// Points the type select at `t`, adding an option for unknown types.
    pub fn select_type(&mut self, t: &FieldType) {
        let lang = self.lang;
        if let Some(f) = self.field_mut(F_TYPE) {
            if let FieldKind::Select {
                options,
                cursor,
                selected,
                ..
            } = &mut f.kind
            {
                let idx = match options.iter().position(|o| o.value == t.as_str()) {
                    Some(i) => i,
                    None => {
                        options.push(SelectOption::new(t.as_str(), t.label(lang)));
                        options.len() - 1
                    }
                };
                *selected = idx;
                *cursor = idx;
            }
        }
    }

    /// Hides every conditional section, then reveals those tagged for `t`.
    pub fn show_sections_for(&mut self, t: &FieldType) {
        for f in &mut self.fields {
            if let Some(s) = f.section {
                f.hidden = !s.shows_for(t);
            }
        }
    }

    pub fn focus(&mut self, name: &str) {
        if let Some(i) = self.fields.iter().position(|f| f.name == name) {
            self.selected = i;
            self.editing = false;
        }
    }

    pub fn clear_errors(&mut self) {
        for f in &mut self.fields {
            f.error = None;
        }
    }

    pub fn set_error(&mut self, name: &str, msg: &str) {
        if let Some(f) = self.field_mut(name) {
            f.error = Some(msg.to_string());
        }
    }

    /// Visible field indices followed by the save button.
    pub fn navigable(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.hidden)
            .map(|(i, _)| i)
            .collect();
        idx.push(self.save_idx());
        idx
    }

    pub fn move_selection(&mut self, delta: i32) {
        let nav = self.navigable();
        let pos = nav.iter().position(|i| *i == self.selected).unwrap_or(0) as i32;
        let next = (pos + delta).clamp(0, nav.len() as i32 - 1) as usize;
        self.selected = nav[next];
    }

    pub fn values(&self) -> FormValues {
        FormValues {
            label: self.text(F_LABEL),
            field_type: self.selected_type(),
            comments: self.text(F_COMMENTS),
            ref_entity: self.text(F_REF_ENTITY),
            ref_classification: self.text(F_REF_CLASSIFICATION),
            state_class: self.text(F_STATE_CLASS),
        }
    }
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &FormState, highlight: bool, cursor_on: bool) {
    let lang = form.lang;
    let mut lines: Vec<Line> = Vec::new();
    for (i, fld) in form.fields.iter().enumerate() {
        if fld.hidden {
            continue;
        }
        let sel = if i == form.selected { '›' } else { ' ' };
        let req = if fld.required { " *" } else { "" };
        let value_style = if i == form.selected {
            if form.editing {
                crate::theme::text_editing_bold()
            } else {
                crate::theme::text_active_bold()
            }
        } else {
            Style::default()
        };
        match &fld.kind {
            FieldKind::Text => {
                let mut val = match &fld.value {
                    FieldValue::Text(s) => s.clone(),
                    FieldValue::Bool(_) => String::new(),
                };
                if form.editing && i == form.selected && cursor_on {
                    val.push('▏');
                }
                let mut spans = vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val, value_style),
                ];
                if let (Some(h), FieldValue::Text(s)) = (&fld.hint, &fld.value) {
                    if s.is_empty() {
                        spans.push(Span::styled(format!("  ({h})"), crate::theme::text_muted()));
                    }
                }
                lines.push(Line::from(spans));
            }
            FieldKind::TextArea { max_lines } => {
                lines.push(Line::from(Span::raw(format!("{sel} {}{req}:", fld.label))));
                let text = match &fld.value {
                    FieldValue::Text(s) => s.clone(),
                    FieldValue::Bool(_) => String::new(),
                };
                let body: Vec<&str> = if text.is_empty() {
                    vec![""]
                } else {
                    text.lines().collect()
                };
                for bl in body.iter().take(*max_lines) {
                    lines.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(bl.to_string(), value_style),
                    ]));
                }
                if body.len() > *max_lines {
                    let more = body.len() - max_lines;
                    lines.push(Line::from(Span::styled(
                        format!("    … ({more} more)"),
                        crate::theme::text_muted(),
                    )));
                }
            }
            FieldKind::Checkbox => {
                let val = if matches!(fld.value, FieldValue::Bool(true)) {
                    "[x]"
                } else {
                    "[ ]"
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val, value_style),
                ]));
            }
            FieldKind::Select {
                options,
                cursor,
                selected,
                offset,
            } => {
                let summary = if options.is_empty() {
                    format!("{} …", lang.text(Msg::Loading))
                } else {
                    options
                        .get(*selected)
                        .map(|o| o.label.clone())
                        .unwrap_or_default()
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(summary, value_style),
                ]));
                if form.editing && i == form.selected {
                    let start = (*offset).min(options.len());
                    let end = (start + OPTIONS_VISIBLE).min(options.len());
                    for (oi, opt) in options.iter().enumerate().take(end).skip(start) {
                        let mark = if oi == *selected { "(•)" } else { "( )" };
                        let cur = if oi == *cursor { '›' } else { ' ' };
                        let st = if oi == *cursor {
                            crate::theme::list_cursor_style()
                        } else if opt.is_placeholder() {
                            crate::theme::text_muted()
                        } else {
                            Style::default()
                        };
                        lines.push(Line::from(Span::styled(
                            format!("    {cur} {mark} {}", opt.label),
                            st,
                        )));
                    }
                }
            }
        }
        if let Some(err) = &fld.error {
            lines.push(Line::from(Span::styled(
                format!("    ! {err}"),
                crate::theme::text_error(),
            )));
        }
    }
    lines.push(Line::from(""));
    let save_label = if form.loading {
        format!("[ {} … ]", lang.text(Msg::Submitting))
    } else {
        format!("[ {} ]", lang.text(Msg::Save))
    };
    let save_style = match (form.selected == form.save_idx(), form.loading) {
        (_, true) => crate::theme::text_muted(),
        (true, false) => crate::theme::list_cursor_style(),
        (false, false) => crate::theme::text_active_bold(),
    };
    lines.push(Line::from(Span::styled(format!("  {save_label}"), save_style)));
    let title = if form.editing {
        format!("{} · editing", form.title)
    } else {
        form.title.clone()
    };
    let block = panel_block(&title, highlight);
    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
