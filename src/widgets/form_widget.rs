use crate::app::AppMsg;
use crate::widgets::form::{
    draw_form, FieldKind, FieldValue, FormState, F_COMMENTS, F_TYPE, OPTIONS_VISIBLE,
};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::crossterm::event as rt_event;
use ratatui::prelude::*;
use tui_textarea::TextArea;

pub struct FormWidget {
    pub form: FormState,
    comments_ta: TextArea<'static>,
}

impl FormWidget {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            comments_ta: TextArea::default(),
        }
    }

    fn current_kind(&self) -> Option<&FieldKind> {
        self.form.fields.get(self.form.selected).map(|f| &f.kind)
    }

    fn editing_textarea(&self) -> bool {
        self.form.editing && matches!(self.current_kind(), Some(FieldKind::TextArea { .. }))
    }

    fn begin_textarea(&mut self) {
        let text = self.form.text(F_COMMENTS);
        let mut ta = TextArea::default();
        if !text.is_empty() {
            ta.insert_str(&text);
        }
        ta.set_block(
            ratatui::widgets::Block::default()
                .borders(ratatui::widgets::Borders::ALL)
                .title("Editing · Ctrl+S Save • Esc Cancel"),
        );
        self.comments_ta = ta;
        self.form.editing = true;
    }

    pub fn commit_textarea(&mut self) -> bool {
        if !self.editing_textarea() {
            return false;
        }
        let text = self.comments_ta.lines().join("\n");
        self.form.set_text(F_COMMENTS, &text);
        self.form.editing = false;
        true
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let textarea = self.editing_textarea();
        let cursor_on = !textarea && tick % 2 == 0;
        draw_form(f, area, &self.form, focused, cursor_on);
        if textarea {
            let rect = centered_rect(80, 60, area);
            f.render_widget(ratatui::widgets::Clear, rect);
            f.render_widget(&self.comments_ta, rect);
        }
    }

    /// Applies a key press. Returns a message when the key triggers an
    /// operation on the controller.
    pub fn on_key(&mut self, code: KeyCode, mods: KeyModifiers) -> Option<AppMsg> {
        if self.editing_textarea() {
            match code {
                KeyCode::Char('s') if mods.contains(KeyModifiers::CONTROL) => {
                    self.commit_textarea();
                }
                KeyCode::Esc => self.form.editing = false,
                other => {
                    if let Some(rc) = to_rt_code(other) {
                        let _ = self
                            .comments_ta
                            .input(rt_event::KeyEvent::new(rc, rt_event::KeyModifiers::NONE));
                    }
                }
            }
            return None;
        }
        if code == KeyCode::Char('s') && mods.contains(KeyModifiers::CONTROL) {
            self.form.editing = false;
            return Some(AppMsg::Submit);
        }
        if self.form.editing {
            return self.on_edit_key(code);
        }
        match code {
            KeyCode::Up | KeyCode::BackTab => self.form.move_selection(-1),
            KeyCode::Down | KeyCode::Tab => self.form.move_selection(1),
            KeyCode::Left | KeyCode::Right => {
                // quick change for selects while browsing
                let step: i32 = if code == KeyCode::Left { -1 } else { 1 };
                return self.step_select(step);
            }
            KeyCode::Enter | KeyCode::Char(' ') => return self.activate(code),
            _ => {}
        }
        None
    }

    fn activate(&mut self, code: KeyCode) -> Option<AppMsg> {
        if self.form.selected == self.form.save_idx() {
            return (code == KeyCode::Enter).then_some(AppMsg::Submit);
        }
        let sel = self.form.selected;
        let kind = self.form.fields.get(sel).map(|f| f.kind.clone())?;
        match kind {
            FieldKind::Checkbox => {
                if let Some(fld) = self.form.fields.get_mut(sel) {
                    let on = matches!(fld.value, FieldValue::Bool(true));
                    fld.value = FieldValue::Bool(!on);
                }
            }
            FieldKind::TextArea { .. } if code == KeyCode::Enter => self.begin_textarea(),
            FieldKind::Text if code == KeyCode::Enter => self.form.editing = true,
            FieldKind::Select { .. } if code == KeyCode::Enter => {
                if let Some(fld) = self.form.fields.get_mut(sel) {
                    if let FieldKind::Select {
                        cursor, selected, ..
                    } = &mut fld.kind
                    {
                        *cursor = *selected;
                    }
                }
                self.form.editing = true;
            }
            _ => {}
        }
        None
    }

    fn on_edit_key(&mut self, code: KeyCode) -> Option<AppMsg> {
        let sel = self.form.selected;
        let fld = self.form.fields.get_mut(sel)?;
        let mut committed_select = false;
        match (&mut fld.kind, &mut fld.value, code) {
            (FieldKind::Text, _, KeyCode::Enter | KeyCode::Esc) => self.form.editing = false,
            (FieldKind::Text, FieldValue::Text(s), KeyCode::Char(c)) => {
                s.push(c);
                fld.error = None;
            }
            (FieldKind::Text, FieldValue::Text(s), KeyCode::Backspace) => {
                s.pop();
            }
            (FieldKind::Select { cursor, offset, .. }, _, KeyCode::Up) => {
                *cursor = cursor.saturating_sub(1);
                if *cursor < *offset {
                    *offset = *cursor;
                }
            }
            (
                FieldKind::Select {
                    cursor,
                    offset,
                    options,
                    ..
                },
                _,
                KeyCode::Down,
            ) => {
                if *cursor + 1 < options.len() {
                    *cursor += 1;
                }
                if *cursor >= *offset + OPTIONS_VISIBLE {
                    *offset = *cursor + 1 - OPTIONS_VISIBLE;
                }
            }
            (
                FieldKind::Select {
                    cursor, selected, ..
                },
                _,
                KeyCode::Enter,
            ) => {
                committed_select = *selected != *cursor;
                *selected = *cursor;
                fld.error = None;
                self.form.editing = false;
            }
            (FieldKind::Select { .. }, _, KeyCode::Esc) => self.form.editing = false,
            _ => {}
        }
        if committed_select {
            return self.type_change_msg(sel);
        }
        None
    }

    fn step_select(&mut self, step: i32) -> Option<AppMsg> {
        let sel = self.form.selected;
        let fld = self.form.fields.get_mut(sel)?;
        if let FieldKind::Select {
            options,
            selected,
            cursor,
            ..
        } = &mut fld.kind
        {
            if options.is_empty() {
                return None;
            }
            let n = options.len() as i32;
            *selected = ((*selected as i32 + step).rem_euclid(n)) as usize;
            *cursor = *selected;
            fld.error = None;
            return self.type_change_msg(sel);
        }
        None
    }

    fn type_change_msg(&self, idx: usize) -> Option<AppMsg> {
        let fld = self.form.fields.get(idx)?;
        if fld.name != F_TYPE {
            return None;
        }
        self.form.selected_type().map(AppMsg::TypeChanged)
    }
}

fn to_rt_code(code: KeyCode) -> Option<rt_event::KeyCode> {
    Some(match code {
        KeyCode::Char(c) => rt_event::KeyCode::Char(c),
        KeyCode::Enter => rt_event::KeyCode::Enter,
        KeyCode::Backspace => rt_event::KeyCode::Backspace,
        KeyCode::Delete => rt_event::KeyCode::Delete,
        KeyCode::Left => rt_event::KeyCode::Left,
        KeyCode::Right => rt_event::KeyCode::Right,
        KeyCode::Up => rt_event::KeyCode::Up,
        KeyCode::Down => rt_event::KeyCode::Down,
        KeyCode::Home => rt_event::KeyCode::Home,
        KeyCode::End => rt_event::KeyCode::End,
        KeyCode::Tab => rt_event::KeyCode::Tab,
        _ => return None,
    })
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
