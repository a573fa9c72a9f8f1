use crate::i18n::Msg;
use crate::model::{FieldDraft, FieldType, LazyOptions};
use crate::services::admin_client::ApiError;
use crate::ui::{AppState, LoadOutcome, ToastLevel};
use crate::widgets::form::{
    F_COMMENTS, F_LABEL, F_REF_CLASSIFICATION, F_REF_ENTITY, F_SAVE_AND_NEW, F_TYPE,
};

pub enum AppMsg {
    TypeChanged(FieldType),
    Submit,
    LoadedRefEntities(Result<LoadOutcome, ApiError>),
    LoadedClassifications(Result<LoadOutcome, ApiError>),
    LoadedSubmit(Result<LoadOutcome, ApiError>),
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    ResizeHost,
    LoadRefEntities,
    LoadClassifications,
    SubmitField(FieldDraft),
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
    RefreshFieldList,
    AddToLayout {
        field_id: String,
    },
    Navigate {
        url: String,
    },
}

/// Prepares the form for the page parameters. Runs once before the first draw.
pub fn init(state: &mut AppState) -> Vec<Effect> {
    let mut effects: Vec<Effect> = Vec::new();
    if let Some(t) = state.page.design_type.clone() {
        // Locked single-type mode: the type and the save-and-new toggle are fixed.
        let form = &mut state.form.form;
        form.select_type(&t);
        form.set_hidden(F_TYPE, true);
        form.set_checked(F_SAVE_AND_NEW, true);
        form.set_hidden(F_SAVE_AND_NEW, true);
        state.dbg(format!("design type {}", t.as_str()));
        effects.extend(update(state, AppMsg::TypeChanged(t)));
    }
    state.form.form.focus(F_LABEL);
    effects
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    use AppMsg::*;
    let mut effects: Vec<Effect> = Vec::new();
    match msg {
        TypeChanged(t) => {
            effects.push(Effect::ResizeHost);
            let form = &mut state.form.form;
            form.select_type(&t);
            form.show_sections_for(&t);
            if t.is_reference() {
                if state.ref_entities.begin() {
                    state.dbg("load reference entities");
                    effects.push(Effect::LoadRefEntities);
                }
            } else if t == FieldType::Classification && state.classifications.begin() {
                state.dbg("load classifications");
                effects.push(Effect::LoadClassifications);
            }
        }
        Submit => {
            let form = &mut state.form.form;
            if form.loading {
                return effects;
            }
            form.editing = false;
            form.clear_errors();
            let values = form.values();
            match FieldDraft::compose(&state.page.entity, &values) {
                Err(e) => {
                    let text = state.config.lang.text(e.msg()).to_string();
                    form.set_error(e.field_name(), &text);
                    if let Some(i) = form.fields.iter().position(|f| f.name == e.field_name()) {
                        form.selected = i;
                    }
                    state.dbg(format!("validation failed: {e}"));
                    effects.push(Effect::ShowToast {
                        text,
                        level: ToastLevel::Error,
                        seconds: 3,
                    });
                }
                Ok(draft) => {
                    form.loading = true;
                    state.status_text = Some(state.config.lang.text(Msg::Submitting).into());
                    state.dbg(format!(
                        "submit {} {} ({})",
                        draft.entity,
                        draft.label,
                        draft.field_type.as_str()
                    ));
                    effects.push(Effect::SubmitField(draft));
                }
            }
        }
        LoadedRefEntities(outcome) => {
            apply_options(state, F_REF_ENTITY, outcome, |s| &mut s.ref_entities);
        }
        LoadedClassifications(outcome) => {
            apply_options(state, F_REF_CLASSIFICATION, outcome, |s| {
                &mut s.classifications
            });
        }
        LoadedSubmit(outcome) => {
            state.status_text = None;
            state.form.form.loading = false;
            match outcome {
                Ok(LoadOutcome::Created(field_id)) => {
                    state.dbg(format!("field created: {field_id}"));
                    if state.form.form.checked(F_SAVE_AND_NEW) {
                        effects.push(Effect::ShowToast {
                            text: state.config.lang.text(Msg::FieldAdded).into(),
                            level: ToastLevel::Success,
                            seconds: 2,
                        });
                        let form = &mut state.form.form;
                        form.set_text(F_LABEL, "");
                        form.set_text(F_COMMENTS, "");
                        effects.extend(update(state, TypeChanged(FieldType::Text)));
                        state.form.form.focus(F_LABEL);
                        effects.push(Effect::RefreshFieldList);
                        effects.push(Effect::AddToLayout { field_id });
                    } else {
                        effects.push(Effect::Navigate {
                            url: field_url(&state.config.base_url, &state.page.entity, &field_id),
                        });
                    }
                }
                Ok(_) => {
                    state.dbg("unexpected submit outcome");
                }
                Err(e) => {
                    state.dbg(format!("submit failed: {e}"));
                    let text = match e {
                        ApiError::Rejected { message, .. } => message,
                        other => format!(
                            "{}: {other}",
                            state.config.lang.text(Msg::SubmitFailed)
                        ),
                    };
                    effects.push(Effect::ShowToast {
                        text,
                        level: ToastLevel::Error,
                        seconds: 3,
                    });
                }
            }
        }
    }
    effects
}

/// Stores a fetched option list; failed fetches stay `Requested` for good.
fn apply_options(
    state: &mut AppState,
    field: &str,
    outcome: Result<LoadOutcome, ApiError>,
    slot: impl Fn(&mut AppState) -> &mut LazyOptions,
) {
    match outcome {
        Ok(LoadOutcome::Options(opts)) => {
            state.dbg(format!("{field}: {} options", opts.len()));
            state.form.form.set_options(field, opts.clone());
            *slot(state) = LazyOptions::Loaded(opts);
        }
        Ok(_) => state.dbg(format!("{field}: unexpected outcome")),
        Err(e) => state.dbg(format!("{field}: load failed: {e}")),
    }
}

pub fn field_url(base_url: &str, entity: &str, field_id: &str) -> String {
    format!(
        "{}/admin/entity/{entity}/field/{field_id}",
        base_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests;
