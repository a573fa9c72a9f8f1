use super::*;
use crate::config::{AppConfig, PageParams};
use crate::i18n::Lang;
use crate::model::{SelectOption, DEFAULT_STATE_CLASS};
use crate::widgets::form::F_STATE_CLASS;

fn state_for(design_type: Option<FieldType>) -> AppState {
    let cfg = AppConfig {
        base_url: "http://rb.local/rebuild".into(),
        lang: Lang::En,
        ..Default::default()
    };
    AppState::new(
        cfg,
        PageParams {
            entity: "Account".into(),
            design_type,
        },
    )
}

fn type_label(st: &mut AppState, label: &str) {
    st.form.form.set_text(F_LABEL, label);
}

fn submitted_draft(effects: &[Effect]) -> Option<&FieldDraft> {
    effects.iter().find_map(|e| match e {
        Effect::SubmitField(d) => Some(d),
        _ => None,
    })
}

fn created(id: &str) -> AppMsg {
    AppMsg::LoadedSubmit(Ok(LoadOutcome::Created(id.into())))
}

#[test]
fn init_without_type_focuses_label_and_fetches_nothing() {
    let mut st = state_for(None);
    let effects = init(&mut st);
    assert!(effects.is_empty());
    assert_eq!(st.form.form.fields[st.form.form.selected].name, F_LABEL);
    assert!(!st.form.form.field(F_TYPE).unwrap().hidden);
}

#[test]
fn init_with_design_type_locks_form() {
    let mut st = state_for(Some(FieldType::Reference));
    let effects = init(&mut st);
    assert_eq!(effects, vec![Effect::ResizeHost, Effect::LoadRefEntities]);
    let form = &st.form.form;
    assert!(form.field(F_TYPE).unwrap().hidden);
    assert!(form.field(F_SAVE_AND_NEW).unwrap().hidden);
    assert!(form.checked(F_SAVE_AND_NEW));
    assert!(!form.field(F_REF_ENTITY).unwrap().hidden);
    assert_eq!(form.fields[form.selected].name, F_LABEL);
}

#[test]
fn selecting_reference_twice_fetches_once() {
    let mut st = state_for(None);
    let first = update(&mut st, AppMsg::TypeChanged(FieldType::Reference));
    assert_eq!(first, vec![Effect::ResizeHost, Effect::LoadRefEntities]);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::Text));
    let again = update(&mut st, AppMsg::TypeChanged(FieldType::N2nReference));
    assert_eq!(again, vec![Effect::ResizeHost]);
    assert!(!st.form.form.field(F_REF_ENTITY).unwrap().hidden);
}

#[test]
fn classification_and_state_sections() {
    let mut st = state_for(None);
    let effects = update(&mut st, AppMsg::TypeChanged(FieldType::Classification));
    assert_eq!(effects, vec![Effect::ResizeHost, Effect::LoadClassifications]);
    assert!(!st.form.form.field(F_REF_CLASSIFICATION).unwrap().hidden);
    let effects = update(&mut st, AppMsg::TypeChanged(FieldType::State));
    assert_eq!(effects, vec![Effect::ResizeHost]);
    assert!(st.form.form.field(F_REF_CLASSIFICATION).unwrap().hidden);
    assert!(!st.form.form.field(F_STATE_CLASS).unwrap().hidden);
}

#[test]
fn loaded_options_fill_select_and_mark_loaded() {
    let mut st = state_for(None);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::Reference));
    let opts = vec![
        SelectOption::new("User", "User"),
        SelectOption::new("Department", "Department"),
    ];
    let _ = update(
        &mut st,
        AppMsg::LoadedRefEntities(Ok(LoadOutcome::Options(opts.clone()))),
    );
    assert_eq!(st.ref_entities, LazyOptions::Loaded(opts));
    assert_eq!(st.form.form.text(F_REF_ENTITY), "User");
}

#[test]
fn failed_option_fetch_is_not_retried() {
    let mut st = state_for(None);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::Classification));
    let _ = update(
        &mut st,
        AppMsg::LoadedClassifications(Err(ApiError::Decode("boom".into()))),
    );
    assert_eq!(st.classifications, LazyOptions::Requested);
    let again = update(&mut st, AppMsg::TypeChanged(FieldType::Classification));
    assert_eq!(again, vec![Effect::ResizeHost]);
}

#[test]
fn empty_label_never_submits() {
    for t in [FieldType::Text, FieldType::Reference, FieldType::State] {
        let mut st = state_for(None);
        let _ = update(&mut st, AppMsg::TypeChanged(t));
        st.form.form.set_options(F_REF_ENTITY, vec![SelectOption::new("User", "User")]);
        let effects = update(&mut st, AppMsg::Submit);
        assert!(submitted_draft(&effects).is_none());
        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowToast { level: ToastLevel::Error, .. }]
        ));
        assert!(!st.form.form.loading);
        assert_eq!(
            st.form.form.field(F_LABEL).unwrap().error.as_deref(),
            Some("Please enter a field name")
        );
    }
}

#[test]
fn reference_without_entity_is_rejected_locally() {
    let mut st = state_for(None);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::Reference));
    type_label(&mut st, "Owner");
    let effects = update(&mut st, AppMsg::Submit);
    match effects.as_slice() {
        [Effect::ShowToast { text, .. }] => assert_eq!(text, "Please select a reference entity"),
        _ => panic!("expected a single toast"),
    }
    assert_eq!(st.form.form.fields[st.form.form.selected].name, F_REF_ENTITY);
}

#[test]
fn placeholder_classification_does_not_satisfy_validation() {
    let mut st = state_for(None);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::Classification));
    let _ = update(
        &mut st,
        AppMsg::LoadedClassifications(Ok(LoadOutcome::Options(vec![SelectOption::placeholder(
            "No classification data available",
        )]))),
    );
    type_label(&mut st, "Region");
    let effects = update(&mut st, AppMsg::Submit);
    assert!(submitted_draft(&effects).is_none());
}

#[test]
fn plain_type_submits_and_sets_loading() {
    let mut st = state_for(None);
    type_label(&mut st, "Nickname");
    let effects = update(&mut st, AppMsg::Submit);
    let draft = submitted_draft(&effects).expect("submit effect");
    assert_eq!(draft.entity, "Account");
    assert_eq!(draft.field_type, FieldType::Text);
    assert_eq!(draft.state_class, DEFAULT_STATE_CLASS);
    assert!(st.form.form.loading);
    assert!(st.status_text.is_some());
    // Disabled while in flight.
    assert!(update(&mut st, AppMsg::Submit).is_empty());
}

#[test]
fn success_without_save_and_new_navigates() {
    let mut st = state_for(None);
    type_label(&mut st, "Nickname");
    let _ = update(&mut st, AppMsg::Submit);
    let effects = update(&mut st, created("nickname"));
    assert_eq!(
        effects,
        vec![Effect::Navigate {
            url: "http://rb.local/rebuild/admin/entity/Account/field/nickname".into()
        }]
    );
    assert!(!st.form.form.loading);
    assert!(st.status_text.is_none());
}

#[test]
fn success_with_save_and_new_resets_form() {
    let mut st = state_for(None);
    let _ = update(&mut st, AppMsg::TypeChanged(FieldType::State));
    st.form.form.set_checked(F_SAVE_AND_NEW, true);
    type_label(&mut st, "Status");
    st.form.form.set_text(F_COMMENTS, "workflow");
    let _ = update(&mut st, AppMsg::Submit);
    let effects = update(&mut st, created("status"));
    assert!(matches!(
        effects.first(),
        Some(Effect::ShowToast { level: ToastLevel::Success, .. })
    ));
    assert_eq!(
        &effects[1..],
        &[
            Effect::ResizeHost,
            Effect::RefreshFieldList,
            Effect::AddToLayout {
                field_id: "status".into()
            },
        ]
    );
    let form = &st.form.form;
    assert_eq!(form.text(F_LABEL), "");
    assert_eq!(form.text(F_COMMENTS), "");
    assert_eq!(form.selected_type(), Some(FieldType::Text));
    assert!(form.field(F_STATE_CLASS).unwrap().hidden);
    assert_eq!(form.fields[form.selected].name, F_LABEL);
    assert!(!form.loading);
}

#[test]
fn rejection_restores_control_without_reset_or_navigation() {
    let mut st = state_for(None);
    type_label(&mut st, "Name");
    let _ = update(&mut st, AppMsg::Submit);
    let effects = update(
        &mut st,
        AppMsg::LoadedSubmit(Err(ApiError::Rejected {
            code: 1,
            message: "X".into(),
        })),
    );
    assert_eq!(
        effects,
        vec![Effect::ShowToast {
            text: "X".into(),
            level: ToastLevel::Error,
            seconds: 3,
        }]
    );
    assert!(!st.form.form.loading);
    assert_eq!(st.form.form.text(F_LABEL), "Name");
}

#[test]
fn transport_failure_restores_control() {
    let mut st = state_for(None);
    type_label(&mut st, "Name");
    let _ = update(&mut st, AppMsg::Submit);
    let effects = update(
        &mut st,
        AppMsg::LoadedSubmit(Err(ApiError::Decode("not json".into()))),
    );
    match effects.as_slice() {
        [Effect::ShowToast { text, level, .. }] => {
            assert!(text.starts_with("Submit failed"));
            assert_eq!(*level, ToastLevel::Error);
        }
        _ => panic!("expected error toast"),
    }
    assert!(!st.form.form.loading);
}

#[test]
fn field_url_trims_trailing_slash() {
    assert_eq!(
        field_url("http://x/rebuild/", "Order", "amount"),
        "http://x/rebuild/admin/entity/Order/field/amount"
    );
}
