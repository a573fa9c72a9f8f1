use crate::i18n::{Lang, Msg};
use crate::model::{is_truthy, EntityDescriptor, FieldDraft, SelectOption};
use crate::services::admin_client::AdminClient;
use crate::ui::{LoadKind, LoadMsg, LoadOutcome};
use serde_json::Value as JsonValue;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// Options for the reference-entity select: fetched entities, then the two
/// built-in ones, then a placeholder if nothing at all was produced.
pub(crate) fn entity_options(entities: &[EntityDescriptor], lang: Lang) -> Vec<SelectOption> {
    let mut out: Vec<SelectOption> = entities
        .iter()
        .map(|e| {
            let label = if e.is_detail() {
                format!("{} ({})", e.entity_label, lang.text(Msg::DetailEntity))
            } else {
                e.entity_label.clone()
            };
            SelectOption::new(e.entity_name.clone(), label)
        })
        .collect();
    out.push(SelectOption::new("User", lang.text(Msg::User)));
    out.push(SelectOption::new("Department", lang.text(Msg::Department)));
    if out.is_empty() {
        out.push(SelectOption::placeholder(lang.text(Msg::NoEntityAvailable)));
    }
    out
}

/// Options for the classification select. Disabled rows are skipped.
pub(crate) fn classification_options(rows: &[JsonValue], lang: Lang) -> Vec<SelectOption> {
    let mut out: Vec<SelectOption> = Vec::new();
    for row in rows {
        let Some(arr) = row.as_array() else {
            continue;
        };
        if arr.get(2).map(is_truthy).unwrap_or(false) {
            continue;
        }
        let id = match arr.first() {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => continue,
        };
        let label = arr
            .get(1)
            .and_then(|x| x.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| id.clone());
        out.push(SelectOption::new(id, label));
    }
    if out.is_empty() {
        out.push(SelectOption::placeholder(
            lang.text(Msg::NoClassificationAvailable),
        ));
    }
    out
}

pub fn spawn_load_entities(client: Arc<AdminClient>, lang: Lang, tx: Sender<LoadMsg>) {
    thread::spawn(move || {
        let outcome = client
            .entity_list()
            .map(|list| LoadOutcome::Options(entity_options(&list, lang)));
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "entity list fetch failed");
        }
        let _ = tx.send(LoadMsg {
            kind: LoadKind::RefEntities,
            outcome,
        });
    });
}

pub fn spawn_load_classifications(client: Arc<AdminClient>, lang: Lang, tx: Sender<LoadMsg>) {
    thread::spawn(move || {
        let outcome = client
            .classification_list()
            .map(|rows| LoadOutcome::Options(classification_options(&rows, lang)));
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "classification list fetch failed");
        }
        let _ = tx.send(LoadMsg {
            kind: LoadKind::Classifications,
            outcome,
        });
    });
}

pub fn spawn_submit_field(client: Arc<AdminClient>, draft: FieldDraft, tx: Sender<LoadMsg>) {
    thread::spawn(move || {
        let outcome = client.create_field(&draft).map(LoadOutcome::Created);
        match &outcome {
            Ok(LoadOutcome::Created(id)) => tracing::info!(field = %id, "field created"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "field creation failed"),
        }
        let _ = tx.send(LoadMsg {
            kind: LoadKind::SubmitField,
            outcome,
        });
    });
}
