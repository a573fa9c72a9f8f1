use crate::config::AppConfig;
use crate::model::{EntityDescriptor, FieldDraft};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

pub const ENTITY_LIST_PATH: &str = "/admin/entity/entity-list?detail=true&bizz=false";
pub const CLASSIFICATION_LIST_PATH: &str = "/admin/metadata/classification/list";
pub const FIELD_NEW_PATH: &str = "/admin/entity/field-new";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Rejected { code: i64, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Wire shape of every admin response: `{error_code, data | error_msg}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    error_code: i64,
    #[serde(default)]
    data: JsonValue,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Splits the tagged envelope into the payload or the server's rejection.
pub fn decode_reply(v: JsonValue) -> Result<JsonValue, ApiError> {
    let env: Envelope = serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string()))?;
    if env.error_code == 0 {
        Ok(env.data)
    } else {
        Err(ApiError::Rejected {
            code: env.error_code,
            message: env
                .error_msg
                .unwrap_or_else(|| format!("error_code {}", env.error_code)),
        })
    }
}

/// Blocking client for the admin endpoints the form needs.
pub struct AdminClient {
    base_url: String,
    session_cookie: Option<String>,
    headers: Vec<(String, String)>,
    client: Client,
}

impl AdminClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            session_cookie: cfg.session_cookie.clone(),
            headers: cfg
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(cookie) = &self.session_cookie {
            req = req.header(COOKIE, cookie.as_str());
        }
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }

    fn send(&self, req: RequestBuilder) -> Result<JsonValue, ApiError> {
        let resp = self.decorate(req).send()?;
        let v: JsonValue = resp.json()?;
        decode_reply(v)
    }

    pub fn entity_list(&self) -> Result<Vec<EntityDescriptor>, ApiError> {
        tracing::debug!(path = ENTITY_LIST_PATH, "fetching entity list");
        let data = self.send(self.client.get(self.url(ENTITY_LIST_PATH)))?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Rows are `[id, label, disabled]` triples, returned unfiltered.
    pub fn classification_list(&self) -> Result<Vec<JsonValue>, ApiError> {
        tracing::debug!(path = CLASSIFICATION_LIST_PATH, "fetching classifications");
        let data = self.send(self.client.get(self.url(CLASSIFICATION_LIST_PATH)))?;
        match data {
            JsonValue::Null => Ok(Vec::new()),
            JsonValue::Array(rows) => Ok(rows),
            other => Err(ApiError::Decode(format!("expected array, got {other}"))),
        }
    }

    /// Creates the field and returns its new identifier.
    pub fn create_field(&self, draft: &FieldDraft) -> Result<String, ApiError> {
        tracing::info!(entity = %draft.entity, label = %draft.label, "creating field");
        let data = self.send(self.client.post(self.url(FIELD_NEW_PATH)).json(draft))?;
        match data {
            JsonValue::String(s) => Ok(s),
            JsonValue::Number(n) => Ok(n.to_string()),
            other => Err(ApiError::Decode(format!("missing field id: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, FormValues};
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> AdminClient {
        let cfg = AppConfig {
            base_url: server.url(),
            session_cookie: Some("JSESSIONID=abc".into()),
            ..Default::default()
        };
        AdminClient::new(&cfg).unwrap()
    }

    #[test]
    fn decode_reply_maps_error_code() {
        assert_eq!(
            decode_reply(json!({"error_code": 0, "data": "x"})).unwrap(),
            json!("x")
        );
        match decode_reply(json!({"error_code": 1, "error_msg": "X"})) {
            Err(ApiError::Rejected { code, message }) => {
                assert_eq!(code, 1);
                assert_eq!(message, "X");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            decode_reply(json!({"data": 1})),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn entity_list_sends_query_and_cookie() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/admin/entity/entity-list")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("detail".into(), "true".into()),
                Matcher::UrlEncoded("bizz".into(), "false".into()),
            ]))
            .match_header("cookie", "JSESSIONID=abc")
            .with_header("content-type", "application/json")
            .with_body(
                json!({"error_code": 0, "data": [
                    {"entityName": "Account", "entityLabel": "客户"},
                    {"entityName": "OrderItem", "entityLabel": "订单明细", "mainEntity": "Order"}
                ]})
                .to_string(),
            )
            .create();
        let list = client_for(&server).entity_list().unwrap();
        m.assert();
        assert_eq!(list.len(), 2);
        assert!(!list[0].is_detail());
        assert!(list[1].is_detail());
    }

    #[test]
    fn create_field_posts_draft_and_returns_id() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("POST", "/admin/entity/field-new")
            .match_body(Matcher::PartialJson(
                json!({"entity": "Account", "label": "Owner", "type": "REFERENCE", "refEntity": "User"}),
            ))
            .with_body(json!({"error_code": 0, "data": "owner"}).to_string())
            .create();
        let draft = FieldDraft::compose(
            "Account",
            &FormValues {
                label: "Owner".into(),
                field_type: Some(FieldType::Reference),
                ref_entity: "User".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(client_for(&server).create_field(&draft).unwrap(), "owner");
        m.assert();
    }

    #[test]
    fn create_field_surfaces_rejection_message() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/admin/entity/field-new")
            .with_body(json!({"error_code": 1, "error_msg": "字段名称重复"}).to_string())
            .create();
        let draft = FieldDraft::compose(
            "Account",
            &FormValues {
                label: "Name".into(),
                ..Default::default()
            },
        )
        .unwrap();
        let err = client_for(&server).create_field(&draft).unwrap_err();
        assert_eq!(err.to_string(), "字段名称重复");
    }

    #[test]
    fn classification_list_tolerates_null_data() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/admin/metadata/classification/list")
            .with_body(json!({"error_code": 0, "data": null}).to_string())
            .create();
        assert!(client_for(&server).classification_list().unwrap().is_empty());
    }
}
