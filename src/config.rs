use crate::i18n::Lang;
use crate::model::FieldType;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE: &str = "field-new.yaml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HookConfig {
    #[serde(default)]
    pub resize: Option<String>,
    #[serde(default)]
    pub load_fields: Option<String>,
    // Receives ${FIELD_ID}
    #[serde(default)]
    pub add_to_layout: Option<String>,
    // Receives ${URL}
    #[serde(default)]
    pub navigate: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    // Page address carrying ?entity=...&type=...
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub open_browser: bool,
    #[serde(default)]
    pub hooks: HookConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page: None,
            lang: Lang::Zh,
            timeout_secs: default_timeout(),
            session_cookie: None,
            headers: BTreeMap::new(),
            open_browser: false,
            hooks: HookConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:18080/rebuild".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl AppConfig {
    pub fn from_yaml(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = serde_yaml::from_str(s).context("parsing config")?;
        cfg.expand_env();
        cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();
        Ok(cfg)
    }

    fn expand_env(&mut self) {
        let env_map: HashMap<String, String> = std::env::vars().collect();
        self.base_url = expand_vars(&self.base_url, &env_map);
        for v in [&mut self.page, &mut self.session_cookie].into_iter().flatten() {
            *v = expand_vars(v, &env_map);
        }
        for v in self.headers.values_mut() {
            *v = expand_vars(v, &env_map);
        }
    }
}

/// Expands `${VAR}` placeholders; unknown names expand to "".
pub fn expand_vars(s: &str, vars: &HashMap<String, String>) -> String {
    let re = Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("static regex");
    re.replace_all(s, |caps: &regex::Captures| {
        vars.get(&caps[1]).cloned().unwrap_or_default()
    })
    .to_string()
}

/// Finds and parses the config file. A missing file yields defaults.
pub fn load_config() -> Result<AppConfig> {
    if let Ok(base) = std::env::var("FIELD_NEW_CONFIG_DIR") {
        let entry = PathBuf::from(&base).join(CONFIG_FILE);
        let s = fs::read_to_string(&entry).with_context(|| format!("reading {entry:?}"))?;
        return AppConfig::from_yaml(&s).with_context(|| format!("parsing {entry:?}"));
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = [cwd.join(CONFIG_FILE), cwd.join(".tui").join(CONFIG_FILE)];
    for p in &candidates {
        if p.exists() {
            let s = fs::read_to_string(p).with_context(|| format!("reading {p:?}"))?;
            return AppConfig::from_yaml(&s).with_context(|| format!("parsing {p:?}"));
        }
    }
    let mut cur = cwd.as_path();
    while let Some(parent) = cur.parent() {
        let p = parent.join(".tui").join(CONFIG_FILE);
        if p.exists() {
            let s = fs::read_to_string(&p).with_context(|| format!("reading {p:?}"))?;
            return AppConfig::from_yaml(&s).with_context(|| format!("parsing {p:?}"));
        }
        cur = parent;
    }
    Ok(AppConfig::default())
}

/// Query parameters of the page the form is opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    pub entity: String,
    pub design_type: Option<FieldType>,
}

impl PageParams {
    /// Accepts a full URL or a bare query such as `entity=Account&type=STATE`.
    pub fn parse(page: &str) -> Result<Self> {
        let page = page.trim();
        let parsed = if page.contains("://") {
            url::Url::parse(page).with_context(|| format!("invalid page url: {page}"))?
        } else {
            let query = page.trim_start_matches('?');
            url::Url::parse(&format!("http://page.local/?{query}"))
                .with_context(|| format!("invalid page query: {page}"))?
        };
        let mut entity: Option<String> = None;
        let mut design_type: Option<FieldType> = None;
        for (k, v) in parsed.query_pairs() {
            match k.as_ref() {
                "entity" if !v.is_empty() => entity = Some(v.into_owned()),
                "type" if !v.is_empty() => design_type = Some(FieldType::parse(&v)),
                _ => {}
            }
        }
        let entity = entity.ok_or_else(|| anyhow!("page url has no 'entity' parameter: {page}"))?;
        Ok(Self {
            entity,
            design_type,
        })
    }
}
