use crate::config::{expand_vars, HookConfig};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::process::Command;

/// Surfaces outside the form that react to it. Every hook is optional.
pub trait FormHost {
    /// The hosting container should re-measure itself.
    fn resize(&mut self) -> Result<()> {
        Ok(())
    }
    /// Refresh an external field list.
    fn load_fields(&mut self) -> Result<()> {
        Ok(())
    }
    /// Insert the new field into an external form-design canvas.
    fn add_to_layout(&mut self, field_id: &str) -> Result<()> {
        let _ = field_id;
        Ok(())
    }
    /// Move the hosting page to `url`.
    fn navigate(&mut self, url: &str) -> Result<()> {
        let _ = url;
        Ok(())
    }
}

pub struct NoopHost;

impl FormHost for NoopHost {}

/// Runs a configured shell command per hook and waits for it.
pub struct CommandHost {
    hooks: HookConfig,
    entity: String,
    open_browser: bool,
}

impl CommandHost {
    pub fn new(hooks: HookConfig, entity: impl Into<String>, open_browser: bool) -> Self {
        Self {
            hooks,
            entity: entity.into(),
            open_browser,
        }
    }

    fn vars(&self, extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = std::env::vars().collect();
        vars.insert("ENTITY".into(), self.entity.clone());
        for (k, v) in extra {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        vars
    }

    /// Runs the hook to completion. A non-zero exit is an error.
    fn run(&self, name: &str, template: &str, extra: &[(&str, &str)]) -> Result<()> {
        let argv = build_argv(template, &self.vars(extra))
            .with_context(|| format!("hook '{name}'"))?;
        tracing::info!(hook = name, cmd = %argv.join(" "), "running hook");
        let out = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .with_context(|| format!("hook '{name}': starting {}", argv[0]))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            tracing::warn!(hook = name, status = ?out.status.code(), stderr = %stderr, "hook exited with failure");
            return Err(anyhow!(
                "hook '{name}' exited with {}: {}",
                out.status,
                stderr.trim()
            ));
        }
        Ok(())
    }
}

/// Expands `${VAR}` and splits shell-style into program + args.
pub(crate) fn build_argv(template: &str, vars: &HashMap<String, String>) -> Result<Vec<String>> {
    // Every value is shell-quoted so it survives the split as one argument.
    let quoted: HashMap<String, String> = vars
        .iter()
        .filter_map(|(k, v)| {
            shlex::try_quote(v)
                .ok()
                .map(|q| (k.clone(), q.into_owned()))
        })
        .collect();
    let expanded = expand_vars(template, &quoted);
    let parts = shlex::split(&expanded).ok_or_else(|| anyhow!("failed to parse command line"))?;
    if parts.is_empty() {
        return Err(anyhow!("empty command line"));
    }
    Ok(parts)
}

impl FormHost for CommandHost {
    fn resize(&mut self) -> Result<()> {
        match self.hooks.resize.clone() {
            Some(cmd) => self.run("resize", &cmd, &[]),
            None => Ok(()),
        }
    }

    fn load_fields(&mut self) -> Result<()> {
        match self.hooks.load_fields.clone() {
            Some(cmd) => self.run("load_fields", &cmd, &[]),
            None => Ok(()),
        }
    }

    fn add_to_layout(&mut self, field_id: &str) -> Result<()> {
        match self.hooks.add_to_layout.clone() {
            Some(cmd) => self.run("add_to_layout", &cmd, &[("FIELD_ID", field_id)]),
            None => Ok(()),
        }
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        if let Some(cmd) = self.hooks.navigate.clone() {
            return self.run("navigate", &cmd, &[("URL", url)]);
        }
        if self.open_browser {
            open::that(url).with_context(|| format!("opening {url}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_argv_expands_and_keeps_spaced_values_whole() {
        let mut vars = HashMap::new();
        vars.insert("FIELD_ID".to_string(), "owner".to_string());
        vars.insert("ENTITY".to_string(), "My Entity".to_string());
        let argv = build_argv("notify --field ${FIELD_ID} --entity ${ENTITY}", &vars).unwrap();
        assert_eq!(
            argv,
            vec!["notify", "--field", "owner", "--entity", "My Entity"]
        );
    }

    #[test]
    fn build_argv_rejects_empty_and_unbalanced() {
        let vars = HashMap::new();
        assert!(build_argv("   ", &vars).is_err());
        assert!(build_argv("echo \"open", &vars).is_err());
    }

    #[test]
    fn unconfigured_hooks_are_noops() {
        let mut host = CommandHost::new(HookConfig::default(), "Account", false);
        assert!(host.resize().is_ok());
        assert!(host.load_fields().is_ok());
        assert!(host.add_to_layout("x").is_ok());
        assert!(host.navigate("http://x").is_ok());
        let mut noop = NoopHost;
        assert!(noop.navigate("http://x").is_ok());
    }

    #[test]
    fn build_argv_keeps_quotes_and_backslashes_in_values() {
        let mut vars = HashMap::new();
        vars.insert("ENTITY".to_string(), r#"O'Brien"s\desk"#.to_string());
        vars.insert("URL".to_string(), "http://x/?q='a'".to_string());
        let argv = build_argv("notify ${ENTITY} ${URL}", &vars).unwrap();
        assert_eq!(
            argv,
            vec!["notify", r#"O'Brien"s\desk"#, "http://x/?q='a'"]
        );
    }

    #[cfg(unix)]
    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("field-new-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[cfg(unix)]
    #[test]
    fn navigate_hook_has_finished_when_call_returns() {
        let dir = scratch_dir("navigate");
        let marker = dir.join("url.txt");
        let hooks = HookConfig {
            navigate: Some(format!(
                "sh -c 'sleep 0.2; printf %s \"$1\" > {}' hook ${{URL}}",
                marker.display()
            )),
            ..Default::default()
        };
        let mut host = CommandHost::new(hooks, "Account", false);
        let url = "http://rb.local/admin/entity/Account/field/it's";
        host.navigate(url).unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), url);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn field_list_refresh_runs_before_layout_insert() {
        let dir = scratch_dir("order");
        let log = dir.join("calls.log");
        let hooks = HookConfig {
            load_fields: Some(format!(
                "sh -c 'sleep 0.2; echo load >> {}'",
                log.display()
            )),
            add_to_layout: Some(format!(
                "sh -c 'echo \"layout:$1:$2\" >> {}' hook ${{FIELD_ID}} ${{ENTITY}}",
                log.display()
            )),
            ..Default::default()
        };
        let mut host = CommandHost::new(hooks, "Account", false);
        host.load_fields().unwrap();
        host.add_to_layout("owner").unwrap();
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "load\nlayout:owner:Account\n"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn failing_hook_reports_error() {
        let hooks = HookConfig {
            resize: Some("sh -c 'echo no-canvas >&2; exit 3'".into()),
            navigate: Some("field-new-hook-that-does-not-exist ${URL}".into()),
            ..Default::default()
        };
        let mut host = CommandHost::new(hooks, "Account", false);
        let err = host.resize().unwrap_err().to_string();
        assert!(err.contains("resize"), "{err}");
        assert!(err.contains("no-canvas"), "{err}");
        assert!(host.navigate("http://x").is_err());
    }
}
