//! Command parsing and output rendering for the interactive `truvideo_cli`.

use std::time::Duration;

use crate::auth::Authentication;
use crate::session::SessionSnapshot;

pub const HELP: &str = "Commands:
  status                                   show session flags and phase
  payload                                  request a fresh payload from the engine
  auth <api_key> <secret> [external_id]    sign a payload with <secret> and authenticate
  init [access_ttl_secs] [refresh_ttl_secs]
                                           initialize (optionally refreshing with new TTLs)
  handle <api_key> <secret> [external_id]  authenticate only if needed, then initialize
  info                                     show the live credentials (requires init)
  clear                                    drop all credentials
  env                                      show the configured environment
  version                                  show the core module version
  help                                     show this help
  quit | exit                              leave the interpreter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Payload,
    Auth { api_key: String, secret: String, external_id: Option<String> },
    Init { access_ttl: Option<Duration>, refresh_ttl: Option<Duration> },
    Handle { api_key: String, secret: String, external_id: Option<String> },
    Info,
    Clear,
    Env,
    Version,
    Help,
    Quit,
    Empty,
}

/// Parse one REPL line. Keywords are case-insensitive; arguments are kept verbatim.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(head) = parts.first() else { return Ok(Command::Empty) };
    let args = &parts[1..];
    let cmd = match head.to_ascii_lowercase().as_str() {
        "status" => no_args(args, Command::Status)?,
        "payload" => no_args(args, Command::Payload)?,
        "info" => no_args(args, Command::Info)?,
        "clear" => no_args(args, Command::Clear)?,
        "env" => no_args(args, Command::Env)?,
        "version" => no_args(args, Command::Version)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "auth" => {
            let (api_key, secret, external_id) = credentials_args("auth", args)?;
            Command::Auth { api_key, secret, external_id }
        }
        "handle" => {
            let (api_key, secret, external_id) = credentials_args("handle", args)?;
            Command::Handle { api_key, secret, external_id }
        }
        "init" => {
            if args.len() > 2 { return Err("usage: init [access_ttl_secs] [refresh_ttl_secs]".into()); }
            Command::Init {
                access_ttl: args.first().map(|a| parse_secs(a)).transpose()?,
                refresh_ttl: args.get(1).map(|a| parse_secs(a)).transpose()?,
            }
        }
        other => return Err(format!("unknown command '{}'; type 'help'", other)),
    };
    Ok(cmd)
}

fn no_args(args: &[&str], cmd: Command) -> Result<Command, String> {
    if args.is_empty() { Ok(cmd) } else { Err(format!("{:?} takes no arguments", cmd).to_lowercase()) }
}

fn credentials_args(name: &str, args: &[&str]) -> Result<(String, String, Option<String>), String> {
    match args {
        [key, secret] => Ok((key.to_string(), secret.to_string(), None)),
        [key, secret, ext] => Ok((key.to_string(), secret.to_string(), Some(ext.to_string()))),
        _ => Err(format!("usage: {} <api_key> <secret> [external_id]", name)),
    }
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    s.parse::<u64>().map(Duration::from_secs).map_err(|_| format!("invalid ttl '{}': expected whole seconds", s))
}

pub fn render_status(s: &SessionSnapshot) -> String {
    let rows = vec![
        ("phase".to_string(), format!("{:?}", s.phase())),
        ("authenticated".to_string(), s.is_authenticated.to_string()),
        ("expired".to_string(), s.is_expired.to_string()),
        ("initialized".to_string(), s.is_initialized.to_string()),
        ("api_key".to_string(), s.api_key.clone()),
        ("environment".to_string(), s.environment.to_string()),
    ];
    render_table(&rows)
}

pub fn render_authentication(a: &Authentication) -> String {
    let rows = vec![
        ("api_key".to_string(), a.api_key.clone()),
        ("access_token".to_string(), a.access_token.clone()),
        ("access_expires_at".to_string(), a.access_expires_at.to_rfc3339()),
        ("refresh_expires_at".to_string(), a.refresh_expires_at.to_rfc3339()),
        ("external_id".to_string(), a.external_id.clone().unwrap_or_default()),
    ];
    render_table(&rows)
}

/// Two-column ASCII table, one row per (key, value).
pub fn render_table(rows: &[(String, String)]) -> String {
    let max_col_width: usize = 80;
    let mut widths = [3usize, 5usize];
    for (k, v) in rows {
        widths[0] = widths[0].max(display_len(k).min(max_col_width));
        widths[1] = widths[1].max(display_len(v).min(max_col_width));
    }
    let sep = build_separator(&widths);
    let mut out = vec![sep.clone(), build_row(&["key", "value"], &widths), sep.clone()];
    for (k, v) in rows {
        out.push(build_row(&[k.as_str(), v.as_str()], &widths));
    }
    out.push(sep);
    out.join("\n")
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[&str], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).copied().unwrap_or(""), *w);
        s.push(' ');
        s.push_str(&text);
        s.push_str(&" ".repeat(w.saturating_sub(display_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if display_len(s) <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("status").unwrap(), Command::Status);
        assert_eq!(parse_command("  STATUS  ").unwrap(), Command::Status);
        assert_eq!(parse_command("").unwrap(), Command::Empty);
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert!(parse_command("clear now").is_err());
        assert!(parse_command("bogus").is_err());
    }

    #[test]
    fn parses_auth_arguments() {
        assert_eq!(
            parse_command("auth KEY1 s3cret user-9").unwrap(),
            Command::Auth { api_key: "KEY1".into(), secret: "s3cret".into(), external_id: Some("user-9".into()) }
        );
        assert_eq!(
            parse_command("handle KEY1 s3cret").unwrap(),
            Command::Handle { api_key: "KEY1".into(), secret: "s3cret".into(), external_id: None }
        );
        assert!(parse_command("auth KEY1").is_err());
    }

    #[test]
    fn parses_init_ttls() {
        assert_eq!(parse_command("init").unwrap(), Command::Init { access_ttl: None, refresh_ttl: None });
        assert_eq!(
            parse_command("init 60 120").unwrap(),
            Command::Init { access_ttl: Some(Duration::from_secs(60)), refresh_ttl: Some(Duration::from_secs(120)) }
        );
        assert!(parse_command("init soon").is_err());
    }

    #[test]
    fn status_table_lists_flags() {
        let snap = SessionSnapshot {
            is_authenticated: true,
            is_expired: false,
            is_initialized: false,
            api_key: "KEY1".into(),
            environment: Environment::Rc,
        };
        let out = render_status(&snap);
        assert!(out.contains("AuthenticatedUninitialized"));
        assert!(out.contains("| api_key "));
        assert!(out.contains("RC"));
        let widths: Vec<usize> = out.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(200);
        let out = render_table(&[("k".into(), long)]);
        assert!(out.contains('…'));
    }
}
