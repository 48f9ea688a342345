//! truvideo CLI binary.
//!
//! Interactive interpreter that drives the session lifecycle against the in-process
//! engine. Api keys come from the config file, `TRUVIDEO_*` env vars, or `--register`.

use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use truvideo_core::auth::{AuthenticateRequest, HmacSignatureProvider, SignatureProvider};
use truvideo_core::cli::{parse_command, render_authentication, render_status, Command, HELP};
use truvideo_core::{SdkConfig, TruvideoSdk};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--config <path>] [--environment dev|beta|rc|prod] [--register KEY:SECRET]...\n\nFlags:\n  --config <path>          JSON config file (env: TRUVIDEO_CONFIG)\n  --environment <env>      Override the environment (env: TRUVIDEO_ENVIRONMENT)\n  --register KEY:SECRET    Register an api key with the local engine; repeatable\n  -h, --help               Show this help\n\nEnvironment:\n  TRUVIDEO_CREDENTIALS_PATH   persist credentials to this file\n  TRUVIDEO_LOG_PRINT          true/false, print lifecycle events\n  TRUVIDEO_LOG_REDACT         true/false, mask payloads and signatures in events\n  RUST_LOG                    tracing filter (default info)\n\n{HELP}"
    );
}

fn parse_registration(s: &str) -> Result<(String, String)> {
    match s.split_once(':') {
        Some((k, v)) if !k.is_empty() && !v.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(anyhow!("--register expects KEY:SECRET, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut config_path: Option<String> = None;
    let mut environment: Option<String> = None;
    let mut registrations: Vec<(String, String)> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 >= args.len() { eprintln!("--config requires a path"); print_usage(&program); std::process::exit(2); }
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--environment" => {
                if i + 1 >= args.len() { eprintln!("--environment requires a value"); print_usage(&program); std::process::exit(2); }
                environment = Some(args[i + 1].clone());
                i += 2;
            }
            "--register" => {
                if i + 1 >= args.len() { eprintln!("--register requires KEY:SECRET"); print_usage(&program); std::process::exit(2); }
                registrations.push(parse_registration(&args[i + 1])?);
                i += 2;
            }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => { eprintln!("unknown argument: {}", other); print_usage(&program); std::process::exit(2); }
        }
    }

    // CLI flags override the config file, which the env overlay already adjusted.
    let mut cfg = match config_path.as_deref() {
        Some(p) => {
            let mut cfg = SdkConfig::load(Path::new(p))?;
            cfg.apply_env_overrides()?;
            cfg
        }
        None => SdkConfig::from_env()?,
    };
    if let Some(e) = environment {
        cfg.environment = Some(e.parse().map_err(|msg: String| anyhow!(msg))?);
    }
    for (key, secret) in registrations {
        cfg.engine.api_keys.insert(key, secret);
    }

    let rt = Runtime::new()?;
    let sdk = {
        let _guard = rt.enter();
        TruvideoSdk::from_config(&cfg)?
    };
    info!(environment = %sdk.environment(), keys = cfg.engine.api_keys.len(), "truvideo cli started");
    run_repl(&rt, &sdk)
}

fn run_repl(rt: &Runtime, sdk: &TruvideoSdk) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("truvideo-cli interpreter. Type 'help' for commands.");
    loop {
        let line = match rl.readline("truvideo> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => execute(rt, sdk, cmd),
            Err(msg) => eprintln!("{}", msg),
        }
    }
    Ok(())
}

fn execute(rt: &Runtime, sdk: &TruvideoSdk, cmd: Command) {
    let outcome: Result<String> = match cmd {
        Command::Empty | Command::Quit => return,
        Command::Help => Ok(HELP.to_string()),
        Command::Status => Ok(render_status(&sdk.snapshot())),
        Command::Env => Ok(sdk.environment().to_string()),
        Command::Version => Ok(format!("core {}", sdk.version())),
        Command::Payload => sdk.generate_payload().map_err(Into::into),
        Command::Info => sdk.authentication().map(|a| render_authentication(&a)).map_err(Into::into),
        Command::Auth { api_key, secret, external_id } => {
            let signer = HmacSignatureProvider::new(&secret);
            sdk.generate_payload().map_err(anyhow::Error::from).and_then(|payload| {
                let signature = signer.generate_signature(&payload);
                let req = AuthenticateRequest::new(api_key, payload, signature).external_id(external_id);
                rt.block_on(sdk.authenticate(req)).map_err(Into::into)
            })
            .map(|_| "authenticated".to_string())
        }
        Command::Handle { api_key, secret, external_id } => {
            let signer = HmacSignatureProvider::new(&secret);
            rt.block_on(sdk.handle_authentication(&api_key, external_id.as_deref(), &signer))
                .map(|_| "ready".to_string())
                .map_err(Into::into)
        }
        Command::Init { access_ttl, refresh_ttl } => rt
            .block_on(sdk.init_authentication(access_ttl, refresh_ttl))
            .map(|_| "initialized".to_string())
            .map_err(Into::into),
        Command::Clear => rt.block_on(sdk.clear_authentication()).map(|_| "cleared".to_string()).map_err(Into::into),
    };
    match outcome {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
