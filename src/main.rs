//! CLI entry point for `inlinepgp`.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use inlinepgp::backend;
use inlinepgp::config::Config;
use inlinepgp::error::PgpError;
use inlinepgp::hook::PgpHook;
use inlinepgp::i18n;
use inlinepgp::model::message::{Identity, SendContext};
use inlinepgp::send::{FixedAnswer, LinePrompter, SendOutcome};

#[derive(Parser)]
#[command(name = "inlinepgp", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, value_name = "LANG", global = true)]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt or verify an inline PGP block
    Decrypt {
        /// Message (.eml) or plain body file
        path: PathBuf,
        /// Charset of the body when the file does not declare one
        #[arg(long)]
        charset: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Sign and/or encrypt a message body
    Encrypt {
        /// Body file, or `-` for stdin
        path: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long, value_delimiter = ',')]
        to: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        cc: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        bcc: Vec<String>,
        #[arg(long)]
        sign: bool,
        #[arg(long)]
        encrypt: bool,
        #[arg(long)]
        pgp_mime: bool,
        /// Treat the message as saved rather than sent
        #[arg(long)]
        save: bool,
        /// Answer yes to every question
        #[arg(short, long)]
        yes: bool,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Detect language early from --lang arg or system env, before clap processes --help.
fn detect_lang_early(config: &Config) -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--lang" {
            if let Some(lang) = args.get(i + 1).and_then(|code| i18n::Lang::from_code(code)) {
                return lang;
            }
        }
        if let Some(lang) = args[i]
            .strip_prefix("--lang=")
            .and_then(i18n::Lang::from_code)
        {
            return lang;
        }
    }
    i18n::Lang::from_code(&config.general.lang).unwrap_or_else(i18n::detect_system_lang)
}

/// Build a localized clap Command using i18n strings.
fn build_localized_command() -> clap::Command {
    let mut cmd = Cli::command().about(i18n::app_about());

    let subcommands: Vec<clap::Command> = cmd
        .get_subcommands()
        .map(|sub| {
            let s = sub.clone();
            match s.get_name() {
                "decrypt" => s.about(i18n::help_cmd_decrypt()),
                "encrypt" => s.about(i18n::help_cmd_encrypt()),
                "completions" => s.about(i18n::help_cmd_completions()),
                "manpage" => s.about(i18n::help_cmd_manpage()),
                _ => s,
            }
        })
        .collect();

    for sub in subcommands {
        cmd = cmd.mut_subcommand(sub.get_name(), |_| sub.clone());
    }

    cmd
}

fn main() -> anyhow::Result<()> {
    let config = inlinepgp::config::load_config();

    // Language must be known before clap renders --help
    i18n::set_lang(detect_lang_early(&config));

    let matches = build_localized_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Decrypt {
            path,
            charset,
            json,
        } => cmd_decrypt(&config, &path, charset.as_deref(), json),
        Commands::Encrypt {
            path,
            from,
            to,
            cc,
            bcc,
            sign,
            encrypt,
            pgp_mime,
            save,
            yes,
            json,
        } => {
            let identity = Identity {
                email: from,
                sign_by_default: sign,
                encrypt_by_default: encrypt,
                pgp_mime_by_default: pgp_mime,
                ..Identity::default()
            };
            let ctx = SendContext {
                identity,
                to,
                cc,
                bcc,
                body_text: read_input(&path)?,
                save_message: save,
            };
            cmd_encrypt(&config, ctx, yes, json)
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let log_dir = inlinepgp::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "inlinepgp.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !path.exists() {
        anyhow::bail!("{}: {}", i18n::err_file_not_found(), path.display());
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Decrypt the inline block of a message file and print the result.
fn cmd_decrypt(config: &Config, path: &Path, charset: Option<&str>, json: bool) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("{}: {}", i18n::err_file_not_found(), path.display());
    }
    let raw = std::fs::read(path)?;
    let body = inlinepgp::source::load_body(&raw);

    let handle = backend::connect(&config.backend)
        .ok_or(PgpError::BackendUnavailable)
        .context(i18n::cli_backend_unavailable())?;
    let hook = PgpHook::from_config(Some(handle), config);

    let mut badges = hook.before_streaming(body.content_type.as_deref().unwrap_or("text/plain"));
    let charset = body
        .charset
        .as_deref()
        .or(charset)
        .or(Some(config.display.default_charset.as_str()));

    let Some(mut shown) = hook.streamed(&body.text, charset) else {
        anyhow::bail!("{}", i18n::cli_no_pgp_block());
    };
    badges |= shown.badges;
    shown.badges = badges;

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        if let Some(note) = shown.signature_note {
            eprintln!("[{note}]");
        }
        print!("{}", shown.text);
        if !shown.text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

/// Resolve send protection for a body and print what would be sent.
fn cmd_encrypt(config: &Config, mut ctx: SendContext, yes: bool, json: bool) -> anyhow::Result<()> {
    let handle = backend::connect(&config.backend)
        .ok_or(PgpError::BackendUnavailable)
        .context(i18n::cli_backend_unavailable())?;
    let hook = PgpHook::from_config(Some(handle), config);
    let prefs = config.send.preferences();

    let outcome = if yes {
        hook.before_send(&mut ctx, &prefs, &mut FixedAnswer(true))
    } else {
        let mut prompter = LinePrompter::new(io::stdin().lock(), io::stderr());
        hook.before_send(&mut ctx, &prefs, &mut prompter)
    };

    let resolution = match outcome {
        SendOutcome::Send(resolution) => resolution,
        SendOutcome::Canceled => {
            return Err(PgpError::Cancelled).context(i18n::cli_send_canceled());
        }
    };

    if json {
        let out = serde_json::json!({
            "flags": resolution.flags.describe(),
            "sender": resolution.sender,
            "recipients": resolution.recipients,
            "bcc_recipients": resolution.bcc_recipients,
            "micalg": resolution.security.as_ref().and_then(|s| s.micalg()),
            "security": resolution.security,
            "body_modified": resolution.body_modified,
            "unencrypted_fallback": resolution.unencrypted_fallback,
            "body": ctx.body_text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(ctx.body_text.as_bytes())?;
        if !ctx.body_text.ends_with('\n') {
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "inlinepgp", &mut io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let man = clap_mangen::Man::new(Cli::command());
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    io::stdout().write_all(&buf)?;
    Ok(())
}
