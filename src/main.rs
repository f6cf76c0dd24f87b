use std::{env, process::ExitCode};

use ansi_term::Color;
use clap::Parser;
use console::Term;
use hub_installer::{
    data::target::{PackageSource, VersionSpec},
    installer::{self, InstallOutcome, SystemRunner},
    Params, APP_NAME, DEFAULT_ARCHIVE_HOST, DEFAULT_ARCHIVE_ORG, DEFAULT_ARCHIVE_PROJECT,
    DEFAULT_PACKAGE,
};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Parser, Debug)]
#[command(version = env!("CARGO_APP_VERSION"), name = APP_NAME,
    about = "Installs a pinned JupyterHub release or git ref with pip", long_about = None)]
struct Args {
    /// Version to install: `<version>` or `git:<ref>`
    #[arg(long, env = "JUPYTERHUB_VERSION", value_parser = parse_version_spec)]
    jupyterhub_version: VersionSpec,
    /// Python interpreter whose pip is used
    #[arg(long, env, default_value = "python3")]
    python: String,
    /// Package name for release installs
    #[arg(long, env = "HUB_PACKAGE", default_value = DEFAULT_PACKAGE)]
    package: String,
    /// Host serving source archives for git refs
    #[arg(long, env = "HUB_ARCHIVE_HOST", default_value = DEFAULT_ARCHIVE_HOST)]
    archive_host: String,
    /// Organization owning the source repository
    #[arg(long, env = "HUB_ARCHIVE_ORG", default_value = DEFAULT_ARCHIVE_ORG)]
    archive_org: String,
    /// Source repository name
    #[arg(long, env = "HUB_ARCHIVE_PROJECT", default_value = DEFAULT_ARCHIVE_PROJECT)]
    archive_project: String,
    /// Log the pip command without running it
    #[arg(long, env = "HUB_DRY_RUN", default_value = "false")]
    dry_run: bool,
}

/// Defaults to info, `RUST_LOG` overrides.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

fn parse_version_spec(s: &str) -> Result<VersionSpec, String> {
    s.parse::<VersionSpec>().map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(log_filter(&env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default()))
        .with(fmt::Layer::default().with_writer(std::io::stderr).compact())
        .init();
    let args = Args::parse();
    match main_int(args).await {
        Ok(outcome) => {
            report(outcome);
            u8::try_from(outcome.code())
                .map(ExitCode::from)
                .unwrap_or(ExitCode::FAILURE)
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn main_int(args: Args) -> anyhow::Result<InstallOutcome> {
    tracing::info!(name = APP_NAME, "Starting installer");
    tracing::info!(version = env!("CARGO_APP_VERSION"));
    tracing::info!(jupyterhub_version = %args.jupyterhub_version);
    tracing::info!(python = args.python);
    tracing::info!(package = args.package);
    tracing::info!(
        archive = format!("{}/{}/{}", args.archive_host, args.archive_org, args.archive_project)
    );
    tracing::info!(dry_run = args.dry_run);
    let cwd = env::current_dir()?;
    tracing::info!(cwd = cwd.display().to_string());

    let source = PackageSource {
        package: args.package,
        archive_host: args.archive_host,
        archive_org: args.archive_org,
        archive_project: args.archive_project,
    };
    let params = Params {
        spec: &args.jupyterhub_version,
        source: &source,
        python: &args.python,
        dry_run: args.dry_run,
    };
    installer::install(&SystemRunner, &params).await
}

fn report(outcome: InstallOutcome) {
    if Term::stderr().is_term() {
        let msg = match outcome {
            InstallOutcome::Completed => Color::Green.bold().paint("Finished").to_string(),
            InstallOutcome::Failed { code } => {
                format!("{} - exit code: {}", Color::Red.bold().paint("Failed"), code)
            }
        };
        eprintln!("{msg}");
        return;
    }
    match outcome {
        InstallOutcome::Completed => tracing::info!("Finished"),
        InstallOutcome::Failed { code } => tracing::error!(code, "Failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use clap::error::ErrorKind;
    use rstest::rstest;
    use serial_test::serial;

    use super::*;

    const ENV_VARS: [&str; 6] = [
        "JUPYTERHUB_VERSION",
        "HUB_PACKAGE",
        "HUB_ARCHIVE_HOST",
        "HUB_ARCHIVE_ORG",
        "HUB_ARCHIVE_PROJECT",
        "HUB_DRY_RUN",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            env::remove_var(name);
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    #[test]
    #[serial]
    fn test_args_defaults() {
        clear_env();
        let args = Args::try_parse_from([APP_NAME, "--jupyterhub-version", "git:abc123"]).unwrap();
        assert_eq!(args.jupyterhub_version, VersionSpec::Git("abc123".to_string()));
        assert_eq!(args.package, "jupyterhub");
        assert_eq!(args.archive_host, "github.com");
        assert_eq!(args.archive_org, "olaf-kucharski");
        assert_eq!(args.archive_project, "jupyterhub");
        assert!(!args.dry_run);
    }

    #[test]
    #[serial]
    fn test_args_rejects_empty_version() {
        clear_env();
        let res = Args::try_parse_from([APP_NAME, "--jupyterhub-version", ""]);
        assert!(res.is_err());
    }

    #[test]
    #[serial]
    fn test_args_version_from_env() {
        clear_env();
        env::set_var("JUPYTERHUB_VERSION", "git:abc123");
        let res = Args::try_parse_from([APP_NAME]);
        clear_env();

        let args = res.unwrap();
        assert_eq!(args.jupyterhub_version, VersionSpec::Git("abc123".to_string()));
    }

    #[test]
    #[serial]
    fn test_args_version_required() {
        clear_env();
        let err = Args::try_parse_from([APP_NAME]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    #[serial]
    fn test_args_source_from_env() {
        clear_env();
        env::set_var("JUPYTERHUB_VERSION", "1.2.3");
        env::set_var("HUB_PACKAGE", "notebook");
        env::set_var("HUB_DRY_RUN", "true");
        let res = Args::try_parse_from([APP_NAME]);
        clear_env();

        let args = res.unwrap();
        assert_eq!(args.jupyterhub_version, VersionSpec::Release("1.2.3".to_string()));
        assert_eq!(args.package, "notebook");
        assert!(args.dry_run);
    }

    #[rstest]
    #[case("", true)]
    #[case("info", true)]
    #[case("warn", false)]
    #[tokio::test]
    #[serial]
    async fn test_dry_run_logs_command(#[case] directives: &str, #[case] visible: bool) {
        clear_env();
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::registry().with(log_filter(directives)).with(
            fmt::Layer::default()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .compact(),
        );
        let _guard = tracing::subscriber::set_default(subscriber);
        let args =
            Args::try_parse_from([APP_NAME, "--jupyterhub-version", "4.0.0", "--dry-run"]).unwrap();

        let outcome = main_int(args).await.unwrap();

        assert_eq!(outcome, InstallOutcome::Completed);
        let logs = out.text();
        assert_eq!(logs.contains("jupyterhub==4.0.0"), visible, "{logs}");
        assert_eq!(logs.contains("Dry run"), visible, "{logs}");
    }
}
