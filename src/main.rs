use clap::Parser;
use mdlstyle::catalog::Catalog;
use mdlstyle::cli::toml_config::TomlConfig;
use mdlstyle::cli::{format, Cli, Commands, OutputFormat, ShowFormat};
use mdlstyle::{discover, loader};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("\x1b[31merror\x1b[0m: {}", e);
    process::exit(2);
}

/// Settings are optional: a missing default file means "no overrides".
fn read_settings(path: &Path) -> TomlConfig {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return TomlConfig::default();
    }
    TomlConfig::from_file(path).unwrap_or_else(|e| fail(e))
}

fn settings_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            style,
            config,
            format: output_format,
            all,
        } => {
            let settings = read_settings(&config);
            let style_path = style.unwrap_or_else(|| settings.style_path(&settings_dir(&config)));
            let overrides = settings.overrides().unwrap_or_else(|e| fail(e));

            let rule_config = loader::load_file(&style_path).unwrap_or_else(|e| fail(e));
            let rule_config = loader::extend(rule_config, &overrides);

            let catalog = Catalog::builtin();
            catalog.warn_unknown(&rule_config);

            let rendered = if all {
                let resolved = catalog.resolve(&rule_config);
                match output_format {
                    ShowFormat::Pretty => Ok(format::pretty_resolved(&resolved)),
                    ShowFormat::Json => format::json_resolved(&resolved),
                    ShowFormat::Toml => format::toml_resolved(&resolved),
                }
            } else {
                match output_format {
                    ShowFormat::Pretty => Ok(format::pretty_config(&rule_config, &catalog)),
                    ShowFormat::Json => format::json_config(&rule_config),
                    ShowFormat::Toml => format::toml_config(&rule_config),
                }
            };
            print!("{}", rendered.unwrap_or_else(|e| fail(e)));
            if output_format == ShowFormat::Json {
                println!();
            }
        }
        Commands::Check {
            paths,
            config,
            format: output_format,
        } => {
            let settings = read_settings(&config);
            let files = discover::discover(&paths, &settings.mdlstyle.patterns)
                .unwrap_or_else(|e| fail(e));
            let result = discover::check_all(&files);

            match output_format {
                OutputFormat::Pretty => format::print_check_pretty(&result),
                OutputFormat::Json => {
                    println!("{}", format::json_check(&result).unwrap_or_else(|e| fail(e)))
                }
            }

            process::exit(if result.has_failures() { 1 } else { 0 });
        }
    }
}
