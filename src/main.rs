use blogindex::build::build_site;
use blogindex::config::Config;
use clap::{App, AppSettings, Arg, SubCommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the blog index page and feed")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory in (or above) which to search for blogindex.yaml [default: .]"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory into which the page and feed are written [default: _output]"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        let project = Path::new(matches.value_of("project").unwrap_or("."));
        let output = PathBuf::from(matches.value_of("output").unwrap_or("_output"));
        if let Err(err) = build(project, &output) {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn build(project: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    // canonicalize so the project file search can walk up past `.`
    let project = std::fs::canonicalize(project)?;
    let config = Config::from_directory(&project, output)?;
    build_site(config)?;
    Ok(())
}
