//! Main CLI application

use crate::config::{parse_config_auto, parse_config_file, validate_config, Config};
use crate::error::BatonError;
use crate::runner::{Context, Pipeline, StepRegistry, Verbosity};
use crate::ui;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// A loaded and validated pipeline file
pub struct App {
    /// Parsed configuration
    config: Config,
    /// Config file path
    config_path: PathBuf,
    registry: StepRegistry,
}

impl App {
    /// Load the pipeline file found by searching upward from the current directory
    pub fn new() -> Result<Self, BatonError> {
        let (config, config_path) = parse_config_auto()?;
        Self::from_parts(config, config_path)
    }

    /// Load a specific pipeline file
    pub fn with_config_file(path: PathBuf) -> Result<Self, BatonError> {
        let config = parse_config_file(&path)?;
        Self::from_parts(config, path)
    }

    fn from_parts(config: Config, config_path: PathBuf) -> Result<Self, BatonError> {
        validate_config(&config)?;
        Ok(App {
            config,
            config_path,
            registry: StepRegistry::with_builtins(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build every action, reporting what would run
    pub fn check(&self) -> Result<String, BatonError> {
        let pipeline = Pipeline::from_config(&self.config, &self.registry)?;
        let actions: usize = pipeline.tasks.iter().map(|t| t.action_ids().count()).sum();
        Ok(format!(
            "{}: {} tasks, {} actions, ok",
            self.config_path.display(),
            pipeline.tasks.len(),
            actions
        ))
    }

    /// Tasks and their actions in run order
    pub fn list(&self) -> String {
        let mut lines = Vec::new();
        if let Some(usage) = &self.config.usage {
            lines.push(usage.clone());
        }
        for task in &self.config.tasks {
            match &task.description {
                Some(desc) => lines.push(format!("{}  {}", task.id, desc)),
                None => lines.push(task.id.clone()),
            }
            for action in task.all_actions() {
                lines.push(format!("  {} ({})", action.id, action.step_type));
            }
        }
        lines.join("\n")
    }

    /// Run the whole pipeline
    ///
    /// `extra_vars` override variables from the file. Returns the final run
    /// context as YAML when `dump` is set.
    pub fn run(
        &self,
        extra_vars: HashMap<String, String>,
        verbosity: Verbosity,
        dump: bool,
    ) -> Result<Option<String>, BatonError> {
        let mut pipeline = Pipeline::from_config(&self.config, &self.registry)?;

        let vars: HashMap<String, String> = self
            .config
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut ctx = Context::new()
            .with_config_path(self.config_path.clone())
            .with_vars(vars);
        for (key, value) in extra_vars {
            ctx.set_var(key, value);
        }
        ctx.working_dir = ctx.working_dir.join(ctx.config_dir());

        // Set interpreter if specified in config
        if let Some(interpreter) = &self.config.interpreter {
            ctx = ctx.with_interpreter(interpreter.clone());
        }

        let run_context = ctx.ensure_run_context();
        let result = pipeline.run(&mut ctx);
        ui::print_summary(&pipeline.summary(), verbosity);
        result?;

        if dump {
            return Ok(Some(serde_yaml::to_string(&run_context.to_value())?));
        }
        Ok(None)
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("baton")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run YAML pipelines whose steps pass outputs to each other")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to baton.yml pipeline file")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run every task in order")
                .arg(
                    Arg::new("var")
                        .long("var")
                        .value_name("KEY=VALUE")
                        .help("Set a variable, overriding the pipeline file")
                        .value_parser(parse_var)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .help("Print all published outputs as YAML after the run")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("check").about("Validate the pipeline without running it"))
        .subcommand(Command::new("list").about("List tasks and their actions"))
        .subcommand(Command::new("steps").about("List available step types"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(clap::value_parser!(Shell)),
                ),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Parse a `KEY=VALUE` pair
fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn load_app(matches: &ArgMatches) -> Result<App, BatonError> {
    match matches.get_one::<PathBuf>("file") {
        Some(path) => App::with_config_file(path.clone()),
        None => App::new(),
    }
}

/// Run the CLI application with process arguments
pub fn run() -> Result<(), BatonError> {
    run_from(std::env::args_os())
}

/// Run the CLI application with the given arguments
pub fn run_from<I, T>(args: I) -> Result<(), BatonError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    let verbosity = get_verbosity(&matches);
    ui::init_logging(verbosity);

    match matches.subcommand() {
        Some(("run", sub)) => {
            let vars: HashMap<String, String> = sub
                .get_many::<(String, String)>("var")
                .map(|pairs| pairs.cloned().collect())
                .unwrap_or_default();
            let app = load_app(&matches)?;
            if let Some(dump) = app.run(vars, verbosity, sub.get_flag("dump"))? {
                print!("{}", dump);
            }
        }
        Some(("check", _)) => println!("{}", load_app(&matches)?.check()?),
        Some(("list", _)) => println!("{}", load_app(&matches)?.list()),
        Some(("steps", _)) => {
            for name in StepRegistry::with_builtins().step_types() {
                println!("{}", name);
            }
        }
        Some(("completions", sub)) => {
            if let Some(shell) = sub.get_one::<Shell>("shell") {
                clap_complete::generate(*shell, &mut build_command(), "baton", &mut io::stdout());
            }
        }
        _ => build_command().print_help()?,
    }

    Ok(())
}
