use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::process::ExitCode;

use ccenv::{
    commands, doctor,
    paths::Paths,
    prompt::InquirePrompter,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "ccenv")]
#[command(about = "Claude Code environment switcher - manage provider endpoint profiles")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all stored profiles
    List,

    /// Create a new profile interactively
    Add {
        /// Name of the profile to create (prompted for when omitted)
        name: Option<String>,
    },

    /// Modify an existing profile interactively
    Update {
        /// Name of the profile to update (prompted for when omitted)
        name: Option<String>,
    },

    /// Activate a profile through the current mode's channel
    Use {
        /// Name of the profile to activate
        name: String,

        /// Also write the env into your shell startup file (env mode only)
        #[arg(long)]
        permanent: bool,
    },

    /// Launch Claude Code with a profile's env, skipping permission prompts
    Start {
        /// Name of the profile to launch with
        name: String,

        /// Extra arguments passed through to claude
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Launch Claude Code with a profile's env, permission prompts intact
    SafeStart {
        /// Name of the profile to launch with
        name: String,

        /// Extra arguments passed through to claude
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Delete a stored profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Name of the profile to delete
        name: String,
    },

    /// Show the active mode, source, and matched profile
    Current {
        /// Print secret values in full instead of masked
        #[arg(long)]
        show_secret: bool,
    },

    /// Show or change the activation mode (settings | env)
    Mode {
        /// New mode; omit to display the current one
        value: Option<String>,
    },

    /// Print the active env in a shell-loadable syntax
    Env {
        /// Output format: sh, fish, powershell, dotenv
        #[arg(default_value = "sh")]
        format: String,
    },

    /// Open the profile registry in your editor
    Edit,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },

    /// Run diagnostics on the ccenv setup
    Doctor,
}

fn run(cli: Cli, ui: &Ui) -> Result<i32> {
    let paths = Paths::new()?;
    let mut prompter = InquirePrompter;

    match cli.command {
        Commands::List => commands::list(&paths, ui)?,
        Commands::Add { name } => commands::add(&paths, name.as_deref(), ui, &mut prompter)?,
        Commands::Update { name } => commands::update(&paths, name.as_deref(), ui, &mut prompter)?,
        Commands::Use { name, permanent } => {
            commands::use_profile(&paths, &name, permanent, ui, &mut prompter)?
        }
        Commands::Start { name, args } => {
            return commands::start(&paths, &name, &args, true, ui);
        }
        Commands::SafeStart { name, args } => {
            return commands::start(&paths, &name, &args, false, ui);
        }
        Commands::Remove { name } => commands::remove(&paths, &name, ui)?,
        Commands::Current { show_secret } => commands::current(&paths, show_secret, ui)?,
        Commands::Mode { value } => commands::mode(&paths, value.as_deref(), ui)?,
        Commands::Env { format } => commands::env_output(&paths, &format, ui)?,
        Commands::Edit => commands::edit(&paths, ui)?,
        Commands::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ccenv", &mut std::io::stdout());
        }
        Commands::Doctor => doctor::run_doctor(&paths, ui),
    }
    Ok(0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui::new(cli.color, cli.no_color);

    match run(cli, &ui) {
        // Launched children hand their exit code back through here
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            ui.err(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
