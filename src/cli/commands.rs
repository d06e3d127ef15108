use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `screen-guard` - time-window guard for restricted settings screens.
#[derive(Parser, Debug)]
#[command(name = "screen-guard")]
#[command(version)]
#[command(about = "Keeps restricted settings screens closed outside an allowed window.", long_about = None)]
pub struct Cli {
    /// Log at debug level (overridden by SCREEN_GUARD_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the policy, the current decision and component health
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the allowed window (HH:MM HH:MM)
    Window {
        start: String,
        end: String,
    },

    /// Require (or stop requiring) the charger during the window
    Charging {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Turn the guard on
    Enable,

    /// Turn the guard off
    Disable,

    /// Classify a screen signature without touching any device
    Classify {
        /// Package owning the screen
        #[arg(long)]
        package: String,

        /// Activity or fragment class name
        #[arg(long = "class")]
        class_name: Option<String>,

        /// Window title
        #[arg(long)]
        title: Option<String>,

        /// Visible node text (repeatable)
        #[arg(long = "text")]
        texts: Vec<String>,
    },

    /// Replay a JSON-lines recording of screens and events
    Replay {
        file: PathBuf,

        /// Wall-clock time the policy sees (HH:MM); defaults to now
        #[arg(long)]
        at: Option<String>,

        /// Pretend the device is charging
        #[arg(long)]
        charging: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn classify_collects_repeated_texts() {
        let cli = Cli::try_parse_from([
            "screen-guard",
            "classify",
            "--package",
            "com.android.settings",
            "--text",
            "Freedom",
            "--text",
            "Activate",
        ])
        .unwrap();
        match cli.command {
            Commands::Classify { texts, class_name, .. } => {
                assert_eq!(texts, ["Freedom", "Activate"]);
                assert!(class_name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn charging_accepts_on_off_only() {
        let cli = Cli::try_parse_from(["screen-guard", "charging", "off"]).unwrap();
        assert!(matches!(cli.command, Commands::Charging { state: Toggle::Off }));
        assert!(Cli::try_parse_from(["screen-guard", "charging", "maybe"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["screen-guard", "status", "--json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }
}
