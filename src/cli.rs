use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rpm-consumer",
    version,
    about = "Run or schedule package-group installs and removals on Pulp consumers"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Config file (default: $HOME/.config/rpm-consumer/admin.toml)"
    )]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Server base url, e.g. https://pulp.example.com")]
    pub server: Option<String>,
    #[arg(short, long, global = true, help = "User for HTTP basic auth")]
    pub username: Option<String>,
    #[arg(short, long, global = true, help = "Password for HTTP basic auth")]
    pub password: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "package-group installation management")]
    PackageGroup {
        #[command(subcommand)]
        command: GroupCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    #[command(about = "run or schedule a package-group installation task")]
    Install {
        #[command(subcommand)]
        command: InstallCommands,
    },
    #[command(about = "run or schedule a package-group removal task")]
    Uninstall {
        #[command(subcommand)]
        command: UninstallCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstallCommands {
    #[command(about = "triggers an immediate package-group install on a consumer")]
    Run(InstallRunArgs),
    #[command(about = "manage consumer package-group install schedules")]
    Schedules {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UninstallCommands {
    #[command(about = "triggers an immediate package-group removal on a consumer")]
    Run(UninstallRunArgs),
    #[command(about = "manage consumer package-group uninstall schedules")]
    Schedules {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    #[arg(long, help = "identifies the consumer")]
    pub consumer_id: String,
    #[arg(
        short = 'n',
        long = "name",
        value_name = "GROUP",
        required = true,
        help = "package group name; may repeat for multiple groups"
    )]
    pub names: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InstallRunArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[arg(long, help = "transaction not committed")]
    pub no_commit: bool,
    #[arg(long, help = "reboot after successful transaction")]
    pub reboot: bool,
    #[arg(long, help = "import GPG keys as needed")]
    pub import_keys: bool,
}

#[derive(Args, Debug)]
pub struct UninstallRunArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[arg(long, help = "transaction not committed")]
    pub no_commit: bool,
    #[arg(long, help = "reboot after successful transaction")]
    pub reboot: bool,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    #[command(about = "list scheduled operations")]
    List {
        #[arg(long, help = "identifies the consumer")]
        consumer_id: String,
        #[arg(long, help = "if specified, all of the schedule information is displayed")]
        details: bool,
    },
    #[command(about = "adds a new scheduled operation")]
    Create {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(
            short = 's',
            long,
            help = "time to execute in ISO8601 format, e.g. 2012-03-01T13:00Z/P1D"
        )]
        schedule: String,
        #[arg(
            short = 'f',
            long,
            help = "number of failures before the schedule is automatically disabled"
        )]
        failure_threshold: Option<u32>,
    },
    #[command(about = "delete a schedule")]
    Delete {
        #[arg(long, help = "identifies the consumer")]
        consumer_id: String,
        #[arg(long, help = "identifies the schedule to delete")]
        schedule_id: String,
    },
    #[command(about = "updates an existing schedule")]
    Update {
        #[arg(long, help = "identifies the consumer")]
        consumer_id: String,
        #[arg(long, help = "identifies the schedule to update")]
        schedule_id: String,
        #[arg(short = 's', long, help = "new schedule in ISO8601 format")]
        schedule: Option<String>,
        #[arg(
            short = 'f',
            long,
            help = "number of failures before the schedule is automatically disabled"
        )]
        failure_threshold: Option<u32>,
        #[arg(long, value_name = "true|false", help = "enables or disables the schedule")]
        enabled: Option<bool>,
    },
    #[command(about = "displays the next scheduled run")]
    Next {
        #[arg(long, help = "identifies the consumer")]
        consumer_id: String,
        #[arg(long, help = "only output the next time without verbose messaging")]
        quiet: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn install_run_collects_repeated_names() {
        let cli = Cli::try_parse_from([
            "rpm-consumer",
            "package-group",
            "install",
            "run",
            "--consumer-id",
            "c1",
            "-n",
            "web",
            "--name",
            "db",
            "--import-keys",
        ])
        .unwrap();
        let Commands::PackageGroup {
            command:
                GroupCommands::Install {
                    command: InstallCommands::Run(args),
                },
        } = cli.command
        else {
            panic!("expected install run");
        };
        assert_eq!(args.target.consumer_id, "c1");
        assert_eq!(args.target.names, ["web", "db"]);
        assert!(args.import_keys);
        assert!(!args.no_commit);
        assert!(!args.reboot);
    }

    #[test]
    fn run_requires_a_group_name() {
        let err = Cli::try_parse_from([
            "rpm-consumer",
            "package-group",
            "uninstall",
            "run",
            "--consumer-id",
            "c1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn uninstall_has_no_import_keys() {
        let err = Cli::try_parse_from([
            "rpm-consumer",
            "package-group",
            "uninstall",
            "run",
            "--consumer-id",
            "c1",
            "-n",
            "web",
            "--import-keys",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn schedule_update_parses_enabled_flag_value() {
        let cli = Cli::try_parse_from([
            "rpm-consumer",
            "package-group",
            "install",
            "schedules",
            "update",
            "--consumer-id",
            "c1",
            "--schedule-id",
            "s1",
            "--enabled",
            "false",
        ])
        .unwrap();
        let Commands::PackageGroup {
            command:
                GroupCommands::Install {
                    command:
                        InstallCommands::Schedules {
                            command: ScheduleCommands::Update { enabled, .. },
                        },
                },
        } = cli.command
        else {
            panic!("expected schedules update");
        };
        assert_eq!(enabled, Some(false));
    }
}
