mod app;
mod core;
mod effect;
mod event_emitter;
mod hotkey;
mod ipc;
mod macos;
mod platform;
mod prefs;
mod supervisor;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use hoist_ipc::{split_list, Command, DisableKey, EventFilter, Response, SettingChange};
use ipc::IpcClient;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hoist - launcher and supervisor for the hoist-agent window-raise helper
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Status(StatusCmd),
    Settings(SettingsCmd),
    Toggle(ToggleCmd),
    Enable(EnableCmd),
    Disable(DisableCmd),
    Set(SetCmd),
    Bind(BindCmd),
    Unbind(UnbindCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Run the hoist daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Show whether the worker is running, plus the current settings
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// Show the current settings
#[derive(FromArgs)]
#[argh(subcommand, name = "settings")]
struct SettingsCmd {}

/// Start the worker if stopped, stop it if running
#[derive(FromArgs)]
#[argh(subcommand, name = "toggle")]
struct ToggleCmd {}

/// Start the worker
#[derive(FromArgs)]
#[argh(subcommand, name = "enable")]
struct EnableCmd {}

/// Stop the worker
#[derive(FromArgs)]
#[argh(subcommand, name = "disable")]
struct DisableCmd {}

/// Change a setting (the worker restarts if it is running)
#[derive(FromArgs)]
#[argh(subcommand, name = "set")]
struct SetCmd {
    /// setting name: raise-delay, focus-delay, mouse-delta, poll-interval,
    /// warp, cursor-scaling, alt-task-switcher, start-on-launch,
    /// ignore-space-changed, ignore-apps, stay-focused, disable-key
    #[argh(positional)]
    setting: String,
    /// new value; lists are comma-delimited
    #[argh(positional)]
    value: String,
}

/// Bind a global hotkey to toggle (e.g., cmd-shift-r)
#[derive(FromArgs)]
#[argh(subcommand, name = "bind")]
struct BindCmd {
    /// hotkey combo
    #[argh(positional)]
    key: String,
}

/// Remove the global hotkey
#[derive(FromArgs)]
#[argh(subcommand, name = "unbind")]
struct UnbindCmd {}

/// Stream service events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// print a snapshot of the current state first
    #[argh(switch)]
    snapshot: bool,
    /// only lifecycle events (started/stopped)
    #[argh(switch)]
    service: bool,
    /// only settings change events
    #[argh(switch)]
    settings: bool,
}

/// Quit the hoist daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["hoist", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            // Start daemon
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("hoist starting");
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("hoist {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => {
            let filter = if cmd.service || cmd.settings {
                Some(EventFilter {
                    service: cmd.service,
                    settings: cmd.settings,
                })
            } else {
                None
            };
            ipc::subscribe_and_print(cmd.snapshot, filter)
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Status { status } => {
            println!(
                "Worker: {}",
                if status.running { "running" } else { "stopped" }
            );
            print_settings(&status.settings, &status.view);
        }
        Response::Settings { settings, view } => {
            print_settings(&settings, &view);
        }
    }

    Ok(())
}

fn print_settings(settings: &hoist_ipc::SettingsInfo, view: &hoist_ipc::SettingsView) {
    println!("{}", view.raise_delay_label);
    println!("{}", view.focus_delay_label);
    println!("{}", view.poll_interval_label);
    println!("Mouse delta: {} px", settings.mouse_delta_px);
    println!(
        "Warp: {}{}",
        on_off(settings.warp_enabled),
        if settings.warp_enabled {
            format!(
                " (cursor scaling: {}, alt task switcher: {})",
                on_off(settings.cursor_scaling_enabled),
                on_off(settings.alt_task_switcher_enabled)
            )
        } else {
            String::new()
        }
    );
    println!("Start on launch: {}", on_off(settings.start_on_launch));
    println!(
        "Ignore space changes: {}",
        on_off(settings.ignore_space_changed)
    );
    println!("Ignored apps: {}", list_or_none(&settings.ignored_apps));
    println!(
        "Stay-focused bundle ids: {}",
        list_or_none(&settings.stay_focused_bundle_ids)
    );
    println!("Disable key: {}", settings.disable_key);
    println!("Hotkey: {}", view.hotkey_label);
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Status(_) => Ok(Command::Status),
        SubCommand::Settings(_) => Ok(Command::GetSettings),
        SubCommand::Toggle(_) => Ok(Command::Toggle),
        SubCommand::Enable(_) => Ok(Command::Enable),
        SubCommand::Disable(_) => Ok(Command::Disable),
        SubCommand::Set(cmd) => Ok(Command::Set {
            change: parse_setting_change(&cmd.setting, &cmd.value)?,
        }),
        SubCommand::Bind(cmd) => Ok(Command::Bind { key: cmd.key }),
        SubCommand::Unbind(_) => Ok(Command::Unbind),
        SubCommand::Quit(_) => Ok(Command::Quit),
    }
}

fn parse_setting_change(setting: &str, value: &str) -> Result<SettingChange> {
    let number = || -> Result<i64> {
        value
            .parse()
            .with_context(|| format!("Invalid number for {}: {:?}", setting, value))
    };

    match setting {
        "raise-delay" => Ok(SettingChange::RaiseDelayMs(number()?)),
        "focus-delay" => Ok(SettingChange::FocusDelayMs(number()?)),
        "mouse-delta" => Ok(SettingChange::MouseDeltaPx(number()?)),
        "poll-interval" => Ok(SettingChange::PollIntervalMs(number()?)),
        "warp" => Ok(SettingChange::WarpEnabled(parse_bool(value)?)),
        "cursor-scaling" => Ok(SettingChange::CursorScalingEnabled(parse_bool(value)?)),
        "alt-task-switcher" => Ok(SettingChange::AltTaskSwitcherEnabled(parse_bool(value)?)),
        "start-on-launch" => Ok(SettingChange::StartOnLaunch(parse_bool(value)?)),
        "ignore-space-changed" => Ok(SettingChange::IgnoreSpaceChanged(parse_bool(value)?)),
        "ignore-apps" => Ok(SettingChange::IgnoredApps(split_list(value))),
        "stay-focused" => Ok(SettingChange::StayFocusedBundleIds(split_list(value))),
        "disable-key" => DisableKey::parse(value)
            .map(SettingChange::DisableKey)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown disable key: {} (use control, option, command, shift)", value)
            }),
        _ => bail!("Unknown setting: {}", setting),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => bail!("Expected on/off, got {:?}", s),
    }
}
