use std::{env, process};

use getopts::{Matches, Options};
use url::Url;

use calshare_client::{Api, CalendarState, FilePasswords};
use calshare_core::StateId;

const LOG_ENV: &str = "CALSHARE_LOG";
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "s",
        "server",
        "Base URL of the calshare server [Default: http://127.0.0.1:8080]",
        "URL",
    );
    opts.optopt("i", "id", "Identifier of an existing calendar", "ID");
    opts.optopt("y", "year", "Year to display", "YEAR");
    opts.optopt(
        "w",
        "hide-weekend-colors",
        "Whether weekends are drawn without color",
        "BOOL",
    );
    opts.optmulti("d", "day", "Mark a day with a status label", "DATE=LABEL");
    opts.optopt(
        "p",
        "passwords",
        "File holding edit passwords [Default: calshare-passwords.json]",
        "FILE",
    );
    opts
}

fn fail(message: String) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn get<T>(matches: &Matches, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches.opt_get(name).unwrap_or_else(|err| {
        fail(format!("Provided value for option '{name}' is invalid: {err}"))
    })
}

#[tokio::main]
async fn main() {
    let opts = opts();
    let matches = opts
        .parse(env::args().skip(1))
        .unwrap_or_else(|err| fail(err.to_string()));

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        return;
    }

    env_logger::Builder::from_env(
        env_logger::Env::new().filter_or(LOG_ENV, "calshare_client=info"),
    )
    .init();

    let server = matches
        .opt_str("server")
        .unwrap_or_else(|| DEFAULT_SERVER.into());
    let server = Url::parse(&server).unwrap_or_else(|err| {
        fail(format!("Provided value for option 'server' is invalid: {err}"))
    });
    let id = get::<StateId>(&matches, "id");
    let year = get::<i32>(&matches, "year");
    let hide_weekend_colors = get::<bool>(&matches, "hide-weekend-colors");
    let passwords = matches
        .opt_str("passwords")
        .unwrap_or_else(|| "calshare-passwords.json".into());

    let days = matches
        .opt_strs("day")
        .into_iter()
        .map(|day| match day.split_once('=') {
            Some((date, label)) => (date.to_string(), label.to_string()),
            None => fail(format!("Day '{day}' is not of the form DATE=LABEL")),
        })
        .collect::<Vec<_>>();

    let mut state = CalendarState::new(Api::new(server), FilePasswords::open(passwords));
    state.open(id).await;

    if state.id().is_none() {
        fail("Could not open a calendar, see the log for details".into());
    }

    let saved = state
        .edit(|config| {
            if let Some(year) = year {
                config.selected_year = year;
            }
            if let Some(hide) = hide_weekend_colors {
                config.hide_weekend_colors = hide;
            }
            config.day_states.extend(days);
        })
        .await;

    if !saved && !state.has_edit_access() {
        log::warn!("Calendar is read-only from this client, edits were not saved");
    }

    match serde_json::to_string_pretty(state.config()) {
        Ok(json) => println!("{json}"),
        Err(err) => fail(format!("Failed to print calendar: {err}")),
    }

    if let Some(url) = state.share() {
        println!("{url}");
    }
}
