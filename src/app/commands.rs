use super::*;
use crate::calc::{format_general, is_whitelisted};
use crate::orchestrator::{serverip_report, whoami_report};
use crate::surface::NavigationMode;
use crate::APP_VERSION;
use super::tabs::{SwapOutcome, TAB_COUNT};

const HISTORY_WINDOW: usize = 10;
const CAT_SEARCH_URI: &str = "https://www.google.com/search?q=funny+cats&tbm=isch";

type Handler = fn(&mut App, &str) -> Outcome;

pub(super) struct CommandSpec {
    pub(super) names: &'static [&'static str],
    pub(super) usage: &'static str,
    pub(super) summary: &'static str,
    handler: Handler,
}

pub(super) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        names: &["help"],
        usage: "help",
        summary: "this list",
        handler: cmd_help,
    },
    CommandSpec {
        names: &["home"],
        usage: "home",
        summary: "go to the new tab page",
        handler: cmd_home,
    },
    CommandSpec {
        names: &["google"],
        usage: "google something",
        summary: "search on Google",
        handler: cmd_google,
    },
    CommandSpec {
        names: &["yt"],
        usage: "yt video",
        summary: "search on YouTube",
        handler: cmd_youtube,
    },
    CommandSpec {
        names: &["wiki"],
        usage: "wiki something",
        summary: "open Wikipedia",
        handler: cmd_wiki,
    },
    CommandSpec {
        names: &["cat"],
        usage: "cat",
        summary: "pictures of cats",
        handler: cmd_cat,
    },
    CommandSpec {
        names: &["calc"],
        usage: "calc 2+3*4",
        summary: "evaluate arithmetic",
        handler: cmd_calc,
    },
    CommandSpec {
        names: &["time"],
        usage: "time",
        summary: "current time",
        handler: cmd_time,
    },
    CommandSpec {
        names: &["date"],
        usage: "date",
        summary: "current date",
        handler: cmd_date,
    },
    CommandSpec {
        names: &["duckduckgo"],
        usage: "duckduckgo [something]",
        summary: "open DuckDuckGo",
        handler: cmd_duckduckgo,
    },
    CommandSpec {
        names: &["new"],
        usage: "new https://...",
        summary: "open a URL",
        handler: cmd_new,
    },
    CommandSpec {
        names: &["dark"],
        usage: "dark",
        summary: "toggle dark mode",
        handler: cmd_dark,
    },
    CommandSpec {
        names: &["say"],
        usage: "say hello",
        summary: "popup",
        handler: cmd_say,
    },
    CommandSpec {
        names: &["clear", "clean"],
        usage: "clear / clean",
        summary: "wipe the terminal",
        handler: cmd_clear,
    },
    CommandSpec {
        names: &["about"],
        usage: "about",
        summary: "browser info",
        handler: cmd_about,
    },
    CommandSpec {
        names: &["reload"],
        usage: "reload",
        summary: "reload the page",
        handler: cmd_reload,
    },
    CommandSpec {
        names: &["back"],
        usage: "back",
        summary: "go back",
        handler: cmd_back,
    },
    CommandSpec {
        names: &["forward"],
        usage: "forward",
        summary: "go forward",
        handler: cmd_forward,
    },
    CommandSpec {
        names: &["echo"],
        usage: "echo something",
        summary: "repeat text",
        handler: cmd_echo,
    },
    CommandSpec {
        names: &["quit", "exit"],
        usage: "quit / exit",
        summary: "close the browser",
        handler: cmd_quit,
    },
    CommandSpec {
        names: &["arburarbustribiet"],
        usage: "arburarbustribiet",
        summary: "Arbur Arbustribiet!!!",
        handler: cmd_arbur,
    },
    CommandSpec {
        names: &["tormode"],
        usage: "tormode",
        summary: "enable privacy routing on the active tab",
        handler: cmd_tormode,
    },
    CommandSpec {
        names: &["untor"],
        usage: "untor",
        summary: "disable privacy routing on the active tab",
        handler: cmd_untor,
    },
    CommandSpec {
        names: &["whoami"],
        usage: "whoami",
        summary: "your public IP",
        handler: cmd_whoami,
    },
    CommandSpec {
        names: &["serverip"],
        usage: "serverip",
        summary: "server IPs of the 3 tabs",
        handler: cmd_serverip,
    },
    CommandSpec {
        names: &["historyten"],
        usage: "historyten",
        summary: "last 10 visited pages",
        handler: cmd_historyten,
    },
];

/// Splits a console line into a lower-cased verb and its argument.
///
/// The argument keeps its inner spacing; only the spaces separating it from
/// the verb are dropped.
pub(super) fn parse_command(line: &str) -> Option<(String, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (verb, arg) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim_start_matches(' ')),
        None => (line, ""),
    };
    Some((verb.to_lowercase(), arg))
}

pub(super) fn find_command(verb: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.names.iter().any(|name| *name == verb))
}

impl App {
    pub(super) fn execute_command(&mut self, line: &str) {
        let Some((verb, arg)) = parse_command(line) else {
            self.console.finish_block();
            return;
        };
        tracing::debug!(verb = %verb, "console command");
        let outcome = match find_command(&verb) {
            Some(spec) => (spec.handler)(self, arg),
            None => Outcome::Done(vec![
                format!("Unknown command: {}", line.trim()),
                "Try 'help'".to_string(),
            ]),
        };
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done(lines) => {
                for line in &lines {
                    self.console.print(line);
                }
                self.console.finish_block();
            }
            Outcome::Async(id) => {
                self.last_status = format!("{id} running");
            }
            Outcome::Cleared => {}
            Outcome::Quit => {
                self.should_quit = true;
            }
        }
    }
}

/// Replaces spaces with `sep`; no other escaping.
fn encode_query(query: &str, sep: char) -> String {
    query.replace(' ', &sep.to_string())
}

fn search_uri(base: &str, query_prefix: &str, query: &str) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}{query_prefix}{}", encode_query(query, '+'))
    }
}

fn cmd_help(_app: &mut App, _arg: &str) -> Outcome {
    let mut lines = vec!["Available commands:".to_string()];
    lines.extend(
        COMMANDS
            .iter()
            .map(|spec| format!("  {:<26}→ {}", spec.usage, spec.summary)),
    );
    Outcome::Done(lines)
}

fn cmd_home(app: &mut App, _arg: &str) -> Outcome {
    app.go_home();
    Outcome::silent()
}

fn cmd_google(app: &mut App, arg: &str) -> Outcome {
    app.navigate_active(&search_uri("https://www.google.com", "/search?q=", arg));
    Outcome::silent()
}

fn cmd_youtube(app: &mut App, arg: &str) -> Outcome {
    app.navigate_active(&search_uri(
        "https://www.youtube.com",
        "/results?search_query=",
        arg,
    ));
    Outcome::silent()
}

fn cmd_wiki(app: &mut App, arg: &str) -> Outcome {
    let base = app.config.wiki_base.trim_end_matches('/').to_string();
    let uri = if arg.is_empty() {
        base
    } else {
        format!("{base}/wiki/{}", encode_query(arg, '_'))
    };
    app.navigate_active(&uri);
    Outcome::silent()
}

fn cmd_duckduckgo(app: &mut App, arg: &str) -> Outcome {
    app.navigate_active(&search_uri("https://duckduckgo.com", "/?q=", arg));
    Outcome::silent()
}

fn cmd_cat(app: &mut App, _arg: &str) -> Outcome {
    app.navigate_active(CAT_SEARCH_URI);
    Outcome::silent()
}

fn cmd_new(app: &mut App, arg: &str) -> Outcome {
    if !arg.is_empty() {
        app.load_uri_smart(arg);
    }
    Outcome::silent()
}

fn cmd_calc(app: &mut App, arg: &str) -> Outcome {
    if arg.is_empty() {
        return Outcome::silent();
    }
    if !is_whitelisted(arg) {
        return Outcome::line("Error: invalid expression");
    }
    match app.evaluator.evaluate(arg) {
        Ok(value) => Outcome::line(format!("{arg} = {}", format_general(value))),
        Err(err) => {
            tracing::debug!(expr = arg, error = %err, "calc rejected");
            Outcome::line("Error: invalid expression")
        }
    }
}

fn cmd_time(_app: &mut App, _arg: &str) -> Outcome {
    Outcome::line(chrono::Local::now().format("%H:%M:%S").to_string())
}

fn cmd_date(_app: &mut App, _arg: &str) -> Outcome {
    Outcome::line(chrono::Local::now().format("%Y-%m-%d").to_string())
}

fn cmd_dark(app: &mut App, _arg: &str) -> Outcome {
    app.dark_mode = !app.dark_mode;
    if app.dark_mode {
        app.apply_dark_style_to_active();
    } else {
        app.pending_styles.clear();
    }
    Outcome::silent()
}

fn cmd_say(app: &mut App, arg: &str) -> Outcome {
    if !arg.is_empty() {
        app.show_alert(arg, format!("Message from {APP_NAME}"));
    }
    Outcome::silent()
}

fn cmd_arbur(app: &mut App, _arg: &str) -> Outcome {
    app.show_alert("Arbur Arbustribiet", "");
    Outcome::line("Arbur Arbustribiet")
}

fn cmd_about(_app: &mut App, _arg: &str) -> Outcome {
    Outcome::Done(vec![
        APP_NAME.to_string(),
        "Home-made browsing shell with a built-in terminal".to_string(),
        format!("v{APP_VERSION}"),
    ])
}

fn cmd_clear(app: &mut App, _arg: &str) -> Outcome {
    app.console.clear();
    Outcome::Cleared
}

fn cmd_reload(app: &mut App, _arg: &str) -> Outcome {
    app.reload();
    Outcome::silent()
}

fn cmd_back(app: &mut App, _arg: &str) -> Outcome {
    app.go_back();
    Outcome::silent()
}

fn cmd_forward(app: &mut App, _arg: &str) -> Outcome {
    app.go_forward();
    Outcome::silent()
}

fn cmd_echo(_app: &mut App, arg: &str) -> Outcome {
    if arg.is_empty() {
        Outcome::silent()
    } else {
        Outcome::line(arg)
    }
}

fn cmd_quit(_app: &mut App, _arg: &str) -> Outcome {
    Outcome::Quit
}

fn cmd_tormode(app: &mut App, _arg: &str) -> Outcome {
    let idx = app.tabs.active_index();
    let outcome = app.tabs.swap_mode(idx, NavigationMode::PrivacyRouted);
    swap_report(outcome, idx + 1, NavigationMode::PrivacyRouted)
}

fn cmd_untor(app: &mut App, _arg: &str) -> Outcome {
    let idx = app.tabs.active_index();
    let outcome = app.tabs.swap_mode(idx, NavigationMode::Normal);
    swap_report(outcome, idx + 1, NavigationMode::Normal)
}

/// Console lines for a `tormode`/`untor` request on tab `number`.
fn swap_report(outcome: SwapOutcome, number: usize, target: NavigationMode) -> Outcome {
    match (outcome, target) {
        (SwapOutcome::Swapped, NavigationMode::PrivacyRouted) => Outcome::Done(vec![
            format!("  PRIVACY MODE ENABLED ON TAB {number}"),
            "  WebRTC DISABLED.".to_string(),
            "  BE CAREFUL.".to_string(),
            "  DROP THE S FROM HTTPS:// ON .ONION SITES.".to_string(),
        ]),
        (SwapOutcome::Swapped, NavigationMode::Normal) => Outcome::Done(vec![
            format!("  PRIVACY MODE DISABLED ON TAB {number}"),
            "  Back to a normal session.".to_string(),
        ]),
        (SwapOutcome::AlreadyInMode, NavigationMode::PrivacyRouted) => {
            Outcome::line(format!("Tab {number} already has privacy routing enabled."))
        }
        (SwapOutcome::AlreadyInMode, NavigationMode::Normal) => Outcome::line(format!(
            "Tab {number} does not have privacy routing enabled."
        )),
        (SwapOutcome::NoSuchTab, _) => Outcome::line(format!("There is no tab {number}.")),
    }
}

fn cmd_whoami(app: &mut App, _arg: &str) -> Outcome {
    app.console.print("Querying public IP...");
    let lookup = Arc::clone(&app.lookup);
    let id = app.dispatcher.run(
        "whoami",
        move || whoami_report(lookup.as_ref()),
        |app: &mut App, line: String| {
            app.console.print(&line);
            app.console.finish_block();
        },
    );
    Outcome::Async(id)
}

fn cmd_serverip(app: &mut App, _arg: &str) -> Outcome {
    // Only the active tab is checked; background tabs may still be routed.
    if app.tabs.is_privacy_active(app.tabs.active_index()) {
        return Outcome::line("serverip is not available in privacy mode (for your safety).");
    }
    app.console
        .print(&format!("Resolving IPs for the {TAB_COUNT} tabs..."));
    let locations = app.tabs.locations();
    let resolver = Arc::clone(&app.resolver);
    let id = app.dispatcher.run(
        "serverip",
        move || serverip_report(&locations, resolver.as_ref()),
        |app: &mut App, lines: Vec<String>| {
            for line in &lines {
                app.console.print(line);
            }
            app.console.finish_block();
        },
    );
    Outcome::Async(id)
}

fn cmd_historyten(app: &mut App, _arg: &str) -> Outcome {
    if app.history.is_empty() {
        return Outcome::line("History is empty.");
    }
    let mut lines = vec!["Last visited pages:".to_string()];
    lines.extend(
        app.history
            .recent(HISTORY_WINDOW)
            .enumerate()
            .map(|(idx, uri)| format!("  {:>2}. {uri}", idx + 1)),
    );
    Outcome::Done(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_is_lowercased_and_argument_keeps_inner_spaces() {
        assert_eq!(
            parse_command("  GOOGLE   hello world  "),
            Some(("google".to_string(), "hello world"))
        );
        assert_eq!(parse_command("help"), Some(("help".to_string(), "")));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn every_verb_maps_to_one_entry() {
        let mut seen = std::collections::HashSet::new();
        for spec in COMMANDS {
            for name in spec.names {
                assert!(seen.insert(*name), "duplicate verb {name}");
                assert!(find_command(name).is_some());
            }
        }
        assert!(find_command("HELP").is_none());
        assert!(find_command("clean").is_some());
    }

    #[test]
    fn swap_reports_name_the_tab_and_outcome() {
        assert_eq!(
            swap_report(SwapOutcome::NoSuchTab, 7, NavigationMode::PrivacyRouted),
            Outcome::line("There is no tab 7.")
        );
        assert_eq!(
            swap_report(SwapOutcome::NoSuchTab, 7, NavigationMode::Normal),
            Outcome::line("There is no tab 7.")
        );
        assert_eq!(
            swap_report(SwapOutcome::AlreadyInMode, 2, NavigationMode::Normal),
            Outcome::line("Tab 2 does not have privacy routing enabled.")
        );
        assert!(matches!(
            swap_report(SwapOutcome::Swapped, 3, NavigationMode::PrivacyRouted),
            Outcome::Done(lines) if lines[0] == "  PRIVACY MODE ENABLED ON TAB 3"
        ));
    }

    #[test]
    fn search_queries_replace_spaces_only() {
        assert_eq!(
            search_uri("https://www.google.com", "/search?q=", "hello world"),
            "https://www.google.com/search?q=hello+world"
        );
        assert_eq!(
            search_uri("https://duckduckgo.com", "/?q=", ""),
            "https://duckduckgo.com"
        );
        assert_eq!(encode_query("Rust (lenguaje)", '_'), "Rust_(lenguaje)");
    }
}
