use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use tracing::{debug, info, instrument, warn};

use crate::alert::Notifier;
use crate::cli::Invocation;
use crate::config::Config;
use crate::controller::{Outcome, SyncController};
use crate::form::FormHandler;
use crate::html;
use crate::render::{Action, Group};
use crate::service::TaskService;
use crate::task::TaskId;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "list", "add", "toggle", "delete", "export", "page", "shell", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Which task a `toggle` or `delete` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Display index in the given list, as printed by `list`.
    Index(Group, usize),
    Id(TaskId),
}

pub fn parse_selector(args: &[String]) -> anyhow::Result<Selector> {
    let mut group = Group::Pending;
    let mut index = None;
    let mut id = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--completed" | "-c" => group = Group::Completed,
            "--id" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--id requires a task id"))?;
                id = Some(TaskId::new(value.clone()));
            }
            other => {
                if index.is_some() {
                    bail!("unexpected argument: {other}");
                }
                let n: usize = other
                    .parse()
                    .with_context(|| format!("expected a list number, got: {other}"))?;
                if n == 0 {
                    bail!("list numbers start at 1");
                }
                index = Some(n);
            }
        }
    }

    match (index, id) {
        (Some(_), Some(_)) => bail!("give either a list number or --id, not both"),
        (Some(n), None) => Ok(Selector::Index(group, n)),
        (None, Some(id)) => Ok(Selector::Id(id)),
        (None, None) => bail!("which task? give a list number or --id <ID>"),
    }
}

#[instrument(skip(controller, form, cfg, inv), fields(command = %inv.command))]
pub fn dispatch<S, N>(
    controller: &mut SyncController<S, N>,
    form: &mut FormHandler,
    cfg: &Config,
    inv: Invocation,
) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    debug!(args = ?inv.command_args, "dispatching command");

    match inv.command.as_str() {
        "list" => cmd_list(controller),
        "add" => cmd_add(controller, form, &inv.command_args),
        "toggle" => cmd_toggle(controller, &inv.command_args),
        "delete" => cmd_delete(controller, &inv.command_args),
        "export" => cmd_export(controller, cfg, &inv.command_args),
        "page" => cmd_page(controller, cfg, &inv.command_args),
        "shell" => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            run_shell(controller, form, cfg, stdin.lock(), prompt)
        }
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn require_load<S, N>(controller: &mut SyncController<S, N>) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    match controller.load() {
        Outcome::Applied => Ok(()),
        _ => bail!("tasks could not be loaded"),
    }
}

fn finish_change<S, N>(controller: &SyncController<S, N>, outcome: Outcome) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    match outcome {
        Outcome::Applied => controller.renderer().print_page(),
        Outcome::ReloadFailed => bail!("change was saved but the list could not be refreshed"),
        Outcome::Rejected => bail!("nothing was sent"),
        Outcome::Failed => bail!("the task service rejected the request"),
    }
}

#[instrument(skip(controller))]
fn cmd_list<S, N>(controller: &mut SyncController<S, N>) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command list");
    require_load(controller)?;
    controller.renderer().print_page()
}

#[instrument(skip(controller, form, args))]
fn cmd_add<S, N>(
    controller: &mut SyncController<S, N>,
    form: &mut FormHandler,
    args: &[String],
) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command add");

    if !args.is_empty() {
        form.set_input(args.join(" "));
    }
    let outcome = form.submit(controller);
    if outcome.is_applied() {
        println!("Created task.");
    } else if !form.input().trim().is_empty() {
        warn!(input = %form.input(), "task text kept for another attempt");
    }
    finish_change(controller, outcome)
}

/// Turns a selector into the control it addresses on a freshly loaded page.
fn resolve_action<S, N>(
    controller: &mut SyncController<S, N>,
    selector: &Selector,
    delete: bool,
) -> anyhow::Result<Action>
where
    S: TaskService,
    N: Notifier,
{
    require_load(controller)?;

    match selector {
        Selector::Index(group, index) => {
            let item = controller
                .renderer()
                .resolve(*group, *index)
                .ok_or_else(|| anyhow!("no task number {index} in the {group:?} list"))?;
            Ok(if delete {
                item.controls.delete.clone()
            } else {
                item.controls.toggle.clone()
            })
        }
        Selector::Id(id) => {
            let task = controller
                .snapshot()
                .find(id)
                .ok_or_else(|| anyhow!("no task with id {id}"))?;
            Ok(if delete {
                Action::Delete(task.id.clone())
            } else {
                Action::Toggle {
                    id: task.id.clone(),
                    completed: task.completed,
                }
            })
        }
    }
}

#[instrument(skip(controller, args))]
fn cmd_toggle<S, N>(controller: &mut SyncController<S, N>, args: &[String]) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command toggle");
    let selector = parse_selector(args)?;
    let action = resolve_action(controller, &selector, false)?;
    let outcome = controller.dispatch_action(&action);
    finish_change(controller, outcome)
}

#[instrument(skip(controller, args))]
fn cmd_delete<S, N>(controller: &mut SyncController<S, N>, args: &[String]) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command delete");
    let selector = parse_selector(args)?;
    let action = resolve_action(controller, &selector, true)?;
    let outcome = controller.dispatch_action(&action);
    finish_change(controller, outcome)
}

fn output_path(cfg: &Config, key: &str, args: &[String]) -> anyhow::Result<PathBuf> {
    match args {
        [] => cfg
            .get_path(key)
            .ok_or_else(|| anyhow!("{key} is not configured")),
        [path] => Ok(PathBuf::from(path)),
        _ => bail!("expected at most one output path"),
    }
}

#[instrument(skip(controller, cfg, args))]
fn cmd_export<S, N>(
    controller: &mut SyncController<S, N>,
    cfg: &Config,
    args: &[String],
) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command export");
    let path = output_path(cfg, "export.file", args)?;

    let Some(document) = controller.export() else {
        bail!("tasks could not be fetched for export");
    };
    document.write_to(&path)?;

    println!(
        "Exported {} pending and {} completed tasks to {}.",
        document.pending.len(),
        document.completed.len(),
        path.display()
    );
    Ok(())
}

#[instrument(skip(controller, cfg, args))]
fn cmd_page<S, N>(
    controller: &mut SyncController<S, N>,
    cfg: &Config,
    args: &[String],
) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
{
    info!("command page");
    let path = output_path(cfg, "page.file", args)?;

    require_load(controller)?;
    let document = html::render_document(controller.renderer().page())?;
    fs::write(&path, document).with_context(|| format!("failed writing {}", path.display()))?;

    println!("Wrote {}.", path.display());
    Ok(())
}

/// Reads one command per line against a single session. Errors are
/// reported and the loop carries on.
#[instrument(skip_all)]
pub fn run_shell<S, N, R>(
    controller: &mut SyncController<S, N>,
    form: &mut FormHandler,
    cfg: &Config,
    input: R,
    prompt: bool,
) -> anyhow::Result<()>
where
    S: TaskService,
    N: Notifier,
    R: BufRead,
{
    info!("command shell");

    if controller.load().is_applied() {
        controller.renderer().print_page()?;
    }

    let mut lines = input.lines();
    loop {
        if prompt {
            print!("> ");
            io::stdout().flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed reading command line")?;
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match word {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                form.reset();
                debug!("form cleared");
                continue;
            }
            _ => {}
        }

        let result = Invocation::from_tokens(cfg, &[word.to_string()]).and_then(|mut inv| {
            if inv.command == "shell" {
                bail!("already in the shell");
            }
            // Task text goes to the form as typed; bare `add` resubmits what it holds.
            if inv.command == "add" {
                if !rest.trim().is_empty() {
                    form.set_input(rest);
                }
            } else {
                inv.command_args = rest.split_whitespace().map(str::to_string).collect();
            }
            dispatch(controller, form, cfg, inv)
        });
        if let Err(err) = result {
            eprintln!("error: {err:#}");
        }
    }

    info!("shell finished");
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("checklist commands:");
    println!("  list                        show pending and completed tasks");
    println!("  add <text...>               create a pending task");
    println!("  toggle <n> [--completed]    flip task n of the pending (or completed) list");
    println!("  toggle --id <ID>            flip the task with that id");
    println!("  delete <n> [--completed]    delete task n of the pending (or completed) list");
    println!("  delete --id <ID>            delete the task with that id");
    println!("  export [path]               write all tasks to a JSON file");
    println!("  page [path]                 write the task page as HTML");
    println!("  shell                       read commands from stdin (also: reset, quit)");
    println!("  help | version");
    Ok(())
}
