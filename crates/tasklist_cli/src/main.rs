use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::path::Path;
use tasklist_cli::cli::{Cli, Command, collect_config_overrides};
use tasklist_cli::logging::init_logging;
use tasklist_cli::render;
use tasklist_core::config::{Palette, load_config_with_fallback, merge_overrides, palette_for_theme};
use tasklist_core::error::AppError;
use tasklist_core::model::{Task, TaskId};
use tasklist_core::persistence::{
    TaskPersistence, backup_file_name, export_to_text, read_import_file,
};
use tasklist_core::storage::FileStore;
use tasklist_core::TaskStore;
use time::{OffsetDateTime, UtcOffset};

struct Session {
    store: TaskStore<FileStore>,
    palette: Palette,
}

fn open_session(raw_overrides: &[String]) -> Result<Session, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "using default configuration");
    }

    let overrides = collect_config_overrides(raw_overrides)?;
    let config = merge_overrides(&loaded.config, &overrides);
    let file_store = match overrides.store_dir.as_deref() {
        Some(dir) if !dir.trim().is_empty() => FileStore::new(dir),
        _ => FileStore::open(loaded.config.store_dir.as_deref())?,
    };
    tracing::debug!(dir = %file_store.dir().display(), "opening task store");

    let mut store = TaskStore::initialize(TaskPersistence::new(file_store));
    if let Some(filter) = config.default_filter {
        store.set_filter(filter);
    }

    Ok(Session {
        store,
        palette: palette_for_theme(config.theme.as_deref()),
    })
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    let json = serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let json =
        serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn resolve(store: &TaskStore<FileStore>, raw: &str) -> Result<TaskId, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    store
        .resolve_id(raw)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn warn_unsaved(store: &TaskStore<FileStore>) {
    if let Some(err) = store.last_save_error() {
        eprintln!("WARNING: changes were not saved: {err}");
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_list(session: &Session, json: bool) -> Result<(), AppError> {
    let store = &session.store;
    let tasks = store.filtered_view();
    if json {
        return print_tasks_json(&tasks);
    }

    if tasks.is_empty() {
        let empty = render::empty_state(store.filter(), store.search());
        println!("{}", session.palette.accentize(empty.title));
        println!("{}", session.palette.mutedize(empty.description));
    } else {
        println!("{}", render::task_table(&tasks));
    }

    if let Some(summary) = render::summary_line(&store.statistics()) {
        println!("{}", session.palette.mutedize(&summary));
    }
    Ok(())
}

fn export_tasks(session: &Session, output: Option<&Path>, json: bool) -> Result<(), AppError> {
    let snapshot = session.store.export_snapshot();
    let text = export_to_text(&snapshot)?;

    if output == Some(Path::new("-")) {
        println!("{text}");
        return Ok(());
    }

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
            let today = OffsetDateTime::now_utc().to_offset(offset).date();
            backup_file_name(today)?.into()
        }
    };
    std::fs::write(&path, text)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "count": snapshot.len() })
        );
    } else {
        println!("Exported {} tasks to {}", snapshot.len(), path.display());
    }
    Ok(())
}

fn run_command(session: &mut Session, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add { text, priority } => {
            let text = text.unwrap_or_default();
            let task = session
                .store
                .add_with_priority(&text, priority.unwrap_or_default())
                .ok_or_else(|| AppError::invalid_input("text is required"))?;
            warn_unsaved(&session.store);
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        Command::Delete { id } => {
            let id = resolve(&session.store, &id)?;
            let task = session
                .store
                .delete(&id)
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            warn_unsaved(&session.store);
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.text, task.id);
            }
        }
        Command::Toggle { id } => {
            let id = resolve(&session.store, &id)?;
            let task = session
                .store
                .toggle(&id)
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            warn_unsaved(&session.store);
            if cli.json {
                print_task_json(&task)?;
            } else if task.completed {
                println!("Completed task: {} ({})", task.text, task.id);
            } else {
                println!("Reopened task: {} ({})", task.text, task.id);
            }
        }
        Command::Edit { id, new_text } => {
            let id = resolve(&session.store, &id)?;
            if new_text.trim().is_empty() {
                return Err(AppError::invalid_input("text is required"));
            }
            let (task, changed) = match session.store.update(&id, &new_text) {
                Some(task) => {
                    warn_unsaved(&session.store);
                    (task, true)
                }
                None => {
                    let task = session
                        .store
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| AppError::invalid_input("task not found"))?;
                    (task, false)
                }
            };
            if cli.json {
                print_task_json(&task)?;
            } else if changed {
                println!("Updated task: {} ({})", task.text, task.id);
            } else {
                println!("Task unchanged: {} ({})", task.text, task.id);
            }
        }
        Command::Priority { id, priority } => {
            let id = resolve(&session.store, &id)?;
            let task = match session.store.set_priority(&id, priority) {
                Some(task) => {
                    warn_unsaved(&session.store);
                    task
                }
                None => session
                    .store
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| AppError::invalid_input("task not found"))?,
            };
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!(
                    "Priority of {} ({}) is {}",
                    task.text,
                    task.id,
                    task.priority.as_str()
                );
            }
        }
        Command::ClearCompleted => {
            let removed = session.store.clear_completed();
            warn_unsaved(&session.store);
            if cli.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {removed} completed tasks");
            }
        }
        Command::ClearAll { yes } => {
            if !yes {
                return Err(AppError::invalid_input(
                    "clear-all removes every task; pass --yes to confirm",
                ));
            }
            let removed = session.store.clear_all();
            warn_unsaved(&session.store);
            if cli.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {removed} tasks");
            }
        }
        Command::List { filter, search } => {
            if let Some(filter) = filter {
                session.store.set_filter(filter);
            }
            if let Some(search) = search {
                session.store.set_search(search);
            }
            print_list(session, cli.json)?;
        }
        Command::Stats => {
            let stats = session.store.statistics();
            if cli.json {
                let json = serde_json::to_string(&stats)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                println!("{json}");
            } else {
                println!("{}", render::stats_text(&stats));
            }
        }
        Command::Filter { filter } => {
            session.store.set_filter(filter);
            println!("Filter: {filter}");
        }
        Command::Search { term } => {
            let term = term.unwrap_or_default();
            if term.is_empty() {
                println!("Search cleared");
            } else {
                println!("Search: {term}");
            }
            session.store.set_search(term);
        }
        Command::Export { output } => {
            export_tasks(session, output.as_deref(), cli.json)?;
        }
        Command::Import { path } => {
            let incoming = read_import_file(&path)?;
            let summary = session.store.import_merge(incoming);
            warn_unsaved(&session.store);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "imported": summary.imported,
                        "rekeyed": summary.rekeyed,
                        "skipped": summary.skipped,
                    })
                );
            } else {
                let mut notes = Vec::new();
                if summary.rekeyed > 0 {
                    notes.push(format!("{} given new ids", summary.rekeyed));
                }
                if summary.skipped > 0 {
                    notes.push(format!("{} blank skipped", summary.skipped));
                }
                if notes.is_empty() {
                    println!("Imported {} tasks", summary.imported);
                } else {
                    println!("Imported {} tasks ({})", summary.imported, notes.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut session = open_session(&[])?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklist".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!("WARNING: --config-override is ignored inside an interactive session");
        }

        if let Err(err) = run_command(&mut session, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Command::Filter { .. } | Command::Search { .. } = cli.command {
        eprintln!(
            "ERROR: {}",
            AppError::invalid_input(
                "filter and search only last for an interactive session; use list --filter/--search"
            )
        );
        std::process::exit(1);
    }

    let result = open_session(&cli.config_override)
        .and_then(|mut session| run_command(&mut session, cli));
    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
