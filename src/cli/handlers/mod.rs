mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::engine::{Engine, now_ms};
use crate::host::UniformRows;
use crate::io::config_io;
use crate::io::lock::{self, ProjectLock};
use crate::io::project_io::{self, ProjectError};
use crate::io::{history_io, store_io};
use crate::model::project::Project;
use crate::model::task::{Intent, Task};
use crate::ops::store::{find_task, resolve_id, sort_for_display};
use crate::ops::view;
use crate::util::unicode::char_len;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every command
pub struct Context {
    pub json: bool,
    pub project_dir: Option<PathBuf>,
    /// Subcommand name, recorded as the lock holder
    pub command: &'static str,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let project_dir = match &cli.project_dir {
        Some(dir) => Some(
            std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        ),
        None => None,
    };
    let ctx = Context {
        json: cli.json,
        project_dir,
        command: cli.command.name(),
    };

    match cli.command {
        // Init creates the project, so it skips discovery
        Commands::Init(args) => cmd_init(args, ctx.project_dir),

        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Config(args) => cmd_config(&ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Split(args) => cmd_split(&ctx, args),
        Commands::Merge(args) => cmd_merge(&ctx, args),
        Commands::Indent(args) => mutate_by_id(&ctx, &args.id, |e, id| e.indent(id)),
        Commands::Outdent(args) => mutate_by_id(&ctx, &args.id, |e, id| e.outdent(id)),
        Commands::Done(args) => {
            mutate_by_id(&ctx, &args.id, |e, id| e.toggle_completed(id, now_ms()))
        }
        Commands::Momentum(args) => {
            mutate_by_id(&ctx, &args.id, |e, id| e.toggle_momentum(id))
        }
        Commands::Intent(args) => cmd_intent(&ctx, args),
        Commands::Untag(args) => {
            let tag = args.tag;
            mutate_by_id(&ctx, &args.id, |e, id| e.remove_tag(id, &tag))
        }
        Commands::Archive(args) => {
            let archived = !args.undo;
            mutate_by_id(&ctx, &args.id, |e, id| e.set_archived(id, archived, now_ms()))
        }
        Commands::Rm(args) => mutate_by_id(&ctx, &args.id, |e, id| e.delete(id)),
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Undo => cmd_undo(&ctx),
    }
}

// ---------------------------------------------------------------------------
// Project plumbing
// ---------------------------------------------------------------------------

fn load_project_cwd(ctx: &Context) -> Result<Project, ProjectError> {
    let start = match &ctx.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let root = project_io::discover_project(&start)?;
    project_io::load_project(&root)
}

fn lock_project(ctx: &Context, project: &Project) -> Result<ProjectLock, lock::LockError> {
    ProjectLock::acquire(&project.outline_dir, ctx.command, lock::DEFAULT_WAIT)
}

fn open_engine(project: &Project) -> Engine {
    let loaded = store_io::load_tasks(&project.outline_dir, now_ms());
    if loaded.source == store_io::LoadSource::Backup {
        eprintln!("warning: tasks.json was unreadable, loaded tasks.backup.json");
    }
    let history = history_io::load_history(&project.outline_dir, project.config.undo.limit);
    Engine::with_history(loaded.tasks, history, project.config.clone())
}

fn save_engine(project: &Project, engine: Engine) -> CmdResult {
    let (tasks, undo) = engine.into_parts();
    store_io::save_tasks(&project.outline_dir, &tasks)?;
    history_io::save_history(&project.outline_dir, &undo)?;
    Ok(())
}

/// Load, lock, run one engine mutation, save if it changed anything, and
/// report the focus target it left behind.
fn mutate(
    ctx: &Context,
    f: impl FnOnce(&mut Engine) -> Result<bool, Box<dyn std::error::Error>>,
) -> CmdResult {
    let project = load_project_cwd(ctx)?;
    let _lock = lock_project(ctx, &project)?;
    let mut engine = open_engine(&project);

    let changed = f(&mut engine)?;
    let focus = engine.take_focus().map(|req| req.task_id);
    let task_json = focus
        .as_deref()
        .and_then(|id| find_task(engine.tasks(), id))
        .map(task_to_json);

    if changed {
        save_engine(&project, engine)?;
    }

    if ctx.json {
        let out = MutationJson {
            changed,
            focus,
            task: task_json,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !changed {
        eprintln!("no change");
    }
    Ok(())
}

fn mutate_by_id(
    ctx: &Context,
    id: &str,
    f: impl FnOnce(&mut Engine, &str) -> bool,
) -> CmdResult {
    mutate(ctx, |engine| {
        let id = resolve_id(engine.tasks(), id)?;
        Ok(f(engine, &id))
    })
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let project = load_project_cwd(ctx)?;
    let engine = open_engine(&project);
    let query = args.query.unwrap_or_default();
    let tokens = view::tokenize_query(&query);

    let matched: Vec<Task> = if args.momentum {
        view::momentum_tasks(engine.tasks())
            .into_iter()
            .filter(|(task, _)| view::matches(task, &tokens))
            .map(|(task, _)| task.clone())
            .collect()
    } else {
        view::filter_tasks(engine.tasks(), &query)
            .into_iter()
            .map(|(task, _)| task.clone())
            .collect()
    };
    let shown: Vec<&Task> = sort_for_display(&matched)
        .into_iter()
        .filter(|task| args.all || !task.archived)
        .collect();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&tasks_to_json(shown))?);
        return Ok(());
    }
    if view::is_tag_view(&tokens) {
        println!("tag view: {}", tokens.join(" "));
    }
    for task in shown {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArg) -> CmdResult {
    let project = load_project_cwd(ctx)?;
    let engine = open_engine(&project);
    let id = resolve_id(engine.tasks(), &args.id)?;
    let task =
        find_task(engine.tasks(), &id).ok_or_else(|| format!("task not found: {}", id))?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    } else {
        println!("{}", format_task_detail(task));
    }
    Ok(())
}

fn cmd_config(ctx: &Context, args: ConfigArgs) -> CmdResult {
    let project = load_project_cwd(ctx)?;
    match (args.key, args.value) {
        (None, _) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&project.config)?);
            } else {
                println!("{}", format_config(&project.config));
            }
        }
        (Some(key), None) => {
            let table = toml::Value::try_from(&project.config)?;
            let value = key
                .split('.')
                .try_fold(&table, |v, part| v.get(part))
                .ok_or_else(|| ProjectError::UnknownKey(key.clone()))?;
            match value {
                toml::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        (Some(key), Some(value)) => {
            let _lock = lock_project(ctx, &project)?;
            let (_, mut doc) = config_io::read_config(&project.outline_dir)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config(&project.outline_dir, &doc)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let text = args.text.join(" ");
    let mut created = None;
    mutate(ctx, |engine| {
        let id = engine
            .capture(&text, now_ms())
            .ok_or("nothing to add: no text or tags")?;
        created = Some(id);
        Ok(true)
    })?;
    if !ctx.json
        && let Some(id) = created
    {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let text = args.text.join(" ");
    mutate(ctx, |engine| {
        let id = resolve_id(engine.tasks(), &args.id)?;
        engine.start_editing(&id, None);
        engine.set_live_text(&text, char_len(&text));
        Ok(engine.commit())
    })
}

fn cmd_split(ctx: &Context, args: SplitArgs) -> CmdResult {
    let mut created = None;
    mutate(ctx, |engine| {
        let id = resolve_id(engine.tasks(), &args.id)?;
        engine.start_editing(&id, Some(args.cursor));
        if let Some(text) = &args.text {
            engine.set_live_text(text, args.cursor);
        }
        let changed = engine.enter(now_ms());
        created = engine.editing().map(|s| s.task_id.clone());
        Ok(changed)
    })?;
    if !ctx.json
        && let Some(id) = created
    {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_merge(ctx: &Context, args: MergeArgs) -> CmdResult {
    mutate(ctx, |engine| {
        let id = resolve_id(engine.tasks(), &args.id)?;
        if args.back {
            engine.start_editing(&id, Some(0));
            Ok(engine.backspace_at_start())
        } else {
            engine.start_editing(&id, None);
            Ok(engine.delete_at_end())
        }
    })
}

fn cmd_intent(ctx: &Context, args: IntentArgs) -> CmdResult {
    let intent = match args.intent.to_lowercase().as_str() {
        "none" | "-" => None,
        other => Some(
            Intent::parse(other).ok_or_else(|| {
                format!("invalid intent '{}': use now, soon, later or none", other)
            })?,
        ),
    };
    mutate_by_id(ctx, &args.id, |e, id| e.set_intent(id, intent))
}

/// Replays a pointer drag against a uniform synthetic layout: one
/// pointer-down, one move, one frame, pointer-up.
fn cmd_mv(ctx: &Context, args: MvArgs) -> CmdResult {
    mutate(ctx, |engine| {
        let id = resolve_id(engine.tasks(), &args.id)?;
        let drag = engine.config().drag.clone();
        if !engine.begin_drag(&id, 0.0) {
            return Err(format!("cannot drag archived task {}", short_id(&id)).into());
        }
        let layout = UniformRows {
            row_height: drag.row_height,
            rows: engine.tasks().len(),
        };
        let range = engine
            .dragging()
            .and_then(|s| s.current_range(engine.tasks()))
            .ok_or("drag lost its block")?;
        let last = engine.tasks().len().saturating_sub(1);
        let (row, fraction) = match (args.down, args.up) {
            (Some(n), _) => ((range.end - 1 + n).min(last), 0.75),
            (None, Some(n)) => (range.start.saturating_sub(n), 0.25),
            (None, None) => (range.start, 0.5),
        };
        let y = (row as f64 + fraction) * drag.row_height;
        let x = args.shift.unwrap_or(0) as f64 * drag.indent_width;

        engine.pointer_move(x, y);
        engine.frame(&layout);
        Ok(engine.end_drag())
    })
}

fn cmd_undo(ctx: &Context) -> CmdResult {
    let project = load_project_cwd(ctx)?;
    let _lock = lock_project(ctx, &project)?;
    let mut engine = open_engine(&project);

    let label = engine.undo_stack().peek_last().map(|a| a.label().to_string());
    let undone = engine.undo();
    let focus = engine.take_focus();
    let remaining = engine.undo_stack().len();
    if undone {
        save_engine(&project, engine)?;
    }

    if ctx.json {
        let out = UndoJson {
            undone: label.filter(|_| undone),
            remaining,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if undone {
        let target = focus.map(|f| short_id(&f.task_id).to_string()).unwrap_or_default();
        println!("undid {} {}", label.unwrap_or_default(), target);
    } else {
        eprintln!("nothing to undo");
    }
    Ok(())
}
