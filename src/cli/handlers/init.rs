use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::project_io;

/// `my-errands` → `My Errands`
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(
    args: InitArgs,
    project_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = match project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!("Note: parent project found at {}/", parent_root.display());
        eprintln!("Creating new project in ./outline/");
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let project = project_io::init_project(&root, &name)?;
    println!(
        "Initialized outline project \"{}\" in {}/",
        project.config.project.name,
        project.outline_dir.display()
    );
    Ok(())
}
