use anyhow::{anyhow, Context, Result};
use arch_editor::EditorContext;
use arch_tree::ArchConfig;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Markup file, or a directory to search for .html files
    pub path: PathBuf,

    /// Keep virtual nodes (as U+FEFF) and layout spaces (as newlines)
    #[arg(long)]
    pub keep_virtual: bool,

    /// Only report files that are not normalized; fails if any
    #[arg(long)]
    pub check: bool,
}

pub fn normalize(args: NormalizeArgs, config: &ArchConfig) -> Result<()> {
    let files = find_markup_files(&args.path)?;
    if files.is_empty() {
        println!("{}", "⚠️  No markup files found".yellow());
        return Ok(());
    }

    if !args.check {
        let show_headers = files.len() > 1;
        for file in &files {
            let source = fs::read_to_string(file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let output = normalize_source(config, &source, args.keep_virtual)
                .with_context(|| format!("Cannot normalize {}", file.display()))?;
            if show_headers {
                println!("{}", format!("==> {} <==", file.display()).dimmed());
            }
            println!("{}", output);
        }
        return Ok(());
    }

    let mut changed = 0;
    for file in &files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("Cannot read {}", file.display()))?;
        match normalize_source(config, &source, false) {
            Ok(output) if output == source.trim_end() => {
                println!("  {} {}", "✓".green(), file.display());
            }
            Ok(_) => {
                changed += 1;
                println!("  {} {} {}", "✗".red(), file.display(), "(not normalized)".dimmed());
            }
            Err(err) => {
                changed += 1;
                eprintln!("  {} {} - {}", "✗".red(), file.display(), err.to_string().red());
            }
        }
    }

    println!();
    if changed > 0 {
        return Err(anyhow!("{} of {} files are not normalized", changed, files.len()));
    }
    println!("{} {} files already normalized", "✅".green(), files.len());
    Ok(())
}

/// Parse, protect and serialize `source` the way an editing session would.
pub fn normalize_source(config: &ArchConfig, source: &str, keep_virtual: bool) -> Result<String> {
    let context = EditorContext::from_markup(config.clone(), source)?;
    Ok(context.markup(keep_virtual))
}

fn find_markup_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", path.display()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("html") | Some("htm")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let output = normalize_source(&ArchConfig::default(), "<p>a   b</p>\n<p></p>", false).unwrap();
        assert_eq!(output, "<p>a b</p><p><br></p>");
    }

    #[test]
    fn test_normalize_keeps_virtual_markers() {
        let output = normalize_source(&ArchConfig::default(), "<p>x</p>", true).unwrap();
        assert!(output.contains('\n'));
        assert!(output.contains("<p>x</p>"));
    }

    #[test]
    fn test_malformed_markup_is_reported() {
        assert!(normalize_source(&ArchConfig::default(), "<p>x</p></div>", false).is_err());
    }

    #[test]
    fn test_finds_html_files_recursively() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();
        fs::write(dir.path().join("nested/b.htm"), "<p>b</p>").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let files = find_markup_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().is_some_and(|e| e != "txt")));
    }

    #[test]
    fn test_check_fails_on_unnormalized_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("clean.html"), "<p>a</p>\n").unwrap();
        let clean = NormalizeArgs {
            path: dir.path().to_path_buf(),
            keep_virtual: false,
            check: true,
        };
        assert!(normalize(clean, &ArchConfig::default()).is_ok());

        fs::write(dir.path().join("dirty.html"), "<p>a  b</p>").unwrap();
        let dirty = NormalizeArgs {
            path: dir.path().to_path_buf(),
            keep_virtual: false,
            check: true,
        };
        assert!(normalize(dirty, &ArchConfig::default()).is_err());
    }
}
