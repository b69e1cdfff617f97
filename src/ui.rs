// UI layer: one function per subcommand. Each collects its input, calls
// the `api` client behind a spinner, and renders the result to the
// terminal. Client errors already name their operation; failures in the
// steps around the client get the operation as context here.

use crate::api::{Client, EventKind, RunEvent};
use crate::source::SourceInput;
use crate::txtar::{Archive, File};
use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Options of `gp download`.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Extract into this directory instead of writing to stdout.
    pub dir: Option<PathBuf>,
    /// Overwrite existing files without asking.
    pub force: bool,
}

/// Compile and run, then replay the program output with its recorded
/// timing. With `as_json` the raw result is printed instead.
pub fn run(client: &Client, paths: &[PathBuf], as_json: bool) -> Result<()> {
    let src = read_source(paths).context("run")?;
    let result = with_spinner("Running...", || client.run(src))?;

    if as_json {
        return print_json(&result).context("result of run cannot encode as JSON");
    }

    if !result.errors.is_empty() {
        eprintln!("{}", result.errors);
        return Ok(());
    }

    let stdout = io::stdout();
    let stderr = io::stderr();
    replay_events(
        &result.events,
        &mut stdout.lock(),
        &mut stderr.lock(),
        thread::sleep,
    )
    .context("run")?;
    Ok(())
}

/// Format with gofmt, or goimports when `imports` is set.
pub fn format(client: &Client, paths: &[PathBuf], as_json: bool, imports: bool) -> Result<()> {
    let src = read_source(paths).context("format")?;
    let result = with_spinner("Formatting...", || client.format(src, imports))?;

    if as_json {
        return print_json(&result).context("result of format cannot encode as JSON");
    }

    if result.error.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(result.body.as_bytes()).context("format")?;
        if !result.body.ends_with('\n') {
            writeln!(stdout).context("format")?;
        }
    } else {
        eprintln!("{}", result.error);
    }
    Ok(())
}

/// Share and print the resulting URL, optionally opening it.
pub fn share(client: &Client, paths: &[PathBuf], open: bool) -> Result<()> {
    let src = read_source(paths).context("share")?;
    let shared = with_spinner("Sharing...", || client.share(src))?;
    info!(url = %shared, "shared snippet");

    if open {
        open_in_browser(shared.url.as_str()).context("share")?;
    }

    println!("{shared}");
    Ok(())
}

/// Download a snippet to stdout, or unpack it into `options.dir`.
pub fn download(
    client: &Client,
    hash_or_url: Option<String>,
    options: &DownloadOptions,
) -> Result<()> {
    let hash_or_url = match hash_or_url {
        Some(arg) => arg.trim().to_string(),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("download: cannot read hash or URL")?;
            input.trim().to_string()
        }
    };
    if hash_or_url.is_empty() {
        bail!("download: no hash or URL given");
    }

    let mut data = Vec::new();
    with_spinner("Downloading...", || client.download(&mut data, &hash_or_url))?;

    match &options.dir {
        None => {
            io::stdout().lock().write_all(&data).context("download")?;
            Ok(())
        }
        Some(dir) => {
            let mut confirm = |path: &Path| confirm_overwrite(path, options.force);
            extract(&data, &hash_or_url, dir, &mut confirm, &mut io::stdout())
                .context("download")?;
            Ok(())
        }
    }
}

/// Print the toolchain version used by the playground.
pub fn version(client: &Client) -> Result<()> {
    let result = client.version()?;
    println!("Version: {}", result.version);
    println!("Release: {}", result.release);
    println!("Name: {}", result.name);
    Ok(())
}

/// Turn command-line paths into one source payload: stdin when empty, the
/// file itself for one path, a txtar bundle for several.
///
/// Everything is read into memory here, before any spinner starts.
pub fn read_source(paths: &[PathBuf]) -> Result<SourceInput> {
    read_source_from(paths, io::stdin())
}

fn read_source_from(paths: &[PathBuf], mut stdin: impl Read) -> Result<SourceInput> {
    match paths {
        [] => {
            debug!("reading source from stdin");
            let mut data = Vec::new();
            stdin
                .read_to_end(&mut data)
                .context("cannot read source from stdin")?;
            Ok(SourceInput::Bytes(data))
        }
        [path] => {
            let data = fs::read(path)
                .with_context(|| format!("cannot read file ({})", path.display()))?;
            Ok(SourceInput::Bytes(data))
        }
        many => {
            let mut archive = Archive::default();
            for path in many {
                let data = fs::read(path)
                    .with_context(|| format!("cannot read file ({})", path.display()))?;
                archive.files.push(File {
                    name: archive_name(path),
                    data,
                });
            }
            debug!(files = archive.files.len(), "bundled sources");
            Ok(SourceInput::Bytes(archive.format()))
        }
    }
}

/// Slash-separated, `.`-free name of `path` inside a bundle.
fn archive_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            Component::RootDir => Some(String::new()),
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Write run events in order, waiting each event's delay first.
pub fn replay_events(
    events: &[RunEvent],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    mut sleep: impl FnMut(Duration),
) -> io::Result<()> {
    for event in events {
        sleep(event.delay);
        let sink: &mut dyn Write = match &event.kind {
            EventKind::Stdout => &mut *stdout,
            EventKind::Stderr => &mut *stderr,
            EventKind::Other(kind) => {
                debug!(kind = kind.as_str(), "skipping event");
                continue;
            }
        };
        sink.write_all(event.message.as_bytes())?;
        sink.flush()?;
    }
    Ok(())
}

/// Unpack downloaded source into `dir`.
///
/// A plain program is written as a single file named after the hash or
/// URL. An archive is written member by member, with a non-empty comment
/// becoming `prog.go`. `confirm` decides about existing files.
pub fn extract(
    data: &[u8],
    hash_or_url: &str,
    dir: &Path,
    confirm: &mut dyn FnMut(&Path) -> Result<bool>,
    progress: &mut dyn Write,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let mut archive = Archive::parse(data);
    if archive.files.is_empty() {
        let path = dir.join(download_file_name(hash_or_url));
        write_file(&path, data, confirm)?;
        return Ok(vec![path]);
    }

    if !archive.comment.iter().all(u8::is_ascii_whitespace) {
        let comment = std::mem::take(&mut archive.comment);
        archive.files.insert(
            0,
            File {
                name: "prog.go".to_string(),
                data: comment,
            },
        );
    }

    let mut written = Vec::with_capacity(archive.files.len());
    for file in &archive.files {
        let path = member_path(dir, &file.name)?;
        write!(progress, "output {} ... ", path.display())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        write_file(&path, &file.data, confirm)?;
        writeln!(progress, "ok")?;
        written.push(path);
    }
    Ok(written)
}

/// File name for a single-file download: last path segment of the hash or
/// URL, with `.go` appended when missing.
fn download_file_name(hash_or_url: &str) -> String {
    let base = match Url::parse(hash_or_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string(),
        Err(_) => hash_or_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
    };
    match base.as_str() {
        "" | "." | ".." => "prog.go".to_string(),
        name if name.ends_with(".go") => name.to_string(),
        name => format!("{name}.go"),
    }
}

fn member_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        bail!("refusing to write {name:?} outside {}", dir.display());
    }
    Ok(dir.join(relative))
}

fn write_file(path: &Path, data: &[u8], confirm: &mut dyn FnMut(&Path) -> Result<bool>) -> Result<()> {
    if path.exists() && !confirm(path)? {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, data).with_context(|| format!("cannot write {}", path.display()))
}

fn confirm_overwrite(path: &Path, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} exists. Overwrite?", path.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Show a spinner on stderr while `work` runs. Hidden when stderr is not a
/// terminal so piped output stays clean.
fn with_spinner<T>(message: &'static str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if io::stderr().is_terminal() {
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
    } else {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    }
    let out = work();
    spinner.finish_and_clear();
    out
}

fn open_in_browser(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    let status = command
        .arg(url)
        .status()
        .with_context(|| format!("cannot open {url} in a browser"))?;
    if !status.success() {
        bail!("cannot open {url} in a browser: {status}");
    }
    Ok(())
}
