//! Runs the shell commands configured under `test` in package and monorepo
//! files.

use crate::error::{Result, ShoreError};
use crate::model::Subject;
use crate::ui;
use crate::workflow::Context;
use console::{style, Color};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::debug;

const PREFIX_COLORS: [Color; 4] = [Color::Blue, Color::Cyan, Color::Magenta, Color::Yellow];

/// A configured test command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    pub project: String,
    pub name: String,
    pub command: String,
    pub directory: PathBuf,
}

impl TestCase {
    /// `project:name`
    pub fn id(&self) -> String {
        format!("{}:{}", self.project, self.name)
    }
}

/// Every test of `subject` and, for a monorepo, of its packages
pub fn collect_tests(subject: &Subject) -> Result<Vec<TestCase>> {
    let mut tests = Vec::new();
    for member in subject.with_members()? {
        for (name, command) in member.tests() {
            tests.push(TestCase {
                project: member.name().to_string(),
                name: name.clone(),
                command: command.clone(),
                directory: member.directory().to_path_buf(),
            });
        }
    }
    Ok(tests)
}

/// Tests matching `selector`. In a monorepo a selector is a full id, a
/// `:name` matching that test in every project, or a project name.
pub fn select_tests<'t>(
    tests: &'t [TestCase],
    selector: &str,
    monorepo: bool,
) -> Result<Vec<&'t TestCase>> {
    let selected: Vec<&TestCase> = tests
        .iter()
        .filter(|test| {
            if monorepo {
                selector == test.id()
                    || selector.strip_prefix(':') == Some(test.name.as_str())
                    || selector == test.project
            } else {
                selector == test.name
            }
        })
        .collect();

    if selected.is_empty() {
        return Err(ShoreError::usage(format!("'{}' did not match any tests", selector)));
    }
    Ok(selected)
}

enum Line {
    Output(String),
    Done,
}

fn forward_lines<R: Read + Send + 'static>(reader: R, sender: mpsc::Sender<Line>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("stopped reading test output: {}", e);
                    break;
                }
            }
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf).into_owned();
            if sender.send(Line::Output(line)).is_err() {
                return;
            }
        }
        let _ = sender.send(Line::Done);
    })
}

/// Run `command` through `bash -c` in `test.directory`, writing each output
/// line to `out` behind an optional prefix. Returns the exit code.
fn run_test(test: &TestCase, label: &str, color: Color, prefix_lines: bool, out: &mut dyn Write) -> Result<i32> {
    debug!("running test {} in {}", label, test.directory.display());
    let mut child = Command::new("bash")
        .arg("-c")
        .arg(&test.command)
        .current_dir(&test.directory)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ShoreError::command(format!("failed to run test {}: {}", label, e)))?;

    let (sender, receiver) = mpsc::channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_lines(stdout, sender.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_lines(stderr, sender.clone()));
    }
    drop(sender);

    let prefix = format!("{}| ", label);
    let mut open = readers.len();
    while open > 0 {
        match receiver.recv() {
            Ok(Line::Output(line)) => {
                if prefix_lines {
                    write!(out, "{}", style(&prefix).fg(color))?;
                }
                writeln!(out, "{}", line.trim_end())?;
            }
            Ok(Line::Done) => open -= 1,
            Err(_) => break,
        }
    }
    for reader in readers {
        let _ = reader.join();
    }

    let status = child.wait()?;
    Ok(status.code().unwrap_or(1))
}

/// Run the selected tests of `subject`
pub fn run_tests(
    subject: &Subject,
    names: &[String],
    no_line_prefix: bool,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    let tests = collect_tests(subject)?;
    if tests.is_empty() {
        ui::display_error("no tests configured");
        return Ok(1);
    }

    let mut selected: Vec<&TestCase> = if names.is_empty() {
        tests.iter().collect()
    } else {
        let mut selected = Vec::new();
        for name in names {
            match select_tests(&tests, name, subject.is_monorepo()) {
                Ok(matches) => selected.extend(matches),
                Err(e) => {
                    ui::display_error(&e.to_string());
                    return Ok(1);
                }
            }
        }
        selected
    };
    selected.sort_by_key(|test| test.id());
    selected.dedup_by_key(|test| test.id());

    let prefix_lines = !(no_line_prefix || (!names.is_empty() && selected.len() == 1));
    let single_project = tests
        .iter()
        .all(|test| test.project == tests[0].project);

    let mut results: BTreeMap<String, i32> = BTreeMap::new();
    for (index, test) in selected.iter().enumerate() {
        let label = if single_project { test.name.clone() } else { test.id() };
        let color = PREFIX_COLORS[index % PREFIX_COLORS.len()];
        let code = run_test(test, &label, color, prefix_lines, ctx.out)?;
        results.insert(label, code);
    }

    if selected.len() > 1 {
        writeln!(ctx.out, "\n{}", style("test summary:").yellow())?;
        for (label, code) in &results {
            let bullet = if *code == 0 {
                style("•").green()
            } else {
                style("•").red()
            };
            writeln!(ctx.out, "  {} {} (exit code: {})", bullet, label, code)?;
        }
    }

    Ok(if results.values().all(|code| *code == 0) { 0 } else { 1 })
}
