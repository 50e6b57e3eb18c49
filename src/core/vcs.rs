//! Best-effort version-control probe.
//!
//! Every query shells out to `git`, is bounded by a hard timeout, and
//! returns `None` on any failure. The pipeline never depends on a working
//! repository; revision identity is enrichment, not a requirement.

use std::path::{Component, Path};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Hard timeout applied to every git invocation.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Returns the HEAD commit identifier, or `None`.
#[must_use]
pub fn current_revision(workspace: &Path) -> Option<String> {
    run_git(workspace, &["rev-parse", "HEAD"])
}

/// Returns the object id of a tracked file at HEAD, or `None`.
#[must_use]
pub fn file_revision_at_head(workspace: &Path, relative_path: &str) -> Option<String> {
    run_git(
        workspace,
        &["rev-parse", &format!("HEAD:{relative_path}")],
    )
}

/// Converts an absolute path to a POSIX workspace-relative path.
///
/// Paths outside the workspace come back unchanged, as absolute strings.
#[must_use]
pub fn to_relative_path(workspace: &Path, absolute: &Path) -> String {
    let Ok(relative) = absolute.strip_prefix(workspace) else {
        return absolute.to_string_lossy().into_owned();
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return absolute.to_string_lossy().into_owned(),
        }
    }
    parts.join("/")
}

/// Runs a git command under the probe timeout.
///
/// Returns trimmed stdout on success; `None` on spawn failure, non-zero
/// exit, or timeout (the child is killed).
fn run_git(workspace: &Path, args: &[&str]) -> Option<String> {
    let mut child = Command::new("git")
        .current_dir(workspace)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        use std::io::Read;
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }

        if start.elapsed() > PROBE_TIMEOUT {
            tracing::warn!(?args, "git probe timed out; downgrading to null revision");
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }

        std::thread::sleep(Duration::from_millis(10));
    };

    let output = reader.join().unwrap_or_default();
    if !status.success() {
        return None;
    }

    let trimmed = output.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn init_git_repo(repo_dir: &Path) {
        let run = |args: &[&str]| {
            let out = Command::new("git")
                .args(args)
                .current_dir(repo_dir)
                .output()
                .expect("run git");
            assert!(
                out.status.success(),
                "git {args:?}: {}",
                String::from_utf8_lossy(&out.stderr)
            );
        };

        run(&["init"]);
        std::fs::write(repo_dir.join("tracked.txt"), "content\n").unwrap();
        run(&["add", "."]);
        run(&[
            "-c",
            "user.name=Gatehouse",
            "-c",
            "user.email=gatehouse@example.com",
            "commit",
            "-m",
            "init",
        ]);
    }

    #[test]
    fn revision_of_real_repo() {
        let tmp = TempDir::new().unwrap();
        init_git_repo(tmp.path());

        let head = current_revision(tmp.path());
        assert!(head.is_some());
        assert_eq!(head.unwrap().len(), 40);
    }

    #[test]
    fn file_revision_of_tracked_file() {
        let tmp = TempDir::new().unwrap();
        init_git_repo(tmp.path());

        assert!(file_revision_at_head(tmp.path(), "tracked.txt").is_some());
        assert!(file_revision_at_head(tmp.path(), "missing.txt").is_none());
    }

    #[test]
    fn probe_outside_repo_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(current_revision(tmp.path()).is_none());
    }

    #[test]
    fn relativize_inside_and_outside() {
        let ws = PathBuf::from("/work/project");
        assert_eq!(
            to_relative_path(&ws, Path::new("/work/project/src/main.ts")),
            "src/main.ts"
        );
        assert_eq!(
            to_relative_path(&ws, Path::new("/etc/hosts")),
            "/etc/hosts"
        );
    }
}
