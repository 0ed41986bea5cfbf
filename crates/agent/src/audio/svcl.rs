//! SoundVolumeView command-line (`svcl`) backend.
//!
//! Enumeration: `svcl /sjson <file>` dumps every endpoint row to a JSON file.
//! Each call writes to its own `sessions-<uuid>.json` under the scratch dir so
//! overlapping requests never read or delete each other's dump. The file is
//! removed as soon as it has been read, and on every failure path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::reconcile::reconcile_dump;
use super::{AudioMixer, Enumeration};
use crate::paths::DataPaths;
use crate::tool::{self, ToolError};

pub struct SvclMixer {
    program: PathBuf,
    scratch_dir: PathBuf,
    timeout: Duration,
}

impl SvclMixer {
    pub fn new(program: PathBuf, scratch_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            program,
            scratch_dir,
            timeout,
        }
    }

    /// Explicit path > bundled `<data_dir>/bin/svcl.exe` > `svcl` on `PATH`.
    pub fn resolve_program(explicit: Option<&Path>, paths: &DataPaths) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        let bundled = paths.bundled_svcl();
        if bundled.exists() {
            bundled
        } else {
            PathBuf::from("svcl")
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn enumerate(&self) -> Enumeration {
        if let Err(e) = tokio::fs::create_dir_all(&self.scratch_dir).await {
            return self.degraded(format!("cannot create scratch dir: {e}"));
        }

        let scratch = ScratchFile::new(&self.scratch_dir);
        let args = [OsString::from("/sjson"), scratch.path().as_os_str().to_owned()];

        match tool::run(&self.program, args, self.timeout).await {
            Ok(out) => debug!(
                component = "audio",
                event = "audio.sessions.dumped",
                duration_ms = out.duration_ms,
                stdout = %out.stdout.trim(),
                stderr = %out.stderr.trim(),
                "Session dump written"
            ),
            Err(e) => return self.degraded(e.to_string()),
        }

        let read = tokio::fs::read(scratch.path()).await;
        drop(scratch);

        match read {
            Ok(bytes) => match reconcile_dump(&bytes) {
                Enumeration::Degraded(reason) => self.degraded(reason),
                ok => ok,
            },
            Err(e) => self.degraded(format!("session dump unreadable: {e}")),
        }
    }

    fn degraded(&self, reason: String) -> Enumeration {
        warn!(
            component = "audio",
            event = "audio.sessions.degraded",
            program = %self.program.display(),
            reason = %reason,
            "Failed to get sessions"
        );
        Enumeration::Degraded(reason)
    }

    async fn invoke(&self, args: Vec<String>) -> Result<(), ToolError> {
        info!(
            component = "audio",
            event = "audio.command.exec",
            program = %self.program.display(),
            args = ?args,
            "Executing mixer command"
        );
        tool::run(&self.program, &args, self.timeout).await.map(|_| ())
    }
}

impl AudioMixer for SvclMixer {
    fn sessions(&self) -> BoxFuture<'_, Enumeration> {
        self.enumerate().boxed()
    }

    fn set_mute<'a>(&'a self, app_name: &'a str, mute: bool) -> BoxFuture<'a, Result<(), ToolError>> {
        let action = if mute { "/Mute" } else { "/Unmute" };
        self.invoke(vec![action.to_string(), app_name.to_string()])
            .boxed()
    }

    fn set_volume<'a>(
        &'a self,
        app_name: &'a str,
        level: f64,
    ) -> BoxFuture<'a, Result<(), ToolError>> {
        self.invoke(vec![
            "/SetVolume".to_string(),
            app_name.to_string(),
            format_level(level),
        ])
        .boxed()
    }
}

/// `42` for whole numbers, `42.5` otherwise.
fn format_level(level: f64) -> String {
    let rounded = (level * 10.0).round() / 10.0;
    format!("{rounded}")
}

/// A uniquely named dump path, removed on drop.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("sessions-{}.json", Uuid::new_v4())),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                component = "audio",
                event = "audio.scratch.cleanup_failed",
                path = %self.path.display(),
                error = %e,
                "Failed to remove session dump"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_levels_without_trailing_zero() {
        assert_eq!(format_level(42.0), "42");
        assert_eq!(format_level(42.5), "42.5");
        assert_eq!(format_level(0.0), "0");
    }

    #[test]
    fn scratch_files_are_unique_and_removed() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let a = ScratchFile::new(tmp.path());
        let b = ScratchFile::new(tmp.path());
        assert_ne!(a.path(), b.path());

        std::fs::write(a.path(), "[]").expect("write");
        let path = a.path().to_path_buf();
        drop(a);
        assert!(!path.exists());
        drop(b);
    }

    #[test]
    fn explicit_program_wins_over_bundled() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let paths = DataPaths::new(tmp.path());
        assert_eq!(
            SvclMixer::resolve_program(None, &paths),
            PathBuf::from("svcl")
        );

        std::fs::create_dir_all(tmp.path().join("bin")).expect("mkdir");
        std::fs::write(paths.bundled_svcl(), "").expect("write");
        assert_eq!(SvclMixer::resolve_program(None, &paths), paths.bundled_svcl());
        assert_eq!(
            SvclMixer::resolve_program(Some(Path::new("/opt/svcl")), &paths),
            PathBuf::from("/opt/svcl")
        );
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        const FAKE_SVCL: &str = r#"#!/bin/sh
case "$1" in
  /sjson)
    printf '%s' "$FAKE_DUMP" > "$2"
    exit "${FAKE_EXIT:-0}"
    ;;
  /Mute|/Unmute|/SetVolume)
    echo "$@" >> "$(dirname "$0")/calls.log"
    exit "${FAKE_EXIT:-0}"
    ;;
esac
exit 2
"#;

        fn fake_tool(dir: &Path, dump: &str, exit_code: i32) -> PathBuf {
            let script = format!(
                "#!/bin/sh\nFAKE_DUMP='{dump}'\nFAKE_EXIT={exit_code}\n{}",
                FAKE_SVCL.trim_start_matches("#!/bin/sh\n")
            );
            let path = dir.join("svcl");
            std::fs::write(&path, script).expect("write fake tool");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
            path
        }

        fn scratch_is_empty(dir: &Path) -> bool {
            std::fs::read_dir(dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(true)
        }

        #[tokio::test]
        async fn enumerates_and_cleans_up_scratch() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let dump = r#"[{"Name":"chrome.exe","Type":"Application"},{"Name":"chrome.exe","Type":"Application"},{"Name":"nvidia.exe","Type":"Render"},{"Name":"spotify.exe","Type":"Application"}]"#;
            let program = fake_tool(tmp.path(), dump, 0);
            let scratch = tmp.path().join("scratch");
            let mixer = SvclMixer::new(program, scratch.clone(), Duration::from_secs(5));

            let sessions = mixer.sessions().await.into_sessions();
            let names: Vec<_> = sessions.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["chrome.exe", "spotify.exe"]);
            assert!(scratch_is_empty(&scratch));
        }

        #[tokio::test]
        async fn parse_failure_degrades_and_cleans_up() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let program = fake_tool(tmp.path(), "{not json", 0);
            let scratch = tmp.path().join("scratch");
            let mixer = SvclMixer::new(program, scratch.clone(), Duration::from_secs(5));

            assert!(matches!(mixer.sessions().await, Enumeration::Degraded(_)));
            assert!(scratch_is_empty(&scratch));
        }

        #[tokio::test]
        async fn tool_failure_degrades_and_cleans_up() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let program = fake_tool(tmp.path(), "[]", 32);
            let scratch = tmp.path().join("scratch");
            let mixer = SvclMixer::new(program, scratch.clone(), Duration::from_secs(5));

            assert!(matches!(mixer.sessions().await, Enumeration::Degraded(_)));
            assert!(scratch_is_empty(&scratch));
        }

        #[tokio::test]
        async fn overlapping_enumerations_do_not_collide() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let dump = r#"[{"Name":"a.exe","Type":"Application"}]"#;
            let program = fake_tool(tmp.path(), dump, 0);
            let scratch = tmp.path().join("scratch");
            let mixer = SvclMixer::new(program, scratch.clone(), Duration::from_secs(5));

            let (a, b, c) = tokio::join!(mixer.sessions(), mixer.sessions(), mixer.sessions());
            for result in [a, b, c] {
                assert_eq!(result.into_sessions().len(), 1);
            }
            assert!(scratch_is_empty(&scratch));
        }

        #[tokio::test]
        async fn commands_pass_name_and_level() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let program = fake_tool(tmp.path(), "[]", 0);
            let mixer = SvclMixer::new(program, tmp.path().join("scratch"), Duration::from_secs(5));

            mixer.set_mute("spotify.exe", true).await.expect("mute");
            mixer.set_mute("spotify.exe", false).await.expect("unmute");
            mixer.set_volume("spotify.exe", 40.0).await.expect("volume");

            let calls = std::fs::read_to_string(tmp.path().join("calls.log")).expect("calls");
            let lines: Vec<_> = calls.lines().collect();
            assert_eq!(
                lines,
                vec![
                    "/Mute spotify.exe",
                    "/Unmute spotify.exe",
                    "/SetVolume spotify.exe 40"
                ]
            );
        }

        #[tokio::test]
        async fn rejected_command_surfaces_tool_error() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let program = fake_tool(tmp.path(), "[]", 1);
            let mixer = SvclMixer::new(program, tmp.path().join("scratch"), Duration::from_secs(5));

            let err = mixer.set_mute("ghost.exe", true).await.expect_err("should fail");
            assert!(matches!(err, ToolError::ExitStatus { code: Some(1), .. }));
        }
    }
}
