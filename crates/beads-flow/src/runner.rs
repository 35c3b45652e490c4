//! An injectable subprocess runner so the land gate's choreography is
//! testable without a real git checkout. Mirrors `beads_git::commands::git_command`'s
//! signature, generalized to any subprocess (not just git) and made
//! trait-object-friendly so gate tests can supply a fake.

use std::path::Path;

/// One subprocess invocation's outcome: combined stdout+stderr, and whether
/// it exited non-zero.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub combined_output: String,
}

/// Runs a named command with arguments in a working directory, blocking
/// until the child exits.
pub trait Runner: Send + Sync {
    fn run(&self, name: &str, args: &[&str], cwd: &Path) -> RunOutput;
}

/// The real runner, backed by `std::process::Command` via `beads-git`'s
/// wrapper for `git` itself, and a bare `Command` for anything else.
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, name: &str, args: &[&str], cwd: &Path) -> RunOutput {
        if name == "git" {
            return match beads_git::commands::git_command(args, cwd) {
                Ok(stdout) => RunOutput {
                    success: true,
                    combined_output: stdout,
                },
                Err(e) => RunOutput {
                    success: false,
                    combined_output: e.to_string(),
                },
            };
        }

        match std::process::Command::new(name).args(args).current_dir(cwd).output() {
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                RunOutput {
                    success: output.status.success(),
                    combined_output: combined.trim().to_string(),
                }
            }
            Err(e) => RunOutput {
                success: false,
                combined_output: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// A fake runner driven by a caller-supplied script of canned responses,
    /// one per call in order. Panics if more calls arrive than scripted.
    pub struct ScriptedRunner {
        responses: Mutex<Vec<RunOutput>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new(responses: Vec<RunOutput>) -> Self {
            // Scripted in call order; pop from the front by reversing once.
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Runner for ScriptedRunner {
        fn run(&self, name: &str, args: &[&str], _cwd: &Path) -> RunOutput {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{name} {}", args.join(" ")));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| panic!("ScriptedRunner ran out of scripted responses"))
        }
    }

    pub fn ok(output: &str) -> RunOutput {
        RunOutput {
            success: true,
            combined_output: output.to_string(),
        }
    }

    pub fn fail(output: &str) -> RunOutput {
        RunOutput {
            success: false,
            combined_output: output.to_string(),
        }
    }
}
