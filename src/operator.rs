// ============================================================================
// src/operator.rs – Human-in-the-loop seam (prompts, gates, GUI hand-off)
// ============================================================================

use dialoguer::{Confirm, Input};
use std::io;
use std::path::Path;
use std::process::Command;

pub trait Operator {
    /// Yes/no question, default no.
    fn confirm(&self, prompt: &str) -> io::Result<bool>;

    /// Free-form answer, trimmed.
    fn ask(&self, prompt: &str) -> io::Result<String>;

    /// Block until the operator presses ENTER.
    fn acknowledge(&self, prompt: &str) -> io::Result<()>;

    /// Start an external (usually graphical) program, block until the
    /// operator says they are done, then reap the program.
    fn launch_and_wait(&self, program: &Path, args: &[&str]) -> io::Result<()>;
}

/// "Type y to continue": only a literal `y`/`Y` passes.
pub fn typed_yes(op: &dyn Operator, prompt: &str) -> io::Result<bool> {
    let answer = op.ask(&format!("{prompt} Type y to continue"))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

/// dialoguer reports terminal failures with its own error type.
fn prompt_error(err: dialoguer::Error) -> io::Error {
    io::Error::other(err)
}

/// Interactive terminal operator.
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(prompt_error)
    }

    fn ask(&self, prompt: &str) -> io::Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        Ok(answer.trim().to_string())
    }

    fn acknowledge(&self, prompt: &str) -> io::Result<()> {
        let _: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        Ok(())
    }

    fn launch_and_wait(&self, program: &Path, args: &[&str]) -> io::Result<()> {
        tracing::info!(program = %program.display(), ?args, "launching");
        let mut child = Command::new(program).args(args).spawn()?;
        self.acknowledge(&format!(
            "{} is open. Press ENTER here when you are finished",
            program.display()
        ))?;
        if child.try_wait()?.is_none() {
            println!("Waiting for {} to close...", program.display());
        }
        let status = child.wait()?;
        tracing::debug!(program = %program.display(), ?status, "closed");
        Ok(())
    }
}
