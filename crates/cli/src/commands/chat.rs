use std::io::{self, BufRead, Write};

use homefinder_agent::controller::{GOODBYE_MESSAGE, WELCOME_MESSAGE};
use homefinder_agent::ConversationController;

use crate::commands::{load_controller, CommandResult, ContextOptions};

pub fn run(options: &ContextOptions) -> CommandResult {
    let (_, controller) = match load_controller("chat", options) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run_session(&controller, stdin.lock(), stdout.lock()) {
        Ok(_) => CommandResult::output(String::new()),
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), 1),
    }
}

/// Runs the prompt loop until a goodbye or end of input. Returns the number
/// of turns answered.
pub fn run_session(
    controller: &ConversationController,
    input: impl BufRead,
    mut output: impl Write,
) -> io::Result<usize> {
    writeln!(output, "{WELCOME_MESSAGE}\n")?;

    let mut turns = 0;
    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(output, "\n{GOODBYE_MESSAGE}")?;
            return Ok(turns);
        };

        let reply = controller.handle(&line);
        turns += 1;
        writeln!(output, "{}\n", reply.reply_text)?;
        if reply.is_goodbye() {
            return Ok(turns);
        }
    }
}
