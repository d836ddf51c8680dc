//! Line-based host I/O used by the `print` and `scan` builtins.
//!
//! - [`StdConsole`]: stdout / stdin (default)
//! - [`BufferConsole`]: captured output and scripted input, for tests and
//!   embedding

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

pub trait Console {
    /// Write `line` followed by a newline.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Show `prompt`, then read one line without its terminator.
    /// End of input yields an empty string.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(trim_line_ending(line))
    }
}

/// Console backed by in-memory buffers. Clones share the same buffers, so
/// a test can hand one clone to the evaluator and inspect another.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    output: Rc<RefCell<String>>,
    input: Rc<RefCell<VecDeque<String>>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// A console whose `read_line` answers with `lines`, in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::default();
        console
            .input
            .borrow_mut()
            .extend(lines.into_iter().map(Into::into));
        console
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.output.borrow().lines().map(str::to_string).collect()
    }

    /// Prompts shown by `read_line`, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Console for BufferConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut output = self.output.borrow_mut();
        output.push_str(line);
        output.push('\n');
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.input.borrow_mut().pop_front().unwrap_or_default())
    }
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_console_clones_share_output() {
        let console = BufferConsole::new();
        let mut writer = console.clone();
        writer.write_line("hello").unwrap();
        writer.write_line("world").unwrap();
        assert_eq!(console.output(), "hello\nworld\n");
        assert_eq!(console.lines(), vec!["hello", "world"]);
    }

    #[test]
    fn buffer_console_replays_input_then_empty() {
        let mut console = BufferConsole::with_input(["first"]);
        assert_eq!(console.read_line("? ").unwrap(), "first");
        assert_eq!(console.read_line("> ").unwrap(), "");
        assert_eq!(console.prompts(), vec!["? ", "> "]);
    }

    #[test]
    fn line_endings_are_trimmed() {
        assert_eq!(trim_line_ending("abc\r\n".to_string()), "abc");
        assert_eq!(trim_line_ending("abc".to_string()), "abc");
    }
}
