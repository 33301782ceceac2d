//! Output and player input.
//!
//! Scenes never touch stdin/stdout directly. When input runs out (EOF on the
//! console, an exhausted script in tests) a prompt resolves to its last
//! option, which every menu in the engine uses for "leave"/"cancel".

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::thread;

use tracing::warn;

use crate::config::TextSpeed;

const RULE_WIDTH: usize = 70;

pub trait Renderer {
    fn print_header(&mut self, title: &str);
    /// Narrative text, typed out according to the text speed.
    fn print_slow(&mut self, text: &str);
    /// Status and log lines, always instant.
    fn print_line(&mut self, text: &str);
    fn wait_for_input(&mut self, prompt: Option<&str>);
    /// Index into `options`.
    fn get_choice(&mut self, options: &[String]) -> usize;
    fn display_map(&mut self, map_ascii: &str, pos: Option<(i32, i32)>);
}

pub struct ConsoleRenderer<R, W> {
    speed: TextSpeed,
    input: R,
    output: W,
}

impl ConsoleRenderer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(speed: TextSpeed) -> Self {
        Self::new(speed, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleRenderer<R, W> {
    pub fn new(speed: TextSpeed, input: R, output: W) -> Self {
        Self { speed, input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                warn!(error = %err, "failed to read player input");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Renderer for ConsoleRenderer<R, W> {
    fn print_header(&mut self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        let _ = writeln!(self.output, "\n{}\n  {}\n{}\n", rule, title, rule);
    }

    fn print_slow(&mut self, text: &str) {
        let delay = self.speed.char_delay();
        if delay.is_zero() {
            let _ = writeln!(self.output, "{}", text);
            return;
        }
        for ch in text.chars() {
            let _ = write!(self.output, "{}", ch);
            let _ = self.output.flush();
            thread::sleep(delay);
        }
        let _ = writeln!(self.output);
    }

    fn print_line(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
    }

    fn wait_for_input(&mut self, prompt: Option<&str>) {
        let _ = write!(self.output, "{}", prompt.unwrap_or("\n[Press ENTER to continue]"));
        let _ = self.output.flush();
        let _ = self.read_line();
    }

    fn get_choice(&mut self, options: &[String]) -> usize {
        if options.is_empty() {
            return 0;
        }
        let _ = writeln!(self.output, "\nWhat do you do?");
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(self.output, "  {}. {}", i + 1, option);
        }
        loop {
            let _ = write!(self.output, "\nYour choice: ");
            let _ = self.output.flush();
            let Some(line) = self.read_line() else {
                return options.len() - 1;
            };
            match line.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return n - 1,
                _ => {
                    let _ = writeln!(self.output, "Please enter a number between 1 and {}", options.len());
                }
            }
        }
    }

    fn display_map(&mut self, map_ascii: &str, pos: Option<(i32, i32)>) {
        let rule = "─".repeat(RULE_WIDTH);
        let _ = writeln!(self.output, "\n{}\n  MAP\n{}\n{}", rule, rule, map_ascii);
        if let Some((x, y)) = pos {
            let _ = writeln!(self.output, "\nPosition: ({}, {})", x, y);
        }
        let _ = writeln!(self.output, "{}\n", rule);
    }
}

/// Everything a [`ScriptedRenderer`] was asked to show.
#[derive(Debug, Default)]
pub struct Transcript {
    pub headers: Vec<String>,
    pub lines: Vec<String>,
    /// Every option list passed to `get_choice`, in order.
    pub offered: Vec<Vec<String>>,
    pub waits: usize,
}

impl Transcript {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

/// Renderer driven by a fixed list of choices. The transcript is shared so
/// callers can inspect it after the renderer has been boxed into a context.
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    choices: VecDeque<usize>,
    transcript: Rc<RefCell<Transcript>>,
}

impl ScriptedRenderer {
    pub fn new(choices: impl IntoIterator<Item = usize>) -> Self {
        Self { choices: choices.into_iter().collect(), transcript: Rc::default() }
    }

    pub fn transcript(&self) -> Rc<RefCell<Transcript>> {
        Rc::clone(&self.transcript)
    }
}

impl Renderer for ScriptedRenderer {
    fn print_header(&mut self, title: &str) {
        self.transcript.borrow_mut().headers.push(title.to_string());
    }

    fn print_slow(&mut self, text: &str) {
        self.transcript.borrow_mut().lines.push(text.to_string());
    }

    fn print_line(&mut self, text: &str) {
        self.transcript.borrow_mut().lines.push(text.to_string());
    }

    fn wait_for_input(&mut self, _prompt: Option<&str>) {
        self.transcript.borrow_mut().waits += 1;
    }

    fn get_choice(&mut self, options: &[String]) -> usize {
        self.transcript.borrow_mut().offered.push(options.to_vec());
        let last = options.len().saturating_sub(1);
        match self.choices.pop_front() {
            Some(idx) => idx.min(last),
            None => last,
        }
    }

    fn display_map(&mut self, map_ascii: &str, _pos: Option<(i32, i32)>) {
        self.transcript.borrow_mut().lines.push(map_ascii.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn console_reprompts_until_valid() {
        let input = io::Cursor::new("9\nabc\n2\n");
        let mut r = ConsoleRenderer::new(TextSpeed::Instant, input, Vec::new());
        assert_eq!(r.get_choice(&options(&["Fight", "Flee"])), 1);
        let out = String::from_utf8(r.into_output()).unwrap();
        assert_eq!(out.matches("Please enter a number between 1 and 2").count(), 2);
    }

    #[test]
    fn console_eof_picks_last_option() {
        let mut r = ConsoleRenderer::new(TextSpeed::Instant, io::Cursor::new(""), Vec::new());
        assert_eq!(r.get_choice(&options(&["Buy", "Sell", "Leave"])), 2);
        r.wait_for_input(None);
    }

    #[test]
    fn header_layout() {
        let mut r = ConsoleRenderer::new(TextSpeed::Instant, io::Cursor::new(""), Vec::new());
        r.print_header("The Crypt");
        let out = String::from_utf8(r.into_output()).unwrap();
        insta::assert_snapshot!(out.trim(), @r"
        ======================================================================
          The Crypt
        ======================================================================
        ");
    }

    #[test]
    fn scripted_clamps_and_records() {
        let mut r = ScriptedRenderer::new([5]);
        assert_eq!(r.get_choice(&options(&["a", "b"])), 1);
        assert_eq!(r.get_choice(&options(&["a", "b", "c"])), 2);
        assert_eq!(r.transcript().borrow().offered.len(), 2);
    }
}
