//! Interactive input
//!
//! Commands read answers and secret phrases through these traits so the
//! wizard and signing flow can run against scripted input in tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

/// Line-oriented question and answer
pub trait Prompter {
    /// Show `prompt` and return the trimmed answer
    fn ask(&mut self, prompt: &str) -> io::Result<String>;

    /// Show an informational line
    fn say(&mut self, line: &str);
}

/// Source of a seed phrase
pub trait PhraseSource {
    fn read_phrase(&mut self) -> io::Result<Zeroizing<String>>;
}

// =============================================================================
// Terminal
// =============================================================================

/// Prompts on stdout, answers from stdin
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}: ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the wizard finished",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Reads the phrase from the terminal without echo
#[derive(Debug, Default)]
pub struct TerminalPhrase;

impl PhraseSource for TerminalPhrase {
    fn read_phrase(&mut self) -> io::Result<Zeroizing<String>> {
        print!("Seed: ");
        io::stdout().flush()?;
        let phrase = Zeroizing::new(rpassword::read_password()?);
        println!();
        Ok(phrase)
    }
}

// =============================================================================
// Scripted
// =============================================================================

/// Answers from a fixed script, recording everything shown
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Whether every scripted answer was consumed
    pub fn is_exhausted(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.transcript.push(format!("{}: ", prompt));
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }
}

/// A phrase known in advance
pub struct StaticPhrase(Zeroizing<String>);

impl StaticPhrase {
    pub fn new(phrase: &str) -> Self {
        Self(Zeroizing::new(phrase.to_string()))
    }
}

impl PhraseSource for StaticPhrase {
    fn read_phrase(&mut self) -> io::Result<Zeroizing<String>> {
        Ok(self.0.clone())
    }
}
