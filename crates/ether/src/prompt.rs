//! Interactive choices made before the manifest is edited.
//!
//! The manifest editor never asks questions. Commands decide which targets
//! and products to touch up front, through a [`Prompter`].

use console::{style, Term};
use ether_types::{Target, TargetType};
use std::io::{self, IsTerminal};

pub trait Prompter {
    /// Whether a person can answer.
    fn is_interactive(&self) -> bool;

    /// Ask for one line of input.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;

    /// Show a line of information.
    fn note(&mut self, message: &str);

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            let answer = self.ask(&format!("{} (y/n)", prompt))?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.note("Please answer y or n"),
            }
        }
    }

    /// Pick some of `options` by comma-separated index. Empty input picks all.
    fn choose(&mut self, prompt: &str, options: &[String]) -> io::Result<Vec<usize>> {
        for (index, option) in options.iter().enumerate() {
            self.note(&format!("  {}: {}", index, option));
        }
        loop {
            let answer = self.ask(prompt)?;
            match parse_indices(&answer, options.len()) {
                Some(indices) => return Ok(indices),
                None => self.note(&format!(
                    "Enter numbers between 0 and {}, separated by commas",
                    options.len().saturating_sub(1)
                )),
            }
        }
    }
}

/// Asks on the terminal.
pub struct TerminalPrompter {
    term: Term,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.term
            .write_str(&format!("{} {} ", style("?").magenta().bold(), prompt))?;
        self.term.read_line()
    }

    fn note(&mut self, message: &str) {
        let _ = self.term.write_line(message);
    }
}

/// Answers nothing; commands fall back to their defaults.
pub struct BatchPrompter;

impl Prompter for BatchPrompter {
    fn is_interactive(&self) -> bool {
        false
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("cannot ask '{}' without a terminal", prompt),
        ))
    }

    fn note(&mut self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// A terminal prompter when stdin is a terminal, otherwise a batch one.
pub fn for_session() -> Box<dyn Prompter> {
    if io::stdin().is_terminal() && Term::stderr().is_term() {
        Box::new(TerminalPrompter::new())
    } else {
        Box::new(BatchPrompter)
    }
}

fn parse_indices(answer: &str, count: usize) -> Option<Vec<usize>> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some((0..count).collect());
    }

    let mut indices = Vec::new();
    for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index: usize = part.parse().ok()?;
        if index >= count {
            return None;
        }
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    (!indices.is_empty()).then_some(indices)
}

const TARGET_HELP: &str = "y: add the dependency to this target
n: skip this target
q: skip this and all remaining targets
?: show this help";

/// Decide which targets get the new dependency.
///
/// Asks `y/n/q/?` per target when there is a choice to make; otherwise every
/// non-test target is used.
pub fn select_targets(prompter: &mut dyn Prompter, targets: &[Target]) -> io::Result<Vec<String>> {
    let candidates: Vec<&Target> = targets
        .iter()
        .filter(|t| t.target_type.accepts_dependencies())
        .collect();

    if let [only] = candidates.as_slice() {
        return Ok(vec![only.name.clone()]);
    }
    if !prompter.is_interactive() {
        return Ok(candidates
            .iter()
            .filter(|t| t.target_type != TargetType::Test)
            .map(|t| t.name.clone())
            .collect());
    }

    let mut selected = Vec::new();
    'targets: for target in candidates {
        loop {
            let prompt = format!("Add dependency to target '{}'? (y,n,q,?)", target.name);
            match prompter.ask(&prompt)?.trim().to_lowercase().as_str() {
                "y" | "yes" => {
                    selected.push(target.name.clone());
                    break;
                }
                "n" | "no" => break,
                "q" | "quit" => break 'targets,
                _ => prompter.note(TARGET_HELP),
            }
        }
    }
    Ok(selected)
}

/// Decide which products of a package to depend on.
///
/// A product named like the package wins outright. Otherwise the user picks,
/// or every product is used when nobody can answer.
pub fn select_products(
    prompter: &mut dyn Prompter,
    package: &str,
    products: &[String],
) -> io::Result<Vec<String>> {
    if products.is_empty() {
        return Ok(vec![package.to_string()]);
    }
    if let Some(product) = products.iter().find(|p| p.eq_ignore_ascii_case(package)) {
        return Ok(vec![product.clone()]);
    }
    if products.len() == 1 || !prompter.is_interactive() {
        return Ok(products.to_vec());
    }

    prompter.note(&format!("{} exposes several products:", package));
    let indices = prompter.choose("Which products should targets depend on?", products)?;
    Ok(indices.into_iter().map(|i| products[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted {
        answers: VecDeque<&'static str>,
        notes: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                notes: Vec::new(),
            }
        }
    }

    impl Prompter for Scripted {
        fn is_interactive(&self) -> bool {
            true
        }

        fn ask(&mut self, _prompt: &str) -> io::Result<String> {
            self.answers
                .pop_front()
                .map(String::from)
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }

        fn note(&mut self, message: &str) {
            self.notes.push(message.to_string());
        }
    }

    fn target(name: &str, target_type: TargetType) -> Target {
        Target {
            name: name.to_string(),
            target_type,
            dependencies: Vec::new(),
        }
    }

    fn targets() -> Vec<Target> {
        vec![
            target("App", TargetType::Executable),
            target("Core", TargetType::Library),
            target("CoreTests", TargetType::Test),
            target("Blob", TargetType::Binary),
        ]
    }

    #[test]
    fn test_select_targets_batch() {
        let selected = select_targets(&mut BatchPrompter, &targets()).unwrap();
        assert_eq!(selected, vec!["App", "Core"]);
    }

    #[test]
    fn test_select_targets_single_candidate() {
        let only = vec![target("Tool", TargetType::Executable), target("Blob", TargetType::Binary)];
        let mut prompter = Scripted::new(&[]);
        assert_eq!(select_targets(&mut prompter, &only).unwrap(), vec!["Tool"]);
    }

    #[test]
    fn test_select_targets_interactive() {
        let mut prompter = Scripted::new(&["?", "y", "n", "y"]);
        let selected = select_targets(&mut prompter, &targets()).unwrap();
        assert_eq!(selected, vec!["App", "CoreTests"]);
        assert_eq!(prompter.notes, vec![TARGET_HELP.to_string()]);
    }

    #[test]
    fn test_select_targets_quit() {
        let mut prompter = Scripted::new(&["y", "q"]);
        let selected = select_targets(&mut prompter, &targets()).unwrap();
        assert_eq!(selected, vec!["App"]);
    }

    #[test]
    fn test_select_products() {
        let products = vec!["NIO".to_string(), "NIOHTTP1".to_string(), "NIOWebSocket".to_string()];

        let mut prompter = Scripted::new(&["7", "0, 2"]);
        let chosen = select_products(&mut prompter, "swift-nio", &products).unwrap();
        assert_eq!(chosen, vec!["NIO", "NIOWebSocket"]);

        let chosen = select_products(&mut BatchPrompter, "swift-nio", &products).unwrap();
        assert_eq!(chosen.len(), 3);

        let named = vec!["Vapor".to_string(), "XCTVapor".to_string()];
        let chosen = select_products(&mut Scripted::new(&[]), "vapor", &named).unwrap();
        assert_eq!(chosen, vec!["Vapor"]);

        let chosen = select_products(&mut BatchPrompter, "Leaf", &[]).unwrap();
        assert_eq!(chosen, vec!["Leaf"]);
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("", 3), Some(vec![0, 1, 2]));
        assert_eq!(parse_indices("2,0,2", 3), Some(vec![2, 0]));
        assert_eq!(parse_indices("3", 3), None);
        assert_eq!(parse_indices("x", 3), None);
    }

    #[test]
    fn test_confirm() {
        let mut prompter = Scripted::new(&["maybe", "Y"]);
        assert!(prompter.confirm("Continue?").unwrap());
        assert_eq!(prompter.notes.len(), 1);
    }
}
