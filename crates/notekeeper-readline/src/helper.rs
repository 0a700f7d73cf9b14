//! Line-editor helper: completion and usage hints from the command table,
//! and password masking while typing.

use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::{self, COMMANDS, CommandSpec};

#[derive(Clone, Default)]
pub struct NotekeeperHelper;

impl Helper for NotekeeperHelper {}

/// Commands whose name starts with `line`, while the name is still being typed.
fn matching(line: &str) -> impl Iterator<Item = &'static CommandSpec> + '_ {
    let typing_name = line.starts_with('/') && !line.contains(char::is_whitespace);
    COMMANDS
        .iter()
        .filter(move |spec| typing_name && spec.name.starts_with(line))
}

pub fn completions(line: &str) -> Vec<Pair> {
    matching(line)
        .map(|spec| Pair {
            display: format!("{:<16} {}", spec.name, spec.about),
            replacement: if spec.usage.is_empty() {
                spec.name.to_string()
            } else {
                format!("{} ", spec.name)
            },
        })
        .collect()
}

/// Grey text after the cursor: the rest of the first matching name and its
/// arguments, or just the arguments once the name is complete.
pub fn hint_for(line: &str) -> Option<String> {
    if let Some(spec) = matching(line).next() {
        let rest = &spec.name[line.len()..];
        let hint = match (rest.is_empty(), spec.usage.is_empty()) {
            (true, true) => return None,
            (_, true) => rest.to_string(),
            (_, false) => format!("{rest} {}", spec.usage),
        };
        return Some(hint);
    }

    let name = line.strip_suffix(' ')?;
    command::lookup(name)
        .filter(|spec| !spec.usage.is_empty())
        .map(|spec| spec.usage.to_string())
}

/// The line as displayed: password arguments become `*`, the command name
/// is colored.
pub fn mask_line(line: &str) -> String {
    let name = line.split(char::is_whitespace).next().unwrap_or_default();
    let Some(spec) = command::lookup(name) else {
        return line.to_string();
    };

    let mut out = spec.name.bright_cyan().to_string();
    let mut word = 0;
    let mut in_word = false;
    for ch in line[name.len()..].chars() {
        if ch.is_whitespace() {
            if in_word {
                word += 1;
                in_word = false;
            }
            out.push(ch);
            continue;
        }
        in_word = true;
        let secret = spec.secret_from.is_some_and(|from| word >= from);
        out.push(if secret { '*' } else { ch });
    }
    out
}

impl Completer for NotekeeperHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok((0, completions(&line[..pos])))
    }
}

impl Highlighter for NotekeeperHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(mask_line(line))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for NotekeeperHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        hint_for(line)
    }
}

impl Validator for NotekeeperHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_list_matching_commands_with_descriptions() {
        let pairs = completions("/si");
        let names: Vec<_> = pairs.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(names, vec!["/signin ", "/signup ", "/signout"]);
        assert!(pairs[1].display.contains("create an account"));

        assert_eq!(completions("/ref")[0].replacement, "/refresh");
        assert!(completions("/add buy").is_empty());
        assert!(completions("add").is_empty());
    }

    #[test]
    fn test_hint_shows_rest_of_name_and_usage() {
        assert_eq!(hint_for("/a").as_deref(), Some("dd <text>"));
        assert_eq!(hint_for("/add").as_deref(), Some(" <text>"));
        assert_eq!(hint_for("/add ").as_deref(), Some("<text>"));
        assert_eq!(hint_for("/refr").as_deref(), Some("esh"));
        assert_eq!(hint_for("/refresh"), None);
        assert_eq!(hint_for("/add milk"), None);
        assert_eq!(hint_for("/nope"), None);
    }

    #[test]
    fn test_passwords_are_masked_while_typing() {
        colored::control::set_override(false);
        assert_eq!(mask_line("/password hunter2"), "/password *******");
        assert_eq!(
            mask_line("/signin a@example.com secret12"),
            "/signin a@example.com ********"
        );
        assert_eq!(mask_line("/add my secret"), "/add my secret");
        assert_eq!(mask_line("/unknown x"), "/unknown x");
    }
}
