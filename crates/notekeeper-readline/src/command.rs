//! REPL command parsing.

/// One slash command as shown by `/help`, completion and hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Argument placeholders, empty when the command takes none
    pub usage: &'static str,
    pub about: &'static str,
    /// Index of the first argument that is a password
    pub secret_from: Option<usize>,
}

const fn spec(
    name: &'static str,
    usage: &'static str,
    about: &'static str,
    secret_from: Option<usize>,
) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        about,
        secret_from,
    }
}

/// Every slash command, in `/help` order.
pub const COMMANDS: &[CommandSpec] = &[
    spec("/email", "<address>", "set the form's email", None),
    spec("/password", "<secret>", "set the form's password", Some(0)),
    spec("/toggle", "", "switch between Sign In and Sign Up", None),
    spec("/submit", "", "submit the form (signs out when signed in)", None),
    spec("/signin", "<email> <password>", "sign in directly", Some(1)),
    spec("/signup", "<email> <password>", "create an account and sign in", Some(1)),
    spec("/signout", "", "sign out", None),
    spec("/add", "<text>", "add a note", None),
    spec("/rm", "<number|id>", "delete a note", None),
    spec("/refresh", "", "reload notes from the store", None),
    spec("/delete-account", "", "delete all notes, then the account", None),
    spec("/dismiss", "", "dismiss the pending error", None),
    spec("/notes", "", "show the current screen", None),
    spec("/help", "", "show this help", None),
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Email(String),
    Password(String),
    Toggle,
    Submit,
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignOut,
    Add(String),
    Remove(String),
    Refresh,
    DeleteAccount,
    Dismiss,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Lines carrying a password stay out of the history.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::Password(_) | Self::SignIn { .. } | Self::SignUp { .. }
        )
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line == "quit" || line == "exit" {
        return Ok(Command::Quit);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let required = |what: &str| {
        if rest.is_empty() {
            Err(format!("{name} needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };
    let credentials = || match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [email, password] => Ok((email.to_string(), password.to_string())),
        _ => Err(format!("usage: {name} <email> <password>")),
    };

    match name {
        "/email" => required("an address").map(Command::Email),
        "/password" => required("a password").map(Command::Password),
        "/toggle" => Ok(Command::Toggle),
        "/submit" => Ok(Command::Submit),
        "/signin" => credentials().map(|(email, password)| Command::SignIn { email, password }),
        "/signup" => credentials().map(|(email, password)| Command::SignUp { email, password }),
        "/signout" => Ok(Command::SignOut),
        // Blank text is passed through; the synchronizer rejects it.
        "/add" => Ok(Command::Add(rest.to_string())),
        "/rm" => required("a note number or id").map(Command::Remove),
        "/refresh" => Ok(Command::Refresh),
        "/delete-account" => Ok(Command::DeleteAccount),
        "/dismiss" => Ok(Command::Dismiss),
        "/notes" => Ok(Command::Show),
        "/help" => Ok(Command::Help),
        other if other.starts_with('/') => Err(format!("Unknown command: {other}")),
        _ => Err("Commands start with '/'. Type /help for a list.".to_string()),
    }
}
