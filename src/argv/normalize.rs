use log::debug;

use super::{SEPARATOR, escape_all};

/// How option tokens are laid out after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One flag occurrence per value, wildcards escaped.
    Flattened,
    /// One occurrence per flag carrying all of its values.
    Grouped,
}

/// Normalize `args` with the given layout.
pub fn normalize<S: AsRef<str>>(args: &[S], layout: Layout) -> Vec<String> {
    match layout {
        Layout::Flattened => flatten(args),
        Layout::Grouped => group(args),
    }
}

fn is_flag(token: &str) -> bool {
    token.starts_with("--")
}

/// Move positional arguments in front of options, repeating a flag before
/// each of its values.
///
/// `--exclude a b` becomes `--exclude a --exclude b`. Only the option part is
/// escaped; positional arguments are left for the parser as they are.
pub fn flatten<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut arguments: Vec<String> = Vec::new();
    let mut options: Vec<String> = Vec::new();
    // Empty while reading positional arguments
    let mut option_name = "";

    for arg in args {
        let arg = arg.as_ref();
        if arg == SEPARATOR {
            option_name = "";
            continue;
        }

        if is_flag(arg) {
            option_name = arg;
            options.push(arg.to_string());
        } else if !option_name.is_empty() {
            if options.last().map(String::as_str) != Some(option_name) {
                options.push(option_name.to_string());
            }
            options.push(arg.to_string());
        } else {
            arguments.push(arg.to_string());
        }
    }

    debug!("Arguments: {:?}", arguments);
    debug!("Options: {:?}", options);

    arguments.extend(escape_all(&options));
    debug!("Processed argv: {:?}", arguments);
    arguments
}

/// Move positional arguments in front of options, collecting every value of
/// a flag behind its first occurrence.
///
/// `--exclude a --base x --exclude b` becomes `--exclude a b --base x`.
pub fn group<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut arguments: Vec<String> = Vec::new();
    // First-seen order matters, so a Vec of pairs rather than a map
    let mut options: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;

    for arg in args {
        let arg = arg.as_ref();
        if arg == SEPARATOR {
            current = None;
            continue;
        }

        if is_flag(arg) {
            let index = match options.iter().position(|(name, _)| name == arg) {
                Some(index) => index,
                None => {
                    options.push((arg.to_string(), Vec::new()));
                    options.len() - 1
                }
            };
            current = Some(index);
        } else if let Some(index) = current {
            options[index].1.push(arg.to_string());
        } else {
            arguments.push(arg.to_string());
        }
    }

    debug!("Arguments: {:?}", arguments);
    debug!("Options: {:?}", options);

    for (name, values) in options {
        arguments.push(name);
        arguments.extend(values);
    }
    debug!("Processed argv: {:?}", arguments);
    arguments
}
