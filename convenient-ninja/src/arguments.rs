// Command line tokenizer for compilation database `arguments` arrays
// Best-effort: no shell quoting grammar, quoted arguments containing spaces stay split

/// Flags that are stripped from every command line
const DROPPED_FLAGS: &[&str] = &["-fexperimental-new-pass-manager"];

/// Split a single-line compiler command into compilation database arguments
///
/// - whitespace runs separate tokens
/// - a standalone `-I` is glued to the token after it (`-I foo` -> `-Ifoo`)
/// - bare `$` tokens (ninja line continuations) are dropped
/// - flags in [`DROPPED_FLAGS`] are dropped
/// - backslashes are removed and a doubled `""` collapses to `"`
pub fn parse_arguments(command: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut tokens = command.split_whitespace();

    while let Some(token) = tokens.next() {
        let mut arg = token.to_string();
        if arg == "-I" {
            if let Some(path) = tokens.next() {
                arg.push_str(path);
            }
        }

        if arg == "$" || DROPPED_FLAGS.contains(&arg.as_str()) {
            continue;
        }

        arguments.push(arg.replace('\\', "").replace("\"\"", "\""));
    }

    arguments
}
