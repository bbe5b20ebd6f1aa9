use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Makes a path safe to pass as a positional argument.
///
/// Decoders parse their own flags, so a relative path beginning with `-`
/// would be read as an option. Such paths get a `./` prefix; everything else
/// is passed through untouched (including non-UTF-8 names).
pub fn safe_path_arg(path: &Path) -> Cow<'_, OsStr> {
    if path.as_os_str().to_string_lossy().starts_with('-') {
        let mut prefixed = OsString::from("./");
        prefixed.push(path.as_os_str());
        Cow::Owned(prefixed)
    } else {
        Cow::Borrowed(path.as_os_str())
    }
}

/// Renders a program and its arguments for logs, quoting arguments with spaces.
pub fn display_command<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    std::iter::once(program.as_os_str())
        .chain(args.iter().map(|a| a.as_ref()))
        .map(|part| {
            let s = part.to_string_lossy();
            if s.is_empty() || s.contains(char::is_whitespace) {
                format!("\"{}\"", s)
            } else {
                s.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
