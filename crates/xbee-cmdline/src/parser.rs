//! Splitting a received command line into arguments.

use crate::error::{CmdLineError, CmdResult};

/// Maximum number of arguments, command included, accepted by default.
pub const DEFAULT_MAX_ARGS: usize = 1;

/// Argument separator.
pub const ARG_SEPARATOR: u8 = b' ';

/// Returns the part of `data` before the first NUL byte.
pub fn line_of(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}

/// Split a command line into at most `max_args` arguments.
///
/// The line ends at the first NUL byte. Runs of spaces separate arguments and
/// are otherwise ignored, so an empty or all-space line yields no arguments.
pub fn tokenize(data: &[u8], max_args: usize) -> CmdResult<Vec<&str>> {
    let mut args = Vec::with_capacity(max_args);

    for token in line_of(data)
        .split(|&b| b == ARG_SEPARATOR)
        .filter(|token| !token.is_empty())
    {
        if args.len() == max_args {
            return Err(CmdLineError::TooManyArgs { max: max_args });
        }
        let arg = std::str::from_utf8(token).map_err(|_| {
            CmdLineError::InvalidArg(String::from_utf8_lossy(token).into_owned())
        })?;
        args.push(arg);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command() {
        assert_eq!(tokenize(b"on", 1), Ok(vec!["on"]));
    }

    #[test]
    fn test_stops_at_nul() {
        assert_eq!(tokenize(b"off\0garbage after", 1), Ok(vec!["off"]));
        assert_eq!(line_of(b"ab\0cd"), b"ab");
        assert_eq!(line_of(b"abcd"), b"abcd");
    }

    #[test]
    fn test_spaces_are_collapsed() {
        assert_eq!(tokenize(b"  set   rate 10 ", 3), Ok(vec!["set", "rate", "10"]));
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(tokenize(b"", 1), Ok(vec![]));
        assert_eq!(tokenize(b"   ", 1), Ok(vec![]));
        assert_eq!(tokenize(b"\0on", 1), Ok(vec![]));
    }

    #[test]
    fn test_too_many_args() {
        assert_eq!(tokenize(b"on now", 1), Err(CmdLineError::TooManyArgs { max: 1 }));
        assert_eq!(tokenize(b"a b c", 2), Err(CmdLineError::TooManyArgs { max: 2 }));
        // Trailing spaces do not count as an argument.
        assert_eq!(tokenize(b"on  ", 1), Ok(vec!["on"]));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(tokenize(&[0xFF, 0xFE], 1), Err(CmdLineError::InvalidArg(_))));
    }
}
