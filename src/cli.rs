//! Console helpers for the interactive query client.
//!
//! Input is read one line at a time; every line is a query, and `bye` (in any case) also
//! asks the server to end the session.
use std::{fmt::Display, io::BufRead};

use log::warn;

use crate::protocol::is_bye;

/// A line typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Plain query text.
    Query(String),
    /// `bye`: query, then wait for the server to close the connection.
    Bye(String),
}

impl Command {
    pub fn text(&self) -> &str {
        match self {
            Command::Query(s) | Command::Bye(s) => s,
        }
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        if is_bye(&line) {
            Command::Bye(line)
        } else {
            Command::Query(line)
        }
    }
}

/// Reads one line without its terminator. Invalid UTF-8 is replaced with U+FFFD.
///
/// End of input and read faults both yield `None`; nothing more can be read either way.
pub fn read_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();

    match reader.read_until(b'\n', &mut buf) {
        Ok(0) => None,
        Ok(_) => {
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
        Err(e) => {
            warn!("failed to read input, treating as end of input: {e}");
            None
        }
    }
}

/// Transcript line for one exchange.
pub fn format_exchange(line: &str, response: impl Display) -> String {
    format!("{line}  ->  doSearch -> {response}")
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, Read};

    use super::*;
    use crate::protocol::QueryRequest;

    #[test]
    fn read_line_strips_terminators() {
        let mut input = &b"hello\nworld\r\nlast"[..];

        assert_eq!(read_line(&mut input), Some(String::from("hello")));
        assert_eq!(read_line(&mut input), Some(String::from("world")));
        assert_eq!(read_line(&mut input), Some(String::from("last")));
        assert_eq!(read_line(&mut input), None);
    }

    #[test]
    fn read_line_replaces_invalid_utf8() {
        let mut input = &b"hello\n\xffabc\nworld\n"[..];

        assert_eq!(read_line(&mut input), Some(String::from("hello")));
        assert_eq!(read_line(&mut input), Some(String::from("\u{FFFD}abc")));
        assert_eq!(read_line(&mut input), Some(String::from("world")));
        assert_eq!(read_line(&mut input), None);
    }

    #[test]
    fn read_line_keeps_empty_lines() {
        let mut input = &b"\n"[..];

        assert_eq!(read_line(&mut input), Some(String::default()));
    }

    struct Faulty;

    impl Read for Faulty {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("broken pipe"))
        }
    }

    #[test]
    fn read_fault_is_end_of_input() {
        let mut input = BufReader::new(Faulty);

        assert_eq!(read_line(&mut input), None);
    }

    #[test]
    fn bye_command_any_case() {
        for line in ["bye", "BYE", "Bye"] {
            let cmd: Command = line.to_string().into();
            assert_eq!(cmd, Command::Bye(line.to_string()));
        }

        let cmd: Command = String::from("byebye").into();
        assert_eq!(cmd, Command::Query(String::from("byebye")));
        assert_eq!(cmd.text(), "byebye");
    }

    #[test]
    fn bye_detection_agrees_with_requests() {
        for line in ["bye", "BYE", "bYe", "bye ", " bye", "goodbye", "", "\u{212A}bye"] {
            let cmd: Command = line.to_string().into();
            assert_eq!(
                matches!(cmd, Command::Bye(_)),
                QueryRequest::song(line).is_bye(),
                "disagreement on {line:?}"
            );
        }
    }

    #[test]
    fn exchange_format() {
        assert_eq!(
            format_exchange("hello", "ECHO:hello"),
            "hello  ->  doSearch -> ECHO:hello"
        );
    }
}
