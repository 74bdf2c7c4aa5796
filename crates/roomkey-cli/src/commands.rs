//! Emulator console commands.

use anyhow::{Context, Result, bail};
use roomkey_core::{CardUid, RoomId};

pub const HELP: &str = "\
commands:
  card <uid-hex> [room]   register a card, optionally holding a room
  tap <uid-hex>           present a registered card
  toggle                  press the mode button
  room <id>               override the assigned room
  status                  show mode, room and uptime
  display                 redraw the LCD
  help                    this text
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Card { uid: CardUid, room: Option<RoomId> },
    Tap(CardUid),
    Toggle,
    /// Raw room text; the terminal trims it and ignores blank input.
    Room(String),
    Status,
    Display,
    Help,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns an error for an unknown command, a missing argument or a bad UID.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "card" => {
            let uid = parse_uid(words.next())?;
            let room = words
                .next()
                .map(RoomId::new)
                .transpose()
                .context("invalid room")?;
            Command::Card { uid, room }
        }
        "tap" => Command::Tap(parse_uid(words.next())?),
        "toggle" => Command::Toggle,
        "room" => {
            let rest = line.trim_start()[name.len()..].to_string();
            if rest.trim().is_empty() {
                bail!("usage: room <id>");
            }
            Command::Room(rest)
        }
        "status" => Command::Status,
        "display" | "lcd" => Command::Display,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command {other:?}, try `help`"),
    };
    Ok(Some(command))
}

fn parse_uid(word: Option<&str>) -> Result<CardUid> {
    let word = word.context("missing card UID")?;
    let hex: String = word.chars().filter(|c| *c != ':').collect();
    CardUid::from_hex(&hex).with_context(|| format!("invalid card UID {word:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn uid(hex: &str) -> CardUid {
        CardUid::from_hex(hex).unwrap()
    }

    #[test]
    fn test_card_with_room() {
        assert_eq!(
            parse("card 04abcdef 101").unwrap(),
            Some(Command::Card {
                uid: uid("04abcdef"),
                room: Some(RoomId::new("101").unwrap()),
            })
        );
    }

    #[test]
    fn test_blank_card() {
        assert_eq!(
            parse("card 04:AB:CD:EF").unwrap(),
            Some(Command::Card {
                uid: uid("04abcdef"),
                room: None,
            })
        );
    }

    #[rstest]
    #[case("tap 04abcdef", Command::Tap(uid("04abcdef")))]
    #[case("TOGGLE", Command::Toggle)]
    #[case("status", Command::Status)]
    #[case("lcd", Command::Display)]
    #[case("?", Command::Help)]
    #[case("exit", Command::Quit)]
    fn test_simple_commands(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse(line).unwrap(), Some(expected));
    }

    #[test]
    fn test_room_keeps_raw_text() {
        assert_eq!(
            parse("room  204 ").unwrap(),
            Some(Command::Room("  204 ".to_string()))
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[rstest]
    #[case("tap")]
    #[case("tap xyz")]
    #[case("tap 0401")]
    #[case("room")]
    #[case("unlock 101")]
    fn test_rejected(#[case] line: &str) {
        assert!(parse(line).is_err());
    }
}
