use crate::workflow::runner::Operator;
use anyhow::{bail, Context};
use std::io::{BufRead, Write};
use surveycore::sequencer::PendingRetry;
use surveycore::RetryDecision;

pub const HELP: &str = "\
commands:
  X Y | measure X Y        measure a new point at floorplan position (X, Y)
  remove X Y               remove the point shown at (X, Y)
  move X Y NEWX NEWY       move the point shown at (X, Y)
  list                     list surveyed points
  help                     show this text
  quit                     save and exit";

/// One line of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Measure { x: i32, y: i32 },
    Remove { x: i32, y: i32 },
    Move { x: i32, y: i32, to_x: i32, to_y: i32 },
    List,
    Help,
    Quit,
}

fn coordinates<const N: usize>(verb: &str, args: &[&str]) -> anyhow::Result<[i32; N]> {
    if args.len() != N {
        bail!("`{verb}` takes {N} coordinates, got {}", args.len());
    }
    let mut values = [0; N];
    for (slot, arg) in values.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .with_context(|| format!("`{arg}` is not a pixel coordinate"))?;
    }
    Ok(values)
}

/// Parse a console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "measure" | "m" => {
            let [x, y] = coordinates::<2>("measure", args)?;
            Command::Measure { x, y }
        }
        "remove" | "rm" => {
            let [x, y] = coordinates::<2>("remove", args)?;
            Command::Remove { x, y }
        }
        "move" | "mv" => {
            let [x, y, to_x, to_y] = coordinates::<4>("move", args)?;
            Command::Move { x, y, to_x, to_y }
        }
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ if verb.parse::<i32>().is_ok() => {
            let [x, y] = coordinates::<2>("measure", &words)?;
            Command::Measure { x, y }
        }
        other => bail!("unknown command `{other}`; try `help`"),
    };
    Ok(Some(command))
}

/// Line-oriented operator console over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    /// Prompt and read one line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{prompt}").context("writing prompt")?;
        self.output.flush().context("flushing prompt")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("reading operator input")?;
        Ok((read > 0).then(|| line.trim().to_string()))
    }

    /// Next command, skipping blank and malformed lines. End of input quits.
    pub fn next_command(&mut self) -> anyhow::Result<Command> {
        loop {
            let Some(line) = self.ask("survey> ")? else {
                return Ok(Command::Quit);
            };
            match parse_command(&line) {
                Ok(Some(command)) => return Ok(command),
                Ok(None) => continue,
                Err(err) => self.say(&format!("{err:#}")),
            }
        }
    }
}

impl<R: BufRead, W: Write> Operator for Console<R, W> {
    fn retry_decision(&mut self, pending: &PendingRetry) -> Option<RetryDecision> {
        self.say(&format!("iperf error: {}.", pending.message()));
        loop {
            let answer = match self.ask("[r]etry, [k]eep error result or [a]bort point? ") {
                Ok(Some(answer)) => answer.to_ascii_lowercase(),
                _ => return None,
            };
            match answer.as_str() {
                "r" | "retry" | "y" | "yes" => return Some(RetryDecision::Retry),
                "k" | "keep" | "n" | "no" => return Some(RetryDecision::KeepError),
                "a" | "abort" => return None,
                _ => self.say("please answer r, k or a"),
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let answer = match self.ask(&format!("{question} [y/n] ")) {
                Ok(Some(answer)) => answer.to_ascii_lowercase(),
                _ => return false,
            };
            match answer.as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.say("please answer y or n"),
            }
        }
    }

    fn notify(&mut self, message: &str) {
        self.say(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use surveycore::collector::{MeasurementResult, ThroughputProbe};

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn parses_measure_forms() {
        assert_eq!(
            parse_command("measure 120 340").unwrap(),
            Some(Command::Measure { x: 120, y: 340 })
        );
        assert_eq!(
            parse_command("  15 -3 ").unwrap(),
            Some(Command::Measure { x: 15, y: -3 })
        );
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn parses_edit_commands() {
        assert_eq!(
            parse_command("move 1 2 30 40").unwrap(),
            Some(Command::Move {
                x: 1,
                y: 2,
                to_x: 30,
                to_y: 40
            })
        );
        assert_eq!(
            parse_command("RM 5 6").unwrap(),
            Some(Command::Remove { x: 5, y: 6 })
        );
        assert_eq!(parse_command("list").unwrap(), Some(Command::List));
        assert_eq!(parse_command("q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("measure 1").is_err());
        assert!(parse_command("move 1 2 3").is_err());
        assert!(parse_command("remove a b").is_err());
        assert!(parse_command("dance").is_err());
        assert!(parse_command("1 2 3").is_err());
    }

    #[test]
    fn next_command_skips_noise_and_quits_at_eof() {
        let mut console = console("\nbogus\n10 20\n");
        assert_eq!(
            console.next_command().unwrap(),
            Command::Measure { x: 10, y: 20 }
        );
        assert_eq!(console.next_command().unwrap(), Command::Quit);
        let output = String::from_utf8(console.output).unwrap();
        assert!(output.contains("unknown command `bogus`"));
    }

    #[test]
    fn retry_prompt_maps_answers() {
        let pending = PendingRetry {
            probe: ThroughputProbe::UDP_UPLOAD,
            result: MeasurementResult::Error("the server is busy".into()),
        };
        let mut console = console("what\nr\nk\na\n");
        assert_eq!(console.retry_decision(&pending), Some(RetryDecision::Retry));
        assert_eq!(
            console.retry_decision(&pending),
            Some(RetryDecision::KeepError)
        );
        assert_eq!(console.retry_decision(&pending), None);
        assert_eq!(console.retry_decision(&pending), None);
        let output = String::from_utf8(console.output).unwrap();
        assert!(output.contains("iperf error: the server is busy."));
        assert!(output.contains("please answer r, k or a"));
    }

    #[test]
    fn confirm_defaults_to_no_at_eof() {
        let mut console = console("yes\nn\n");
        assert!(console.confirm("Remove point at (1, 2)?"));
        assert!(!console.confirm("Remove point at (1, 2)?"));
        assert!(!console.confirm("Remove point at (1, 2)?"));
    }
}
