//! Interactive numbered menu over any line-based input.
use crate::console::execute;
use crate::console::Command;
use crate::console::ConsoleOptions;
use crate::graph::DriveBrowser;
use crate::spreadsheet::WorkbookSource;
use std::io;
use std::io::BufRead;
use std::io::Write;
use tracing::debug;

const MENU: &str = "\
Choose an option:
0. Exit
1. Show access token
2. Show drive information
3. List drive contents
4. List spreadsheet files and their worksheets
5. Read every worksheet of a file
6. Read a range of a worksheet
";

/// Reads one line without its line terminator; None at end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> io::Result<Option<String>> {
    writeln!(output, "{message}")?;
    output.flush()?;
    Ok(read_line(input)?.map(|line| line.trim().to_owned()))
}

/// Asks for the arguments of a menu choice; None when the choice is unknown
/// or the input ended.
fn read_command<R: BufRead, W: Write>(choice: &str, input: &mut R, output: &mut W) -> io::Result<Option<Command>> {
    Ok(match choice {
        "1" => Some(Command::Token),
        "2" => Some(Command::Drive),
        "3" => Some(Command::Contents),
        "4" => Some(Command::Files),
        "5" => prompt(input, output, "Enter the file id:")?.map(|file_id| Command::Read { file_id }),
        "6" => {
            let Some(file_id) = prompt(input, output, "Enter the file id:")? else {
                return Ok(None);
            };
            let Some(worksheet) = prompt(input, output, "Enter the worksheet name (e.g. Sheet1):")? else {
                return Ok(None);
            };
            let Some(address) = prompt(input, output, "Enter the range (e.g. A1:C3):")? else {
                return Ok(None);
            };
            Some(Command::Range {
                file_id,
                worksheet,
                address,
            })
        }
        _ => None,
    })
}

/// Runs the menu until `0` is chosen or the input ends.
///
/// Command failures are printed and the menu continues; only I/O errors on
/// `input` or `output` end the loop early.
pub fn run<S, R, W>(session: &S, options: &ConsoleOptions, mut input: R, mut output: W) -> io::Result<()>
where
    S: DriveBrowser + WorkbookSource,
    R: BufRead,
    W: Write,
{
    loop {
        output.write_all(MENU.as_bytes())?;
        output.flush()?;
        let Some(line) = read_line(&mut input)? else {
            return Ok(());
        };
        let choice = line.trim();
        if choice == "0" {
            writeln!(output, "Goodbye...")?;
            return Ok(());
        }
        match read_command(choice, &mut input, &mut output)? {
            Some(command) => {
                debug!(?command, "Running menu command");
                writeln!(output)?;
                match execute(session, options, &command) {
                    Ok(text) => writeln!(output, "{text}")?,
                    Err(error) => writeln!(output, "Error: {error}")?,
                }
            }
            None if matches!(choice, "5" | "6") => return Ok(()),
            None => writeln!(output, "Invalid choice! Please try again.")?,
        }
    }
}
