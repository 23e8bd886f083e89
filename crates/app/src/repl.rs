use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use exam_core::model::{ChoiceKey, QuestionId};
use exam_core::reveal::RevealMode;
use exam_core::scoring::{self, OptionStatus, SheetStatus};
use services::{
    AnswerOutcome, ConfirmGate, ConfirmPrompt, QuestionView, ResetOutcome, RevealOutcome,
    SessionController, SubmitOutcome,
};

/// Line input shared by the command loop and the confirmation prompt.
#[derive(Clone)]
pub struct SharedInput(Arc<Mutex<Box<dyn BufRead + Send>>>);

impl SharedInput {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(reader))))
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut reader = self
            .0
            .lock()
            .map_err(|_| io::Error::other("input lock poisoned"))?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Asks on stderr and takes a `y/N` answer from the shared input.
pub struct LineConfirm {
    input: SharedInput,
}

impl LineConfirm {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }
}

impl ConfirmGate for LineConfirm {
    fn confirm(&self, prompt: ConfirmPrompt) -> bool {
        eprint!("{prompt} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        match self.input.read_line() {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Show,
    Next,
    Prev,
    Page(usize),
    Pick { id: QuestionId, key: ChoiceKey },
    Answer { id: QuestionId, keys: Vec<ChoiceKey> },
    Check(QuestionId),
    Submit(Option<usize>),
    Fav(QuestionId),
    Search(String),
    Favs(bool),
    Jump(QuestionId),
    Sheet,
    Score,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CommandError {
    Unknown(String),
    MissingArgument { command: &'static str, argument: &'static str },
    InvalidPage(String),
    InvalidToggle(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            CommandError::MissingArgument { command, argument } => {
                write!(f, "{command} needs {argument}")
            }
            CommandError::InvalidPage(raw) => write!(f, "not a page number: {raw}"),
            CommandError::InvalidToggle(raw) => write!(f, "expected on or off, got {raw}"),
        }
    }
}

fn required<'a>(
    value: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    value
        .filter(|raw| !raw.is_empty())
        .ok_or(CommandError::MissingArgument { command, argument })
}

fn page_number(raw: &str) -> Result<usize, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidPage(raw.to_string()))
}

/// Keys may be separated by commas and/or whitespace: `A,C`, `A C`, `a, c`.
fn choice_keys(raw: &str) -> Vec<ChoiceKey> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| ChoiceKey::new(token.to_uppercase()))
        .collect()
}

/// `Ok(None)` for a blank line.
fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let command = match word.to_ascii_lowercase().as_str() {
        "show" | "s" => Command::Show,
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "page" => Command::Page(page_number(required(args.next(), "page", "a number")?)?),
        "pick" => {
            let id = required(args.next(), "pick", "a question id")?;
            let key = required(args.next(), "pick", "a choice key")?;
            Command::Pick {
                id: QuestionId::new(id),
                key: ChoiceKey::new(key.to_uppercase()),
            }
        }
        "answer" => {
            let id = required(args.next(), "answer", "a question id")?;
            let keys = choice_keys(rest.get(id.len()..).unwrap_or_default());
            Command::Answer {
                id: QuestionId::new(id),
                keys,
            }
        }
        "check" => Command::Check(QuestionId::new(required(
            args.next(),
            "check",
            "a question id",
        )?)),
        "submit" => Command::Submit(args.next().map(page_number).transpose()?),
        "fav" => Command::Fav(QuestionId::new(required(args.next(), "fav", "a question id")?)),
        "search" => Command::Search(rest.to_string()),
        "favs" => match required(args.next(), "favs", "on or off")? {
            "on" => Command::Favs(true),
            "off" => Command::Favs(false),
            other => return Err(CommandError::InvalidToggle(other.to_string())),
        },
        "jump" => Command::Jump(QuestionId::new(required(args.next(), "jump", "a question id")?)),
        "sheet" => Command::Sheet,
        "score" => Command::Score,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

enum Flow {
    Continue,
    Quit,
}

/// Read commands until `quit` or end of input.
pub async fn run<W: Write>(
    mut controller: SessionController,
    input: SharedInput,
    mut out: W,
) -> io::Result<()> {
    render_page(&controller, &mut out)?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = input.read_line()? else {
            writeln!(out)?;
            break;
        };
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if let Flow::Quit = execute(&mut controller, command, &mut out).await? {
                    break;
                }
            }
            Err(err) => writeln!(out, "{err}")?,
        }
    }
    Ok(())
}

async fn execute<W: Write>(
    controller: &mut SessionController,
    command: Command,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        Command::Show => render_page(controller, out)?,
        Command::Next => {
            controller.next_page().await;
            render_page(controller, out)?;
        }
        Command::Prev => {
            controller.previous_page().await;
            render_page(controller, out)?;
        }
        Command::Page(page) => {
            controller.go_to_page(page).await;
            render_page(controller, out)?;
        }
        Command::Pick { id, key } => {
            let outcome = controller.toggle_choice(&id, key).await;
            report_answer(controller, &id, outcome, out)?;
        }
        Command::Answer { id, keys } => {
            let outcome = controller.answer(&id, keys).await;
            report_answer(controller, &id, outcome, out)?;
        }
        Command::Check(id) => match controller.reveal(&id) {
            RevealOutcome::Revealed | RevealOutcome::AlreadyRevealed => {
                report_result(controller, &id, out)?;
            }
            RevealOutcome::UnknownQuestion => writeln!(out, "no question with id {id}")?,
            RevealOutcome::WrongMode => {
                writeln!(out, "answers are checked per page here, use `submit`")?;
            }
        },
        Command::Submit(page) => {
            let page = page.unwrap_or_else(|| controller.current_page());
            match controller.submit_page(page) {
                SubmitOutcome::Submitted { page, score } => {
                    writeln!(
                        out,
                        "page {page}: {}/{} correct ({:.0}%)",
                        score.correct,
                        score.total,
                        score.percent()
                    )?;
                    if page == controller.current_page() {
                        render_page(controller, out)?;
                    }
                }
                SubmitOutcome::Declined => writeln!(out, "submission cancelled")?,
                SubmitOutcome::WrongMode => {
                    writeln!(out, "answers are checked one by one here, use `check ID`")?;
                }
            }
        }
        Command::Fav(id) => match controller.toggle_favorite(&id).await {
            Some(true) => writeln!(out, "{id} added to favorites")?,
            Some(false) => writeln!(out, "{id} removed from favorites")?,
            None => writeln!(out, "no question with id {id}")?,
        },
        Command::Search(text) => {
            controller.set_query(text).await;
            render_page(controller, out)?;
        }
        Command::Favs(on) => {
            controller.set_favorites_only(on).await;
            render_page(controller, out)?;
        }
        Command::Jump(id) => match controller.jump_to_question(&id).await {
            Some(target) => {
                render_page(controller, out)?;
                writeln!(out, "-> #{}", target.anchor)?;
            }
            None => writeln!(out, "no question with id {id}")?,
        },
        Command::Sheet => render_sheet(controller, out)?,
        Command::Score => render_score(controller, out)?,
        Command::Reset => match controller.reset_progress().await {
            ResetOutcome::Reset => writeln!(out, "all answers cleared")?,
            ResetOutcome::Declined => writeln!(out, "reset cancelled")?,
        },
        Command::Help => write_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn report_answer<W: Write>(
    controller: &SessionController,
    id: &QuestionId,
    outcome: AnswerOutcome,
    out: &mut W,
) -> io::Result<()> {
    match outcome {
        AnswerOutcome::Recorded => {
            writeln!(out, "{id}: {}", joined(controller.answer_for(id)))
        }
        AnswerOutcome::Locked => writeln!(out, "{id} is already checked, its answer is final"),
        AnswerOutcome::UnknownQuestion => writeln!(out, "no question with id {id}"),
        AnswerOutcome::InvalidChoice => writeln!(out, "not a valid choice for {id}"),
    }
}

fn report_result<W: Write>(
    controller: &SessionController,
    id: &QuestionId,
    out: &mut W,
) -> io::Result<()> {
    let Some(question) = controller.bank().get(id) else {
        return Ok(());
    };
    let answer = controller.answer_for(id);
    let verdict = if answer.is_empty() {
        "not answered"
    } else if scoring::is_correct(question, answer) {
        "correct"
    } else {
        "wrong"
    };
    writeln!(
        out,
        "{id}: {verdict} (yours: {}, expected: {})",
        joined(answer),
        joined(question.correct_keys())
    )?;
    if let Some(explanation) = question.explanation() {
        writeln!(out, "   {explanation}")?;
    }
    Ok(())
}

fn render_page<W: Write>(controller: &SessionController, out: &mut W) -> io::Result<()> {
    let view = controller.page_view();
    let favorites = controller.favorites_summary();
    write!(
        out,
        "Page {}/{} | answered {:.1}% | favorites {}/{}",
        view.page,
        view.page_count,
        controller.progress_percent(),
        favorites.shown,
        favorites.total
    )?;
    let filter = controller.filter();
    if !filter.query().trim().is_empty() {
        write!(out, " | search {:?}", filter.query().trim())?;
    }
    if filter.favorites_only() {
        write!(out, " | favorites only")?;
    }
    writeln!(out)?;

    if view.is_empty() {
        return writeln!(out, "No questions match the current filter.");
    }
    for question in &view.questions {
        render_question(question, out)?;
    }
    if let Some(score) = view.score {
        writeln!(
            out,
            "Score: {}/{} ({:.0}%)",
            score.correct,
            score.total,
            score.percent()
        )?;
    }
    Ok(())
}

fn render_question<W: Write>(view: &QuestionView<'_>, out: &mut W) -> io::Result<()> {
    let question = view.question;
    writeln!(out)?;
    writeln!(
        out,
        "{}. [{}] {}  (id {}){}",
        view.number,
        question.kind().label(),
        question.prompt(),
        question.id(),
        if view.is_favorite { " *" } else { "" }
    )?;
    for option in &view.options {
        let marker = match option.status {
            OptionStatus::Default => "[ ]",
            OptionStatus::Selected => "[x]",
            OptionStatus::Correct => "[+]",
            OptionStatus::Wrong => "[-]",
        };
        writeln!(out, "   {marker} {}", option.text)?;
    }
    if let Some(correct) = view.correct {
        let verdict = if correct { "correct" } else { "wrong" };
        writeln!(out, "   => {verdict}, answer {}", joined(question.correct_keys()))?;
        if let Some(explanation) = question.explanation() {
            writeln!(out, "   {explanation}")?;
        }
    }
    Ok(())
}

fn render_sheet<W: Write>(controller: &SessionController, out: &mut W) -> io::Result<()> {
    let sheet = controller.answer_sheet();
    if sheet.is_empty() {
        return writeln!(out, "No questions on this page.");
    }
    for row in sheet.chunks(10) {
        let cells: Vec<String> = row
            .iter()
            .map(|entry| {
                let mark = match entry.status {
                    SheetStatus::Unanswered => '.',
                    SheetStatus::Answered => 'o',
                    SheetStatus::Correct => '+',
                    SheetStatus::Wrong => '-',
                    SheetStatus::Missed => '!',
                };
                format!("{:>4}{mark}", entry.number)
            })
            .collect();
        writeln!(out, "{}", cells.join(""))?;
    }
    writeln!(out, "(. open  o answered  + correct  - wrong  ! missed)")
}

fn render_score<W: Write>(controller: &SessionController, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "answered {}/{} ({:.1}%)",
        controller.answers().answered_count(),
        controller.bank().len(),
        controller.progress_percent()
    )?;
    if controller.reveal_mode() == RevealMode::PerPage {
        let page = controller.current_page();
        match controller.page_score(page) {
            Some(score) => writeln!(out, "page {page}: {}/{} correct", score.correct, score.total)?,
            None => writeln!(out, "page {page} is not submitted yet")?,
        }
    }
    Ok(())
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "show | next | prev | page N       navigate")?;
    writeln!(out, "pick ID KEY                      click one option")?;
    writeln!(out, "answer ID KEYS                   set the whole selection, e.g. A,C")?;
    writeln!(out, "check ID                         show the result of one question")?;
    writeln!(out, "submit [N]                       submit a page (per-page mode)")?;
    writeln!(out, "fav ID | favs on|off             favorites")?;
    writeln!(out, "search TEXT                      filter; `search` alone clears")?;
    writeln!(out, "jump ID                          go to a question")?;
    writeln!(out, "sheet | score | reset | quit")
}

fn joined(keys: &[ChoiceKey]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.iter()
        .map(ChoiceKey::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use exam_core::model::{QuestionBank, QuestionRecord};
    use services::SessionConfig;
    use storage::repository::Storage;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("page 3"), Ok(Some(Command::Page(3))));
        assert_eq!(
            parse_command("pick 12 b"),
            Ok(Some(Command::Pick {
                id: QuestionId::new("12"),
                key: ChoiceKey::new("B"),
            }))
        );
        assert_eq!(
            parse_command("answer 7 a, c"),
            Ok(Some(Command::Answer {
                id: QuestionId::new("7"),
                keys: vec![ChoiceKey::new("A"), ChoiceKey::new("C")],
            }))
        );
        assert_eq!(
            parse_command("search  tcp handshake "),
            Ok(Some(Command::Search("tcp handshake".into())))
        );
        assert_eq!(parse_command("submit"), Ok(Some(Command::Submit(None))));
        assert_eq!(parse_command("favs on"), Ok(Some(Command::Favs(true))));
    }

    #[test]
    fn reports_bad_commands() {
        assert!(matches!(parse_command("dance"), Err(CommandError::Unknown(_))));
        assert!(matches!(
            parse_command("page two"),
            Err(CommandError::InvalidPage(_))
        ));
        assert!(matches!(
            parse_command("jump"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_command("favs maybe"),
            Err(CommandError::InvalidToggle(_))
        ));
    }

    async fn controller(input: SharedInput, mode: RevealMode) -> SessionController {
        let records = (1..=3)
            .map(|n| QuestionRecord {
                id: n.to_string(),
                kind: "单选题".into(),
                question: format!("Prompt {n}"),
                options: vec!["A. left".into(), "B. right".into()],
                answer: vec!["B".into()],
                analysis: "Because right.".into(),
            })
            .collect();
        let bank = Arc::new(QuestionBank::from_records(records).unwrap());
        let config = SessionConfig::default().with_reveal_mode(mode);
        SessionController::open(
            bank,
            config,
            Storage::in_memory().kv,
            Arc::new(LineConfirm::new(input)),
        )
        .await
    }

    async fn transcript(script: &str, mode: RevealMode) -> String {
        let input = SharedInput::new(Cursor::new(script.as_bytes().to_vec()));
        let session = controller(input.clone(), mode).await;
        let mut out = Vec::new();
        run(session, input, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn per_question_check_shows_the_verdict() {
        let out = transcript("pick 1 a\ncheck 1\npick 1 b\nquit\n", RevealMode::PerQuestion).await;
        assert!(out.contains("Page 1/1"));
        assert!(out.contains("1: A"));
        assert!(out.contains("1: wrong (yours: A, expected: B)"));
        assert!(out.contains("Because right."));
        assert!(out.contains("1 is already checked"));
    }

    #[tokio::test]
    async fn submit_reads_the_confirmation_from_the_same_input() {
        let out = transcript(
            "answer 1 B\nanswer 2 B\nsubmit\ny\nscore\n",
            RevealMode::PerPage,
        )
        .await;
        assert!(out.contains("page 1: 2/3 correct"));
        assert!(out.contains("Score: 2/3"));
    }

    #[tokio::test]
    async fn declined_reset_keeps_answers() {
        let out = transcript("answer 3 A\nreset\nno\nscore\n", RevealMode::PerQuestion).await;
        assert!(out.contains("reset cancelled"));
        assert!(out.contains("answered 1/3"));
    }
}
