use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use atty::Stream;
use clap::{Args, Parser, Subcommand};
use lexiquiz_rs::{
    AnswerOutcome, Feedback, QuizConfig, QuizSession, Relation, RelationLookup, SentenceJournal,
    SentenceOutcome, Severity, SuggestionEngine, SuggestionView, SystemSpeaker,
    compute_suggestions,
    relation::DEFAULT_ENDPOINT,
    suggest::suggestion_view,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "lexiquiz-rs", about = "Practice synonyms, antonyms and sentences", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Relation service endpoint.
    #[arg(long, global = true, env = "LEXIQUIZ_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Relation lookup timeout in milliseconds.
    #[arg(long, global = true, env = "LEXIQUIZ_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Grade against the offline lists only.
    #[arg(long, global = true, env = "LEXIQUIZ_OFFLINE")]
    offline: bool,

    /// JSON word list to quiz on.
    #[arg(long, global = true, env = "LEXIQUIZ_WORDS")]
    words: Option<PathBuf>,

    /// File where submitted sentences are kept.
    #[arg(long, global = true, env = "LEXIQUIZ_SENTENCES")]
    sentences: Option<PathBuf>,

    /// Shuffle the word list after loading.
    #[arg(long, global = true)]
    shuffle: bool,
}

impl SettingsArgs {
    fn to_config(&self) -> QuizConfig {
        QuizConfig {
            relation_endpoint: self.endpoint.clone(),
            request_timeout: Duration::from_millis(self.timeout_ms.max(1)),
            offline: self.offline,
            words_path: self.words.clone(),
            sentences_path: self.sentences.clone(),
            shuffle: self.shuffle,
            ..QuizConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an interactive quiz over the word list.
    Quiz,
    /// Grade a single answer.
    Check {
        /// The quiz word.
        word: String,
        /// `synonym` or `antonym`.
        relation: Relation,
        /// The learner's answer.
        answer: String,
    },
    /// List offline suggestions for a prefix.
    Suggest {
        /// `synonym` or `antonym`.
        relation: Relation,
        /// Prefix typed so far.
        prefix: String,
    },
    /// Show the saved sentence history.
    Sentences,
    /// Serve the quiz over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);
    let config = cli.settings.to_config();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    match cli.command {
        Command::Quiz => runtime.block_on(handle_quiz(&config, cli.json)),
        Command::Check {
            word,
            relation,
            answer,
        } => runtime.block_on(handle_check(&config, word, relation, answer, cli.json)),
        Command::Suggest { relation, prefix } => handle_suggest(relation, prefix, cli.json),
        Command::Sentences => handle_sentences(&config, cli.json),
        #[cfg(feature = "web")]
        Command::Serve { addr } => runtime.block_on(handle_serve(&config, addr, cli.json)),
    }
}

async fn handle_check(
    config: &QuizConfig,
    word: String,
    relation: Relation,
    answer: String,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if word.trim().is_empty() {
        return Err("The quiz word cannot be empty".into());
    }
    let mut session = QuizSession::new(config.relation_source()?);
    session.load(vec![lexiquiz_rs::Word::new(word.trim(), "", "")].into());
    let outcome = session.submit_answer(relation, &answer).await;
    let feedback = session.feedback().latest();

    if as_json {
        let payload = json!({
            "word": word.trim(),
            "relation": relation,
            "answer": answer,
            "result": outcome,
            "feedback": feedback,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if let Some(feedback) = feedback {
        print_feedback(&feedback);
    }
    Ok(())
}

fn handle_suggest(relation: Relation, prefix: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let candidates = lexiquiz_rs::FallbackCatalog::builtin().words(relation);
    let matches = compute_suggestions(&prefix, candidates);

    if as_json {
        let payload = json!({
            "relation": relation,
            "prefix": prefix,
            "results": matches,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_view(&suggestion_view(&prefix, candidates));
    }
    Ok(())
}

fn handle_sentences(config: &QuizConfig, as_json: bool) -> Result<(), Box<dyn Error>> {
    let Some(path) = &config.sentences_path else {
        return Err("No sentence file configured; pass --sentences or set LEXIQUIZ_SENTENCES".into());
    };
    let entries = SentenceJournal::persistent(path).entries();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No sentences saved yet.");
        return Ok(());
    }
    let width = entries
        .iter()
        .map(|entry| entry.word.len())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    println!("{:<20}  {:<width$}  {}", "CREATED", "WORD", "SENTENCE", width = width);
    println!("{:-<20}  {:-<width$}  {}", "", "", "--------", width = width);
    for entry in entries {
        println!(
            "{:<20}  {:<width$}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.word,
            entry.sentence,
            width = width
        );
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn handle_serve(
    config: &QuizConfig,
    addr: std::net::SocketAddr,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let session = QuizSession::from_config(config)?;
    report_latest(&session, as_json)?;
    lexiquiz_rs::web::serve(lexiquiz_rs::web::WebConfig { addr }, session).await?;
    Ok(())
}

const QUIZ_HELP: &str = "\
Commands:
  syn <word>        answer with a synonym
  ant <word>        answer with an antonym
  sentence <text>   submit a sentence using the word
  hint syn|ant <p>  show suggestions starting with <p>
  pick <n>          answer with suggestion number <n>
  next              move to the next word
  say               pronounce the current word
  help              show this help
  quit              leave the quiz";

async fn handle_quiz(config: &QuizConfig, as_json: bool) -> Result<(), Box<dyn Error>> {
    let mut session = QuizSession::from_config(config)?;
    report_latest(&session, as_json)?;
    if session.current().is_none() {
        return Err("No words to quiz on; pass --words <file.json>".into());
    }
    for relation in Relation::ALL {
        let engine = SuggestionEngine::new(session.fallback().words(relation).to_vec())
            .with_delay(config.debounce)
            .on_update(move |view| {
                if let Some(text) = render_suggestions(relation, view, as_json) {
                    println!("{text}");
                }
            });
        session = session.with_suggestion_engine(relation, engine);
    }
    let speaker = SystemSpeaker::detect();
    let mut hinted: Option<Relation> = None;

    print_word(&session, as_json)?;
    if !as_json {
        println!("Type `help` for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" | "?" => println!("{QUIZ_HELP}"),
            "syn" | "ant" => {
                let relation = if command == "syn" {
                    Relation::Synonym
                } else {
                    Relation::Antonym
                };
                answer(&session, relation, rest, as_json).await?;
            }
            "sentence" | "s" => {
                let outcome = session.submit_sentence(rest);
                report_sentence(&session, outcome.ok(), as_json)?;
            }
            "hint" => {
                let (which, prefix) = rest.split_once(' ').unwrap_or((rest, ""));
                match which.parse::<Relation>() {
                    Ok(_) if prefix.trim().is_empty() => {
                        print_feedback(&Feedback::info(format!(
                            "Type a few letters after `hint {which}`."
                        )));
                    }
                    Ok(relation) => {
                        // Chips arrive through the engine listener once input settles.
                        session.suggest(relation, prefix)?;
                        hinted = Some(relation);
                    }
                    Err(err) => print_feedback(&Feedback::warning(err)),
                }
            }
            "pick" => {
                let choice = hinted.zip(rest.parse::<usize>().ok()).and_then(|(relation, n)| {
                    chip_at(&session.suggestions(relation), n).map(|word| (relation, word))
                });
                match choice {
                    Some((relation, word)) => {
                        let text = session.select_suggestion(relation, &word);
                        hinted = None;
                        answer(&session, relation, &text, as_json).await?;
                    }
                    None => print_feedback(&Feedback::warning("No such suggestion.")),
                }
            }
            "next" | "n" => {
                session.advance();
                hinted = None;
                print_word(&session, as_json)?;
            }
            "say" => {
                if !session.speak_current(&speaker) {
                    report_latest(&session, as_json)?;
                }
            }
            other => print_feedback(&Feedback::warning(format!(
                "Unknown command {other:?}; type `help`."
            ))),
        }
    }
    Ok(())
}

async fn answer<L: RelationLookup>(
    session: &QuizSession<L>,
    relation: Relation,
    input: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let outcome = session.submit_answer(relation, input).await;
    if as_json {
        let payload = json!({ "result": outcome, "feedback": session.feedback().latest() });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }
    if !matches!(outcome, AnswerOutcome::Superseded) {
        report_latest(session, false)?;
    }
    Ok(())
}

fn report_sentence<L: RelationLookup>(
    session: &QuizSession<L>,
    outcome: Option<SentenceOutcome>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload = json!({ "result": outcome, "feedback": session.feedback().latest() });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }
    report_latest(session, false)
}

fn report_latest<L: RelationLookup>(
    session: &QuizSession<L>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if let Some(feedback) = session.feedback().latest() {
        println!("{}", render_feedback(&feedback, as_json)?);
    }
    Ok(())
}

fn render_feedback(feedback: &Feedback, as_json: bool) -> serde_json::Result<String> {
    if as_json {
        serde_json::to_string(feedback)
    } else {
        Ok(feedback_line(feedback))
    }
}

/// Text for delivered chips; `None` once the view is cleared.
fn render_suggestions(relation: Relation, view: &SuggestionView, as_json: bool) -> Option<String> {
    if as_json {
        if matches!(view, SuggestionView::Hidden) {
            return None;
        }
        let payload = json!({ "relation": relation, "suggestions": view });
        return serde_json::to_string(&payload).ok();
    }
    match view {
        SuggestionView::Hidden => None,
        SuggestionView::NoMatches => Some(format!("No {} suggestions.", relation.label())),
        SuggestionView::Matches(words) => Some(
            words
                .iter()
                .enumerate()
                .map(|(idx, word)| format!("  [{}] {}", idx + 1, word))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

/// One-based chip lookup for `pick <n>`.
fn chip_at(view: &SuggestionView, n: usize) -> Option<String> {
    n.checked_sub(1)
        .and_then(|idx| view.words().get(idx))
        .cloned()
}

fn print_word<L: RelationLookup>(
    session: &QuizSession<L>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let Some(word) = session.current() else {
        return Ok(());
    };
    if as_json {
        let payload = json!({
            "index": session.current_index(),
            "total": session.words().len(),
            "word": word,
        });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }
    let mut card = format!("# {}\n", word.text);
    if !word.part_of_speech.is_empty() {
        card.push_str(&format!("*{}*\n\n", word.part_of_speech));
    }
    if !word.definition.is_empty() {
        card.push_str(&format!("{}\n", word.definition));
    }
    println!(
        "\nWord {} of {}:",
        session.current_index() + 1,
        session.words().len()
    );
    render_markdown_block(&card);
    Ok(())
}

fn print_view(view: &SuggestionView) {
    match view {
        SuggestionView::Hidden => println!("Type a few letters to see suggestions."),
        SuggestionView::NoMatches => println!("No suggestions."),
        SuggestionView::Matches(words) => {
            for (idx, word) in words.iter().enumerate() {
                println!("  [{}] {}", idx + 1, word);
            }
        }
    }
}

fn print_feedback(feedback: &Feedback) {
    println!("{}", feedback_line(feedback));
}

fn feedback_line(feedback: &Feedback) -> String {
    let marker = match feedback.severity {
        Severity::Info => "i",
        Severity::Success => "+",
        Severity::Warning => "!",
        Severity::Danger => "x",
    };
    format!("[{marker}] {}", feedback.message)
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
