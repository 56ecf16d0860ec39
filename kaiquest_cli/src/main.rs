use clap::{Parser, Subcommand};
use kaiquest_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kaiquest")]
#[command(about = "RPG-flavored personality quiz and kai habit tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the personality questionnaire
    Diagnose {
        /// Comma-separated answers (yes/maybe/neutral/no); omit for
        /// interactive prompts
        #[arg(long)]
        answers: Option<String>,

        /// What has been on your mind lately
        #[arg(long, default_value = "")]
        thoughts: String,

        /// Your day-to-day actions and habits
        #[arg(long, default_value = "")]
        habits: String,

        /// The person you would like to be
        #[arg(long, default_value = "")]
        ideal: String,
    },

    /// Show your most recent diagnosis result
    Result,

    /// List the eight archetypes
    Types,

    /// Quest management and play
    Quest {
        #[command(subcommand)]
        command: QuestCommands,
    },

    /// Kai (positive habit) tracking
    Kai {
        #[command(subcommand)]
        command: KaiCommands,
    },

    /// Free-text journal
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },

    /// Wipe diagnoses, kai logs, quest progress and the journal
    Reset,
}

#[derive(Subcommand)]
enum QuestCommands {
    /// List quests with your progress status
    List,

    /// Show one quest with its normalized steps; marks it in progress
    Show { id: String },

    /// Create a quest (admin)
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Archetype the quest is for (legacy spellings accepted)
        #[arg(long, default_value = "common")]
        type_key: String,

        #[arg(long, default_value = "growth")]
        category: String,

        /// Raw steps payload as JSON (string list or object list)
        #[arg(long)]
        steps_json: Option<String>,
    },

    /// Update quest fields (admin)
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        type_key: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Replacement raw steps payload as JSON
        #[arg(long)]
        steps_json: Option<String>,
    },

    /// Delete a quest and its progress rows (admin)
    Rm { id: String },

    /// Open a quest (marks it in progress)
    Start { id: String },

    /// Complete a quest, optionally with reflection notes
    Complete {
        id: String,

        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum KaiCommands {
    /// List tracked kai with counts
    List,

    /// Register a kai by exact name (increments if it already exists)
    Add { name: String },

    /// Delete a kai by exact name
    Rm { name: String },
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Save a journal entry; extracted kai phrases merge fuzzily
    Add {
        content: String,

        /// Comma-separated kai phrases to merge into your logs
        #[arg(long)]
        kai: Option<String>,

        /// Let the assist collaborator tidy the text before saving
        #[arg(long)]
        compose: bool,
    },

    /// List journal entries
    List,

    /// Ask the assist collaborator for feedback on one entry
    Feedback { id: String },

    /// Delete one journal entry
    Rm { id: String },
}

struct Paths {
    state: PathBuf,
    quests: PathBuf,
    journal: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        Self {
            state: data_dir.join("state.json"),
            quests: data_dir.join("quests.json"),
            journal: data_dir.join("journal.jsonl"),
        }
    }
}

fn main() -> Result<()> {
    kaiquest_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;
    let paths = Paths::new(&data_dir);

    // The only assist backend shipped today is the disabled one; every
    // assist-backed feature uses its deterministic fallback.
    if config.assist.enabled {
        tracing::warn!("[assist] enabled but no backend is compiled in; using fallbacks");
    }
    let assist = DisabledAssist;

    match cli.command {
        Commands::Diagnose {
            answers,
            thoughts,
            habits,
            ideal,
        } => cmd_diagnose(&paths, &assist, answers, thoughts, habits, ideal),
        Commands::Result => cmd_result(&paths, &assist),
        Commands::Types => cmd_types(),
        Commands::Quest { command } => match command {
            QuestCommands::List => cmd_quest_list(&paths),
            QuestCommands::Show { id } => cmd_quest_show(&paths, &id),
            QuestCommands::Add {
                title,
                description,
                type_key,
                category,
                steps_json,
            } => cmd_quest_add(&paths, title, description, type_key, category, steps_json),
            QuestCommands::Edit {
                id,
                title,
                description,
                type_key,
                category,
                steps_json,
            } => cmd_quest_edit(&paths, &id, title, description, type_key, category, steps_json),
            QuestCommands::Rm { id } => cmd_quest_rm(&paths, &id),
            QuestCommands::Start { id } => cmd_quest_start(&paths, &id),
            QuestCommands::Complete { id, notes } => {
                cmd_quest_complete(&paths, &assist, &id, &notes)
            }
        },
        Commands::Kai { command } => match command {
            KaiCommands::List => cmd_kai_list(&paths),
            KaiCommands::Add { name } => cmd_kai_add(&paths, &name),
            KaiCommands::Rm { name } => cmd_kai_rm(&paths, &name),
        },
        Commands::Journal { command } => match command {
            JournalCommands::Add {
                content,
                kai,
                compose,
            } => cmd_journal_add(&paths, &assist, &content, kai, compose, &config),
            JournalCommands::List => cmd_journal_list(&paths),
            JournalCommands::Feedback { id } => cmd_journal_feedback(&paths, &assist, &id),
            JournalCommands::Rm { id } => cmd_journal_rm(&paths, &id),
        },
        Commands::Reset => cmd_reset(&paths),
    }
}

// ============================================================================
// Diagnosis commands
// ============================================================================

fn cmd_diagnose(
    paths: &Paths,
    assist: &dyn Assist,
    answers: Option<String>,
    thoughts: String,
    habits: String,
    ideal: String,
) -> Result<()> {
    let catalog = get_default_catalog();

    let answers = match answers {
        Some(list) => parse_answer_list(&list),
        None => prompt_answers(catalog)?,
    };

    let input = DiagnosisInput {
        answers,
        written_thoughts: thoughts,
        written_habits: habits,
        written_ideal: ideal,
    };

    let result = run_diagnosis(catalog, &input, assist, chrono::Utc::now());
    let comment = engine::diagnosis_comment(catalog, &result, assist);

    UserState::update(&paths.state, |state| {
        state.push_diagnosis(result.clone());
        Ok(())
    })?;

    display_result(catalog, &result, &comment);
    Ok(())
}

fn cmd_result(paths: &Paths, assist: &dyn Assist) -> Result<()> {
    let catalog = get_default_catalog();
    let state = UserState::load(&paths.state)?;

    match state.last_diagnosis() {
        Some(result) => {
            let comment = engine::diagnosis_comment(catalog, result, assist);
            display_result(catalog, result, &comment);
            Ok(())
        }
        None => {
            println!("No diagnosis yet - run `kaiquest diagnose` first.");
            Ok(())
        }
    }
}

fn cmd_types() -> Result<()> {
    let catalog = get_default_catalog();

    println!("\nThe eight archetypes:\n");
    for key in TypeKey::SCORED {
        let info = catalog.info(key);
        println!("  {:<12} {} - {}", format!("{}:", info.name), info.feature, info.strength);
        println!("  {:<12} watch out: {}", "", info.weakness);
    }
    println!();
    Ok(())
}

/// Parse a comma-separated answer list; unknown labels count as "no"
fn parse_answer_list(list: &str) -> std::collections::HashMap<usize, String> {
    list.split(',')
        .enumerate()
        .map(|(i, label)| (i, normalize_answer(label)))
        .collect()
}

fn normalize_answer(label: &str) -> String {
    match label.trim().to_lowercase().as_str() {
        "y" | "yes" => "yes",
        "m" | "maybe" => "maybe",
        "u" | "neutral" => "neutral",
        _ => "no",
    }
    .to_string()
}

fn prompt_answers(
    catalog: &catalog::Catalog,
) -> Result<std::collections::HashMap<usize, String>> {
    let mut answers = std::collections::HashMap::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("Answer each statement: y(es) / m(aybe) / u(neutral) / n(o)\n");

    for (i, question) in catalog.questions.iter().enumerate() {
        print!("{:>2}. {} > ", i + 1, question.prompt);
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break, // EOF: remaining questions count as "no"
        };
        answers.insert(i, normalize_answer(&line));
    }

    Ok(answers)
}

fn display_result(catalog: &catalog::Catalog, result: &DiagnosisResult, comment: &str) {
    let info = catalog.info(result.top_type);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  YOUR ARCHETYPE: {}", info.name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", info.feature);
    println!("  Strength: {}", info.strength);
    println!("  Watch out: {}", info.weakness);
    println!();
    println!("  {:<12} {:>4} {:>6} {:>6}", "type", "raw", "bonus", "final");
    for (key, final_score) in result.final_scores.iter() {
        println!(
            "  {:<12} {:>4} {:>6} {:>6}",
            key,
            result.raw_scores.get(key),
            result.bonus_scores.get(key),
            final_score,
        );
    }
    println!();
    println!("  {}", comment);
    println!();
}

// ============================================================================
// Quest commands
// ============================================================================

fn cmd_quest_list(paths: &Paths) -> Result<()> {
    let catalog = get_default_catalog();
    let book = QuestBook::load(&paths.quests)?;
    let state = UserState::load(&paths.state)?;

    if book.quests.is_empty() {
        println!("No quests yet - add one with `kaiquest quest add`.");
        return Ok(());
    }

    println!();
    for quest in book.by_recency() {
        let status = state
            .progress_for(quest.id)
            .map(|p| p.status)
            .unwrap_or(ProgressStatus::NotStarted);
        println!(
            "  {}  [{}] {} ({})",
            &quest.id.to_string()[..8],
            status_label(status),
            quest.title,
            catalog.info(quest.type_key).name,
        );
    }
    println!();
    Ok(())
}

fn cmd_quest_show(paths: &Paths, id: &str) -> Result<()> {
    let book = QuestBook::load(&paths.quests)?;
    let quest = book.resolve(id)?;

    // Viewing a quest counts as engaging with it.
    let now = chrono::Utc::now();
    UserState::update(&paths.state, |state| {
        state.progress_entry(quest.id, now).open(now);
        Ok(())
    })?;

    println!("\n{}", quest.title);
    println!("{}\n", quest.description);

    let steps = normalize_steps(&quest.steps);
    if steps.is_empty() {
        println!("  (no steps)");
    }
    for (i, step) in steps.iter().enumerate() {
        match step.kind {
            StepKind::Text => println!("  {}. {}", i + 1, step.title),
            StepKind::Grid => println!(
                "  {}. {} [{}x{} grid]",
                i + 1,
                step.title,
                step.grid_rows,
                step.grid_cols
            ),
            StepKind::Choice => {
                println!("  {}. {} (pick one)", i + 1, step.title);
                for option in &step.options {
                    println!("       - {}", option);
                }
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_quest_add(
    paths: &Paths,
    title: String,
    description: String,
    type_key: String,
    category: String,
    steps_json: Option<String>,
) -> Result<()> {
    let title = title.trim().to_string();
    let description = description.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return Err(Error::Store("title and description are required".into()));
    }

    let steps = match steps_json.as_deref() {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("steps_json did not parse ({}), storing empty steps", e);
                serde_json::Value::Array(Vec::new())
            }
        },
        None => serde_json::Value::Array(Vec::new()),
    };

    let now = chrono::Utc::now();
    let quest = Quest {
        id: uuid::Uuid::new_v4(),
        title,
        description,
        type_key: normalize_type_key(&type_key),
        category,
        structure: if steps.as_array().map(|a| a.len() > 1).unwrap_or(false) {
            QuestStructure::MultiStep
        } else {
            QuestStructure::Single
        },
        steps,
        created_at: now,
        updated_at: now,
    };
    let quest_id = quest.id;

    QuestBook::update(&paths.quests, |book| {
        book.quests.push(quest);
        Ok(())
    })?;

    println!("✓ Quest created ({})", &quest_id.to_string()[..8]);
    Ok(())
}

fn cmd_quest_edit(
    paths: &Paths,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    type_key: Option<String>,
    category: Option<String>,
    steps_json: Option<String>,
) -> Result<()> {
    let book = QuestBook::load(&paths.quests)?;
    let quest_id = book.resolve(id)?.id;

    if let Some(ref t) = title {
        if t.trim().is_empty() {
            return Err(Error::Store("title cannot be blank".into()));
        }
    }
    if let Some(ref d) = description {
        if d.trim().is_empty() {
            return Err(Error::Store("description cannot be blank".into()));
        }
    }

    let steps = match steps_json.as_deref() {
        Some(raw) => Some(serde_json::from_str(raw).map_err(Error::Json)?),
        None => None,
    };

    QuestBook::update(&paths.quests, |book| {
        let quest = book
            .find_mut(quest_id)
            .ok_or_else(|| Error::NotFound(format!("quest {}", quest_id)))?;

        if let Some(t) = title {
            quest.title = t.trim().to_string();
        }
        if let Some(d) = description {
            quest.description = d.trim().to_string();
        }
        if let Some(k) = type_key {
            quest.type_key = normalize_type_key(&k);
        }
        if let Some(c) = category {
            quest.category = c;
        }
        if let Some(s) = steps {
            quest.structure = if matches!(&s, serde_json::Value::Array(a) if a.len() > 1) {
                QuestStructure::MultiStep
            } else {
                QuestStructure::Single
            };
            quest.steps = s;
        }
        quest.updated_at = chrono::Utc::now();
        Ok(())
    })?;

    println!("✓ Quest updated");
    Ok(())
}

fn cmd_quest_rm(paths: &Paths, id: &str) -> Result<()> {
    let book = QuestBook::load(&paths.quests)?;
    let quest_id = book.resolve(id)?.id;

    QuestBook::update(&paths.quests, |book| {
        book.remove(quest_id);
        Ok(())
    })?;

    // Cascade: progress rows for a deleted quest go with it.
    UserState::update(&paths.state, |state| {
        state.remove_progress_for(quest_id);
        Ok(())
    })?;

    println!("✓ Quest deleted");
    Ok(())
}

fn cmd_quest_start(paths: &Paths, id: &str) -> Result<()> {
    let book = QuestBook::load(&paths.quests)?;
    let quest = book.resolve(id)?;
    let quest_id = quest.id;
    let title = quest.title.clone();
    let now = chrono::Utc::now();

    UserState::update(&paths.state, |state| {
        state.progress_entry(quest_id, now).open(now);
        Ok(())
    })?;

    println!("✓ Quest started: {}", title);
    Ok(())
}

fn cmd_quest_complete(paths: &Paths, assist: &dyn Assist, id: &str, notes: &str) -> Result<()> {
    let book = QuestBook::load(&paths.quests)?;
    let quest = book.resolve(id)?;
    let quest_id = quest.id;
    let title = quest.title.clone();
    let now = chrono::Utc::now();

    UserState::update(&paths.state, |state| {
        state.progress_entry(quest_id, now).complete(now);
        Ok(())
    })?;

    let feedback = engine::quest_feedback(notes, assist);
    println!("✓ Quest completed: {}", title);
    println!("\n  {}\n", feedback);
    Ok(())
}

fn status_label(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::NotStarted => "not started",
        ProgressStatus::InProgress => "in progress",
        ProgressStatus::Completed => "completed",
    }
}

// ============================================================================
// Kai commands
// ============================================================================

fn cmd_kai_list(paths: &Paths) -> Result<()> {
    let state = UserState::load(&paths.state)?;

    if state.kai_logs.is_empty() {
        println!("No kai tracked yet.");
        return Ok(());
    }

    println!();
    for log in &state.kai_logs {
        println!("  {:>4}x  {}", log.count, log.name);
    }
    println!();
    Ok(())
}

fn cmd_kai_add(paths: &Paths, name: &str) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Store("kai name is empty".into()));
    }

    let now = chrono::Utc::now();
    UserState::update(&paths.state, |state| {
        // Direct registration matches by exact name only; fuzzy merging is
        // reserved for journal extraction.
        match state.kai_logs.iter_mut().find(|log| log.name == name) {
            Some(log) => log.count += 1,
            None => state.kai_logs.push(KaiLog {
                name: name.clone(),
                count: 1,
                created_at: now,
            }),
        }
        Ok(())
    })?;

    println!("✓ Kai recorded: {}", name);
    Ok(())
}

fn cmd_kai_rm(paths: &Paths, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Store("kai name is empty".into()));
    }

    let mut removed = false;
    UserState::update(&paths.state, |state| {
        let before = state.kai_logs.len();
        state.kai_logs.retain(|log| log.name != name);
        removed = state.kai_logs.len() < before;
        Ok(())
    })?;

    if removed {
        println!("✓ Kai deleted: {}", name);
    } else {
        println!("No kai named {:?}", name);
    }
    Ok(())
}

// ============================================================================
// Journal commands
// ============================================================================

fn cmd_journal_add(
    paths: &Paths,
    assist: &dyn Assist,
    content: &str,
    kai: Option<String>,
    compose: bool,
    config: &Config,
) -> Result<()> {
    // Composition falls back to the original text without a backend.
    let content = if compose {
        engine::compose_journal(content, assist)
    } else {
        content.to_string()
    };

    // Explicit phrases win; otherwise ask the collaborator (best-effort).
    let phrases: Vec<String> = match kai {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => engine::extract_kai(&content, assist),
    };

    let entry = engine::record_journal(
        &paths.journal,
        &paths.state,
        &content,
        &phrases,
        config.dedup.similarity_threshold,
        chrono::Utc::now(),
    )?;

    println!("✓ Journal entry saved ({})", &entry.id.to_string()[..8]);
    if !phrases.is_empty() {
        println!("  Merged {} kai phrase(s) into your logs", phrases.len());
    }
    Ok(())
}

fn cmd_journal_list(paths: &Paths) -> Result<()> {
    let entries = read_entries(&paths.journal)?;

    if entries.is_empty() {
        println!("No journal entries yet.");
        return Ok(());
    }

    println!();
    for entry in entries.iter().rev() {
        println!(
            "  {}  {}  {}",
            &entry.id.to_string()[..8],
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.content,
        );
        if let Some(ref feedback) = entry.feedback {
            println!("            feedback: {}", feedback);
        }
    }
    println!();
    Ok(())
}

fn cmd_journal_feedback(paths: &Paths, assist: &dyn Assist, id: &str) -> Result<()> {
    let entries = read_entries(&paths.journal)?;
    let entry = entries
        .iter()
        .find(|e| e.id.to_string().starts_with(id))
        .ok_or_else(|| Error::NotFound(format!("journal entry {}", id)))?;

    match assist.generate_text(&assist::journal_feedback_prompt(&entry.content)) {
        AssistReply::Ready(text) if !text.trim().is_empty() => {
            journal::attach_feedback(&paths.journal, entry.id, &text)?;
            println!("✓ Feedback attached:\n\n  {}\n", text);
        }
        _ => {
            println!("Assist is unavailable - no feedback attached.");
        }
    }
    Ok(())
}

fn cmd_journal_rm(paths: &Paths, id: &str) -> Result<()> {
    let entries = read_entries(&paths.journal)?;
    let entry_id = entries
        .iter()
        .find(|e| e.id.to_string().starts_with(id))
        .map(|e| e.id)
        .ok_or_else(|| Error::NotFound(format!("journal entry {}", id)))?;

    journal::delete_entry(&paths.journal, entry_id)?;
    println!("✓ Journal entry deleted");
    Ok(())
}

// ============================================================================
// Reset
// ============================================================================

fn cmd_reset(paths: &Paths) -> Result<()> {
    UserState::update(&paths.state, |state| {
        state.reset();
        Ok(())
    })?;
    journal::clear(&paths.journal)?;

    println!("✓ Diagnoses, kai logs, quest progress and journal wiped");
    Ok(())
}
