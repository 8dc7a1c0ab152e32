use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocket_ledger::commands::{self, AddRequest, EditField};
use pocket_ledger::config::parse_today;
use pocket_ledger::{
    BudgetPeriod, Config, ConfirmPrompt, EntryKind, FixedClock, Ledger, LedgerError, LoadReport,
    RecurrenceEngine, ScriptedPrompt, Storage, TerminalPrompt,
};

#[derive(Parser)]
#[command(name = "pocket-ledger", version, about = "Track income and spending, including recurring entries")]
struct Cli {
    /// Directory holding incomes.txt and spendings.txt
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<String>,

    /// Accept backlog catch-up without asking
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show entries and totals
    List {
        /// income, spending or tags (income and spending when omitted)
        kind: Option<String>,
        /// With `tags`: only entries carrying this tag
        tag: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Add an income or spending entry
    Add {
        kind: String,
        amount: String,
        description: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        tag: String,
        /// daily, monthly or yearly
        #[arg(long)]
        recur: Option<String>,
    },
    /// Edit the amount, description or tag of an entry
    Edit {
        kind: String,
        index: String,
        field: String,
        value: String,
    },
    /// Delete an entry by its 1-based index
    Delete { kind: String, index: String },
    /// Set a daily, monthly or yearly spending budget
    Budget { period: String, amount: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pocket_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(today) = cli.today.as_deref() {
        config.today = Some(parse_today("--today", today)?);
    }
    config.assume_yes |= cli.yes;

    let storage = Storage::from_config(&config);
    let engine = RecurrenceEngine::new(FixedClock(config.today()));
    let mut ledger = Ledger::new();

    let report = storage.load(&mut ledger, &engine).context("Failed to load ledger")?;
    print_load_report(&report);

    let mut prompt: Box<dyn ConfirmPrompt> = if config.assume_yes {
        Box::new(ScriptedPrompt::always(true))
    } else {
        Box::new(TerminalPrompt::stdio())
    };

    let changed = match cli.command.unwrap_or(Command::List {
        kind: None,
        tag: None,
        json: false,
    }) {
        Command::List { kind, tag, json } => {
            run_list(&ledger, kind.as_deref(), tag.as_deref(), json)?;
            false
        }
        Command::Add {
            kind,
            amount,
            description,
            date,
            tag,
            recur,
        } => {
            let request = AddRequest {
                kind: kind.parse()?,
                amount: commands::parse_amount_arg(&amount)?,
                description,
                date: date.as_deref().map(commands::parse_date_arg).transpose()?,
                tag,
                recurrence: recur.as_deref().map(commands::parse_frequency_arg).transpose()?,
            };
            let backlog = commands::add_entry(&mut ledger, &engine, prompt.as_mut(), request)?;
            println!("\tEntry successfully added!");
            if backlog > 0 {
                println!("\tAdded {} missed occurrence(s).", backlog);
            }
            true
        }
        Command::Edit {
            kind,
            index,
            field,
            value,
        } => {
            let field: EditField = field.parse()?;
            commands::edit_entry(&mut ledger, kind.parse()?, &index, field, &value)?;
            println!("\tEdit Successful!");
            true
        }
        Command::Delete { kind, index } => {
            commands::delete_entry(&mut ledger, kind.parse()?, &index)?;
            println!("\tSuccessfully deleted!");
            true
        }
        Command::Budget { period, amount } => {
            let period: BudgetPeriod = period.parse()?;
            commands::set_budget(&mut ledger, period, &amount)?;
            println!("\tBudget successfully updated!");
            true
        }
    };

    if changed || report.caught_up > 0 {
        storage.save(&ledger).context("Failed to save ledger")?;
    }

    Ok(())
}

fn print_load_report(report: &LoadReport) {
    for err in &report.corrupted {
        println!("\t{}", err);
        println!("\tThis entry has been skipped.");
    }
    if report.budgets_reset {
        println!("\tBudgets could not be read and were reset to 0. Use `budget` to set them again.");
    }
    if report.caught_up > 0 {
        println!("\tAdded {} recurring entr(ies) since last run.", report.caught_up);
    }
}

fn run_list(ledger: &Ledger, kind: Option<&str>, tag: Option<&str>, json: bool) -> Result<()> {
    if kind.is_some_and(|kind| kind.eq_ignore_ascii_case("tags")) {
        if json {
            return Err(LedgerError::UserInput("--json is not available for tags".to_string()).into());
        }
        print!("{}", commands::render_tags(ledger, tag)?);
        return Ok(());
    }
    if let Some(tag) = tag {
        return Err(LedgerError::UserInput(format!("unexpected argument '{}'", tag)).into());
    }

    let lists = match kind {
        Some(kind) => vec![ledger.list(kind.parse::<EntryKind>()?)],
        None => vec![&ledger.spendings, &ledger.incomes],
    };

    if json {
        println!("{}", commands::render_json(&lists)?);
    } else {
        for list in lists {
            print!("{}", commands::render_list(list));
        }
    }
    Ok(())
}
