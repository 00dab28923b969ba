use log::{debug, info};

use roster_sync::{ExtractError, TableError};
use snafu::{prelude::*, Snafu};

use serde_json::Value as JSValue;

use crate::admin::config_reader::*;
use crate::admin::dates::Clock;
use crate::admin::fetch::{FileSource, HttpSource, RosterSource};
use crate::admin::store::{CsvWorkbook, TableStore};
use crate::args::*;

mod config_reader;
mod dates;
mod fetch;
mod input;
mod io_xlsx;
mod members;
mod panel;
mod processes;
pub mod response;
mod sessions;
mod store;
#[cfg(test)]
mod testing;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AdminError {
    #[snafu(display("Table '{table}' not found in the workbook"))]
    MissingTable { table: String },
    #[snafu(display("{source}"))]
    Table { source: TableError },
    #[snafu(display("Record with id '{id}' not found in '{table}'"))]
    NotFound { table: String, id: String },
    #[snafu(display("{source}"))]
    Extract { source: ExtractError },
    #[snafu(display("Could not reach the roster page {url}: {source}"))]
    Fetch { source: reqwest::Error, url: String },
    #[snafu(display("Could not read the roster page {path}: {source}"))]
    ReadingPage { source: std::io::Error, path: String },
    #[snafu(display("The roster page lists no members under '{anchor}'"))]
    EmptyRoster { anchor: String },
    #[snafu(display("Error opening workbook directory {path}: {source}"))]
    OpeningWorkbook { source: std::io::Error, path: String },
    #[snafu(display("Error reading table file {path}: {source}"))]
    ReadingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing table file {path}: {source}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error replacing table file {path}: {source}"))]
    ReplacingFile { source: std::io::Error, path: String },
    #[snafu(display("Error opening spreadsheet {path}: {source}"))]
    OpeningXlsx {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Invalid input: {message}"))]
    InvalidInput { message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

impl From<TableError> for AdminError {
    fn from(source: TableError) -> Self {
        match source {
            TableError::NotFound { table, id } => AdminError::NotFound { table, id },
            source => AdminError::Table { source },
        }
    }
}

impl From<ExtractError> for AdminError {
    fn from(source: ExtractError) -> Self {
        AdminError::Extract { source }
    }
}

pub type AdminResult<T> = Result<T, AdminError>;

/// Everything a command needs: where the tables live, the settings and the clock.
pub struct Context {
    pub store: Box<dyn TableStore>,
    pub config: AdminConfig,
    pub clock: Clock,
}

impl Context {
    pub fn tables(&self) -> &TableNames {
        &self.config.tables
    }
}

fn build_context(args: &Args) -> AdminResult<Context> {
    let mut config = match &args.config {
        Some(p) => read_config(p)?,
        None => AdminConfig::default(),
    };
    if let Some(w) = &args.workbook {
        config.workbook_directory = w.clone();
    }
    config.validate()?;
    info!("config: {:?}", config);
    let store = CsvWorkbook::open(&config.workbook_directory)?;
    Ok(Context {
        store: Box::new(store),
        config,
        clock: Clock::System,
    })
}

/// Runs one command and returns its payload.
pub fn run(args: &Args) -> AdminResult<JSValue> {
    let mut ctx = build_context(args)?;
    debug!("run: {:?}", args.command);
    match &args.command {
        Command::Members(cmd) => match cmd {
            MembersCommand::List => members::list(&ctx),
            MembersCommand::Save { record } => {
                let patch = input::record_arg(record, &ctx.config.utc_offset()?)?;
                members::save(&mut ctx, &patch)
            }
            MembersCommand::Delete { id } => members::delete(&mut ctx, id),
            MembersCommand::SetGenders { updates } => {
                let updates: Vec<members::GenderUpdate> = input::typed_arg(updates)?;
                members::set_genders(&mut ctx, &updates)
            }
            MembersCommand::Sync { html_file, dry_run } => {
                let source: Box<dyn RosterSource> = match html_file {
                    Some(p) => Box::new(FileSource::new(p)),
                    None => Box::new(HttpSource::new(
                        &ctx.config.roster_url,
                        ctx.config.http_timeout_seconds,
                    )),
                };
                members::sync(&mut ctx, source.as_ref(), *dry_run)
            }
        },
        Command::Processes(cmd) => match cmd {
            ProcessesCommand::List => processes::list(&ctx),
            ProcessesCommand::Save { record } => {
                let patch = input::record_arg(record, &ctx.config.utc_offset()?)?;
                processes::save(&mut ctx, &patch)
            }
            ProcessesCommand::Delete { id } => processes::delete(&mut ctx, id),
        },
        Command::Sessions(cmd) => match cmd {
            SessionsCommand::List => sessions::list(&ctx),
            SessionsCommand::Save { record } => {
                let session = input::typed_arg(record)?;
                sessions::save(&mut ctx, &session)
            }
            SessionsCommand::Delete { id } => sessions::delete(&mut ctx, id),
        },
        Command::Tickets(cmd) => match cmd {
            TicketsCommand::List { session_id } => sessions::list_tickets(&ctx, session_id),
            TicketsCommand::Save { record } => {
                let ticket = input::typed_arg(record)?;
                sessions::save_ticket(&mut ctx, &ticket)
            }
        },
        Command::Votes(cmd) => match cmd {
            VotesCommand::List { ticket_id } => sessions::list_votes(&ctx, ticket_id),
            VotesCommand::Save { record } => {
                let vote = input::typed_arg(record)?;
                sessions::save_vote(&mut ctx, &vote)
            }
            VotesCommand::Delete { id } => sessions::delete_vote(&mut ctx, id),
            VotesCommand::AttachReport { vote_id, url } => {
                sessions::attach_report(&mut ctx, vote_id, url)
            }
        },
        Command::Panel(cmd) => match cmd {
            PanelCommand::Sessions => panel::list_sessions(&ctx),
            PanelCommand::Agenda { session_id } => panel::load_agenda(&ctx, session_id),
            PanelCommand::SetMembers { session_id, names } => {
                panel::save_list(&mut ctx, session_id, panel::SessionField::Members, names)
            }
            PanelCommand::SetAttorneys { session_id, names } => {
                panel::save_list(&mut ctx, session_id, panel::SessionField::Attorneys, names)
            }
            PanelCommand::SetNotes { session_id, text } => {
                panel::save_notes(&mut ctx, session_id, text)
            }
            PanelCommand::Attorneys => panel::list_attorneys(&ctx),
        },
        Command::Import { path, overwrite } => io_xlsx::import_workbook(&mut ctx, path, *overwrite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    #[test]
    fn run_set_genders_on_workbook() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tabMembros.csv"),
            "Id,Nome,Email,Gênero,Cargo\n1a,Ana,,,Membra\n1b,Rui,,,Membro\n",
        )
        .unwrap();
        let wb = dir.path().to_str().unwrap();
        let args = Args::parse_from([
            "sdpadm",
            "-w",
            wb,
            "members",
            "set-genders",
            r#"[{"id": "1a", "genero": "Feminino"}, {"id": "1b", "genero": ""}]"#,
        ]);
        let js = run(&args).unwrap();
        assert_eq!(js["updated"], 1);

        let args = Args::parse_from(["sdpadm", "-w", wb, "members", "list"]);
        let js = run(&args).unwrap();
        assert_eq!(js["membros"][0]["Gênero"], "Feminino");
        assert_eq!(js["membros"][1]["Gênero"], "");
    }

    #[test]
    fn missing_rows_are_reported_as_not_found() {
        let e: AdminError = TableError::NotFound {
            table: "tabMembros".to_string(),
            id: "zz".to_string(),
        }
        .into();
        assert!(matches!(e, AdminError::NotFound { ref id, .. } if id == "zz"));

        let e: AdminError = TableError::MissingColumn {
            table: "tabMembros".to_string(),
            column: "Id".to_string(),
        }
        .into();
        assert!(matches!(e, AdminError::Table { .. }));
    }
}
