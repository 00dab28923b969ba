use clap::{Parser, Subcommand};

/// Administration of the committee tables: members, processes, sessions and votes.
///
/// Every command prints one JSON object: {"ok": true, "data": ...} on success,
/// {"ok": false, "error": "..."} on failure.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Missing keys take their default values.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) The workbook directory, one CSV file per table. Overrides the
    /// workbookDirectory setting of the configuration.
    #[clap(short, long, value_parser)]
    pub workbook: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Members of the committee and the synchronization with the public roster.
    #[clap(subcommand)]
    Members(MembersCommand),
    #[clap(subcommand)]
    Processes(ProcessesCommand),
    #[clap(subcommand)]
    Sessions(SessionsCommand),
    /// Voting tickets of a session.
    #[clap(subcommand)]
    Tickets(TicketsCommand),
    #[clap(subcommand)]
    Votes(VotesCommand),
    /// Tools used while a session is held.
    #[clap(subcommand)]
    Panel(PanelCommand),
    /// Imports every worksheet of an .xlsx export as a table.
    Import {
        #[clap(value_parser)]
        path: String,
        /// Replaces the tables that already exist.
        #[clap(long, takes_value = false)]
        overwrite: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MembersCommand {
    List,
    /// (JSON object or @file) Creates or updates a member.
    Save {
        #[clap(value_parser)]
        record: String,
    },
    Delete {
        #[clap(value_parser)]
        id: String,
    },
    /// (JSON array of {"id", "genero"} or @file) Sets the gender of several members.
    SetGenders {
        #[clap(value_parser)]
        updates: String,
    },
    /// Rebuilds the member list from the roster page.
    Sync {
        /// (file path) Reads the page from a saved file instead of the network.
        #[clap(long, value_parser)]
        html_file: Option<String>,
        /// Computes the changes and shows them without writing anything.
        #[clap(long, takes_value = false)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProcessesCommand {
    List,
    Save {
        #[clap(value_parser)]
        record: String,
    },
    Delete {
        #[clap(value_parser)]
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionsCommand {
    List,
    /// (JSON object or @file) {id?, datasessao: "YYYY-MM-DD", orgao, local, presidente, secretario}
    Save {
        #[clap(value_parser)]
        record: String,
    },
    /// Deletes a session. Its tickets and votes are kept.
    Delete {
        #[clap(value_parser)]
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketsCommand {
    List {
        #[clap(value_parser)]
        session_id: String,
    },
    /// (JSON object or @file) {id, relator, expediente}
    Save {
        #[clap(value_parser)]
        record: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum VotesCommand {
    List {
        #[clap(value_parser)]
        ticket_id: String,
    },
    Save {
        #[clap(value_parser)]
        record: String,
    },
    Delete {
        #[clap(value_parser)]
        id: String,
    },
    /// Records the address of an uploaded report.
    AttachReport {
        #[clap(value_parser)]
        vote_id: String,
        #[clap(value_parser)]
        url: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PanelCommand {
    Sessions,
    Agenda {
        #[clap(value_parser)]
        session_id: String,
    },
    SetMembers {
        #[clap(value_parser)]
        session_id: String,
        #[clap(value_parser)]
        names: Vec<String>,
    },
    SetAttorneys {
        #[clap(value_parser)]
        session_id: String,
        #[clap(value_parser)]
        names: Vec<String>,
    },
    SetNotes {
        #[clap(value_parser)]
        session_id: String,
        #[clap(value_parser)]
        text: String,
    },
    Attorneys,
}
