use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::engine::FormatConfig;

#[derive(Parser, Debug)]
#[command(
    name = "timetable",
    version,
    about = "Normalize printed class timetables into queryable lesson records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Query(QueryArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FormatVariant {
    Standard,
    RoomColumn,
}

impl FormatVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::RoomColumn => "room-column",
        }
    }

    pub fn preset(self) -> FormatConfig {
        match self {
            Self::Standard => FormatConfig::standard(),
            Self::RoomColumn => FormatConfig::room_column(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = ".cache/timetable")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub index_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = ';')]
    pub delimiter: char,

    #[arg(long, value_enum, default_value_t = FormatVariant::Standard)]
    pub variant: FormatVariant,

    #[arg(long)]
    pub format_config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("subject").required(true).args(["group", "instructor"])))]
pub struct QueryArgs {
    #[arg(long, default_value = ".cache/timetable")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub index_path: Option<PathBuf>,

    #[arg(long)]
    pub group: Option<String>,

    #[arg(long)]
    pub instructor: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/timetable")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub index_path: Option<PathBuf>,
}

pub fn default_index_path(cache_root: &std::path::Path) -> PathBuf {
    cache_root.join("schedule_index.json")
}
