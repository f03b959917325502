//! DeltaDB CLI
//!
//! Command-line interface for inspecting and appending to a DeltaDB data
//! directory.

use clap::{Parser, Subcommand};
use deltadb::{Column, ColumnKind, Config, Database, DeltaError, Result, Row, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// DeltaDB CLI
#[derive(Parser, Debug)]
#[command(name = "deltadb-cli")]
#[command(about = "Inspect and append to a DeltaDB data directory")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./deltadb_data")]
    data_dir: String,

    /// Skip block checksum verification on load
    #[arg(long)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List tables
    Tables,

    /// Show a table's columns
    Describe {
        /// Table name
        table: String,
    },

    /// Print every row of a table
    Dump {
        /// Table name
        table: String,
    },

    /// Create a table
    Create {
        /// Table name
        table: String,

        /// Columns as name:kind[:comment], e.g. id:uint32 or label:string
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Append one row
    Insert {
        /// Table name
        table: String,

        /// Values as column=value; columns left out are stored absent
        values: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,deltadb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .verify_checksums(!args.no_verify)
        .build();

    let db = match Database::open(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&db, args.command).and_then(|()| db.close());
    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(db: &Database, command: Commands) -> Result<()> {
    match command {
        Commands::Tables => {
            for name in db.table_names() {
                println!("{}", name);
            }
        }

        Commands::Describe { table } => {
            let handle = db.table(&table)?;
            let table = handle.lock();
            for (index, column) in table.columns().iter().enumerate() {
                let unsigned = if column.is_unsigned() { "u" } else { "" };
                if column.comment().is_empty() {
                    println!("{:>2} {} {}{}", index, column.name(), unsigned, column.kind());
                } else {
                    println!(
                        "{:>2} {} {}{} -- {}",
                        index,
                        column.name(),
                        unsigned,
                        column.kind(),
                        column.comment()
                    );
                }
            }
        }

        Commands::Dump { table } => {
            let handle = db.table(&table)?;
            let table = handle.lock();
            let columns = table.columns();
            for row in table.rows()? {
                let cells: Vec<String> = row
                    .cells(columns.len())
                    .zip(columns)
                    .map(|(cell, column)| match cell {
                        Some(value) => format!("{}={}", column.name(), value),
                        None => format!("{}=-", column.name()),
                    })
                    .collect();
                println!("{}", cells.join(" "));
            }
        }

        Commands::Create { table, columns } => {
            let columns = columns
                .iter()
                .map(|definition| parse_column(definition))
                .collect::<Result<Vec<_>>>()?;
            db.create(&table, columns)?;
            println!("created {}", table);
        }

        Commands::Insert { table, values } => {
            let handle = db.table(&table)?;
            let mut table = handle.lock();

            let mut row = Row::new();
            for assignment in &values {
                let (name, raw) = assignment.split_once('=').ok_or_else(|| {
                    DeltaError::InvalidValue(format!("expected column=value, got '{}'", assignment))
                })?;
                let index = table.column_index(name).ok_or_else(|| {
                    DeltaError::InvalidValue(format!("no column named '{}'", name))
                })?;
                row.set(index, parse_value(&table.columns()[index], raw)?)?;
            }

            table.write(&row)?;
            table.flush()?;
            println!("inserted 1 row ({} bytes)", row.size_in_bytes());
        }
    }

    Ok(())
}

// =============================================================================
// Argument Parsing
// =============================================================================

/// Parse `name:kind[:comment]`; a `u` prefix on an integer kind marks it unsigned
fn parse_column(definition: &str) -> Result<Column> {
    let mut parts = definition.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let kind = parts
        .next()
        .ok_or_else(|| DeltaError::InvalidValue(format!("expected name:kind, got '{}'", definition)))?;
    let comment = parts.next();

    let (kind, unsigned) = match kind.strip_prefix('u').map(str::parse::<ColumnKind>) {
        Some(Ok(kind)) if kind.is_integer() => (kind, true),
        _ => (kind.parse::<ColumnKind>()?, false),
    };

    let mut column = Column::new(name, kind)?;
    if unsigned {
        column = column.unsigned();
    }
    if let Some(comment) = comment {
        column = column.with_comment(comment)?;
    }
    Ok(column)
}

fn parse_value(column: &Column, raw: &str) -> Result<Value> {
    let invalid = || {
        DeltaError::InvalidValue(format!(
            "'{}' is not a valid {} for column '{}'",
            raw,
            column.kind(),
            column.name()
        ))
    };

    let value = match (column.kind(), column.is_unsigned()) {
        (ColumnKind::Int8, false) => Value::Int8(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int16, false) => Value::Int16(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int32, false) => Value::Int32(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int64, false) => Value::Int64(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int8, true) => Value::UInt8(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int16, true) => Value::UInt16(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int32, true) => Value::UInt32(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Int64, true) => Value::UInt64(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Bool, _) => match raw {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        (ColumnKind::Float32, _) => Value::Float32(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::Float64, _) => Value::Float64(raw.parse().map_err(|_| invalid())?),
        (ColumnKind::String, _) => Value::String(raw.to_string()),
        (ColumnKind::Bytes, _) => Value::Bytes(parse_hex(raw).ok_or_else(invalid)?),
    };

    Ok(value)
}

/// Hex with an optional `0x` prefix
fn parse_hex(raw: &str) -> Option<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect()
}
