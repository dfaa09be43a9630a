use colored::*;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

use migration::Migrator;

const STATUS_COLUMN: usize = 80;

/// Applies every pending migration, printing one status line per migration.
///
/// Exits the process with a non-zero code on the first failure.
pub async fn run_all_migrations(url: &str) {
    let db = match sea_orm::Database::connect(url).await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("{} {}", "DB connection failed:".red(), err);
            std::process::exit(1);
        }
    };

    println!("Running migrations...");

    let pending = match Migrator::get_pending_migrations(&db).await {
        Ok(pending) => pending,
        Err(err) => {
            eprintln!("{} {}", "Could not read migration status:".red(), err);
            std::process::exit(1);
        }
    };

    if pending.is_empty() {
        println!("{}", "Nothing to migrate".dimmed());
        return;
    }

    for migration in pending {
        let name_str = format!("Applying {}", migration.name().bold());
        let dots = ".".repeat(STATUS_COLUMN.saturating_sub(name_str.len()));
        print!("{}{} ", name_str, dots);
        io::stdout().flush().ok();

        let start = Instant::now();
        match Migrator::up(&db, Some(1)).await {
            Ok(()) => {
                let time_str = format!("({:.2?})", start.elapsed()).dimmed();
                println!("{} {}", "done".green(), time_str);
            }
            Err(err) => {
                println!("{}", "failed".red());
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }
}
