use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::path::Path;

use kisa_admin::{
    compose_category_view, get_all_payments, get_all_students, import_payments, init_tracing,
    load_payments_csv, open_database, write_category_csv, AdminConfig, AdminStats, Program,
    StatusFilter, ViewConfig,
};

const USAGE: &str = "Usage:
  kisa-admin init
  kisa-admin import-payments <csv>
  kisa-admin summary <program> [start] [end]
      [--status all|paye|non_paye] [--student <id>] [--csv <path>]
  kisa-admin stats";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = AdminConfig::load()?;
    init_tracing(&config.log_filter);

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config),
        Some("import-payments") => match args.get(2) {
            Some(csv_path) => run_import(&config, Path::new(csv_path)),
            None => bail!("missing CSV path\n{USAGE}"),
        },
        Some("summary") => run_summary(&config, &args[2..]),
        Some("stats") => run_stats(&config),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn run_init(config: &AdminConfig) -> Result<()> {
    println!("🔧 Setting up database...");
    open_database(&config.database_path)?;
    println!("✓ Database initialized with WAL mode: {:?}", config.database_path);
    Ok(())
}

fn run_import(config: &AdminConfig, csv_path: &Path) -> Result<()> {
    println!("🗄️  Payment Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading CSV...");
    let batch = load_payments_csv(csv_path)?;
    println!("✓ Loaded {} valid rows", batch.payments.len());
    for rejected in &batch.rejected {
        for error in &rejected.errors {
            println!("⚠️  line {}: {}", rejected.line, error);
        }
    }

    // 2. Insert payments
    println!("\n💾 Inserting payments...");
    let conn = open_database(&config.database_path)?;
    let summary = import_payments(&conn, &batch.payments)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Inserted: {}", summary.inserted);
    println!("✓ Already imported: {}", summary.duplicates);
    if summary.unknown_students > 0 {
        println!("⚠️  Unknown students: {}", summary.unknown_students);
    }
    if !batch.rejected.is_empty() {
        println!("⚠️  Rejected rows: {}", batch.rejected.len());
    }

    Ok(())
}

fn run_summary(config: &AdminConfig, args: &[String]) -> Result<()> {
    let mut positional = Vec::new();
    let mut status = StatusFilter::All;
    let mut student = None;
    let mut csv_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--status" => {
                let value = iter.next().context("--status needs a value")?;
                status = StatusFilter::parse(value)
                    .with_context(|| format!("unknown status filter {value:?}"))?;
            }
            "--student" => student = Some(iter.next().context("--student needs an id")?.clone()),
            "--csv" => csv_path = Some(iter.next().context("--csv needs a path")?.clone()),
            other => positional.push(other.to_string()),
        }
    }

    let program_key = positional
        .first()
        .context("missing program (maquillage, cosmetologie, decoration)")?;
    let program = Program::from_key(program_key)
        .with_context(|| format!("unknown program {program_key:?}"))?;

    let mut view = ViewConfig::new(program).with_status(status).focused_on(student);
    if let Some(start) = positional.get(1) {
        view.start_month = start.clone();
        view.end_month = positional.get(2).unwrap_or(start).clone();
    }

    let conn = open_database(&config.database_path)?;
    let students = get_all_students(&conn)?;
    let payments = get_all_payments(&conn)?;
    let rows = compose_category_view(&students, &payments, &view);

    println!("📊 {} - {} → {}", program.label(), view.start_month, view.end_month);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for row in &rows {
        println!(
            "{:<30} {:<8} {:<40} {}",
            row.display_name, row.group, row.paid_months, row.status_label
        );
    }
    println!("\n✓ {} student(s)", rows.len());

    if let Some(path) = csv_path {
        let file = File::create(&path).with_context(|| format!("Failed to create {path}"))?;
        write_category_csv(&rows, file)?;
        println!("✓ Exported to {path} (suggested name: {})", view.export_file_name());
    }

    Ok(())
}

fn run_stats(config: &AdminConfig) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    let students = get_all_students(&conn)?;
    let stats = AdminStats::compute(&students);

    println!(
        "📈 Students: {} ({} active, {} archived)",
        stats.total, stats.active, stats.archived
    );
    println!("   Semaine: {}  Weekend: {}", stats.by_group.semaine, stats.by_group.weekend);
    for program in Program::ALL {
        let counts = stats.for_program(program);
        println!(
            "   {:<14} {:>3}  (semaine {}, weekend {})",
            program.label(),
            counts.total,
            counts.semaine,
            counts.weekend
        );
    }
    if stats.unclassified > 0 {
        println!("   Sans catégorie: {}", stats.unclassified);
    }

    Ok(())
}
