//! CLI tool for gradesheet - ingests a grade workbook and outputs an
//! inference report as JSON
//!
//! Usage:
//!   gradesheet_cli <input.xlsx>              # Output JSON to stdout
//!   gradesheet_cli <input.xlsx> -o out.json  # Output JSON to file

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use gradesheet::ingest::ingest;
use gradesheet::types::HeaderMapping;
use gradesheet::ScanConfig;

#[derive(Serialize)]
struct SheetReport {
    name: String,
    headers: Vec<String>,
    row_count: usize,
    mapping: Option<HeaderMapping>,
}

#[derive(Serialize)]
struct Report {
    version: &'static str,
    file: String,
    current_sheet: String,
    sheets: Vec<SheetReport>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: gradesheet_cli <input.xlsx> [-o output.json]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    // Read input file
    let data = match fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let file_name = Path::new(input_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_path.clone());

    // Ingest and infer structure
    let ingested = match ingest(&data, &file_name, &ScanConfig::default()) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error ingesting {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let report = Report {
        version: gradesheet::version(),
        file: file_name,
        current_sheet: ingested.sheets[ingested.current_sheet].name.clone(),
        sheets: ingested
            .sheets
            .iter()
            .enumerate()
            .map(|(idx, sheet)| SheetReport {
                name: sheet.name.clone(),
                headers: sheet.headers.clone(),
                row_count: sheet.rows.len(),
                mapping: ingested.mapping_for(idx).cloned(),
            })
            .collect(),
    };

    // Serialize to JSON
    let json = match serde_json::to_string_pretty(&report) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
