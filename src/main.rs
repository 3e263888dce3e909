//! # Panelcraft CLI
//!
//! Usage:
//!   panelcraft export project.json -o comic.pdf
//!   cat project.json | panelcraft export - -o comic.pdf
//!   panelcraft example > project.json
//!   panelcraft templates

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use panelcraft::layout::builtin_templates;
use panelcraft::model::ComicProject;
use panelcraft::PanelcraftError;

#[derive(Parser, Debug)]
#[command(name = "panelcraft", version, about = "Compose comic pages and export them as PDF")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a project file to PDF.
    Export(ExportArgs),
    /// Print an example project.
    Example,
    /// List the built-in page layouts.
    Templates,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project JSON, or `-` for stdin.
    input: PathBuf,

    /// Output PDF path. Defaults to the project title.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Example => {
            print!("{}", example_project_json());
            Ok(())
        }
        Command::Templates => {
            for template in builtin_templates() {
                println!("{:<12} {:<24} {} panels", template.id, template.name, template.slot_count());
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}: {}", e.notification_title(), e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_export(args: ExportArgs) -> Result<(), PanelcraftError> {
    let input = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&args.input)?
    };

    let project: ComicProject = serde_json::from_str(&input)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(project.options.file_name()));

    let pdf_bytes = panelcraft::render(&project)?;
    fs::write(&out, &pdf_bytes)?;
    eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), out.display());
    Ok(())
}

fn example_project_json() -> &'static str {
    r##"{
  "options": {
    "title": "The Lighthouse Keeper",
    "orientation": "portrait",
    "marginMm": 2,
    "panelPaddingMm": 1
  },
  "panels": [
    {
      "imagePrompt": "A lighthouse on a cliff at dusk, waves crashing below",
      "panelShape": "LANDSCAPE",
      "imageBase64": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
      "text": [
        { "type": "NARRATION", "text": "Every night for forty years, the lamp was lit." }
      ],
      "textPositions": [
        { "x": 50, "y": 15, "isFlipped": false, "tailPosition": { "side": "bottom", "offset": 20 } }
      ]
    },
    {
      "imagePrompt": "An old keeper climbing a spiral staircase with a lantern",
      "panelShape": "PORTRAIT",
      "cropSettings": { "anchor": { "x": 0.5, "y": 0.3 } },
      "text": [
        { "type": "SPEECH", "character": "Keeper", "text": "One more night, old friend." }
      ]
    },
    {
      "imagePrompt": "A ship's lights far out at sea",
      "panelShape": "SQUARE"
    },
    {
      "imagePrompt": "The lamp blazing over dark water",
      "panelShape": "SQUARE"
    }
  ],
  "pages": [
    {
      "startIndex": 0,
      "layout": {
        "id": "grid2x2",
        "name": "2x2 Grid",
        "slots": [
          { "x": 0, "y": 0, "width": 50, "height": 50 },
          { "x": 50, "y": 0, "width": 50, "height": 50 },
          { "x": 0, "y": 50, "width": 50, "height": 50 },
          { "x": 50, "y": 50, "width": 50, "height": 50 }
        ]
      }
    }
  ]
}
"##
}
