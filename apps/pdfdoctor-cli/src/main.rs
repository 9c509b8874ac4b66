//! pdfdoctor - inspect, transform and convert PDF documents.
//!
//! A thin shell over `pdfdoctor-core`: arguments in, one operation call,
//! a human-readable message out. Errors are matched by kind at this
//! boundary; raw internal errors never reach the user unformatted.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use pdfdoctor_core::error::PdfDoctorError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdfdoctor")]
#[command(version, about = "A powerful CLI PDF editor", long_about = None)]
struct Cli {
    /// Use debug logging level
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show metadata and information about a PDF file
    Info {
        file: PathBuf,
        /// Print the record as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Extract text from a PDF file
    Extract {
        file: PathBuf,
        /// Output text file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge multiple PDF files into one
    Merge {
        /// Input files, merged in order (at least two)
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Output PDF file path
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },
    /// Redact (black out) specific text in the PDF
    Redact {
        file: PathBuf,
        text: String,
        /// Output PDF file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search and replace text (best effort)
    Edit {
        file: PathBuf,
        old_text: String,
        new_text: String,
        /// Output PDF file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert PDF to a Word document (.docx)
    PdfToWord {
        file: PathBuf,
        /// Output Word (.docx) file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a Word document (.docx) back to PDF
    WordToPdf {
        file: PathBuf,
        /// Output PDF file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rotate all pages in the PDF
    Rotate {
        file: PathBuf,
        /// Rotation angle (0, 90, 180, 270)
        #[arg(long, default_value_t = 90)]
        degrees: i64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete specific pages from the PDF
    DeletePages {
        file: PathBuf,
        /// Pages to delete, 1-based (e.g. "1,3,5")
        #[arg(long)]
        pages: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract a range of pages to a new file (1-based, inclusive)
    Split {
        file: PathBuf,
        start: u32,
        end: u32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Protect PDF with a password
    Encrypt {
        file: PathBuf,
        password: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove password protection from PDF
    Decrypt {
        file: PathBuf,
        password: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), PdfDoctorError> {
    match command {
        Command::Info { file, json } => {
            let info = pdfdoctor_core::get_info(&file)?;
            if json {
                match serde_json::to_string_pretty(&info) {
                    Ok(text) => println!("{}", text),
                    Err(e) => return Err(PdfDoctorError::Operation(e.to_string())),
                }
            } else {
                println!("PDF Metadata: {}", file.display());
                print_row("Pages", &info.pages.to_string());
                print_row("Encrypted", &info.encrypted.to_string());
                print_row("Format", &info.format);
                print_row("Title", &info.title);
                print_row("Author", &info.author);
                print_row("Creation Date", &info.creation_date);
                print_row("Mod Date", &info.mod_date);
            }
        }
        Command::Extract { file, output } => {
            let saved = pdfdoctor_core::extract_text(&file, output)?;
            println!("Success! Text extracted to '{}'", saved.display());
        }
        Command::Merge { files, output } => {
            let saved = pdfdoctor_core::merge(&files, &output)?;
            println!("Success! Merged to '{}'", saved.display());
        }
        Command::Redact { file, text, output } => {
            let (count, saved) = pdfdoctor_core::redact(&file, &text, output)?;
            if count == 0 {
                println!("No instances of '{}' found.", text);
            } else {
                println!(
                    "Success! Redacted {} occurrences. Saved to '{}'",
                    count,
                    saved.display()
                );
            }
        }
        Command::Edit {
            file,
            old_text,
            new_text,
            output,
        } => {
            let (count, saved) = pdfdoctor_core::edit_text(&file, &old_text, &new_text, output)?;
            println!(
                "Success! Replaced {} occurrences. Saved to '{}'",
                count,
                saved.display()
            );
        }
        Command::PdfToWord { file, output } => {
            let saved = pdfdoctor_core::pdf_to_word(&file, output)?;
            println!("Success! Converted to '{}'", saved.display());
        }
        Command::WordToPdf { file, output } => {
            let saved = pdfdoctor_core::word_to_pdf(&file, output)?;
            println!("Success! Converted to '{}'", saved.display());
        }
        Command::Rotate {
            file,
            degrees,
            output,
        } => {
            let saved = pdfdoctor_core::rotate(&file, degrees, output)?;
            println!(
                "Success! Rotated by {} degrees. Saved to '{}'",
                degrees,
                saved.display()
            );
        }
        Command::DeletePages {
            file,
            pages,
            output,
        } => {
            let indices = pdfdoctor_core::parse_page_list(&pages)?;
            let saved = pdfdoctor_core::delete_pages(&file, &indices, output)?;
            println!("Success! Deleted pages. Saved to '{}'", saved.display());
        }
        Command::Split {
            file,
            start,
            end,
            output,
        } => {
            let saved = pdfdoctor_core::extract_range(&file, start, end, output)?;
            println!(
                "Success! Extracted pages {}-{}. Saved to '{}'",
                start,
                end,
                saved.display()
            );
        }
        Command::Encrypt {
            file,
            password,
            output,
        } => {
            let saved = pdfdoctor_core::encrypt(&file, &password, output)?;
            println!("Success! Encrypted file saved to '{}'", saved.display());
        }
        Command::Decrypt {
            file,
            password,
            output,
        } => {
            let saved = pdfdoctor_core::decrypt(&file, &password, output)?;
            println!("Success! Decrypted file saved to '{}'", saved.display());
        }
    }
    Ok(())
}

fn print_row(key: &str, value: &str) {
    println!("  {:<14} {}", key, value);
}

/// One user-facing message per error kind.
fn render_error(err: &PdfDoctorError) -> String {
    match err {
        PdfDoctorError::NotFound(path) => format!("File '{}' not found.", path),
        PdfDoctorError::InvalidArgument(msg) => msg.clone(),
        PdfDoctorError::InvalidCredentials => "Incorrect password.".to_string(),
        PdfDoctorError::ConversionFailure(msg) => format!("Conversion failed: {}", msg),
        PdfDoctorError::Parse(msg) => format!("Could not read the document: {}", msg),
        PdfDoctorError::Operation(msg) => format!("The operation failed: {}", msg),
        PdfDoctorError::Io(e) => format!("Could not write the output: {}", e),
    }
}
