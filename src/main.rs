use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use gitdiff_render::diff::{DiffLine, DiffLineType};
use gitdiff_render::{
    DiffRenderer, DiffSection, ExcerptDirection, ExcerptOptions, ParseLimits, ParseOptions,
    PlainHighlighter, format_diff,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitdiff")]
#[command(about = "Parse git diff output and render it line by line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a patch and list its lines with numbers
    Parse {
        /// Patch file (reads stdin when omitted)
        patch: Option<PathBuf>,
        /// Hunk lines kept per file, 0 for no limit
        #[arg(long, default_value_t = 1000)]
        max_lines: usize,
        /// Bytes kept per hunk line, 0 for no limit
        #[arg(long, default_value_t = 5000)]
        max_line_characters: usize,
        /// Files parsed before the rest is discarded, 0 for no limit
        #[arg(long, default_value_t = 100)]
        max_files: usize,
        /// Skip files until this one
        #[arg(long)]
        skip_to: Option<String>,
        /// Print the model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reveal unchanged lines between two hunks of a file
    Excerpt {
        /// Current content of the file
        file: PathBuf,
        /// Path shown in the section (defaults to FILE)
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 0)]
        last_left: u32,
        #[arg(long, default_value_t = 0)]
        last_right: u32,
        #[arg(long)]
        left_index: u32,
        #[arg(long)]
        right_index: u32,
        #[arg(long, default_value_t = 0)]
        left_hunk_size: u32,
        #[arg(long, default_value_t = 0)]
        right_hunk_size: u32,
        #[arg(long, value_enum, default_value_t = Direction::All)]
        direction: Direction,
    },
    /// Diff a CSV file cell by cell (JSON output)
    Csv {
        /// Patch containing the file's line diff
        #[arg(long)]
        patch: PathBuf,
        /// Old version of the file
        #[arg(long)]
        base: Option<PathBuf>,
        /// New version of the file
        #[arg(long)]
        head: Option<PathBuf>,
        /// File within the patch (defaults to the first one)
        #[arg(long)]
        file: Option<String>,
    },
    /// Render the removed and added HTML for one changed line
    Inline {
        old: String,
        new: String,
        #[arg(long, default_value = "")]
        file_name: String,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
    /// Print a man page
    Man,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
    All,
}

impl From<Direction> for ExcerptDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
            Direction::All => Self::All,
        }
    }
}

fn limit(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

fn open_patch(path: Option<&PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let highlighter = PlainHighlighter;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Parse {
            patch,
            max_lines,
            max_line_characters,
            max_files,
            skip_to,
            json,
        } => {
            let options = ParseOptions {
                limits: ParseLimits {
                    max_lines: limit(max_lines),
                    max_line_characters: limit(max_line_characters),
                    max_files: limit(max_files),
                },
                skip_to,
            };
            let renderer = DiffRenderer::new(&highlighter).with_parse_options(options);
            let diff = renderer.parse(open_patch(patch.as_ref())?)?;
            if json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&diff)?)?;
            } else {
                write!(stdout, "{}", format_diff(&diff))?;
            }
        }
        Commands::Excerpt {
            file,
            path,
            last_left,
            last_right,
            left_index,
            right_index,
            left_hunk_size,
            right_hunk_size,
            direction,
        } => {
            let path = path.unwrap_or_else(|| file.display().to_string());
            let options = ExcerptOptions {
                last_left,
                last_right,
                left_index,
                right_index,
                left_hunk_size,
                right_hunk_size,
                direction: direction.into(),
                ..ExcerptOptions::default()
            };
            let renderer = DiffRenderer::new(&highlighter);
            let section = renderer.excerpt(&path, BufReader::new(File::open(&file)?), &options)?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&section)?)?;
        }
        Commands::Csv {
            patch,
            base,
            head,
            file,
        } => {
            let renderer = DiffRenderer::new(&highlighter).with_parse_options(ParseOptions {
                limits: ParseLimits::unlimited(),
                skip_to: None,
            });
            let diff = renderer.parse(open_patch(Some(&patch))?)?;
            let diff_file = match &file {
                Some(name) => diff.file(name),
                None => diff.files.first(),
            }
            .ok_or("file not found in patch")?;
            let base = base.map(File::open).transpose()?;
            let head = head.map(File::open).transpose()?;
            let sections = renderer.csv(diff_file, base, head)?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&sections)?)?;
        }
        Commands::Inline { old, new, file_name } => {
            let mut section = DiffSection::new(file_name);
            let mut del = DiffLine::new(DiffLineType::Del, 1, 0, format!("-{old}"));
            let mut add = DiffLine::new(DiffLineType::Add, 0, 1, format!("+{new}"));
            del.matched = Some(1);
            add.matched = Some(0);
            section.lines = vec![del, add];

            let renderer = DiffRenderer::new(&highlighter);
            for index in 0..section.lines.len() {
                if let Some(html) = renderer.inline_html(&section, index, None) {
                    writeln!(stdout, "{html}")?;
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gitdiff", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}
